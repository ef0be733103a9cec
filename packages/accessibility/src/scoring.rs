//! Composite opportunity scores.
//!
//! Two named weight sets exist. [`score_supply`] combines competition gap,
//! accessibility gap and viability. [`score_demand`] re-scores supply-only
//! records with population demand and zeroes cells below
//! [`POPULATION_FLOOR`]. Both normalize against grid-wide maxima that are
//! computed in full before any cell is scored.

use std::collections::BTreeMap;

use opportunity_map_accessibility_models::{
    AccessibilityRecord, CellPopulation, DemandScore, OpportunityRecord, ScoreBasis, ScoreSummary,
    SupplyScores,
};
use rayon::prelude::*;

/// Nearest distance at which the accessibility gap saturates, in km.
pub const ACCESSIBILITY_CAP_KM: f64 = 3.0;

/// Cells with fewer people within 1 km are never opportunities.
pub const POPULATION_FLOOR: f64 = 100.0;

/// Upper bound of every composite score.
pub const MAX_SCORE: f64 = 10.0;

struct SupplyWeights {
    competition: f64,
    accessibility: f64,
    viability: f64,
}

const SUPPLY_WEIGHTS: SupplyWeights = SupplyWeights {
    competition: 0.40,
    accessibility: 0.40,
    viability: 0.20,
};

struct DemandWeights {
    competition: f64,
    accessibility: f64,
    demand: f64,
    viability: f64,
}

const DEMAND_WEIGHTS: DemandWeights = DemandWeights {
    competition: 0.30,
    accessibility: 0.30,
    demand: 0.30,
    viability: 0.10,
};

/// Market viability from the number of facilities within walking distance.
///
/// One to three competitors is the sweet spot; none is plausible but
/// unproven; saturation decays linearly to zero at thirteen.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn viability(services_within_walking: usize) -> f64 {
    match services_within_walking {
        0 => 0.5,
        1..=3 => 1.0,
        s => (1.0 - (s as f64 - 3.0) / 10.0).max(0.0),
    }
}

/// Accessibility gap from the nearest-facility distance.
#[must_use]
pub fn accessibility_gap(nearest_distance_km: f64) -> f64 {
    nearest_distance_km.min(ACCESSIBILITY_CAP_KM) / ACCESSIBILITY_CAP_KM
}

/// Competition gap from a cell's density relative to the grid maximum.
#[must_use]
pub fn competition_gap(density_per_km2: f64, max_density: f64) -> f64 {
    if max_density > 0.0 {
        1.0 - density_per_km2 / max_density
    } else {
        1.0
    }
}

fn supply_composite(scores: &SupplyScores) -> f64 {
    MAX_SCORE
        * SUPPLY_WEIGHTS.viability.mul_add(
            scores.viability,
            SUPPLY_WEIGHTS.competition.mul_add(
                scores.competition_gap,
                SUPPLY_WEIGHTS.accessibility * scores.accessibility_gap,
            ),
        )
}

fn demand_composite(scores: &SupplyScores, demand_score: f64) -> f64 {
    MAX_SCORE
        * (DEMAND_WEIGHTS.competition * scores.competition_gap
            + DEMAND_WEIGHTS.accessibility * scores.accessibility_gap
            + DEMAND_WEIGHTS.demand * demand_score
            + DEMAND_WEIGHTS.viability * scores.viability)
}

/// Scores accessibility records under the supply-only policy.
#[must_use]
pub fn score_supply(records: &[AccessibilityRecord]) -> Vec<OpportunityRecord> {
    let max_density = records
        .iter()
        .map(|r| r.density_per_km2)
        .fold(0.0, f64::max);

    let scored: Vec<OpportunityRecord> = records
        .par_iter()
        .map(|record| {
            let scores = SupplyScores {
                competition_gap: competition_gap(record.density_per_km2, max_density),
                accessibility_gap: accessibility_gap(record.nearest_distance_km),
                viability: viability(record.services_within_walking),
            };

            OpportunityRecord {
                accessibility: *record,
                opportunity_score: supply_composite(&scores),
                scores,
                basis: ScoreBasis::SupplyOnly,
            }
        })
        .collect();

    let summary = summarize_scores(&scored);
    log::info!(
        "Opportunity scores calculated: range {:.2} - {:.2}, mean {:.2}",
        summary.min,
        summary.max,
        summary.mean
    );

    scored
}

/// Re-scores records under the demand-weighted policy.
///
/// Populations are joined by cell id; cells without an entry count as
/// unpopulated. The pre-existing supply-only score is preserved in
/// [`DemandScore::opportunity_score_original`].
#[must_use]
pub fn score_demand(
    records: &[OpportunityRecord],
    populations: &[CellPopulation],
) -> Vec<OpportunityRecord> {
    let by_cell: BTreeMap<_, _> = populations.iter().map(|p| (p.cell_id, p)).collect();

    let missing = records
        .iter()
        .filter(|r| !by_cell.contains_key(&r.cell_id()))
        .count();
    if missing > 0 {
        log::warn!("{missing} cells have no population estimate; treating them as empty");
    }

    let max_population = records
        .iter()
        .filter_map(|r| by_cell.get(&r.cell_id()))
        .map(|p| p.population_1km)
        .fold(0.0, f64::max);

    let scored: Vec<OpportunityRecord> = records
        .par_iter()
        .map(|record| {
            let (population, population_1km) = by_cell
                .get(&record.cell_id())
                .map_or((0.0, 0.0), |p| (p.population, p.population_1km));

            let below_floor = population_1km < POPULATION_FLOOR;
            let demand_score = if below_floor || max_population <= 0.0 {
                0.0
            } else {
                population_1km / max_population
            };
            let opportunity_score = if below_floor {
                0.0
            } else {
                demand_composite(&record.scores, demand_score)
            };

            OpportunityRecord {
                accessibility: record.accessibility,
                scores: record.scores,
                opportunity_score,
                basis: ScoreBasis::DemandWeighted(DemandScore {
                    population,
                    population_1km,
                    demand_score,
                    opportunity_score_original: record.supply_only_score(),
                }),
            }
        })
        .collect();

    let zeroed = scored
        .iter()
        .filter(|r| r.opportunity_score <= 0.0)
        .count();
    log::info!(
        "Demand-weighted scores: original mean {:.2}, new mean {:.2}, {zeroed} cells zeroed",
        mean(records.iter().map(OpportunityRecord::supply_only_score)),
        mean(scored.iter().map(|r| r.opportunity_score)),
    );

    scored
}

/// Score range and mean over `records`.
#[must_use]
pub fn summarize_scores(records: &[OpportunityRecord]) -> ScoreSummary {
    if records.is_empty() {
        return ScoreSummary {
            cells: 0,
            min: 0.0,
            max: 0.0,
            mean: 0.0,
        };
    }

    let scores = || records.iter().map(|r| r.opportunity_score);

    ScoreSummary {
        cells: records.len(),
        min: scores().fold(f64::INFINITY, f64::min),
        max: scores().fold(f64::NEG_INFINITY, f64::max),
        mean: mean(scores()),
    }
}

/// The `n` highest-scoring records, best first. Ties keep grid order.
#[must_use]
pub fn top_opportunities(records: &[OpportunityRecord], n: usize) -> Vec<&OpportunityRecord> {
    let mut ranked: Vec<&OpportunityRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.opportunity_score.total_cmp(&a.opportunity_score));
    ranked.truncate(n);
    ranked
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

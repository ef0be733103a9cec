//! CSV analysis artifacts.
//!
//! One row per grid cell. Demand columns are empty for supply-only rows,
//! and the `scoring_policy` column says which weight set produced
//! `opportunity_score`. Unreachable distances are written as `inf`.

use std::path::Path;

use opportunity_map_accessibility_models::{
    AccessibilityRecord, DemandScore, OpportunityRecord, ScoreBasis, ScoringPolicy, SupplyScores,
};
use opportunity_map_grid_models::CellId;
use serde::{Deserialize, Serialize};

use crate::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactRow {
    cell_id: CellId,
    center_lat: f64,
    center_lng: f64,
    services_within_walking: usize,
    nearest_distance_km: f64,
    avg_distance_top3_km: f64,
    density_per_km2: f64,
    competition_gap: f64,
    accessibility_gap: f64,
    viability: f64,
    opportunity_score: f64,
    scoring_policy: ScoringPolicy,
    population: Option<f64>,
    population_1km: Option<f64>,
    demand_score: Option<f64>,
    opportunity_score_original: Option<f64>,
}

impl From<&OpportunityRecord> for ArtifactRow {
    fn from(record: &OpportunityRecord) -> Self {
        let access = &record.accessibility;
        let demand = record.demand();

        Self {
            cell_id: access.cell_id,
            center_lat: access.center_lat,
            center_lng: access.center_lng,
            services_within_walking: access.services_within_walking,
            nearest_distance_km: access.nearest_distance_km,
            avg_distance_top3_km: access.avg_distance_top3_km,
            density_per_km2: access.density_per_km2,
            competition_gap: record.scores.competition_gap,
            accessibility_gap: record.scores.accessibility_gap,
            viability: record.scores.viability,
            opportunity_score: record.opportunity_score,
            scoring_policy: record.policy(),
            population: demand.map(|d| d.population),
            population_1km: demand.map(|d| d.population_1km),
            demand_score: demand.map(|d| d.demand_score),
            opportunity_score_original: demand.map(|d| d.opportunity_score_original),
        }
    }
}

impl ArtifactRow {
    fn into_record(self) -> Result<OpportunityRecord, String> {
        let basis = match self.scoring_policy {
            ScoringPolicy::SupplyOnly => ScoreBasis::SupplyOnly,
            ScoringPolicy::DemandWeighted => {
                let (
                    Some(population),
                    Some(population_1km),
                    Some(demand_score),
                    Some(opportunity_score_original),
                ) = (
                    self.population,
                    self.population_1km,
                    self.demand_score,
                    self.opportunity_score_original,
                )
                else {
                    return Err(format!(
                        "cell {} is demand-weighted but has empty demand columns",
                        self.cell_id
                    ));
                };

                ScoreBasis::DemandWeighted(DemandScore {
                    population,
                    population_1km,
                    demand_score,
                    opportunity_score_original,
                })
            }
        };

        Ok(OpportunityRecord {
            accessibility: AccessibilityRecord {
                cell_id: self.cell_id,
                center_lat: self.center_lat,
                center_lng: self.center_lng,
                services_within_walking: self.services_within_walking,
                nearest_distance_km: self.nearest_distance_km,
                avg_distance_top3_km: self.avg_distance_top3_km,
                density_per_km2: self.density_per_km2,
            },
            scores: SupplyScores {
                competition_gap: self.competition_gap,
                accessibility_gap: self.accessibility_gap,
                viability: self.viability,
            },
            opportunity_score: self.opportunity_score,
            basis,
        })
    }
}

/// Writes `records` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be created or written.
pub fn write_records<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a OpportunityRecord>,
) -> Result<usize, PipelineError> {
    let display = path.display().to_string();
    let csv_err = |source| PipelineError::Csv {
        path: display.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PipelineError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    let mut written = 0;
    for record in records {
        writer.serialize(ArtifactRow::from(record)).map_err(csv_err)?;
        written += 1;
    }
    writer.flush().map_err(|source| PipelineError::Io {
        path: display.clone(),
        source,
    })?;

    log::info!("Saved {written} rows to {display}");
    Ok(written)
}

/// Reads an artifact written by [`write_records`].
///
/// # Errors
///
/// Returns [`PipelineError::ArtifactNotFound`] if `path` does not exist,
/// or another [`PipelineError`] if a row cannot be parsed.
pub fn read_records(path: &Path) -> Result<Vec<OpportunityRecord>, PipelineError> {
    let display = path.display().to_string();
    if !path.exists() {
        return Err(PipelineError::ArtifactNotFound { path: display });
    }

    let mut reader = csv::ReaderBuilder::new()
        .from_path(path)
        .map_err(|source| PipelineError::Csv {
            path: display.clone(),
            source,
        })?;

    let mut records = Vec::new();
    for row in reader.deserialize::<ArtifactRow>() {
        let row = row.map_err(|source| PipelineError::Csv {
            path: display.clone(),
            source,
        })?;
        let record = row
            .into_record()
            .map_err(|message| PipelineError::Conversion {
                path: display.clone(),
                message,
            })?;
        records.push(record);
    }

    log::debug!("Loaded {} rows from {display}", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("opportunity_map_artifact_{}", std::process::id()))
            .join(name)
    }

    fn isolated(cell_id: CellId) -> OpportunityRecord {
        OpportunityRecord {
            accessibility: AccessibilityRecord {
                cell_id,
                center_lat: 45.46,
                center_lng: 9.19,
                services_within_walking: 0,
                nearest_distance_km: f64::INFINITY,
                avg_distance_top3_km: f64::INFINITY,
                density_per_km2: 0.0,
            },
            scores: SupplyScores {
                competition_gap: 1.0,
                accessibility_gap: 1.0,
                viability: 0.5,
            },
            opportunity_score: 9.0,
            basis: ScoreBasis::SupplyOnly,
        }
    }

    #[test]
    fn preserves_infinite_distances_and_policy() {
        let path = temp_file("infinite.csv");
        let mut demand = isolated(1);
        demand.opportunity_score = 0.0;
        demand.basis = ScoreBasis::DemandWeighted(DemandScore {
            population: 12.0,
            population_1km: 40.0,
            demand_score: 0.0,
            opportunity_score_original: 9.0,
        });

        let records = vec![isolated(0), demand];
        assert_eq!(write_records(&path, &records).unwrap(), 2);

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("cell_id,center_lat,center_lng,services_within_walking"));
        assert!(header.contains("scoring_policy"));
        assert!(header.contains(",inf,inf,"));
        assert!(header.contains(",supply_only,,,,"));

        let loaded = read_records(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].accessibility.nearest_distance_km.is_infinite());
        assert_eq!(loaded[0].policy(), ScoringPolicy::SupplyOnly);
        assert_eq!(loaded[1].policy(), ScoringPolicy::DemandWeighted);
        assert!((loaded[1].supply_only_score() - 9.0).abs() < f64::EPSILON);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_artifact() {
        let err = read_records(Path::new("/nonexistent/analysis.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactNotFound { .. }));
    }

    #[test]
    fn demand_row_without_demand_columns_is_rejected() {
        let path = temp_file("broken_demand.csv");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "cell_id,center_lat,center_lng,services_within_walking,nearest_distance_km,\
             avg_distance_top3_km,density_per_km2,competition_gap,accessibility_gap,viability,\
             opportunity_score,scoring_policy,population,population_1km,demand_score,\
             opportunity_score_original\n\
             0,45.4,9.1,1,0.2,0.2,0.3,0.5,0.1,1.0,4.4,demand_weighted,,,,\n",
        )
        .unwrap();

        let err = read_records(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Conversion { .. }));

        std::fs::remove_file(path).ok();
    }
}

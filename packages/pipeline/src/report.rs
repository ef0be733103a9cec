//! Plain-text summaries of pipeline results.

use crate::analyze::{AnalysisOutcome, TOP_CELLS};
use crate::batch::{ArtifactStatus, CategoryOutcome, CategoryStatus};
use crate::enrich::EnrichmentStats;
use crate::refilter::RefilterOutcome;

/// Summary of a single analysis run: grid size, desert share, score range
/// and the highest-scoring cells.
#[must_use]
pub fn render_outcome(outcome: &AnalysisOutcome) -> String {
    let mut lines = vec![
        format!(
            "{} / {} (version {})",
            outcome.region.name, outcome.category, outcome.version
        ),
        format!(
            "  Grid cells:   {} of {} ({})",
            outcome.records.len(),
            outcome.rectangular_cells,
            if outcome.clipped {
                "clipped to boundary"
            } else {
                "rectangular"
            }
        ),
        format!("  Facilities:   {}", outcome.facility_count),
        format!(
            "  Deserts:      {} ({:.1}%)",
            outcome.deserts.desert_count(),
            outcome.deserts.percentage
        ),
        format!(
            "  Scores:       {:.2} - {:.2}, mean {:.2}",
            outcome.summary.min, outcome.summary.max, outcome.summary.mean
        ),
        String::new(),
        format!("  Top {TOP_CELLS} opportunities:"),
        format!(
            "  {:>6} {:>10} {:>10} {:>8} {:>12}",
            "CELL", "LAT", "LNG", "SCORE", "NEAREST KM"
        ),
    ];

    for record in outcome.top_cells(TOP_CELLS) {
        let (lat, lng) = record.center();
        lines.push(format!(
            "  {:>6} {lat:>10.5} {lng:>10.5} {:>8.2} {:>12.3}",
            record.cell_id(),
            record.opportunity_score,
            record.accessibility.nearest_distance_km
        ));
    }

    lines.push(format!("  Analysis:     {}", outcome.analysis_path.display()));
    lines.push(format!("  Deserts:      {}", outcome.deserts_path.display()));
    lines.join("\n")
}

/// Fixed-width status table of a batch run, one row per category.
#[must_use]
pub fn render_status_table(statuses: &[CategoryStatus]) -> String {
    let mut lines = vec![
        format!(
            "{:<24} {:>10} {:>8} {:>12} {:>7} {:>7}  STATUS",
            "CATEGORY", "FACILITIES", "CELLS", "DESERTS", "MEAN", "TOP"
        ),
        "-".repeat(88),
    ];

    for status in statuses {
        lines.push(match &status.outcome {
            CategoryOutcome::Success {
                facilities,
                cells,
                deserts,
                desert_percentage,
                mean_score,
                top_score,
            } => {
                let desert_cell = format!("{deserts} ({desert_percentage:.0}%)");
                format!(
                    "{:<24} {facilities:>10} {cells:>8} {desert_cell:>12} {mean_score:>7.2} {top_score:>7.2}  ok",
                    status.category,
                )
            }
            CategoryOutcome::Failed { error } => format!(
                "{:<24} {:>10} {:>8} {:>12} {:>7} {:>7}  error: {error}",
                status.category, "-", "-", "-", "-", "-"
            ),
        });
    }

    let succeeded = statuses.iter().filter(|s| s.is_success()).count();
    lines.push("-".repeat(88));
    lines.push(format!("{succeeded}/{} categories succeeded", statuses.len()));
    lines.join("\n")
}

/// Summary of an enrichment run.
#[must_use]
pub fn render_enrichment(stats: &EnrichmentStats) -> String {
    [
        format!("{} enriched with population", stats.category),
        format!("  Source:               {}", stats.source_path.display()),
        format!("  Total population:     {:.0}", stats.total_population),
        format!("  Mean within 1 km:     {:.0}", stats.mean_population_1km),
        format!(
            "  Populated cells:      {} ({} empty)",
            stats.populated_cells, stats.empty_cells
        ),
        format!(
            "  Mean score:           {:.2} -> {:.2}",
            stats.original_mean_score, stats.new_mean_score
        ),
        format!("  Zeroed by floor:      {}", stats.zeroed_cells),
        format!("  Saved:                {}", stats.path.display()),
    ]
    .join("\n")
}

/// Fixed-width table of a re-filter pass, one row per category.
#[must_use]
pub fn render_refilter_table(statuses: &[ArtifactStatus<RefilterOutcome>]) -> String {
    let mut lines = vec![
        format!(
            "{:<24} {:>8} {:>8} {:>16}  STATUS",
            "CATEGORY", "CELLS", "KEPT", "REMOVED"
        ),
        "-".repeat(72),
    ];

    for status in statuses {
        lines.push(match &status.result {
            Ok(outcome) => {
                let removed = format!(
                    "{} ({:.1}%)",
                    outcome.removed(),
                    outcome.removed_percentage()
                );
                format!(
                    "{:<24} {:>8} {:>8} {removed:>16}  ok",
                    status.category, outcome.original, outcome.kept
                )
            }
            Err(error) => format!(
                "{:<24} {:>8} {:>8} {:>16}  error: {error}",
                status.category, "-", "-", "-"
            ),
        });
    }

    lines.push("-".repeat(72));
    lines.push(succeeded_line(statuses));
    lines.join("\n")
}

/// Fixed-width table of an enrichment pass, one row per category.
#[must_use]
pub fn render_enrichment_table(statuses: &[ArtifactStatus<EnrichmentStats>]) -> String {
    let mut lines = vec![
        format!(
            "{:<24} {:>8} {:>12} {:>10} {:>14} {:>7}  STATUS",
            "CATEGORY", "CELLS", "POPULATION", "POPULATED", "MEAN SCORE", "ZEROED"
        ),
        "-".repeat(92),
    ];

    for status in statuses {
        lines.push(match &status.result {
            Ok(stats) => {
                let scores = format!(
                    "{:.2} -> {:.2}",
                    stats.original_mean_score, stats.new_mean_score
                );
                format!(
                    "{:<24} {:>8} {:>12.0} {:>10} {scores:>14} {:>7}  ok",
                    status.category,
                    stats.cells,
                    stats.total_population,
                    stats.populated_cells,
                    stats.zeroed_cells
                )
            }
            Err(error) => format!(
                "{:<24} {:>8} {:>12} {:>10} {:>14} {:>7}  error: {error}",
                status.category, "-", "-", "-", "-", "-"
            ),
        });
    }

    lines.push("-".repeat(92));
    lines.push(succeeded_line(statuses));
    lines.join("\n")
}

fn succeeded_line<T>(statuses: &[ArtifactStatus<T>]) -> String {
    let succeeded = statuses.iter().filter(|s| s.is_success()).count();
    format!("{succeeded}/{} categories succeeded", statuses.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_lists_every_category() {
        let statuses = vec![
            CategoryStatus {
                category: "pharmacy".to_string(),
                outcome: CategoryOutcome::Success {
                    facilities: 412,
                    cells: 1088,
                    deserts: 230,
                    desert_percentage: 21.1,
                    mean_score: 4.87,
                    top_score: 9.12,
                },
            },
            CategoryStatus {
                category: "gym".to_string(),
                outcome: CategoryOutcome::Failed {
                    error: "No facility snapshot at raw/milan_gym_20250114.csv".to_string(),
                },
            },
        ];

        let table = render_status_table(&statuses);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with("pharmacy"));
        assert!(lines[2].contains("412"));
        assert!(lines[2].contains("230 (21%)"));
        assert!(lines[2].ends_with("ok"));
        assert!(lines[3].starts_with("gym"));
        assert!(lines[3].contains("error: No facility snapshot"));
        assert_eq!(lines[5], "1/2 categories succeeded");
    }

    #[test]
    fn refilter_table_reports_failures_alongside_successes() {
        let statuses = vec![
            ArtifactStatus {
                category: "bakery".to_string(),
                result: Err(
                    "CSV error in processed/milan_bakery_analysis_20250114.csv".to_string(),
                ),
            },
            ArtifactStatus {
                category: "pharmacy".to_string(),
                result: Ok(RefilterOutcome {
                    category: "pharmacy".to_string(),
                    original: 4,
                    kept: 2,
                    source_path: "processed/milan_pharmacy_analysis_20250114.csv".into(),
                    path: "processed/milan_pharmacy_analysis_filtered_20250114.csv".into(),
                }),
            },
        ];

        let table = render_refilter_table(&statuses);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with("bakery"));
        assert!(lines[2].contains("error: CSV error"));
        assert!(lines[3].starts_with("pharmacy"));
        assert!(lines[3].contains("2 (50.0%)"));
        assert!(lines[3].ends_with("ok"));
        assert_eq!(lines[5], "1/2 categories succeeded");
    }
}

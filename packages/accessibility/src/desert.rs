//! Service desert classification.
//!
//! A cell is a desert when the closest facility is farther than
//! [`DESERT_NEAREST_KM`] or fewer than [`DESERT_MIN_SERVICES`] facilities
//! are within walking distance.

use opportunity_map_accessibility_models::{AccessibilityRecord, DesertReport};

/// Nearest-facility distance above which a cell is a desert.
pub const DESERT_NEAREST_KM: f64 = 1.5;

/// Minimum facilities within walking distance for a cell not to be a desert.
pub const DESERT_MIN_SERVICES: usize = 2;

/// Whether `record` describes an underserved cell.
#[must_use]
pub fn is_desert(record: &AccessibilityRecord) -> bool {
    record.nearest_distance_km > DESERT_NEAREST_KM
        || record.services_within_walking < DESERT_MIN_SERVICES
}

/// Classifies every record and reports desert counts.
#[must_use]
pub fn classify_deserts(records: &[AccessibilityRecord]) -> DesertReport {
    let desert_cell_ids: Vec<_> = records
        .iter()
        .filter(|r| is_desert(r))
        .map(|r| r.cell_id)
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let percentage = if records.is_empty() {
        0.0
    } else {
        desert_cell_ids.len() as f64 / records.len() as f64 * 100.0
    };

    log::info!(
        "Service deserts: {} of {} cells ({percentage:.1}%)",
        desert_cell_ids.len(),
        records.len()
    );

    DesertReport {
        total_cells: records.len(),
        desert_cell_ids,
        percentage,
    }
}

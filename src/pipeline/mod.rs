// Data pipeline: file -> raw rows -> normalized records

pub mod ingestion;
pub mod processing;

use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::{DashboardError, Result};
use crate::metrics;
use processing::{normalize, NormalizedRecord, SourceColumn};

/// Load and normalize the export at `path`.
///
/// With `strict_columns` a header lacking any mapped source column fails the
/// load; otherwise the affected fields come out as NaN.
pub fn load_records(path: &Path, strict_columns: bool) -> Result<Vec<NormalizedRecord>> {
    let started = Instant::now();

    let result = ingestion::read_raw_table(path).and_then(|table| {
        let missing = SourceColumn::missing_from(&table.headers);
        if !missing.is_empty() {
            if strict_columns {
                return Err(DashboardError::MissingColumns(
                    missing.into_iter().map(String::from).collect(),
                ));
            }
            warn!(?missing, "source columns missing, fields will be NaN");
        }
        Ok(normalize(&table.rows))
    });

    let elapsed = started.elapsed().as_secs_f64();
    match &result {
        Ok(records) => {
            info!(
                path = %path.display(),
                records = records.len(),
                elapsed_ms = elapsed * 1000.0,
                "loaded balance records"
            );
            metrics::record_load_success(elapsed);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load balance records");
            metrics::record_load_error();
        }
    }

    result
}

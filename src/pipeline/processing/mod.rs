// Data processing: normalization of raw rows and date range selection

pub mod normalize;
pub mod range_filter;

pub use normalize::{normalize, normalize_row, NormalizedRecord, SourceColumn};
pub use range_filter::{apply_range_filter, filter_records, latest_date, RangeFilter};

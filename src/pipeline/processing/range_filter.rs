use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DashboardError;
use crate::pipeline::processing::normalize::NormalizedRecord;
use crate::types::RecordDate;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Months are flat 30-day windows
const DAYS_PER_MONTH: i64 = 30;

/// Date window selectable on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeFilter {
    #[default]
    All,
    #[serde(rename = "YTD")]
    Ytd,
    #[serde(rename = "12M")]
    TwelveMonths,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1M")]
    OneMonth,
}

impl RangeFilter {
    /// Button order on the dashboard
    pub const ALL: [RangeFilter; 5] = [
        RangeFilter::All,
        RangeFilter::Ytd,
        RangeFilter::TwelveMonths,
        RangeFilter::ThreeMonths,
        RangeFilter::OneMonth,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RangeFilter::All => "All",
            RangeFilter::Ytd => "YTD",
            RangeFilter::TwelveMonths => "12M",
            RangeFilter::ThreeMonths => "3M",
            RangeFilter::OneMonth => "1M",
        }
    }

    /// Width of the trailing window in days, for the relative filters
    pub const fn window_days(self) -> Option<i64> {
        match self {
            RangeFilter::TwelveMonths => Some(12 * DAYS_PER_MONTH),
            RangeFilter::ThreeMonths => Some(3 * DAYS_PER_MONTH),
            RangeFilter::OneMonth => Some(DAYS_PER_MONTH),
            RangeFilter::All | RangeFilter::Ytd => None,
        }
    }

    /// Whether a record dated `time` is inside this window anchored at `reference`.
    ///
    /// Invalid dates only pass `All`, and so does everything when there is no
    /// reference date.
    pub fn matches(self, time: RecordDate, reference: Option<NaiveDate>) -> bool {
        if self == RangeFilter::All {
            return true;
        }
        let (Some(date), Some(reference)) = (time.date(), reference) else {
            return false;
        };

        match self {
            RangeFilter::All => true,
            RangeFilter::Ytd => date.year() == reference.year(),
            relative => {
                let window_ms = relative.window_days().unwrap_or(0) * MS_PER_DAY;
                let diff_ms = reference.signed_duration_since(date).num_milliseconds();
                diff_ms <= window_ms
            }
        }
    }
}

impl fmt::Display for RangeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeFilter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RangeFilter::ALL
            .iter()
            .copied()
            .find(|filter| filter.as_str() == s.trim())
            .ok_or_else(|| DashboardError::InvalidRange(s.to_string()))
    }
}

/// Latest valid date in the dataset, by calendar order
pub fn latest_date(records: &[NormalizedRecord]) -> Option<NaiveDate> {
    records.iter().filter_map(|r| r.time.date()).max()
}

/// Records inside `filter` anchored at `reference`, in input order
pub fn filter_records(
    records: &[NormalizedRecord],
    filter: RangeFilter,
    reference: Option<NaiveDate>,
) -> Vec<NormalizedRecord> {
    records
        .iter()
        .filter(|r| filter.matches(r.time, reference))
        .cloned()
        .collect()
}

/// Apply `filter` with the dataset's own latest date as the anchor
pub fn apply_range_filter(records: &[NormalizedRecord], filter: RangeFilter) -> Vec<NormalizedRecord> {
    if filter == RangeFilter::All {
        return records.to_vec();
    }
    filter_records(records, filter, latest_date(records))
}

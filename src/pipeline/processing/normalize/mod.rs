use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{RawRow, RecordDate};

/// The fixed mapping between Coin Metrics source headers and output keys.
///
/// Any rename on the export side has to be reflected here; ingestion checks
/// incoming headers against [`SourceColumn::ALL`] before normalizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceColumn {
    Time,
    Above1k,
    Above10k,
    Above100k,
    Above1m,
    Above10m,
}

impl SourceColumn {
    pub const ALL: [SourceColumn; 6] = [
        SourceColumn::Time,
        SourceColumn::Above1k,
        SourceColumn::Above10k,
        SourceColumn::Above100k,
        SourceColumn::Above1m,
        SourceColumn::Above10m,
    ];

    /// The five balance buckets, in chart order
    pub const BALANCES: [SourceColumn; 5] = [
        SourceColumn::Above1k,
        SourceColumn::Above10k,
        SourceColumn::Above100k,
        SourceColumn::Above1m,
        SourceColumn::Above10m,
    ];

    pub const fn source_header(self) -> &'static str {
        match self {
            SourceColumn::Time => "Time",
            // The 1K bucket is an address count, the others are values
            SourceColumn::Above1k => "BTC / Addr Cnt of Bal ≥ $1K",
            SourceColumn::Above10k => "BTC / Val in Addrs w/ Bal ≥ $10K USD",
            SourceColumn::Above100k => "BTC / Val in Addrs w/ Bal ≥ $100K USD",
            SourceColumn::Above1m => "BTC / Val in Addrs w/ Bal ≥ $1M USD",
            SourceColumn::Above10m => "BTC / Val in Addrs w/ Bal ≥ $10M USD",
        }
    }

    pub const fn output_key(self) -> &'static str {
        match self {
            SourceColumn::Time => "time",
            SourceColumn::Above1k => ">$1k",
            SourceColumn::Above10k => ">$10k",
            SourceColumn::Above100k => ">$100k",
            SourceColumn::Above1m => ">$1m",
            SourceColumn::Above10m => ">$10m",
        }
    }

    /// Source headers from the mapping table that are absent in `headers`
    pub fn missing_from<S: AsRef<str>>(headers: &[S]) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .map(|c| c.source_header())
            .filter(|wanted| !headers.iter().any(|h| h.as_ref() == *wanted))
            .collect()
    }
}

/// Canonical per-day record consumed by the chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub time: RecordDate,
    #[serde(rename = ">$1k", deserialize_with = "nan_from_null")]
    pub above_1k: f64,
    #[serde(rename = ">$10k", deserialize_with = "nan_from_null")]
    pub above_10k: f64,
    #[serde(rename = ">$100k", deserialize_with = "nan_from_null")]
    pub above_100k: f64,
    #[serde(rename = ">$1m", deserialize_with = "nan_from_null")]
    pub above_1m: f64,
    #[serde(rename = ">$10m", deserialize_with = "nan_from_null")]
    pub above_10m: f64,
}

impl NormalizedRecord {
    /// Value of a balance bucket; `Time` has no numeric value and yields NaN
    pub fn value(&self, column: SourceColumn) -> f64 {
        match column {
            SourceColumn::Time => f64::NAN,
            SourceColumn::Above1k => self.above_1k,
            SourceColumn::Above10k => self.above_10k,
            SourceColumn::Above100k => self.above_100k,
            SourceColumn::Above1m => self.above_1m,
            SourceColumn::Above10m => self.above_10m,
        }
    }
}

// serde_json writes non-finite floats as null
fn nan_from_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or(f64::NAN))
}

/// Normalize a single raw row. Missing or malformed cells degrade to NaN or
/// the invalid-date sentinel; this never fails.
pub fn normalize_row(row: &RawRow) -> NormalizedRecord {
    let number = |column: SourceColumn| {
        row.get(column.source_header())
            .map(parse_lenient_f64)
            .unwrap_or(f64::NAN)
    };

    NormalizedRecord {
        time: row
            .get(SourceColumn::Time.source_header())
            .map(RecordDate::parse)
            .unwrap_or(RecordDate::INVALID),
        above_1k: number(SourceColumn::Above1k),
        above_10k: number(SourceColumn::Above10k),
        above_100k: number(SourceColumn::Above100k),
        above_1m: number(SourceColumn::Above1m),
        above_10m: number(SourceColumn::Above10m),
    }
}

/// Normalize rows in order; output length always equals input length.
pub fn normalize(rows: &[RawRow]) -> Vec<NormalizedRecord> {
    rows.iter().map(normalize_row).collect()
}

/// Parse the longest numeric prefix of `s`.
///
/// Leading whitespace is skipped, an optional sign, `Infinity`, digits with an
/// optional fraction and exponent are accepted, and anything after the prefix is
/// ignored. Input without a numeric prefix yields NaN.
pub fn parse_lenient_f64(s: &str) -> f64 {
    // U+FEFF counts as leading whitespace here, as in JavaScript
    let s = s.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return f64::NAN;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(f64::NAN)
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// One CSV line keyed by its cleaned header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(header.into(), value.into());
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// Wire format of a valid date: midnight UTC with millisecond precision
const WIRE_FORMAT: &str = "%Y-%m-%dT00:00:00.000Z";

/// Calendar date of a record, or the invalid-date sentinel when the source
/// cell could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecordDate(Option<NaiveDate>);

impl RecordDate {
    pub const INVALID: RecordDate = RecordDate(None);

    pub fn from_date(date: NaiveDate) -> Self {
        Self(Some(date))
    }

    /// Locale independent parse; never fails, unparsable input yields the sentinel
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() {
            return Self::INVALID;
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Self(Some(date));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Self(Some(dt.with_timezone(&Utc).date_naive()));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Self(Some(dt.date()));
            }
        }
        for fmt in ["%Y/%m/%d", "%m/%d/%Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return Self(Some(date));
            }
        }

        Self::INVALID
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }
}

impl From<NaiveDate> for RecordDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl Serialize for RecordDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(date) => serializer.serialize_str(&date.format(WIRE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for RecordDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.map(|s| RecordDate::parse(&s)).unwrap_or(RecordDate::INVALID))
    }
}

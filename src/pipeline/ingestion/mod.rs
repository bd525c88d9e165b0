// Pipeline ingestion: decode the UTF-16LE export and split it into raw rows

use csv::ReaderBuilder;
use encoding_rs::UTF_16LE;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::RawRow;

/// Coin Metrics exports are tab separated
pub const FIELD_DELIMITER: u8 = b'\t';

/// Headers and rows of one export, in file order
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Read the whole file at `path` into raw rows.
///
/// Any I/O or CSV error fails the whole read; no partial table is returned.
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "read csv export");

    let content = decode_utf16le(&bytes);
    parse_table(&content)
}

/// Decode UTF-16LE bytes, dropping a leading byte order mark.
///
/// Malformed sequences are replaced with U+FFFD.
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let (text, had_errors) = UTF_16LE.decode_with_bom_removal(bytes);
    if had_errors {
        warn!("csv export contained malformed UTF-16LE sequences");
    }
    text.into_owned()
}

/// Split decoded tab separated content into cleaned headers and trimmed rows
pub fn parse_table(content: &str) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(FIELD_DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(clean_header).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        // Short rows lack the trailing keys; cells past the header are dropped
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.clone(), value.trim().to_string()))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

/// Remove every double quote, then trim whitespace and any stray BOM
pub fn clean_header(header: &str) -> String {
    header
        .replace('"', "")
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(s.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
        bytes
    }

    #[test]
    fn test_clean_header() {
        assert_eq!(clean_header("\"Time\""), "Time");
        assert_eq!(clean_header("  \"BTC / Val\"  "), "BTC / Val");
        assert_eq!(clean_header("\u{feff}\"Time\""), "Time");
        assert_eq!(clean_header("a\"b\"c"), "abc");
    }

    #[test]
    fn test_decode_drops_bom() {
        let text = decode_utf16le(&utf16le("Time\t≥ $1K"));
        assert_eq!(text, "Time\t≥ $1K");
    }

    #[test]
    fn test_decode_without_bom() {
        let bytes: Vec<u8> = "ab".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(decode_utf16le(&bytes), "ab");
    }

    #[test]
    fn test_parse_table_trims_and_keys_by_header() {
        let content = "\"Time\"\t\" Value \"\n 2023-01-01 \t 12.5 \n2023-01-02\t13\n";
        let table = parse_table(content).unwrap();

        assert_eq!(table.headers, vec!["Time", "Value"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("Time"), Some("2023-01-01"));
        assert_eq!(table.rows[0].get("Value"), Some("12.5"));
        assert_eq!(table.rows[1].get("Value"), Some("13"));
    }

    #[test]
    fn test_short_and_long_rows() {
        let content = "A\tB\tC\n1\n1\t2\t3\t4\n";
        let table = parse_table(content).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].len(), 1);
        assert_eq!(table.rows[0].get("B"), None);
        assert_eq!(table.rows[1].len(), 3);
        assert_eq!(table.rows[1].get("C"), Some("3"));
    }

    #[test]
    fn test_commas_are_not_separators() {
        let table = parse_table("Time\tValue\n2023-01-01\t1,234.5\n").unwrap();
        assert_eq!(table.rows[0].get("Value"), Some("1,234.5"));
    }

    #[test]
    fn test_read_raw_table_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        fs::write(&path, utf16le("\"Time\"\t\"X\"\r\n2023-02-01\t1\r\n2023-02-02\t2\r\n")).unwrap();

        let table = read_raw_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Time", "X"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].get("Time"), Some("2023-02-02"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_raw_table(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, crate::error::DashboardError::Io(_)));
    }
}

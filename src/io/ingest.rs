//! CSV ingest and normalization.
//!
//! This module is responsible for turning the published case CSV into a clean,
//! sorted, duplicate-free sequence of `RawRecord`s.
//!
//! Design goals:
//! - **Tolerant headers**: names are normalized and matched against alias lists
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior**: sort + dedup regardless of upstream order
//! - **Separation of concerns**: no resampling logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::data::sort_and_dedup;
use crate::domain::{Counts, RawRecord};
use crate::error::AppError;

/// Accepted (normalized) header names per field, in priority order.
const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "time", "zeit", "ts"];
const CASES_COLUMNS: &[&str] = &["cumulative_cases", "cases", "erkrankte", "faelle"];
const ACTIVE_COLUMNS: &[&str] = &["active_cases", "active", "aktive", "aktiv"];
const RECOVERED_COLUMNS: &[&str] = &["recovered", "genesene", "gesundete"];
const NEW_CASES_COLUMNS: &[&str] = &["new_cases", "new", "neu_erkrankte", "neuinfektionen"];
const DEATHS_COLUMNS: &[&str] = &["deaths", "tote", "verstorbene"];

/// Summary stats about the records actually kept.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_records: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub latest: Counts,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: sorted records + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub records: Vec<RawRecord>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub duplicates: usize,
}

impl IngestedData {
    /// Wrap records that did not come from a CSV (e.g. synthetic data).
    pub fn from_records(mut records: Vec<RawRecord>) -> Result<Self, AppError> {
        let rows_read = records.len();
        let duplicates = sort_and_dedup(&mut records);
        let stats = compute_stats(&records)
            .ok_or_else(|| AppError::new(3, "No records to analyse."))?;
        Ok(Self {
            records,
            stats,
            row_errors: Vec::new(),
            rows_read,
            duplicates,
        })
    }
}

/// Column positions of the six required fields.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    timestamp: usize,
    cases: usize,
    active: usize,
    recovered: usize,
    new_cases: usize,
    deaths: usize,
}

/// Read and ingest a CSV file from disk.
pub fn load_csv_file(path: &Path) -> Result<IngestedData, AppError> {
    let mut file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| AppError::new(2, format!("Failed to read CSV '{}': {e}", path.display())))?;
    ingest_csv(&text)
}

/// Parse CSV text into sorted, deduplicated records.
pub fn ingest_csv(text: &str) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map)?;
    debug!(?columns, "resolved CSV columns");

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(skipped = row_errors.len(), "skipped malformed CSV rows");
    }

    let duplicates = sort_and_dedup(&mut records);
    if duplicates > 0 {
        debug!(duplicates, "dropped duplicate timestamps");
    }

    let stats = compute_stats(&records)
        .ok_or_else(|| AppError::new(3, "No valid rows remain after parsing the CSV."))?;

    Ok(IngestedData {
        records,
        stats,
        row_errors,
        rows_read,
        duplicates,
    })
}

/// Pick `;` for semicolon-separated exports (common in German open data).
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // Keep the first column for a repeated name.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

/// Lowercase, strip a BOM, and replace every non-alphanumeric char with `_`.
pub fn normalize_header_name(name: &str) -> String {
    let name = name.trim().trim_start_matches('\u{feff}').trim();
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '_'
            }
        })
        .collect()
}

fn resolve_columns(header_map: &HashMap<String, usize>) -> Result<ColumnMap, AppError> {
    Ok(ColumnMap {
        timestamp: find_column(header_map, "timestamp", TIMESTAMP_COLUMNS)?,
        cases: find_column(header_map, "cumulative cases", CASES_COLUMNS)?,
        active: find_column(header_map, "active cases", ACTIVE_COLUMNS)?,
        recovered: find_column(header_map, "recovered", RECOVERED_COLUMNS)?,
        new_cases: find_column(header_map, "new cases", NEW_CASES_COLUMNS)?,
        deaths: find_column(header_map, "deaths", DEATHS_COLUMNS)?,
    })
}

fn find_column(header_map: &HashMap<String, usize>, field: &str, aliases: &[&str]) -> Result<usize, AppError> {
    aliases
        .iter()
        .find_map(|alias| header_map.get(*alias).copied())
        .ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "Missing required column for {field} (accepted: {}).",
                    aliases.join(", ")
                ),
            )
        })
}

fn parse_row(record: &StringRecord, columns: &ColumnMap) -> Result<RawRecord, String> {
    let timestamp = parse_timestamp(get_required(record, columns.timestamp, "timestamp")?)?;
    let counts = Counts {
        cumulative_cases: parse_count(get_required(record, columns.cases, "cumulative cases")?, "cumulative cases")?,
        active_cases: parse_count(get_required(record, columns.active, "active cases")?, "active cases")?,
        recovered: parse_count(get_required(record, columns.recovered, "recovered")?, "recovered")?,
        new_cases: parse_count(get_required(record, columns.new_cases, "new cases")?, "new cases")?,
        deaths: parse_count(get_required(record, columns.deaths, "deaths")?, "deaths")?,
    };
    Ok(RawRecord { timestamp, counts })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

/// Seconds since the Unix epoch, integer or fractional.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let parsed = if let Ok(secs) = s.parse::<i64>() {
        DateTime::from_timestamp(secs, 0)
    } else {
        let secs = s
            .parse::<f64>()
            .map_err(|_| format!("Invalid timestamp '{s}' (expected seconds since epoch)."))?;
        if !secs.is_finite() {
            return Err(format!("Invalid timestamp '{s}'."));
        }
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    };
    parsed.ok_or_else(|| format!("Timestamp out of range: '{s}'."))
}

fn parse_count(s: &str, name: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}

fn compute_stats(records: &[RawRecord]) -> Option<DatasetStats> {
    let first = records.first()?;
    let last = records.last()?;
    Some(DatasetStats {
        n_records: records.len(),
        first: first.timestamp,
        last: last.timestamp,
        latest: last.counts,
    })
}

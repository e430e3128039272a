//! Export the resampled table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::app::pipeline::RunOutput;
use crate::error::AppError;

const HEADER: [&str; 9] = [
    "timestamp",
    "date",
    "cumulative_cases",
    "active_cases",
    "recovered",
    "new_cases",
    "deaths",
    "incidence",
    "model",
];

/// Write the daily table (with derived and model columns) to a CSV file.
pub fn write_table_csv(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table(&mut writer, run)?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn write_table<W: std::io::Write>(writer: &mut csv::Writer<W>, run: &RunOutput) -> Result<(), AppError> {
    writer
        .write_record(HEADER)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    let model = run.fit.as_ref().ok().map(|f| f.predicted.as_slice());
    for (i, row) in run.rows.iter().enumerate() {
        let c = &row.counts;
        let incidence = run.derived.incidence.get(i).copied().flatten();
        let predicted = model.and_then(|p| p.get(i).copied().flatten());
        let record = [
            row.timestamp.timestamp().to_string(),
            row.timestamp.to_rfc3339(),
            c.cumulative_cases.to_string(),
            c.active_cases.to_string(),
            c.recovered.to_string(),
            c.new_cases.to_string(),
            c.deaths.to_string(),
            incidence.map(|v| format!("{v:.4}")).unwrap_or_default(),
            predicted.map(|v| format!("{v:.4}")).unwrap_or_default(),
        ];
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}

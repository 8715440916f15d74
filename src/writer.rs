use crate::error::{AppError, Result};
use crate::model::CurrentSnapshot;
use crate::table::{Row, WeatherTable, DATE_COLUMN};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S+00:00";

pub fn format_timestamp(date: &DateTime<Utc>) -> String {
    date.format(TIMESTAMP_FORMAT).to_string()
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}

/// CSV output for weather tables and snapshots. Every write truncates the
/// target file.
pub struct TableWriter;

impl TableWriter {
    pub fn write_table<P: AsRef<Path>>(path: P, table: &WeatherTable) -> Result<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(table.columns())?;
        for row in table.rows() {
            let record = std::iter::once(format_timestamp(&row.date))
                .chain(row.values.iter().map(|v| format_value(*v)));
            writer.write_record(record)?;
        }
        writer.flush()?;

        info!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }

    /// Single-row CSV: `time` followed by each current variable.
    pub fn write_snapshot<P: AsRef<Path>>(path: P, snapshot: &CurrentSnapshot) -> Result<()> {
        let path = path.as_ref();
        let time = DateTime::from_timestamp(snapshot.time, 0).ok_or_else(|| {
            AppError::InvalidData(format!("Timestamp {} out of range", snapshot.time))
        })?;

        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(std::iter::once("time").chain(snapshot.iter().map(|(n, _)| n)))?;
        writer.write_record(
            std::iter::once(format_timestamp(&time))
                .chain(snapshot.iter().map(|(_, v)| format_value(v))),
        )?;
        writer.flush()?;

        info!("Wrote current conditions to {}", path.display());
        Ok(())
    }

    /// One-character flag file: `1` when set, `0` otherwise.
    pub fn write_flag<P: AsRef<Path>>(path: P, flag: bool) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, if flag { "1" } else { "0" })?;
        info!("Wrote flag {} to {}", flag as u8, path.display());
        Ok(())
    }

    /// Parse a file produced by [`TableWriter::write_table`].
    pub fn read_table<P: AsRef<Path>>(path: P) -> Result<WeatherTable> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;

        let headers = reader.headers()?.clone();
        match headers.get(0) {
            Some(DATE_COLUMN) => {}
            other => {
                return Err(AppError::Parse(format!(
                    "Expected first column '{}', found {:?}",
                    DATE_COLUMN, other
                )))
            }
        }
        let variables: Vec<String> = headers.iter().skip(1).map(String::from).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let raw_date = record.get(0).unwrap_or_default();
            let date = NaiveDateTime::parse_from_str(raw_date, TIMESTAMP_FORMAT)
                .map_err(|e| AppError::Parse(format!("Invalid date '{}': {}", raw_date, e)))?
                .and_utc();

            let values = record
                .iter()
                .skip(1)
                .map(|field| {
                    if field.is_empty() {
                        Ok(None)
                    } else {
                        field.parse::<f64>().map(Some).map_err(|e| {
                            AppError::Parse(format!("Invalid number '{}': {}", field, e))
                        })
                    }
                })
                .collect::<Result<Vec<_>>>()?;

            rows.push(Row { date, values });
        }

        WeatherTable::new(variables, rows)
    }
}

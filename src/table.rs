use crate::error::{AppError, Result};
use crate::model::HourlySeries;
use chrono::{DateTime, Utc};

pub const DATE_COLUMN: &str = "date";

/// Evenly spaced timestamps from `start` up to but excluding `end`.
pub fn timestamp_range(start: i64, end: i64, interval: i64) -> Vec<i64> {
    if interval <= 0 || end <= start {
        return Vec::new();
    }
    (start..end).step_by(interval as usize).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub date: DateTime<Utc>,
    pub values: Vec<Option<f64>>,
}

/// Row-oriented table: `date` followed by one column per variable.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherTable {
    variables: Vec<String>,
    rows: Vec<Row>,
}

impl WeatherTable {
    pub fn new(variables: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if let Some(bad) = rows.iter().find(|r| r.values.len() != variables.len()) {
            return Err(AppError::InvalidData(format!(
                "Row at {} has {} values, expected {}",
                bad.date,
                bad.values.len(),
                variables.len()
            )));
        }
        Ok(Self { variables, rows })
    }

    pub fn columns(&self) -> Vec<&str> {
        std::iter::once(DATE_COLUMN)
            .chain(self.variables.iter().map(String::as_str))
            .collect()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.variables.iter().position(|v| v == name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Largest non-missing value in a column.
    pub fn max(&self, name: &str) -> Option<f64> {
        self.column(name)?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }

    /// True when any value in the column is present and nonzero.
    pub fn any_nonzero(&self, name: &str) -> bool {
        self.column(name)
            .map(|values| {
                values
                    .into_iter()
                    .flatten()
                    .any(|v| !v.is_nan() && v != 0.0)
            })
            .unwrap_or(false)
    }
}

pub struct TableBuilder;

impl TableBuilder {
    /// Zip the reconstructed timestamp sequence with every variable array.
    pub fn reshape(series: &HourlySeries) -> Result<WeatherTable> {
        let timestamps = timestamp_range(series.start, series.end, series.interval);

        for variable in &series.variables {
            if variable.values.len() != timestamps.len() {
                return Err(AppError::InvalidData(format!(
                    "Variable '{}' has {} values but the time range [{}, {}) step {} has {}",
                    variable.name,
                    variable.values.len(),
                    series.start,
                    series.end,
                    series.interval,
                    timestamps.len()
                )));
            }
        }

        let rows = timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| {
                let date = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
                    AppError::InvalidData(format!("Timestamp {} out of range", ts))
                })?;
                let values = series.variables.iter().map(|v| v.values[i]).collect();
                Ok(Row { date, values })
            })
            .collect::<Result<Vec<_>>>()?;

        let variables = series.variables.iter().map(|v| v.name.clone()).collect();
        WeatherTable::new(variables, rows)
    }
}

//! CSV parsing into a column-major time-series table.
//!
//! Columns keep file order. `AESTTime` is coerced to a timestamp, every other
//! column is numeric when all of its non-missing cells parse as `f64` and
//! text otherwise. Missing cells stay `None` until [`TimeSeriesTable::fill_missing`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;

use crate::error::TableError;

pub const TIME_COLUMN: &str = "AESTTime";
pub const ENERGY_COLUMN: &str = "E";

/// Tokens read as missing values, alongside the empty string.
const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A cell in a text column. Filling writes a numeric zero into text columns.
#[derive(Debug, Clone, PartialEq)]
pub enum TextCell {
    Text(String),
    Zero,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Timestamp(Vec<Option<NaiveDateTime>>),
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<TextCell>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
    /// Numeric column whose every cell was a whole number, with none missing.
    pub integer: bool,
}

impl Column {
    pub fn is_numeric(&self) -> bool {
        matches!(self.values, ColumnValues::Numeric(_))
    }
}

/// Rows of one meter file, stored by column, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    columns: Vec<Column>,
    len: usize,
}

impl TimeSeriesTable {
    /// Parses CSV content with a header row.
    ///
    /// Short rows are padded with missing cells; rows longer than the header are rejected.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(data);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() > headers.len() {
                return Err(TableError::TooManyFields {
                    row,
                    expected: headers.len(),
                    found: record.len(),
                });
            }
            for (idx, cells) in raw.iter_mut().enumerate() {
                let cell = record.get(idx).filter(|s| !is_na(s)).map(str::to_string);
                cells.push(cell);
            }
        }
        let len = raw.first().map_or(0, Vec::len);

        let mut columns = Vec::with_capacity(headers.len());
        let mut has_time = false;
        for (name, cells) in headers.into_iter().zip(raw) {
            let (values, integer) = if name == TIME_COLUMN {
                has_time = true;
                (ColumnValues::Timestamp(parse_timestamps(cells)?), false)
            } else {
                infer_values(cells)
            };
            columns.push(Column {
                name,
                values,
                integer,
            });
        }

        if !has_time {
            return Err(TableError::MissingColumn(TIME_COLUMN.to_string()));
        }

        Ok(Self { columns, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Numeric columns in file order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Values of a numeric column. Missing cells are skipped.
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let column = self
            .column(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        match &column.values {
            ColumnValues::Numeric(values) => Ok(values.iter().flatten().copied().collect()),
            _ => Err(TableError::NonNumericColumn(name.to_string())),
        }
    }

    /// Timestamps in file order. Missing timestamps are `None` until filled.
    pub fn timestamps(&self) -> &[Option<NaiveDateTime>] {
        self.columns
            .iter()
            .find_map(|c| match &c.values {
                ColumnValues::Timestamp(ts) => Some(ts.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Replaces every missing cell with zero: `0.0` in numeric columns, a
    /// numeric zero in text columns and the Unix epoch in the timestamp column.
    pub fn fill_missing(&mut self) {
        for column in &mut self.columns {
            match &mut column.values {
                ColumnValues::Numeric(values) => {
                    values.iter_mut().filter(|v| v.is_none()).for_each(|v| *v = Some(0.0));
                }
                ColumnValues::Text(values) => {
                    values
                        .iter_mut()
                        .filter(|v| v.is_none())
                        .for_each(|v| *v = Some(TextCell::Zero));
                }
                ColumnValues::Timestamp(values) => {
                    values
                        .iter_mut()
                        .filter(|v| v.is_none())
                        .for_each(|v| *v = Some(missing_timestamp()));
                }
            }
        }
    }
}

/// What a missing `AESTTime` becomes once filled: the Unix epoch.
pub(crate) fn missing_timestamp() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

fn is_na(cell: &str) -> bool {
    cell.is_empty() || NA_VALUES.contains(&cell)
}

/// Returns the column's values and whether it holds only whole numbers with no gaps.
fn infer_values(cells: Vec<Option<String>>) -> (ColumnValues, bool) {
    let integer = !cells.is_empty()
        && cells
            .iter()
            .all(|cell| cell.as_deref().is_some_and(|s| s.trim().parse::<i64>().is_ok()));

    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            Some(s) => s.trim().parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();

    match parsed {
        Some(values) => (ColumnValues::Numeric(values), integer),
        None => (
            ColumnValues::Text(cells.into_iter().map(|c| c.map(TextCell::Text)).collect()),
            false,
        ),
    }
}

fn parse_timestamps(cells: Vec<Option<String>>) -> Result<Vec<Option<NaiveDateTime>>, TableError> {
    cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            None => Ok(None),
            Some(value) => parse_timestamp(&value)
                .map(Some)
                .ok_or(TableError::InvalidTimestamp { row, value }),
        })
        .collect()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Month-first slash formats; each is retried day-first when the month is out of range.
const SLASH_DATETIME_FORMATS: &[(&str, &str)] = &[
    ("%m/%d/%Y %H:%M:%S", "%d/%m/%Y %H:%M:%S"),
    ("%m/%d/%Y %H:%M", "%d/%m/%Y %H:%M"),
];

const SLASH_DATE_FORMATS: &[(&str, &str)] = &[("%m/%d/%Y", "%d/%m/%Y")];

/// Parses a wall-clock timestamp. RFC 3339 offsets are dropped and the local
/// time is kept, since every reading is already in the meter's time zone.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    for (month_first, day_first) in SLASH_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, month_first)
            .or_else(|_| NaiveDateTime::parse_from_str(value, day_first))
        {
            return Some(dt);
        }
    }
    for (month_first, day_first) in SLASH_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, month_first)
            .or_else(|_| NaiveDate::parse_from_str(value, day_first))
        {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

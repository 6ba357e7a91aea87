//! Transaction records and daily demand series

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// A single sales transaction row from the input data source.
///
/// Only records with `quantity > 0` participate in forecasting; returns and
/// cancellations (negative quantities) are excluded downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Invoice timestamp
    pub timestamp: NaiveDateTime,
    /// Product stock code, as read (normalized when matched)
    pub stock_code: String,
    /// Signed unit quantity
    pub quantity: i64,
}

/// Normalize a stock code for matching: trim whitespace, uppercase.
pub(crate) fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Timestamp formats accepted for the invoice date column.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M",
];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    // Date-only values are midnight timestamps
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Loader for transaction data
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load transaction records from a CSV file.
    ///
    /// Expects at least `InvoiceDate`, `StockCode` and `Quantity` columns
    /// (matched case-insensitively). Rows whose invoice date cannot be
    /// parsed are dropped with a warning; malformed quantities are an
    /// error.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<TransactionRecord>> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(df)
    }

    /// Extract transaction records from an existing DataFrame.
    pub fn from_dataframe(df: DataFrame) -> Result<Vec<TransactionRecord>> {
        let dates = Self::column_timestamps(&df, Self::find_column(&df, "InvoiceDate")?)?;
        let codes = Self::column_codes(&df, Self::find_column(&df, "StockCode")?)?;
        let quantities = Self::column_quantities(&df, Self::find_column(&df, "Quantity")?)?;

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0usize;
        for i in 0..df.height() {
            match dates[i] {
                Some(timestamp) => records.push(TransactionRecord {
                    timestamp,
                    stock_code: codes[i].clone(),
                    quantity: quantities[i],
                }),
                // Unparseable invoice dates become null and the row is dropped
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(dropped, "dropped rows with unparseable invoice dates");
        }

        Ok(records)
    }

    /// Find a column by case-insensitive name match.
    fn find_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a str> {
        let want = name.to_lowercase();
        for col in df.get_column_names() {
            if col.to_lowercase() == want {
                return Ok(col);
            }
        }
        Err(ForecastError::DataParse(format!(
            "column '{}' not found in data source",
            name
        )))
    }

    fn column_timestamps(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDateTime>>> {
        let col = df.column(name)?;
        match col.dtype() {
            DataType::Utf8 => Ok(col
                .utf8()?
                .into_iter()
                .map(|opt| opt.and_then(parse_timestamp))
                .collect()),
            DataType::Datetime(unit, _) => {
                let divisor = match unit {
                    TimeUnit::Nanoseconds => 1_000_000_000,
                    TimeUnit::Microseconds => 1_000_000,
                    TimeUnit::Milliseconds => 1_000,
                };
                Ok(col
                    .datetime()?
                    .into_iter()
                    .map(|opt| {
                        opt.and_then(|ts| {
                            let secs = ts.div_euclid(divisor);
                            let frac = ts.rem_euclid(divisor) * (1_000_000_000 / divisor);
                            NaiveDateTime::from_timestamp_opt(secs, frac as u32)
                        })
                    })
                    .collect())
            }
            other => Err(ForecastError::DataParse(format!(
                "column '{}' has unsupported dtype {} for timestamps",
                name, other
            ))),
        }
    }

    fn column_codes(df: &DataFrame, name: &str) -> Result<Vec<String>> {
        // Stock codes that look numeric get inferred as integers; cast back
        let col = df.column(name)?.cast(&DataType::Utf8)?;
        col.utf8()?
            .into_iter()
            .enumerate()
            .map(|(i, opt)| {
                opt.map(|s| s.to_string()).ok_or_else(|| {
                    ForecastError::DataParse(format!("null stock code at row {}", i))
                })
            })
            .collect()
    }

    fn column_quantities(df: &DataFrame, name: &str) -> Result<Vec<i64>> {
        let col = df.column(name)?;
        let parse_one = |i: usize, opt: Option<i64>| {
            opt.ok_or_else(|| ForecastError::DataParse(format!("null quantity at row {}", i)))
        };
        match col.dtype() {
            DataType::Int64 => col
                .i64()?
                .into_iter()
                .enumerate()
                .map(|(i, opt)| parse_one(i, opt))
                .collect(),
            DataType::Int32 => col
                .i32()?
                .into_iter()
                .enumerate()
                .map(|(i, opt)| parse_one(i, opt.map(i64::from)))
                .collect(),
            DataType::Utf8 => col
                .utf8()?
                .into_iter()
                .enumerate()
                .map(|(i, opt)| {
                    opt.and_then(|s| s.trim().parse::<i64>().ok())
                        .ok_or_else(|| {
                            ForecastError::DataParse(format!(
                                "malformed quantity at row {}",
                                i
                            ))
                        })
                })
                .collect(),
            other => Err(ForecastError::DataParse(format!(
                "column '{}' has unsupported dtype {} for quantities",
                name, other
            ))),
        }
    }
}

/// Timestamp of the first positive-quantity sale for a SKU, if any.
pub fn first_sale(records: &[TransactionRecord], stock_code: &str) -> Option<NaiveDateTime> {
    let target = normalize_code(stock_code);
    records
        .iter()
        .filter(|r| r.quantity > 0 && normalize_code(&r.stock_code) == target)
        .map(|r| r.timestamp)
        .min()
}

/// A regular daily quantity series for one SKU.
///
/// Contiguity is guaranteed by construction: the series stores its first
/// date and one value per day up to its last date, with days that had no
/// transactions filled as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    stock_code: String,
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Build a daily series from transaction records for one SKU.
    ///
    /// Filters to the target stock code (case-insensitive, whitespace
    /// trimmed) and positive quantities, sums per calendar day, and
    /// re-indexes to a complete daily calendar between the first and last
    /// matching dates.
    pub fn from_transactions(
        records: &[TransactionRecord],
        stock_code: &str,
    ) -> Result<Self> {
        let target = normalize_code(stock_code);

        let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for record in records {
            if record.quantity <= 0 || normalize_code(&record.stock_code) != target {
                continue;
            }
            *per_day.entry(record.timestamp.date()).or_insert(0.0) += record.quantity as f64;
        }

        let (&start, _) = per_day
            .iter()
            .next()
            .ok_or_else(|| ForecastError::EmptySeries(target.clone()))?;
        let (&end, _) = per_day.iter().next_back().unwrap_or((&start, &0.0));

        let mut values = Vec::new();
        let mut day = start;
        while day <= end {
            values.push(per_day.get(&day).copied().unwrap_or(0.0));
            day = day
                .checked_add_days(Days::new(1))
                .ok_or_else(|| ForecastError::DataParse("date overflow".to_string()))?;
        }

        Ok(Self {
            stock_code: target,
            start,
            values,
        })
    }

    /// Create a series directly from values (one per day from `start`).
    pub fn from_values(stock_code: &str, start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptySeries(normalize_code(stock_code)));
        }
        Ok(Self {
            stock_code: normalize_code(stock_code),
            start,
            values,
        })
    }

    /// The SKU this series belongs to
    pub fn stock_code(&self) -> &str {
        &self.stock_code
    }

    /// First date of the series
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// Last date of the series
    pub fn last_date(&self) -> NaiveDate {
        self.date_at(self.values.len() - 1)
    }

    /// Number of days covered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no days (never true by construction)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Date of the i-th day
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Days::new(index as u64)
    }

    /// Quantity for a given date, if within range
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        let offset = (date - self.start).num_days();
        if offset < 0 {
            return None;
        }
        self.values.get(offset as usize).copied()
    }

    /// Daily quantities, in date order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over (date, quantity) pairs
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.date_at(i), v))
    }

    /// All dates in the series, in order
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.values.len()).map(|i| self.date_at(i)).collect()
    }

    /// Sum of quantities over the series
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Mean daily quantity
    pub fn mean(&self) -> f64 {
        self.sum() / self.values.len() as f64
    }

    /// Extract the sub-series covering `from..=to`.
    pub fn window(&self, from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to || from < self.start || to > self.last_date() {
            return Err(ForecastError::InsufficientHistory(format!(
                "window {}..={} outside series {}..={}",
                from,
                to,
                self.start,
                self.last_date()
            )));
        }
        let lo = (from - self.start).num_days() as usize;
        let hi = (to - self.start).num_days() as usize;
        Ok(Self {
            stock_code: self.stock_code.clone(),
            start: from,
            values: self.values[lo..=hi].to_vec(),
        })
    }
}

pub mod loader;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// One row of the market sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRecord {
    pub date: NaiveDate,
    pub market_return: f64,
    /// Annualized rate, e.g. 0.02 for 2%
    pub risk_free_rate: f64,
    pub futures_close: f64,
}

/// One row of the fund sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundRecord {
    pub date: NaiveDate,
    pub fund_code: String,
    pub cumulative_nav: f64,
}

/// Market and fund rows joined on date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub market_return: f64,
    pub risk_free_rate: f64,
    pub futures_close: f64,
    pub cumulative_nav: f64,
}

/// Date-sorted, duplicate-free join of both sheets.
#[derive(Debug, Clone, Default)]
pub struct AlignedData {
    pub rows: Vec<AlignedRow>,
}

impl AlignedData {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|row| row.date).collect()
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not parse date '{value}' on line {line}")]
    DateParse { value: String, line: u64 },
    #[error("Could not parse {column} value '{value}' on line {line}")]
    NumberParse {
        column: String,
        value: String,
        line: u64,
    },
    #[error("Missing data for calculation")]
    MissingData,
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Duplicate date in {sheet} data: {date}")]
    DuplicateDate { sheet: &'static str, date: NaiveDate },
}

pub type Result<T> = std::result::Result<T, DataError>;

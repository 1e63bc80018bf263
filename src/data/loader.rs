use super::{AlignedData, AlignedRow, DataError, FundRecord, MarketRecord, Result};
use crate::config::ColumnNames;
use chrono::{NaiveDate, NaiveDateTime};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

pub struct DataLoader;

impl DataLoader {
    fn reader_builder() -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All);
        builder
    }

    /// Maps each required column to its position, matching names case-insensitively.
    fn locate_columns(headers: &StringRecord, required: &[&str]) -> Result<Vec<usize>> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();

        required
            .iter()
            .map(|column| {
                positions
                    .get(&column.to_lowercase())
                    .copied()
                    .ok_or_else(|| DataError::MissingColumn(column.to_string()))
            })
            .collect()
    }

    pub fn parse_date(value: &str, line: u64) -> Result<NaiveDate> {
        let value = value.trim();
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Ok(date);
            }
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(datetime.date());
            }
        }
        Err(DataError::DateParse {
            value: value.to_string(),
            line,
        })
    }

    /// Returns `Ok(None)` for an empty cell.
    fn parse_number(
        record: &StringRecord,
        idx: usize,
        column: &str,
        line: u64,
    ) -> Result<Option<f64>> {
        let raw = record.get(idx).unwrap_or("").trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<f64>()
            .map(Some)
            .map_err(|_| DataError::NumberParse {
                column: column.to_string(),
                value: raw.to_string(),
                line,
            })
    }

    fn line_of(record: &StringRecord) -> u64 {
        record.position().map(|p| p.line()).unwrap_or(0)
    }

    pub fn load_market<P: AsRef<Path>>(
        path: P,
        columns: &ColumnNames,
    ) -> Result<Vec<MarketRecord>> {
        let rdr = Self::reader_builder().from_path(&path)?;
        let records = Self::read_market(rdr, columns)?;
        info!(
            path = %path.as_ref().display(),
            rows = records.len(),
            "Loaded market data"
        );
        Ok(records)
    }

    pub fn read_market<R: io::Read>(
        mut rdr: Reader<R>,
        columns: &ColumnNames,
    ) -> Result<Vec<MarketRecord>> {
        let required = [
            columns.date.as_str(),
            columns.market_return.as_str(),
            columns.risk_free_rate.as_str(),
            columns.futures_close.as_str(),
        ];
        let idx = Self::locate_columns(rdr.headers()?, &required)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.records() {
            let record = result?;
            let line = Self::line_of(&record);
            let date = Self::parse_date(record.get(idx[0]).unwrap_or(""), line)?;
            let market_return = Self::parse_number(&record, idx[1], required[1], line)?;
            let risk_free_rate = Self::parse_number(&record, idx[2], required[2], line)?;
            let futures_close = Self::parse_number(&record, idx[3], required[3], line)?;

            match (market_return, risk_free_rate, futures_close) {
                (Some(market_return), Some(risk_free_rate), Some(futures_close)) => {
                    records.push(MarketRecord {
                        date,
                        market_return,
                        risk_free_rate,
                        futures_close,
                    })
                }
                _ => {
                    debug!(%date, line, "Skipping market row with empty cells");
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "Market rows with empty cells were skipped");
        }
        Ok(records)
    }

    pub fn load_fund<P: AsRef<Path>>(
        path: P,
        columns: &ColumnNames,
        fund_code: &str,
    ) -> Result<Vec<FundRecord>> {
        let rdr = Self::reader_builder().from_path(&path)?;
        let records = Self::read_fund(rdr, columns, fund_code)?;
        info!(
            path = %path.as_ref().display(),
            fund_code,
            rows = records.len(),
            "Loaded fund data"
        );
        Ok(records)
    }

    /// Reads the fund sheet, keeping only rows for `fund_code`.
    pub fn read_fund<R: io::Read>(
        mut rdr: Reader<R>,
        columns: &ColumnNames,
        fund_code: &str,
    ) -> Result<Vec<FundRecord>> {
        let required = [
            columns.date.as_str(),
            columns.fund_code.as_str(),
            columns.cumulative_nav.as_str(),
        ];
        let idx = Self::locate_columns(rdr.headers()?, &required)?;

        let mut records = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let code = record.get(idx[1]).unwrap_or("").trim();
            if !Self::fund_code_matches(code, fund_code) {
                continue;
            }
            let line = Self::line_of(&record);
            let date = Self::parse_date(record.get(idx[0]).unwrap_or(""), line)?;
            match Self::parse_number(&record, idx[2], required[2], line)? {
                Some(cumulative_nav) => records.push(FundRecord {
                    date,
                    fund_code: code.to_string(),
                    cumulative_nav,
                }),
                None => warn!(%date, line, "Skipping fund row with empty NAV"),
            }
        }
        Ok(records)
    }

    /// Codes compare numerically when both sides parse, so "005827" and "5827.0" match "5827".
    fn fund_code_matches(code: &str, wanted: &str) -> bool {
        let wanted = wanted.trim();
        match (code.parse::<f64>(), wanted.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => code == wanted,
        }
    }

    fn index_by_date<T>(
        rows: &[T],
        date_of: impl Fn(&T) -> NaiveDate,
        sheet: &'static str,
    ) -> Result<HashMap<NaiveDate, usize>> {
        let mut by_date = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let date = date_of(row);
            if by_date.insert(date, i).is_some() {
                return Err(DataError::DuplicateDate { sheet, date });
            }
        }
        Ok(by_date)
    }

    /// Inner-joins both sheets on date and sorts ascending.
    pub fn align(market: &[MarketRecord], fund: &[FundRecord]) -> Result<AlignedData> {
        Self::index_by_date(market, |r| r.date, "market")?;
        let fund_by_date = Self::index_by_date(fund, |r| r.date, "fund")?;

        let mut rows: Vec<AlignedRow> = market
            .iter()
            .filter_map(|m| {
                fund_by_date.get(&m.date).map(|&j| AlignedRow {
                    date: m.date,
                    market_return: m.market_return,
                    risk_free_rate: m.risk_free_rate,
                    futures_close: m.futures_close,
                    cumulative_nav: fund[j].cumulative_nav,
                })
            })
            .collect();
        rows.sort_by_key(|row| row.date);

        if rows.is_empty() {
            return Err(DataError::MissingData);
        }

        debug!(
            market_rows = market.len(),
            fund_rows = fund.len(),
            aligned_rows = rows.len(),
            "Aligned market and fund data"
        );
        Ok(AlignedData { rows })
    }

    /// Loads both sheets and aligns them.
    pub fn load_aligned<P: AsRef<Path>, Q: AsRef<Path>>(
        market_path: P,
        fund_path: Q,
        columns: &ColumnNames,
        fund_code: &str,
    ) -> Result<AlignedData> {
        let market = Self::load_market(market_path, columns)?;
        let fund = Self::load_fund(fund_path, columns, fund_code)?;
        if fund.is_empty() {
            warn!(fund_code, "No fund rows matched the requested code");
            return Err(DataError::MissingData);
        }
        Self::align(&market, &fund)
    }
}

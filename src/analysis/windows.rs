use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("Fewer than two {frequency} period ends between {start} and {end} (found {found})")]
    TooFewBoundaries {
        start: NaiveDate,
        end: NaiveDate,
        frequency: Frequency,
        found: usize,
    },
    #[error("Invalid date range: {start} is after {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

pub type Result<T> = std::result::Result<T, WindowError>;

/// Calendar period whose month ends form the window boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    #[default]
    Quarterly,
    Semiannual,
    Annual,
}

impl Frequency {
    pub fn months(self) -> u32 {
        match self {
            Frequency::Monthly => 1,
            Frequency::Quarterly => 3,
            Frequency::Semiannual => 6,
            Frequency::Annual => 12,
        }
    }

    fn is_period_end_month(self, month: u32) -> bool {
        month % self.months() == 0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Semiannual => "semiannual",
            Frequency::Annual => "annual",
        };
        f.write_str(name)
    }
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

/// Every calendar period end falling inside `[start, end]`, ascending.
pub fn period_end_boundaries(
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
) -> Vec<NaiveDate> {
    let mut boundaries = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());

    while let Some(candidate) = month_end(year, month) {
        if candidate > end {
            break;
        }
        if candidate >= start && frequency.is_period_end_month(month) {
            boundaries.push(candidate);
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }

    boundaries
}

/// Consecutive boundary pairs as windows; one fewer window than boundaries.
pub fn windows_from_boundaries(boundaries: &[NaiveDate]) -> Vec<Window> {
    boundaries
        .windows(2)
        .enumerate()
        .map(|(index, pair)| Window {
            index,
            start: pair[0],
            end: pair[1],
        })
        .collect()
}

pub fn analysis_windows(
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
) -> Result<Vec<Window>> {
    if start > end {
        return Err(WindowError::InvertedRange { start, end });
    }
    let boundaries = period_end_boundaries(start, end, frequency);
    if boundaries.len() < 2 {
        return Err(WindowError::TooFewBoundaries {
            start,
            end,
            frequency,
            found: boundaries.len(),
        });
    }
    Ok(windows_from_boundaries(&boundaries))
}

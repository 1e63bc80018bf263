use crate::analysis::windows::Window;
use crate::data::AlignedData;
use chrono::NaiveDate;
use serde::Serialize;

/// Values keyed by strictly increasing dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatedSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DatedSeries {
    /// Builds a series from `(date, value)` pairs, sorting by date.
    /// Later duplicates of a date are dropped.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut pairs: Vec<_> = pairs.into_iter().collect();
        pairs.sort_by_key(|(date, _)| *date);
        pairs.dedup_by_key(|(date, _)| *date);
        let (dates, values) = pairs.into_iter().unzip();
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Points with `window.start <= date < window.end`.
    pub fn slice(&self, window: &Window) -> DatedSeries {
        let lo = self.dates.partition_point(|d| *d < window.start);
        let hi = self.dates.partition_point(|d| *d < window.end);
        let hi = hi.max(lo);
        DatedSeries {
            dates: self.dates[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Drops exactly one leading point.
    pub fn skip_first(&self) -> DatedSeries {
        DatedSeries {
            dates: self.dates.iter().skip(1).copied().collect(),
            values: self.values.iter().skip(1).copied().collect(),
        }
    }

    /// Pairs values of `self` and `other` on the dates present in both.
    pub fn paired_with(&self, other: &DatedSeries) -> (Vec<f64>, Vec<f64>) {
        self.iter()
            .filter_map(|(date, x)| other.get(date).map(|y| (x, y)))
            .unzip()
    }
}

/// Daily rate compounded over a trading year: `(1 + annual)^(1/days) - 1`.
pub fn daily_risk_free(annual_rate: f64, trading_days_per_year: u32) -> f64 {
    (1.0 + annual_rate).powf(1.0 / trading_days_per_year as f64) - 1.0
}

/// Excess-return inputs for the regression plus the futures price series.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExcessReturns {
    pub market: DatedSeries,
    pub fund: DatedSeries,
    pub futures: DatedSeries,
}

impl ExcessReturns {
    pub fn from_aligned(data: &AlignedData, trading_days_per_year: u32) -> Self {
        let risk_free: Vec<f64> = data
            .rows
            .iter()
            .map(|row| daily_risk_free(row.risk_free_rate, trading_days_per_year))
            .collect();

        let market = DatedSeries::from_pairs(
            data.rows
                .iter()
                .zip(&risk_free)
                .map(|(row, rf)| (row.date, row.market_return - rf)),
        )
        .skip_first();

        // pct change is undefined for the first observation
        let fund = DatedSeries::from_pairs(
            data.rows
                .windows(2)
                .zip(risk_free.iter().skip(1))
                .filter_map(|(pair, rf)| {
                    let (prev, curr) = (&pair[0], &pair[1]);
                    let change = curr.cumulative_nav / prev.cumulative_nav - 1.0;
                    change.is_finite().then_some((curr.date, change - rf))
                }),
        );

        let futures =
            DatedSeries::from_pairs(data.rows.iter().map(|row| (row.date, row.futures_close)));

        Self {
            market,
            fund,
            futures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AlignedRow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(day: u32, market_return: f64, rf: f64, nav: f64) -> AlignedRow {
        AlignedRow {
            date: date(2024, 1, day),
            market_return,
            risk_free_rate: rf,
            futures_close: 3500.0 + day as f64,
            cumulative_nav: nav,
        }
    }

    #[test]
    fn daily_rate_compounds_back_to_annual() {
        let daily = daily_risk_free(0.03, 252);
        assert!(((1.0 + daily).powi(252) - 1.03).abs() < 1e-12);
        assert_eq!(daily_risk_free(0.0, 252), 0.0);
    }

    #[test]
    fn excess_returns_drop_first_point() {
        let data = AlignedData {
            rows: vec![
                row(2, 0.010, 0.0, 1.00),
                row(3, 0.020, 0.0, 1.02),
                row(4, -0.010, 0.0, 0.9996),
            ],
        };
        let excess = ExcessReturns::from_aligned(&data, 252);

        assert_eq!(excess.market.dates(), &[date(2024, 1, 3), date(2024, 1, 4)]);
        assert_eq!(excess.fund.dates(), excess.market.dates());
        assert_eq!(excess.futures.len(), 3);

        assert!((excess.market.values()[0] - 0.02).abs() < 1e-15);
        assert!((excess.fund.values()[0] - 0.02).abs() < 1e-12);
        assert!((excess.fund.values()[1] + 0.02).abs() < 1e-12);
    }

    #[test]
    fn fund_excess_subtracts_same_day_rate() {
        let data = AlignedData {
            rows: vec![row(2, 0.0, 0.05, 1.0), row(3, 0.0, 0.10, 1.0)],
        };
        let excess = ExcessReturns::from_aligned(&data, 252);
        let expected = -daily_risk_free(0.10, 252);
        assert!((excess.fund.values()[0] - expected).abs() < 1e-15);
        assert!((excess.market.values()[0] - expected).abs() < 1e-15);
    }

    #[test]
    fn slice_is_half_open() {
        let series = DatedSeries::from_pairs((1..=10).map(|d| (date(2024, 1, d), d as f64)));
        let window = Window {
            index: 0,
            start: date(2024, 1, 3),
            end: date(2024, 1, 6),
        };
        let sliced = series.slice(&window);
        assert_eq!(sliced.values(), &[3.0, 4.0, 5.0]);
        assert_eq!(sliced.mean(), Some(4.0));

        let empty = Window {
            index: 1,
            start: date(2024, 2, 1),
            end: date(2024, 3, 1),
        };
        assert!(series.slice(&empty).is_empty());
        assert_eq!(series.slice(&empty).mean(), None);
    }

    #[test]
    fn pairing_keeps_common_dates_only() {
        let a = DatedSeries::from_pairs(vec![(date(2024, 1, 2), 1.0), (date(2024, 1, 3), 2.0)]);
        let b = DatedSeries::from_pairs(vec![(date(2024, 1, 3), 20.0), (date(2024, 1, 4), 30.0)]);
        assert_eq!(a.paired_with(&b), (vec![2.0], vec![20.0]));
    }
}

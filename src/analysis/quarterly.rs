use super::excess_returns::ExcessReturns;
use super::hedge::{HedgeCalculator, HedgeResult};
use super::regression::{fit_ols_slices, OlsFit, RegressionError};
use super::windows::Window;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Exposure notional list has {notionals} entries but there are {windows} windows")]
    MissingNotional { windows: usize, notionals: usize },
    #[error("No analysis windows to process")]
    NoWindows,
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HedgeStatus {
    Hedged(HedgeResult),
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WindowOutcome {
    /// One side of the regression had no observations
    InsufficientData,
    /// Both sides had data but the fit was undefined
    EstimationFailed { error: RegressionError },
    Estimated { fit: OlsFit, hedge: HedgeStatus },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowReport {
    pub window: Window,
    pub market_obs: usize,
    pub fund_obs: usize,
    pub futures_obs: usize,
    pub mean_futures_price: Option<f64>,
    pub exposure_notional: f64,
    pub outcome: WindowOutcome,
}

impl WindowReport {
    pub fn fit(&self) -> Option<&OlsFit> {
        match &self.outcome {
            WindowOutcome::Estimated { fit, .. } => Some(fit),
            _ => None,
        }
    }

    pub fn hedge(&self) -> Option<&HedgeResult> {
        match &self.outcome {
            WindowOutcome::Estimated {
                hedge: HedgeStatus::Hedged(hedge),
                ..
            } => Some(hedge),
            _ => None,
        }
    }
}

/// Per-window beta estimation and hedge sizing over a fixed window schedule.
pub struct QuarterlyAnalysis {
    hedger: HedgeCalculator,
}

impl QuarterlyAnalysis {
    pub fn new(hedger: HedgeCalculator) -> Self {
        Self { hedger }
    }

    /// Notionals are matched to windows by position. The list is checked before any
    /// window is processed; a failure inside one window never stops the others.
    pub fn run(
        &self,
        returns: &ExcessReturns,
        windows: &[Window],
        exposure_notionals: &[f64],
    ) -> Result<Vec<WindowReport>> {
        if windows.is_empty() {
            return Err(AnalysisError::NoWindows);
        }
        if exposure_notionals.len() < windows.len() {
            return Err(AnalysisError::MissingNotional {
                windows: windows.len(),
                notionals: exposure_notionals.len(),
            });
        }
        if exposure_notionals.len() > windows.len() {
            debug!(
                extra = exposure_notionals.len() - windows.len(),
                "Ignoring exposure notionals beyond the last window"
            );
        }

        let reports: Vec<WindowReport> = windows
            .iter()
            .zip(exposure_notionals)
            .map(|(window, &notional)| self.process_window(returns, window, notional))
            .collect();

        let estimated = reports.iter().filter(|r| r.fit().is_some()).count();
        info!(
            windows = reports.len(),
            estimated,
            skipped = reports.len() - estimated,
            "Completed window analysis"
        );
        Ok(reports)
    }

    pub fn process_window(
        &self,
        returns: &ExcessReturns,
        window: &Window,
        exposure_notional: f64,
    ) -> WindowReport {
        let market = returns.market.slice(window);
        let fund = returns.fund.slice(window);
        let futures = returns.futures.slice(window);
        let mean_futures_price = futures.mean();

        debug!(
            window = %window,
            market_obs = market.len(),
            fund_obs = fund.len(),
            futures_obs = futures.len(),
            "Sliced window"
        );

        let outcome = if market.is_empty() || fund.is_empty() {
            warn!(window = %window, "Insufficient data, skipping estimation and hedge");
            WindowOutcome::InsufficientData
        } else {
            let (x, y) = market.paired_with(&fund);
            match fit_ols_slices(&x, &y) {
                Ok(fit) => {
                    let hedge =
                        self.hedge_for(window, &fit, exposure_notional, mean_futures_price);
                    WindowOutcome::Estimated { fit, hedge }
                }
                Err(error) => {
                    warn!(window = %window, %error, "Beta estimation failed");
                    WindowOutcome::EstimationFailed { error }
                }
            }
        };

        WindowReport {
            window: *window,
            market_obs: market.len(),
            fund_obs: fund.len(),
            futures_obs: futures.len(),
            mean_futures_price,
            exposure_notional,
            outcome,
        }
    }

    fn hedge_for(
        &self,
        window: &Window,
        fit: &OlsFit,
        exposure_notional: f64,
        mean_futures_price: Option<f64>,
    ) -> HedgeStatus {
        let Some(price) = mean_futures_price else {
            warn!(window = %window, "No futures prices in window, hedge unavailable");
            return HedgeStatus::Unavailable {
                reason: "no futures prices in window".to_string(),
            };
        };
        match self.hedger.compute(fit.beta, exposure_notional, price) {
            Ok(hedge) => HedgeStatus::Hedged(hedge),
            Err(error) => {
                warn!(window = %window, %error, "Hedge computation failed");
                HedgeStatus::Unavailable {
                    reason: error.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::excess_returns::DatedSeries;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(index: usize, start: NaiveDate, end: NaiveDate) -> Window {
        Window { index, start, end }
    }

    fn jan_returns() -> ExcessReturns {
        let xs = [0.01, 0.02, -0.01, 0.03, 0.005];
        let days = [2, 3, 4, 5, 8];
        let market =
            DatedSeries::from_pairs(days.iter().zip(xs).map(|(&d, x)| (date(2024, 1, d), x)));
        let fund = DatedSeries::from_pairs(
            days.iter()
                .zip(xs)
                .map(|(&d, x)| (date(2024, 1, d), 1.5 * x + 0.0001 * d as f64)),
        );
        let futures =
            DatedSeries::from_pairs(days.iter().map(|&d| (date(2024, 1, d), 3500.0 + d as f64)));
        ExcessReturns {
            market,
            fund,
            futures,
        }
    }

    #[test]
    fn short_notional_list_fails_before_processing() {
        let analysis = QuarterlyAnalysis::new(HedgeCalculator::default());
        let windows = vec![
            window(0, date(2024, 1, 1), date(2024, 2, 1)),
            window(1, date(2024, 2, 1), date(2024, 3, 1)),
        ];
        let err = analysis.run(&jan_returns(), &windows, &[1e9]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::MissingNotional {
                windows: 2,
                notionals: 1
            }
        ));
    }

    #[test]
    fn empty_window_skips_hedge_and_later_windows_continue() {
        let analysis = QuarterlyAnalysis::new(HedgeCalculator::default());
        let windows = vec![
            window(0, date(2023, 12, 1), date(2024, 1, 1)),
            window(1, date(2024, 1, 1), date(2024, 2, 1)),
        ];
        let reports = analysis
            .run(&jan_returns(), &windows, &[1e9, 41_144_000_000.0])
            .unwrap();

        assert_eq!(reports[0].outcome, WindowOutcome::InsufficientData);
        assert!(reports[0].hedge().is_none());
        assert_eq!(reports[0].mean_futures_price, None);

        let fit = reports[1].fit().unwrap();
        assert!((fit.beta - 1.5).abs() < 0.1);
        let hedge = reports[1].hedge().unwrap();
        let price = reports[1].mean_futures_price.unwrap();
        let expected = (fit.beta * 41_144_000_000.0 / (price * 300.0)).trunc() as i64;
        assert_eq!(hedge.contracts, expected);
    }

    #[test]
    fn degenerate_window_is_reported_not_fatal() {
        let analysis = QuarterlyAnalysis::new(HedgeCalculator::default());
        let returns = jan_returns();
        let single_day = window(0, date(2024, 1, 2), date(2024, 1, 3));
        let report = analysis.process_window(&returns, &single_day, 1e9);
        assert_eq!(
            report.outcome,
            WindowOutcome::EstimationFailed {
                error: RegressionError::InsufficientData { n: 1 }
            }
        );
        assert!(report.hedge().is_none());
    }

    #[test]
    fn missing_futures_marks_hedge_unavailable() {
        let analysis = QuarterlyAnalysis::new(HedgeCalculator::default());
        let mut returns = jan_returns();
        returns.futures = DatedSeries::default();
        let report =
            analysis.process_window(&returns, &window(0, date(2024, 1, 1), date(2024, 2, 1)), 1e9);
        assert!(report.fit().is_some());
        assert!(matches!(
            &report.outcome,
            WindowOutcome::Estimated {
                hedge: HedgeStatus::Unavailable { .. },
                ..
            }
        ));
    }

    #[test]
    fn fund_gap_with_market_data_is_insufficient() {
        let analysis = QuarterlyAnalysis::new(HedgeCalculator::default());
        let mut returns = jan_returns();
        returns.fund =
            DatedSeries::from_pairs(vec![(date(2024, 5, 2), 0.01), (date(2024, 5, 3), 0.02)]);
        let january = window(0, date(2024, 1, 1), date(2024, 2, 1));

        let report = analysis.process_window(&returns, &january, 41_144_000_000.0);
        assert_eq!(report.market_obs, 5);
        assert_eq!(report.fund_obs, 0);
        assert_eq!(report.outcome, WindowOutcome::InsufficientData);
        assert!(report.hedge().is_none());
        assert_eq!(
            crate::report::render_window(&report),
            "2024-01-01 to 2024-02-01: insufficient data, beta not computed\n"
        );
    }
}

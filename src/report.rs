//! Text and CSV presentation of window results.

use crate::analysis::quarterly::{HedgeStatus, WindowOutcome, WindowReport};
use chrono::NaiveDate;
use csv::Writer;
use serde::Serialize;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Human-readable block for one window.
pub fn render_window(report: &WindowReport) -> String {
    let range = report.window.to_string();

    match &report.outcome {
        WindowOutcome::InsufficientData => {
            format!("{}: insufficient data, beta not computed\n", range)
        }
        WindowOutcome::EstimationFailed { error } => {
            format!("{}: beta estimation failed: {}\n", range, error)
        }
        WindowOutcome::Estimated { fit, hedge } => {
            let headline = format!(
                "{}: beta {:.4}, R^2 {:.4}, p-value {:.20}\n",
                range, fit.beta, fit.r_squared, fit.p_value
            );
            let detail = match hedge {
                HedgeStatus::Hedged(hedge) => format!(
                    "  futures contracts: {}\n  residual beta: {}\n",
                    hedge.contracts, hedge.residual_beta
                ),
                HedgeStatus::Unavailable { reason } => {
                    format!("  hedge unavailable: {}\n", reason)
                }
            };
            headline + &detail
        }
    }
}

pub fn render_all(reports: &[WindowReport]) -> String {
    reports.iter().map(render_window).collect()
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    window_start: NaiveDate,
    window_end: NaiveDate,
    status: &'a str,
    market_obs: usize,
    fund_obs: usize,
    futures_obs: usize,
    mean_futures_price: Option<f64>,
    exposure_notional: f64,
    beta: Option<f64>,
    intercept: Option<f64>,
    r_squared: Option<f64>,
    p_value: Option<f64>,
    beta_std_error: Option<f64>,
    contracts: Option<i64>,
    residual_beta: Option<f64>,
    note: String,
}

impl<'a> CsvRow<'a> {
    fn from_report(report: &'a WindowReport) -> Self {
        let fit = report.fit();
        let hedge = report.hedge();
        let (status, note) = match &report.outcome {
            WindowOutcome::InsufficientData => ("insufficient_data", String::new()),
            WindowOutcome::EstimationFailed { error } => ("estimation_failed", error.to_string()),
            WindowOutcome::Estimated {
                hedge: HedgeStatus::Unavailable { reason },
                ..
            } => ("hedge_unavailable", reason.clone()),
            WindowOutcome::Estimated { .. } => ("hedged", String::new()),
        };

        Self {
            window_start: report.window.start,
            window_end: report.window.end,
            status,
            market_obs: report.market_obs,
            fund_obs: report.fund_obs,
            futures_obs: report.futures_obs,
            mean_futures_price: report.mean_futures_price,
            exposure_notional: report.exposure_notional,
            beta: fit.map(|f| f.beta),
            intercept: fit.map(|f| f.intercept),
            r_squared: fit.map(|f| f.r_squared),
            p_value: fit.map(|f| f.p_value),
            beta_std_error: fit.and_then(|f| f.beta_std_error),
            contracts: hedge.map(|h| h.contracts),
            residual_beta: hedge.map(|h| h.residual_beta),
            note,
        }
    }
}

pub fn write_csv_to<W: io::Write>(writer: W, reports: &[WindowReport]) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    for report in reports {
        wtr.serialize(CsvRow::from_report(report))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv<P: AsRef<Path>>(path: P, reports: &[WindowReport]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to(file, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::hedge::HedgeResult;
    use crate::analysis::regression::fit_ols_slices;
    use crate::analysis::windows::Window;

    fn window() -> Window {
        Window {
            index: 0,
            start: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        }
    }

    fn estimated_report() -> WindowReport {
        let fit = fit_ols_slices(&[0.01, 0.02, -0.01, 0.03], &[0.02, 0.04, -0.02, 0.06]).unwrap();
        WindowReport {
            window: window(),
            market_obs: 4,
            fund_obs: 4,
            futures_obs: 5,
            mean_futures_price: Some(3500.0),
            exposure_notional: 41_144_000_000.0,
            outcome: WindowOutcome::Estimated {
                fit,
                hedge: HedgeStatus::Hedged(HedgeResult {
                    contracts: 78369,
                    hedge_notional: 82_287_450_000.0,
                    residual_beta: 0.0000121,
                }),
            },
        }
    }

    #[test]
    fn renders_estimated_window() {
        let text = render_window(&estimated_report());
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("2023-12-31 to 2024-03-31: beta 2.0000, R^2 1.0000, p-value 0."));
        let p_digits = header.rsplit("p-value ").next().unwrap();
        assert_eq!(p_digits.len(), 22);
        assert_eq!(lines.next(), Some("  futures contracts: 78369"));
        assert_eq!(lines.next(), Some("  residual beta: 0.0000121"));
    }

    #[test]
    fn renders_skipped_window_without_hedge() {
        let report = WindowReport {
            outcome: WindowOutcome::InsufficientData,
            fund_obs: 0,
            ..estimated_report()
        };
        assert_eq!(
            render_window(&report),
            "2023-12-31 to 2024-03-31: insufficient data, beta not computed\n"
        );
    }

    #[test]
    fn csv_has_one_row_per_window() {
        let skipped = WindowReport {
            outcome: WindowOutcome::InsufficientData,
            ..estimated_report()
        };
        let mut buf = Vec::new();
        write_csv_to(&mut buf, &[estimated_report(), skipped]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("window_start,window_end,status,"));
        assert!(lines[1].contains(",hedged,"));
        assert!(lines[1].contains(",78369,"));
        assert!(lines[2].contains(",insufficient_data,"));
    }
}

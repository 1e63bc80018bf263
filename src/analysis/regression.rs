//! Single-regressor ordinary least squares with an intercept.
//!
//! Slope, R², standard errors and the slope p-value all come from one fit, so the
//! reported beta and its significance are always consistent.

use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum RegressionError {
    #[error("Regressor and response lengths differ ({x} vs {y})")]
    LengthMismatch { x: usize, y: usize },
    #[error("Insufficient data for regression: {n} observations, need at least 2")]
    InsufficientData { n: usize },
    #[error("Regressor has zero variance")]
    ZeroVariance,
    #[error("Non-finite value in regression input")]
    NonFinite,
    #[error("Student-t distribution error: {0}")]
    Distribution(String),
}

pub type Result<T> = std::result::Result<T, RegressionError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OlsFit {
    pub n_obs: usize,
    pub intercept: f64,
    pub beta: f64,
    pub r_squared: f64,
    /// Residual degrees of freedom, `n - 2`
    pub df_resid: usize,
    /// `None` when there are no residual degrees of freedom
    pub residual_std_error: Option<f64>,
    pub intercept_std_error: Option<f64>,
    pub beta_std_error: Option<f64>,
    pub t_statistic: Option<f64>,
    /// Two-sided p-value for a zero slope
    pub p_value: f64,
}

/// Regresses `y` on `x` with a constant term.
pub fn fit_ols(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Result<OlsFit> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let n_obs = x.len();
    if n_obs < 2 {
        return Err(RegressionError::InsufficientData { n: n_obs });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(RegressionError::NonFinite);
    }

    let n = n_obs as f64;
    let x_mean = x.sum() / n;
    let y_mean = y.sum() / n;
    let sxx = x.mapv(|v| (v - x_mean).powi(2)).sum();
    if x.iter().all(|v| *v == x[0]) || sxx == 0.0 {
        return Err(RegressionError::ZeroVariance);
    }

    // Design matrix [1, x]
    let mut design = Array2::<f64>::ones((n_obs, 2));
    design.column_mut(1).assign(&x);

    // (X'X)^-1 in closed form; det(X'X) = n * Sxx
    let xtx = design.t().dot(&design);
    let det = n * sxx;
    let xtx_inv = Array2::from_shape_vec(
        (2, 2),
        vec![
            xtx[[1, 1]] / det,
            -xtx[[0, 1]] / det,
            -xtx[[1, 0]] / det,
            xtx[[0, 0]] / det,
        ],
    )
    .map_err(|_| RegressionError::ZeroVariance)?;

    // Slope from centered moments, intercept from the means
    let sxy = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - x_mean) * (yi - y_mean))
        .sum::<f64>();
    let beta = sxy / sxx;
    let intercept = y_mean - beta * x_mean;
    let coefficients = Array1::from(vec![intercept, beta]);

    let fitted = design.dot(&coefficients);
    let residuals = &y - &fitted;
    let ssr = residuals.mapv(|r| r * r).sum();
    let sst = y.mapv(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 {
        (1.0 - ssr / sst).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let df_resid = n_obs - 2;
    if df_resid == 0 {
        return Ok(OlsFit {
            n_obs,
            intercept,
            beta,
            r_squared,
            df_resid,
            residual_std_error: None,
            intercept_std_error: None,
            beta_std_error: None,
            t_statistic: None,
            p_value: 1.0,
        });
    }

    let sigma2 = ssr / df_resid as f64;
    let std_errors = xtx_inv.diag().mapv(|v| (sigma2 * v).max(0.0).sqrt());
    let beta_se = std_errors[1];
    let t_statistic = if beta_se > 0.0 {
        beta / beta_se
    } else if beta == 0.0 {
        0.0
    } else {
        f64::INFINITY.copysign(beta)
    };
    let p_value = two_sided_p_value(t_statistic, df_resid)?;

    Ok(OlsFit {
        n_obs,
        intercept,
        beta,
        r_squared,
        df_resid,
        residual_std_error: Some(sigma2.sqrt()),
        intercept_std_error: Some(std_errors[0]),
        beta_std_error: Some(beta_se),
        t_statistic: Some(t_statistic),
        p_value,
    })
}

/// Convenience wrapper over slices.
pub fn fit_ols_slices(x: &[f64], y: &[f64]) -> Result<OlsFit> {
    fit_ols(ArrayView1::from(x), ArrayView1::from(y))
}

fn two_sided_p_value(t: f64, df: usize) -> Result<f64> {
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| RegressionError::Distribution(e.to_string()))?;
    let p = 2.0 * dist.sf(t.abs());
    Ok(p.clamp(0.0, 1.0))
}

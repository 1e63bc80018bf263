use serde::Serialize;
use thiserror::Error;

/// Index points per contract for the benchmark future.
pub const DEFAULT_CONTRACT_MULTIPLIER: f64 = 300.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HedgeError {
    #[error("Futures price must be positive, got {0}")]
    NonPositiveFuturesPrice(f64),
    #[error("Exposure notional must be positive, got {0}")]
    NonPositiveNotional(f64),
    #[error("Contract multiplier must be positive, got {0}")]
    NonPositiveMultiplier(f64),
    #[error("Non-finite hedge input")]
    NonFinite,
    #[error("Contract count {0} does not fit in an i64")]
    Overflow(f64),
}

pub type Result<T> = std::result::Result<T, HedgeError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HedgeResult {
    /// Truncated toward zero; negative for a negative beta
    pub contracts: i64,
    /// Notional covered by the contracts at the given futures price
    pub hedge_notional: f64,
    pub residual_beta: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct HedgeCalculator {
    contract_multiplier: f64,
}

impl Default for HedgeCalculator {
    fn default() -> Self {
        Self {
            contract_multiplier: DEFAULT_CONTRACT_MULTIPLIER,
        }
    }
}

impl HedgeCalculator {
    pub fn new(contract_multiplier: f64) -> Result<Self> {
        if !contract_multiplier.is_finite() || contract_multiplier <= 0.0 {
            return Err(HedgeError::NonPositiveMultiplier(contract_multiplier));
        }
        Ok(Self {
            contract_multiplier,
        })
    }

    /// Sizes the futures hedge for `beta` on `exposure_notional` and reports the beta
    /// left over after truncating to whole contracts.
    pub fn compute(
        &self,
        beta: f64,
        exposure_notional: f64,
        futures_price: f64,
    ) -> Result<HedgeResult> {
        if !beta.is_finite() || !exposure_notional.is_finite() || !futures_price.is_finite() {
            return Err(HedgeError::NonFinite);
        }
        if futures_price <= 0.0 {
            return Err(HedgeError::NonPositiveFuturesPrice(futures_price));
        }
        if exposure_notional <= 0.0 {
            return Err(HedgeError::NonPositiveNotional(exposure_notional));
        }

        let contract_value = futures_price * self.contract_multiplier;
        let raw = (beta * exposure_notional / contract_value).trunc();
        if raw.abs() >= i64::MAX as f64 {
            return Err(HedgeError::Overflow(raw));
        }
        let contracts = raw as i64;

        let hedge_notional = contracts as f64 * self.contract_multiplier * futures_price;
        let residual_beta = beta - hedge_notional / exposure_notional;

        Ok(HedgeResult {
            contracts,
            hedge_notional,
            residual_beta,
        })
    }
}

use chrono::NaiveDate;
use market_core::MarketError;
use serde::{Deserialize, Serialize};

pub const MIN_LOOKBACK_DAYS: u32 = 1;
pub const MAX_LOOKBACK_DAYS: u32 = 30;

/// Configuration for one strategy run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Trailing return window used for stock selection, 1..=30 days.
    pub lookback_days: u32,
    pub initial_equity: f64,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.end_date <= self.start_date {
            return Err(MarketError::InvalidParameter(format!(
                "end_date {} must be after start_date {}",
                self.end_date, self.start_date
            )));
        }
        if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(MarketError::InvalidParameter(format!(
                "lookback_days must be between {} and {}, got {}",
                MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS, self.lookback_days
            )));
        }
        if !self.initial_equity.is_finite() || self.initial_equity <= 0.0 {
            return Err(MarketError::InvalidParameter(format!(
                "initial_equity must be positive, got {}",
                self.initial_equity
            )));
        }
        Ok(())
    }
}

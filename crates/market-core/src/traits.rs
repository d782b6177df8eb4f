use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{MarketError, PriceSeries};

/// Trait for market data providers (daily history by symbol and range).
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn daily_history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, MarketError>;
}

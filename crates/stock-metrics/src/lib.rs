use chrono::{Duration, NaiveDate};
use market_core::{MarketError, PriceSeries};
use statrs::statistics::Statistics;


const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Per-stock return and risk calculators over a daily price series.
///
/// Date arguments are calendar dates; lookups fall back to the most recent
/// trading day, so a Sunday resolves to Friday's close.
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Daily percentage changes between consecutive closes
    pub fn pct_changes(&self, prices: &[f64]) -> Vec<f64> {
        prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
    }

    /// Closing price on `date` (or the trading day before it)
    pub fn price_on(&self, series: &PriceSeries, date: NaiveDate) -> Result<f64, MarketError> {
        series.close_at_or_before(date)
    }

    /// Trailing N-day percentage return as of `date`:
    /// price(date) / price(date − n days) − 1
    pub fn n_day_return(
        &self,
        series: &PriceSeries,
        n: u32,
        date: NaiveDate,
    ) -> Result<f64, MarketError> {
        let current = series.close_at_or_before(date)?;
        let past = series.close_at_or_before(date - Duration::days(n as i64))?;
        Ok(current / past - 1.0)
    }

    /// Single-day percentage return on `date`
    pub fn daily_return(
        &self,
        series: &PriceSeries,
        date: NaiveDate,
    ) -> Result<f64, MarketError> {
        self.n_day_return(series, 1, date)
    }

    /// Closing prices in the trailing `days`-day calendar window ending at
    /// `date`, oldest first
    pub fn trailing_window(&self, series: &PriceSeries, date: NaiveDate, days: u32) -> Vec<f64> {
        series.closes_between(date - Duration::days(days as i64), date)
    }

    /// Annualized volatility over the whole series:
    /// √252 × population std of daily pct changes, as a percentage
    pub fn annualized_volatility(&self, series: &PriceSeries) -> f64 {
        let changes = self.pct_changes(&series.closes());
        self.annualized_volatility_of(&changes)
    }

    /// Annualized volatility of a pre-computed daily return slice, percent
    pub fn annualized_volatility_of(&self, daily_returns: &[f64]) -> f64 {
        if daily_returns.len() < 2 {
            return 0.0;
        }
        daily_returns.population_std_dev() * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
    }

    /// Sharpe ratio over the whole series: √252 × mean daily return,
    /// divided by the annualized volatility as a fraction.
    /// Zero-volatility series score 0.0.
    pub fn sharpe_ratio(&self, series: &PriceSeries) -> f64 {
        let changes = self.pct_changes(&series.closes());
        if changes.len() < 2 {
            return 0.0;
        }
        let mean = changes.as_slice().mean();
        let volatility = self.annualized_volatility_of(&changes);
        if volatility == 0.0 {
            return 0.0;
        }
        TRADING_DAYS_PER_YEAR.sqrt() * mean / (volatility / 100.0)
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

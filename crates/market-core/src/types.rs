use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::MarketError;

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// An ordered daily price history for one symbol.
///
/// Bars are kept sorted by timestamp so calendar lookups can binary-search.
/// Non-trading days resolve to the most recent prior trading day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(Bar::date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(Bar::date)
    }

    /// Closing price on `date`, falling back to the most recent trading day
    /// before it. Errors if the series starts after `date` or is empty.
    pub fn close_at_or_before(&self, date: NaiveDate) -> Result<f64, MarketError> {
        if self.bars.is_empty() {
            return Err(MarketError::EmptySeries(self.symbol.clone()));
        }
        let idx = self.bars.partition_point(|b| b.date() <= date);
        if idx == 0 {
            return Err(MarketError::MissingDate {
                symbol: self.symbol.clone(),
                date,
            });
        }
        Ok(self.bars[idx - 1].close)
    }

    /// Closing prices for bars with dates in `[from, to]`, oldest first.
    pub fn closes_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<f64> {
        self.bars
            .iter()
            .filter(|b| b.date() >= from && b.date() <= to)
            .map(|b| b.close)
            .collect()
    }

    /// All closing prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// One row of the final allocation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub symbol: String,
    pub allocation: f64,
    pub weight_percent: f64,
}

/// Result of a full strategy run: the final allocation table plus the
/// benchmark/strategy comparison metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub lookback_days: u32,
    pub initial_equity: f64,
    /// Number of monthly steps that actually rebalanced.
    pub rebalance_count: u32,
    /// Index (^NSEI) return over the full window, as a fraction.
    pub index_return: f64,
    /// Equal-weight benchmark return on the end date, in currency.
    pub benchmark_return: f64,
    /// Strategy return on the end date, in currency.
    pub strategy_return: f64,
    /// Strategy return as a fraction of initial equity.
    pub strategy_return_percent: f64,
    pub cagr: f64,
    /// Index annualized volatility, percent.
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Final allocations, largest first.
    pub allocations: Vec<AllocationEntry>,
}

use std::collections::HashMap;

use chrono::{Duration, Months, NaiveDate};
use market_core::{
    AllocationEntry, MarketDataProvider, MarketError, PriceSeries, StrategyReport,
};
use stock_metrics::MetricsEngine;

use crate::models::StrategyConfig;
use crate::universe::{nifty50_universe, INDEX_SYMBOL};

/// Calendar headroom fetched before the start date so the first rebalance
/// can look back over holidays and weekends.
const FETCH_HEADROOM_DAYS: i64 = 14;

/// Monthly momentum stock selection over a fixed universe.
///
/// Starting from equal weights, each month boundary keeps the allocation of
/// every symbol whose trailing N-day return is strictly positive, zeroes the
/// rest, and renormalizes the survivors back to the initial equity. On
/// completion the final allocations are marked to the end date and compared
/// against the index and an equal-weight benchmark.
pub struct SelectionEngine {
    config: StrategyConfig,
    universe: Vec<String>,
    metrics: MetricsEngine,
}

impl SelectionEngine {
    pub fn new(config: StrategyConfig) -> Result<Self, MarketError> {
        Self::with_universe(config, nifty50_universe())
    }

    /// Build against a custom universe (tests and experiments).
    pub fn with_universe(
        config: StrategyConfig,
        universe: Vec<String>,
    ) -> Result<Self, MarketError> {
        config.validate()?;
        if universe.is_empty() {
            return Err(MarketError::InvalidParameter(
                "universe must not be empty".to_string(),
            ));
        }
        Ok(Self {
            config,
            universe,
            metrics: MetricsEngine::new(),
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn universe(&self) -> &[String] {
        &self.universe
    }

    /// Fetch every universe series plus the index, then run the strategy.
    ///
    /// Each series is fetched exactly once for the whole window; the monthly
    /// loop runs against the cached data.
    pub async fn run(
        &self,
        provider: &dyn MarketDataProvider,
    ) -> Result<StrategyReport, MarketError> {
        let from =
            self.config.start_date - Duration::days(self.config.lookback_days as i64 + FETCH_HEADROOM_DAYS);
        let to = self.config.end_date;

        tracing::info!(
            "Fetching {} series plus index for {} to {}",
            self.universe.len(),
            self.config.start_date,
            self.config.end_date
        );

        let mut series_by_symbol: HashMap<String, PriceSeries> = HashMap::new();
        for symbol in &self.universe {
            let series = provider.daily_history(symbol, from, to).await?;
            series_by_symbol.insert(symbol.clone(), series);
        }
        let index = provider.daily_history(INDEX_SYMBOL, from, to).await?;

        self.run_with_data(&series_by_symbol, &index)
    }

    /// Run the strategy over pre-fetched series. Pure and deterministic.
    pub fn run_with_data(
        &self,
        series_by_symbol: &HashMap<String, PriceSeries>,
        index: &PriceSeries,
    ) -> Result<StrategyReport, MarketError> {
        for symbol in &self.universe {
            if !series_by_symbol.contains_key(symbol) {
                return Err(MarketError::InsufficientData(format!(
                    "No price series supplied for {}",
                    symbol
                )));
            }
        }

        // Equal weights across the whole universe to start
        let per_symbol = self.config.initial_equity / self.universe.len() as f64;
        let mut allocations: HashMap<String, f64> = self
            .universe
            .iter()
            .map(|s| (s.clone(), per_symbol))
            .collect();

        let mut rebalance_count = 0u32;
        let mut cursor = self.config.start_date;
        while cursor <= self.config.end_date {
            if self.rebalance_step(&mut allocations, series_by_symbol, cursor) {
                rebalance_count += 1;
            }
            cursor = match cursor.checked_add_months(Months::new(1)) {
                Some(next) => next,
                None => break,
            };
        }

        self.build_report(allocations, series_by_symbol, index, rebalance_count)
    }

    /// One monthly step: zero out symbols without a strictly positive
    /// trailing return, renormalize the rest to the initial equity.
    /// Returns whether the step actually rebalanced.
    fn rebalance_step(
        &self,
        allocations: &mut HashMap<String, f64>,
        series_by_symbol: &HashMap<String, PriceSeries>,
        date: NaiveDate,
    ) -> bool {
        let mut kept: HashMap<String, f64> = HashMap::with_capacity(allocations.len());
        for symbol in &self.universe {
            let series = &series_by_symbol[symbol];
            let trailing = self
                .metrics
                .n_day_return(series, self.config.lookback_days, date);
            let keep = match trailing {
                Ok(ret) => ret > 0.0,
                Err(e) => {
                    // No usable history at this cursor counts as non-positive
                    tracing::debug!("{} excluded at {}: {}", symbol, date, e);
                    false
                }
            };
            let current = allocations.get(symbol).copied().unwrap_or(0.0);
            kept.insert(symbol.clone(), if keep { current } else { 0.0 });
        }

        let total: f64 = kept.values().sum();
        if total <= 0.0 {
            // Renormalizing would divide by zero; hold the prior allocations
            tracing::warn!(
                "No symbol with positive {}-day return at {}; keeping previous allocations",
                self.config.lookback_days,
                date
            );
            return false;
        }

        let scale = self.config.initial_equity / total;
        for (symbol, value) in kept {
            allocations.insert(symbol, value * scale);
        }
        true
    }

    /// Index, benchmark, and strategy comparison for the finished run.
    fn build_report(
        &self,
        allocations: HashMap<String, f64>,
        series_by_symbol: &HashMap<String, PriceSeries>,
        index: &PriceSeries,
        rebalance_count: u32,
    ) -> Result<StrategyReport, MarketError> {
        let start = self.config.start_date;
        let end = self.config.end_date;

        let index_start = index.close_at_or_before(start)?;
        let index_end = index.close_at_or_before(end)?;
        let index_return = index_end / index_start - 1.0;

        let equal_weight = self.config.initial_equity / self.universe.len() as f64;
        let mut benchmark_return = 0.0;
        let mut strategy_return = 0.0;
        for symbol in &self.universe {
            let series = &series_by_symbol[symbol];
            match self.metrics.daily_return(series, end) {
                Ok(ret) => {
                    benchmark_return += ret * equal_weight;
                    strategy_return += ret * allocations[symbol];
                }
                Err(e) => {
                    tracing::warn!("{} skipped in end-date comparison: {}", symbol, e);
                }
            }
        }

        let strategy_return_percent = strategy_return / self.config.initial_equity;

        let years = (end - start).num_days() as f64 / 365.0;
        let growth = 1.0 + strategy_return_percent;
        let cagr = if growth > 0.0 && years > 0.0 {
            growth.powf(1.0 / years) - 1.0
        } else {
            -1.0
        };

        // Only the simulated window counts; the lookback headroom fetched
        // before the start date stays out of the index volatility
        let index_window = self.metrics.pct_changes(&index.closes_between(start, end));
        let volatility = self.metrics.annualized_volatility_of(&index_window);
        let sharpe_ratio = if volatility == 0.0 {
            0.0
        } else {
            (strategy_return_percent - index_return) / (volatility / 100.0)
        };

        let mut entries: Vec<AllocationEntry> = allocations
            .into_iter()
            .map(|(symbol, allocation)| AllocationEntry {
                symbol,
                allocation,
                weight_percent: allocation / self.config.initial_equity * 100.0,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.allocation
                .partial_cmp(&a.allocation)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        Ok(StrategyReport {
            start_date: start,
            end_date: end,
            lookback_days: self.config.lookback_days,
            initial_equity: self.config.initial_equity,
            rebalance_count,
            index_return,
            benchmark_return,
            strategy_return,
            strategy_return_percent,
            cagr,
            volatility,
            sharpe_ratio,
            allocations: entries,
        })
    }
}

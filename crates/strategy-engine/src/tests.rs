use std::collections::HashMap;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use market_core::{Bar, MarketError, PriceSeries};
use stock_metrics::MetricsEngine;

use crate::engine::SelectionEngine;
use crate::models::StrategyConfig;

/// Helper: geometric daily series, one bar per calendar day.
/// `daily_growth` of 0.002 means +0.2% per day.
fn geometric_series(
    symbol: &str,
    start: NaiveDate,
    days: usize,
    base: f64,
    daily_growth: f64,
) -> PriceSeries {
    let bars = (0..days)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            let close = base * (1.0 + daily_growth).powi(i as i32);
            Bar {
                timestamp: Utc.from_utc_datetime(&date.and_hms_opt(3, 45, 0).unwrap()),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000_000.0,
            }
        })
        .collect();
    PriceSeries::new(symbol, bars)
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Helper: single bar with the given close.
fn bar(date: NaiveDate, close: f64) -> Bar {
    Bar {
        timestamp: Utc.from_utc_datetime(&date.and_hms_opt(3, 45, 0).unwrap()),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1_000_000.0,
    }
}

/// Helper: config over H1 2020 with a 10-day lookback.
fn test_config() -> StrategyConfig {
    StrategyConfig {
        start_date: d(2020, 1, 1),
        end_date: d(2020, 6, 30),
        lookback_days: 10,
        initial_equity: 1_000_000.0,
    }
}

/// Helper: three-symbol fixture — a riser, a faller, and a flat series —
/// each covering December 2019 through June 2020.
fn fixture_data() -> (HashMap<String, PriceSeries>, PriceSeries) {
    let from = d(2019, 12, 1);
    let days = 220;
    let mut map = HashMap::new();
    map.insert(
        "UP".to_string(),
        geometric_series("UP", from, days, 100.0, 0.002),
    );
    map.insert(
        "DOWN".to_string(),
        geometric_series("DOWN", from, days, 100.0, -0.002),
    );
    map.insert(
        "FLAT".to_string(),
        geometric_series("FLAT", from, days, 100.0, 0.0),
    );
    let index = geometric_series("^NSEI", from, days, 12_000.0, 0.001);
    (map, index)
}

fn fixture_universe() -> Vec<String> {
    vec!["UP".to_string(), "DOWN".to_string(), "FLAT".to_string()]
}

// =============================================================================
// Rebalancing rule
// =============================================================================

#[test]
fn test_allocations_sum_to_initial_equity() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (data, index) = fixture_data();
    let report = engine.run_with_data(&data, &index).unwrap();

    let total: f64 = report.allocations.iter().map(|a| a.allocation).sum();
    assert!((total - 1_000_000.0).abs() < 1e-6);
    let weight_total: f64 = report.allocations.iter().map(|a| a.weight_percent).sum();
    assert!((weight_total - 100.0).abs() < 1e-9);
}

#[test]
fn test_non_positive_return_symbols_get_zero() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (data, index) = fixture_data();
    let report = engine.run_with_data(&data, &index).unwrap();

    let by_symbol: HashMap<&str, f64> = report
        .allocations
        .iter()
        .map(|a| (a.symbol.as_str(), a.allocation))
        .collect();

    // Strictly positive is required: the flat series is filtered too
    assert_eq!(by_symbol["DOWN"], 0.0);
    assert_eq!(by_symbol["FLAT"], 0.0);
    // The sole survivor absorbs the whole equity
    assert!((by_symbol["UP"] - 1_000_000.0).abs() < 1e-6);
    assert!(report.rebalance_count > 0);
}

#[test]
fn test_all_non_positive_keeps_previous_allocations() {
    let universe = vec!["DOWN".to_string(), "FLAT".to_string()];
    let engine = SelectionEngine::with_universe(test_config(), universe).unwrap();

    let from = d(2019, 12, 1);
    let mut data = HashMap::new();
    data.insert(
        "DOWN".to_string(),
        geometric_series("DOWN", from, 220, 100.0, -0.002),
    );
    data.insert(
        "FLAT".to_string(),
        geometric_series("FLAT", from, 220, 100.0, 0.0),
    );
    let index = geometric_series("^NSEI", from, 220, 12_000.0, -0.001);

    let report = engine.run_with_data(&data, &index).unwrap();

    // Every step skipped; the starting equal weights survive untouched
    assert_eq!(report.rebalance_count, 0);
    for entry in &report.allocations {
        assert!((entry.allocation - 500_000.0).abs() < 1e-6);
    }
}

#[test]
fn test_run_is_deterministic() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (data, index) = fixture_data();

    let a = engine.run_with_data(&data, &index).unwrap();
    let b = engine.run_with_data(&data, &index).unwrap();

    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_missing_series_is_rejected() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (mut data, index) = fixture_data();
    data.remove("FLAT");

    let err = engine.run_with_data(&data, &index).unwrap_err();
    assert!(matches!(err, MarketError::InsufficientData(_)));
}

// =============================================================================
// Benchmark & strategy comparison
// =============================================================================

#[test]
fn test_index_return_over_window() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (data, index) = fixture_data();
    let report = engine.run_with_data(&data, &index).unwrap();

    let expected = index.close_at_or_before(d(2020, 6, 30)).unwrap()
        / index.close_at_or_before(d(2020, 1, 1)).unwrap()
        - 1.0;
    assert!((report.index_return - expected).abs() < 1e-12);
    assert!(report.index_return > 0.0);
}

#[test]
fn test_end_date_returns_drive_comparison() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (data, index) = fixture_data();
    let report = engine.run_with_data(&data, &index).unwrap();

    let metrics = MetricsEngine::new();
    let end = d(2020, 6, 30);
    let up_ret = metrics.daily_return(&data["UP"], end).unwrap();
    let down_ret = metrics.daily_return(&data["DOWN"], end).unwrap();
    let flat_ret = metrics.daily_return(&data["FLAT"], end).unwrap();

    // Strategy holds only UP by the end
    let expected_strategy = up_ret * 1_000_000.0;
    assert!((report.strategy_return - expected_strategy).abs() < 1e-6);

    let third = 1_000_000.0 / 3.0;
    let expected_benchmark = (up_ret + down_ret + flat_ret) * third;
    assert!((report.benchmark_return - expected_benchmark).abs() < 1e-6);

    assert!(
        (report.strategy_return_percent - report.strategy_return / 1_000_000.0).abs() < 1e-15
    );
}

#[test]
fn test_index_volatility_ignores_pre_start_headroom() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (data, _) = fixture_data();

    // Violent swings in the fetch headroom before the window, dead flat
    // from the start date onward
    let mut bars = Vec::new();
    for i in 0..31i64 {
        let close = if i % 2 == 0 { 12_000.0 } else { 9_000.0 };
        bars.push(bar(d(2019, 12, 1) + Duration::days(i), close));
    }
    for i in 0..219i64 {
        bars.push(bar(d(2020, 1, 1) + Duration::days(i), 12_000.0));
    }
    let index = PriceSeries::new("^NSEI", bars);

    let report = engine.run_with_data(&data, &index).unwrap();

    // Volatility is measured over [start, end] only
    assert_eq!(report.volatility, 0.0);
    assert_eq!(report.sharpe_ratio, 0.0);
}

#[test]
fn test_cagr_and_sharpe_are_finite() {
    let engine = SelectionEngine::with_universe(test_config(), fixture_universe()).unwrap();
    let (data, index) = fixture_data();
    let report = engine.run_with_data(&data, &index).unwrap();

    assert!(report.cagr.is_finite());
    assert!(report.sharpe_ratio.is_finite());
    assert!(report.volatility >= 0.0);
}

// =============================================================================
// Config validation
// =============================================================================

#[test]
fn test_config_validation() {
    let mut config = test_config();
    config.lookback_days = 0;
    assert!(SelectionEngine::new(config).is_err());

    let mut config = test_config();
    config.lookback_days = 31;
    assert!(SelectionEngine::new(config).is_err());

    let mut config = test_config();
    config.end_date = config.start_date;
    assert!(SelectionEngine::new(config).is_err());

    let mut config = test_config();
    config.initial_equity = 0.0;
    assert!(SelectionEngine::new(config).is_err());

    let mut config = test_config();
    config.initial_equity = f64::NAN;
    assert!(SelectionEngine::new(config).is_err());

    assert!(SelectionEngine::with_universe(test_config(), Vec::new()).is_err());
}

#[test]
fn test_default_universe_is_fixed_ticker_set() {
    let engine = SelectionEngine::new(test_config()).unwrap();
    assert_eq!(engine.universe().len(), crate::universe::NIFTY50.len());
    assert!(engine.universe().iter().any(|s| s == "RELIANCE"));
    assert!(engine.universe().iter().any(|s| s == "TATASTEEL"));
}

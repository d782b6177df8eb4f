use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use market_core::StrategyReport;
use serde::Deserialize;
use strategy_engine::{SelectionEngine, StrategyConfig, NIFTY50};

use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct RunStrategyRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub lookback_days: u32,
    pub initial_equity: f64,
}

impl RunStrategyRequest {
    fn into_config(self) -> StrategyConfig {
        StrategyConfig {
            start_date: self.start_date,
            end_date: self.end_date,
            lookback_days: self.lookback_days,
            initial_equity: self.initial_equity,
        }
    }
}

pub fn strategy_routes() -> Router<AppState> {
    Router::new()
        .route("/api/strategy/run", post(run_strategy))
        .route("/api/strategy/universe", get(get_universe))
        .route("/health", get(health))
}

/// Run the monthly selection strategy over the requested window.
async fn run_strategy(
    State(state): State<AppState>,
    Json(req): Json<RunStrategyRequest>,
) -> Result<Json<ApiResponse<StrategyReport>>, AppError> {
    tracing::info!(
        "Strategy run: {} to {}, lookback {}d, equity {}",
        req.start_date,
        req.end_date,
        req.lookback_days,
        req.initial_equity
    );

    let engine = SelectionEngine::new(req.into_config())?;
    let report = engine.run(state.provider.as_ref()).await?;

    tracing::info!(
        "Strategy run complete: {} rebalances, strategy return {:.4}%",
        report.rebalance_count,
        report.strategy_return_percent * 100.0
    );

    Ok(Json(ApiResponse::success(report)))
}

/// The fixed ticker universe the strategy trades.
async fn get_universe() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::success(NIFTY50.to_vec()))
}

async fn health() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ok"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_form_fields() {
        let body = r#"{
            "start_date": "2019-01-01",
            "end_date": "2021-01-01",
            "lookback_days": 30,
            "initial_equity": 1000000
        }"#;

        let req: RunStrategyRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.lookback_days, 30);
        assert_eq!(req.initial_equity, 1_000_000.0);

        let config = req.into_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_lookback_fails_validation() {
        let body = r#"{
            "start_date": "2019-01-01",
            "end_date": "2021-01-01",
            "lookback_days": 45,
            "initial_equity": 1000000
        }"#;

        let req: RunStrategyRequest = serde_json::from_str(body).unwrap();
        assert!(req.into_config().validate().is_err());
    }

    #[test]
    fn test_inverted_dates_fail_validation() {
        let body = r#"{
            "start_date": "2021-01-01",
            "end_date": "2019-01-01",
            "lookback_days": 30,
            "initial_equity": 1000000
        }"#;

        let req: RunStrategyRequest = serde_json::from_str(body).unwrap();
        assert!(req.into_config().validate().is_err());
    }
}

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("No price for {symbol} at or before {date}")]
    MissingDate { symbol: String, date: NaiveDate },

    #[error("Empty price series for {0}")]
    EmptySeries(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Market data API error: {0}")]
    Api(String),
}

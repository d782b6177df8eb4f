/// The fixed Nifty50 constituent set the strategy trades. The allocation
/// map is always keyed by exactly these symbols.
pub const NIFTY50: &[&str] = &[
    "RELIANCE",
    "TCS",
    "HDFCBANK",
    "HINDUNILVR",
    "HDFC",
    "INFY",
    "KOTAKBANK",
    "ICICIBANK",
    "BAJFINANCE",
    "ITC",
    "LT",
    "AXISBANK",
    "ASIANPAINT",
    "M&M",
    "MARUTI",
    "NTPC",
    "SUNPHARMA",
    "ONGC",
    "BHARTIARTL",
    "TITAN",
    "NESTLEIND",
    "POWERGRID",
    "ULTRACEMCO",
    "HEROMOTOCO",
    "WIPRO",
    "COALINDIA",
    "IOC",
    "SBIN",
    "TECHM",
    "BAJAJ-AUTO",
    "INDUSINDBK",
    "GRASIM",
    "DRREDDY",
    "NEOGEN",
    "HCLTECH",
    "CIPLA",
    "SHREECEM",
    "JSWSTEEL",
    "BRITANNIA",
    "BPCL",
    "GAIL",
    "DIVISLAB",
    "EICHERMOT",
    "ADANIPORTS",
    "HINDALCO",
    "UPL",
    "TATAMOTORS",
    "SBILIFE",
    "BAJAJFINSV",
    "HDFCLIFE",
    "TATASTEEL",
];

/// The Nifty50 index symbol used for the benchmark comparison.
pub const INDEX_SYMBOL: &str = "^NSEI";

pub fn nifty50_universe() -> Vec<String> {
    NIFTY50.iter().map(|s| s.to_string()).collect()
}

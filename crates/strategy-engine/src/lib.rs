pub mod engine;
pub mod models;
pub mod universe;

#[cfg(test)]
mod tests;

pub use engine::SelectionEngine;
pub use models::*;
pub use universe::{nifty50_universe, INDEX_SYMBOL, NIFTY50};

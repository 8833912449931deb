pub mod candle;

// Re-export the candle types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{local_wall_clock, Candle, CandleSeries, TIME_FORMAT};

pub mod aggregate;
pub mod timeframe;

pub use aggregate::aggregate;
pub use timeframe::score_timeframe;

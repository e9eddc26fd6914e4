use crate::error::{AppError, Result};

/// Default cache lifetime for market trend lookups (seconds).
pub const MARKET_TREND_TTL_SECS: u64 = 300;

/// HTTP timeout for the market data API (seconds).
pub const MARKET_DATA_TIMEOUT_SECS: u64 = 10;

/// Score every timeframe starts from before answers move it.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Per-answer score deltas, by question type.
pub mod score_deltas {
    pub const MULTIPLE_CHOICE: f64 = 20.0;
    pub const RATING: f64 = 15.0;
    pub const BOOLEAN: f64 = 12.0;
    pub const TEXT: f64 = 8.0;
}

/// Ratings at or above this are bullish; at or below `RATING_BEARISH_MAX` bearish.
pub const RATING_BULLISH_MIN: i64 = 4;
pub const RATING_BEARISH_MAX: i64 = 2;

/// Sentiment decision thresholds around the neutral midpoint.
pub mod sentiment_thresholds {
    /// Score needed for BULLISH when bullish signals outnumber bearish ones.
    pub const BULLISH_MIN: f64 = 52.0;
    /// Score needed for BEARISH when bearish signals outnumber bullish ones.
    pub const BEARISH_MAX: f64 = 48.0;
    /// Aligned market trend nudges only scores closer to 50 than this.
    pub const ALIGNED_NUDGE_BAND: f64 = 10.0;
    pub const ALIGNED_NUDGE: f64 = 5.0;
    /// Opposing market trend overrides only scores closer to 50 than this.
    pub const MISALIGNED_OVERRIDE_BAND: f64 = 5.0;
    pub const MISALIGNED_NUDGE: f64 = 3.0;
}

/// Risk classification cut-offs for the overall metrics.
pub mod risk_thresholds {
    pub const LOW_MIN_CONSISTENCY: f64 = 0.8;
    pub const LOW_MIN_PROBABILITY: f64 = 70.0;
    pub const HIGH_MAX_CONSISTENCY: f64 = 0.5;
    pub const HIGH_MAX_PROBABILITY: f64 = 30.0;
    /// Consistency contributes up to this many points of confidence.
    pub const CONSISTENCY_CONFIDENCE_POINTS: f64 = 30.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Base URL of the market trend API (MARKET_DATA_URL). Unset disables trend nudging.
    pub market_data_url: Option<String>,
    /// How long a fetched trend is reused (MARKET_TREND_TTL_SECS)
    pub market_trend_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "journal.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            market_data_url: std::env::var("MARKET_DATA_URL")
                .ok()
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            market_trend_ttl_secs: std::env::var("MARKET_TREND_TTL_SECS")
                .unwrap_or_else(|_| MARKET_TREND_TTL_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(MARKET_TREND_TTL_SECS),
        })
    }
}

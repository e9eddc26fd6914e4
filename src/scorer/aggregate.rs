use crate::config::risk_thresholds::*;
use crate::config::NEUTRAL_SCORE;
use crate::scorer::timeframe::round1;
use crate::types::{OverallMetrics, RiskLevel, Sentiment, TimeframeResult};

/// Relative influence of each chart timeframe on the overall probability.
pub const TIMEFRAME_WEIGHTS: &[(&str, f64)] = &[
    ("MN1", 0.30),
    ("W1", 0.25),
    ("DAILY", 0.35),
    ("H8", 0.15),
    ("H4", 0.20),
    ("H2", 0.15),
    ("H1", 0.10),
    ("M30", 0.08),
    ("M15", 0.05),
    ("M10", 0.03),
];

/// Weight for timeframes missing from the table.
pub const DEFAULT_TIMEFRAME_WEIGHT: f64 = 0.10;

pub fn timeframe_weight(timeframe: &str) -> f64 {
    TIMEFRAME_WEIGHTS
        .iter()
        .find(|(tf, _)| *tf == timeframe)
        .map(|&(_, w)| w)
        .unwrap_or(DEFAULT_TIMEFRAME_WEIGHT)
}

/// Combine per-timeframe results into one weighted read.
/// An empty slice yields probability 50 with HIGH risk (no consistency).
pub fn aggregate(results: &[TimeframeResult]) -> OverallMetrics {
    let (weighted_sum, total_weight) = results.iter().fold((0.0, 0.0), |(sum, total), r| {
        let w = timeframe_weight(&r.timeframe);
        (sum + r.score * w, total + w)
    });

    let overall_probability = if total_weight > 0.0 {
        round1(weighted_sum / total_weight)
    } else {
        NEUTRAL_SCORE
    };

    let bullish = results.iter().filter(|r| r.sentiment == Sentiment::Bullish).count();
    let bearish = results.iter().filter(|r| r.sentiment == Sentiment::Bearish).count();
    let consistency = if results.is_empty() {
        0.0
    } else {
        bullish.max(bearish) as f64 / results.len() as f64
    };

    let confidence_level =
        round1(overall_probability + consistency * CONSISTENCY_CONFIDENCE_POINTS).clamp(0.0, 100.0);

    let risk_level = if consistency > LOW_MIN_CONSISTENCY && overall_probability > LOW_MIN_PROBABILITY {
        RiskLevel::Low
    } else if consistency < HIGH_MAX_CONSISTENCY || overall_probability < HIGH_MAX_PROBABILITY {
        RiskLevel::High
    } else {
        RiskLevel::Medium
    };

    OverallMetrics {
        overall_probability,
        confidence_level,
        risk_level,
    }
}

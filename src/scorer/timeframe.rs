use std::collections::HashMap;

use crate::config::sentiment_thresholds::*;
use crate::config::{score_deltas, NEUTRAL_SCORE, RATING_BEARISH_MAX, RATING_BULLISH_MIN};
use crate::types::{
    Answer, MarketTrendSignal, Question, QuestionType, Sentiment, TimeframeResult,
};

pub const BULLISH_KEYWORDS: &[&str] = &[
    "bullish", "strong", "support", "uptrend", "buy", "long", "positive", "good", "stronger",
];

pub const BEARISH_KEYWORDS: &[&str] = &[
    "bearish", "weak", "resistance", "downtrend", "sell", "short", "negative", "bad", "weaker",
];

/// Direction a single answer pushed the score in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Bullish,
    Bearish,
}

/// Running totals while walking a timeframe's answers.
#[derive(Debug)]
struct Tally {
    score: f64,
    bullish: u32,
    bearish: u32,
    total: u32,
    reasoning: Vec<String>,
}

impl Tally {
    fn new() -> Self {
        Self {
            score: NEUTRAL_SCORE,
            bullish: 0,
            bearish: 0,
            total: 0,
            reasoning: Vec::new(),
        }
    }

    fn push(&mut self, signal: Signal, delta: f64, reason: String) {
        match signal {
            Signal::Bullish => {
                self.bullish += 1;
                self.score += delta;
            }
            Signal::Bearish => {
                self.bearish += 1;
                self.score -= delta;
            }
        }
        self.reasoning.push(reason);
    }
}

/// Score one timeframe of a top-down analysis.
///
/// Answers whose question is missing from `questions` are skipped. Answers that
/// can't be read as a signal (non-numeric ratings, tied keyword counts,
/// "Sideways") still count toward the signal total but move nothing.
///
/// With `market_trend` set, a score close to neutral is nudged toward or
/// overridden by the external trend; the reasoning always names the trend.
pub fn score_timeframe(
    timeframe: &str,
    answers: &[Answer],
    questions: &[Question],
    market_trend: Option<MarketTrendSignal>,
) -> TimeframeResult {
    let by_id: HashMap<&str, &Question> =
        questions.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut tally = Tally::new();

    for answer in answers {
        let Some(question) = by_id.get(answer.question_id.as_str()) else {
            continue;
        };
        tally.total += 1;

        let Some(response) = answer.response() else {
            continue;
        };
        let q = &question.question_text;

        match question.question_type {
            QuestionType::MultipleChoice => {
                let choice = response.as_text().to_lowercase();
                match choice.as_str() {
                    "bullish" => tally.push(
                        Signal::Bullish,
                        score_deltas::MULTIPLE_CHOICE,
                        format!("{q}: Bullish bias"),
                    ),
                    "bearish" => tally.push(
                        Signal::Bearish,
                        score_deltas::MULTIPLE_CHOICE,
                        format!("{q}: Bearish bias"),
                    ),
                    "sideways" => tally.reasoning.push(format!("{q}: Sideways, no bias")),
                    _ => {}
                }
            }
            QuestionType::Rating => {
                let Some(rating) = response.as_rating() else {
                    continue;
                };
                if rating >= RATING_BULLISH_MIN {
                    tally.push(
                        Signal::Bullish,
                        score_deltas::RATING,
                        format!("{q}: rated {rating} (bullish)"),
                    );
                } else if rating <= RATING_BEARISH_MAX {
                    tally.push(
                        Signal::Bearish,
                        score_deltas::RATING,
                        format!("{q}: rated {rating} (bearish)"),
                    );
                } else {
                    tally.reasoning.push(format!("{q}: rated {rating} (neutral)"));
                }
            }
            QuestionType::Boolean => match response.as_bool() {
                Some(true) => tally.push(
                    Signal::Bullish,
                    score_deltas::BOOLEAN,
                    format!("{q}: yes (bullish)"),
                ),
                Some(false) => tally.push(
                    Signal::Bearish,
                    score_deltas::BOOLEAN,
                    format!("{q}: no (bearish)"),
                ),
                None => {}
            },
            QuestionType::Text => {
                let text = response.as_text().to_lowercase();
                let bullish = count_keywords(&text, BULLISH_KEYWORDS);
                let bearish = count_keywords(&text, BEARISH_KEYWORDS);
                if bullish > bearish {
                    tally.push(
                        Signal::Bullish,
                        score_deltas::TEXT,
                        format!("{q}: notes lean bullish ({bullish} vs {bearish} keywords)"),
                    );
                } else if bearish > bullish {
                    tally.push(
                        Signal::Bearish,
                        score_deltas::TEXT,
                        format!("{q}: notes lean bearish ({bearish} vs {bullish} keywords)"),
                    );
                }
            }
            QuestionType::Announcements => {}
        }
    }

    let mut score = tally.score.clamp(0.0, 100.0);
    let mut sentiment = classify_sentiment(score, tally.bullish, tally.bearish);

    if let Some(signal) = market_trend {
        let trend = signal.trend.as_sentiment();
        let deviation = (score - NEUTRAL_SCORE).abs();
        if trend == sentiment {
            if deviation < ALIGNED_NUDGE_BAND {
                score += ALIGNED_NUDGE;
                // Only the score's side of 50 decides here; signal counts are not rechecked.
                sentiment = sentiment_from_score(score);
            }
        } else if deviation < MISALIGNED_OVERRIDE_BAND {
            sentiment = trend;
            score += match trend {
                Sentiment::Bearish => -MISALIGNED_NUDGE,
                _ => MISALIGNED_NUDGE,
            };
        }
        score = score.clamp(0.0, 100.0);
        tally.reasoning.push(format!(
            "Market trend {} (source: {})",
            signal.trend, signal.provenance
        ));
    }

    let signal_strength = if tally.total > 0 {
        f64::from(tally.bullish.max(tally.bearish)) / f64::from(tally.total) * 100.0
    } else {
        0.0
    };
    let score_deviation = (score - NEUTRAL_SCORE).abs() * 2.0;
    let strength = ((signal_strength + score_deviation) / 2.0).min(100.0);

    TimeframeResult {
        timeframe: timeframe.to_string(),
        score: round1(score),
        sentiment,
        strength: round1(strength),
        reasoning: tally.reasoning.join("; "),
    }
}

/// Ordered rule chain: a later rule only applies when no earlier one matched.
fn classify_sentiment(score: f64, bullish: u32, bearish: u32) -> Sentiment {
    if bullish > bearish && score >= BULLISH_MIN {
        Sentiment::Bullish
    } else if bearish > bullish && score <= BEARISH_MAX {
        Sentiment::Bearish
    } else if bullish == bearish && score == NEUTRAL_SCORE {
        Sentiment::Neutral
    } else {
        sentiment_from_score(score)
    }
}

fn sentiment_from_score(score: f64) -> Sentiment {
    if score > NEUTRAL_SCORE {
        Sentiment::Bullish
    } else if score < NEUTRAL_SCORE {
        Sentiment::Bearish
    } else {
        Sentiment::Neutral
    }
}

/// Occurrences of `keywords` among the words of `text`. Words are split on
/// anything that isn't alphanumeric, so "along" does not count as "long".
fn count_keywords(text: &str, keywords: &[&str]) -> usize {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| keywords.contains(word))
        .count()
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Questionnaire
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    Rating,
    Boolean,
    Text,
    Announcements,
}

impl QuestionType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MULTIPLE_CHOICE" => Some(QuestionType::MultipleChoice),
            "RATING" => Some(QuestionType::Rating),
            "BOOLEAN" => Some(QuestionType::Boolean),
            "TEXT" => Some(QuestionType::Text),
            "ANNOUNCEMENTS" => Some(QuestionType::Announcements),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QuestionType::MultipleChoice => "MULTIPLE_CHOICE",
            QuestionType::Rating => "RATING",
            QuestionType::Boolean => "BOOLEAN",
            QuestionType::Text => "TEXT",
            QuestionType::Announcements => "ANNOUNCEMENTS",
        };
        write!(f, "{s}")
    }
}

/// Reference data: one prompt in a timeframe's questionnaire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub timeframe: String,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub order_index: i64,
    pub is_active: bool,
}

/// A trader's response as stored. Numbers, booleans and free text all arrive here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            AnswerValue::Text(s) => Cow::Borrowed(s.as_str()),
            AnswerValue::Bool(b) => Cow::Owned(b.to_string()),
            AnswerValue::Number(n) => Cow::Owned(n.to_string()),
        }
    }

    /// Whole-number rating. Fractions truncate; anything non-numeric is `None`.
    pub fn as_rating(&self) -> Option<i64> {
        match self {
            AnswerValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            AnswerValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .map(|n| n.trunc() as i64)
                })
            }
            _ => None,
        }
    }

    /// `Some(true)` for yes-like answers, `Some(false)` for no-like ones.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(b) => Some(*b),
            AnswerValue::Text(s) => match s.as_str() {
                "true" | "yes" | "Yes" => Some(true),
                "false" | "no" | "No" => Some(false),
                _ => None,
            },
            AnswerValue::Number(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub analysis_id: String,
    pub question_id: String,
    pub answer_text: Option<String>,
    pub answer_value: Option<AnswerValue>,
}

impl Answer {
    /// The structured value when present, otherwise the free-text field.
    pub fn response(&self) -> Option<Cow<'_, AnswerValue>> {
        match (&self.answer_value, &self.answer_text) {
            (Some(v), _) => Some(Cow::Borrowed(v)),
            (None, Some(t)) => Some(Cow::Owned(AnswerValue::Text(t.clone()))),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BULLISH" => Some(Sentiment::Bullish),
            "BEARISH" => Some(Sentiment::Bearish),
            "NEUTRAL" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sentiment::Bullish => "BULLISH",
            Sentiment::Bearish => "BEARISH",
            Sentiment::Neutral => "NEUTRAL",
        };
        write!(f, "{s}")
    }
}

/// Directional read from external market data. Never neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketTrend {
    Bullish,
    Bearish,
}

impl MarketTrend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BULLISH" => Some(MarketTrend::Bullish),
            "BEARISH" => Some(MarketTrend::Bearish),
            _ => None,
        }
    }

    pub fn as_sentiment(self) -> Sentiment {
        match self {
            MarketTrend::Bullish => Sentiment::Bullish,
            MarketTrend::Bearish => Sentiment::Bearish,
        }
    }
}

impl std::fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sentiment())
    }
}

/// Where a market trend came from, reported in the reasoning text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendProvenance {
    Live,
    Cached,
}

impl std::fmt::Display for TrendProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendProvenance::Live => write!(f, "live market data"),
            TrendProvenance::Cached => write!(f, "cached market data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketTrendSignal {
    pub trend: MarketTrend,
    pub provenance: TrendProvenance,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeResult {
    pub timeframe: String,
    /// 0..=100, one decimal place.
    pub score: f64,
    pub sentiment: Sentiment,
    /// 0..=100, one decimal place.
    pub strength: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub overall_probability: f64,
    pub confidence_level: f64,
    pub risk_level: RiskLevel,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// A trader's top-down analysis of one currency pair across selected timeframes.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub id: String,
    pub user_id: String,
    pub currency_pair: String,
    pub timeframes: Vec<String>,
    pub overall_metrics: Option<OverallMetrics>,
    pub updated_at: Option<i64>,
}

/// Nanosecond UTC epoch timestamp, used for every stored `*_at` column.
pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

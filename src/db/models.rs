//! Database row types matching `migrations/0001_init.sql`.
//! Conversions into domain types tolerate bad data: unknown enum strings and
//! malformed JSON columns degrade rather than fail the request.

use tracing::warn;

use crate::types::{
    Analysis, Answer, AnswerValue, OverallMetrics, Question, QuestionType, RiskLevel, Sentiment,
    TimeframeResult,
};

#[derive(Debug, sqlx::FromRow)]
pub struct AnalysisRow {
    pub id: String,
    pub user_id: String,
    pub currency_pair: String,
    pub timeframes: String,
    pub overall_probability: Option<f64>,
    pub confidence_level: Option<f64>,
    pub risk_level: Option<String>,
    pub updated_at: Option<i64>,
}

impl From<AnalysisRow> for Analysis {
    fn from(r: AnalysisRow) -> Self {
        let timeframes = serde_json::from_str::<Vec<String>>(&r.timeframes).unwrap_or_else(|e| {
            warn!(analysis_id = %r.id, "Unreadable timeframes column: {e}");
            Vec::new()
        });
        let overall_metrics = match (
            r.overall_probability,
            r.confidence_level,
            r.risk_level.as_deref().and_then(RiskLevel::parse),
        ) {
            (Some(overall_probability), Some(confidence_level), Some(risk_level)) => {
                Some(OverallMetrics {
                    overall_probability,
                    confidence_level,
                    risk_level,
                })
            }
            _ => None,
        };
        Analysis {
            id: r.id,
            user_id: r.user_id,
            currency_pair: r.currency_pair,
            timeframes,
            overall_metrics,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: String,
    pub timeframe: String,
    pub question_text: String,
    pub question_type: String,
    pub options: Option<String>,
    pub order_index: i64,
    pub is_active: bool,
}

impl QuestionRow {
    /// `None` when the stored type isn't one we score.
    pub fn into_question(self) -> Option<Question> {
        let Some(question_type) = QuestionType::parse(&self.question_type) else {
            warn!(question_id = %self.id, "Unknown question type {:?}", self.question_type);
            return None;
        };
        let options = self
            .options
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok());
        Some(Question {
            id: self.id,
            timeframe: self.timeframe,
            question_text: self.question_text,
            question_type,
            options,
            order_index: self.order_index,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AnswerRow {
    pub id: String,
    pub analysis_id: String,
    pub question_id: String,
    pub answer_text: Option<String>,
    pub answer_value: Option<String>,
}

impl From<AnswerRow> for Answer {
    fn from(r: AnswerRow) -> Self {
        // Values written outside this service may be bare strings rather than JSON.
        let answer_value = r.answer_value.map(|raw| {
            serde_json::from_str::<AnswerValue>(&raw).unwrap_or(AnswerValue::Text(raw))
        });
        Answer {
            id: r.id,
            analysis_id: r.analysis_id,
            question_id: r.question_id,
            answer_text: r.answer_text,
            answer_value,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct TimeframeResultRow {
    pub timeframe: String,
    pub score: f64,
    pub sentiment: String,
    pub strength: f64,
    pub reasoning: String,
}

impl From<TimeframeResultRow> for TimeframeResult {
    fn from(r: TimeframeResultRow) -> Self {
        TimeframeResult {
            sentiment: Sentiment::parse(&r.sentiment).unwrap_or(Sentiment::Neutral),
            timeframe: r.timeframe,
            score: r.score,
            strength: r.strength,
            reasoning: r.reasoning,
        }
    }
}

use crate::error::Result;
use crate::types::{now_ns, AnswerValue, OverallMetrics, TimeframeResult};

/// One answer as submitted by the questionnaire.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub question_id: String,
    pub answer_text: Option<String>,
    pub answer_value: Option<AnswerValue>,
}

/// Persists derived analysis state. Each call is its own statement so the
/// caller can keep going after a single failed write.
#[derive(Clone)]
pub struct ResultWriter {
    pool: sqlx::SqlitePool,
}

impl ResultWriter {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn write_timeframe_result(&self, analysis_id: &str, r: &TimeframeResult) -> Result<()> {
        let sentiment = r.sentiment.to_string();
        sqlx::query(
            r#"
            INSERT INTO timeframe_results (
                analysis_id, timeframe, score, sentiment, strength, reasoning, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(analysis_id, timeframe) DO UPDATE SET
                score = excluded.score,
                sentiment = excluded.sentiment,
                strength = excluded.strength,
                reasoning = excluded.reasoning,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(analysis_id)
        .bind(&r.timeframe)
        .bind(r.score)
        .bind(sentiment)
        .bind(r.strength)
        .bind(&r.reasoning)
        .bind(now_ns())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn write_overall_metrics(&self, analysis_id: &str, m: &OverallMetrics) -> Result<()> {
        let risk_level = m.risk_level.to_string();
        sqlx::query(
            r#"
            UPDATE analyses
            SET overall_probability = ?, confidence_level = ?, risk_level = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(m.overall_probability)
        .bind(m.confidence_level)
        .bind(risk_level)
        .bind(now_ns())
        .bind(analysis_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert a batch of answers atomically, keyed by (analysis, question).
    pub async fn write_answers(&self, analysis_id: &str, answers: &[AnswerInput]) -> Result<()> {
        let updated_at = now_ns();
        let mut tx = self.pool.begin().await?;

        for a in answers {
            let id = format!("{analysis_id}:{}", a.question_id);
            let value = a.answer_value.as_ref().map(serde_json::to_string).transpose()?;
            sqlx::query(
                r#"
                INSERT INTO answers (id, analysis_id, question_id, answer_text, answer_value, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(analysis_id, question_id) DO UPDATE SET
                    answer_text = excluded.answer_text,
                    answer_value = excluded.answer_value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(id)
            .bind(analysis_id)
            .bind(&a.question_id)
            .bind(&a.answer_text)
            .bind(value)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::reader::{load_analysis, load_answers, load_timeframe_results};
    use crate::db::test_support::*;
    use crate::types::{QuestionType, RiskLevel, Sentiment};

    fn result(timeframe: &str, score: f64) -> TimeframeResult {
        TimeframeResult {
            timeframe: timeframe.to_string(),
            score,
            sentiment: Sentiment::Bullish,
            strength: 40.0,
            reasoning: "a; b".to_string(),
        }
    }

    #[tokio::test]
    async fn timeframe_result_upserts() {
        let pool = memory_pool().await;
        insert_analysis(&pool, "an1", "user1", "GBPUSD", &["H4"]).await;
        let writer = ResultWriter::new(pool.clone());

        writer.write_timeframe_result("an1", &result("H4", 60.0)).await.unwrap();
        writer.write_timeframe_result("an1", &result("H4", 65.0)).await.unwrap();

        let stored = load_timeframe_results(&pool, "an1").await.unwrap();
        assert_eq!(stored, vec![result("H4", 65.0)]);
    }

    #[tokio::test]
    async fn overall_metrics_land_on_analysis() {
        let pool = memory_pool().await;
        insert_analysis(&pool, "an1", "user1", "GBPUSD", &["H4"]).await;
        let writer = ResultWriter::new(pool.clone());

        let metrics = OverallMetrics {
            overall_probability: 61.1,
            confidence_level: 76.1,
            risk_level: RiskLevel::Medium,
        };
        writer.write_overall_metrics("an1", &metrics).await.unwrap();

        let analysis = load_analysis(&pool, "an1", "user1").await.unwrap().unwrap();
        assert_eq!(analysis.overall_metrics, Some(metrics));
        assert!(analysis.updated_at.is_some());
    }

    #[tokio::test]
    async fn answers_replace_previous_response() {
        let pool = memory_pool().await;
        insert_analysis(&pool, "an1", "user1", "GBPUSD", &["H4"]).await;
        insert_question(&pool, "q1", "H4", QuestionType::Boolean, 1).await;
        let writer = ResultWriter::new(pool.clone());

        let input = |v: bool| AnswerInput {
            question_id: "q1".to_string(),
            answer_text: None,
            answer_value: Some(AnswerValue::Bool(v)),
        };
        writer.write_answers("an1", &[input(true)]).await.unwrap();
        writer.write_answers("an1", &[input(false)]).await.unwrap();

        let answers = load_answers(&pool, "an1").await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].id, "an1:q1");
        assert_eq!(answers[0].answer_value, Some(AnswerValue::Bool(false)));
    }
}

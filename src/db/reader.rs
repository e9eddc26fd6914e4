use crate::db::models::{AnalysisRow, AnswerRow, QuestionRow, TimeframeResultRow};
use crate::error::Result;
use crate::types::{Analysis, Answer, Question, TimeframeResult};

/// Resolve a bearer token to its user id.
pub async fn user_for_token(pool: &sqlx::SqlitePool, token: &str) -> Result<Option<String>> {
    let user_id = sqlx::query_scalar::<_, String>("SELECT user_id FROM api_tokens WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(user_id)
}

/// Load an analysis only if `user_id` owns it.
pub async fn load_analysis(
    pool: &sqlx::SqlitePool,
    analysis_id: &str,
    user_id: &str,
) -> Result<Option<Analysis>> {
    let row = sqlx::query_as::<_, AnalysisRow>(
        r#"
        SELECT id, user_id, currency_pair, timeframes,
               overall_probability, confidence_level, risk_level, updated_at
        FROM analyses
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(analysis_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Analysis::from))
}

pub async fn load_answers(pool: &sqlx::SqlitePool, analysis_id: &str) -> Result<Vec<Answer>> {
    let rows = sqlx::query_as::<_, AnswerRow>(
        r#"
        SELECT id, analysis_id, question_id, answer_text, answer_value
        FROM answers
        WHERE analysis_id = ?
        "#,
    )
    .bind(analysis_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Answer::from).collect())
}

/// Questions ordered by timeframe then `order_index`.
/// `active_only` hides retired questions from the questionnaire; scoring still
/// needs them so old answers keep resolving.
pub async fn load_questions(
    pool: &sqlx::SqlitePool,
    timeframe: Option<&str>,
    active_only: bool,
) -> Result<Vec<Question>> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, timeframe, question_text, question_type, options, order_index, is_active
        FROM questions
        WHERE (?1 IS NULL OR timeframe = ?1)
          AND (?2 = 0 OR is_active = 1)
        ORDER BY timeframe, order_index
        "#,
    )
    .bind(timeframe)
    .bind(active_only)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(QuestionRow::into_question).collect())
}

pub async fn load_timeframe_results(
    pool: &sqlx::SqlitePool,
    analysis_id: &str,
) -> Result<Vec<TimeframeResult>> {
    let rows = sqlx::query_as::<_, TimeframeResultRow>(
        r#"
        SELECT timeframe, score, sentiment, strength, reasoning
        FROM timeframe_results
        WHERE analysis_id = ?
        ORDER BY timeframe
        "#,
    )
    .bind(analysis_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(TimeframeResult::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::types::{AnswerValue, QuestionType};

    #[tokio::test]
    async fn token_resolves_to_user() {
        let pool = memory_pool().await;
        insert_token(&pool, "tok1", "user1").await;
        assert_eq!(user_for_token(&pool, "tok1").await.unwrap().as_deref(), Some("user1"));
        assert!(user_for_token(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn analysis_is_scoped_to_owner() {
        let pool = memory_pool().await;
        insert_analysis(&pool, "an1", "user1", "EURUSD", &["DAILY", "H4"]).await;

        let analysis = load_analysis(&pool, "an1", "user1").await.unwrap().unwrap();
        assert_eq!(analysis.currency_pair, "EURUSD");
        assert_eq!(analysis.timeframes, vec!["DAILY", "H4"]);
        assert!(analysis.overall_metrics.is_none());

        assert!(load_analysis(&pool, "an1", "user2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn questions_filter_and_order() {
        let pool = memory_pool().await;
        insert_question(&pool, "q2", "H4", QuestionType::Rating, 2).await;
        insert_question(&pool, "q1", "H4", QuestionType::MultipleChoice, 1).await;
        insert_question(&pool, "q3", "DAILY", QuestionType::Text, 1).await;
        sqlx::query("UPDATE questions SET is_active = 0 WHERE id = 'q2'")
            .execute(&pool)
            .await
            .unwrap();

        let h4: Vec<String> = load_questions(&pool, Some("H4"), false)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(h4, vec!["q1", "q2"]);

        let active = load_questions(&pool, None, true).await.unwrap();
        assert_eq!(active.len(), 2);
        assert!(active.iter().all(|q| q.is_active));
    }

    #[tokio::test]
    async fn answers_decode_json_values() {
        let pool = memory_pool().await;
        insert_analysis(&pool, "an1", "user1", "EURUSD", &["H4"]).await;
        insert_question(&pool, "q1", "H4", QuestionType::Rating, 1).await;
        insert_answer(&pool, "an1", "q1", None, Some("5")).await;

        let answers = load_answers(&pool, "an1").await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_value, Some(AnswerValue::Number(5.0)));
    }
}

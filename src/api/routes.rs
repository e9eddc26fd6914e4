use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::analysis::recalculate_analysis;
use crate::api::auth::authenticate;
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::db::reader::{load_analysis, load_questions, load_timeframe_results};
use crate::db::{AnswerInput, ResultWriter};
use crate::error::AppError;
use crate::market::MarketData;
use crate::types::{Analysis, AnswerValue, OverallMetrics, Question, TimeframeResult};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub writer: ResultWriter,
    pub market: Arc<MarketData>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/tda/analyze", post(analyze))
        .route("/api/tda/questions", get(get_questions))
        .route("/api/tda/analyses/:id", get(get_analysis))
        .route("/api/tda/analyses/:id/answers", put(put_answers))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub analysis_id: String,
}

#[derive(Deserialize)]
pub struct QuestionsQuery {
    pub timeframe: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: String,
    pub answer_text: Option<String>,
    pub answer_value: Option<AnswerValue>,
}

#[derive(Deserialize)]
pub struct AnswersRequest {
    pub answers: Vec<AnswerSubmission>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub updated_timeframes: Vec<TimeframeResult>,
    pub overall_metrics: OverallMetrics,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_timeframes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: Analysis,
    pub timeframe_results: Vec<TimeframeResult>,
}

#[derive(Serialize)]
pub struct AnswersResponse {
    pub success: bool,
    pub saved: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn analyze(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let user_id = authenticate(&state.pool, &headers).await?;
    let outcome = recalculate_analysis(&state, &user_id, &req.analysis_id).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        updated_timeframes: outcome.updated,
        overall_metrics: outcome.overall,
        failed_timeframes: outcome.failed,
    }))
}

async fn get_questions(
    State(state): State<ApiState>,
    Query(params): Query<QuestionsQuery>,
) -> Result<Json<Vec<Question>>, AppError> {
    let questions = load_questions(&state.pool, params.timeframe.as_deref(), true).await?;
    Ok(Json(questions))
}

async fn get_analysis(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(analysis_id): Path<String>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let user_id = authenticate(&state.pool, &headers).await?;
    let analysis = load_analysis(&state.pool, &analysis_id, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Analysis".to_string()))?;
    let timeframe_results = load_timeframe_results(&state.pool, &analysis_id).await?;

    Ok(Json(AnalysisResponse {
        analysis,
        timeframe_results,
    }))
}

async fn put_answers(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(analysis_id): Path<String>,
    Json(req): Json<AnswersRequest>,
) -> Result<Json<AnswersResponse>, AppError> {
    let user_id = authenticate(&state.pool, &headers).await?;
    load_analysis(&state.pool, &analysis_id, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Analysis".to_string()))?;

    let known: HashSet<String> = load_questions(&state.pool, None, false)
        .await?
        .into_iter()
        .map(|q| q.id)
        .collect();
    if let Some(unknown) = req.answers.iter().find(|a| !known.contains(&a.question_id)) {
        return Err(AppError::BadRequest(format!(
            "unknown question {}",
            unknown.question_id
        )));
    }

    let inputs: Vec<AnswerInput> = req
        .answers
        .into_iter()
        .map(|a| AnswerInput {
            question_id: a.question_id,
            answer_text: a.answer_text,
            answer_value: a.answer_value,
        })
        .collect();
    state.writer.write_answers(&analysis_id, &inputs).await?;
    tracing::info!(analysis_id = %analysis_id, saved = inputs.len(), "Answers saved");

    Ok(Json(AnswersResponse {
        success: true,
        saved: inputs.len(),
    }))
}

async fn get_health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "db_ok": db_ok,
        "market_data_enabled": state.market.is_enabled(),
        "recalculations": state.health.recalculations(),
        "persist_failures": state.health.persist_failures(),
        "last_recalculated_at_ns": state.health.last_recalculated_at_ns(),
    }))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let (p50, p95, p99) = state.latency.percentiles();
    let to_ms = |us: Option<u64>| us.map(|v| v as f64 / 1000.0);
    Json(serde_json::json!({
        "samples": state.latency.len(),
        "p50_ms": to_ms(p50),
        "p95_ms": to_ms(p95),
        "p99_ms": to_ms(p99),
    }))
}

#[cfg(test)]
pub(crate) async fn test_state() -> ApiState {
    use crate::config::Config;
    use crate::db::test_support::memory_pool;

    let pool = memory_pool().await;
    let cfg = Config {
        log_level: "info".to_string(),
        db_path: ":memory:".to_string(),
        api_port: 0,
        market_data_url: None,
        market_trend_ttl_secs: 300,
    };
    ApiState {
        writer: ResultWriter::new(pool.clone()),
        pool,
        market: Arc::new(MarketData::new(&cfg).unwrap()),
        health: Arc::new(HealthState::new()),
        latency: Arc::new(LatencyStats::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::reader::load_answers;
    use crate::db::test_support::*;
    use crate::types::QuestionType;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    fn auth(token: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        h
    }

    async fn seeded_state() -> ApiState {
        let state = test_state().await;
        insert_token(&state.pool, "tok", "user1").await;
        insert_analysis(&state.pool, "an1", "user1", "EURUSD", &["H4"]).await;
        insert_question(&state.pool, "q1", "H4", QuestionType::MultipleChoice, 1).await;
        state
    }

    #[tokio::test]
    async fn analyze_requires_auth() {
        let state = seeded_state().await;
        let req = AnalyzeRequest { analysis_id: "an1".to_string() };
        let err = analyze(State(state), HeaderMap::new(), Json(req)).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn answers_then_analyze() {
        let state = seeded_state().await;

        let submit = AnswersRequest {
            answers: vec![AnswerSubmission {
                question_id: "q1".to_string(),
                answer_text: None,
                answer_value: Some(AnswerValue::Text("Bullish".to_string())),
            }],
        };
        let Json(saved) = put_answers(
            State(state.clone()),
            auth("tok"),
            Path("an1".to_string()),
            Json(submit),
        )
        .await
        .unwrap();
        assert_eq!(saved.saved, 1);
        assert_eq!(load_answers(&state.pool, "an1").await.unwrap().len(), 1);

        let req = AnalyzeRequest { analysis_id: "an1".to_string() };
        let Json(resp) = analyze(State(state.clone()), auth("tok"), Json(req)).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.updated_timeframes.len(), 1);
        assert_eq!(resp.updated_timeframes[0].score, 70.0);
        // H4 alone: 70, consistency 1.0 → confidence 100
        assert_eq!(resp.overall_metrics.overall_probability, 70.0);
        assert_eq!(resp.overall_metrics.confidence_level, 100.0);

        let body = serde_json::to_value(&resp).unwrap();
        assert!(body.get("updatedTimeframes").is_some());
        assert_eq!(body["overallMetrics"]["risk_level"], "MEDIUM");
        assert!(body.get("failedTimeframes").is_none());

        let Json(view) = get_analysis(State(state), auth("tok"), Path("an1".to_string()))
            .await
            .unwrap();
        assert_eq!(view.timeframe_results.len(), 1);
        assert!(view.analysis.overall_metrics.is_some());
    }

    #[tokio::test]
    async fn unknown_question_is_rejected() {
        let state = seeded_state().await;
        let submit = AnswersRequest {
            answers: vec![AnswerSubmission {
                question_id: "nope".to_string(),
                answer_text: Some("x".to_string()),
                answer_value: None,
            }],
        };
        let err = put_answers(State(state), auth("tok"), Path("an1".to_string()), Json(submit))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn missing_analysis_is_not_found() {
        let state = seeded_state().await;
        let err = get_analysis(State(state), auth("tok"), Path("missing".to_string()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn analyze_request_uses_camel_case() {
        let req: AnalyzeRequest = serde_json::from_str(r#"{"analysisId":"an1"}"#).unwrap();
        assert_eq!(req.analysis_id, "an1");

        let sub: AnswerSubmission =
            serde_json::from_str(r#"{"questionId":"q1","answerValue":4}"#).unwrap();
        assert_eq!(sub.answer_value, Some(AnswerValue::Number(4.0)));
        assert!(sub.answer_text.is_none());
    }
}

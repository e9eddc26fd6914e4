use std::collections::HashSet;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::api::routes::ApiState;
use crate::db::reader::{load_analysis, load_answers, load_questions};
use crate::error::{AppError, Result};
use crate::scorer::{aggregate, score_timeframe};
use crate::types::{now_ns, Answer, OverallMetrics, Question, TimeframeResult};

/// What a recalculation produced. Timeframes that failed to persist are listed
/// in `failed` and left out of both `updated` and the overall metrics.
#[derive(Debug)]
pub struct RecalculationOutcome {
    pub updated: Vec<TimeframeResult>,
    pub overall: OverallMetrics,
    pub failed: Vec<String>,
}

/// Re-score every selected timeframe of an analysis and persist the results.
///
/// Timeframes are processed one at a time; a failed write is logged and the
/// loop moves on. If every write fails, the previous overall metrics stay in
/// place. Only loading the prerequisites can fail the whole call.
pub async fn recalculate_analysis(
    state: &ApiState,
    user_id: &str,
    analysis_id: &str,
) -> Result<RecalculationOutcome> {
    let started = Instant::now();

    let analysis = load_analysis(&state.pool, analysis_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Analysis".to_string()))?;
    let answers = load_answers(&state.pool, analysis_id).await?;
    let questions = load_questions(&state.pool, None, false).await?;
    let market_trend = state.market.trend_for(&analysis.currency_pair).await;

    let mut updated = Vec::with_capacity(analysis.timeframes.len());
    let mut failed = Vec::new();
    let mut seen = HashSet::new();

    // A timeframe listed twice is scored once, at its first position.
    for timeframe in analysis.timeframes.iter().filter(|tf| seen.insert(tf.as_str())) {
        let (tf_answers, tf_questions) = select_timeframe(timeframe, &answers, &questions);
        let result = score_timeframe(timeframe, &tf_answers, &tf_questions, market_trend);

        match state.writer.write_timeframe_result(analysis_id, &result).await {
            Ok(()) => {
                info!(
                    analysis_id,
                    timeframe = %result.timeframe,
                    score = result.score,
                    sentiment = %result.sentiment,
                    strength = result.strength,
                    "Timeframe scored",
                );
                updated.push(result);
            }
            Err(e) => {
                error!(analysis_id, timeframe = %timeframe, "Failed to persist timeframe result: {e}");
                state.health.inc_persist_failures();
                failed.push(timeframe.clone());
            }
        }
    }

    // Stored metrics must describe the stored results, so nothing is written
    // when no timeframe made it to the database.
    let overall = aggregate(&updated);
    if updated.is_empty() {
        warn!(analysis_id, "No timeframe persisted; keeping previous overall metrics");
    } else if let Err(e) = state.writer.write_overall_metrics(analysis_id, &overall).await {
        warn!(analysis_id, "Failed to persist overall metrics: {e}");
        state.health.inc_persist_failures();
    }

    state.latency.record(started.elapsed());
    state.health.record_recalculation(now_ns() as u64);

    let trend_label = market_trend
        .map(|s| s.trend.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    info!(
        analysis_id,
        pair = %analysis.currency_pair,
        updated = updated.len(),
        failed = failed.len(),
        probability = overall.overall_probability,
        confidence = overall.confidence_level,
        risk = %overall.risk_level,
        market_trend = %trend_label,
        "Analysis recalculated",
    );

    Ok(RecalculationOutcome {
        updated,
        overall,
        failed,
    })
}

/// Answers and questions belonging to one timeframe. Answers to questions of
/// other timeframes (or to unknown questions) are left out.
fn select_timeframe(
    timeframe: &str,
    answers: &[Answer],
    questions: &[Question],
) -> (Vec<Answer>, Vec<Question>) {
    let tf_questions: Vec<Question> = questions
        .iter()
        .filter(|q| q.timeframe == timeframe)
        .cloned()
        .collect();
    let tf_answers = answers
        .iter()
        .filter(|a| tf_questions.iter().any(|q| q.id == a.question_id))
        .cloned()
        .collect();
    (tf_answers, tf_questions)
}

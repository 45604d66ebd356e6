use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;

use crate::dto::submit_dto::{ReportResponse, SubmitRequest};
use crate::error::Error;
use crate::models::quiz::QuestionKind;
use crate::models::report::QuestionResult;
use crate::services::grading_service::GradingService;
use crate::services::notify_service::ReportNotification;
use crate::services::report_service::ReportService;
use crate::AppState;

/// Grade a submission end to end: objective scoring, one evaluator call for
/// the free-text questions (or the deterministic degraded path), report
/// assembly, and the optional results webhook.
#[axum::debug_handler]
pub async fn submit_quiz(
    State(state): State<AppState>,
    body: String,
) -> crate::error::Result<Response> {
    // A malformed body is graded as an empty-answers submission, not rejected.
    let req: SubmitRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Malformed submission body, grading as unanswered: {}", e);
            SubmitRequest::default()
        }
    };

    let submission_id = Uuid::new_v4();
    tracing::info!(
        %submission_id,
        quiz = req.quiz.as_deref().unwrap_or("<default>"),
        answers = req.answers.len(),
        "Received submission"
    );

    let quiz = state
        .quizzes
        .get(req.quiz.as_deref())
        .ok_or_else(|| Error::NotFound(format!("Unknown quiz '{}'", req.quiz.as_deref().unwrap_or(""))))?;

    // Without an evaluator credential the whole report degrades to a fixed
    // configuration-error response. Still HTTP 200: the renderer handles it.
    let Some(eval_service) = &state.eval_service else {
        tracing::error!(%submission_id, "Evaluator API key missing, returning configuration error report");
        let response = config_error_report(submission_id, quiz.id.clone());
        return Ok(Json(response).into_response());
    };

    let mut results = GradingService::grade_objective(quiz, &req.answers)?;
    let (pending, objective): (Vec<QuestionResult>, Vec<QuestionResult>) =
        results.iter().cloned().partition(|r| r.needs_eval);

    let holistic_feedback = match eval_service
        .grade_free_text(quiz.evaluator_persona.as_deref(), &objective, &pending)
        .await
    {
        Ok(outcome) => ReportService::merge_evaluated(&mut results, outcome),
        Err(e) => {
            tracing::error!(%submission_id, error = %e, "Evaluator call failed, applying fallback");
            ReportService::apply_evaluator_fallback(&mut results, &e.to_string())
        }
    };

    let response = ReportResponse {
        submission_id,
        quiz_id: quiz.id.clone(),
        total_score: ReportService::total_score(&results),
        max_score: quiz.max_score(),
        results,
        holistic_feedback,
    };

    tracing::info!(
        %submission_id,
        total = response.total_score,
        max = response.max_score,
        "Submission graded"
    );
    state
        .notify_service
        .notify(ReportNotification::from_report(&response, req.name, req.email));

    Ok(Json(response).into_response())
}

fn config_error_report(submission_id: Uuid, quiz_id: String) -> ReportResponse {
    let message = "Server missing evaluator API key. Please contact administrator.";
    ReportResponse {
        submission_id,
        quiz_id,
        total_score: 0.0,
        max_score: 0.0,
        results: vec![QuestionResult {
            id: "error".to_string(),
            text: "Configuration Error".to_string(),
            kind: QuestionKind::Error,
            user_answer: "N/A".to_string(),
            correct_answer: None,
            is_correct: None,
            points: 0.0,
            max_points: 0.0,
            analysis: Some(message.to_string()),
            sample_answer: Some("N/A".to_string()),
            needs_eval: false,
        }],
        holistic_feedback: message.to_string(),
    }
}

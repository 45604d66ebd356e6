use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};

use crate::dto::submit_dto::PublicQuizView;
use crate::error::Error;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_default_quiz(State(state): State<AppState>) -> crate::error::Result<Response> {
    let quiz = state
        .quizzes
        .get(None)
        .ok_or_else(|| Error::NotFound("No quiz configured".to_string()))?;
    Ok(Json(PublicQuizView::from(quiz)).into_response())
}

#[axum::debug_handler]
pub async fn get_quiz_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> crate::error::Result<Response> {
    let quiz = state
        .quizzes
        .get(Some(&id))
        .ok_or_else(|| Error::NotFound(format!("Unknown quiz '{}'", id)))?;
    Ok(Json(PublicQuizView::from(quiz)).into_response())
}

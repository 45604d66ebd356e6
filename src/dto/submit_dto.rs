use crate::models::quiz::{AnswerValue, QuestionKind, Quiz};
use crate::models::report::QuestionResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inbound submission. Defaults make a malformed body equivalent to an
/// empty-answers submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: HashMap<String, AnswerValue>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Quiz variant selector; omitted means the default variant.
    #[serde(default)]
    pub quiz: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub submission_id: uuid::Uuid,
    pub quiz_id: String,
    pub total_score: f64,
    pub max_score: f64,
    pub results: Vec<QuestionResult>,
    pub holistic_feedback: String,
}

/// Variant view safe to hand to the renderer: no correct answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuizView {
    pub id: String,
    pub title: String,
    pub total_questions: usize,
    pub max_score: f64,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub text: String,
    pub points: f64,
}

impl From<&Quiz> for PublicQuizView {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            total_questions: quiz.questions.len(),
            max_score: quiz.max_score(),
            questions: quiz
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id.clone(),
                    kind: q.kind,
                    text: q.text.clone(),
                    points: q.points,
                })
                .collect(),
        }
    }
}

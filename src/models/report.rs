use crate::models::quiz::QuestionKind;
use serde::{Deserialize, Serialize};

/// One scored entry of the report, in quiz definition order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub user_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    pub points: f64,
    pub max_points: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
    /// Free-text entries start out pending and are resolved by the evaluator
    /// merge (or its fallback). Internal marker, not part of the wire format.
    #[serde(skip)]
    pub needs_eval: bool,
}

impl QuestionResult {
    pub fn is_pending(&self) -> bool {
        self.needs_eval
    }
}

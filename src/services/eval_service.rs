use crate::error::{Error, Result};
use crate::models::report::QuestionResult;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

const DEFAULT_PERSONA: &str = "an experienced teacher grading homework";

/// One per-question grade returned by the evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalGrade {
    pub id: String,
    pub score: f64,
    pub analysis: String,
    pub sample_answer: String,
}

/// The evaluator's full payload: per-question grades plus a holistic
/// feedback paragraph for the whole submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvalOutcome {
    #[serde(default)]
    pub grades: Vec<EvalGrade>,
    #[serde(default)]
    pub holistic_feedback: Option<String>,
}

/// Client for the external text-generation service (Gemini `generateContent`
/// wire shape). One call per submission, no retries; any failure is reported
/// to the caller, which degrades the report deterministically.
#[derive(Clone)]
pub struct EvalService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl EvalService {
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url,
            model,
            timeout,
        }
    }

    /// Ask the evaluator to grade the pending free-text answers and write
    /// holistic feedback, given the objective results as context.
    pub async fn grade_free_text(
        &self,
        persona: Option<&str>,
        objective: &[QuestionResult],
        pending: &[QuestionResult],
    ) -> Result<EvalOutcome> {
        let prompt = build_prompt(persona, objective, pending);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let payload = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let res = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Evaluator(format!(
                "Evaluator API error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;
        let text = body
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::Evaluator("Evaluator returned no content".to_string()))?;

        let outcome: EvalOutcome = serde_json::from_str(strip_code_fences(text))
            .map_err(|e| Error::Evaluator(format!("Unparsable evaluator payload: {}", e)))?;
        Ok(outcome)
    }
}

/// The model often wraps its JSON in markdown code fences; strip them before
/// parsing.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn build_prompt(
    persona: Option<&str>,
    objective: &[QuestionResult],
    pending: &[QuestionResult],
) -> String {
    let persona = persona.unwrap_or(DEFAULT_PERSONA);

    let objective_context = objective
        .iter()
        .map(|r| {
            format!(
                "- Q: \"{}\" | Student Answer: \"{}\" | Correct: {} (Correct Answer: {})",
                r.text,
                r.user_answer,
                if r.is_correct == Some(true) { "YES" } else { "NO" },
                r.correct_answer.as_deref().unwrap_or("N/A"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let open_questions = pending
        .iter()
        .map(|r| {
            serde_json::json!({
                "id": r.id,
                "question": r.text,
                "max_points": r.max_points,
                "student_answer": r.user_answer,
            })
            .to_string()
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"You are {persona}.

TASK 1: Grade the following {count} open-ended student answers.
For each answer, provide:
- A score from 0 to MAX_POINTS based on accuracy and depth (integers only).
- A brief, encouraging, but corrective feedback analysis (1-2 sentences).
- A sample "perfect" answer.

TASK 2: Provide a "Holistic Feedback" summary for the student.
- Review the "Objective Results" below to see what they got Right/Wrong.
- Review their open-ended answers.
- Write a short paragraph (3-4 sentences) addressing the student directly. Praise their strengths and gently point out areas to review. Be encouraging!

--- DATA ---

[Objective Results Context]:
{objective_context}

[Open-Ended Questions to Grade]:
{open_questions}

--- OUTPUT FORMAT ---
Return a SINGLE JSON object strictly following this structure:
{{
  "grades": [
    {{ "id": "question_id", "score": 5, "analysis": "...", "sample_answer": "..." }}
  ],
  "holistic_feedback": "Dear Student, excellent work on... You might want to review..."
}}"#,
        persona = persona,
        count = pending.len(),
        objective_context = objective_context,
        open_questions = open_questions,
    )
}

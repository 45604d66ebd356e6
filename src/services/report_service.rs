use crate::models::report::QuestionResult;
use crate::services::eval_service::{EvalGrade, EvalOutcome};
use crate::services::grading_service::round_to_tenth;
use std::collections::HashMap;

pub const NO_FEEDBACK: &str = "No AI feedback generated.";
const NO_SAMPLE: &str = "N/A";

pub struct ReportService;

impl ReportService {
    /// Merge evaluator grades back into the pending entries, matching by
    /// question id so out-of-order or omitted entries are tolerated. An
    /// omitted entry resolves to zero points with an explanatory analysis.
    /// Returns the holistic feedback for the report.
    pub fn merge_evaluated(results: &mut [QuestionResult], outcome: EvalOutcome) -> String {
        let mut grades: HashMap<String, EvalGrade> = outcome
            .grades
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();

        for entry in results.iter_mut().filter(|r| r.needs_eval) {
            match grades.remove(&entry.id) {
                Some(grade) => {
                    // The evaluator is asked for integers in range; the report
                    // invariant does not depend on it complying.
                    entry.points = grade.score.clamp(0.0, entry.max_points);
                    entry.analysis = Some(grade.analysis);
                    entry.sample_answer = Some(grade.sample_answer);
                }
                None => {
                    entry.points = 0.0;
                    entry.analysis = Some(
                        "The grading assistant returned no grade for this question.".to_string(),
                    );
                    entry.sample_answer = Some(NO_SAMPLE.to_string());
                }
            }
            entry.needs_eval = false;
        }

        outcome
            .holistic_feedback
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| NO_FEEDBACK.to_string())
    }

    /// Resolve every pending entry to the deterministic "evaluator
    /// unavailable" result. Returns the replacement holistic feedback.
    pub fn apply_evaluator_fallback(results: &mut [QuestionResult], reason: &str) -> String {
        for entry in results.iter_mut().filter(|r| r.needs_eval) {
            entry.points = 0.0;
            entry.analysis = Some(format!(
                "Error connecting to grading assistant: {}",
                reason
            ));
            entry.sample_answer = Some(NO_SAMPLE.to_string());
            entry.needs_eval = false;
        }
        format!("Error generating AI feedback: {}", reason)
    }

    /// Total awarded points, rounded to one decimal at presentation time.
    pub fn total_score(results: &[QuestionResult]) -> f64 {
        round_to_tenth(results.iter().map(|r| r.points).sum())
    }

    pub fn max_score(results: &[QuestionResult]) -> f64 {
        results.iter().map(|r| r.max_points).sum()
    }
}

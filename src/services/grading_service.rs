use crate::error::{Error, Result};
use crate::models::quiz::{AnswerValue, QuestionDetails, Quiz};
use crate::models::report::QuestionResult;
use std::collections::{HashMap, HashSet};

pub const NO_ANSWER: &str = "No Answer";

/// Flat deduction per incorrect selection on a multi-select question,
/// applied after the proportional term.
const MISS_PENALTY: f64 = 0.5;

pub struct GradingService;

impl GradingService {
    /// Score every objective question of `quiz` against `answers`, in quiz
    /// definition order. Free-text questions come back as pending entries
    /// awaiting the external evaluator.
    pub fn grade_objective(
        quiz: &Quiz,
        answers: &HashMap<String, AnswerValue>,
    ) -> Result<Vec<QuestionResult>> {
        let mut results = Vec::with_capacity(quiz.questions.len());

        for q in &quiz.questions {
            let answer = answers.get(&q.id);
            let user_answer = answer
                .map(AnswerValue::display)
                .unwrap_or_else(|| NO_ANSWER.to_string());

            let result = match &q.details {
                QuestionDetails::SingleChoice(sc) => {
                    let is_correct = answer.map(AnswerValue::display).as_deref() == Some(sc.correct.as_str());
                    QuestionResult {
                        id: q.id.clone(),
                        text: q.text.clone(),
                        kind: q.kind,
                        user_answer,
                        correct_answer: Some(sc.correct.clone()),
                        is_correct: Some(is_correct),
                        points: if is_correct { q.points } else { 0.0 },
                        max_points: q.points,
                        analysis: None,
                        sample_answer: None,
                        needs_eval: false,
                    }
                }
                QuestionDetails::MultiSelect(ms) => {
                    let chosen = answer.map(AnswerValue::labels).unwrap_or_default();
                    let points = Self::score_multi_select(&ms.correct, &chosen, q.points)?;
                    QuestionResult {
                        id: q.id.clone(),
                        text: q.text.clone(),
                        kind: q.kind,
                        user_answer,
                        correct_answer: Some(ms.correct.join(", ")),
                        is_correct: Some(points == q.points),
                        points,
                        max_points: q.points,
                        analysis: None,
                        sample_answer: None,
                        needs_eval: false,
                    }
                }
                QuestionDetails::FreeText(_) => QuestionResult {
                    id: q.id.clone(),
                    text: q.text.clone(),
                    kind: q.kind,
                    user_answer,
                    correct_answer: None,
                    is_correct: None,
                    points: 0.0,
                    max_points: q.points,
                    analysis: None,
                    sample_answer: None,
                    needs_eval: true,
                },
            };
            results.push(result);
        }

        Ok(results)
    }

    /// Partial-credit scorer for multi-select questions.
    ///
    /// `raw = (hits / |correct|) * points - 0.5 * misses`, clamped to a
    /// minimum of 0 and rounded to the nearest 0.1. The result is always in
    /// `[0, points]`: selecting exactly the correct set scores `points`,
    /// selecting nothing scores 0, and each incorrect selection costs a flat
    /// 0.5 regardless of which correct items were also chosen.
    pub fn score_multi_select(correct: &[String], chosen: &[&str], points: f64) -> Result<f64> {
        if correct.is_empty() {
            return Err(Error::Config(
                "Multi-select question has an empty correct set".to_string(),
            ));
        }

        let chosen: HashSet<&str> = chosen.iter().copied().collect();
        let hits = chosen
            .iter()
            .filter(|label| correct.iter().any(|c| c == *label))
            .count();
        let misses = chosen.len() - hits;

        let raw = (hits as f64 / correct.len() as f64) * points - MISS_PENALTY * misses as f64;
        Ok(round_to_tenth(raw.max(0.0)))
    }
}

/// Round to the nearest 0.1.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

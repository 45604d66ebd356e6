use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A quiz variant. Loaded once at startup and shared immutably; scoring never
/// mutates it, so several variants can coexist in one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    /// Persona line for the external evaluator prompt, e.g.
    /// "a Catholic theology teacher grading confirmation homework".
    #[serde(default)]
    pub evaluator_persona: Option<String>,
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Declared maximum: the sum of per-question maxima.
    pub fn max_score(&self) -> f64 {
        self.questions.iter().map(|q| q.points).sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("Quiz id must not be empty".to_string()));
        }
        if self.questions.is_empty() {
            return Err(Error::Config(format!(
                "Quiz '{}' has no questions",
                self.id
            )));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for q in &self.questions {
            if q.id.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Quiz '{}' contains a question with an empty id",
                    self.id
                )));
            }
            if !seen.insert(q.id.as_str()) {
                return Err(Error::Config(format!(
                    "Quiz '{}' has duplicate question id '{}'",
                    self.id, q.id
                )));
            }
            if !(q.points > 0.0) {
                return Err(Error::Config(format!(
                    "Question '{}' must have a positive point value",
                    q.id
                )));
            }
            match (&q.kind, &q.details) {
                (QuestionKind::SingleChoice, QuestionDetails::SingleChoice(_)) => {}
                (QuestionKind::MultiSelect, QuestionDetails::MultiSelect(ms)) => {
                    // An empty correct set would divide by zero in the scorer.
                    if ms.correct.is_empty() {
                        return Err(Error::Config(format!(
                            "Multi-select question '{}' has an empty correct set",
                            q.id
                        )));
                    }
                }
                (QuestionKind::FreeText, QuestionDetails::FreeText(_)) => {}
                _ => {
                    return Err(Error::Config(format!(
                        "Question '{}' kind does not match its details",
                        q.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub text: String,
    #[serde(default = "default_points")]
    pub points: f64,
    #[serde(flatten)]
    pub details: QuestionDetails,
}

fn default_points() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultiSelect,
    FreeText,
    /// Reserved for synthetic report entries (configuration failures).
    /// Never valid inside a quiz definition.
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionDetails {
    MultiSelect(MultiSelectDetails),
    SingleChoice(SingleChoiceDetails),
    FreeText(FreeTextDetails),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSelectDetails {
    pub correct: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleChoiceDetails {
    pub correct: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreeTextDetails {
    /// Optional grading hint forwarded to the evaluator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

/// A respondent's answer to one question: a single label for single-choice
/// and free-text, a label set for multi-select.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Many(Vec<String>),
    One(String),
}

impl AnswerValue {
    pub fn display(&self) -> String {
        match self {
            AnswerValue::One(s) => s.clone(),
            AnswerValue::Many(items) => items.join(", "),
        }
    }

    /// The answer as a label set. A bare string counts as a one-element set
    /// so a single checked box is not thrown away.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            AnswerValue::One(s) => vec![s.as_str()],
            AnswerValue::Many(items) => items.iter().map(|s| s.as_str()).collect(),
        }
    }
}

/// The set of quiz variants shipped in the quiz file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSet {
    pub quizzes: Vec<Quiz>,
}

impl QuizSet {
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read quiz file '{}': {}", path, e)))?;
        let set: QuizSet = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid quiz file '{}': {}", path, e)))?;
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<()> {
        if self.quizzes.is_empty() {
            return Err(Error::Config("Quiz file contains no quizzes".to_string()));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for quiz in &self.quizzes {
            if !seen.insert(quiz.id.as_str()) {
                return Err(Error::Config(format!("Duplicate quiz id '{}'", quiz.id)));
            }
            quiz.validate()?;
        }
        Ok(())
    }

    /// Look up a variant by id; `None` selects the first (default) variant.
    pub fn get(&self, id: Option<&str>) -> Option<&Quiz> {
        match id {
            Some(id) => self.quizzes.iter().find(|q| q.id == id),
            None => self.quizzes.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiz_json() -> serde_json::Value {
        json!({
            "id": "sample",
            "title": "Sample",
            "questions": [
                { "id": "q1", "type": "single_choice", "text": "Pick one", "points": 2.0, "correct": "A" },
                { "id": "q2", "type": "multi_select", "text": "Pick many", "points": 3.0, "correct": ["A", "B"] },
                { "id": "q3", "type": "free_text", "text": "Explain", "points": 5.0 }
            ]
        })
    }

    #[test]
    fn deserializes_kind_specific_details() {
        let quiz: Quiz = serde_json::from_value(quiz_json()).unwrap();
        quiz.validate().unwrap();
        assert!(matches!(
            quiz.questions[0].details,
            QuestionDetails::SingleChoice(_)
        ));
        assert!(matches!(
            quiz.questions[1].details,
            QuestionDetails::MultiSelect(_)
        ));
        assert!(matches!(
            quiz.questions[2].details,
            QuestionDetails::FreeText(_)
        ));
        assert_eq!(quiz.max_score(), 10.0);
    }

    #[test]
    fn rejects_empty_correct_set() {
        let mut raw = quiz_json();
        raw["questions"][1]["correct"] = json!([]);
        let quiz: Quiz = serde_json::from_value(raw).unwrap();
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let mut raw = quiz_json();
        raw["questions"][1]["id"] = json!("q1");
        let quiz: Quiz = serde_json::from_value(raw).unwrap();
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn rejects_mismatched_details() {
        let mut raw = quiz_json();
        // single_choice with an array of correct labels
        raw["questions"][0]["correct"] = json!(["A", "B"]);
        let quiz: Quiz = serde_json::from_value(raw).unwrap();
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn answer_value_accepts_string_or_array() {
        let one: AnswerValue = serde_json::from_value(json!("Rosary")).unwrap();
        let many: AnswerValue = serde_json::from_value(json!(["Ashes", "Rosary"])).unwrap();
        assert_eq!(one.labels(), vec!["Rosary"]);
        assert_eq!(many.display(), "Ashes, Rosary");
    }
}

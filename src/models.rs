use serde::Deserialize;

use crate::db::QuestionType;

#[derive(Debug, Clone, Deserialize)]
pub struct SurveyInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "enabled")]
    pub use_subjects: bool,
    #[serde(default = "enabled")]
    pub use_answers: bool,
}

fn enabled() -> bool {
    true
}

/// Title and description of a question group or answer in one language.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentInput {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub question_type: QuestionType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectInput {
    pub name: String,
    pub parent_id: Option<i64>,
}

/// One completed survey: every answer id the participant picked for `subject_id`.
/// `subject_id` is left out for surveys that do not use subjects.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub subject_id: Option<i64>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub answers: Vec<i64>,
}

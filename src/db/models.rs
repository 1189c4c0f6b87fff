// Database model structs

use std::fmt;

use serde::{Deserialize, Serialize};

use super::translation::Translation;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Survey {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Participants answer for a subject. Without it results are stored
    /// under [`NO_SUBJECT`].
    pub use_subjects: bool,
    /// Questions offer answers. Without it a submission records only the subject.
    pub use_answers: bool,
}

/// Subject id of results recorded for a survey that does not use subjects.
pub const NO_SUBJECT: i64 = 0;

#[derive(Debug, Clone, Serialize)]
pub struct QuestionGroup {
    pub id: i64,
    pub survey_id: i64,
    pub order: i64,
    pub title: Translation,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    Single,
    Multiple,
}

impl QuestionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "multiple" => Self::Multiple,
            _ => Self::Single,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: i64,
    pub group_id: i64,
    pub question_type: QuestionType,
    pub order: i64,
    pub title: Translation,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub order: i64,
    pub title: Translation,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subject {
    pub id: i64,
    pub survey_id: i64,
    pub parent_id: Option<i64>,
    pub name: Translation,
}

/// Live `(id, order)` pair inside a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Position {
    pub id: i64,
    #[sqlx(rename = "sort_order")]
    pub order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ResultRecord {
    pub answer_id: i64,
    pub subject_id: i64,
    #[sqlx(rename = "result_count")]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserSubject {
    pub user_id: String,
    pub subject_id: i64,
}

// Base rows before translations are attached

#[derive(sqlx::FromRow)]
pub(crate) struct GroupRow {
    pub id: i64,
    pub survey_id: i64,
    pub sort_order: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct QuestionRow {
    pub id: i64,
    pub group_id: i64,
    pub question_type: String,
    pub sort_order: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct AnswerRow {
    pub id: i64,
    pub question_id: i64,
    pub sort_order: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SubjectRow {
    pub id: i64,
    pub survey_id: i64,
    pub parent_id: Option<i64>,
}

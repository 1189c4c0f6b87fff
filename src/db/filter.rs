//! Typed filters for list queries.
//!
//! Each entity only exposes the fields it can be filtered by, so a filter on an
//! unknown column does not compile. Composite-key filters (results, user
//! subjects) carry optional fields and are validated where a full key is needed.

use sqlx::{QueryBuilder, Sqlite};

use super::models::QuestionType;
use super::{StoreResult, SurveyError};

pub trait FilterField {
    /// Append `<column> = <bind>` for this field. `alias` prefixes the column.
    fn push_condition(&self, alias: &str, qb: &mut QueryBuilder<'_, Sqlite>);
}

pub(crate) fn push_filters<F: FilterField>(
    qb: &mut QueryBuilder<'_, Sqlite>,
    alias: &str,
    filters: &[F],
) {
    for filter in filters {
        qb.push(" AND ");
        filter.push_condition(alias, qb);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFilter {
    Id(i64),
    SurveyId(i64),
}

impl FilterField for GroupFilter {
    fn push_condition(&self, alias: &str, qb: &mut QueryBuilder<'_, Sqlite>) {
        match *self {
            Self::Id(id) => qb.push(format!("{alias}.id = ")).push_bind(id),
            Self::SurveyId(id) => qb.push(format!("{alias}.survey_id = ")).push_bind(id),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionFilter {
    Id(i64),
    GroupId(i64),
    Type(QuestionType),
}

impl FilterField for QuestionFilter {
    fn push_condition(&self, alias: &str, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::Id(id) => qb.push(format!("{alias}.id = ")).push_bind(*id),
            Self::GroupId(id) => qb.push(format!("{alias}.group_id = ")).push_bind(*id),
            Self::Type(kind) => qb
                .push(format!("{alias}.question_type = "))
                .push_bind(kind.as_str()),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerFilter {
    Id(i64),
    QuestionId(i64),
}

impl FilterField for AnswerFilter {
    fn push_condition(&self, alias: &str, qb: &mut QueryBuilder<'_, Sqlite>) {
        match *self {
            Self::Id(id) => qb.push(format!("{alias}.id = ")).push_bind(id),
            Self::QuestionId(id) => qb.push(format!("{alias}.question_id = ")).push_bind(id),
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectFilter {
    Id(i64),
    SurveyId(i64),
    /// `None` selects top-level subjects.
    ParentId(Option<i64>),
}

impl FilterField for SubjectFilter {
    fn push_condition(&self, alias: &str, qb: &mut QueryBuilder<'_, Sqlite>) {
        match *self {
            Self::Id(id) => qb.push(format!("{alias}.id = ")).push_bind(id),
            Self::SurveyId(id) => qb.push(format!("{alias}.survey_id = ")).push_bind(id),
            Self::ParentId(Some(id)) => qb.push(format!("{alias}.parent_id = ")).push_bind(id),
            Self::ParentId(None) => qb.push(format!("{alias}.parent_id IS NULL")),
        };
    }
}

/// Filter over the `(answer_id, subject_id)` result key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultFilter {
    pub answer_id: Option<i64>,
    pub subject_id: Option<i64>,
}

impl ResultFilter {
    pub fn key(answer_id: i64, subject_id: i64) -> Self {
        Self {
            answer_id: Some(answer_id),
            subject_id: Some(subject_id),
        }
    }

    /// Both key fields, or a validation error.
    pub fn require_key(&self) -> StoreResult<(i64, i64)> {
        match (self.answer_id, self.subject_id) {
            (Some(answer_id), Some(subject_id)) => Ok((answer_id, subject_id)),
            _ => Err(SurveyError::validation(
                "need both answer and subject id to identify a result",
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.answer_id.is_none() && self.subject_id.is_none()
    }

    pub(crate) fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(id) = self.answer_id {
            qb.push(" AND answer_id = ").push_bind(id);
        }
        if let Some(id) = self.subject_id {
            qb.push(" AND subject_id = ").push_bind(id);
        }
    }
}

/// Filter over the `(user_id, subject_id)` key of recorded participations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSubjectFilter {
    pub user_id: Option<String>,
    pub subject_id: Option<i64>,
}

impl UserSubjectFilter {
    pub fn key(user_id: impl Into<String>, subject_id: i64) -> Self {
        Self {
            user_id: Some(user_id.into()),
            subject_id: Some(subject_id),
        }
    }

    pub fn require_key(&self) -> StoreResult<(&str, i64)> {
        match (self.user_id.as_deref(), self.subject_id) {
            (Some(user_id), Some(subject_id)) => Ok((user_id, subject_id)),
            _ => Err(SurveyError::validation(
                "need both user and subject id to identify a record",
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.subject_id.is_none()
    }

    pub(crate) fn push_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Sqlite>) {
        if let Some(id) = &self.user_id {
            qb.push(" AND user_id = ").push_bind(id.as_str());
        }
        if let Some(id) = self.subject_id {
            qb.push(" AND subject_id = ").push_bind(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_key_requires_both_fields() {
        assert!(ResultFilter::key(1, 2).require_key().is_ok());

        let partial = ResultFilter {
            answer_id: Some(1),
            subject_id: None,
        };
        assert!(matches!(
            partial.require_key(),
            Err(SurveyError::Validation(_))
        ));
    }

    #[test]
    fn user_subject_key_requires_both_fields() {
        assert_eq!(
            UserSubjectFilter::key("u1", 3).require_key().unwrap(),
            ("u1", 3)
        );
        let partial = UserSubjectFilter {
            user_id: None,
            subject_id: Some(3),
        };
        assert!(partial.require_key().is_err());
    }

    #[test]
    fn filters_render_aliased_conditions() {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM subjects s WHERE s.deleted = 0");
        push_filters(
            &mut qb,
            "s",
            &[SubjectFilter::SurveyId(4), SubjectFilter::ParentId(None)],
        );
        assert_eq!(
            qb.sql(),
            "SELECT id FROM subjects s WHERE s.deleted = 0 AND s.survey_id = ? AND s.parent_id IS NULL"
        );
    }
}

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::filter::{push_filters, SubjectFilter};
use super::models::{Subject, SubjectRow};
use super::translation::{self, LanguageId, TranslationTable};
use super::{ensure_live, tombstone, Db, StoreResult, SurveyError};
use crate::models::SubjectInput;

impl Db {
    pub async fn create_subject(
        &self,
        survey_id: i64,
        language: LanguageId,
        input: &SubjectInput,
    ) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        let use_subjects: bool =
            sqlx::query_scalar("SELECT use_subjects FROM surveys WHERE id = ? AND deleted = 0")
                .bind(survey_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| SurveyError::not_found("survey", survey_id))?;
        if !use_subjects {
            return Err(SurveyError::invalid_state(format!(
                "survey {survey_id} does not use subjects"
            )));
        }

        if let Some(parent_id) = input.parent_id {
            let parent_survey: Option<i64> =
                sqlx::query_scalar("SELECT survey_id FROM subjects WHERE id = ? AND deleted = 0")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            match parent_survey {
                None => return Err(SurveyError::not_found("subject", parent_id)),
                Some(other) if other != survey_id => {
                    return Err(SurveyError::validation(format!(
                        "subject {parent_id} belongs to survey {other}"
                    )))
                }
                Some(_) => {}
            }
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO subjects (survey_id, parent_id) VALUES (?, ?) RETURNING id",
        )
        .bind(survey_id)
        .bind(input.parent_id)
        .fetch_one(&mut *tx)
        .await?;

        translation::upsert(&mut tx, TranslationTable::Subject, id, language, &input.name, None)
            .await?;

        tx.commit().await?;

        tracing::info!("subject {id} created in survey={survey_id}");
        Ok(id)
    }

    /// Rename a subject in `language`. The parent is fixed at creation.
    pub async fn update_subject(
        &self,
        id: i64,
        language: LanguageId,
        input: &SubjectInput,
    ) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        ensure_live(&mut *tx, "subjects", "subject", id).await?;
        translation::upsert(&mut tx, TranslationTable::Subject, id, language, &input.name, None)
            .await?;
        tx.commit().await?;

        tracing::info!("subject {id} updated for language={language}");
        Ok(())
    }

    /// Subjects ordered by parent, then by display name.
    pub async fn subjects(
        &self,
        filters: &[SubjectFilter],
        language: LanguageId,
    ) -> StoreResult<Vec<Subject>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT s.id, s.survey_id, s.parent_id FROM subjects s WHERE s.deleted = 0",
        );
        push_filters(&mut qb, "s", filters);

        let rows = qb.build_query_as::<SubjectRow>().fetch_all(&self.pool).await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut names =
            translation::lookup(&self.pool, TranslationTable::Subject, &ids, language).await?;

        let mut subjects: Vec<Subject> = rows
            .into_iter()
            .map(|row| Subject {
                id: row.id,
                survey_id: row.survey_id,
                parent_id: row.parent_id,
                name: names
                    .remove(&row.id)
                    .map(|resolved| resolved.title)
                    .unwrap_or(translation::Translation::Missing),
            })
            .collect();

        subjects.sort_by(|a, b| {
            a.parent_id
                .cmp(&b.parent_id)
                .then_with(|| a.name.text().cmp(b.name.text()))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(subjects)
    }

    pub async fn subject(&self, id: i64, language: LanguageId) -> StoreResult<Subject> {
        self.subjects(&[SubjectFilter::Id(id)], language)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SurveyError::not_found("subject", id))
    }

    /// Refused with `InvalidState` while live child subjects exist.
    pub async fn delete_subject(&self, id: i64) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        delete_subject_tx(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!("subject {id} deleted");
        Ok(())
    }
}

pub(super) async fn delete_subject_tx(conn: &mut SqliteConnection, id: i64) -> StoreResult<()> {
    ensure_live(&mut *conn, "subjects", "subject", id).await?;

    let children: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE parent_id = ? AND deleted = 0")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if children > 0 {
        return Err(SurveyError::invalid_state(format!(
            "subject {id} still has {children} child subjects"
        )));
    }

    sqlx::query("UPDATE subjects SET deleted = ? WHERE id = ?")
        .bind(tombstone())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

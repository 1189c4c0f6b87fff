use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::filter::{push_filters, GroupFilter};
use super::models::{GroupRow, QuestionGroup};
use super::ordering::{self, OrderedTable};
use super::translation::{self, LanguageId, Resolved, TranslationTable};
use super::{ensure_live, question, Db, StoreResult, SurveyError};
use crate::models::ContentInput;

impl Db {
    pub async fn create_question_group(
        &self,
        survey_id: i64,
        language: LanguageId,
        input: &ContentInput,
    ) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        ensure_live(&mut *tx, "surveys", "survey", survey_id).await?;
        let order = ordering::next_order(&mut tx, OrderedTable::QuestionGroup, survey_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO question_groups (survey_id, sort_order) VALUES (?, ?) RETURNING id",
        )
        .bind(survey_id)
        .bind(order)
        .fetch_one(&mut *tx)
        .await?;

        translation::upsert(
            &mut tx,
            TranslationTable::QuestionGroup,
            id,
            language,
            &input.title,
            input.description.as_deref(),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("question group {id} created in survey={survey_id} at position {order}");
        Ok(id)
    }

    /// Update the translation of `id` in `language`, adding it if missing.
    pub async fn update_question_group(
        &self,
        id: i64,
        language: LanguageId,
        input: &ContentInput,
    ) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        ensure_live(&mut *tx, "question_groups", "question group", id).await?;
        translation::upsert(
            &mut tx,
            TranslationTable::QuestionGroup,
            id,
            language,
            &input.title,
            input.description.as_deref(),
        )
        .await?;
        tx.commit().await?;

        tracing::info!("question group {id} updated for language={language}");
        Ok(())
    }

    pub async fn question_groups(
        &self,
        filters: &[GroupFilter],
        language: LanguageId,
    ) -> StoreResult<Vec<QuestionGroup>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT g.id, g.survey_id, g.sort_order FROM question_groups g WHERE g.deleted = 0",
        );
        push_filters(&mut qb, "g", filters);
        qb.push(" ORDER BY g.survey_id, g.sort_order");

        let rows = qb.build_query_as::<GroupRow>().fetch_all(&self.pool).await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut texts =
            translation::lookup(&self.pool, TranslationTable::QuestionGroup, &ids, language).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let Resolved { title, description } =
                    texts.remove(&row.id).unwrap_or_else(Resolved::missing);
                QuestionGroup {
                    id: row.id,
                    survey_id: row.survey_id,
                    order: row.sort_order,
                    title,
                    description,
                }
            })
            .collect())
    }

    pub async fn question_group(&self, id: i64, language: LanguageId) -> StoreResult<QuestionGroup> {
        self.question_groups(&[GroupFilter::Id(id)], language)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SurveyError::not_found("question group", id))
    }

    /// Delete a question group together with its questions and their answers.
    pub async fn delete_question_group(&self, id: i64) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        delete_question_group_tx(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!("question group {id} deleted");
        Ok(())
    }
}

pub(super) async fn delete_question_group_tx(conn: &mut SqliteConnection, id: i64) -> StoreResult<()> {
    ordering::slot(conn, OrderedTable::QuestionGroup, id).await?;

    for question_id in ordering::live_ids(conn, OrderedTable::Question, id).await? {
        question::delete_question_tx(conn, question_id).await?;
    }

    ordering::soft_delete(conn, OrderedTable::QuestionGroup, id).await?;
    Ok(())
}

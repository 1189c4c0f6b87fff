use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::filter::{push_filters, AnswerFilter};
use super::models::{Answer, AnswerRow};
use super::ordering::{self, OrderedTable};
use super::translation::{self, LanguageId, Resolved, TranslationTable};
use super::{ensure_live, Db, StoreResult, SurveyError};
use crate::models::ContentInput;

impl Db {
    pub async fn create_answer(
        &self,
        question_id: i64,
        language: LanguageId,
        input: &ContentInput,
    ) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        let use_answers: bool = sqlx::query_scalar(
            r#"
            SELECT s.use_answers FROM questions q
            JOIN question_groups g ON g.id = q.group_id AND g.deleted = 0
            JOIN surveys s ON s.id = g.survey_id AND s.deleted = 0
            WHERE q.id = ? AND q.deleted = 0
            "#,
        )
        .bind(question_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| SurveyError::not_found("question", question_id))?;
        if !use_answers {
            return Err(SurveyError::invalid_state(format!(
                "question {question_id} belongs to a survey without answers"
            )));
        }

        let order = ordering::next_order(&mut tx, OrderedTable::Answer, question_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO answers (question_id, sort_order) VALUES (?, ?) RETURNING id",
        )
        .bind(question_id)
        .bind(order)
        .fetch_one(&mut *tx)
        .await?;

        translation::upsert(
            &mut tx,
            TranslationTable::Answer,
            id,
            language,
            &input.title,
            input.description.as_deref(),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("answer {id} created in question={question_id} at position {order}");
        Ok(id)
    }

    pub async fn update_answer(
        &self,
        id: i64,
        language: LanguageId,
        input: &ContentInput,
    ) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        ensure_live(&mut *tx, "answers", "answer", id).await?;
        translation::upsert(
            &mut tx,
            TranslationTable::Answer,
            id,
            language,
            &input.title,
            input.description.as_deref(),
        )
        .await?;
        tx.commit().await?;

        tracing::info!("answer {id} updated for language={language}");
        Ok(())
    }

    pub async fn answers(
        &self,
        filters: &[AnswerFilter],
        language: LanguageId,
    ) -> StoreResult<Vec<Answer>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT a.id, a.question_id, a.sort_order FROM answers a WHERE a.deleted = 0",
        );
        push_filters(&mut qb, "a", filters);
        qb.push(" ORDER BY a.question_id, a.sort_order");

        let rows = qb.build_query_as::<AnswerRow>().fetch_all(&self.pool).await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut texts =
            translation::lookup(&self.pool, TranslationTable::Answer, &ids, language).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let Resolved { title, description } =
                    texts.remove(&row.id).unwrap_or_else(Resolved::missing);
                Answer {
                    id: row.id,
                    question_id: row.question_id,
                    order: row.sort_order,
                    title,
                    description,
                }
            })
            .collect())
    }

    pub async fn answer(&self, id: i64, language: LanguageId) -> StoreResult<Answer> {
        self.answers(&[AnswerFilter::Id(id)], language)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SurveyError::not_found("answer", id))
    }

    /// Delete an answer and every result recorded for it.
    pub async fn delete_answer(&self, id: i64) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        delete_answer_tx(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!("answer {id} deleted");
        Ok(())
    }
}

pub(super) async fn delete_answer_tx(conn: &mut SqliteConnection, id: i64) -> StoreResult<()> {
    ordering::soft_delete(conn, OrderedTable::Answer, id).await?;

    sqlx::query("DELETE FROM results WHERE answer_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::filter::{push_filters, QuestionFilter};
use super::models::{Question, QuestionRow, QuestionType};
use super::ordering::{self, OrderedTable};
use super::translation::{self, LanguageId, Resolved, TranslationTable};
use super::{answer, ensure_live, Db, StoreResult, SurveyError};
use crate::models::QuestionInput;

impl Db {
    pub async fn create_question(
        &self,
        group_id: i64,
        language: LanguageId,
        input: &QuestionInput,
    ) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        ensure_live(&mut *tx, "question_groups", "question group", group_id).await?;
        let order = ordering::next_order(&mut tx, OrderedTable::Question, group_id).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO questions (group_id, question_type, sort_order) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(group_id)
        .bind(input.question_type.as_str())
        .bind(order)
        .fetch_one(&mut *tx)
        .await?;

        translation::upsert(
            &mut tx,
            TranslationTable::Question,
            id,
            language,
            &input.title,
            input.description.as_deref(),
        )
        .await?;

        tx.commit().await?;

        tracing::info!("question {id} created in group={group_id} at position {order}");
        Ok(id)
    }

    /// The question type is shared by all languages; title and description
    /// are stored for `language` only.
    pub async fn update_question(
        &self,
        id: i64,
        language: LanguageId,
        input: &QuestionInput,
    ) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        ensure_live(&mut *tx, "questions", "question", id).await?;

        sqlx::query("UPDATE questions SET question_type = ? WHERE id = ?")
            .bind(input.question_type.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        translation::upsert(
            &mut tx,
            TranslationTable::Question,
            id,
            language,
            &input.title,
            input.description.as_deref(),
        )
        .await?;
        tx.commit().await?;

        tracing::info!("question {id} updated for language={language}");
        Ok(())
    }

    pub async fn questions(
        &self,
        filters: &[QuestionFilter],
        language: LanguageId,
    ) -> StoreResult<Vec<Question>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT q.id, q.group_id, q.question_type, q.sort_order FROM questions q WHERE q.deleted = 0",
        );
        push_filters(&mut qb, "q", filters);
        qb.push(" ORDER BY q.group_id, q.sort_order");

        let rows = qb.build_query_as::<QuestionRow>().fetch_all(&self.pool).await?;
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut texts =
            translation::lookup(&self.pool, TranslationTable::Question, &ids, language).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let Resolved { title, description } =
                    texts.remove(&row.id).unwrap_or_else(Resolved::missing);
                Question {
                    id: row.id,
                    group_id: row.group_id,
                    question_type: QuestionType::parse(&row.question_type),
                    order: row.sort_order,
                    title,
                    description,
                }
            })
            .collect())
    }

    pub async fn question(&self, id: i64, language: LanguageId) -> StoreResult<Question> {
        self.questions(&[QuestionFilter::Id(id)], language)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SurveyError::not_found("question", id))
    }

    /// Delete a question together with its answers.
    pub async fn delete_question(&self, id: i64) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        delete_question_tx(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!("question {id} deleted");
        Ok(())
    }
}

pub(super) async fn delete_question_tx(conn: &mut SqliteConnection, id: i64) -> StoreResult<()> {
    ordering::slot(conn, OrderedTable::Question, id).await?;

    for answer_id in ordering::live_ids(conn, OrderedTable::Answer, id).await? {
        answer::delete_answer_tx(conn, answer_id).await?;
    }

    ordering::soft_delete(conn, OrderedTable::Question, id).await?;
    Ok(())
}

use super::models::Survey;
use super::ordering::{self, OrderedTable};
use super::{ensure_live, question_group, tombstone, Db, StoreResult, SurveyError};
use crate::models::SurveyInput;

const SURVEY_COLUMNS: &str = "id, title, description, use_subjects, use_answers";

impl Db {
    pub async fn create_survey(&self, input: &SurveyInput) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO surveys (title, description, use_subjects, use_answers)
            VALUES (?, ?, ?, ?) RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.use_subjects)
        .bind(input.use_answers)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("survey {id} created");
        Ok(id)
    }

    pub async fn update_survey(&self, id: i64, input: &SurveyInput) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let updated = sqlx::query(
            r#"
            UPDATE surveys SET title = ?, description = ?, use_subjects = ?, use_answers = ?
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.use_subjects)
        .bind(input.use_answers)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(SurveyError::not_found("survey", id));
        }

        tracing::info!("survey {id} updated");
        Ok(())
    }

    pub async fn survey(&self, id: i64) -> StoreResult<Survey> {
        sqlx::query_as::<_, Survey>(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = ? AND deleted = 0"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| SurveyError::not_found("survey", id))
    }

    /// Live survey owning the live question `question_id`.
    pub async fn survey_of_question(&self, question_id: i64) -> StoreResult<Survey> {
        sqlx::query_as::<_, Survey>(&format!(
            r#"
            SELECT {SURVEY_COLUMNS} FROM surveys
            WHERE deleted = 0 AND id = (
                SELECT g.survey_id FROM questions q
                JOIN question_groups g ON g.id = q.group_id AND g.deleted = 0
                WHERE q.id = ? AND q.deleted = 0
            )
            "#
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| SurveyError::not_found("question", question_id))
    }

    pub async fn surveys(&self) -> StoreResult<Vec<Survey>> {
        let surveys = sqlx::query_as::<_, Survey>(&format!(
            "SELECT {SURVEY_COLUMNS} FROM surveys WHERE deleted = 0 ORDER BY title, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(surveys)
    }

    /// Delete a survey with all of its content and subjects. Either the whole
    /// tree goes or nothing does.
    pub async fn delete_survey(&self, id: i64) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        ensure_live(&mut *tx, "surveys", "survey", id).await?;

        for group_id in ordering::live_ids(&mut tx, OrderedTable::QuestionGroup, id).await? {
            question_group::delete_question_group_tx(&mut tx, group_id).await?;
        }

        // Subjects of a deleted survey go as a whole, children included
        let deleted_at = tombstone();
        sqlx::query("UPDATE subjects SET deleted = ? WHERE survey_id = ? AND deleted = 0")
            .bind(deleted_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE surveys SET deleted = ? WHERE id = ?")
            .bind(deleted_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("survey {id} deleted");
        Ok(())
    }
}

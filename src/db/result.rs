use std::collections::BTreeSet;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::filter::{ResultFilter, UserSubjectFilter};
use super::models::{ResultRecord, UserSubject, NO_SUBJECT};
use super::{ensure_live, Db, StoreResult, SurveyError};
use crate::models::Submission;

impl Db {
    /// Count one more vote for `(answer_id, subject_id)`. Returns the new count.
    pub async fn record_result(&self, answer_id: i64, subject_id: i64) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let mut conn = self.pool.acquire().await?;
        ensure_live(&mut *conn, "answers", "answer", answer_id).await?;
        ensure_live(&mut *conn, "subjects", "subject", subject_id).await?;
        increment(&mut conn, answer_id, subject_id).await
    }

    pub async fn result(&self, filter: &ResultFilter) -> StoreResult<Option<ResultRecord>> {
        let (answer_id, subject_id) = filter.require_key()?;

        let record = sqlx::query_as::<_, ResultRecord>(
            "SELECT answer_id, subject_id, result_count FROM results WHERE answer_id = ? AND subject_id = ?",
        )
        .bind(answer_id)
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn results(&self, filter: &ResultFilter) -> StoreResult<Vec<ResultRecord>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT answer_id, subject_id, result_count FROM results WHERE 1 = 1");
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY answer_id, subject_id");

        let records = qb.build_query_as::<ResultRecord>().fetch_all(&self.pool).await?;
        Ok(records)
    }

    /// Delete the results matching `filter`. An empty filter is rejected.
    pub async fn delete_results(&self, filter: &ResultFilter) -> StoreResult<u64> {
        if filter.is_empty() {
            return Err(SurveyError::validation("refusing to delete results without a filter"));
        }

        let _guard = self.lock_writes().await;
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM results WHERE 1 = 1");
        filter.push_conditions(&mut qb);
        let deleted = qb.build().execute(&self.pool).await?.rows_affected();

        tracing::info!("{deleted} results deleted");
        Ok(deleted)
    }

    /// Remember that `user_id` answered for `subject_id`. Recording twice is a no-op.
    pub async fn add_user_subject(&self, user_id: &str, subject_id: i64) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut conn = self.pool.acquire().await?;
        ensure_live(&mut *conn, "subjects", "subject", subject_id).await?;
        link_user(&mut conn, user_id, subject_id).await
    }

    pub async fn user_subject(&self, filter: &UserSubjectFilter) -> StoreResult<Option<UserSubject>> {
        let (user_id, subject_id) = filter.require_key()?;

        let record = sqlx::query_as::<_, UserSubject>(
            "SELECT user_id, subject_id FROM user_subjects WHERE user_id = ? AND subject_id = ?",
        )
        .bind(user_id)
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn user_subjects(&self, filter: &UserSubjectFilter) -> StoreResult<Vec<UserSubject>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT user_id, subject_id FROM user_subjects WHERE 1 = 1");
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY user_id, subject_id");

        let records = qb.build_query_as::<UserSubject>().fetch_all(&self.pool).await?;
        Ok(records)
    }

    pub async fn delete_user_subjects(&self, filter: &UserSubjectFilter) -> StoreResult<u64> {
        if filter.is_empty() {
            return Err(SurveyError::validation(
                "refusing to delete user subjects without a filter",
            ));
        }

        let _guard = self.lock_writes().await;
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM user_subjects WHERE 1 = 1");
        filter.push_conditions(&mut qb);
        let deleted = qb.build().execute(&self.pool).await?.rows_affected();

        tracing::info!("{deleted} user subjects deleted");
        Ok(deleted)
    }

    /// Record one completed survey.
    ///
    /// With subjects in use the submission names a live subject of `survey_id`,
    /// otherwise it names none and results go to [`NO_SUBJECT`]. With answers in
    /// use every picked answer is a live answer of the survey and every question
    /// offering answers has at least one of them picked. Nothing is stored when
    /// any of this fails.
    pub async fn submit_survey(&self, survey_id: i64, submission: &Submission) -> StoreResult<()> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        let (use_subjects, use_answers): (bool, bool) = sqlx::query_as(
            "SELECT use_subjects, use_answers FROM surveys WHERE id = ? AND deleted = 0",
        )
        .bind(survey_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| SurveyError::not_found("survey", survey_id))?;

        let subject_id = match (use_subjects, submission.subject_id) {
            (true, Some(subject_id)) => {
                let subject_survey: Option<i64> = sqlx::query_scalar(
                    "SELECT survey_id FROM subjects WHERE id = ? AND deleted = 0",
                )
                .bind(subject_id)
                .fetch_optional(&mut *tx)
                .await?;
                if subject_survey != Some(survey_id) {
                    return Err(SurveyError::not_found("subject", subject_id));
                }
                subject_id
            }
            (true, None) => {
                return Err(SurveyError::validation(format!(
                    "survey {survey_id} needs a subject"
                )))
            }
            (false, None) => NO_SUBJECT,
            (false, Some(_)) => {
                return Err(SurveyError::validation(format!(
                    "survey {survey_id} does not use subjects"
                )))
            }
        };

        if use_answers {
            if submission.answers.is_empty() {
                return Err(SurveyError::validation("a submission needs at least one answer"));
            }

            let picked: BTreeSet<i64> = submission.answers.iter().copied().collect();
            let valid = survey_answer_count(&mut tx, survey_id, &picked).await?;
            if valid != picked.len() as i64 {
                return Err(SurveyError::validation(format!(
                    "{} of the picked answers do not belong to survey {survey_id}",
                    picked.len() as i64 - valid
                )));
            }

            let unanswered = unanswered_question_count(&mut tx, survey_id, &picked).await?;
            if unanswered > 0 {
                return Err(SurveyError::validation(format!(
                    "{unanswered} questions of survey {survey_id} have no picked answer"
                )));
            }

            for answer_id in &submission.answers {
                increment(&mut tx, *answer_id, subject_id).await?;
            }
        } else if !submission.answers.is_empty() {
            return Err(SurveyError::validation(format!(
                "survey {survey_id} does not use answers"
            )));
        }

        if let (Some(user_id), true) = (&submission.user_id, use_subjects) {
            link_user(&mut tx, user_id, subject_id).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "survey {survey_id} submitted for subject={subject_id} with {} answers",
            submission.answers.len()
        );
        Ok(())
    }
}

async fn increment(conn: &mut SqliteConnection, answer_id: i64, subject_id: i64) -> StoreResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO results (answer_id, subject_id, result_count) VALUES (?, ?, 1)
        ON CONFLICT(answer_id, subject_id) DO UPDATE SET result_count = result_count + 1
        RETURNING result_count
        "#,
    )
    .bind(answer_id)
    .bind(subject_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

async fn link_user(conn: &mut SqliteConnection, user_id: &str, subject_id: i64) -> StoreResult<()> {
    sqlx::query("INSERT OR IGNORE INTO user_subjects (user_id, subject_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(subject_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// How many of `answer_ids` are live answers below live questions and groups of `survey_id`.
async fn survey_answer_count(
    conn: &mut SqliteConnection,
    survey_id: i64,
    answer_ids: &BTreeSet<i64>,
) -> StoreResult<i64> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT COUNT(*) FROM answers a
        JOIN questions q ON q.id = a.question_id AND q.deleted = 0
        JOIN question_groups g ON g.id = q.group_id AND g.deleted = 0
        WHERE a.deleted = 0 AND g.survey_id = "#,
    );
    qb.push_bind(survey_id);
    qb.push(" AND a.id IN (");
    let mut separated = qb.separated(", ");
    for id in answer_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let count: i64 = qb.build_query_scalar().fetch_one(conn).await?;
    Ok(count)
}

/// Live questions of `survey_id` that offer live answers but have none of them
/// in `answer_ids`.
async fn unanswered_question_count(
    conn: &mut SqliteConnection,
    survey_id: i64,
    answer_ids: &BTreeSet<i64>,
) -> StoreResult<i64> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT COUNT(*) FROM questions q
        JOIN question_groups g ON g.id = q.group_id AND g.deleted = 0
        WHERE q.deleted = 0
          AND EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.deleted = 0)
          AND g.survey_id = "#,
    );
    qb.push_bind(survey_id);
    qb.push(
        " AND NOT EXISTS (SELECT 1 FROM answers a WHERE a.question_id = q.id AND a.deleted = 0 AND a.id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in answer_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated("))");

    let count: i64 = qb.build_query_scalar().fetch_one(conn).await?;
    Ok(count)
}

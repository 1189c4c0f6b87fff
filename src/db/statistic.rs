use super::translation::{self, LanguageId, Resolved, TranslationTable};
use super::{ensure_live, Db, StoreResult};
use crate::services::statistic::StatisticRepository;
use crate::statistic::{ResultCell, StructureRow, SubjectTotal};

#[derive(sqlx::FromRow)]
struct LayoutRow {
    group_id: i64,
    question_id: i64,
    answer_id: i64,
}

#[derive(sqlx::FromRow)]
struct TotalRow {
    subject_id: i64,
    total: i64,
}

const LIVE_ANSWERS: &str = r#"
    FROM question_groups g
    JOIN questions q ON q.group_id = g.id AND q.deleted = 0
    JOIN answers a ON a.question_id = q.id AND a.deleted = 0
"#;

impl StatisticRepository for Db {
    async fn ensure_survey(&self, survey_id: i64) -> StoreResult<()> {
        ensure_live(&self.pool, "surveys", "survey", survey_id).await
    }

    async fn structure_rows(
        &self,
        survey_id: i64,
        language: LanguageId,
    ) -> StoreResult<Vec<StructureRow>> {
        let layout = sqlx::query_as::<_, LayoutRow>(&format!(
            r#"
            SELECT g.id AS group_id, q.id AS question_id, a.id AS answer_id
            {LIVE_ANSWERS}
            WHERE g.survey_id = ? AND g.deleted = 0
            ORDER BY g.sort_order, q.sort_order, a.sort_order
            "#
        ))
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        let mut group_ids: Vec<i64> = layout.iter().map(|row| row.group_id).collect();
        group_ids.dedup();
        let mut question_ids: Vec<i64> = layout.iter().map(|row| row.question_id).collect();
        question_ids.dedup();
        let answer_ids: Vec<i64> = layout.iter().map(|row| row.answer_id).collect();

        let groups =
            translation::lookup(&self.pool, TranslationTable::QuestionGroup, &group_ids, language)
                .await?;
        let questions =
            translation::lookup(&self.pool, TranslationTable::Question, &question_ids, language)
                .await?;
        let answers =
            translation::lookup(&self.pool, TranslationTable::Answer, &answer_ids, language).await?;

        let title = |texts: &std::collections::HashMap<i64, Resolved>, id: i64| {
            texts
                .get(&id)
                .map(|resolved| resolved.title.clone())
                .unwrap_or_else(|| Resolved::missing().title)
        };

        Ok(layout
            .into_iter()
            .map(|row| StructureRow {
                group_id: row.group_id,
                group_title: title(&groups, row.group_id),
                question_id: row.question_id,
                question_title: title(&questions, row.question_id),
                answer_id: row.answer_id,
                answer_title: title(&answers, row.answer_id),
            })
            .collect())
    }

    async fn subject_totals(
        &self,
        survey_id: i64,
        language: LanguageId,
    ) -> StoreResult<Vec<SubjectTotal>> {
        let rows = sqlx::query_as::<_, TotalRow>(&format!(
            r#"
            SELECT s.id AS subject_id, SUM(r.result_count) AS total
            {LIVE_ANSWERS}
            JOIN results r ON r.answer_id = a.id
            JOIN subjects s ON s.id = r.subject_id AND s.deleted = 0
            WHERE g.survey_id = ? AND g.deleted = 0 AND s.survey_id = g.survey_id
            GROUP BY s.id
            "#
        ))
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|row| row.subject_id).collect();
        let mut names = translation::lookup(&self.pool, TranslationTable::Subject, &ids, language).await?;

        Ok(rows
            .into_iter()
            .map(|row| SubjectTotal {
                subject_id: row.subject_id,
                name: names
                    .remove(&row.subject_id)
                    .unwrap_or_else(Resolved::missing)
                    .title,
                total: row.total,
            })
            .collect())
    }

    async fn result_cells(&self, survey_id: i64) -> StoreResult<Vec<ResultCell>> {
        let cells = sqlx::query_as::<_, ResultCell>(&format!(
            r#"
            SELECT r.subject_id, g.id AS group_id, q.id AS question_id, a.id AS answer_id,
                   r.result_count AS count
            {LIVE_ANSWERS}
            JOIN results r ON r.answer_id = a.id
            WHERE g.survey_id = ? AND g.deleted = 0
            "#
        ))
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cells)
    }
}

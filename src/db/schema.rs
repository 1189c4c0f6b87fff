// Database schema initialization

use color_eyre::Result;
use sqlx::SqlitePool;

const TRANSLATION_TABLES: &[(&str, &str)] = &[
    ("question_group_trans", "question_groups"),
    ("question_trans", "questions"),
    ("answer_trans", "answers"),
    ("subject_trans", "subjects"),
];

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS surveys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT,
            use_subjects INTEGER NOT NULL DEFAULT 1,
            use_answers INTEGER NOT NULL DEFAULT 1,
            deleted INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS question_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            survey_id INTEGER NOT NULL,
            sort_order INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(survey_id) REFERENCES surveys(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            question_type TEXT NOT NULL DEFAULT 'single',
            sort_order INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(group_id) REFERENCES question_groups(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS answers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question_id INTEGER NOT NULL,
            sort_order INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(question_id) REFERENCES questions(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subjects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            survey_id INTEGER NOT NULL,
            parent_id INTEGER,
            deleted INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(survey_id) REFERENCES surveys(id),
            FOREIGN KEY(parent_id) REFERENCES subjects(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (table, parent) in TRANSLATION_TABLES {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                item_id INTEGER NOT NULL,
                language_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                PRIMARY KEY(item_id, language_id),
                FOREIGN KEY(item_id) REFERENCES {parent}(id)
            )
            "#
        ))
        .execute(pool)
        .await?;
    }

    // subject_id 0 holds results of surveys without subjects, so it has no foreign key
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            answer_id INTEGER NOT NULL,
            subject_id INTEGER NOT NULL,
            result_count INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY(answer_id, subject_id),
            FOREIGN KEY(answer_id) REFERENCES answers(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_subjects (
            user_id TEXT NOT NULL,
            subject_id INTEGER NOT NULL,
            PRIMARY KEY(user_id, subject_id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Ordering lookups always filter by scope and live state
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_question_groups_scope ON question_groups(survey_id, deleted, sort_order)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_questions_scope ON questions(group_id, deleted, sort_order)",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_answers_scope ON answers(question_id, deleted, sort_order)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

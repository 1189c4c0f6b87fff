//! Per-language text variants of survey content.
//!
//! Every translated entity has a `<entity>_trans` table keyed by
//! `(item_id, language_id)`. Lookups prefer the requested language and fall
//! back to the lowest-numbered language that has a variant.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};

use super::StoreResult;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct LanguageId(pub i64);

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Title of an item as seen from one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Translation {
    Translated { text: String },
    /// The requested language has no variant; `language` is where `text` came from.
    Fallback { text: String, language: LanguageId },
    Missing,
}

impl Translation {
    pub fn translated(text: impl Into<String>) -> Self {
        Self::Translated { text: text.into() }
    }

    pub fn fallback(text: impl Into<String>, language: LanguageId) -> Self {
        Self::Fallback {
            text: text.into(),
            language,
        }
    }

    /// Raw text without fallback markers.
    pub fn text(&self) -> &str {
        match self {
            Self::Translated { text } | Self::Fallback { text, .. } => text,
            Self::Missing => "",
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, Self::Translated { .. })
    }
}

/// Fallback titles render as `[text]`.
impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Translated { text } => f.write_str(text),
            Self::Fallback { text, .. } => write!(f, "[{text}]"),
            Self::Missing => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationTable {
    QuestionGroup,
    Question,
    Answer,
    Subject,
}

impl TranslationTable {
    pub fn table(self) -> &'static str {
        match self {
            Self::QuestionGroup => "question_group_trans",
            Self::Question => "question_trans",
            Self::Answer => "answer_trans",
            Self::Subject => "subject_trans",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TranslationRow {
    pub item_id: i64,
    pub language_id: LanguageId,
    pub title: String,
    pub description: Option<String>,
}

/// Resolved title and description of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub title: Translation,
    pub description: Option<String>,
}

impl Resolved {
    pub fn missing() -> Self {
        Self {
            title: Translation::Missing,
            description: None,
        }
    }
}

/// Pick one variant per item: the requested language if present, otherwise the
/// lowest language id among the remaining variants.
pub fn resolve(rows: Vec<TranslationRow>, language: LanguageId) -> HashMap<i64, Resolved> {
    let mut best: HashMap<i64, TranslationRow> = HashMap::new();

    for row in rows {
        let replace = match best.get(&row.item_id) {
            None => true,
            Some(current) if current.language_id == language => false,
            Some(_) if row.language_id == language => true,
            Some(current) => row.language_id < current.language_id,
        };
        if replace {
            best.insert(row.item_id, row);
        }
    }

    best.into_iter()
        .map(|(id, row)| {
            let title = if row.language_id == language {
                Translation::translated(row.title)
            } else {
                Translation::fallback(row.title, row.language_id)
            };
            (
                id,
                Resolved {
                    title,
                    description: row.description,
                },
            )
        })
        .collect()
}

/// Load and resolve the variants of `ids` in one query.
pub async fn lookup<'c, E>(
    executor: E,
    table: TranslationTable,
    ids: &[i64],
    language: LanguageId,
) -> StoreResult<HashMap<i64, Resolved>>
where
    E: SqliteExecutor<'c>,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT item_id, language_id, title, description FROM {} WHERE item_id IN (",
        table.table()
    ));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY item_id, language_id");

    let rows = qb
        .build_query_as::<TranslationRow>()
        .fetch_all(executor)
        .await?;

    Ok(resolve(rows, language))
}

/// Insert or replace the variant of `item_id` in `language`.
pub async fn upsert(
    conn: &mut SqliteConnection,
    table: TranslationTable,
    item_id: i64,
    language: LanguageId,
    title: &str,
    description: Option<&str>,
) -> StoreResult<()> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {} (item_id, language_id, title, description)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(item_id, language_id)
        DO UPDATE SET title = excluded.title, description = excluded.description
        "#,
        table.table()
    ))
    .bind(item_id)
    .bind(language)
    .bind(title)
    .bind(description)
    .execute(conn)
    .await?;

    Ok(())
}

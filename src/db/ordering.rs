//! Dense 1..N ordering of items inside a scope.
//!
//! Question groups are ordered per survey, questions per group and answers per
//! question. For the live items of a scope the `sort_order` values are always
//! exactly `{1, ..., N}`; soft-deleted items keep `sort_order = 0`.
//!
//! The functions here run on a connection that the caller has already put into
//! a transaction while holding [`Db::lock_writes`](super::Db), so each
//! read-modify-write below is atomic for its scope.

use serde::Serialize;
use sqlx::{SqliteConnection, SqliteExecutor};

use super::models::Position;
use super::{tombstone, Db, StoreResult, SurveyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderedTable {
    QuestionGroup,
    Question,
    Answer,
}

impl OrderedTable {
    pub fn table(self) -> &'static str {
        match self {
            Self::QuestionGroup => "question_groups",
            Self::Question => "questions",
            Self::Answer => "answers",
        }
    }

    /// Column holding the parent id that forms the scope.
    pub fn scope_column(self) -> &'static str {
        match self {
            Self::QuestionGroup => "survey_id",
            Self::Question => "group_id",
            Self::Answer => "question_id",
        }
    }

    pub fn entity(self) -> &'static str {
        match self {
            Self::QuestionGroup => "question group",
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

/// Scope and current order of a live item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct Slot {
    pub scope_id: i64,
    pub sort_order: i64,
}

pub async fn max_order<'c, E>(executor: E, table: OrderedTable, scope_id: i64) -> StoreResult<i64>
where
    E: SqliteExecutor<'c>,
{
    let max: i64 = sqlx::query_scalar(&format!(
        "SELECT COALESCE(MAX(sort_order), 0) FROM {} WHERE {} = ? AND deleted = 0",
        table.table(),
        table.scope_column()
    ))
    .bind(scope_id)
    .fetch_one(executor)
    .await?;

    Ok(max)
}

/// Order a new item of `scope_id` has to take.
pub async fn next_order(
    conn: &mut SqliteConnection,
    table: OrderedTable,
    scope_id: i64,
) -> StoreResult<i64> {
    Ok(max_order(conn, table, scope_id).await? + 1)
}

/// Live ids of a scope, last item first.
pub async fn live_ids(
    conn: &mut SqliteConnection,
    table: OrderedTable,
    scope_id: i64,
) -> StoreResult<Vec<i64>> {
    let ids = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE {} = ? AND deleted = 0 ORDER BY sort_order DESC",
        table.table(),
        table.scope_column()
    ))
    .bind(scope_id)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

pub async fn slot(conn: &mut SqliteConnection, table: OrderedTable, id: i64) -> StoreResult<Slot> {
    sqlx::query_as::<_, Slot>(&format!(
        "SELECT {} AS scope_id, sort_order FROM {} WHERE id = ? AND deleted = 0",
        table.scope_column(),
        table.table()
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| SurveyError::not_found(table.entity(), id))
}

/// Tombstone `id` and close the gap it leaves behind.
pub async fn soft_delete(
    conn: &mut SqliteConnection,
    table: OrderedTable,
    id: i64,
) -> StoreResult<Slot> {
    let slot = slot(conn, table, id).await?;

    // Tombstone first: an interrupted shift leaves a gap, never a duplicate
    sqlx::query(&format!(
        "UPDATE {} SET deleted = ?, sort_order = 0 WHERE id = ?",
        table.table()
    ))
    .bind(tombstone())
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query(&format!(
        "UPDATE {} SET sort_order = sort_order - 1 WHERE {} = ? AND deleted = 0 AND sort_order > ?",
        table.table(),
        table.scope_column()
    ))
    .bind(slot.scope_id)
    .bind(slot.sort_order)
    .execute(&mut *conn)
    .await?;

    Ok(slot)
}

/// Swap `id` with its predecessor. Returns the new order.
pub async fn move_up(conn: &mut SqliteConnection, table: OrderedTable, id: i64) -> StoreResult<i64> {
    let slot = slot(conn, table, id).await?;

    if slot.sort_order <= 1 {
        return Err(SurveyError::invalid_state(format!(
            "{} {id} is already the first item",
            table.entity()
        )));
    }

    shift_neighbour(conn, table, slot, slot.sort_order - 1, 1).await?;
    set_order(conn, table, id, slot.sort_order - 1).await?;

    Ok(slot.sort_order - 1)
}

/// Swap `id` with its successor. Returns the new order.
pub async fn move_down(
    conn: &mut SqliteConnection,
    table: OrderedTable,
    id: i64,
) -> StoreResult<i64> {
    let slot = slot(conn, table, id).await?;
    let max = max_order(&mut *conn, table, slot.scope_id).await?;

    if slot.sort_order >= max {
        return Err(SurveyError::invalid_state(format!(
            "{} {id} is already the last item",
            table.entity()
        )));
    }

    shift_neighbour(conn, table, slot, slot.sort_order + 1, -1).await?;
    set_order(conn, table, id, slot.sort_order + 1).await?;

    Ok(slot.sort_order + 1)
}

async fn shift_neighbour(
    conn: &mut SqliteConnection,
    table: OrderedTable,
    slot: Slot,
    neighbour_order: i64,
    delta: i64,
) -> StoreResult<()> {
    sqlx::query(&format!(
        "UPDATE {} SET sort_order = sort_order + ? WHERE {} = ? AND deleted = 0 AND sort_order = ?",
        table.table(),
        table.scope_column()
    ))
    .bind(delta)
    .bind(slot.scope_id)
    .bind(neighbour_order)
    .execute(conn)
    .await?;

    Ok(())
}

async fn set_order(
    conn: &mut SqliteConnection,
    table: OrderedTable,
    id: i64,
    order: i64,
) -> StoreResult<()> {
    sqlx::query(&format!("UPDATE {} SET sort_order = ? WHERE id = ?", table.table()))
        .bind(order)
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

impl Db {
    /// Highest live order in a scope, 0 when the scope is empty.
    pub async fn max_order(&self, table: OrderedTable, scope_id: i64) -> StoreResult<i64> {
        max_order(&self.pool, table, scope_id).await
    }

    /// Live items of a scope in order.
    pub async fn positions(&self, table: OrderedTable, scope_id: i64) -> StoreResult<Vec<Position>> {
        let positions = sqlx::query_as::<_, Position>(&format!(
            "SELECT id, sort_order FROM {} WHERE {} = ? AND deleted = 0 ORDER BY sort_order",
            table.table(),
            table.scope_column()
        ))
        .bind(scope_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(positions)
    }

    pub async fn move_up(&self, table: OrderedTable, id: i64) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        let order = move_up(&mut tx, table, id).await?;
        tx.commit().await?;

        tracing::info!("{} {id} moved up to position {order}", table.entity());
        Ok(order)
    }

    pub async fn move_down(&self, table: OrderedTable, id: i64) -> StoreResult<i64> {
        let _guard = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        let order = move_down(&mut tx, table, id).await?;
        tx.commit().await?;

        tracing::info!("{} {id} moved down to position {order}", table.entity());
        Ok(order)
    }
}

//! Read-only transactions for reads that span several statements.

use sqlx::{PgPool, Postgres, Transaction};

use crate::error::PipelineResult;

/// Begin a `REPEATABLE READ, READ ONLY` transaction.
///
/// Every statement run on it sees the same committed state, so a graph
/// loaded across several queries never mixes rows from before and after a
/// concurrent replace. Writes on it fail with SQLSTATE `25006`.
pub async fn begin_snapshot(pool: &PgPool) -> PipelineResult<Transaction<'_, Postgres>> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

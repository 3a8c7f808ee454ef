//! Gain-algorithm resolution with fallback to the default code.

use std::collections::HashMap;

use hyperlabel_core::display_algorithm::{normalize_code, DEFAULT_ALGORITHM_CODE};
use hyperlabel_core::error::CoreError;
use hyperlabel_core::types::DbId;
use hyperlabel_db::models::display_algorithm::DisplayAlgorithm;
use hyperlabel_db::repositories::DisplayAlgorithmRepo;
use sqlx::PgConnection;

use crate::error::PipelineResult;

/// Resolve a gain-algorithm code to its reference row.
///
/// Blank and missing codes resolve to the default. Unknown codes also fall
/// back to the default and are logged, never rejected. Only a store failure
/// is an error, or an `Integrity` error when the default row itself has been
/// deleted.
pub async fn resolve_algorithm(
    conn: &mut PgConnection,
    code: Option<&str>,
) -> PipelineResult<DisplayAlgorithm> {
    let normalized = normalize_code(code);

    if let Some(algorithm) = DisplayAlgorithmRepo::find_by_code(conn, normalized).await? {
        return Ok(algorithm);
    }

    tracing::warn!(
        requested = normalized,
        fallback = DEFAULT_ALGORITHM_CODE,
        "Unknown gain algorithm, using default",
    );

    DisplayAlgorithmRepo::find_by_code(conn, DEFAULT_ALGORITHM_CODE)
        .await?
        .ok_or_else(|| {
            CoreError::Integrity(format!(
                "default display algorithm '{DEFAULT_ALGORITHM_CODE}' is missing"
            ))
            .into()
        })
}

/// Per-call memo of resolved algorithm IDs, keyed by the code as submitted.
///
/// Lives for a single replace so repeated codes in one payload hit the store
/// once. Never shared between calls.
#[derive(Debug, Default)]
pub struct AlgorithmCache {
    resolved: HashMap<Option<String>, DbId>,
}

impl AlgorithmCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `code` to an algorithm ID, consulting the cache first.
    pub async fn resolve_id(
        &mut self,
        conn: &mut PgConnection,
        code: Option<&str>,
    ) -> PipelineResult<DbId> {
        let key = code.map(str::to_owned);
        if let Some(id) = self.resolved.get(&key) {
            tracing::debug!(code = ?code, algorithm_id = id, "Algorithm cache hit");
            return Ok(*id);
        }

        let algorithm = resolve_algorithm(conn, code).await?;
        self.resolved.insert(key, algorithm.id);
        Ok(algorithm.id)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

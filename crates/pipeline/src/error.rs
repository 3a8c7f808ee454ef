use hyperlabel_core::error::CoreError;

/// Error type for pipeline operations.
///
/// Wraps [`CoreError`] for domain errors and [`sqlx::Error`] for store
/// failures. Callers branch on [`PipelineError::kind`] rather than on the
/// variants, so constraint violations surface with the same category as
/// their domain equivalents.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A domain-level error from `hyperlabel_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for pipeline return values.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Caller-facing category of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Integrity,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Validation => "VALIDATION_ERROR",
            Self::Integrity => "INTEGRITY_ERROR",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl PipelineError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: hyperlabel_core::types::DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }

    /// Classify this error.
    ///
    /// - `RowNotFound` maps to `NotFound`.
    /// - A `23505` violation of a `uq_*` constraint maps to `Conflict`.
    /// - Any other class-23 violation maps to `Integrity`.
    /// - Everything else from the store is `Internal`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Core(core) => match core {
                CoreError::NotFound { .. } => ErrorKind::NotFound,
                CoreError::Validation(_) => ErrorKind::Validation,
                CoreError::Integrity(_) => ErrorKind::Integrity,
                CoreError::Internal(_) => ErrorKind::Internal,
            },
            PipelineError::Database(sqlx::Error::RowNotFound) => ErrorKind::NotFound,
            PipelineError::Database(sqlx::Error::Database(db_err)) => {
                classify_database_error(db_err.code().as_deref(), db_err.constraint())
            }
            PipelineError::Database(_) => ErrorKind::Internal,
        }
    }
}

/// Classify a PostgreSQL error by SQLSTATE code and constraint name.
pub fn classify_database_error(code: Option<&str>, constraint: Option<&str>) -> ErrorKind {
    match code {
        Some("23505") if constraint.is_some_and(|c| c.starts_with("uq_")) => ErrorKind::Conflict,
        Some(code) if code.starts_with("23") => ErrorKind::Integrity,
        _ => ErrorKind::Internal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_variants_keep_their_category() {
        assert_eq!(
            PipelineError::not_found("Sample", 3).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            PipelineError::from(CoreError::Validation("bad".into())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            PipelineError::from(CoreError::Integrity("gone".into())).kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            PipelineError::from(CoreError::Internal("boom".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn row_not_found_is_not_found() {
        assert_eq!(
            PipelineError::from(sqlx::Error::RowNotFound).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn pool_timeout_is_internal() {
        assert_eq!(
            PipelineError::from(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn named_unique_violation_is_conflict() {
        assert_eq!(
            classify_database_error(Some("23505"), Some("uq_projects_external_id")),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn unnamed_unique_violation_is_integrity() {
        assert_eq!(
            classify_database_error(Some("23505"), Some("samples_pkey")),
            ErrorKind::Integrity
        );
        assert_eq!(classify_database_error(Some("23505"), None), ErrorKind::Integrity);
    }

    #[test]
    fn other_integrity_codes() {
        // foreign key, check, not null
        for code in ["23503", "23514", "23502"] {
            assert_eq!(
                classify_database_error(Some(code), Some("fk_samples_project")),
                ErrorKind::Integrity
            );
        }
    }

    #[test]
    fn non_integrity_codes_are_internal() {
        assert_eq!(classify_database_error(Some("42P01"), None), ErrorKind::Internal);
        assert_eq!(classify_database_error(None, None), ErrorKind::Internal);
    }
}

//! Project entity model and DTOs.

use hyperlabel_core::project::ProjectPriority;
use hyperlabel_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A project row from the `projects` table.
///
/// `completion_rate`, `available_samples` and `total_samples` are derived and
/// only ever written by the statistics recomputation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub external_id: String,
    pub name: String,
    pub priority: String,
    pub completion_rate: f64,
    pub available_samples: i64,
    pub total_samples: i64,
    pub is_archived: bool,
    pub created_by: Option<DbId>,
    pub updated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// Parsed priority. The column is constrained, so unknown values read as normal.
    pub fn priority(&self) -> ProjectPriority {
        ProjectPriority::from_str(&self.priority).unwrap_or_default()
    }
}

/// DTO for inserting a project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub priority: ProjectPriority,
    pub created_by: Option<DbId>,
}

/// DTO for updating a project. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub priority: Option<ProjectPriority>,
    pub updated_by: Option<DbId>,
}

/// One page of the project listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectPage {
    pub items: Vec<Project>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

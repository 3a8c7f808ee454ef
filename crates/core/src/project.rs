//! Project priorities, request types, and pagination rules.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// Default page size for project listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a listing may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum length of a project name or data-source folder name.
pub const MAX_NAME_LENGTH: u64 = 255;

/// Scheduling priority of a project. Archiving resets it to `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPriority {
    #[default]
    Normal,
    High,
}

impl ProjectPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(CoreError::Validation(format!(
                "Invalid priority '{s}'. Must be one of: normal, high"
            ))),
        }
    }
}

/// Request to create a project from a data-source folder.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProject {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: String,
    #[serde(default)]
    pub priority: ProjectPriority,
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub data_source_folder: String,
}

/// Editable project fields. Derived statistics are deliberately absent.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectChanges {
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: Option<String>,
    pub priority: Option<ProjectPriority>,
}

/// Filters and paging for the project listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    /// Case-insensitive substring match on the project name.
    pub search: Option<String>,
    pub archived: Option<bool>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for ProjectListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            search: None,
            archived: None,
        }
    }
}

impl ProjectListQuery {
    /// Reject out-of-range paging parameters.
    pub fn validate_paging(&self) -> Result<(), CoreError> {
        if self.page < 1 {
            return Err(CoreError::Validation(format!(
                "page must be at least 1, got {}",
                self.page
            )));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(CoreError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    /// Row offset of the requested page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// The search term as a lowercase `LIKE` pattern, if a non-blank term was given.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()))
    }
}

/// Number of pages needed to show `total` rows at `page_size` per page.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn priority_defaults_to_normal() {
        assert_eq!(ProjectPriority::default(), ProjectPriority::Normal);
        let p: NewProject = serde_json::from_value(serde_json::json!({
            "name": "Leaves",
            "data_source_folder": "leaves"
        }))
        .unwrap();
        assert_eq!(p.priority, ProjectPriority::Normal);
    }

    #[test]
    fn priority_parses() {
        assert_eq!(ProjectPriority::from_str("high").unwrap(), ProjectPriority::High);
        assert_matches!(ProjectPriority::from_str("urgent"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_project_name_rejected() {
        let p = NewProject {
            name: String::new(),
            priority: ProjectPriority::Normal,
            data_source_folder: "leaves".into(),
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn paging_bounds_enforced() {
        let mut q = ProjectListQuery::default();
        assert!(q.validate_paging().is_ok());
        q.page = 0;
        assert!(q.validate_paging().is_err());
        q.page = 1;
        q.page_size = MAX_PAGE_SIZE + 1;
        assert!(q.validate_paging().is_err());
    }

    #[test]
    fn offset_from_page() {
        let q = ProjectListQuery {
            page: 3,
            page_size: 20,
            ..Default::default()
        };
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn search_pattern_lowercases_and_ignores_blank() {
        let mut q = ProjectListQuery {
            search: Some(" Corn ".into()),
            ..Default::default()
        };
        assert_eq!(q.search_pattern().as_deref(), Some("%corn%"));
        q.search = Some("   ".into());
        assert!(q.search_pattern().is_none());
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }
}

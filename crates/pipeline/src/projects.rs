//! Project lifecycle: creation from a data-source scan, listing, edits,
//! archiving and deletion.

use hyperlabel_core::datasource::DataSourceRoot;
use hyperlabel_core::error::CoreError;
use hyperlabel_core::project::{total_pages, NewProject, ProjectChanges, ProjectListQuery};
use hyperlabel_core::types::DbId;
use hyperlabel_db::models::project::{CreateProject, Project, ProjectPage, UpdateProject};
use hyperlabel_db::models::sample::CreateSample;
use hyperlabel_db::repositories::{ProjectRepo, SampleRepo};
use sqlx::PgPool;
use validator::Validate;

use crate::error::{PipelineError, PipelineResult};
use crate::statistics;

/// Create a project and import one sample per scanned file group.
///
/// The folder is validated and scanned before the transaction opens; a
/// folder yielding no samples is rejected.
pub async fn create_project(
    pool: &PgPool,
    data_sources: &DataSourceRoot,
    input: &NewProject,
    actor_id: Option<DbId>,
) -> PipelineResult<Project> {
    input.validate().map_err(CoreError::from)?;
    let name = required_name(&input.name)?;

    let folder = data_sources.validate_folder(&input.data_source_folder).await?;
    let scanned = data_sources.scan(&folder).await?;
    if scanned.is_empty() {
        return Err(CoreError::Validation(format!(
            "data source '{}' contains no importable samples",
            input.data_source_folder
        ))
        .into());
    }
    let samples: Vec<CreateSample> = scanned.into_iter().map(CreateSample::from).collect();

    let mut tx = pool.begin().await?;
    let project = ProjectRepo::create(
        &mut *tx,
        &CreateProject {
            name,
            priority: input.priority,
            created_by: actor_id,
        },
    )
    .await?;
    SampleRepo::create_many(&mut *tx, project.id, &samples).await?;
    statistics::recompute(&mut *tx, project.id).await?;
    let created = ProjectRepo::find_by_id_in(&mut *tx, project.id)
        .await?
        .ok_or_else(|| PipelineError::not_found("Project", project.id))?;
    tx.commit().await?;

    tracing::info!(
        project_id = created.id,
        data_source = %input.data_source_folder,
        samples = samples.len(),
        "Project created",
    );

    Ok(created)
}

fn required_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("name must not be blank".to_string()));
    }
    Ok(trimmed.to_string())
}

/// List one page of projects, newest first.
pub async fn list_projects(pool: &PgPool, query: &ProjectListQuery) -> PipelineResult<ProjectPage> {
    query.validate_paging()?;
    let (items, total) = ProjectRepo::list(pool, query).await?;
    Ok(ProjectPage {
        items,
        total,
        page: query.page,
        page_size: query.page_size,
        total_pages: total_pages(total, query.page_size),
    })
}

pub async fn get_project(pool: &PgPool, project_id: DbId) -> PipelineResult<Project> {
    ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| PipelineError::not_found("Project", project_id))
}

/// Rename or re-prioritise a project. Derived statistics are not editable.
pub async fn update_project(
    pool: &PgPool,
    project_id: DbId,
    changes: &ProjectChanges,
    actor_id: Option<DbId>,
) -> PipelineResult<Project> {
    changes.validate().map_err(CoreError::from)?;

    let name = changes.name.as_deref().map(required_name).transpose()?;
    let update = UpdateProject {
        name,
        priority: changes.priority,
        updated_by: actor_id,
    };
    let project = ProjectRepo::update(pool, project_id, &update)
        .await?
        .ok_or_else(|| PipelineError::not_found("Project", project_id))?;

    tracing::info!(project_id, "Project updated");
    Ok(project)
}

/// Archive a project. Archiving also drops its priority back to normal.
pub async fn archive_project(pool: &PgPool, project_id: DbId) -> PipelineResult<Project> {
    set_archived(pool, project_id, true).await
}

pub async fn restore_project(pool: &PgPool, project_id: DbId) -> PipelineResult<Project> {
    set_archived(pool, project_id, false).await
}

async fn set_archived(pool: &PgPool, project_id: DbId, archived: bool) -> PipelineResult<Project> {
    let project = ProjectRepo::set_archived(pool, project_id, archived)
        .await?
        .ok_or_else(|| PipelineError::not_found("Project", project_id))?;
    tracing::info!(project_id, archived, "Project archive flag changed");
    Ok(project)
}

/// Permanently delete a project with all of its samples and annotations.
pub async fn delete_project(pool: &PgPool, project_id: DbId) -> PipelineResult<()> {
    if !ProjectRepo::hard_delete(pool, project_id).await? {
        return Err(PipelineError::not_found("Project", project_id));
    }
    tracing::info!(project_id, "Project deleted");
    Ok(())
}

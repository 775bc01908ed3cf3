//! Projects API endpoints

use api_types::project::{ProjectBalance, ProjectList, ProjectNew};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    CreateProjectCmd, Project, ProjectAnalytics, ProjectKpis, ProjectStatus,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ProjectNew>,
) -> Result<(StatusCode, Json<Project>), ServerError> {
    let actor = user::actor(&user)?;
    let mut cmd = CreateProjectCmd::new(payload.title, payload.requested_amount_minor, actor);
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(beneficiary_id) = payload.beneficiary_id {
        cmd = cmd.beneficiary_id(beneficiary_id);
    }

    let project = state.engine.create_project(cmd).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<ProjectList>,
) -> Result<Json<Vec<Project>>, ServerError> {
    let actor = user::actor(&user)?;
    let status = payload
        .status
        .as_deref()
        .map(ProjectStatus::try_from)
        .transpose()?;

    let projects = state.engine.list_projects(&actor, status).await?;
    Ok(Json(projects))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ServerError> {
    let actor = user::actor(&user)?;
    let project = state.engine.get_project(id, &actor).await?;
    Ok(Json(project))
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ServerError> {
    let actor = user::actor(&user)?;
    let project = state.engine.approve_project(id, &actor).await?;
    Ok(Json(project))
}

pub async fn reject(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ServerError> {
    let actor = user::actor(&user)?;
    let project = state.engine.reject_project(id, &actor).await?;
    Ok(Json(project))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let actor = user::actor(&user)?;
    state.engine.delete_project(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn balance(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectBalance>, ServerError> {
    let actor = user::actor(&user)?;
    let balance_minor = state.engine.project_balance(id, &actor).await?;
    Ok(Json(ProjectBalance { balance_minor }))
}

pub async fn kpis(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectKpis>, ServerError> {
    let actor = user::actor(&user)?;
    let kpis = state.engine.project_kpis(id, &actor).await?;
    Ok(Json(kpis))
}

pub async fn analytics(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectAnalytics>, ServerError> {
    let actor = user::actor(&user)?;
    let analytics = state.engine.project_analytics(id, &actor).await?;
    Ok(Json(analytics))
}

//! Milestones and tranches API endpoints

use api_types::milestone::{EvidenceSubmit, MilestoneList, MilestoneNew, TrancheNew};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    CreateMilestoneCmd, CreateTrancheCmd, Milestone, MilestoneStatus, SubmitEvidenceCmd, Tranche,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<MilestoneNew>,
) -> Result<(StatusCode, Json<Milestone>), ServerError> {
    let actor = user::actor(&user)?;
    let mut cmd = CreateMilestoneCmd::new(payload.project_id, payload.title, actor);
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(target_date) = payload.target_date {
        cmd = cmd.target_date(target_date);
    }
    if let Some(amount) = payload.tranche_amount_minor {
        cmd = cmd.tranche_amount_minor(amount);
    }

    let milestone = state.engine.create_milestone(cmd).await?;
    Ok((StatusCode::CREATED, Json(milestone)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<MilestoneList>,
) -> Result<Json<Vec<Milestone>>, ServerError> {
    let actor = user::actor(&user)?;
    let status = payload
        .status
        .as_deref()
        .map(MilestoneStatus::try_from)
        .transpose()?;

    let milestones = state
        .engine
        .list_milestones(payload.project_id, &actor, status)
        .await?;
    Ok(Json(milestones))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Milestone>, ServerError> {
    let actor = user::actor(&user)?;
    let milestone = state.engine.get_milestone(id, &actor).await?;
    Ok(Json(milestone))
}

pub async fn evidence(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvidenceSubmit>,
) -> Result<Json<Milestone>, ServerError> {
    let actor = user::actor(&user)?;
    let milestone = state
        .engine
        .submit_evidence(SubmitEvidenceCmd::new(id, payload.urls, actor))
        .await?;
    Ok(Json(milestone))
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Milestone>, ServerError> {
    let actor = user::actor(&user)?;
    let milestone = state.engine.approve_milestone(id, &actor).await?;
    Ok(Json(milestone))
}

pub async fn reject(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Milestone>, ServerError> {
    let actor = user::actor(&user)?;
    let milestone = state.engine.reject_milestone(id, &actor).await?;
    Ok(Json(milestone))
}

pub async fn tranche_new(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<TrancheNew>,
) -> Result<(StatusCode, Json<Tranche>), ServerError> {
    let actor = user::actor(&user)?;
    let tranche = state
        .engine
        .create_tranche(CreateTrancheCmd::new(
            project_id,
            payload.milestone_id,
            payload.amount_minor,
            actor,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(tranche)))
}

pub async fn tranche_list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Tranche>>, ServerError> {
    let actor = user::actor(&user)?;
    let tranches = state.engine.list_tranches(project_id, &actor).await?;
    Ok(Json(tranches))
}

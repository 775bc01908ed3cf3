//! Funding requests API endpoints

use api_types::funding_request::{FundingRequestList, FundingRequestNew};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CreateFundingRequestCmd, FundingRequest, RequestStatus};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<FundingRequestNew>,
) -> Result<(StatusCode, Json<FundingRequest>), ServerError> {
    let actor = user::actor(&user)?;
    let mut cmd = CreateFundingRequestCmd::new(
        payload.project_id,
        payload.requested_amount_minor,
        actor,
    );
    if let Some(purpose) = payload.purpose {
        cmd = cmd.purpose(purpose);
    }

    let request = state.engine.create_funding_request(cmd).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<FundingRequestList>,
) -> Result<Json<Vec<FundingRequest>>, ServerError> {
    let actor = user::actor(&user)?;
    let status = payload
        .status
        .as_deref()
        .map(RequestStatus::try_from)
        .transpose()?;

    let requests = state
        .engine
        .list_funding_requests(&actor, status, payload.project_id)
        .await?;
    Ok(Json(requests))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FundingRequest>, ServerError> {
    let actor = user::actor(&user)?;
    let request = state.engine.get_funding_request(id, &actor).await?;
    Ok(Json(request))
}

pub async fn approve(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FundingRequest>, ServerError> {
    let actor = user::actor(&user)?;
    let request = state.engine.approve_funding_request(id, &actor).await?;
    Ok(Json(request))
}

pub async fn reject(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FundingRequest>, ServerError> {
    let actor = user::actor(&user)?;
    let request = state.engine.reject_funding_request(id, &actor).await?;
    Ok(Json(request))
}

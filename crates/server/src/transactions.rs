//! Transactions API endpoints

use api_types::transaction::{TransactionList, TransactionNew, TransactionPage, TransactionUpdate};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{
    RecordTransactionCmd, Transaction, TransactionKind, TransactionListFilter,
    UpdateTransactionCmd,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<Transaction>), ServerError> {
    let actor = user::actor(&user)?;
    let kind = TransactionKind::try_from(payload.kind.as_str())?;
    let occurred_at = payload.occurred_at.unwrap_or_else(Utc::now);

    let mut cmd = RecordTransactionCmd::new(
        payload.project_id,
        kind,
        payload.amount_minor,
        occurred_at,
        actor,
    );
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(proof_url) = payload.proof_url {
        cmd = cmd.proof_url(proof_url);
    }

    let tx = state.engine.record_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn list(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Query(payload): Query<TransactionList>,
) -> Result<Json<TransactionPage<Transaction>>, ServerError> {
    let actor = user::actor(&user)?;
    let limit = payload.limit.unwrap_or(50);
    let kind = payload
        .kind
        .as_deref()
        .map(TransactionKind::try_from)
        .transpose()?;
    let filter = TransactionListFilter {
        kind,
        category: payload.category,
    };

    let (items, next_cursor) = state
        .engine
        .list_transactions_page(
            payload.project_id,
            &actor,
            limit,
            payload.cursor.as_deref(),
            &filter,
        )
        .await?;

    Ok(Json(TransactionPage { items, next_cursor }))
}

pub async fn get(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ServerError> {
    let actor = user::actor(&user)?;
    let tx = state.engine.get_transaction(id, &actor).await?;
    Ok(Json(tx))
}

pub async fn update(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<Transaction>, ServerError> {
    let actor = user::actor(&user)?;
    let mut cmd = UpdateTransactionCmd::new(id, actor);
    if let Some(category) = payload.category {
        cmd = cmd.category(category);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(proof_url) = payload.proof_url {
        cmd = cmd.proof_url(proof_url);
    }

    let tx = state.engine.update_transaction(cmd).await?;
    Ok(Json(tx))
}

pub async fn remove(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let actor = user::actor(&user)?;
    state.engine.delete_transaction(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

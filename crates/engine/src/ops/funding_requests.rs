use chrono::Utc;
use sea_orm::{
    ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, CreateFundingRequestCmd, EngineError, FundingRequest, RequestStatus, ResultEngine, Role,
    funding_requests, projects,
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Files a funding request against a project. Admins and the owning
    /// beneficiary may file; the request starts `pending`.
    pub async fn create_funding_request(
        &self,
        cmd: CreateFundingRequestCmd,
    ) -> ResultEngine<FundingRequest> {
        with_tx!(self, |db_tx| {
            self.require_project_ledger_write(&db_tx, cmd.project_id, &cmd.actor)
                .await?;

            let request = FundingRequest::new(
                cmd.project_id,
                cmd.requested_amount_minor,
                normalize_optional_text(cmd.purpose.as_deref()),
                Utc::now(),
            )?;
            funding_requests::ActiveModel::from(&request)
                .insert(&db_tx)
                .await?;

            Ok(request)
        })
    }

    /// Lists funding requests, newest first, optionally filtered by status
    /// and project. Beneficiaries only see requests on their own projects.
    pub async fn list_funding_requests(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
        project_id: Option<Uuid>,
    ) -> ResultEngine<Vec<FundingRequest>> {
        with_tx!(self, |db_tx| {
            let mut query = funding_requests::Entity::find()
                .order_by_desc(funding_requests::Column::CreatedAt)
                .order_by_desc(funding_requests::Column::Id);

            if actor.role == Role::Beneficiary {
                query = query
                    .join(JoinType::InnerJoin, funding_requests::Relation::Projects.def())
                    .filter(projects::Column::BeneficiaryId.eq(actor.user_id.clone()));
            }
            if let Some(status) = status {
                query = query.filter(funding_requests::Column::Status.eq(status.as_str()));
            }
            if let Some(project_id) = project_id {
                query = query
                    .filter(funding_requests::Column::ProjectId.eq(project_id.to_string()));
            }

            let models: Vec<funding_requests::Model> = query.all(&db_tx).await?;
            models.into_iter().map(FundingRequest::try_from).collect()
        })
    }

    pub async fn get_funding_request(
        &self,
        request_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<FundingRequest> {
        with_tx!(self, |db_tx| {
            let model = self.require_funding_request(&db_tx, request_id).await?;
            let project_id = Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?;
            self.require_project_read(&db_tx, project_id, actor).await?;
            FundingRequest::try_from(model)
        })
    }

    /// Approves a pending funding request and disburses its amount.
    ///
    /// Admin only. The status flip, the disbursement row and the project's
    /// disbursement total all commit in one database transaction; a decided
    /// request cannot be decided again.
    pub async fn approve_funding_request(
        &self,
        request_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<FundingRequest> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = self.require_funding_request(&db_tx, request_id).await?;
            let status = RequestStatus::try_from(model.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidTransition(format!(
                    "funding request already {}",
                    status.as_str()
                )));
            }
            let project_id = Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?;
            let project = self.require_project(&db_tx, project_id).await?;

            let update = funding_requests::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                status: ActiveValue::Set(RequestStatus::Approved.as_str().to_string()),
                reviewed_by: ActiveValue::Set(Some(actor.user_id.clone())),
                reviewed_at: ActiveValue::Set(Some(Utc::now())),
                ..Default::default()
            };
            let updated = update.update(&db_tx).await?;

            self.record_disbursement(
                &db_tx,
                &project,
                model.requested_amount_minor,
                &actor.user_id,
                "funding request",
            )
            .await?;

            FundingRequest::try_from(updated)
        })
    }

    /// Rejects a pending funding request. Admin only.
    pub async fn reject_funding_request(
        &self,
        request_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<FundingRequest> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = self.require_funding_request(&db_tx, request_id).await?;
            let status = RequestStatus::try_from(model.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidTransition(format!(
                    "funding request already {}",
                    status.as_str()
                )));
            }

            let update = funding_requests::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                status: ActiveValue::Set(RequestStatus::Rejected.as_str().to_string()),
                reviewed_by: ActiveValue::Set(Some(actor.user_id.clone())),
                reviewed_at: ActiveValue::Set(Some(Utc::now())),
                ..Default::default()
            };
            let updated = update.update(&db_tx).await?;

            FundingRequest::try_from(updated)
        })
    }
}

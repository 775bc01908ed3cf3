use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, EngineError, ResultEngine, Role, funding_requests, milestones, projects, transactions,
};

use super::Engine;

impl Engine {
    pub(super) fn require_admin(&self, actor: &Actor) -> ResultEngine<()> {
        if !actor.is_admin() {
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(())
    }

    pub(super) async fn require_project(
        &self,
        db: &DatabaseTransaction,
        project_id: Uuid,
    ) -> ResultEngine<projects::Model> {
        projects::Entity::find_by_id(project_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("project not exists".to_string()))
    }

    /// Loads a project the actor may read.
    ///
    /// Admins and donors see every project; beneficiaries only their own.
    pub(super) async fn require_project_read(
        &self,
        db: &DatabaseTransaction,
        project_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<projects::Model> {
        let model = self.require_project(db, project_id).await?;
        if actor.role == Role::Beneficiary && model.beneficiary_id != actor.user_id {
            return Err(EngineError::KeyNotFound("project not exists".to_string()));
        }
        Ok(model)
    }

    /// Loads a project the actor may append ledger rows to.
    ///
    /// Admins may write anywhere; beneficiaries only on projects they own;
    /// donors never.
    pub(super) async fn require_project_ledger_write(
        &self,
        db: &DatabaseTransaction,
        project_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<projects::Model> {
        let model = self.require_project(db, project_id).await?;
        match actor.role {
            Role::Admin => Ok(model),
            Role::Beneficiary if model.beneficiary_id == actor.user_id => Ok(model),
            Role::Beneficiary => Err(EngineError::Forbidden(
                "only the project owner may write to its ledger".to_string(),
            )),
            Role::Donor => Err(EngineError::Forbidden(
                "donors cannot write to project ledgers".to_string(),
            )),
        }
    }

    pub(super) async fn require_milestone(
        &self,
        db: &DatabaseTransaction,
        milestone_id: Uuid,
    ) -> ResultEngine<milestones::Model> {
        milestones::Entity::find_by_id(milestone_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("milestone not exists".to_string()))
    }

    pub(super) async fn require_funding_request(
        &self,
        db: &DatabaseTransaction,
        request_id: Uuid,
    ) -> ResultEngine<funding_requests::Model> {
        funding_requests::Entity::find_by_id(request_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("funding request not exists".to_string()))
    }

    pub(super) async fn require_transaction(
        &self,
        db: &DatabaseTransaction,
        transaction_id: Uuid,
    ) -> ResultEngine<transactions::Model> {
        transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }
}

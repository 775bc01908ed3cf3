use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, CreateProjectCmd, EngineError, Project, ProjectStatus, ResultEngine, Role, projects,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Creates a project in `pending` status.
    ///
    /// Beneficiaries own the projects they create; admins may create on
    /// behalf of a beneficiary by passing `beneficiary_id`. Donors cannot
    /// create projects.
    pub async fn create_project(&self, cmd: CreateProjectCmd) -> ResultEngine<Project> {
        let title = normalize_required_text(&cmd.title, "project title")?;
        let beneficiary_id = match cmd.actor.role {
            Role::Beneficiary => cmd.actor.user_id.clone(),
            Role::Admin => cmd.beneficiary_id.clone().ok_or_else(|| {
                EngineError::InvalidId("beneficiary_id is required".to_string())
            })?,
            Role::Donor => {
                return Err(EngineError::Forbidden(
                    "donors cannot create projects".to_string(),
                ));
            }
        };

        with_tx!(self, |db_tx| {
            let project = Project::new(
                title,
                normalize_optional_text(cmd.description.as_deref()),
                cmd.requested_amount_minor,
                beneficiary_id,
                chrono::Utc::now(),
            )?;
            projects::ActiveModel::from(&project).insert(&db_tx).await?;
            Ok(project)
        })
    }

    pub async fn get_project(&self, project_id: Uuid, actor: &Actor) -> ResultEngine<Project> {
        with_tx!(self, |db_tx| {
            let model = self.require_project_read(&db_tx, project_id, actor).await?;
            Project::try_from(model)
        })
    }

    /// Lists projects, newest first, optionally filtered by status.
    ///
    /// Beneficiaries only see their own projects; admins and donors see all.
    pub async fn list_projects(
        &self,
        actor: &Actor,
        status: Option<ProjectStatus>,
    ) -> ResultEngine<Vec<Project>> {
        with_tx!(self, |db_tx| {
            let mut query = projects::Entity::find()
                .order_by_desc(projects::Column::CreatedAt)
                .order_by_desc(projects::Column::Id);

            if actor.role == Role::Beneficiary {
                query = query.filter(projects::Column::BeneficiaryId.eq(actor.user_id.clone()));
            }
            if let Some(status) = status {
                query = query.filter(projects::Column::Status.eq(status.as_str()));
            }

            let models: Vec<projects::Model> = query.all(&db_tx).await?;
            models.into_iter().map(Project::try_from).collect()
        })
    }

    /// Approves a pending project. Admin only; a project that already left
    /// `pending` cannot be approved.
    pub async fn approve_project(&self, project_id: Uuid, actor: &Actor) -> ResultEngine<Project> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = self.require_project(&db_tx, project_id).await?;
            let status = ProjectStatus::try_from(model.status.as_str())?;
            if status != ProjectStatus::Pending {
                return Err(EngineError::InvalidTransition(format!(
                    "project already {}",
                    status.as_str()
                )));
            }

            let update = projects::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                status: ActiveValue::Set(ProjectStatus::Approved.as_str().to_string()),
                approved_by: ActiveValue::Set(Some(actor.user_id.clone())),
                ..Default::default()
            };
            let updated = update.update(&db_tx).await?;
            Project::try_from(updated)
        })
    }

    /// Rejects a pending project. Admin only.
    pub async fn reject_project(&self, project_id: Uuid, actor: &Actor) -> ResultEngine<Project> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = self.require_project(&db_tx, project_id).await?;
            let status = ProjectStatus::try_from(model.status.as_str())?;
            if status != ProjectStatus::Pending {
                return Err(EngineError::InvalidTransition(format!(
                    "project already {}",
                    status.as_str()
                )));
            }

            let update = projects::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                status: ActiveValue::Set(ProjectStatus::Rejected.as_str().to_string()),
                ..Default::default()
            };
            let updated = update.update(&db_tx).await?;
            Project::try_from(updated)
        })
    }

    /// Current replayed balance of a project.
    pub async fn project_balance(&self, project_id: Uuid, actor: &Actor) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| {
            let model = self.require_project_read(&db_tx, project_id, actor).await?;
            self.replayed_balance(&db_tx, &model).await
        })
    }

    /// Deletes a project row. Admin or owner; child rows are intentionally
    /// not cascaded, the ledger stays auditable.
    pub async fn delete_project(&self, project_id: Uuid, actor: &Actor) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_project(&db_tx, project_id).await?;
            if !actor.is_admin() && model.beneficiary_id != actor.user_id {
                return Err(EngineError::Forbidden(
                    "only the owner or an admin may delete a project".to_string(),
                ));
            }
            projects::Entity::delete_by_id(model.id).exec(&db_tx).await?;
            Ok(())
        })
    }
}

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Actor, CreateMilestoneCmd, CreateTrancheCmd, EngineError, Evidence, Milestone,
    MilestoneStatus, ResultEngine, SubmitEvidenceCmd, Tranche, TrancheStatus, evidence,
    milestones, tranches,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Creates a milestone on a project. Admins and the owning beneficiary
    /// may create; the milestone starts in `not_started`.
    pub async fn create_milestone(&self, cmd: CreateMilestoneCmd) -> ResultEngine<Milestone> {
        let title = normalize_required_text(&cmd.title, "milestone title")?;
        if let Some(amount) = cmd.tranche_amount_minor
            && amount <= 0
        {
            return Err(EngineError::InvalidAmount(
                "tranche_amount_minor must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            self.require_project_ledger_write(&db_tx, cmd.project_id, &cmd.actor)
                .await?;

            let milestone = Milestone::new(
                cmd.project_id,
                title,
                normalize_optional_text(cmd.description.as_deref()),
                cmd.target_date,
                cmd.tranche_amount_minor,
            );
            milestones::ActiveModel::from(&milestone)
                .insert(&db_tx)
                .await?;

            Ok(milestone)
        })
    }

    /// Loads a milestone with its evidence list in submission order.
    pub async fn get_milestone(&self, milestone_id: Uuid, actor: &Actor) -> ResultEngine<Milestone> {
        with_tx!(self, |db_tx| {
            let model = self.require_milestone(&db_tx, milestone_id).await?;
            let project_id = Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?;
            self.require_project_read(&db_tx, project_id, actor).await?;

            let mut milestone = Milestone::try_from(model)?;
            milestone.evidence = self.load_evidence(&db_tx, milestone_id).await?;
            Ok(milestone)
        })
    }

    /// Lists a project's milestones with their evidence, ordered by target
    /// date then title, optionally filtered by status.
    pub async fn list_milestones(
        &self,
        project_id: Uuid,
        actor: &Actor,
        status: Option<MilestoneStatus>,
    ) -> ResultEngine<Vec<Milestone>> {
        with_tx!(self, |db_tx| {
            self.require_project_read(&db_tx, project_id, actor).await?;

            let mut query = milestones::Entity::find()
                .filter(milestones::Column::ProjectId.eq(project_id.to_string()))
                .order_by_asc(milestones::Column::TargetDate)
                .order_by_asc(milestones::Column::Title);
            if let Some(status) = status {
                query = query.filter(milestones::Column::Status.eq(status.as_str()));
            }
            let models: Vec<milestones::Model> = query.all(&db_tx).await?;

            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let mut milestone = Milestone::try_from(model)?;
                milestone.evidence = self.load_evidence(&db_tx, milestone.id).await?;
                out.push(milestone);
            }
            Ok(out)
        })
    }

    /// Replaces a milestone's evidence list wholesale and moves the milestone
    /// to `evidence_submitted`. Decided milestones cannot take new evidence.
    pub async fn submit_evidence(&self, cmd: SubmitEvidenceCmd) -> ResultEngine<Milestone> {
        if cmd.urls.is_empty() {
            return Err(EngineError::InvalidInput(
                "evidence urls must not be empty".to_string(),
            ));
        }
        let urls: Vec<String> = cmd
            .urls
            .iter()
            .map(|url| normalize_required_text(url, "evidence url"))
            .collect::<ResultEngine<_>>()?;

        with_tx!(self, |db_tx| {
            let model = self.require_milestone(&db_tx, cmd.milestone_id).await?;
            let project_id = Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?;
            self.require_project_ledger_write(&db_tx, project_id, &cmd.actor)
                .await?;

            let status = MilestoneStatus::try_from(model.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidTransition(format!(
                    "milestone already {}",
                    status.as_str()
                )));
            }

            evidence::Entity::delete_many()
                .filter(evidence::Column::MilestoneId.eq(model.id.clone()))
                .exec(&db_tx)
                .await?;

            let uploaded_at = Utc::now();
            for (position, url) in urls.iter().enumerate() {
                let row = evidence::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    milestone_id: ActiveValue::Set(model.id.clone()),
                    url: ActiveValue::Set(url.clone()),
                    uploaded_at: ActiveValue::Set(uploaded_at),
                    position: ActiveValue::Set(position as i32),
                };
                row.insert(&db_tx).await?;
            }

            let update = milestones::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                status: ActiveValue::Set(MilestoneStatus::EvidenceSubmitted.as_str().to_string()),
                ..Default::default()
            };
            let updated = update.update(&db_tx).await?;

            let mut milestone = Milestone::try_from(updated)?;
            milestone.evidence = self.load_evidence(&db_tx, cmd.milestone_id).await?;
            Ok(milestone)
        })
    }

    /// Approves a milestone and, when the milestone carries a tranche
    /// amount, releases its pending tranche.
    ///
    /// Admin only. A decided milestone cannot be decided again, which makes
    /// the tranche release a once-only event. A milestone without a tranche
    /// amount is approved without touching any tranche. The status change,
    /// the tranche release, the disbursement row and the project total all
    /// commit in one database transaction.
    pub async fn approve_milestone(
        &self,
        milestone_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<Milestone> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = self.require_milestone(&db_tx, milestone_id).await?;
            let status = MilestoneStatus::try_from(model.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidTransition(format!(
                    "milestone already {}",
                    status.as_str()
                )));
            }
            let project_id = Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?;
            let project = self.require_project(&db_tx, project_id).await?;

            let decided_at = Utc::now();
            let update = milestones::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                status: ActiveValue::Set(MilestoneStatus::Approved.as_str().to_string()),
                decided_by: ActiveValue::Set(Some(actor.user_id.clone())),
                decided_at: ActiveValue::Set(Some(decided_at)),
                ..Default::default()
            };
            let updated = update.update(&db_tx).await?;

            let pending_tranche = if model.tranche_amount_minor.is_some() {
                tranches::Entity::find()
                    .filter(tranches::Column::MilestoneId.eq(model.id.clone()))
                    .filter(tranches::Column::Status.eq(TrancheStatus::Pending.as_str()))
                    .one(&db_tx)
                    .await?
            } else {
                None
            };

            if let Some(tranche_model) = pending_tranche {
                let tranche_update = tranches::ActiveModel {
                    id: ActiveValue::Set(tranche_model.id.clone()),
                    status: ActiveValue::Set(TrancheStatus::Released.as_str().to_string()),
                    released_at: ActiveValue::Set(Some(decided_at)),
                    released_by: ActiveValue::Set(Some(actor.user_id.clone())),
                    ..Default::default()
                };
                tranche_update.update(&db_tx).await?;

                self.record_disbursement(
                    &db_tx,
                    &project,
                    tranche_model.amount_minor,
                    &actor.user_id,
                    "tranche release",
                )
                .await?;
            } else if model.tranche_amount_minor.is_some() {
                tracing::warn!(
                    milestone_id = %milestone_id,
                    project_id = %model.project_id,
                    "milestone carries a tranche amount but no pending tranche"
                );
            }

            let mut milestone = Milestone::try_from(updated)?;
            milestone.evidence = self.load_evidence(&db_tx, milestone_id).await?;
            Ok(milestone)
        })
    }

    /// Rejects a milestone. Admin only; decided milestones stay decided.
    pub async fn reject_milestone(
        &self,
        milestone_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<Milestone> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = self.require_milestone(&db_tx, milestone_id).await?;
            let status = MilestoneStatus::try_from(model.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidTransition(format!(
                    "milestone already {}",
                    status.as_str()
                )));
            }

            let update = milestones::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                status: ActiveValue::Set(MilestoneStatus::Rejected.as_str().to_string()),
                decided_by: ActiveValue::Set(Some(actor.user_id.clone())),
                decided_at: ActiveValue::Set(Some(Utc::now())),
                ..Default::default()
            };
            let updated = update.update(&db_tx).await?;

            let mut milestone = Milestone::try_from(updated)?;
            milestone.evidence = self.load_evidence(&db_tx, milestone_id).await?;
            Ok(milestone)
        })
    }

    /// Attaches a pending tranche to a milestone. Admin only; a milestone
    /// carries at most one tranche, and a decided milestone cannot take one.
    pub async fn create_tranche(&self, cmd: CreateTrancheCmd) -> ResultEngine<Tranche> {
        self.require_admin(&cmd.actor)?;
        with_tx!(self, |db_tx| {
            self.require_project(&db_tx, cmd.project_id).await?;
            let milestone = self.require_milestone(&db_tx, cmd.milestone_id).await?;
            if milestone.project_id != cmd.project_id.to_string() {
                return Err(EngineError::KeyNotFound("milestone not exists".to_string()));
            }
            let status = MilestoneStatus::try_from(milestone.status.as_str())?;
            if status.is_terminal() {
                return Err(EngineError::InvalidTransition(format!(
                    "milestone already {}",
                    status.as_str()
                )));
            }

            let existing = tranches::Entity::find()
                .filter(tranches::Column::MilestoneId.eq(cmd.milestone_id.to_string()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::ExistingKey("tranche".to_string()));
            }

            let tranche = Tranche::new(cmd.project_id, cmd.milestone_id, cmd.amount_minor)?;
            tranches::ActiveModel::from(&tranche).insert(&db_tx).await?;

            Ok(tranche)
        })
    }

    /// Lists a project's tranches.
    pub async fn list_tranches(&self, project_id: Uuid, actor: &Actor) -> ResultEngine<Vec<Tranche>> {
        with_tx!(self, |db_tx| {
            self.require_project_read(&db_tx, project_id, actor).await?;
            let models: Vec<tranches::Model> = tranches::Entity::find()
                .filter(tranches::Column::ProjectId.eq(project_id.to_string()))
                .all(&db_tx)
                .await?;
            models.into_iter().map(Tranche::try_from).collect()
        })
    }

    async fn load_evidence(
        &self,
        db_tx: &DatabaseTransaction,
        milestone_id: Uuid,
    ) -> ResultEngine<Vec<Evidence>> {
        let rows: Vec<evidence::Model> = evidence::Entity::find()
            .filter(evidence::Column::MilestoneId.eq(milestone_id.to_string()))
            .order_by_asc(evidence::Column::Position)
            .all(db_tx)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Evidence {
                url: row.url,
                uploaded_at: row.uploaded_at,
            })
            .collect())
    }
}

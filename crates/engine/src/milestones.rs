//! Milestone primitives and status lifecycle.
//!
//! Milestones move `not_started → pending → evidence_submitted` and end in
//! `approved` or `rejected`. The two decided states are terminal: the engine
//! rejects any further transition, which is also what makes a tranche
//! release a once-only event.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    NotStarted,
    Pending,
    EvidenceSubmitted,
    Approved,
    Rejected,
}

impl MilestoneStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Pending => "pending",
            Self::EvidenceSubmitted => "evidence_submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// A decided milestone cannot transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl TryFrom<&str> for MilestoneStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "not_started" => Ok(Self::NotStarted),
            "pending" => Ok(Self::Pending),
            "evidence_submitted" => Ok(Self::EvidenceSubmitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidKind(format!(
                "invalid milestone status: {other}"
            ))),
        }
    }
}

/// A single evidence item attached to a milestone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
    pub status: MilestoneStatus,
    pub tranche_amount_minor: Option<i64>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub evidence: Vec<Evidence>,
}

impl Milestone {
    pub fn new(
        project_id: Uuid,
        title: String,
        description: Option<String>,
        target_date: Option<DateTime<Utc>>,
        tranche_amount_minor: Option<i64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            title,
            description,
            target_date,
            status: MilestoneStatus::NotStarted,
            tranche_amount_minor,
            decided_by: None,
            decided_at: None,
            evidence: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "milestones")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<DateTimeUtc>,
    pub status: String,
    pub tranche_amount_minor: Option<i64>,
    pub decided_by: Option<String>,
    pub decided_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(has_many = "super::evidence::Entity")]
    Evidence,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::evidence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evidence.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Milestone> for ActiveModel {
    fn from(milestone: &Milestone) -> Self {
        Self {
            id: ActiveValue::Set(milestone.id.to_string()),
            project_id: ActiveValue::Set(milestone.project_id.to_string()),
            title: ActiveValue::Set(milestone.title.clone()),
            description: ActiveValue::Set(milestone.description.clone()),
            target_date: ActiveValue::Set(milestone.target_date),
            status: ActiveValue::Set(milestone.status.as_str().to_string()),
            tranche_amount_minor: ActiveValue::Set(milestone.tranche_amount_minor),
            decided_by: ActiveValue::Set(milestone.decided_by.clone()),
            decided_at: ActiveValue::Set(milestone.decided_at),
        }
    }
}

impl TryFrom<Model> for Milestone {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("milestone not exists".to_string()))?,
            project_id: Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?,
            title: model.title,
            description: model.description,
            target_date: model.target_date,
            status: MilestoneStatus::try_from(model.status.as_str())?,
            tranche_amount_minor: model.tranche_amount_minor,
            decided_by: model.decided_by,
            decided_at: model.decided_at,
            evidence: Vec::new(),
        })
    }
}

//! Project primitives.
//!
//! A `Project` is the aggregation root of the ledger: transactions,
//! milestones, funding requests and tranches all reference it by id.
//! `total_disbursed_minor` is denormalized and written only by the
//! disbursement recorder.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    Completed,
    Suspended,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Suspended => "suspended",
        }
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "suspended" => Ok(Self::Suspended),
            other => Err(EngineError::InvalidKind(format!(
                "invalid project status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requested_amount_minor: i64,
    pub total_disbursed_minor: i64,
    pub status: ProjectStatus,
    pub beneficiary_id: String,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(
        title: String,
        description: Option<String>,
        requested_amount_minor: i64,
        beneficiary_id: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if requested_amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "requested_amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            description,
            requested_amount_minor,
            total_disbursed_minor: 0,
            status: ProjectStatus::Pending,
            beneficiary_id,
            approved_by: None,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub requested_amount_minor: i64,
    pub total_disbursed_minor: i64,
    pub status: String,
    pub beneficiary_id: String,
    pub approved_by: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::milestones::Entity")]
    Milestones,
    #[sea_orm(has_many = "super::tranches::Entity")]
    Tranches,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::milestones::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Milestones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Project> for ActiveModel {
    fn from(project: &Project) -> Self {
        Self {
            id: ActiveValue::Set(project.id.to_string()),
            title: ActiveValue::Set(project.title.clone()),
            description: ActiveValue::Set(project.description.clone()),
            requested_amount_minor: ActiveValue::Set(project.requested_amount_minor),
            total_disbursed_minor: ActiveValue::Set(project.total_disbursed_minor),
            status: ActiveValue::Set(project.status.as_str().to_string()),
            beneficiary_id: ActiveValue::Set(project.beneficiary_id.clone()),
            approved_by: ActiveValue::Set(project.approved_by.clone()),
            created_at: ActiveValue::Set(project.created_at),
        }
    }
}

impl TryFrom<Model> for Project {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("project not exists".to_string()))?,
            title: model.title,
            description: model.description,
            requested_amount_minor: model.requested_amount_minor,
            total_disbursed_minor: model.total_disbursed_minor,
            status: ProjectStatus::try_from(model.status.as_str())?,
            beneficiary_id: model.beneficiary_id,
            approved_by: model.approved_by,
            created_at: model.created_at,
        })
    }
}

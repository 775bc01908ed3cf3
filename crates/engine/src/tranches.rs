//! Tranche primitives.
//!
//! A tranche is a slice of a project's funding earmarked for one milestone.
//! It is created pending and released exactly once, as a side effect of the
//! milestone's approval.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrancheStatus {
    Pending,
    Released,
}

impl TrancheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Released => "released",
        }
    }
}

impl TryFrom<&str> for TrancheStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "released" => Ok(Self::Released),
            other => Err(EngineError::InvalidKind(format!(
                "invalid tranche status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tranche {
    pub id: Uuid,
    pub project_id: Uuid,
    pub milestone_id: Uuid,
    pub amount_minor: i64,
    pub status: TrancheStatus,
    pub released_at: Option<DateTime<Utc>>,
    pub released_by: Option<String>,
}

impl Tranche {
    pub fn new(project_id: Uuid, milestone_id: Uuid, amount_minor: i64) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            milestone_id,
            amount_minor,
            status: TrancheStatus::Pending,
            released_at: None,
            released_by: None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tranches")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub milestone_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub released_at: Option<DateTimeUtc>,
    pub released_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
    #[sea_orm(
        belongs_to = "super::milestones::Entity",
        from = "Column::MilestoneId",
        to = "super::milestones::Column::Id"
    )]
    Milestones,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::milestones::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Milestones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Tranche> for ActiveModel {
    fn from(tranche: &Tranche) -> Self {
        Self {
            id: ActiveValue::Set(tranche.id.to_string()),
            project_id: ActiveValue::Set(tranche.project_id.to_string()),
            milestone_id: ActiveValue::Set(tranche.milestone_id.to_string()),
            amount_minor: ActiveValue::Set(tranche.amount_minor),
            status: ActiveValue::Set(tranche.status.as_str().to_string()),
            released_at: ActiveValue::Set(tranche.released_at),
            released_by: ActiveValue::Set(tranche.released_by.clone()),
        }
    }
}

impl TryFrom<Model> for Tranche {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("tranche not exists".to_string()))?,
            project_id: Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?,
            milestone_id: Uuid::parse_str(&model.milestone_id)
                .map_err(|_| EngineError::InvalidId("invalid milestone id".to_string()))?,
            amount_minor: model.amount_minor,
            status: TrancheStatus::try_from(model.status.as_str())?,
            released_at: model.released_at,
            released_by: model.released_by,
        })
    }
}

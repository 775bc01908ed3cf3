//! Funding request primitives.
//!
//! A funding request asks for an ad-hoc disbursement outside the milestone
//! tranche schedule. Once reviewed it is terminal.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl TryFrom<&str> for RequestStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidKind(format!(
                "invalid funding request status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRequest {
    pub id: Uuid,
    pub project_id: Uuid,
    pub requested_amount_minor: i64,
    pub purpose: Option<String>,
    pub status: RequestStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FundingRequest {
    pub fn new(
        project_id: Uuid,
        requested_amount_minor: i64,
        purpose: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if requested_amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "requested_amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            requested_amount_minor,
            purpose,
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "funding_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub requested_amount_minor: i64,
    pub purpose: Option<String>,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Projects,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FundingRequest> for ActiveModel {
    fn from(request: &FundingRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id.to_string()),
            project_id: ActiveValue::Set(request.project_id.to_string()),
            requested_amount_minor: ActiveValue::Set(request.requested_amount_minor),
            purpose: ActiveValue::Set(request.purpose.clone()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            reviewed_by: ActiveValue::Set(request.reviewed_by.clone()),
            reviewed_at: ActiveValue::Set(request.reviewed_at),
            created_at: ActiveValue::Set(request.created_at),
        }
    }
}

impl TryFrom<Model> for FundingRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("funding request not exists".to_string()))?,
            project_id: Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?,
            requested_amount_minor: model.requested_amount_minor,
            purpose: model.purpose,
            status: RequestStatus::try_from(model.status.as_str())?,
            reviewed_by: model.reviewed_by,
            reviewed_at: model.reviewed_at,
            created_at: model.created_at,
        })
    }
}

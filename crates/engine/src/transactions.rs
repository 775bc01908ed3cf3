//! Transaction primitives.
//!
//! A `Transaction` is an immutable ledger event against a project. The
//! `balance_minor` field is a snapshot of the running project balance at
//! the time the transaction was recorded; it is frozen at creation and
//! never recomputed afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Disbursement,
    Expense,
    Revenue,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disbursement => "disbursement",
            Self::Expense => "expense",
            Self::Revenue => "revenue",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "disbursement" => Ok(Self::Disbursement),
            "expense" => Ok(Self::Expense),
            "revenue" => Ok(Self::Revenue),
            other => Err(EngineError::InvalidKind(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub project_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    /// Running project balance right after this transaction was applied.
    pub balance_minor: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub proof_url: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        balance_minor: i64,
        category: Option<String>,
        description: Option<String>,
        proof_url: Option<String>,
        occurred_at: DateTime<Utc>,
        created_by: String,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            kind,
            amount_minor,
            balance_minor,
            category,
            description,
            proof_url,
            occurred_at,
            created_by,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub balance_minor: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub proof_url: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub created_by: String,
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

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            project_id: ActiveValue::Set(tx.project_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            balance_minor: ActiveValue::Set(tx.balance_minor),
            category: ActiveValue::Set(tx.category.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            proof_url: ActiveValue::Set(tx.proof_url.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            project_id: Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            balance_minor: model.balance_minor,
            category: model.category,
            description: model.description,
            proof_url: model.proof_url,
            occurred_at: model.occurred_at,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}

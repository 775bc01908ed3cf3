//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists. Every command carries the
//! [`Actor`] on whose behalf it runs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Actor, TransactionKind};

/// Create a new project owned by a beneficiary.
#[derive(Clone, Debug)]
pub struct CreateProjectCmd {
    pub title: String,
    pub description: Option<String>,
    pub requested_amount_minor: i64,
    /// Admins may create a project on behalf of a beneficiary; for
    /// beneficiary callers this is ignored and the actor becomes the owner.
    pub beneficiary_id: Option<String>,
    pub actor: Actor,
}

impl CreateProjectCmd {
    #[must_use]
    pub fn new(title: impl Into<String>, requested_amount_minor: i64, actor: Actor) -> Self {
        Self {
            title: title.into(),
            description: None,
            requested_amount_minor,
            beneficiary_id: None,
            actor,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn beneficiary_id(mut self, beneficiary_id: impl Into<String>) -> Self {
        self.beneficiary_id = Some(beneficiary_id.into());
        self
    }
}

/// Record an expense or revenue transaction against a project.
///
/// `disbursement` rows cannot be created through this command; they are
/// emitted internally by the approval engines.
#[derive(Clone, Debug)]
pub struct RecordTransactionCmd {
    pub project_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub description: Option<String>,
    pub proof_url: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub actor: Actor,
}

impl RecordTransactionCmd {
    #[must_use]
    pub fn new(
        project_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        occurred_at: DateTime<Utc>,
        actor: Actor,
    ) -> Self {
        Self {
            project_id,
            kind,
            amount_minor,
            category: None,
            description: None,
            proof_url: None,
            occurred_at,
            actor,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn proof_url(mut self, proof_url: impl Into<String>) -> Self {
        self.proof_url = Some(proof_url.into());
        self
    }
}

/// Update the mutable metadata of an existing transaction.
///
/// Amount, kind and the frozen balance snapshot are immutable.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub category: Option<String>,
    pub description: Option<String>,
    pub proof_url: Option<String>,
    pub actor: Actor,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, actor: Actor) -> Self {
        Self {
            transaction_id,
            category: None,
            description: None,
            proof_url: None,
            actor,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn proof_url(mut self, proof_url: impl Into<String>) -> Self {
        self.proof_url = Some(proof_url.into());
        self
    }
}

/// Create a milestone on a project.
#[derive(Clone, Debug)]
pub struct CreateMilestoneCmd {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
    pub tranche_amount_minor: Option<i64>,
    pub actor: Actor,
}

impl CreateMilestoneCmd {
    #[must_use]
    pub fn new(project_id: Uuid, title: impl Into<String>, actor: Actor) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: None,
            target_date: None,
            tranche_amount_minor: None,
            actor,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target_date(mut self, target_date: DateTime<Utc>) -> Self {
        self.target_date = Some(target_date);
        self
    }

    #[must_use]
    pub fn tranche_amount_minor(mut self, amount_minor: i64) -> Self {
        self.tranche_amount_minor = Some(amount_minor);
        self
    }
}

/// Replace a milestone's evidence list wholesale.
#[derive(Clone, Debug)]
pub struct SubmitEvidenceCmd {
    pub milestone_id: Uuid,
    /// Evidence URLs in submission order; replaces any previous list.
    pub urls: Vec<String>,
    pub actor: Actor,
}

impl SubmitEvidenceCmd {
    #[must_use]
    pub fn new(milestone_id: Uuid, urls: Vec<String>, actor: Actor) -> Self {
        Self {
            milestone_id,
            urls,
            actor,
        }
    }
}

/// Create a funding request for a project.
#[derive(Clone, Debug)]
pub struct CreateFundingRequestCmd {
    pub project_id: Uuid,
    pub requested_amount_minor: i64,
    pub purpose: Option<String>,
    pub actor: Actor,
}

impl CreateFundingRequestCmd {
    #[must_use]
    pub fn new(project_id: Uuid, requested_amount_minor: i64, actor: Actor) -> Self {
        Self {
            project_id,
            requested_amount_minor,
            purpose: None,
            actor,
        }
    }

    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// Attach a pending tranche to a milestone.
#[derive(Clone, Debug)]
pub struct CreateTrancheCmd {
    pub project_id: Uuid,
    pub milestone_id: Uuid,
    pub amount_minor: i64,
    pub actor: Actor,
}

impl CreateTrancheCmd {
    #[must_use]
    pub fn new(project_id: Uuid, milestone_id: Uuid, amount_minor: i64, actor: Actor) -> Self {
        Self {
            project_id,
            milestone_id,
            amount_minor,
            actor,
        }
    }
}

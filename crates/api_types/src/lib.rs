//! Wire types shared between the HTTP server and its clients.
//!
//! Amounts are integer minor units throughout; the server never sees
//! floating-point money. Status strings use `snake_case`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod project {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectNew {
        pub title: String,
        pub description: Option<String>,
        pub requested_amount_minor: i64,
        /// Only honored for admin callers; beneficiaries always own what
        /// they create.
        pub beneficiary_id: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectList {
        pub status: Option<String>,
    }

    /// Current replayed ledger balance of a project.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProjectBalance {
        pub balance_minor: i64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        /// Project id (UUID).
        pub project_id: Uuid,
        /// `expense` or `revenue`; `disbursement` is rejected.
        pub kind: String,
        pub amount_minor: i64,
        pub category: Option<String>,
        pub description: Option<String>,
        pub proof_url: Option<String>,
        /// Defaults to the server clock when omitted.
        pub occurred_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub category: Option<String>,
        pub description: Option<String>,
        pub proof_url: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub project_id: Uuid,
        pub kind: Option<String>,
        pub category: Option<String>,
        pub limit: Option<u64>,
        pub cursor: Option<String>,
    }

    /// One page of transactions; `next_cursor` is `None` on the last page.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionPage<T> {
        pub items: Vec<T>,
        pub next_cursor: Option<String>,
    }
}

pub mod milestone {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MilestoneNew {
        pub project_id: Uuid,
        pub title: String,
        pub description: Option<String>,
        pub target_date: Option<DateTime<Utc>>,
        pub tranche_amount_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MilestoneList {
        pub project_id: Uuid,
        pub status: Option<String>,
    }

    /// Replaces the milestone's evidence list wholesale.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EvidenceSubmit {
        pub urls: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TrancheNew {
        pub milestone_id: Uuid,
        pub amount_minor: i64,
    }
}

pub mod funding_request {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundingRequestNew {
        pub project_id: Uuid,
        pub requested_amount_minor: i64,
        pub purpose: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FundingRequestList {
        pub status: Option<String>,
        pub project_id: Option<Uuid>,
    }
}

//! Disbursement ledger engine.
//!
//! The engine owns all project-scoped financial state: the transaction
//! ledger with its running-balance snapshots, milestone and funding-request
//! approval lifecycles, tranche releases, and the read-side KPI
//! aggregations. Every multi-entity mutation runs inside a single database
//! transaction; `total_disbursed_minor` has exactly one writer, the internal
//! disbursement recorder.

pub use commands::{
    CreateFundingRequestCmd, CreateMilestoneCmd, CreateProjectCmd, CreateTrancheCmd,
    RecordTransactionCmd, SubmitEvidenceCmd, UpdateTransactionCmd,
};
pub use error::EngineError;
pub use funding_requests::{FundingRequest, RequestStatus};
pub use milestones::{Evidence, Milestone, MilestoneStatus};
pub use ops::{
    Engine, EngineBuilder, MonthlyTotals, ProjectAnalytics, ProjectKpis, TransactionListFilter,
};
pub use projects::{Project, ProjectStatus};
pub use tranches::{Tranche, TrancheStatus};
pub use transactions::{Transaction, TransactionKind};
pub use users::{Actor, Role};

mod commands;
mod error;
mod evidence;
mod funding_requests;
pub mod ledger;
mod milestones;
mod ops;
mod projects;
mod tranches;
mod transactions;
mod users;

pub type ResultEngine<T> = Result<T, EngineError>;

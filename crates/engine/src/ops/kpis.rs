use std::collections::BTreeMap;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Actor, MilestoneStatus, ResultEngine, Transaction, TransactionKind, milestones, transactions,
};

use super::{Engine, with_tx};

/// Headline figures for a single project.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectKpis {
    pub total_budget_minor: i64,
    pub total_disbursed_minor: i64,
    pub total_spent_minor: i64,
    pub total_revenue_minor: i64,
    /// `(revenue − spent) / budget × 100`, two decimals, `"0.00"` when the
    /// budget is not positive.
    pub margin: String,
    pub completed_milestones: u64,
    pub total_milestones: u64,
    /// Approved milestones over total, as a percentage. 0 when there are no
    /// milestones.
    pub progress: f64,
}

/// Expense and revenue totals for one calendar month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    pub expense_minor: i64,
    pub revenue_minor: i64,
}

/// Monthly aggregation plus the most recent ledger activity.
#[derive(Clone, Debug, Serialize)]
pub struct ProjectAnalytics {
    /// Keyed `YYYY-MM`; the map ordering makes the output deterministic.
    pub monthly: BTreeMap<String, MonthlyTotals>,
    pub recent_transactions: Vec<Transaction>,
}

impl Engine {
    /// Aggregates a project's headline KPIs from its ledger and milestones.
    pub async fn project_kpis(&self, project_id: Uuid, actor: &Actor) -> ResultEngine<ProjectKpis> {
        with_tx!(self, |db_tx| {
            let project = self.require_project_read(&db_tx, project_id, actor).await?;

            let rows: Vec<transactions::Model> = transactions::Entity::find()
                .filter(transactions::Column::ProjectId.eq(project_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut total_spent_minor = 0;
            let mut total_revenue_minor = 0;
            for row in &rows {
                match TransactionKind::try_from(row.kind.as_str())? {
                    TransactionKind::Expense => total_spent_minor += row.amount_minor,
                    TransactionKind::Revenue => total_revenue_minor += row.amount_minor,
                    TransactionKind::Disbursement => {}
                }
            }

            let margin = if project.requested_amount_minor > 0 {
                let ratio = (total_revenue_minor - total_spent_minor) as f64
                    / project.requested_amount_minor as f64
                    * 100.0;
                format!("{ratio:.2}")
            } else {
                "0.00".to_string()
            };

            let milestone_rows: Vec<milestones::Model> = milestones::Entity::find()
                .filter(milestones::Column::ProjectId.eq(project_id.to_string()))
                .all(&db_tx)
                .await?;
            let total_milestones = milestone_rows.len() as u64;
            let completed_milestones = milestone_rows
                .iter()
                .filter(|m| m.status == MilestoneStatus::Approved.as_str())
                .count() as u64;
            let progress = if total_milestones > 0 {
                completed_milestones as f64 / total_milestones as f64 * 100.0
            } else {
                0.0
            };

            Ok(ProjectKpis {
                total_budget_minor: project.requested_amount_minor,
                total_disbursed_minor: project.total_disbursed_minor,
                total_spent_minor,
                total_revenue_minor,
                margin,
                completed_milestones,
                total_milestones,
                progress,
            })
        })
    }

    /// Monthly expense/revenue totals plus the ten most recent transactions.
    pub async fn project_analytics(
        &self,
        project_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<ProjectAnalytics> {
        with_tx!(self, |db_tx| {
            self.require_project_read(&db_tx, project_id, actor).await?;

            let rows: Vec<transactions::Model> = transactions::Entity::find()
                .filter(transactions::Column::ProjectId.eq(project_id.to_string()))
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .all(&db_tx)
                .await?;

            let mut monthly: BTreeMap<String, MonthlyTotals> = BTreeMap::new();
            for row in &rows {
                let bucket = row.occurred_at.format("%Y-%m").to_string();
                let entry = monthly.entry(bucket).or_default();
                match TransactionKind::try_from(row.kind.as_str())? {
                    TransactionKind::Expense => entry.expense_minor += row.amount_minor,
                    TransactionKind::Revenue => entry.revenue_minor += row.amount_minor,
                    TransactionKind::Disbursement => {}
                }
            }

            let mut recent_transactions = Vec::with_capacity(10);
            for row in rows.into_iter().take(10) {
                recent_transactions.push(Transaction::try_from(row)?);
            }

            Ok(ProjectAnalytics {
                monthly,
                recent_transactions,
            })
        })
    }
}

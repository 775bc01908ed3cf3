use base64::Engine as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Actor, EngineError, RecordTransactionCmd, ResultEngine, Transaction, TransactionKind,
    UpdateTransactionCmd, ledger, projects, transactions,
};

use super::{Engine, normalize_optional_text, with_tx};

/// Filters for listing a project's transactions.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    /// If present, only transactions of this kind are returned.
    pub kind: Option<TransactionKind>,
    /// If present, only transactions with this exact category are returned.
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    occurred_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

impl Engine {
    /// Records an `expense` or `revenue` transaction against a project.
    ///
    /// The running balance is replayed from the project's disbursement total
    /// over the prior expense/revenue history in `(occurred_at ASC, id ASC)`
    /// order; the new row's signed effect is applied on top and the result
    /// is frozen into `balance_minor`. Snapshots are never recomputed.
    ///
    /// `disbursement` rows cannot be created here: they are emitted only by
    /// the milestone and funding-request approval paths.
    pub async fn record_transaction(&self, cmd: RecordTransactionCmd) -> ResultEngine<Transaction> {
        if cmd.kind == TransactionKind::Disbursement {
            return Err(EngineError::InvalidKind(
                "disbursement transactions are system-generated".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let project = self
                .require_project_ledger_write(&db_tx, cmd.project_id, &cmd.actor)
                .await?;

            let balance_before = self.replayed_balance(&db_tx, &project).await?;
            let balance_minor = balance_before + ledger::signed_effect(cmd.kind, cmd.amount_minor);

            let tx = Transaction::new(
                cmd.project_id,
                cmd.kind,
                cmd.amount_minor,
                balance_minor,
                normalize_optional_text(cmd.category.as_deref()),
                normalize_optional_text(cmd.description.as_deref()),
                normalize_optional_text(cmd.proof_url.as_deref()),
                cmd.occurred_at,
                cmd.actor.user_id.clone(),
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            tracing::debug!(
                project_id = %cmd.project_id,
                kind = cmd.kind.as_str(),
                amount_minor = cmd.amount_minor,
                balance_minor,
                "transaction recorded"
            );

            Ok(tx)
        })
    }

    /// Inserts a disbursement row and bumps the project's denormalized
    /// disbursement total, inside the caller's transaction.
    ///
    /// This is the only writer of `total_disbursed_minor` and the only
    /// producer of `disbursement` ledger rows.
    pub(super) async fn record_disbursement(
        &self,
        db_tx: &DatabaseTransaction,
        project: &projects::Model,
        amount_minor: i64,
        created_by: &str,
        category: &str,
    ) -> ResultEngine<Transaction> {
        let new_total = project.total_disbursed_minor + amount_minor;
        let balance_minor = {
            // The new total is the opening balance, so the fresh row's
            // snapshot already carries its own effect.
            let history = self.expense_revenue_history(db_tx, &project.id).await?;
            ledger::replay(new_total, history)
        };

        let tx = Transaction::new(
            Uuid::parse_str(&project.id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?,
            TransactionKind::Disbursement,
            amount_minor,
            balance_minor,
            Some(category.to_string()),
            None,
            None,
            Utc::now(),
            created_by.to_string(),
        )?;
        transactions::ActiveModel::from(&tx).insert(db_tx).await?;

        let project_update = projects::ActiveModel {
            id: ActiveValue::Set(project.id.clone()),
            total_disbursed_minor: ActiveValue::Set(new_total),
            ..Default::default()
        };
        project_update.update(db_tx).await?;

        tracing::info!(
            project_id = %project.id,
            amount_minor,
            total_disbursed_minor = new_total,
            category,
            "disbursement recorded"
        );

        Ok(tx)
    }

    /// Current balance of a project: disbursement total plus the replayed
    /// expense/revenue history.
    pub(super) async fn replayed_balance(
        &self,
        db_tx: &DatabaseTransaction,
        project: &projects::Model,
    ) -> ResultEngine<i64> {
        let history = self.expense_revenue_history(db_tx, &project.id).await?;
        Ok(ledger::replay(project.total_disbursed_minor, history))
    }

    /// Loads `(kind, amount_minor)` pairs for every non-disbursement row of a
    /// project, ordered `(occurred_at ASC, id ASC)`.
    ///
    /// Disbursement rows are excluded: their effect is already carried by the
    /// opening balance (`total_disbursed_minor`).
    async fn expense_revenue_history(
        &self,
        db_tx: &DatabaseTransaction,
        project_id: &str,
    ) -> ResultEngine<Vec<(TransactionKind, i64)>> {
        let rows: Vec<transactions::Model> = transactions::Entity::find()
            .filter(transactions::Column::ProjectId.eq(project_id.to_string()))
            .filter(transactions::Column::Kind.ne(TransactionKind::Disbursement.as_str()))
            .order_by_asc(transactions::Column::OccurredAt)
            .order_by_asc(transactions::Column::Id)
            .all(db_tx)
            .await?;

        rows.into_iter()
            .map(|row| {
                let kind = TransactionKind::try_from(row.kind.as_str())?;
                Ok((kind, row.amount_minor))
            })
            .collect()
    }

    /// Lists a project's transactions, newest first, with cursor-based
    /// pagination by `(occurred_at DESC, id DESC)`.
    pub async fn list_transactions_page(
        &self,
        project_id: Uuid,
        actor: &Actor,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        with_tx!(self, |db_tx| {
            self.require_project_read(&db_tx, project_id, actor).await?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::ProjectId.eq(project_id.to_string()))
                .order_by_desc(transactions::Column::OccurredAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(kind) = filter.kind {
                query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
            }
            if let Some(category) = &filter.category {
                query = query.filter(transactions::Column::Category.eq(category.clone()));
            }

            if let Some(cursor) = cursor {
                let cursor = TransactionsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::OccurredAt.lt(cursor.occurred_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::OccurredAt.eq(cursor.occurred_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<Transaction> = Vec::with_capacity(rows.len().min(limit as usize));
            for row in rows.into_iter().take(limit as usize) {
                out.push(Transaction::try_from(row)?);
            }

            let next_cursor = out.last().map(|tx| TransactionsCursor {
                occurred_at: tx.occurred_at,
                transaction_id: tx.id.to_string(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }

    pub async fn get_transaction(
        &self,
        transaction_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self.require_transaction(&db_tx, transaction_id).await?;
            let project_id = Uuid::parse_str(&model.project_id)
                .map_err(|_| EngineError::InvalidId("invalid project id".to_string()))?;
            self.require_project_read(&db_tx, project_id, actor).await?;
            Transaction::try_from(model)
        })
    }

    /// Updates a transaction's metadata. Amount, kind and the frozen balance
    /// snapshot are immutable; only the creator or an admin may edit.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self.require_transaction(&db_tx, cmd.transaction_id).await?;
            if !cmd.actor.is_admin() && model.created_by != cmd.actor.user_id {
                return Err(EngineError::Forbidden(
                    "only the creator or an admin may edit a transaction".to_string(),
                ));
            }

            let mut update = transactions::ActiveModel {
                id: ActiveValue::Set(model.id.clone()),
                ..Default::default()
            };
            if cmd.category.is_some() {
                update.category = ActiveValue::Set(normalize_optional_text(cmd.category.as_deref()));
            }
            if cmd.description.is_some() {
                update.description =
                    ActiveValue::Set(normalize_optional_text(cmd.description.as_deref()));
            }
            if cmd.proof_url.is_some() {
                update.proof_url =
                    ActiveValue::Set(normalize_optional_text(cmd.proof_url.as_deref()));
            }
            let updated = update.update(&db_tx).await?;

            Transaction::try_from(updated)
        })
    }

    /// Deletes a transaction row. Admin only; disbursement rows are
    /// protected because removing one would desynchronize the project's
    /// disbursement total.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        actor: &Actor,
    ) -> ResultEngine<()> {
        self.require_admin(actor)?;
        with_tx!(self, |db_tx| {
            let model = self.require_transaction(&db_tx, transaction_id).await?;
            if model.kind == TransactionKind::Disbursement.as_str() {
                return Err(EngineError::InvalidKind(
                    "disbursement transactions cannot be deleted".to_string(),
                ));
            }
            transactions::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}

//! Running-balance arithmetic for a project's ledger.
//!
//! A project's balance is its disbursement total plus the signed effect of
//! every transaction recorded against it. Replay is always chronological
//! ascending with the transaction id as tie-break, so the result is
//! deterministic even when two transactions share a date.

use crate::TransactionKind;

/// Signed effect of a transaction on the running balance.
///
/// Expenses subtract their amount; revenue and disbursements add it.
pub fn signed_effect(kind: TransactionKind, amount_minor: i64) -> i64 {
    match kind {
        TransactionKind::Expense => -amount_minor,
        TransactionKind::Revenue | TransactionKind::Disbursement => amount_minor,
    }
}

/// Replays a transaction history over an opening balance.
///
/// Callers must feed the history ordered `(occurred_at ASC, id ASC)`.
pub fn replay<I>(opening_minor: i64, history: I) -> i64
where
    I: IntoIterator<Item = (TransactionKind, i64)>,
{
    history
        .into_iter()
        .fold(opening_minor, |balance, (kind, amount_minor)| {
            balance + signed_effect(kind, amount_minor)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_subtracts_revenue_and_disbursement_add() {
        assert_eq!(signed_effect(TransactionKind::Expense, 100), -100);
        assert_eq!(signed_effect(TransactionKind::Revenue, 100), 100);
        assert_eq!(signed_effect(TransactionKind::Disbursement, 100), 100);
    }

    #[test]
    fn replay_folds_in_order() {
        let history = vec![
            (TransactionKind::Expense, 100),
            (TransactionKind::Revenue, 50),
        ];
        assert_eq!(replay(1000, history), 950);
    }

    #[test]
    fn replay_of_empty_history_is_opening_balance() {
        assert_eq!(replay(42, Vec::new()), 42);
    }
}

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    Actor, CreateFundingRequestCmd, CreateMilestoneCmd, CreateProjectCmd, CreateTrancheCmd,
    Engine, EngineError, MilestoneStatus, RecordTransactionCmd, Role, SubmitEvidenceCmd,
    TrancheStatus, TransactionKind, TransactionListFilter,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, name, role, token) in [
        ("admin-1", "Ada", "admin", "tok-admin"),
        ("bene-1", "Bruno", "beneficiary", "tok-bruno"),
        ("bene-2", "Carla", "beneficiary", "tok-carla"),
        ("donor-1", "Dana", "donor", "tok-dana"),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, name, role, token) VALUES (?, ?, ?, ?)",
            vec![id.into(), name.into(), role.into(), token.into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

fn owner() -> Actor {
    Actor::new("bene-1", Role::Beneficiary)
}

async fn seed_project(engine: &Engine, requested_minor: i64) -> Uuid {
    let project = engine
        .create_project(CreateProjectCmd::new("Well drilling", requested_minor, owner()))
        .await
        .unwrap();
    project.id
}

/// Approves a funding request for `amount` so the project carries a known
/// disbursement total.
async fn disburse(engine: &Engine, project_id: Uuid, amount: i64) {
    let request = engine
        .create_funding_request(CreateFundingRequestCmd::new(project_id, amount, owner()))
        .await
        .unwrap();
    engine
        .approve_funding_request(request.id, &admin())
        .await
        .unwrap();
}

#[tokio::test]
async fn balance_snapshots_replay_ascending_history() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 100_000).await;
    disburse(&engine, project_id, 500).await;

    let t0 = Utc::now() - Duration::days(3);
    engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Expense,
            100,
            t0,
            owner(),
        ))
        .await
        .unwrap();
    engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Revenue,
            50,
            t0 + Duration::days(1),
            owner(),
        ))
        .await
        .unwrap();

    // 500 - 100 + 50 - 25
    let tx = engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Expense,
            25,
            t0 + Duration::days(2),
            owner(),
        ))
        .await
        .unwrap();
    assert_eq!(tx.balance_minor, 425);

    // Earlier snapshots are frozen, not recomputed.
    let (items, _) = engine
        .list_transactions_page(project_id, &owner(), 10, None, &TransactionListFilter::default())
        .await
        .unwrap();
    let first_expense = items
        .iter()
        .find(|t| t.amount_minor == 100)
        .unwrap();
    assert_eq!(first_expense.balance_minor, 400);
}

#[tokio::test]
async fn approving_milestone_releases_tranche_exactly_once() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 100_000).await;

    let milestone = engine
        .create_milestone(
            CreateMilestoneCmd::new(project_id, "Phase 1", owner()).tranche_amount_minor(2_000),
        )
        .await
        .unwrap();
    engine
        .create_tranche(CreateTrancheCmd::new(project_id, milestone.id, 2_000, admin()))
        .await
        .unwrap();

    let approved = engine.approve_milestone(milestone.id, &admin()).await.unwrap();
    assert_eq!(approved.status, MilestoneStatus::Approved);
    assert_eq!(approved.decided_by.as_deref(), Some("admin-1"));

    let project = engine.get_project(project_id, &owner()).await.unwrap();
    assert_eq!(project.total_disbursed_minor, 2_000);

    let tranches = engine.list_tranches(project_id, &owner()).await.unwrap();
    assert_eq!(tranches.len(), 1);
    assert_eq!(tranches[0].status, TrancheStatus::Released);
    assert!(tranches[0].released_at.is_some());

    // A decided milestone cannot be decided again, so no double release.
    let err = engine.approve_milestone(milestone.id, &admin()).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
    let project = engine.get_project(project_id, &owner()).await.unwrap();
    assert_eq!(project.total_disbursed_minor, 2_000);
}

#[tokio::test]
async fn milestone_without_tranche_amount_releases_nothing() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 100_000).await;

    let milestone = engine
        .create_milestone(CreateMilestoneCmd::new(project_id, "Phase 1", owner()))
        .await
        .unwrap();
    engine
        .create_tranche(CreateTrancheCmd::new(project_id, milestone.id, 3_000, admin()))
        .await
        .unwrap();

    let approved = engine.approve_milestone(milestone.id, &admin()).await.unwrap();
    assert_eq!(approved.status, MilestoneStatus::Approved);

    // Release is gated on the milestone's tranche amount.
    let project = engine.get_project(project_id, &owner()).await.unwrap();
    assert_eq!(project.total_disbursed_minor, 0);
    let tranches = engine.list_tranches(project_id, &owner()).await.unwrap();
    assert_eq!(tranches[0].status, TrancheStatus::Pending);
}

#[tokio::test]
async fn disbursements_may_exceed_requested_amount() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 1_000).await;

    disburse(&engine, project_id, 800).await;
    disburse(&engine, project_id, 800).await;

    let project = engine.get_project(project_id, &owner()).await.unwrap();
    assert_eq!(project.total_disbursed_minor, 1_600);
}

#[tokio::test]
async fn funding_request_decisions_are_terminal() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let request = engine
        .create_funding_request(CreateFundingRequestCmd::new(project_id, 1_000, owner()))
        .await
        .unwrap();
    engine.reject_funding_request(request.id, &admin()).await.unwrap();

    let err = engine
        .approve_funding_request(request.id, &admin())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    let project = engine.get_project(project_id, &owner()).await.unwrap();
    assert_eq!(project.total_disbursed_minor, 0);
}

#[tokio::test]
async fn kpis_render_margin_and_progress() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let now = Utc::now();
    engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Revenue,
            3_000,
            now - Duration::days(2),
            owner(),
        ))
        .await
        .unwrap();
    engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Expense,
            1_000,
            now - Duration::days(1),
            owner(),
        ))
        .await
        .unwrap();

    for title in ["M1", "M2", "M3", "M4"] {
        engine
            .create_milestone(CreateMilestoneCmd::new(project_id, title, owner()))
            .await
            .unwrap();
    }
    let milestones = engine
        .list_milestones(project_id, &owner(), None)
        .await
        .unwrap();
    engine
        .approve_milestone(milestones[0].id, &admin())
        .await
        .unwrap();

    let kpis = engine.project_kpis(project_id, &owner()).await.unwrap();
    assert_eq!(kpis.total_budget_minor, 10_000);
    assert_eq!(kpis.total_spent_minor, 1_000);
    assert_eq!(kpis.total_revenue_minor, 3_000);
    assert_eq!(kpis.margin, "20.00");
    assert_eq!(kpis.completed_milestones, 1);
    assert_eq!(kpis.total_milestones, 4);
    assert!((kpis.progress - 25.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn analytics_buckets_by_month_and_caps_recent() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let now = Utc::now();
    for i in 0..12 {
        engine
            .record_transaction(RecordTransactionCmd::new(
                project_id,
                if i % 2 == 0 {
                    TransactionKind::Expense
                } else {
                    TransactionKind::Revenue
                },
                100 + i,
                now - Duration::days(i),
                owner(),
            ))
            .await
            .unwrap();
    }

    let analytics = engine.project_analytics(project_id, &owner()).await.unwrap();
    assert_eq!(analytics.recent_transactions.len(), 10);
    let bucketed: i64 = analytics
        .monthly
        .values()
        .map(|m| m.expense_minor + m.revenue_minor)
        .sum();
    assert_eq!(bucketed, (0..12).map(|i| 100 + i).sum::<i64>());
}

#[tokio::test]
async fn only_the_owner_writes_to_a_project_ledger() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let other = Actor::new("bene-2", Role::Beneficiary);
    let err = engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Expense,
            100,
            Utc::now(),
            other,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let donor = Actor::new("donor-1", Role::Donor);
    let err = engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Revenue,
            100,
            Utc::now(),
            donor,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn client_supplied_disbursement_kind_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let err = engine
        .record_transaction(RecordTransactionCmd::new(
            project_id,
            TransactionKind::Disbursement,
            100,
            Utc::now(),
            owner(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidKind(_)));
}

#[tokio::test]
async fn evidence_submission_replaces_the_whole_list() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;
    let milestone = engine
        .create_milestone(CreateMilestoneCmd::new(project_id, "Phase 1", owner()))
        .await
        .unwrap();

    let after_first = engine
        .submit_evidence(SubmitEvidenceCmd::new(
            milestone.id,
            vec!["https://proof/a".to_string(), "https://proof/b".to_string()],
            owner(),
        ))
        .await
        .unwrap();
    assert_eq!(after_first.status, MilestoneStatus::EvidenceSubmitted);
    assert_eq!(after_first.evidence.len(), 2);

    let after_second = engine
        .submit_evidence(SubmitEvidenceCmd::new(
            milestone.id,
            vec!["https://proof/c".to_string()],
            owner(),
        ))
        .await
        .unwrap();
    assert_eq!(after_second.evidence.len(), 1);
    assert_eq!(after_second.evidence[0].url, "https://proof/c");

    engine.approve_milestone(milestone.id, &admin()).await.unwrap();
    let err = engine
        .submit_evidence(SubmitEvidenceCmd::new(
            milestone.id,
            vec!["https://proof/d".to_string()],
            owner(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
}

#[tokio::test]
async fn transaction_list_paginates_with_cursor() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let now = Utc::now();
    for i in 0..3 {
        engine
            .record_transaction(
                RecordTransactionCmd::new(
                    project_id,
                    TransactionKind::Expense,
                    100 + i,
                    now - Duration::days(i),
                    owner(),
                )
                .category("supplies"),
            )
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let (page1, cursor) = engine
        .list_transactions_page(project_id, &owner(), 2, None, &filter)
        .await
        .unwrap();
    assert_eq!(page1.len(), 2);
    let cursor = cursor.expect("expected a next cursor");
    assert_eq!(page1[0].amount_minor, 100); // newest first

    let (page2, cursor2) = engine
        .list_transactions_page(project_id, &owner(), 2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(page2.len(), 1);
    assert!(cursor2.is_none());

    let kind_filter = TransactionListFilter {
        kind: Some(TransactionKind::Revenue),
        ..Default::default()
    };
    let (revenue_only, _) = engine
        .list_transactions_page(project_id, &owner(), 10, None, &kind_filter)
        .await
        .unwrap();
    assert!(revenue_only.is_empty());
}

#[tokio::test]
async fn identical_timestamps_order_deterministically_by_id() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let at = Utc::now();
    let mut ids = Vec::new();
    for amount in [100, 200] {
        let tx = engine
            .record_transaction(RecordTransactionCmd::new(
                project_id,
                TransactionKind::Expense,
                amount,
                at,
                owner(),
            ))
            .await
            .unwrap();
        ids.push(tx.id);
    }
    ids.sort();

    // Newest-first listing breaks the timestamp tie on id, so single-row
    // pages walk the pair in descending id order.
    let filter = TransactionListFilter::default();
    let (page1, cursor) = engine
        .list_transactions_page(project_id, &owner(), 1, None, &filter)
        .await
        .unwrap();
    assert_eq!(page1[0].id, ids[1]);

    let cursor = cursor.expect("expected a next cursor");
    let (page2, _) = engine
        .list_transactions_page(project_id, &owner(), 1, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(page2[0].id, ids[0]);
}

#[tokio::test]
async fn blank_titles_and_empty_evidence_are_invalid_input() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let err = engine
        .create_project(CreateProjectCmd::new("   ", 1_000, owner()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let milestone = engine
        .create_milestone(CreateMilestoneCmd::new(project_id, "Phase 1", owner()))
        .await
        .unwrap();
    let err = engine
        .submit_evidence(SubmitEvidenceCmd::new(milestone.id, Vec::new(), owner()))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn project_approval_is_admin_only_and_single_shot() {
    let (engine, _db) = engine_with_db().await;
    let project_id = seed_project(&engine, 10_000).await;

    let err = engine.approve_project(project_id, &owner()).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let approved = engine.approve_project(project_id, &admin()).await.unwrap();
    assert_eq!(approved.approved_by.as_deref(), Some("admin-1"));

    let err = engine.approve_project(project_id, &admin()).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
}

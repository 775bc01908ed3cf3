//! Initial schema migration - creates all tables from scratch.
//!
//! Complete schema for Ausilio:
//!
//! - `users`: authenticated accounts with platform roles
//! - `projects`: aid projects owned by beneficiaries
//! - `transactions`: the project ledger with frozen balance snapshots
//! - `milestones`: deliverables gating tranche releases
//! - `milestone_evidence`: ordered evidence lists per milestone
//! - `funding_requests`: ad-hoc disbursement requests
//! - `tranches`: milestone-bound funding slices

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Role,
    Token,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Title,
    Description,
    RequestedAmountMinor,
    TotalDisbursedMinor,
    Status,
    BeneficiaryId,
    ApprovedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    ProjectId,
    Kind,
    AmountMinor,
    BalanceMinor,
    Category,
    Description,
    ProofUrl,
    OccurredAt,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Milestones {
    Table,
    Id,
    ProjectId,
    Title,
    Description,
    TargetDate,
    Status,
    TrancheAmountMinor,
    DecidedBy,
    DecidedAt,
}

#[derive(Iden)]
enum MilestoneEvidence {
    Table,
    Id,
    MilestoneId,
    Url,
    UploadedAt,
    Position,
}

#[derive(Iden)]
enum FundingRequests {
    Table,
    Id,
    ProjectId,
    RequestedAmountMinor,
    Purpose,
    Status,
    ReviewedBy,
    ReviewedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Tranches {
    Table,
    Id,
    ProjectId,
    MilestoneId,
    AmountMinor,
    Status,
    ReleasedAt,
    ReleasedBy,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(
                        ColumnDef::new(Users::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Projects
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Title).string().not_null())
                    .col(ColumnDef::new(Projects::Description).string())
                    .col(
                        ColumnDef::new(Projects::RequestedAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Projects::TotalDisbursedMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Projects::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Projects::BeneficiaryId).string().not_null())
                    .col(ColumnDef::new(Projects::ApprovedBy).string())
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-projects-beneficiary_id")
                            .from(Projects::Table, Projects::BeneficiaryId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::ProjectId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(ColumnDef::new(Transactions::ProofUrl).string())
                    .col(
                        ColumnDef::new(Transactions::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-project_id")
                            .from(Transactions::Table, Transactions::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-project-occurred")
                    .table(Transactions::Table)
                    .col(Transactions::ProjectId)
                    .col(Transactions::OccurredAt)
                    .col(Transactions::Id)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Milestones
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Milestones::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Milestones::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Milestones::ProjectId).string().not_null())
                    .col(ColumnDef::new(Milestones::Title).string().not_null())
                    .col(ColumnDef::new(Milestones::Description).string())
                    .col(ColumnDef::new(Milestones::TargetDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Milestones::Status)
                            .string()
                            .not_null()
                            .default("not_started"),
                    )
                    .col(ColumnDef::new(Milestones::TrancheAmountMinor).big_integer())
                    .col(ColumnDef::new(Milestones::DecidedBy).string())
                    .col(ColumnDef::new(Milestones::DecidedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-milestones-project_id")
                            .from(Milestones::Table, Milestones::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Milestone evidence
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MilestoneEvidence::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MilestoneEvidence::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MilestoneEvidence::MilestoneId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MilestoneEvidence::Url).string().not_null())
                    .col(
                        ColumnDef::new(MilestoneEvidence::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MilestoneEvidence::Position)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-milestone_evidence-milestone_id")
                            .from(MilestoneEvidence::Table, MilestoneEvidence::MilestoneId)
                            .to(Milestones::Table, Milestones::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Funding requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FundingRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FundingRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FundingRequests::ProjectId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FundingRequests::RequestedAmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(FundingRequests::Purpose).string())
                    .col(
                        ColumnDef::new(FundingRequests::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(FundingRequests::ReviewedBy).string())
                    .col(ColumnDef::new(FundingRequests::ReviewedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(FundingRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-funding_requests-project_id")
                            .from(FundingRequests::Table, FundingRequests::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Tranches
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tranches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tranches::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tranches::ProjectId).string().not_null())
                    .col(
                        ColumnDef::new(Tranches::MilestoneId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tranches::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Tranches::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Tranches::ReleasedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Tranches::ReleasedBy).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tranches-project_id")
                            .from(Tranches::Table, Tranches::ProjectId)
                            .to(Projects::Table, Projects::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tranches-milestone_id")
                            .from(Tranches::Table, Tranches::MilestoneId)
                            .to(Milestones::Table, Milestones::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tranches::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FundingRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MilestoneEvidence::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Milestones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

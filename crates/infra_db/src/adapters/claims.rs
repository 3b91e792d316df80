//! PostgreSQL Claim Adapter
//!
//! This module provides the database adapter for the reimbursement domain,
//! implementing the `ClaimStore` port using PostgreSQL via the
//! `ClaimsRepository`.
//!
//! # Overview
//!
//! The `PostgresClaimAdapter` serves as the bridge between the domain's port
//! and the database layer. It:
//!
//! - Translates domain values into row types and back
//! - Rebuilds every read through `Claim::restore`, so a row that breaks the
//!   claim invariants surfaces as `PortError::Transformation`
//! - Translates `DatabaseError` into `PortError`
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimAdapter;
//! use domain_reimbursement::{ClaimStore, ReimbursementService};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ClaimStore> = Arc::new(PostgresClaimAdapter::new(pool));
//! let service = ReimbursementService::new(store);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId,
};
use domain_reimbursement::{
    Claim, ClaimContent, ClaimParts, ClaimStats, ClaimStatus, ClaimStore, ClaimVersion, Decision,
    ExpenseCategory, NewClaim,
};

use crate::repositories::claims::{
    ClaimRow, ClaimStatsRow, ClaimStatus as DbClaimStatus, ClaimsRepository,
    ExpenseCategory as DbExpenseCategory, NewClaimRow, RowVersion,
};

const ADAPTER_ID: &str = "postgres-claim-adapter";

/// PostgreSQL-backed implementation of the ClaimStore port
///
/// # Health Checking
///
/// Health checks run `SELECT 1` against the pool.
#[derive(Debug, Clone)]
pub struct PostgresClaimAdapter {
    repository: ClaimsRepository,
    pool: PgPool,
}

impl PostgresClaimAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

impl DomainPort for PostgresClaimAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClaimAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl ClaimStore for PostgresClaimAdapter {
    #[instrument(skip(self, claim), fields(employee_id = %claim.employee_id))]
    async fn insert(&self, claim: &NewClaim) -> Result<ClaimId, PortError> {
        let row = NewClaimRow {
            employee_id: claim.employee_id.value(),
            title: claim.content.title.clone(),
            description: claim.content.description.clone(),
            category: claim.content.category.into(),
            amount: claim.content.amount,
            receipt_reference: claim.content.receipt_reference.clone(),
            submitted_at: claim.submitted_at,
        };

        let id = self.repository.insert(&row).await?;
        Ok(ClaimId::new(id))
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get_by_id(&self, id: ClaimId) -> Result<Claim, PortError> {
        debug!("Fetching claim by ID");
        let row = self.repository.get_by_id(id.value()).await?;
        row_to_claim(row)
    }

    async fn list_all(&self) -> Result<Vec<Claim>, PortError> {
        rows_to_claims(self.repository.find_all().await?)
    }

    #[instrument(skip(self), fields(employee_id = %employee_id))]
    async fn list_by_owner(&self, employee_id: UserId) -> Result<Vec<Claim>, PortError> {
        rows_to_claims(self.repository.find_by_employee(employee_id.value()).await?)
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn list_by_status(&self, status: ClaimStatus) -> Result<Vec<Claim>, PortError> {
        rows_to_claims(self.repository.find_by_status(status.into()).await?)
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id(), expected = %expected))]
    async fn update(&self, claim: &Claim, expected: ClaimVersion) -> Result<(), PortError> {
        self.repository
            .update_guarded(&claim_to_row(claim), expected.into())
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(claim_id = %id, expected = %expected))]
    async fn delete(&self, id: ClaimId, expected: ClaimVersion) -> Result<(), PortError> {
        self.repository.delete_guarded(id.value(), expected.into()).await?;
        Ok(())
    }

    async fn aggregate_stats(&self, owner: Option<UserId>) -> Result<ClaimStats, PortError> {
        let row = self.repository.stats(owner.map(|id| id.value())).await?;
        stats_from_row(row)
    }
}

impl From<ClaimVersion> for RowVersion {
    fn from(version: ClaimVersion) -> Self {
        RowVersion {
            status: version.status.into(),
            revision: version.revision,
        }
    }
}

impl From<ClaimStatus> for DbClaimStatus {
    fn from(status: ClaimStatus) -> Self {
        match status {
            ClaimStatus::Pending => DbClaimStatus::Pending,
            ClaimStatus::ApprovedByManager => DbClaimStatus::ApprovedByManager,
            ClaimStatus::RejectedByManager => DbClaimStatus::RejectedByManager,
            ClaimStatus::ApprovedByFinance => DbClaimStatus::ApprovedByFinance,
            ClaimStatus::RejectedByFinance => DbClaimStatus::RejectedByFinance,
            ClaimStatus::Completed => DbClaimStatus::Completed,
        }
    }
}

impl From<DbClaimStatus> for ClaimStatus {
    fn from(status: DbClaimStatus) -> Self {
        match status {
            DbClaimStatus::Pending => ClaimStatus::Pending,
            DbClaimStatus::ApprovedByManager => ClaimStatus::ApprovedByManager,
            DbClaimStatus::RejectedByManager => ClaimStatus::RejectedByManager,
            DbClaimStatus::ApprovedByFinance => ClaimStatus::ApprovedByFinance,
            DbClaimStatus::RejectedByFinance => ClaimStatus::RejectedByFinance,
            DbClaimStatus::Completed => ClaimStatus::Completed,
        }
    }
}

impl From<ExpenseCategory> for DbExpenseCategory {
    fn from(category: ExpenseCategory) -> Self {
        match category {
            ExpenseCategory::Transport => DbExpenseCategory::Transport,
            ExpenseCategory::Accommodation => DbExpenseCategory::Accommodation,
            ExpenseCategory::Meals => DbExpenseCategory::Meals,
            ExpenseCategory::OfficeSupply => DbExpenseCategory::OfficeSupply,
            ExpenseCategory::Other => DbExpenseCategory::Other,
        }
    }
}

impl From<DbExpenseCategory> for ExpenseCategory {
    fn from(category: DbExpenseCategory) -> Self {
        match category {
            DbExpenseCategory::Transport => ExpenseCategory::Transport,
            DbExpenseCategory::Accommodation => ExpenseCategory::Accommodation,
            DbExpenseCategory::Meals => ExpenseCategory::Meals,
            DbExpenseCategory::OfficeSupply => ExpenseCategory::OfficeSupply,
            DbExpenseCategory::Other => ExpenseCategory::Other,
        }
    }
}

fn rows_to_claims(rows: Vec<ClaimRow>) -> Result<Vec<Claim>, PortError> {
    rows.into_iter().map(row_to_claim).collect()
}

/// Rebuilds a domain claim, rejecting rows that break its invariants
fn row_to_claim(row: ClaimRow) -> Result<Claim, PortError> {
    let id = ClaimId::new(row.id);
    let manager_decision = decision_from_columns(
        id,
        "manager",
        row.manager_id,
        row.manager_notes,
        row.manager_decided_at,
    )?;
    let finance_decision = decision_from_columns(
        id,
        "finance",
        row.finance_id,
        row.finance_notes,
        row.finance_decided_at,
    )?;

    Claim::restore(ClaimParts {
        id,
        employee_id: UserId::new(row.employee_id),
        content: ClaimContent {
            title: row.title,
            description: row.description,
            category: row.category.into(),
            amount: row.amount,
            receipt_reference: row.receipt_reference,
        },
        status: row.status.into(),
        manager_decision,
        finance_decision,
        revision: row.revision,
        employee_name: row.employee_name,
        submitted_at: row.submitted_at,
        updated_at: row.updated_at,
    })
    .map_err(|e| PortError::transformation(e.to_string()))
}

fn decision_from_columns(
    id: ClaimId,
    stage: &str,
    actor_id: Option<i64>,
    notes: Option<String>,
    decided_at: Option<chrono::DateTime<Utc>>,
) -> Result<Option<Decision>, PortError> {
    match (actor_id, decided_at) {
        (Some(actor_id), Some(decided_at)) => Ok(Some(Decision {
            actor_id: UserId::new(actor_id),
            notes,
            decided_at,
        })),
        (None, None) if notes.is_none() => Ok(None),
        _ => Err(PortError::transformation(format!(
            "claim {} has a partial {} decision",
            id, stage
        ))),
    }
}

fn claim_to_row(claim: &Claim) -> ClaimRow {
    let content = claim.content();
    let manager = claim.manager_decision();
    let finance = claim.finance_decision();

    ClaimRow {
        id: claim.id().value(),
        employee_id: claim.employee_id().value(),
        title: content.title.clone(),
        description: content.description.clone(),
        category: content.category.into(),
        amount: content.amount,
        receipt_reference: content.receipt_reference.clone(),
        status: claim.status().into(),
        revision: claim.revision(),
        manager_id: manager.map(|d| d.actor_id.value()),
        manager_notes: manager.and_then(|d| d.notes.clone()),
        manager_decided_at: manager.map(|d| d.decided_at),
        finance_id: finance.map(|d| d.actor_id.value()),
        finance_notes: finance.and_then(|d| d.notes.clone()),
        finance_decided_at: finance.map(|d| d.decided_at),
        submitted_at: claim.submitted_at(),
        updated_at: claim.updated_at(),
        employee_name: claim.employee_name().map(str::to_owned),
    }
}

fn stats_from_row(row: ClaimStatsRow) -> Result<ClaimStats, PortError> {
    let count = |value: i64| {
        u64::try_from(value)
            .map_err(|_| PortError::transformation(format!("negative claim count {}", value)))
    };

    Ok(ClaimStats {
        submitted: count(row.submitted)?,
        approved: count(row.approved)?,
        rejected: count(row.rejected)?,
        pending: count(row.pending)?,
        total_amount: row.total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn pending_row() -> ClaimRow {
        let now = Utc::now();
        ClaimRow {
            id: 7,
            employee_id: 1,
            title: "Taxi".to_string(),
            description: "Airport".to_string(),
            category: DbExpenseCategory::Transport,
            amount: Decimal::new(5000, 2),
            receipt_reference: "/uploads/taxi.png".to_string(),
            status: DbClaimStatus::Pending,
            revision: 0,
            manager_id: None,
            manager_notes: None,
            manager_decided_at: None,
            finance_id: None,
            finance_notes: None,
            finance_decided_at: None,
            submitted_at: now,
            updated_at: now,
            employee_name: Some("Alice Employee".to_string()),
        }
    }

    #[test]
    fn test_row_round_trips_through_domain() {
        let claim = row_to_claim(pending_row()).unwrap();
        assert_eq!(claim.id(), ClaimId::new(7));
        assert_eq!(claim.status(), ClaimStatus::Pending);

        let back = claim_to_row(&claim);
        assert_eq!(back.status, DbClaimStatus::Pending);
        assert_eq!(back.manager_id, None);
    }

    #[test]
    fn test_revision_and_owner_name_survive_reads() {
        let mut row = pending_row();
        row.revision = 3;

        let claim = row_to_claim(row).unwrap();
        assert_eq!(claim.revision(), 3);
        assert_eq!(claim.employee_name(), Some("Alice Employee"));
        assert_eq!(
            RowVersion::from(claim.version()),
            RowVersion {
                status: DbClaimStatus::Pending,
                revision: 3
            }
        );
        assert_eq!(claim_to_row(&claim).revision, 3);
    }

    #[test]
    fn test_decided_row_keeps_decisions() {
        let mut row = pending_row();
        row.status = DbClaimStatus::ApprovedByManager;
        row.manager_id = Some(10);
        row.manager_notes = Some("ok".to_string());
        row.manager_decided_at = Some(Utc::now());

        let claim = row_to_claim(row).unwrap();
        let decision = claim.manager_decision().unwrap();
        assert_eq!(decision.actor_id, UserId::new(10));
        assert_eq!(decision.notes.as_deref(), Some("ok"));
    }

    #[test]
    fn test_pending_row_with_decision_is_rejected() {
        let mut row = pending_row();
        row.manager_id = Some(10);
        row.manager_decided_at = Some(Utc::now());

        let error = row_to_claim(row).unwrap_err();
        assert!(matches!(error, PortError::Transformation { .. }));
    }

    #[test]
    fn test_partial_decision_columns_are_rejected() {
        let mut row = pending_row();
        row.status = DbClaimStatus::ApprovedByManager;
        row.manager_id = Some(10);

        let error = row_to_claim(row).unwrap_err();
        assert!(error.to_string().contains("partial manager decision"));
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        let mut row = pending_row();
        row.amount = Decimal::ZERO;
        assert!(matches!(
            row_to_claim(row),
            Err(PortError::Transformation { .. })
        ));
    }

    #[test]
    fn test_status_mapping_is_total() {
        for status in ClaimStatus::ALL {
            let db: DbClaimStatus = status.into();
            assert_eq!(ClaimStatus::from(db), status);
            assert_eq!(db.as_str(), status.as_str());
        }
        for category in ExpenseCategory::ALL {
            let db: DbExpenseCategory = category.into();
            assert_eq!(ExpenseCategory::from(db), category);
        }
    }

    #[test]
    fn test_stats_row_conversion() {
        let stats = stats_from_row(ClaimStatsRow {
            submitted: 3,
            approved: 1,
            rejected: 1,
            pending: 1,
            total_amount: Decimal::new(18000, 2),
        })
        .unwrap();
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.total_amount, Decimal::new(180, 0));
    }
}

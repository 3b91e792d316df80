//! Claims repository implementation
//!
//! This module provides database access for reimbursement claims. Queries are
//! built at runtime with `sqlx::query_as` so the crate compiles without a live
//! database; row shapes are checked through `FromRow`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::error::DatabaseError;

// The owner's directory name is joined in for display only; writes ignore it.
const SELECT_CLAIM: &str = r#"
    SELECT
        c.id, c.employee_id, c.title, c.description, c.category, c.amount,
        c.receipt_reference, c.status, c.revision,
        c.manager_id, c.manager_notes, c.manager_decided_at,
        c.finance_id, c.finance_notes, c.finance_decided_at,
        c.submitted_at, c.updated_at,
        u.full_name AS employee_name
    FROM claims c
    JOIN users u ON u.id = c.employee_id
"#;

const ORDER_NEWEST_FIRST: &str = "ORDER BY c.submitted_at DESC, c.id DESC";

/// Repository for managing claims data
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    /// Creates a new ClaimsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a pending claim and returns the generated id
    pub async fn insert(&self, claim: &NewClaimRow) -> Result<i64, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO claims (
                employee_id, title, description, category, amount,
                receipt_reference, status, submitted_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $7)
            RETURNING id
            "#,
        )
        .bind(claim.employee_id)
        .bind(&claim.title)
        .bind(&claim.description)
        .bind(claim.category)
        .bind(claim.amount)
        .bind(&claim.receipt_reference)
        .bind(claim.submitted_at)
        .fetch_one(&self.pool)
        .await?;

        debug!(claim_id = id, "Inserted claim row");
        Ok(id)
    }

    /// Retrieves a claim by its identifier
    pub async fn get_by_id(&self, id: i64) -> Result<ClaimRow, DatabaseError> {
        sqlx::query_as::<_, ClaimRow>(&format!("{SELECT_CLAIM} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", format!("CLM-{id}")))
    }

    /// Retrieves every claim, newest submission first
    pub async fn find_all(&self) -> Result<Vec<ClaimRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClaimRow>(&format!("{SELECT_CLAIM} {ORDER_NEWEST_FIRST}"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Retrieves the claims submitted by one employee
    pub async fn find_by_employee(&self, employee_id: i64) -> Result<Vec<ClaimRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClaimRow>(&format!(
            "{SELECT_CLAIM} WHERE c.employee_id = $1 {ORDER_NEWEST_FIRST}"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Retrieves the claims currently in one status
    pub async fn find_by_status(&self, status: ClaimStatus) -> Result<Vec<ClaimRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClaimRow>(&format!(
            "{SELECT_CLAIM} WHERE c.status = $1 {ORDER_NEWEST_FIRST}"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Overwrites a claim's mutable columns if its stored status and
    /// revision still equal `expected`
    ///
    /// The row is locked with `FOR UPDATE` for the duration of the
    /// transaction, so the comparison and the write are atomic.
    pub async fn update_guarded(
        &self,
        claim: &ClaimRow,
        expected: RowVersion,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let stored = lock_version(&mut tx, claim.id).await?;
        ensure_expected(claim.id, stored, expected)?;

        let result = sqlx::query(
            r#"
            UPDATE claims SET
                title = $2,
                description = $3,
                category = $4,
                amount = $5,
                receipt_reference = $6,
                status = $7,
                manager_id = $8,
                manager_notes = $9,
                manager_decided_at = $10,
                finance_id = $11,
                finance_notes = $12,
                finance_decided_at = $13,
                updated_at = $14,
                revision = $16
            WHERE id = $1 AND employee_id = $15
            "#,
        )
        .bind(claim.id)
        .bind(&claim.title)
        .bind(&claim.description)
        .bind(claim.category)
        .bind(claim.amount)
        .bind(&claim.receipt_reference)
        .bind(claim.status)
        .bind(claim.manager_id)
        .bind(&claim.manager_notes)
        .bind(claim.manager_decided_at)
        .bind(claim.finance_id)
        .bind(&claim.finance_notes)
        .bind(claim.finance_decided_at)
        .bind(claim.updated_at)
        .bind(claim.employee_id)
        .bind(claim.revision)
        .execute(&mut *tx)
        .await?;

        // The owner is immutable; a mismatch leaves the row untouched.
        if result.rows_affected() != 1 {
            return Err(DatabaseError::ConstraintViolation(format!(
                "claim CLM-{} is not owned by USR-{}",
                claim.id, claim.employee_id
            )));
        }

        tx.commit().await?;
        debug!(
            claim_id = claim.id,
            from = stored.status.as_str(),
            to = claim.status.as_str(),
            revision = claim.revision,
            "Updated claim row"
        );
        Ok(())
    }

    /// Deletes a claim if its stored status and revision still equal
    /// `expected`
    pub async fn delete_guarded(&self, id: i64, expected: RowVersion) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let stored = lock_version(&mut tx, id).await?;
        ensure_expected(id, stored, expected)?;

        sqlx::query("DELETE FROM claims WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(claim_id = id, "Deleted claim row");
        Ok(())
    }

    /// Counts claims per status bucket and sums their amounts
    ///
    /// With `employee_id` set only that employee's claims are aggregated.
    pub async fn stats(&self, employee_id: Option<i64>) -> Result<ClaimStatsRow, DatabaseError> {
        let row = sqlx::query_as::<_, ClaimStatsRow>(
            r#"
            SELECT
                COUNT(*) AS submitted,
                COUNT(*) FILTER (
                    WHERE status IN ('approved_by_manager', 'approved_by_finance', 'completed')
                ) AS approved,
                COUNT(*) FILTER (
                    WHERE status IN ('rejected_by_manager', 'rejected_by_finance')
                ) AS rejected,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COALESCE(SUM(amount), 0) AS total_amount
            FROM claims
            WHERE $1::BIGINT IS NULL OR employee_id = $1
            "#,
        )
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

async fn lock_version(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: i64,
) -> Result<RowVersion, DatabaseError> {
    sqlx::query_as::<_, RowVersion>(
        "SELECT status, revision FROM claims WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Claim", format!("CLM-{id}")))
}

fn ensure_expected(id: i64, stored: RowVersion, expected: RowVersion) -> Result<(), DatabaseError> {
    if stored != expected {
        return Err(DatabaseError::Conflict(format!(
            "claim CLM-{} is {} rev {}, expected {} rev {}",
            id,
            stored.status.as_str(),
            stored.revision,
            expected.status.as_str(),
            expected.revision
        )));
    }
    Ok(())
}

/// Status and revision of a stored claim, compared by guarded writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct RowVersion {
    pub status: ClaimStatus,
    pub revision: i64,
}

/// Claim status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    ApprovedByManager,
    RejectedByManager,
    ApprovedByFinance,
    RejectedByFinance,
    Completed,
}

impl ClaimStatus {
    /// Label as stored in the `claim_status` enum
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::ApprovedByManager => "approved_by_manager",
            ClaimStatus::RejectedByManager => "rejected_by_manager",
            ClaimStatus::ApprovedByFinance => "approved_by_finance",
            ClaimStatus::RejectedByFinance => "rejected_by_finance",
            ClaimStatus::Completed => "completed",
        }
    }
}

/// Expense category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "expense_category", rename_all = "snake_case")]
pub enum ExpenseCategory {
    Transport,
    Accommodation,
    Meals,
    OfficeSupply,
    Other,
}

/// Database row for claim
#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
    pub id: i64,
    pub employee_id: i64,
    pub title: String,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub receipt_reference: String,
    pub status: ClaimStatus,
    pub revision: i64,
    pub manager_id: Option<i64>,
    pub manager_notes: Option<String>,
    pub manager_decided_at: Option<DateTime<Utc>>,
    pub finance_id: Option<i64>,
    pub finance_notes: Option<String>,
    pub finance_decided_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `users.full_name` of the owner; read-only
    pub employee_name: Option<String>,
}

/// Data for inserting a new claim
#[derive(Debug, Clone)]
pub struct NewClaimRow {
    pub employee_id: i64,
    pub title: String,
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub receipt_reference: String,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregate row returned by [`ClaimsRepository::stats`]
#[derive(Debug, Clone, FromRow)]
pub struct ClaimStatsRow {
    pub submitted: i64,
    pub approved: i64,
    pub rejected: i64,
    pub pending: i64,
    pub total_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(status: ClaimStatus, revision: i64) -> RowVersion {
        RowVersion { status, revision }
    }

    #[test]
    fn test_conflict_names_both_versions() {
        let error = ensure_expected(
            3,
            version(ClaimStatus::ApprovedByManager, 1),
            version(ClaimStatus::Pending, 0),
        )
        .unwrap_err();
        assert!(matches!(error, DatabaseError::Conflict(_)));
        assert_eq!(
            error.to_string(),
            "Conflict: claim CLM-3 is approved_by_manager rev 1, expected pending rev 0"
        );
    }

    #[test]
    fn test_same_status_with_newer_revision_conflicts() {
        let result = ensure_expected(
            3,
            version(ClaimStatus::Pending, 2),
            version(ClaimStatus::Pending, 1),
        );
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));
    }

    #[test]
    fn test_matching_version_passes() {
        let current = version(ClaimStatus::Pending, 4);
        assert!(ensure_expected(3, current, current).is_ok());
    }
}

//! Reimbursement Domain Ports
//!
//! The `ClaimStore` trait is everything the workflow needs from persistence.
//! Implementations:
//!
//! - **PostgreSQL adapter**: `infra_db::adapters::PostgresClaimAdapter`
//! - **In-memory adapter**: [`mock::InMemoryClaimStore`], for tests
//!
//! # Compare-and-set
//!
//! `update` and `delete` take the [`ClaimVersion`] (status and revision) the
//! caller observed before deciding. The store re-checks it atomically with
//! the write and returns `PortError::Conflict` if another writer got there
//! first. Two concurrent decisions can never both succeed from the same
//! pre-state, and a decision computed from a snapshot cannot overwrite an
//! edit that committed after the snapshot was read.
//!
//! ```rust,ignore
//! let current = store.get_by_id(id).await?;
//! let next = workflow::decide(&principal, &current, stage, action, notes)?;
//! store.update(&next, current.version()).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{ClaimId, DomainPort, HealthCheckable, PortError, UserId};

use crate::claim::{Claim, ClaimStatus, ClaimVersion, NewClaim};
use crate::stats::ClaimStats;

/// Persistence port for claims
///
/// Listings are ordered newest submission first.
#[async_trait]
pub trait ClaimStore: DomainPort + HealthCheckable {
    /// Persists a new pending claim and returns its assigned id
    async fn insert(&self, claim: &NewClaim) -> Result<ClaimId, PortError>;

    /// Retrieves a claim, or `PortError::NotFound`
    async fn get_by_id(&self, id: ClaimId) -> Result<Claim, PortError>;

    async fn list_all(&self) -> Result<Vec<Claim>, PortError>;

    async fn list_by_owner(&self, employee_id: UserId) -> Result<Vec<Claim>, PortError>;

    async fn list_by_status(&self, status: ClaimStatus) -> Result<Vec<Claim>, PortError>;

    /// Writes content, state, revision and `updated_at` if the stored
    /// version still equals `expected`
    async fn update(&self, claim: &Claim, expected: ClaimVersion) -> Result<(), PortError>;

    /// Removes a claim if the stored version still equals `expected`
    async fn delete(&self, id: ClaimId, expected: ClaimVersion) -> Result<(), PortError>;

    /// Aggregates counts and amounts, optionally for one owner only
    async fn aggregate_stats(&self, owner: Option<UserId>) -> Result<ClaimStats, PortError>;
}

/// In-memory implementation of ClaimStore for testing
///
/// All state sits behind one lock, so each compare-and-set is atomic with
/// respect to every other write.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use chrono::Utc;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    #[derive(Debug, Default)]
    struct Inner {
        claims: HashMap<ClaimId, Claim>,
        names: HashMap<UserId, String>,
        last_id: i64,
    }

    fn ensure_version(id: ClaimId, stored: &Claim, expected: ClaimVersion) -> Result<(), PortError> {
        if stored.version() != expected {
            return Err(PortError::conflict(format!(
                "claim {} is {}, expected {}",
                id,
                stored.version(),
                expected
            )));
        }
        Ok(())
    }

    /// In-memory claim store
    #[derive(Debug, Default, Clone)]
    pub struct InMemoryClaimStore {
        inner: Arc<RwLock<Inner>>,
    }

    impl InMemoryClaimStore {
        /// Creates an empty store
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of stored claims
        pub async fn len(&self) -> usize {
            self.inner.read().await.claims.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.len().await == 0
        }

        /// Registers a display name, attached to claims submitted afterwards
        pub async fn register_employee(&self, id: UserId, full_name: impl Into<String>) {
            self.inner.write().await.names.insert(id, full_name.into());
        }

        async fn collect<F>(&self, filter: F) -> Vec<Claim>
        where
            F: Fn(&Claim) -> bool,
        {
            let inner = self.inner.read().await;
            let mut claims: Vec<Claim> = inner.claims.values().filter(|c| filter(c)).cloned().collect();
            claims.sort_by(|a, b| {
                b.submitted_at()
                    .cmp(&a.submitted_at())
                    .then_with(|| b.id().cmp(&a.id()))
            });
            claims
        }
    }

    impl DomainPort for InMemoryClaimStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryClaimStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "in-memory-claim-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory store always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl ClaimStore for InMemoryClaimStore {
        async fn insert(&self, claim: &NewClaim) -> Result<ClaimId, PortError> {
            let mut inner = self.inner.write().await;
            inner.last_id += 1;
            let id = ClaimId::new(inner.last_id);
            let mut stored = claim.clone().into_claim(id);
            stored.set_employee_name(inner.names.get(&claim.employee_id).cloned());
            inner.claims.insert(id, stored);
            Ok(id)
        }

        async fn get_by_id(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.inner
                .read()
                .await
                .claims
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn list_all(&self) -> Result<Vec<Claim>, PortError> {
            Ok(self.collect(|_| true).await)
        }

        async fn list_by_owner(&self, employee_id: UserId) -> Result<Vec<Claim>, PortError> {
            Ok(self.collect(|c| c.is_owned_by(employee_id)).await)
        }

        async fn list_by_status(&self, status: ClaimStatus) -> Result<Vec<Claim>, PortError> {
            Ok(self.collect(|c| c.status() == status).await)
        }

        async fn update(&self, claim: &Claim, expected: ClaimVersion) -> Result<(), PortError> {
            let mut inner = self.inner.write().await;
            let stored = inner
                .claims
                .get_mut(&claim.id())
                .ok_or_else(|| PortError::not_found("Claim", claim.id()))?;

            ensure_version(claim.id(), stored, expected)?;
            if stored.employee_id() != claim.employee_id() {
                return Err(PortError::validation_field(
                    "claim owner cannot change",
                    "employee_id",
                ));
            }

            let name = stored.employee_name().map(str::to_owned);
            *stored = claim.clone();
            stored.set_employee_name(name);
            Ok(())
        }

        async fn delete(&self, id: ClaimId, expected: ClaimVersion) -> Result<(), PortError> {
            let mut inner = self.inner.write().await;
            let stored = inner
                .claims
                .get(&id)
                .ok_or_else(|| PortError::not_found("Claim", id))?;

            ensure_version(id, stored, expected)?;

            inner.claims.remove(&id);
            Ok(())
        }

        async fn aggregate_stats(&self, owner: Option<UserId>) -> Result<ClaimStats, PortError> {
            let inner = self.inner.read().await;
            let in_scope = inner
                .claims
                .values()
                .filter(|c| owner.map_or(true, |id| c.is_owned_by(id)));
            Ok(ClaimStats::from_claims(in_scope))
        }
    }
}

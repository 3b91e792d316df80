//! Reimbursement application service
//!
//! Orchestrates one read-decide-write unit per call: fetch the claim, ask the
//! workflow engine for the next state, and persist it with a compare-and-set
//! on the version (status and revision) that was read.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use core_kernel::{ClaimId, Principal, Role};

use crate::claim::{Claim, ClaimContent};
use crate::error::ClaimError;
use crate::ports::ClaimStore;
use crate::stats::ClaimStats;
use crate::visibility::{self, ClaimScope};
use crate::workflow::{self, ApprovalStage, ClaimPatch, DecisionAction};

/// Entry point for every reimbursement operation
#[derive(Clone)]
pub struct ReimbursementService {
    store: Arc<dyn ClaimStore>,
}

impl ReimbursementService {
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self { store }
    }

    /// Underlying store, e.g. for health checks
    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }

    /// Submits a new claim on behalf of the principal
    #[instrument(skip(self, principal, content), fields(principal = %principal.id, role = %principal.role))]
    pub async fn submit(
        &self,
        principal: &Principal,
        content: ClaimContent,
    ) -> Result<Claim, ClaimError> {
        let new_claim = workflow::submit(principal, content).inspect_err(log_refusal)?;
        let id = self.store.insert(&new_claim).await?;

        info!(claim_id = %id, amount = %new_claim.content.amount, "Claim submitted");
        // Read back so the caller sees exactly what was stored, owner name included.
        Ok(self.store.get_by_id(id).await?)
    }

    /// Fetches one claim the principal is allowed to see
    #[instrument(skip(self, principal), fields(principal = %principal.id, role = %principal.role))]
    pub async fn get(&self, principal: &Principal, id: ClaimId) -> Result<Claim, ClaimError> {
        let claim = self.store.get_by_id(id).await?;
        visibility::can_view(principal, &claim).inspect_err(log_refusal)?;
        Ok(claim)
    }

    /// Lists every claim visible to the principal
    #[instrument(skip(self, principal), fields(principal = %principal.id, role = %principal.role))]
    pub async fn list(&self, principal: &Principal) -> Result<Vec<Claim>, ClaimError> {
        let claims = match visibility::scope_for(principal) {
            ClaimScope::All => self.store.list_all().await?,
            ClaimScope::Owner(owner) => self.store.list_by_owner(owner).await?,
        };
        debug!(count = claims.len(), "Listed claims");
        Ok(claims)
    }

    /// Claims awaiting the principal's stage
    ///
    /// Managers see pending claims; finance sees manager-approved claims.
    #[instrument(skip(self, principal), fields(principal = %principal.id, role = %principal.role))]
    pub async fn review_queue(&self, principal: &Principal) -> Result<Vec<Claim>, ClaimError> {
        let stage = match principal.role {
            Role::Manager => ApprovalStage::Manager,
            Role::Finance => ApprovalStage::Finance,
            Role::Employee => {
                let error = ClaimError::forbidden("employees have no review queue");
                log_refusal(&error);
                return Err(error);
            }
        };

        let claims = self.store.list_by_status(stage.required_status()).await?;
        debug!(stage = %stage, count = claims.len(), "Loaded review queue");
        Ok(claims)
    }

    /// Applies a partial content update to a pending claim
    #[instrument(skip(self, principal, patch), fields(principal = %principal.id, role = %principal.role))]
    pub async fn edit(
        &self,
        principal: &Principal,
        id: ClaimId,
        patch: ClaimPatch,
    ) -> Result<Claim, ClaimError> {
        let current = self.store.get_by_id(id).await?;
        let updated = workflow::edit_content(principal, &current, patch).inspect_err(log_refusal)?;

        self.store
            .update(&updated, current.version())
            .await
            .inspect_err(|e| warn!(error = %e, "Claim edit not persisted"))?;

        info!(claim_id = %id, "Claim content updated");
        Ok(updated)
    }

    /// Permanently deletes a pending claim
    #[instrument(skip(self, principal), fields(principal = %principal.id, role = %principal.role))]
    pub async fn withdraw(&self, principal: &Principal, id: ClaimId) -> Result<(), ClaimError> {
        let current = self.store.get_by_id(id).await?;
        workflow::withdraw(principal, &current).inspect_err(log_refusal)?;

        self.store
            .delete(id, current.version())
            .await
            .inspect_err(|e| warn!(error = %e, "Claim withdrawal not persisted"))?;

        info!(claim_id = %id, "Claim withdrawn");
        Ok(())
    }

    /// Records a manager or finance decision
    #[instrument(skip(self, principal, notes), fields(principal = %principal.id, role = %principal.role))]
    pub async fn decide(
        &self,
        principal: &Principal,
        id: ClaimId,
        stage: ApprovalStage,
        action: DecisionAction,
        notes: Option<String>,
    ) -> Result<Claim, ClaimError> {
        let current = self.store.get_by_id(id).await?;
        let updated = workflow::decide(principal, &current, stage, action, notes)
            .inspect_err(log_refusal)?;

        self.store
            .update(&updated, current.version())
            .await
            .inspect_err(|e| warn!(error = %e, "Claim decision not persisted"))?;

        info!(
            claim_id = %id,
            from = %current.status(),
            to = %updated.status(),
            "Claim decided"
        );
        Ok(updated)
    }

    /// Statistics over the claims visible to the principal
    #[instrument(skip(self, principal), fields(principal = %principal.id, role = %principal.role))]
    pub async fn stats(&self, principal: &Principal) -> Result<ClaimStats, ClaimError> {
        let owner = visibility::scope_for(principal).owner();
        Ok(self.store.aggregate_stats(owner).await?)
    }
}

fn log_refusal(error: &ClaimError) {
    warn!(error = %error, "Operation refused");
}

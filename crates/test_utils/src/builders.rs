//! Test Data Builders
//!
//! Builders that produce claims in any lifecycle status. Claims are driven
//! through the real workflow functions rather than assembled field by field,
//! so a built claim is always one the engine could have produced.

use std::sync::Arc;

use chrono::Utc;
use core_kernel::{ClaimId, Principal};
use domain_reimbursement::ports::mock::InMemoryClaimStore;
use domain_reimbursement::workflow;
use domain_reimbursement::{
    ApprovalStage, Claim, ClaimContent, ClaimError, ClaimParts, ClaimStatus, DecisionAction,
    ReimbursementService,
};

use crate::fixtures::{ContentFixtures, PrincipalFixtures};

/// Builder for a claim in a chosen status
#[derive(Debug, Clone)]
pub struct ClaimBuilder {
    id: ClaimId,
    owner: Principal,
    manager: Principal,
    finance: Principal,
    content: ClaimContent,
    status: ClaimStatus,
    manager_notes: Option<String>,
    finance_notes: Option<String>,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// A pending taxi claim owned by the fixture employee
    pub fn new() -> Self {
        Self {
            id: ClaimId::new(1),
            owner: PrincipalFixtures::employee(),
            manager: PrincipalFixtures::manager(),
            finance: PrincipalFixtures::finance(),
            content: ContentFixtures::taxi(),
            status: ClaimStatus::Pending,
            manager_notes: None,
            finance_notes: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = ClaimId::new(id);
        self
    }

    pub fn owned_by(mut self, owner: Principal) -> Self {
        self.owner = owner;
        self
    }

    pub fn decided_by(mut self, manager: Principal, finance: Principal) -> Self {
        self.manager = manager;
        self.finance = finance;
        self
    }

    pub fn with_content(mut self, content: ClaimContent) -> Self {
        self.content = content;
        self
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_manager_notes(mut self, notes: impl Into<String>) -> Self {
        self.manager_notes = Some(notes.into());
        self
    }

    pub fn with_finance_notes(mut self, notes: impl Into<String>) -> Self {
        self.finance_notes = Some(notes.into());
        self
    }

    /// Builds the claim without any store
    ///
    /// # Panics
    ///
    /// Panics if the builder's principals cannot reach the requested status.
    pub fn build(self) -> Claim {
        let pending = workflow::submit(&self.owner, self.content.clone())
            .expect("builder content must be valid")
            .into_claim(self.id);

        let path = self.decision_path();
        let mut claim = pending;
        for (stage, action, notes) in path {
            let principal = self.principal_for(stage);
            claim = workflow::decide(principal, &claim, stage, action, notes)
                .expect("builder decision path must be legal");
        }

        if self.status == ClaimStatus::Completed {
            return complete(claim);
        }
        claim
    }

    /// Drives the claim into the requested status through a service
    ///
    /// The store assigns the id, so `with_id` is ignored here.
    pub async fn persist(self, service: &ReimbursementService) -> Result<Claim, ClaimError> {
        if self.status == ClaimStatus::Completed {
            return Err(ClaimError::invalid_state(
                "no operation produces a completed claim",
            ));
        }

        let mut claim = service.submit(&self.owner, self.content.clone()).await?;
        for (stage, action, notes) in self.decision_path() {
            let principal = self.principal_for(stage);
            claim = service
                .decide(principal, claim.id(), stage, action, notes)
                .await?;
        }
        Ok(claim)
    }

    fn principal_for(&self, stage: ApprovalStage) -> &Principal {
        match stage {
            ApprovalStage::Manager => &self.manager,
            ApprovalStage::Finance => &self.finance,
        }
    }

    fn decision_path(&self) -> Vec<(ApprovalStage, DecisionAction, Option<String>)> {
        let manager = |action| (ApprovalStage::Manager, action, self.manager_notes.clone());
        let finance = |action| (ApprovalStage::Finance, action, self.finance_notes.clone());

        match self.status {
            ClaimStatus::Pending => vec![],
            ClaimStatus::ApprovedByManager => vec![manager(DecisionAction::Approve)],
            ClaimStatus::RejectedByManager => vec![manager(DecisionAction::Reject)],
            ClaimStatus::ApprovedByFinance | ClaimStatus::Completed => vec![
                manager(DecisionAction::Approve),
                finance(DecisionAction::Approve),
            ],
            ClaimStatus::RejectedByFinance => vec![
                manager(DecisionAction::Approve),
                finance(DecisionAction::Reject),
            ],
        }
    }
}

fn complete(claim: Claim) -> Claim {
    Claim::restore(ClaimParts {
        id: claim.id(),
        employee_id: claim.employee_id(),
        content: claim.content().clone(),
        status: ClaimStatus::Completed,
        manager_decision: claim.manager_decision().cloned(),
        finance_decision: claim.finance_decision().cloned(),
        revision: claim.revision() + 1,
        employee_name: claim.employee_name().map(str::to_owned),
        submitted_at: claim.submitted_at(),
        updated_at: Utc::now(),
    })
    .expect("approved claim carries both decisions")
}

/// A service over a fresh in-memory store
pub fn in_memory_service() -> (ReimbursementService, InMemoryClaimStore) {
    let store = InMemoryClaimStore::new();
    let service = ReimbursementService::new(Arc::new(store.clone()));
    (service, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_every_status() {
        for status in ClaimStatus::ALL {
            let claim = ClaimBuilder::new().with_status(status).build();
            assert_eq!(claim.status(), status);
        }
    }

    #[test]
    fn test_notes_land_on_the_right_decision() {
        let claim = ClaimBuilder::new()
            .with_status(ClaimStatus::RejectedByFinance)
            .with_manager_notes("fine")
            .with_finance_notes("duplicate receipt")
            .build();

        assert_eq!(claim.manager_decision().unwrap().notes.as_deref(), Some("fine"));
        assert_eq!(
            claim.finance_decision().unwrap().notes.as_deref(),
            Some("duplicate receipt")
        );
    }

    #[tokio::test]
    async fn test_persist_goes_through_the_store() {
        let (service, store) = in_memory_service();
        let claim = ClaimBuilder::new()
            .with_status(ClaimStatus::ApprovedByManager)
            .persist(&service)
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(claim.status(), ClaimStatus::ApprovedByManager);
    }
}

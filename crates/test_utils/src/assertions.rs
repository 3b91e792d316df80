//! Custom Test Assertions
//!
//! Provides assertion helpers for claims and workflow outcomes that give
//! more meaningful messages than a bare `assert!(matches!(..))`.

use domain_reimbursement::{Claim, ClaimError, ClaimState};
use rust_decimal::Decimal;

/// Asserts every entity invariant of a claim
///
/// # Panics
///
/// Panics with the violated rule if the claim is inconsistent
pub fn assert_claim_invariants(claim: &Claim) {
    let content = claim.content();
    assert!(
        content.amount > Decimal::ZERO,
        "claim {} has non-positive amount {}",
        claim.id(),
        content.amount
    );
    for (field, value) in [
        ("title", &content.title),
        ("description", &content.description),
        ("receipt_reference", &content.receipt_reference),
    ] {
        assert!(!value.trim().is_empty(), "claim {} has empty {}", claim.id(), field);
    }

    let (has_manager, has_finance) = match claim.state() {
        ClaimState::Pending => (false, false),
        ClaimState::ApprovedByManager { .. } | ClaimState::RejectedByManager { .. } => (true, false),
        ClaimState::ApprovedByFinance { .. }
        | ClaimState::RejectedByFinance { .. }
        | ClaimState::Completed { .. } => (true, true),
    };
    assert_eq!(
        claim.manager_decision().is_some(),
        has_manager,
        "claim {} in status {} has wrong manager decision presence",
        claim.id(),
        claim.status()
    );
    assert_eq!(
        claim.finance_decision().is_some(),
        has_finance,
        "claim {} in status {} has wrong finance decision presence",
        claim.id(),
        claim.status()
    );
    assert!(
        claim.updated_at() >= claim.submitted_at(),
        "claim {} was updated before it was submitted",
        claim.id()
    );
}

fn describe<T: std::fmt::Debug>(result: &Result<T, ClaimError>) -> String {
    match result {
        Ok(value) => format!("Ok({:?})", value),
        Err(error) => format!("Err({:?})", error),
    }
}

/// Asserts a `ClaimError::Validation`
pub fn assert_validation<T: std::fmt::Debug>(result: &Result<T, ClaimError>) {
    assert!(
        matches!(result, Err(ClaimError::Validation(_))),
        "expected validation error, got {}",
        describe(result)
    );
}

/// Asserts a `ClaimError::Forbidden`
pub fn assert_forbidden<T: std::fmt::Debug>(result: &Result<T, ClaimError>) {
    assert!(
        matches!(result, Err(ClaimError::Forbidden(_))),
        "expected forbidden, got {}",
        describe(result)
    );
}

/// Asserts a `ClaimError::InvalidState`
pub fn assert_invalid_state<T: std::fmt::Debug>(result: &Result<T, ClaimError>) {
    assert!(
        matches!(result, Err(ClaimError::InvalidState(_))),
        "expected invalid state, got {}",
        describe(result)
    );
}

/// Asserts a `ClaimError::NotFound`
pub fn assert_not_found<T: std::fmt::Debug>(result: &Result<T, ClaimError>) {
    assert!(
        matches!(result, Err(ClaimError::NotFound(_))),
        "expected not found, got {}",
        describe(result)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::ClaimBuilder;
    use domain_reimbursement::ClaimStatus;

    #[test]
    fn test_built_claims_satisfy_invariants() {
        for status in ClaimStatus::ALL {
            assert_claim_invariants(&ClaimBuilder::new().with_status(status).build());
        }
    }

    #[test]
    #[should_panic(expected = "expected forbidden")]
    fn test_assert_forbidden_rejects_other_errors() {
        let result: Result<(), ClaimError> = Err(ClaimError::invalid_state("nope"));
        assert_forbidden(&result);
    }
}

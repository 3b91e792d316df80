//! Claim visibility rules
//!
//! Employees see only the claims they submitted. Managers and finance see
//! every claim.

use core_kernel::{Principal, Role, UserId};

use crate::claim::Claim;
use crate::error::ClaimError;

/// The subset of claims a principal may list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimScope {
    All,
    Owner(UserId),
}

impl ClaimScope {
    /// Owner filter to push down to the store, if any
    pub fn owner(&self) -> Option<UserId> {
        match self {
            ClaimScope::All => None,
            ClaimScope::Owner(id) => Some(*id),
        }
    }

    pub fn admits(&self, claim: &Claim) -> bool {
        match self {
            ClaimScope::All => true,
            ClaimScope::Owner(id) => claim.is_owned_by(*id),
        }
    }
}

/// Listing scope for a principal
pub fn scope_for(principal: &Principal) -> ClaimScope {
    match principal.role {
        Role::Employee => ClaimScope::Owner(principal.id),
        Role::Manager | Role::Finance => ClaimScope::All,
    }
}

/// Fails with `Forbidden` when the principal may not view the claim
pub fn can_view(principal: &Principal, claim: &Claim) -> Result<(), ClaimError> {
    if scope_for(principal).admits(claim) {
        Ok(())
    } else {
        Err(ClaimError::forbidden(format!(
            "{} may not view claim {}",
            principal.id,
            claim.id()
        )))
    }
}

/// Keeps only the claims visible to the principal
pub fn list_for(principal: &Principal, claims: impl IntoIterator<Item = Claim>) -> Vec<Claim> {
    let scope = scope_for(principal);
    claims.into_iter().filter(|claim| scope.admits(claim)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_by_role() {
        assert_eq!(
            scope_for(&Principal::employee(4)),
            ClaimScope::Owner(UserId::new(4))
        );
        assert_eq!(scope_for(&Principal::manager(4)), ClaimScope::All);
        assert_eq!(scope_for(&Principal::finance(4)), ClaimScope::All);
    }

    #[test]
    fn test_owner_filter() {
        assert_eq!(ClaimScope::All.owner(), None);
        assert_eq!(ClaimScope::Owner(UserId::new(2)).owner(), Some(UserId::new(2)));
    }
}

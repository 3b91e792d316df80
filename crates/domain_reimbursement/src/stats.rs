//! Claim statistics aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::claim::{Claim, ClaimStatus, StatusBucket};

/// Counts per status bucket and the summed amount of every claim in scope
///
/// "approved" counts manager-approved, finance-approved and completed claims;
/// "rejected" counts rejections at either stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimStats {
    pub submitted: u64,
    pub approved: u64,
    pub rejected: u64,
    pub pending: u64,
    pub total_amount: Decimal,
}

impl ClaimStats {
    /// Folds one claim into the aggregate
    pub fn record(&mut self, status: ClaimStatus, amount: Decimal) {
        self.submitted += 1;
        match status.bucket() {
            StatusBucket::Pending => self.pending += 1,
            StatusBucket::Approved => self.approved += 1,
            StatusBucket::Rejected => self.rejected += 1,
        }
        self.total_amount += amount;
    }

    pub fn from_claims<'a>(claims: impl IntoIterator<Item = &'a Claim>) -> Self {
        claims.into_iter().fold(Self::default(), |mut stats, claim| {
            stats.record(claim.status(), claim.content().amount);
            stats
        })
    }
}

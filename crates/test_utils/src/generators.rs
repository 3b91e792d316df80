//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use core_kernel::{Principal, Role, UserId};
use domain_reimbursement::{ApprovalStage, ClaimContent, ClaimStatus, DecisionAction, ExpenseCategory};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for strictly positive amounts with two decimal places
pub fn positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for zero and negative amounts
pub fn non_positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000_000i64..=0i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for positive amounts with more than two significant decimal places
pub fn over_precise_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64, 3u32..=6u32)
        .prop_map(|(units, scale)| Decimal::new(units, scale))
        .prop_filter("needs a third significant decimal place", |amount| {
            amount.normalize().scale() > 2
        })
}

pub fn category_strategy() -> impl Strategy<Value = ExpenseCategory> {
    proptest::sample::select(ExpenseCategory::ALL.to_vec())
}

pub fn status_strategy() -> impl Strategy<Value = ClaimStatus> {
    proptest::sample::select(ClaimStatus::ALL.to_vec())
}

pub fn role_strategy() -> impl Strategy<Value = Role> {
    proptest::sample::select(Role::ALL.to_vec())
}

pub fn stage_strategy() -> impl Strategy<Value = ApprovalStage> {
    prop_oneof![Just(ApprovalStage::Manager), Just(ApprovalStage::Finance)]
}

pub fn action_strategy() -> impl Strategy<Value = DecisionAction> {
    prop_oneof![Just(DecisionAction::Approve), Just(DecisionAction::Reject)]
}

/// Strategy for text that survives trimming
pub fn non_blank_text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ]{0,30}"
}

/// Strategy for text that is empty after trimming
pub fn blank_text_strategy() -> impl Strategy<Value = String> {
    "[ \t]{0,5}"
}

/// Strategy for valid claim content
pub fn content_strategy() -> impl Strategy<Value = ClaimContent> {
    (
        non_blank_text_strategy(),
        non_blank_text_strategy(),
        category_strategy(),
        positive_amount_strategy(),
        "/uploads/[a-z0-9]{4,12}\\.(png|jpg|pdf)",
    )
        .prop_map(|(title, description, category, amount, receipt_reference)| ClaimContent {
            title,
            description,
            category,
            amount,
            receipt_reference,
        })
}

/// Strategy for a principal of any role, ids in a small range so collisions
/// between owner and actor actually happen
pub fn principal_strategy() -> impl Strategy<Value = Principal> {
    (1i64..6i64, role_strategy()).prop_map(|(id, role)| Principal::new(UserId::new(id), role))
}

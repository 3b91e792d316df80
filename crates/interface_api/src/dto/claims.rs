//! Claims DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_reimbursement::{Claim, ClaimContent, ClaimPatch, DecisionAction, ExpenseCategory, Decision};

use crate::error::ApiError;

/// Body of `POST /claims`
///
/// There is no owner field: the claim always belongs to the caller.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClaimRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub category: String,
    pub amount: Decimal,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub receipt_reference: String,
}

impl CreateClaimRequest {
    pub fn into_content(self) -> Result<ClaimContent, ApiError> {
        Ok(ClaimContent {
            title: self.title,
            description: self.description,
            category: parse_category(&self.category)?,
            amount: self.amount,
            receipt_reference: self.receipt_reference,
        })
    }
}

/// Body of `PUT /claims/:id`; absent fields stay unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateClaimRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub receipt_reference: Option<String>,
}

impl UpdateClaimRequest {
    pub fn into_patch(self) -> Result<ClaimPatch, ApiError> {
        Ok(ClaimPatch {
            title: self.title,
            description: self.description,
            category: self.category.as_deref().map(parse_category).transpose()?,
            amount: self.amount,
            receipt_reference: self.receipt_reference,
        })
    }
}

/// Body of `POST /claims/:id/decisions/:stage`
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub action: DecisionAction,
    pub notes: Option<String>,
}

fn parse_category(value: &str) -> Result<ExpenseCategory, ApiError> {
    value
        .parse()
        .map_err(|e: core_kernel::CoreError| ApiError::Validation(e.to_string()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub actor_id: i64,
    pub notes: Option<String>,
    pub decided_at: DateTime<Utc>,
}

impl From<&Decision> for DecisionResponse {
    fn from(decision: &Decision) -> Self {
        Self {
            actor_id: decision.actor_id.value(),
            notes: decision.notes.clone(),
            decided_at: decision.decided_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub id: i64,
    pub employee_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub receipt_reference: String,
    pub status: String,
    pub manager_decision: Option<DecisionResponse>,
    pub finance_decision: Option<DecisionResponse>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Claim> for ClaimResponse {
    fn from(claim: &Claim) -> Self {
        let content = claim.content();
        Self {
            id: claim.id().value(),
            employee_id: claim.employee_id().value(),
            employee_name: claim.employee_name().map(str::to_owned),
            title: content.title.clone(),
            description: content.description.clone(),
            category: content.category.to_string(),
            amount: content.amount,
            receipt_reference: content.receipt_reference.clone(),
            status: claim.status().to_string(),
            manager_decision: claim.manager_decision().map(DecisionResponse::from),
            finance_decision: claim.finance_decision().map(DecisionResponse::from),
            submitted_at: claim.submitted_at(),
            updated_at: claim.updated_at(),
        }
    }
}

//! Claims handlers
//!
//! Thin adapters: resolve the path, hand the authenticated principal and the
//! decoded body to the service, and render the result.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{ClaimId, Principal};
use domain_reimbursement::{ApprovalStage, ClaimStats};

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

fn parse_claim_id(raw: &str) -> Result<ClaimId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid claim id: {}", raw)))
}

fn render(claims: &[domain_reimbursement::Claim]) -> Json<Vec<ClaimResponse>> {
    Json(claims.iter().map(ClaimResponse::from).collect())
}

/// Submits a claim owned by the caller
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    request.validate()?;
    let content = request.into_content()?;

    let claim = state.service.submit(&principal, content).await?;
    Ok((StatusCode::CREATED, Json(ClaimResponse::from(&claim))))
}

/// Lists the claims visible to the caller
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.service.list(&principal).await?;
    Ok(render(&claims))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.service.get(&principal, parse_claim_id(&id)?).await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Partially updates a pending claim
pub async fn update_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(request): Json<UpdateClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    request.validate()?;
    let patch = request.into_patch()?;

    let claim = state.service.edit(&principal, id, patch).await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Withdraws a pending claim
pub async fn delete_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.withdraw(&principal, parse_claim_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Records a manager or finance decision
pub async fn decide_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((id, stage)): Path<(String, String)>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    let stage: ApprovalStage = stage
        .parse()
        .map_err(|_| ApiError::NotFound(format!("unknown approval stage: {}", stage)))?;

    let claim = state
        .service
        .decide(&principal, id, stage, request.action, request.notes)
        .await?;
    Ok(Json(ClaimResponse::from(&claim)))
}

/// Claims awaiting the caller's approval stage
pub async fn review_queue(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.service.review_queue(&principal).await?;
    Ok(render(&claims))
}

/// Aggregates over the claims visible to the caller
pub async fn claim_stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ClaimStats>, ApiError> {
    Ok(Json(state.service.stats(&principal).await?))
}

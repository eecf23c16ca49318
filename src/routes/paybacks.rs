//! Payback Endpoints
//!
//! 관리자 승인/거부 흐름과 사용자 페이백 조회.
//! admin_id는 요청에 명시적으로 담긴다 (전역 세션에서 읽지 않음).

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Payback;
use crate::{error::ApiError, AppState};

// ============ Request/Response Types ============

/// 페이백 승인 요청
#[derive(Debug, Deserialize)]
pub struct ApprovePaybackRequest {
    pub admin_id: Uuid,
}

/// 페이백 거부 요청
#[derive(Debug, Deserialize)]
pub struct RejectPaybackRequest {
    pub admin_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct PaybackResponse {
    pub mission_id: Uuid,
    pub store_id: i64,
    pub amount: i64,
    pub status: String,
    pub paid_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub payback: PaybackResponse,
}

/// 사용자 페이백 목록 응답
#[derive(Debug, Serialize)]
pub struct UserPaybacksResponse {
    pub user_id: Uuid,
    pub paybacks: Vec<PaybackResponse>,
    /// 지급 완료 총액
    pub total_paid: i64,
}

impl From<Payback> for PaybackResponse {
    fn from(p: Payback) -> Self {
        Self {
            mission_id: p.mission_id,
            store_id: p.store_id,
            amount: p.amount,
            status: p.status,
            paid_at: p.paid_at.map(|t| t.to_rfc3339()),
            rejection_reason: p.rejection_reason,
        }
    }
}

// ============ Handlers ============

/// POST /paybacks/:participation_id/approve
///
/// 페이백 승인. 지점 권한 확인 후 paid로 전이
pub async fn approve_payback(
    State(state): State<AppState>,
    Path(participation_id): Path<Uuid>,
    Json(request): Json<ApprovePaybackRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let payback = state
        .paybacks
        .approve(participation_id, request.admin_id)
        .await?;

    Ok(Json(TransitionResponse {
        success: true,
        payback: payback.into(),
    }))
}

/// POST /paybacks/:participation_id/reject
///
/// 페이백 거부. 사유 필수
pub async fn reject_payback(
    State(state): State<AppState>,
    Path(participation_id): Path<Uuid>,
    Json(request): Json<RejectPaybackRequest>,
) -> Result<Json<TransitionResponse>, ApiError> {
    let payback = state
        .paybacks
        .reject(participation_id, &request.reason, request.admin_id)
        .await?;

    Ok(Json(TransitionResponse {
        success: true,
        payback: payback.into(),
    }))
}

/// GET /paybacks/user/:user_id
///
/// 사용자 페이백 목록 + 지급 완료 총액
pub async fn get_user_paybacks(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserPaybacksResponse>, ApiError> {
    let (paybacks, total_paid) = state.paybacks.list_for_user(user_id).await?;

    Ok(Json(UserPaybacksResponse {
        user_id,
        paybacks: paybacks.into_iter().map(Into::into).collect(),
        total_paid,
    }))
}

//! Admin Endpoints
//!
//! 지점 범위 관리자 권한 조회. 판정 로직은 AuthorizationService 소유.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, AppState};

/// 권한 조회 쿼리
#[derive(Debug, Deserialize)]
pub struct PermissionQuery {
    /// 특정 지점 지정. 없으면 "활성 배정이 하나라도 있는가"로 판정.
    pub store_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub success: bool,
    pub has_access: bool,
}

/// GET /admin/:admin_id/permissions?store_id=1
///
/// 관리자의 지점 접근 권한 확인
pub async fn check_permissions(
    State(state): State<AppState>,
    Path(admin_id): Path<Uuid>,
    Query(query): Query<PermissionQuery>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let has_access = state.authz.can_act(admin_id, query.store_id).await?;

    Ok(Json(PermissionResponse {
        success: true,
        has_access,
    }))
}

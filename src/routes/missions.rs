//! Mission Completion Endpoint
//!
//! 완료된 미션 참여에 대한 보상 파이프라인 트리거.
//! 참여 상태 전이 자체는 외부 Mission Workflow가 담당한다.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::services::CompletionOutcome;
use crate::{error::ApiError, AppState};

/// POST /missions/:participation_id/complete
///
/// 경험치 지급 → 스트릭 갱신 → 뱃지 평가 순서로 보상 처리
pub async fn complete_mission(
    State(state): State<AppState>,
    Path(participation_id): Path<Uuid>,
) -> Result<Json<CompletionOutcome>, ApiError> {
    let outcome = state.engine.process_completion(participation_id).await?;
    Ok(Json(outcome))
}

//! Notification Endpoints
//!
//! 엔진이 기록한 알림의 조회. 전달(푸시 등)은 범위 밖.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, AppState};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationItem {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub user_id: Uuid,
    pub notifications: Vec<NotificationItem>,
}

/// GET /notifications/:user_id?limit=20
///
/// 사용자 알림 목록 (최신순, 최대 100건)
pub async fn get_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let notifications = state
        .notifications
        .list(user_id, limit)
        .await?
        .into_iter()
        .map(|n| NotificationItem {
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            data: n.data,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        })
        .collect();

    Ok(Json(NotificationsResponse {
        user_id,
        notifications,
    }))
}

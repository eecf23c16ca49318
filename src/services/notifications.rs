//! Notification Emitter Service
//!
//! 엔진이 만들어내는 사용자-가시 이벤트(레벨업, 스트릭 보너스, 뱃지 획득,
//! 페이백 지급/거부)를 기록한다. 실제 전달(푸시, 인앱 폴링)은 범위 밖.
//!
//! 알림 기록 실패는 로그만 남기고 삼킨다. 알림은 부수 효과일 뿐,
//! 그것을 촉발한 상태 전이를 실패시켜서는 안 됨.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{Notification, NotificationStore};
use crate::error::ApiError;

pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// 알림 기록 (best-effort)
    pub async fn emit(
        &self,
        user_id: Uuid,
        notification_type: &str,
        title: impl Into<String>,
        message: impl Into<String>,
        data: serde_json::Value,
    ) {
        let notification = Notification {
            user_id,
            notification_type: notification_type.to_string(),
            title: title.into(),
            message: message.into(),
            data,
            is_read: false,
            created_at: Utc::now(),
        };

        if let Err(err) = self.store.insert(&notification).await {
            tracing::warn!(
                user_id = %user_id,
                notification_type,
                "failed to record notification: {:?}",
                err
            );
        }
    }

    /// 사용자 알림 목록 조회 (최신순)
    pub async fn list(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, ApiError> {
        Ok(self.store.list_for_user(user_id, limit).await?)
    }
}

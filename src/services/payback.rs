//! Payback State Machine Service
//!
//! 미션 참여에 대한 현금 보상의 수명주기: pending → paid (승인)
//! 또는 pending → rejected (거부, 사유 필수).
//!
//! # Design Decision
//!
//! - (user_id, mission_id) 키 upsert라 같은 참여를 재처리해도 중복 지급 행이
//!   생기지 않음
//! - 종결 상태는 진짜 종결: 같은 전이의 재시도는 멱등 성공(쓰기 없음),
//!   반대 전이는 Conflict (paid를 rejected로 조용히 덮어쓸 수 없다)
//! - 권한 확인(지점 범위)에 실패하면 어떤 쓰기도 일어나지 않음

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{ParticipationStore, Payback, PaybackStore};
use crate::error::ApiError;
use crate::services::authorization::AuthorizationService;
use crate::services::notifications::NotificationService;
use crate::types::PaybackStatus;

pub struct PaybackService {
    participations: Arc<dyn ParticipationStore>,
    paybacks: Arc<dyn PaybackStore>,
    authz: Arc<AuthorizationService>,
    notifier: Arc<NotificationService>,
}

impl PaybackService {
    pub fn new(
        participations: Arc<dyn ParticipationStore>,
        paybacks: Arc<dyn PaybackStore>,
        authz: Arc<AuthorizationService>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            participations,
            paybacks,
            authz,
            notifier,
        }
    }

    /// 페이백 승인
    ///
    /// 참여의 미션 보상 금액으로 paid 상태 페이백을 기록한다.
    pub async fn approve(
        &self,
        participation_id: Uuid,
        admin_id: Uuid,
    ) -> Result<Payback, ApiError> {
        self.transition(participation_id, admin_id, PaybackStatus::Paid, None)
            .await
    }

    /// 페이백 거부
    ///
    /// 빈 사유는 검증 실패.
    pub async fn reject(
        &self,
        participation_id: Uuid,
        reason: &str,
        admin_id: Uuid,
    ) -> Result<Payback, ApiError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::ValidationError(
                "rejection reason must not be empty".to_string(),
            ));
        }

        self.transition(
            participation_id,
            admin_id,
            PaybackStatus::Rejected,
            Some(reason.to_string()),
        )
        .await
    }

    /// 사용자 페이백 목록 + 지급 완료 총액
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<(Vec<Payback>, i64), ApiError> {
        let paybacks = self.paybacks.list_for_user(user_id).await?;
        let total_paid = self.paybacks.total_paid(user_id).await?;
        Ok((paybacks, total_paid))
    }

    async fn transition(
        &self,
        participation_id: Uuid,
        admin_id: Uuid,
        target: PaybackStatus,
        rejection_reason: Option<String>,
    ) -> Result<Payback, ApiError> {
        // 미션 참여 정보 조회 (보상 금액과 지점은 미션 정의에서)
        let participation = self
            .participations
            .find(participation_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("mission participation".to_string()))?;

        // 지점 권한 확인. 거부 시 어떤 쓰기도 없음
        if !self
            .authz
            .can_act(admin_id, Some(participation.store_id))
            .await?
        {
            return Err(ApiError::PermissionDenied(
                "해당 지점에 대한 권한이 없습니다".to_string(),
            ));
        }

        // 종결 상태 확인: 같은 전이는 멱등, 반대 전이는 충돌
        if let Some(existing) = self
            .paybacks
            .find(participation.user_id, participation.mission_id)
            .await?
        {
            if let Ok(status) = existing.status.parse::<PaybackStatus>() {
                if status.is_terminal() {
                    if status == target {
                        return Ok(existing);
                    }
                    return Err(ApiError::Conflict(format!(
                        "payback already {} for this participation",
                        existing.status
                    )));
                }
            }
        }

        let now = Utc::now();
        let payback = Payback {
            user_id: participation.user_id,
            mission_id: participation.mission_id,
            store_id: participation.store_id,
            amount: participation.reward_amount,
            status: target.as_str().to_string(),
            paid_at: (target == PaybackStatus::Paid).then_some(now),
            rejection_reason,
            updated_at: now,
        };

        self.paybacks.upsert(&payback).await?;

        tracing::info!(
            participation_id = %participation_id,
            admin_id = %admin_id,
            user_id = %payback.user_id,
            amount = payback.amount,
            status = %payback.status,
            "payback transitioned"
        );

        match target {
            PaybackStatus::Paid => {
                self.notifier
                    .emit(
                        payback.user_id,
                        "payback_paid",
                        "💰 페이백 지급 완료!",
                        format!("{}원이 지급되었습니다.", payback.amount),
                        serde_json::json!({ "mission_id": payback.mission_id, "amount": payback.amount }),
                    )
                    .await;
            }
            PaybackStatus::Rejected => {
                self.notifier
                    .emit(
                        payback.user_id,
                        "payback_rejected",
                        "페이백 거부 안내",
                        format!(
                            "페이백이 거부되었습니다. 사유: {}",
                            payback.rejection_reason.as_deref().unwrap_or("-")
                        ),
                        serde_json::json!({ "mission_id": payback.mission_id }),
                    )
                    .await;
            }
            PaybackStatus::Pending => unreachable!("transition target is always terminal"),
        }

        Ok(payback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MemoryStore;
    use crate::db::MissionParticipation;

    fn service() -> (Arc<MemoryStore>, PaybackService) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(NotificationService::new(store.clone()));
        let authz = Arc::new(AuthorizationService::new(store.clone()));
        let service = PaybackService::new(store.clone(), store.clone(), authz, notifier);
        (store, service)
    }

    fn seed_world(store: &MemoryStore) -> (Uuid, Uuid, MissionParticipation) {
        let admin_id = Uuid::new_v4();
        store.seed_admin(admin_id, "store_admin");
        store.seed_assignment(admin_id, 1, true);

        let participation = MissionParticipation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            mission_id: Uuid::new_v4(),
            store_id: 1,
            mission_type: "challenge".to_string(),
            reward_amount: 30000,
            status: "completed".to_string(),
            proof_data: None,
            started_at: None,
            completed_at: Some(Utc::now()),
        };
        store.seed_participation(participation.clone());

        (admin_id, participation.user_id, participation)
    }

    #[tokio::test]
    async fn test_approve_creates_paid_payback_with_mission_reward() {
        let (store, service) = service();
        let (admin_id, user_id, participation) = seed_world(&store);

        let payback = service.approve(participation.id, admin_id).await.unwrap();

        assert_eq!(payback.status, "paid");
        assert_eq!(payback.amount, 30000);
        assert!(payback.paid_at.is_some());

        let stored = store.payback_of(user_id, participation.mission_id).unwrap();
        assert_eq!(stored.status, "paid");
        assert!(store
            .notifications_of(user_id)
            .iter()
            .any(|n| n.notification_type == "payback_paid"));
    }

    #[tokio::test]
    async fn test_reject_requires_reason() {
        let (store, service) = service();
        let (admin_id, user_id, participation) = seed_world(&store);

        for reason in ["", "   "] {
            let err = service
                .reject(participation.id, reason, admin_id)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(_)));
        }
        assert!(store.payback_of(user_id, participation.mission_id).is_none());
    }

    #[tokio::test]
    async fn test_reject_records_reason_without_paid_at() {
        let (store, service) = service();
        let (admin_id, user_id, participation) = seed_world(&store);

        let payback = service
            .reject(participation.id, "인증 자료 불충분", admin_id)
            .await
            .unwrap();

        assert_eq!(payback.status, "rejected");
        assert!(payback.paid_at.is_none());
        assert_eq!(payback.rejection_reason.as_deref(), Some("인증 자료 불충분"));
        assert!(store.payback_of(user_id, participation.mission_id).is_some());
    }

    #[tokio::test]
    async fn test_unauthorized_admin_cannot_write() {
        let (store, service) = service();
        let (_, user_id, participation) = seed_world(&store);

        // 다른 지점에만 배정된 관리자
        let outsider = Uuid::new_v4();
        store.seed_admin(outsider, "store_admin");
        store.seed_assignment(outsider, 2, true);

        let err = service.approve(participation.id, outsider).await.unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));

        let err = service
            .reject(participation.id, "사유", outsider)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PermissionDenied(_)));

        // 쓰기 없음
        assert!(store.payback_of(user_id, participation.mission_id).is_none());
    }

    #[tokio::test]
    async fn test_unknown_participation_is_not_found() {
        let (store, service) = service();
        let (admin_id, _, _) = seed_world(&store);

        let err = service.approve(Uuid::new_v4(), admin_id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_approve_is_idempotent() {
        let (store, service) = service();
        let (admin_id, user_id, participation) = seed_world(&store);

        let first = service.approve(participation.id, admin_id).await.unwrap();
        let second = service.approve(participation.id, admin_id).await.unwrap();

        assert_eq!(first.paid_at, second.paid_at); // 재승인은 쓰기 없이 기존 행 반환
        assert_eq!(store.payback_count(), 1);
        let stored = store.payback_of(user_id, participation.mission_id).unwrap();
        assert_eq!(stored.status, "paid");
    }

    #[tokio::test]
    async fn test_terminal_state_blocks_opposite_transition() {
        let (store, service) = service();
        let (admin_id, user_id, participation) = seed_world(&store);

        service.approve(participation.id, admin_id).await.unwrap();

        // paid → rejected는 충돌, 행은 paid 그대로 정확히 1개
        let err = service
            .reject(participation.id, "뒤늦은 사유", admin_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        assert_eq!(store.payback_count(), 1);
        let stored = store.payback_of(user_id, participation.mission_id).unwrap();
        assert_eq!(stored.status, "paid");

        // 반대 방향도 동일: rejected → paid
        let (store, service) = self::service();
        let (admin_id, user_id, participation) = seed_world(&store);
        service
            .reject(participation.id, "인증 실패", admin_id)
            .await
            .unwrap();
        let err = service.approve(participation.id, admin_id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        let stored = store.payback_of(user_id, participation.mission_id).unwrap();
        assert_eq!(stored.status, "rejected");
    }

    #[tokio::test]
    async fn test_super_admin_can_approve_any_store() {
        let (store, service) = service();
        let (_, _, participation) = seed_world(&store);

        let super_admin = Uuid::new_v4();
        store.seed_admin(super_admin, "super_admin");

        let payback = service.approve(participation.id, super_admin).await.unwrap();
        assert_eq!(payback.status, "paid");
    }
}

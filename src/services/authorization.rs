//! Authorization Gate
//!
//! 관리자가 지점 범위 리소스에 대해 행동할 수 있는지 판정하는 순수 읽기 게이트.
//!
//! # Design Decision
//!
//! "현재 관리자"를 전역 세션에서 읽지 않고 모든 호출에 admin_id를 명시적으로
//! 전달받는다. 권한 판정이 호출 문맥과 분리되어 테스트/감사가 쉬움.

use std::sync::Arc;

use uuid::Uuid;

use crate::db::AdminStore;
use crate::error::ApiError;
use crate::types::AdminRole;

pub struct AuthorizationService {
    admins: Arc<dyn AdminStore>,
}

impl AuthorizationService {
    pub fn new(admins: Arc<dyn AdminStore>) -> Self {
        Self { admins }
    }

    /// 관리자 권한 확인
    ///
    /// - 존재하지 않는 관리자: `Ok(false)` (에러 아님)
    /// - super_admin: 항상 허용
    /// - store_admin: 활성 지점 배정 필요. `store_id`가 주어지면 정확히
    ///   그 지점에 대한 활성 배정이 있어야 하고, 없으면 "임의의 활성 배정
    ///   하나라도 있는가"로 판정 (목록 조회용)
    ///
    /// 저장소 조회 자체가 실패한 경우에만 에러를 반환한다.
    pub async fn can_act(&self, admin_id: Uuid, store_id: Option<i64>) -> Result<bool, ApiError> {
        let Some(admin) = self.admins.find_admin(admin_id).await? else {
            tracing::debug!(admin_id = %admin_id, "permission check for unknown admin");
            return Ok(false);
        };

        // 슈퍼관리자는 모든 지점 권한
        if matches!(admin.role.parse(), Ok(AdminRole::SuperAdmin)) {
            return Ok(true);
        }

        let has_access = self.admins.has_active_assignment(admin_id, store_id).await?;
        tracing::debug!(
            admin_id = %admin_id,
            store_id = ?store_id,
            has_access,
            "permission check"
        );

        Ok(has_access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MemoryStore;

    fn service() -> (Arc<MemoryStore>, AuthorizationService) {
        let store = Arc::new(MemoryStore::new());
        let service = AuthorizationService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_unknown_admin_is_denied_without_error() {
        let (_, service) = service();
        let allowed = service.can_act(Uuid::new_v4(), Some(1)).await.unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_super_admin_bypasses_store_assignments() {
        let (store, service) = service();
        let admin_id = Uuid::new_v4();
        store.seed_admin(admin_id, "super_admin");

        assert!(service.can_act(admin_id, Some(99)).await.unwrap());
        assert!(service.can_act(admin_id, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_admin_requires_active_assignment_for_exact_store() {
        let (store, service) = service();
        let admin_id = Uuid::new_v4();
        store.seed_admin(admin_id, "store_admin");
        store.seed_assignment(admin_id, 1, true);
        store.seed_assignment(admin_id, 2, false);

        assert!(service.can_act(admin_id, Some(1)).await.unwrap());
        // 비활성 배정은 권한 없음
        assert!(!service.can_act(admin_id, Some(2)).await.unwrap());
        // 배정 자체가 없는 지점
        assert!(!service.can_act(admin_id, Some(3)).await.unwrap());
        // 지점 미지정: 활성 배정 하나라도 있으면 허용
        assert!(service.can_act(admin_id, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_with_only_inactive_assignments_is_denied() {
        let (store, service) = service();
        let admin_id = Uuid::new_v4();
        store.seed_admin(admin_id, "store_admin");
        store.seed_assignment(admin_id, 1, false);

        assert!(!service.can_act(admin_id, None).await.unwrap());
    }
}

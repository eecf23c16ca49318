//! Repository Pattern Implementation
//!
//! # Interview Q&A
//!
//! Q: Repository 패턴이란?
//! A: 데이터 접근 로직을 추상화하는 패턴
//!
//!    장점:
//!    - 비즈니스 로직(서비스 레이어)과 데이터 접근 분리
//!    - 테스트 시 Mock 구현 쉬움
//!    - DB 교체 시 영향 최소화
//!
//! Q: 엔진이 trait 뒤에서만 저장소에 접근하는 이유는?
//! A: 영속 계층은 외부 컬래버레이터 (get / upsert / filtered update)
//!    - 보상 계산 규칙은 저장소 종류와 무관하게 검증 가능해야 함
//!    - 서비스 테스트는 전부 MemoryStore로 돌고 Postgres 없이 통과
//!
//! PostgreSQL 구현은 db/mod.rs의 Database 구조체에 있음.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{
    AdminAccount, MissionParticipation, Notification, Payback, Streak, UserBadge,
    UserProgression,
};

/// 사용자 진행도 저장소
///
/// `save`는 compare-and-swap: `expected_version`이 현재 행과 다르면
/// 쓰지 않고 false를 반환한다 (동시 완료 처리 간 갱신 유실 방지).
#[async_trait]
pub trait ProgressionStore: Send + Sync {
    /// 조회, 없으면 레벨 1 / 경험치 0으로 생성
    async fn get_or_create(&self, user_id: Uuid) -> Result<UserProgression>;

    /// 버전 일치 시에만 저장. 저장되면 true.
    async fn save(&self, progression: &UserProgression, expected_version: i64) -> Result<bool>;
}

/// 스트릭 저장소
#[async_trait]
pub trait StreakStore: Send + Sync {
    async fn find(&self, user_id: Uuid, activity_type: &str) -> Result<Option<Streak>>;

    /// 조회, 없으면 current_count = 0으로 생성
    async fn get_or_create(
        &self,
        user_id: Uuid,
        activity_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Streak>;

    /// CAS 저장 (ProgressionStore::save와 동일한 계약)
    async fn save(&self, streak: &Streak, expected_version: i64) -> Result<bool>;
}

/// 획득 뱃지 저장소
#[async_trait]
pub trait BadgeStore: Send + Sync {
    async fn earned_badge_ids(&self, user_id: Uuid) -> Result<Vec<String>>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserBadge>>;

    /// 지급 시도. (user_id, badge_id) 유니크 키로 이미 있으면 false,
    /// 동시 평가가 겹쳐도 뱃지는 1회만 지급됨.
    async fn award(&self, user_id: Uuid, badge_id: &str, earned_at: DateTime<Utc>) -> Result<bool>;
}

/// 미션 참여 저장소 (외부 소유, 읽기 전용)
#[async_trait]
pub trait ParticipationStore: Send + Sync {
    async fn find(&self, participation_id: Uuid) -> Result<Option<MissionParticipation>>;

    /// 완료된 참여 수 (mission_type 주어지면 해당 타입만)
    async fn count_completed(&self, user_id: Uuid, mission_type: Option<&str>) -> Result<i64>;
}

/// 페이백 저장소
#[async_trait]
pub trait PaybackStore: Send + Sync {
    async fn find(&self, user_id: Uuid, mission_id: Uuid) -> Result<Option<Payback>>;

    /// (user_id, mission_id) 키 upsert
    async fn upsert(&self, payback: &Payback) -> Result<()>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Payback>>;

    /// status = paid인 페이백 총액
    async fn total_paid(&self, user_id: Uuid) -> Result<i64>;
}

/// 관리자/지점 배정 저장소 (외부 소유, 읽기 전용)
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn find_admin(&self, admin_id: Uuid) -> Result<Option<AdminAccount>>;

    /// 활성 지점 배정 존재 여부. store_id가 주어지면 해당 지점에 한정.
    async fn has_active_assignment(&self, admin_id: Uuid, store_id: Option<i64>) -> Result<bool>;
}

/// 친구 추천 집계 (외부 소유, 읽기 전용)
#[async_trait]
pub trait ReferralStore: Send + Sync {
    async fn count_verified(&self, referrer_id: Uuid) -> Result<i64>;
}

/// 알림 저장소
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<()>;

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>>;
}

/// 쿠폰 발급 저장소 (레벨 마일스톤 보상)
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn issue(&self, user_id: Uuid, coupon_code: &str) -> Result<()>;
}

// 테스트용 인메모리 구현:

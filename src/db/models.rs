//! Database Models
//!
//! 보상/진행도 엔진이 다루는 행 구조체.
//! 상태/타입 컬럼은 TEXT로 저장하고 서비스 레이어에서 enum으로 변환한다.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// 사용자 진행도 (레벨/경험치)
///
/// 불변식: `level == total_experience / 100 + 1`,
///         `experience_points == total_experience % 100`
///
/// 첫 조회 시 레벨 1, 경험치 0으로 생성되며 삭제되지 않음.
/// `version`은 read-modify-write 경합 방지용 CAS 필드.
#[derive(Debug, Clone, FromRow)]
pub struct UserProgression {
    pub user_id: Uuid,

    /// 현재 레벨 (>= 1)
    pub level: i32,

    /// 현재 레벨 내 진행 경험치 (0..99)
    pub experience_points: i32,

    /// 누적 총 경험치
    pub total_experience: i64,

    /// 낙관적 잠금 버전
    pub version: i64,

    pub updated_at: DateTime<Utc>,
}

impl UserProgression {
    /// 신규 사용자 기본값
    pub fn fresh(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            level: 1,
            experience_points: 0,
            total_experience: 0,
            version: 0,
            updated_at: now,
        }
    }
}

/// 연속 참여 스트릭
///
/// (user_id, activity_type) 당 1행. activity_type은 daily_login 또는 미션 타입.
#[derive(Debug, Clone, FromRow)]
pub struct Streak {
    pub user_id: Uuid,

    /// daily_login | challenge | sns | review | referral | attendance
    pub activity_type: String,

    /// 현재 연속 일수
    pub current_count: i32,

    /// 역대 최장 연속 일수
    pub max_count: i32,

    /// 마지막 활동 시각
    pub last_activity_at: DateTime<Utc>,

    /// 보너스 배수 (1.0 ~ 3.0), 다른 서브시스템에서 소비 가능하도록 공개
    pub bonus_multiplier: f64,

    /// 낙관적 잠금 버전
    pub version: i64,
}

/// 획득한 뱃지
///
/// (user_id, badge_id) 유니크. 뱃지는 사용자당 평생 1회만 지급됨
#[derive(Debug, Clone, FromRow)]
pub struct UserBadge {
    pub user_id: Uuid,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

/// 미션 참여 (외부 Mission Workflow 소유, 읽기 전용)
///
/// mission_definitions 조인을 포함한 read model.
/// 페이백 금액과 미션 타입은 미션 정의에서 가져옴
#[derive(Debug, Clone, FromRow)]
pub struct MissionParticipation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub store_id: i64,

    /// 미션 타입 (mission_definitions.mission_type)
    pub mission_type: String,

    /// 고정 보상 금액 (mission_definitions.reward_amount, 원 단위)
    pub reward_amount: i64,

    /// pending | in_progress | completed | rejected
    pub status: String,

    /// 인증 자료 (스크린샷 URL, 퀴즈 답안 등)
    pub proof_data: Option<serde_json::Value>,

    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// 페이백 (현금 보상)
///
/// (user_id, mission_id) 키로 upsert. 같은 참여 재처리 시 중복 지급 없음
#[derive(Debug, Clone, FromRow)]
pub struct Payback {
    pub user_id: Uuid,
    pub mission_id: Uuid,
    pub store_id: i64,

    /// 지급 금액 (원 단위, >= 0)
    pub amount: i64,

    /// pending | paid | rejected
    pub status: String,

    pub paid_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// 관리자 계정 (외부 소유, 읽기 전용)
#[derive(Debug, Clone, FromRow)]
pub struct AdminAccount {
    pub id: Uuid,

    /// super_admin | store_admin
    pub role: String,
}

/// 사용자 알림
///
/// 엔진이 생성하는 사용자-가시 이벤트 기록. 전달(푸시 등)은 범위 밖.
#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub user_id: Uuid,

    /// level_up | streak_bonus | badge_earned | payback_paid | payback_rejected
    pub notification_type: String,

    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

//! Services Module
//!
//! 보상/진행도 엔진의 비즈니스 로직 레이어
//!
//! # Services
//! - `AuthorizationService`: 지점 범위 관리자 권한 게이트
//! - `ProgressionService`: 레벨/경험치 원장
//! - `StreakService`: 연속 참여 추적
//! - `BadgeService`: 뱃지 조건 평가 및 지급
//! - `PaybackService`: 페이백 승인/거부 상태 기계
//! - `NotificationService`: 알림 기록 (best-effort)
//! - `RewardEngine`: 미션 완료 오케스트레이션

mod authorization;
mod badges;
mod engine;
mod notifications;
mod payback;
mod progression;
mod streak;

pub use authorization::AuthorizationService;
pub use badges::BadgeService;
pub use engine::{CompletionOutcome, RewardEngine};
pub use notifications::NotificationService;
pub use payback::PaybackService;
pub use progression::{ExperienceGrant, ProgressionService};
pub use streak::{StreakService, StreakUpdate};

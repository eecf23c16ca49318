//! Mission Payback API Library
//!
//! # Overview
//!
//! 이 라이브러리는 운전학원 프랜차이즈 미션/페이백 플랫폼의
//! 보상 및 진행도 정산 엔진을 제공합니다.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌─────────┐    │
//! │  │ Routes  │  │Services │  │   DB    │  │  Types  │    │
//! │  └────┬────┘  └────┬────┘  └────┬────┘  └────┬────┘    │
//! │       │            │            │            │          │
//! │       └────────────┴────────────┴────────────┘          │
//! │                         │                                │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │
//!                           ▼
//!                  ┌────────────────┐
//!                  │   PostgreSQL   │
//!                  └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `rules`: 보상 규칙 (미션 경험치, 레벨 마일스톤, 뱃지 카탈로그)
//! - `error`: 에러 타입 및 처리
//! - `routes`: HTTP 엔드포인트 핸들러
//! - `services`: 비즈니스 로직 (진행도, 스트릭, 뱃지, 페이백, 오케스트레이션)
//! - `db`: 데이터베이스 연동
//! - `types`: 공통 타입 정의
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mission_payback_api::{config::Config, db::Database, rules::RewardRules};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let rules = RewardRules::load(&config.reward_rules_path)?;
//!     let db = Database::connect(&config.database_url).await?;
//!
//!     // ... 서버 시작
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod rules;
pub mod services;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use db::Database;
pub use error::ApiError;
pub use rules::RewardRules;
pub use services::{
    AuthorizationService, BadgeService, NotificationService, PaybackService, ProgressionService,
    RewardEngine, StreakService,
};

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Database>,
    pub engine: Arc<RewardEngine>,
    pub progression: Arc<ProgressionService>,
    pub streaks: Arc<StreakService>,
    pub badges: Arc<BadgeService>,
    pub paybacks: Arc<PaybackService>,
    pub authz: Arc<AuthorizationService>,
    pub notifications: Arc<NotificationService>,
}

//! Mission Payback API Server
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Client (앱 / 관리자 대시보드)                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum Web Server                         │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                      Routes Layer                        ││
//! │  │  /health  /missions/*  /paybacks/*  /progression/*      ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Services Layer                        ││
//! │  │  RewardEngine  Progression  Streak  Badge  Payback      ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    Data Layer                            ││
//! │  │  PostgreSQL Repository (버전 컬럼 기반 CAS)              ││
//! │  └─────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// 라이브러리에서 가져오기
use mission_payback_api::{
    routes, AppState, AuthorizationService, BadgeService, Config, Database, NotificationService,
    PaybackService, ProgressionService, RewardEngine, RewardRules, StreakService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    // RUST_LOG=debug,sqlx=warn 형태로 레벨 제어 가능
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mission_payback_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Mission Payback API Server");

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("📋 Configuration loaded");

    // 보상 규칙 로드 (시작 시점 검증, 잘못된 규칙이면 즉시 실패)
    let rules = Arc::new(RewardRules::load(&config.reward_rules_path)?);
    tracing::info!(
        badges = rules.badges.len(),
        milestones = rules.level_milestones.len(),
        "🎯 Reward rules loaded"
    );

    // 데이터베이스 연결
    let db = Arc::new(Database::connect(&config.database_url).await?);
    tracing::info!("🗄️  Database connected");

    // 마이그레이션 실행
    db.run_migrations().await?;
    tracing::info!("📦 Migrations completed");

    // 서비스 초기화
    // Database 하나가 모든 저장소 트레이트를 구현하므로 Arc 클론으로 주입
    let notifications = Arc::new(NotificationService::new(db.clone()));
    let authz = Arc::new(AuthorizationService::new(db.clone()));
    let progression = Arc::new(ProgressionService::new(
        db.clone(),
        db.clone(),
        notifications.clone(),
        rules.clone(),
    ));
    let streaks = Arc::new(StreakService::new(
        db.clone(),
        progression.clone(),
        notifications.clone(),
    ));
    let badges = Arc::new(BadgeService::new(
        rules.clone(),
        db.clone(),
        db.clone(),
        db.clone(),
        db.clone(),
        db.clone(),
        notifications.clone(),
    ));
    let paybacks = Arc::new(PaybackService::new(
        db.clone(),
        db.clone(),
        authz.clone(),
        notifications.clone(),
    ));
    let engine = Arc::new(RewardEngine::new(
        db.clone(),
        progression.clone(),
        streaks.clone(),
        badges.clone(),
        rules,
    ));
    tracing::info!("⚙️  Services initialized");

    // 앱 상태 구성
    let state = AppState {
        config: Arc::new(config.clone()),
        db,
        engine,
        progression,
        streaks,
        badges,
        paybacks,
        authz,
        notifications,
    };

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🌐 Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health                              - 서버 상태 확인
///
/// POST /missions/:participation_id/complete - 완료 보상 파이프라인
///
/// POST /experience                          - 경험치 지급
/// GET  /progression/:user_id                - 진행도 조회
///
/// POST /streak                              - 스트릭 갱신
/// GET  /streak/:user_id                     - 스트릭 조회
///
/// POST /badges/check                        - 뱃지 평가/지급
/// GET  /badges/:user_id                     - 획득 뱃지 목록
///
/// POST /paybacks/:participation_id/approve  - 페이백 승인
/// POST /paybacks/:participation_id/reject   - 페이백 거부
/// GET  /paybacks/user/:user_id              - 사용자 페이백 목록
///
/// GET  /admin/:admin_id/permissions         - 관리자 지점 권한 확인
/// GET  /notifications/:user_id              - 알림 목록
/// ```
fn create_router(state: AppState) -> Router {
    // CORS 설정
    // 프로덕션에서는 특정 도메인만 허용
    // 개발 환경에서는 localhost 허용
    let cors = if state.config.is_production() {
        // 프로덕션: 특정 도메인만 허용 (환경변수로 설정)
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "https://yourdomain.com".to_string());
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    } else {
        // 개발: localhost 허용
        CorsLayer::new()
            .allow_origin([
                "http://localhost:5173".parse().unwrap(), // Vite dev server
                "http://localhost:3000".parse().unwrap(), // Alternative
                "http://127.0.0.1:5173".parse().unwrap(),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        // Health check
        .route("/health", get(routes::health::health_check))
        // Mission completion
        .route(
            "/missions/:participation_id/complete",
            post(routes::missions::complete_mission),
        )
        // Progression
        .route("/experience", post(routes::gamification::add_experience))
        .route(
            "/progression/:user_id",
            get(routes::gamification::get_progression),
        )
        // Streak
        .route("/streak", post(routes::gamification::update_streak))
        .route("/streak/:user_id", get(routes::gamification::get_streak))
        // Badges
        .route("/badges/check", post(routes::gamification::check_badges))
        .route("/badges/:user_id", get(routes::gamification::get_badges))
        // Paybacks
        .route(
            "/paybacks/:participation_id/approve",
            post(routes::paybacks::approve_payback),
        )
        .route(
            "/paybacks/:participation_id/reject",
            post(routes::paybacks::reject_payback),
        )
        .route(
            "/paybacks/user/:user_id",
            get(routes::paybacks::get_user_paybacks),
        )
        // Admin
        .route(
            "/admin/:admin_id/permissions",
            get(routes::admin::check_permissions),
        )
        // Notifications
        .route(
            "/notifications/:user_id",
            get(routes::notifications::get_notifications),
        )
        // 미들웨어
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // 상태 주입
        .with_state(state)
}

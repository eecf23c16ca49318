//! Gamification Endpoints
//!
//! 경험치 지급 / 스트릭 갱신 / 뱃지 평가 및 진행도 조회 핸들러.
//! 입력 검증은 경계에서, 규칙 적용은 서비스 레이어에서.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::{ExperienceGrant, StreakUpdate};
use crate::types::{BadgeRarity, StreakActivity};
use crate::{error::ApiError, AppState};

// ============ Request/Response Types ============

/// 경험치 지급 요청
#[derive(Debug, Deserialize)]
pub struct AddExperienceRequest {
    pub user_id: Uuid,
    pub points: i64,
    /// 지급 출처 (기본값: mission_complete)
    pub source: Option<String>,
}

/// 스트릭 갱신 요청
#[derive(Debug, Deserialize)]
pub struct UpdateStreakRequest {
    pub user_id: Uuid,
    pub activity: StreakActivity,
}

/// 뱃지 평가 요청
#[derive(Debug, Deserialize)]
pub struct CheckBadgesRequest {
    pub user_id: Uuid,
}

/// 진행도 조회 응답
#[derive(Debug, Serialize)]
pub struct ProgressionResponse {
    pub user_id: Uuid,
    pub level: i32,
    /// 현재 레벨 내 진행 경험치 (0..99)
    pub experience_points: i32,
    pub total_experience: i64,
    pub last_updated: String,
}

/// 스트릭 조회 쿼리
#[derive(Debug, Deserialize)]
pub struct StreakQuery {
    /// 기본값: daily_login
    pub activity: Option<StreakActivity>,
}

/// 스트릭 조회 응답
#[derive(Debug, Serialize)]
pub struct StreakResponse {
    pub user_id: Uuid,
    pub activity: StreakActivity,
    pub current_count: i32,
    pub max_count: i32,
    /// 다른 서브시스템이 소비할 수 있는 보너스 배수 (1.0 ~ 3.0)
    pub bonus_multiplier: f64,
    pub last_activity_at: Option<String>,
}

/// 획득 뱃지 응답 항목 (카탈로그 메타데이터 조인)
#[derive(Debug, Serialize)]
pub struct EarnedBadge {
    pub badge_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<BadgeRarity>,
    pub earned_at: String,
}

#[derive(Debug, Serialize)]
pub struct EarnedBadgesResponse {
    pub user_id: Uuid,
    pub badges: Vec<EarnedBadge>,
}

/// 뱃지 평가 응답 (새로 지급된 뱃지만)
#[derive(Debug, Serialize)]
pub struct NewBadgesResponse {
    pub new_badges: Vec<EarnedBadge>,
}

// ============ Handlers ============

/// POST /experience
///
/// 경험치 지급. 레벨업 시 마일스톤 보상은 서비스가 처리.
pub async fn add_experience(
    State(state): State<AppState>,
    Json(request): Json<AddExperienceRequest>,
) -> Result<Json<ExperienceGrant>, ApiError> {
    let source = request.source.as_deref().unwrap_or("mission_complete");
    let grant = state
        .progression
        .add_experience(request.user_id, request.points, source)
        .await?;
    Ok(Json(grant))
}

/// POST /streak
///
/// 스트릭 갱신 (일일 로그인, 미션 완료 등)
pub async fn update_streak(
    State(state): State<AppState>,
    Json(request): Json<UpdateStreakRequest>,
) -> Result<Json<StreakUpdate>, ApiError> {
    let update = state
        .streaks
        .update_streak(request.user_id, request.activity)
        .await?;
    Ok(Json(update))
}

/// POST /badges/check
///
/// 뱃지 조건 평가 및 미획득 뱃지 지급
pub async fn check_badges(
    State(state): State<AppState>,
    Json(request): Json<CheckBadgesRequest>,
) -> Result<Json<NewBadgesResponse>, ApiError> {
    let now = chrono::Utc::now().to_rfc3339();
    let new_badges = state
        .badges
        .check_and_award_badges(request.user_id)
        .await?
        .into_iter()
        .map(|b| EarnedBadge {
            badge_id: b.id,
            title: Some(b.title),
            description: Some(b.description),
            rarity: Some(b.rarity),
            earned_at: now.clone(),
        })
        .collect();

    Ok(Json(NewBadgesResponse { new_badges }))
}

/// GET /progression/:user_id
///
/// 진행도 조회 (없으면 레벨 1 / 경험치 0으로 생성)
pub async fn get_progression(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProgressionResponse>, ApiError> {
    let progression = state.progression.snapshot(user_id).await?;

    Ok(Json(ProgressionResponse {
        user_id: progression.user_id,
        level: progression.level,
        experience_points: progression.experience_points,
        total_experience: progression.total_experience,
        last_updated: progression.updated_at.to_rfc3339(),
    }))
}

/// GET /streak/:user_id?activity=daily_login
///
/// 스트릭 조회. 행이 없으면 0 카운트 기본값 반환 (생성하지 않음).
pub async fn get_streak(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<StreakQuery>,
) -> Result<Json<StreakResponse>, ApiError> {
    let activity = query.activity.unwrap_or(StreakActivity::DailyLogin);

    let response = match state.streaks.snapshot(user_id, activity).await? {
        Some(streak) => StreakResponse {
            user_id,
            activity,
            current_count: streak.current_count,
            max_count: streak.max_count,
            bonus_multiplier: streak.bonus_multiplier,
            last_activity_at: Some(streak.last_activity_at.to_rfc3339()),
        },
        None => StreakResponse {
            user_id,
            activity,
            current_count: 0,
            max_count: 0,
            bonus_multiplier: 1.0,
            last_activity_at: None,
        },
    };

    Ok(Json(response))
}

/// GET /badges/:user_id
///
/// 획득 뱃지 목록 (카탈로그 메타데이터 포함, 최신순)
pub async fn get_badges(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<EarnedBadgesResponse>, ApiError> {
    let earned = state.badges.list_earned(user_id).await?;

    let badges = earned
        .into_iter()
        .map(|ub| {
            let spec = state.badges.badge_spec(&ub.badge_id);
            EarnedBadge {
                badge_id: ub.badge_id,
                title: spec.map(|s| s.title.clone()),
                description: spec.map(|s| s.description.clone()),
                rarity: spec.map(|s| s.rarity),
                earned_at: ub.earned_at.to_rfc3339(),
            }
        })
        .collect();

    Ok(Json(EarnedBadgesResponse { user_id, badges }))
}

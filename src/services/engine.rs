//! Completion Orchestrator
//!
//! 미션 참여가 완료되면 호출되는 보상 파이프라인:
//! (1) 미션 타입별 경험치 지급 → (2) 해당 타입 스트릭 갱신 →
//! (3) 뱃지 조건 재평가. 알림은 각 단계가 자체적으로 기록한다.
//!
//! 참여 상태 전이(pending → completed)는 외부 Mission Workflow 소유.
//! 여기서는 completed가 아닌 참여를 거부할 뿐, 상태를 바꾸지 않는다.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::db::ParticipationStore;
use crate::error::ApiError;
use crate::rules::{BadgeSpec, RewardRules};
use crate::services::badges::BadgeService;
use crate::services::progression::ProgressionService;
use crate::services::streak::StreakService;
use crate::types::{MissionType, ParticipationStatus, StreakActivity};

/// 완료 처리 결과 요약
#[derive(Debug, Serialize)]
pub struct CompletionOutcome {
    /// 지급된 경험치
    pub experience: i64,
    pub leveled_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_level: Option<i32>,
    pub streak_broken: bool,
    pub bonus_earned: bool,
    pub new_badges: Vec<BadgeSpec>,
}

pub struct RewardEngine {
    participations: Arc<dyn ParticipationStore>,
    progression: Arc<ProgressionService>,
    streaks: Arc<StreakService>,
    badges: Arc<BadgeService>,
    rules: Arc<RewardRules>,
}

impl RewardEngine {
    pub fn new(
        participations: Arc<dyn ParticipationStore>,
        progression: Arc<ProgressionService>,
        streaks: Arc<StreakService>,
        badges: Arc<BadgeService>,
        rules: Arc<RewardRules>,
    ) -> Self {
        Self {
            participations,
            progression,
            streaks,
            badges,
            rules,
        }
    }

    /// 완료된 참여에 대한 보상 처리
    pub async fn process_completion(
        &self,
        participation_id: Uuid,
    ) -> Result<CompletionOutcome, ApiError> {
        let participation = self
            .participations
            .find(participation_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("mission participation".to_string()))?;

        if participation.status != ParticipationStatus::Completed.as_str() {
            return Err(ApiError::Conflict(format!(
                "participation is '{}', rewards require completed",
                participation.status
            )));
        }

        let mission_type: MissionType = participation.mission_type.parse().map_err(|_| {
            ApiError::ValidationError(format!(
                "unknown mission type '{}'",
                participation.mission_type
            ))
        })?;

        let experience = self.rules.experience_for(mission_type).ok_or_else(|| {
            ApiError::ValidationError(format!(
                "no experience rule for mission type '{}'",
                mission_type
            ))
        })?;

        let grant = self
            .progression
            .add_experience(participation.user_id, experience, "mission_complete")
            .await?;

        let streak = self
            .streaks
            .update_streak(participation.user_id, StreakActivity::from(mission_type))
            .await?;

        let new_badges = self
            .badges
            .check_and_award_badges(participation.user_id)
            .await?;

        tracing::info!(
            participation_id = %participation_id,
            user_id = %participation.user_id,
            mission_type = %mission_type,
            experience,
            leveled_up = grant.leveled_up,
            new_badge_count = new_badges.len(),
            "mission completion processed"
        );

        Ok(CompletionOutcome {
            experience,
            leveled_up: grant.leveled_up,
            new_level: grant.new_level,
            streak_broken: streak.streak_broken,
            bonus_earned: streak.bonus_earned,
            new_badges,
        })
    }
}

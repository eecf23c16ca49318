//! Badge Rule Evaluator Service
//!
//! 카탈로그(설정 파일)의 뱃지 조건을 사용자 집계값과 비교해 미획득 뱃지를
//! 지급한다. 모든 조건은 `집계값 >= 임계값` 비교.
//!
//! - 재호출 멱등: 획득한 뱃지는 이후 평가에서 제외되고, DB 유니크 키가
//!   경합 상황에서도 1회 지급을 보장
//! - 소급 회수 없음: 지급 후 집계값이 임계값 아래로 떨어져도
//!   (예: 페이백 거부) 뱃지는 영구적

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::db::{BadgeStore, ParticipationStore, PaybackStore, ReferralStore, StreakStore, UserBadge};
use crate::error::ApiError;
use crate::rules::{BadgeCondition, BadgeSpec, RewardRules};
use crate::services::notifications::NotificationService;
use crate::types::StreakActivity;

pub struct BadgeService {
    rules: Arc<RewardRules>,
    badges: Arc<dyn BadgeStore>,
    participations: Arc<dyn ParticipationStore>,
    referrals: Arc<dyn ReferralStore>,
    paybacks: Arc<dyn PaybackStore>,
    streaks: Arc<dyn StreakStore>,
    notifier: Arc<NotificationService>,
}

impl BadgeService {
    pub fn new(
        rules: Arc<RewardRules>,
        badges: Arc<dyn BadgeStore>,
        participations: Arc<dyn ParticipationStore>,
        referrals: Arc<dyn ReferralStore>,
        paybacks: Arc<dyn PaybackStore>,
        streaks: Arc<dyn StreakStore>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            rules,
            badges,
            participations,
            referrals,
            paybacks,
            streaks,
            notifier,
        }
    }

    /// 획득 뱃지 목록 (최신순)
    pub async fn list_earned(&self, user_id: Uuid) -> Result<Vec<UserBadge>, ApiError> {
        Ok(self.badges.list_for_user(user_id).await?)
    }

    /// 카탈로그에서 뱃지 메타데이터 조회
    pub fn badge_spec(&self, badge_id: &str) -> Option<&BadgeSpec> {
        self.rules.badge(badge_id)
    }

    /// 뱃지 조건 확인 및 자동 지급
    ///
    /// 한 번의 호출로 0개, 1개, 여러 개가 지급될 수 있다.
    pub async fn check_and_award_badges(&self, user_id: Uuid) -> Result<Vec<BadgeSpec>, ApiError> {
        let earned: HashSet<String> = self
            .badges
            .earned_badge_ids(user_id)
            .await?
            .into_iter()
            .collect();

        let mut new_badges = Vec::new();

        for badge in self.rules.active_badges() {
            if earned.contains(&badge.id) {
                continue; // 이미 획득한 뱃지
            }

            if !self.meets_condition(user_id, &badge.condition).await? {
                continue;
            }

            // 유니크 키 충돌(동시 평가)이면 false, 지급 목록에서 제외
            if !self.badges.award(user_id, &badge.id, Utc::now()).await? {
                continue;
            }

            tracing::info!(user_id = %user_id, badge_id = %badge.id, "badge awarded");

            self.notifier
                .emit(
                    user_id,
                    "badge_earned",
                    "🏆 새로운 뱃지 획득!",
                    format!("\"{}\" 뱃지를 획득했습니다!", badge.title),
                    serde_json::json!({ "badge_id": badge.id, "rarity": badge.rarity }),
                )
                .await;

            new_badges.push(badge.clone());
        }

        Ok(new_badges)
    }

    /// 조건 평가: 현재 집계값 >= 임계값
    async fn meets_condition(
        &self,
        user_id: Uuid,
        condition: &BadgeCondition,
    ) -> Result<bool, ApiError> {
        let aggregate = match condition {
            BadgeCondition::MissionTypeCount { mission_type, .. } => {
                self.participations
                    .count_completed(user_id, Some(mission_type.as_str()))
                    .await?
            }
            BadgeCondition::TotalMissionCount { .. } => {
                self.participations.count_completed(user_id, None).await?
            }
            BadgeCondition::ReferralCount { .. } => {
                self.referrals.count_verified(user_id).await?
            }
            BadgeCondition::PaybackTotal { .. } => self.paybacks.total_paid(user_id).await?,
            BadgeCondition::StreakLength { .. } => self
                .streaks
                .find(user_id, StreakActivity::DailyLogin.as_str())
                .await?
                .map(|s| s.current_count as i64)
                .unwrap_or(0),
        };

        Ok(aggregate >= condition.threshold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MemoryStore;
    use crate::db::{MissionParticipation, Payback, Streak};

    fn rules() -> Arc<RewardRules> {
        Arc::new(serde_json::from_str(include_str!("../../config/reward_rules.json")).unwrap())
    }

    fn service() -> (Arc<MemoryStore>, BadgeService) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(NotificationService::new(store.clone()));
        let service = BadgeService::new(
            rules(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            notifier,
        );
        (store, service)
    }

    fn completed_participation(user_id: Uuid, mission_type: &str) -> MissionParticipation {
        MissionParticipation {
            id: Uuid::new_v4(),
            user_id,
            mission_id: Uuid::new_v4(),
            store_id: 1,
            mission_type: mission_type.to_string(),
            reward_amount: 5000,
            status: "completed".to_string(),
            proof_data: None,
            started_at: None,
            completed_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_first_mission_badge_awarded_once() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        store.seed_participation(completed_participation(user_id, "challenge"));

        let new_badges = service.check_and_award_badges(user_id).await.unwrap();
        assert_eq!(new_badges.len(), 1);
        assert_eq!(new_badges[0].id, "first_mission");

        // 재호출은 멱등, 중복 지급 없음
        let again = service.check_and_award_badges(user_id).await.unwrap();
        assert!(again.is_empty());
        assert_eq!(service.list_earned(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_badges_below_threshold() {
        let (_, service) = service();
        let user_id = Uuid::new_v4();

        let new_badges = service.check_and_award_badges(user_id).await.unwrap();
        assert!(new_badges.is_empty());
    }

    #[tokio::test]
    async fn test_mission_type_condition_counts_only_that_type() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();

        // review 2개 + sns 1개: review_writer(리뷰 3개)는 아직
        store.seed_participation(completed_participation(user_id, "review"));
        store.seed_participation(completed_participation(user_id, "review"));
        store.seed_participation(completed_participation(user_id, "sns"));

        let ids: Vec<String> = service
            .check_and_award_badges(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert!(!ids.contains(&"review_writer".to_string()));

        // 리뷰 3개째에 획득
        store.seed_participation(completed_participation(user_id, "review"));
        let ids: Vec<String> = service
            .check_and_award_badges(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert!(ids.contains(&"review_writer".to_string()));
    }

    #[tokio::test]
    async fn test_single_call_can_award_multiple_badges() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();

        store.seed_referrals(user_id, 3);
        store.seed_participation(completed_participation(user_id, "attendance"));

        let ids: Vec<String> = service
            .check_and_award_badges(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert!(ids.contains(&"first_mission".to_string()));
        assert!(ids.contains(&"friend_recruiter".to_string()));
    }

    #[tokio::test]
    async fn test_payback_total_condition_counts_paid_only() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        store.seed_payback(Payback {
            user_id,
            mission_id: Uuid::new_v4(),
            store_id: 1,
            amount: 60000,
            status: "paid".to_string(),
            paid_at: Some(now),
            rejection_reason: None,
            updated_at: now,
        });
        store.seed_payback(Payback {
            user_id,
            mission_id: Uuid::new_v4(),
            store_id: 1,
            amount: 60000,
            status: "pending".to_string(),
            paid_at: None,
            rejection_reason: None,
            updated_at: now,
        });

        // paid 합계 60,000 < 100,000 → 미획득
        let ids: Vec<String> = service
            .check_and_award_badges(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert!(!ids.contains(&"payback_collector".to_string()));

        store.seed_payback(Payback {
            user_id,
            mission_id: Uuid::new_v4(),
            store_id: 1,
            amount: 50000,
            status: "paid".to_string(),
            paid_at: Some(now),
            rejection_reason: None,
            updated_at: now,
        });

        let ids: Vec<String> = service
            .check_and_award_badges(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert!(ids.contains(&"payback_collector".to_string()));
    }

    #[tokio::test]
    async fn test_streak_badge_and_permanence() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        store.seed_streak(Streak {
            user_id,
            activity_type: "daily_login".to_string(),
            current_count: 7,
            max_count: 7,
            last_activity_at: now,
            bonus_multiplier: 1.7,
            version: 0,
        });

        let ids: Vec<String> = service
            .check_and_award_badges(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert!(ids.contains(&"week_streak".to_string()));

        // 스트릭이 깨져도 뱃지는 유지됨
        store.seed_streak(Streak {
            user_id,
            activity_type: "daily_login".to_string(),
            current_count: 1,
            max_count: 7,
            last_activity_at: now,
            bonus_multiplier: 1.1,
            version: 1,
        });
        service.check_and_award_badges(user_id).await.unwrap();
        let earned = service.list_earned(user_id).await.unwrap();
        assert!(earned.iter().any(|b| b.badge_id == "week_streak"));
    }
}

//! Streak Tracker Service
//!
//! (user, activity) 별 연속 참여 카운터.
//!
//! 상태 전이는 마지막 활동과의 일수 차이로 결정:
//! - 0일: 같은 날 재호출 (멱등 no-op)
//! - 1일: 연속 참여. 카운트 증가, 7일마다 보너스 경험치
//! - 2일 이상: 스트릭 브레이크. 1로 리셋
//!
//! bonus_multiplier(1.0~3.0)는 행에 공개될 뿐 여기서 페이백 금액에
//! 적용하지는 않는다. 소비자는 다른 서브시스템.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::{Streak, StreakStore};
use crate::error::ApiError;
use crate::services::notifications::NotificationService;
use crate::services::progression::{ProgressionService, MAX_CAS_RETRIES};
use crate::types::StreakActivity;

/// 스트릭 보너스 기본 경험치 (7일마다 50씩 증가)
const STREAK_BONUS_BASE: i64 = 50;

/// 스트릭 갱신 결과
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreakUpdate {
    pub streak_broken: bool,
    pub bonus_earned: bool,
}

pub struct StreakService {
    store: Arc<dyn StreakStore>,
    progression: Arc<ProgressionService>,
    notifier: Arc<NotificationService>,
}

impl StreakService {
    pub fn new(
        store: Arc<dyn StreakStore>,
        progression: Arc<ProgressionService>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self {
            store,
            progression,
            notifier,
        }
    }

    /// 스트릭 조회
    pub async fn snapshot(
        &self,
        user_id: Uuid,
        activity: StreakActivity,
    ) -> Result<Option<Streak>, ApiError> {
        Ok(self.store.find(user_id, activity.as_str()).await?)
    }

    /// 스트릭 갱신 (일일 로그인, 미션 완료 등)
    pub async fn update_streak(
        &self,
        user_id: Uuid,
        activity: StreakActivity,
    ) -> Result<StreakUpdate, ApiError> {
        self.update_streak_at(user_id, activity, Utc::now()).await
    }

    /// 기준 시각을 받는 내부 구현 (테스트에서 시간 제어용)
    pub async fn update_streak_at(
        &self,
        user_id: Uuid,
        activity: StreakActivity,
        now: DateTime<Utc>,
    ) -> Result<StreakUpdate, ApiError> {
        for _ in 0..MAX_CAS_RETRIES {
            let current = self
                .store
                .get_or_create(user_id, activity.as_str(), now)
                .await?;

            let days_diff = (now - current.last_activity_at).num_days();

            if days_diff == 0 {
                // 같은 날 - 스트릭 유지, 쓰기 없음
                return Ok(StreakUpdate {
                    streak_broken: false,
                    bonus_earned: false,
                });
            }

            let mut streak_broken = false;
            let mut bonus_earned = false;
            let mut updated = current.clone();

            if days_diff == 1 {
                // 연속 참여 - 스트릭 증가
                updated.current_count += 1;
                updated.max_count = updated.max_count.max(updated.current_count);

                // 스트릭 보너스 (7일마다)
                if updated.current_count % 7 == 0 {
                    bonus_earned = true;
                }
            } else {
                // 스트릭 브레이크 - 새로 시작
                streak_broken = true;
                updated.current_count = 1;
            }

            // 보너스 배수 재계산 (연속 참여일수에 따라, 최대 3배)
            updated.bonus_multiplier =
                (1.0 + updated.current_count as f64 * 0.1).min(3.0);
            updated.last_activity_at = now;

            if !self.store.save(&updated, current.version).await? {
                // 버전 충돌 → 재시도
                continue;
            }

            if bonus_earned {
                // 스트릭 자체는 이미 반영됨. 보너스 지급/알림은 best-effort
                self.grant_streak_bonus(user_id, &updated).await;
            }

            tracing::info!(
                user_id = %user_id,
                activity = %activity,
                current_count = updated.current_count,
                streak_broken,
                bonus_earned,
                "streak updated"
            );

            return Ok(StreakUpdate {
                streak_broken,
                bonus_earned,
            });
        }

        Err(ApiError::Conflict(
            "streak update contended, please retry".to_string(),
        ))
    }

    async fn grant_streak_bonus(&self, user_id: Uuid, streak: &Streak) {
        let bonus = STREAK_BONUS_BASE * (streak.current_count as i64 / 7);

        if let Err(err) = self
            .progression
            .add_experience(user_id, bonus, "streak_bonus")
            .await
        {
            tracing::warn!(
                user_id = %user_id,
                bonus,
                "failed to grant streak bonus experience: {:?}",
                err
            );
        }

        self.notifier
            .emit(
                user_id,
                "streak_bonus",
                format!("🔥 {}일 연속 참여!", streak.current_count),
                "연속 참여 보너스로 경험치를 추가로 받았습니다!",
                serde_json::json!({
                    "streak_count": streak.current_count,
                    "bonus_multiplier": streak.bonus_multiplier,
                }),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MemoryStore;
    use crate::rules::RewardRules;
    use chrono::Duration;

    fn service() -> (Arc<MemoryStore>, StreakService) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(NotificationService::new(store.clone()));
        let rules: Arc<RewardRules> =
            Arc::new(serde_json::from_str(include_str!("../../config/reward_rules.json")).unwrap());
        let progression = Arc::new(ProgressionService::new(
            store.clone(),
            store.clone(),
            notifier.clone(),
            rules,
        ));
        let service = StreakService::new(store.clone(), progression, notifier);
        (store, service)
    }

    fn seed(store: &MemoryStore, user_id: Uuid, count: i32, last_activity_at: DateTime<Utc>) {
        store.seed_streak(Streak {
            user_id,
            activity_type: "daily_login".to_string(),
            current_count: count,
            max_count: count,
            last_activity_at,
            bonus_multiplier: (1.0 + count as f64 * 0.1).min(3.0),
            version: 0,
        });
    }

    #[tokio::test]
    async fn test_same_day_call_is_idempotent() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        seed(&store, user_id, 3, now - Duration::hours(2));

        let update = service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now)
            .await
            .unwrap();

        assert!(!update.streak_broken);
        assert!(!update.bonus_earned);
        // 쓰기 없음: 카운트와 last_activity_at 그대로
        let streak = store.streak_of(user_id, "daily_login").unwrap();
        assert_eq!(streak.current_count, 3);
        assert_eq!(streak.last_activity_at, now - Duration::hours(2));
    }

    #[tokio::test]
    async fn test_next_day_increments_and_tracks_max() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        seed(&store, user_id, 3, now - Duration::days(1));

        let update = service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now)
            .await
            .unwrap();

        assert!(!update.streak_broken);
        assert!(!update.bonus_earned);
        let streak = store.streak_of(user_id, "daily_login").unwrap();
        assert_eq!(streak.current_count, 4);
        assert_eq!(streak.max_count, 4);
        assert_eq!(streak.last_activity_at, now);
    }

    #[tokio::test]
    async fn test_two_day_gap_breaks_streak() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        seed(&store, user_id, 10, now - Duration::days(2));

        let update = service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now)
            .await
            .unwrap();

        assert!(update.streak_broken);
        assert!(!update.bonus_earned);
        let streak = store.streak_of(user_id, "daily_login").unwrap();
        assert_eq!(streak.current_count, 1);
        // max_count는 보존됨
        assert_eq!(streak.max_count, 10);
    }

    #[tokio::test]
    async fn test_seventh_day_awards_bonus_once() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        seed(&store, user_id, 6, now - Duration::days(1));

        // 6 → 7: 보너스 발생 (50 * 1 XP)
        let update = service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now)
            .await
            .unwrap();
        assert!(update.bonus_earned);

        let progression = store.progression_of(user_id).unwrap();
        assert_eq!(progression.total_experience, 50);

        // 7 → 8 (다음 날): 보너스 없음
        let update = service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now + Duration::days(1))
            .await
            .unwrap();
        assert!(!update.bonus_earned);
        assert_eq!(store.progression_of(user_id).unwrap().total_experience, 50);
    }

    #[tokio::test]
    async fn test_fourteenth_day_bonus_scales() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        seed(&store, user_id, 13, now - Duration::days(1));

        let update = service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now)
            .await
            .unwrap();

        assert!(update.bonus_earned);
        // 50 * (14 / 7) = 100 XP
        assert_eq!(store.progression_of(user_id).unwrap().total_experience, 100);
        assert!(store
            .notifications_of(user_id)
            .iter()
            .any(|n| n.notification_type == "streak_bonus"));
    }

    #[tokio::test]
    async fn test_bonus_multiplier_caps_at_three() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        seed(&store, user_id, 4, now - Duration::days(1));
        service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now)
            .await
            .unwrap();
        let streak = store.streak_of(user_id, "daily_login").unwrap();
        assert!((streak.bonus_multiplier - 1.5).abs() < 1e-9);

        let user_id = Uuid::new_v4();
        seed(&store, user_id, 40, now - Duration::days(1));
        service
            .update_streak_at(user_id, StreakActivity::DailyLogin, now)
            .await
            .unwrap();
        let streak = store.streak_of(user_id, "daily_login").unwrap();
        assert!((streak.bonus_multiplier - 3.0).abs() < 1e-9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_increment_once_per_day() {
        let (store, service) = service();
        let service = Arc::new(service);
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        seed(&store, user_id, 3, now - Duration::days(1));

        // 같은 날에 대한 동시 갱신: 승자 1명이 증가시키고
        // 나머지는 버전 충돌 후 재조회에서 같은 날로 판정되어 no-op
        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .update_streak_at(user_id, StreakActivity::DailyLogin, now)
                    .await
            }));
        }
        for handle in handles {
            let update = handle.await.unwrap().unwrap();
            assert!(!update.streak_broken);
        }

        // 정확히 1회 증가, 이중 증가 없음
        let streak = store.streak_of(user_id, "daily_login").unwrap();
        assert_eq!(streak.current_count, 4);
        assert_eq!(streak.max_count, 4);
        assert_eq!(streak.last_activity_at, now);
    }

    #[tokio::test]
    async fn test_fresh_streak_starts_counting_next_day() {
        let (store, service) = service();
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        // 첫 호출: 행 생성 (생성일이 day 0)
        let update = service
            .update_streak_at(user_id, StreakActivity::Attendance, now)
            .await
            .unwrap();
        assert!(!update.streak_broken);
        assert_eq!(
            store.streak_of(user_id, "attendance").unwrap().current_count,
            0
        );

        // 다음 날: 1로 증가
        service
            .update_streak_at(user_id, StreakActivity::Attendance, now + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(
            store.streak_of(user_id, "attendance").unwrap().current_count,
            1
        );
    }
}

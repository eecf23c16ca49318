//! Progression Ledger Service
//!
//! 레벨/경험치 원장. 100 XP = 1 레벨, 레벨 = total/100 + 1.
//!
//! # Interview Q&A
//!
//! Q: 동시에 미션 두 개가 완료되면 경험치가 유실되지 않는가?
//! A: version 컬럼 CAS로 보호
//!    - 읽기 → 계산 → "version이 그대로일 때만" 쓰기
//!    - 충돌 시 최신 상태를 다시 읽어 재시도 (상한 있음)
//!    - 두 완료가 겹쳐도 total_experience는 두 지급분의 합이 됨
//!
//! Q: 마일스톤 보너스 경험치가 또 레벨업을 일으키면 무한 루프 아닌가?
//! A: 보너스는 마일스톤 처리를 다시 타지 않는 2차 적용으로 들어감
//!    - add_experience 호출 1번당 보상 패스는 최대 1번
//!    - 보너스로 넘은 레벨의 마일스톤은 다음 정상 지급 때 걸리지 않지만,
//!      원본 동작을 보존한 의도적 선택 (조회 기준은 1차 지급의 도달 레벨)

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{CouponStore, ProgressionStore, UserProgression};
use crate::error::ApiError;
use crate::rules::{level_for_total, RewardRules, EXPERIENCE_PER_LEVEL};
use crate::services::notifications::NotificationService;

/// CAS 충돌 시 재시도 상한
pub(crate) const MAX_CAS_RETRIES: usize = 5;

/// 경험치 지급 결과
#[derive(Debug, Clone, Serialize)]
pub struct ExperienceGrant {
    pub leveled_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_level: Option<i32>,
}

pub struct ProgressionService {
    store: Arc<dyn ProgressionStore>,
    coupons: Arc<dyn CouponStore>,
    notifier: Arc<NotificationService>,
    rules: Arc<RewardRules>,
}

impl ProgressionService {
    pub fn new(
        store: Arc<dyn ProgressionStore>,
        coupons: Arc<dyn CouponStore>,
        notifier: Arc<NotificationService>,
        rules: Arc<RewardRules>,
    ) -> Self {
        Self {
            store,
            coupons,
            notifier,
            rules,
        }
    }

    /// 진행도 조회 (없으면 레벨 1 / 경험치 0으로 생성)
    pub async fn snapshot(&self, user_id: Uuid) -> Result<UserProgression, ApiError> {
        Ok(self.store.get_or_create(user_id).await?)
    }

    /// 경험치 추가
    ///
    /// `points <= 0`은 검증 실패. 레벨업 시 마일스톤 보상(쿠폰/보너스 경험치)과
    /// 알림은 best-effort로 처리되어 지급 자체를 실패시키지 않는다.
    pub async fn add_experience(
        &self,
        user_id: Uuid,
        points: i64,
        source: &str,
    ) -> Result<ExperienceGrant, ApiError> {
        if points <= 0 {
            return Err(ApiError::ValidationError(format!(
                "experience points must be positive, got {}",
                points
            )));
        }

        let (old_level, new_level) = self.apply_points(user_id, points).await?;
        let leveled_up = new_level > old_level;

        tracing::info!(
            user_id = %user_id,
            points,
            source,
            new_level,
            leveled_up,
            "experience granted"
        );

        if leveled_up {
            self.grant_level_rewards(user_id, new_level).await;
        }

        Ok(ExperienceGrant {
            leveled_up,
            new_level: leveled_up.then_some(new_level),
        })
    }

    /// CAS 코어: 경험치 반영 + 레벨 재계산
    ///
    /// 마일스톤 보상을 트리거하지 않는다 (보너스 경험치 지급 경로에서 재사용).
    /// 반환: (이전 레벨, 새 레벨)
    async fn apply_points(&self, user_id: Uuid, points: i64) -> Result<(i32, i32), ApiError> {
        for _ in 0..MAX_CAS_RETRIES {
            let current = self.store.get_or_create(user_id).await?;

            let new_total = current.total_experience + points;
            let updated = UserProgression {
                level: level_for_total(new_total),
                experience_points: (new_total % EXPERIENCE_PER_LEVEL) as i32,
                total_experience: new_total,
                updated_at: Utc::now(),
                ..current.clone()
            };

            if self.store.save(&updated, current.version).await? {
                return Ok((current.level, updated.level));
            }
            // 버전 충돌: 다른 지급이 먼저 반영됨 → 최신 상태로 재시도
        }

        Err(ApiError::Conflict(
            "progression update contended, please retry".to_string(),
        ))
    }

    /// 레벨업 보상 처리 (best-effort)
    async fn grant_level_rewards(&self, user_id: Uuid, new_level: i32) {
        let mut rewards = serde_json::json!({});

        if let Some(milestone) = self.rules.milestone_for(new_level) {
            if let Some(code) = &milestone.coupon_code {
                if let Err(err) = self.coupons.issue(user_id, code).await {
                    tracing::warn!(
                        user_id = %user_id,
                        coupon_code = %code,
                        "failed to issue milestone coupon: {:?}",
                        err
                    );
                }
            }

            if let Some(bonus) = milestone.experience_bonus {
                // 독립된 2차 적용 (마일스톤 처리를 다시 타지 않음)
                if let Err(err) = self.apply_points(user_id, bonus).await {
                    tracing::warn!(
                        user_id = %user_id,
                        bonus,
                        "failed to grant milestone bonus experience: {:?}",
                        err
                    );
                }
            }

            rewards = serde_json::json!({
                "experience_bonus": milestone.experience_bonus,
                "coupon_code": milestone.coupon_code,
            });
        }

        self.notifier
            .emit(
                user_id,
                "level_up",
                format!("🎉 레벨 {} 달성!", new_level),
                format!("축하합니다! 레벨 {}에 도달했습니다.", new_level),
                serde_json::json!({ "new_level": new_level, "rewards": rewards }),
            )
            .await;
    }
}

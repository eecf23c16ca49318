//! Reward Rules Module
//!
//! 레벨 마일스톤 / 미션 경험치 / 뱃지 카탈로그를 코드가 아닌 데이터로 관리
//!
//! # Design Decision
//!
//! 보상 규칙이 코드에 하드코딩되어 있으면 수치 조정마다 재배포가 필요함.
//! 규칙 전체를 JSON 파일로 외부화하고 시작 시점에 로드 + 검증 (fail-fast).
//! 검증 실패 시 서버가 뜨지 않으므로 잘못된 규칙이 런타임에 적용될 수 없음.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{BadgeRarity, MissionType};

/// 레벨당 필요 경험치 (100 XP = 1 레벨)
pub const EXPERIENCE_PER_LEVEL: i64 = 100;

/// total_experience로부터 레벨 계산
pub fn level_for_total(total_experience: i64) -> i32 {
    (total_experience / EXPERIENCE_PER_LEVEL) as i32 + 1
}

/// 레벨 마일스톤 보상
///
/// 특정 레벨 달성 시 보너스 경험치 및/또는 쿠폰 발급
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelMilestone {
    pub level: i32,
    #[serde(default)]
    pub experience_bonus: Option<i64>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// 뱃지 획득 조건
///
/// 모든 조건은 `집계값 >= value` 비교로 평가됨
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeCondition {
    /// 특정 타입 미션 완료 횟수
    MissionTypeCount { mission_type: MissionType, value: i64 },
    /// 전체 미션 완료 횟수
    TotalMissionCount { value: i64 },
    /// 인증된 친구 추천 수
    ReferralCount { value: i64 },
    /// 지급 완료된 페이백 총액
    PaybackTotal { value: i64 },
    /// daily_login 스트릭 길이
    StreakLength { value: i64 },
}

impl BadgeCondition {
    pub fn threshold(&self) -> i64 {
        match self {
            BadgeCondition::MissionTypeCount { value, .. }
            | BadgeCondition::TotalMissionCount { value }
            | BadgeCondition::ReferralCount { value }
            | BadgeCondition::PaybackTotal { value }
            | BadgeCondition::StreakLength { value } => *value,
        }
    }
}

/// 뱃지 카탈로그 항목 (런타임 불변)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeSpec {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub rarity: BadgeRarity,
    pub condition: BadgeCondition,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// 보상 규칙 전체
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRules {
    /// 미션 타입별 완료 경험치
    pub mission_experience: HashMap<MissionType, i64>,
    /// 레벨 마일스톤 보상 테이블
    pub level_milestones: Vec<LevelMilestone>,
    /// 뱃지 카탈로그
    pub badges: Vec<BadgeSpec>,
}

impl RewardRules {
    /// JSON 파일에서 규칙 로드 + 검증
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reward rules: {}", path.display()))?;
        let rules: RewardRules = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse reward rules: {}", path.display()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// 규칙 정합성 검증
    ///
    /// - 미션 경험치는 양수
    /// - 마일스톤 레벨은 2 이상, 중복 없음, 보너스는 양수
    /// - 뱃지 id는 비어있지 않고 유일, 조건 임계값은 1 이상
    pub fn validate(&self) -> Result<()> {
        for (mission_type, points) in &self.mission_experience {
            if *points <= 0 {
                bail!(
                    "mission_experience for '{}' must be positive, got {}",
                    mission_type,
                    points
                );
            }
        }

        let mut seen_levels = HashSet::new();
        for milestone in &self.level_milestones {
            if milestone.level < 2 {
                bail!("milestone level must be >= 2, got {}", milestone.level);
            }
            if !seen_levels.insert(milestone.level) {
                bail!("duplicate milestone level: {}", milestone.level);
            }
            if let Some(bonus) = milestone.experience_bonus {
                if bonus <= 0 {
                    bail!(
                        "milestone level {} experience_bonus must be positive, got {}",
                        milestone.level,
                        bonus
                    );
                }
            }
            if milestone.experience_bonus.is_none() && milestone.coupon_code.is_none() {
                bail!("milestone level {} has no reward", milestone.level);
            }
        }

        let mut seen_ids = HashSet::new();
        for badge in &self.badges {
            if badge.id.trim().is_empty() {
                bail!("badge id must not be empty");
            }
            if !seen_ids.insert(badge.id.as_str()) {
                bail!("duplicate badge id: {}", badge.id);
            }
            if badge.condition.threshold() < 1 {
                bail!(
                    "badge '{}' condition threshold must be >= 1, got {}",
                    badge.id,
                    badge.condition.threshold()
                );
            }
        }

        Ok(())
    }

    /// 미션 완료 시 지급할 경험치
    pub fn experience_for(&self, mission_type: MissionType) -> Option<i64> {
        self.mission_experience.get(&mission_type).copied()
    }

    /// 해당 레벨의 마일스톤 보상 조회
    pub fn milestone_for(&self, level: i32) -> Option<&LevelMilestone> {
        self.level_milestones.iter().find(|m| m.level == level)
    }

    /// 활성 뱃지만 반환
    pub fn active_badges(&self) -> impl Iterator<Item = &BadgeSpec> {
        self.badges.iter().filter(|b| b.is_active)
    }

    /// 카탈로그에서 id로 조회
    pub fn badge(&self, id: &str) -> Option<&BadgeSpec> {
        self.badges.iter().find(|b| b.id == id)
    }
}

//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의
//!
//! DB 컬럼은 문자열(TEXT)로 저장되고, 서비스/API 레이어에서만 enum을 사용한다.
//! 경계에서 `as_str` / `FromStr`로 변환.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 미션 타입
///
/// 운전학원 프랜차이즈의 미션 종류
/// - challenge: 퀴즈/챌린지
/// - sns: SNS 인증
/// - review: 후기 작성
/// - referral: 친구 추천
/// - attendance: 출석
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    Challenge,
    Sns,
    Review,
    Referral,
    Attendance,
}

impl MissionType {
    pub const ALL: [MissionType; 5] = [
        MissionType::Challenge,
        MissionType::Sns,
        MissionType::Review,
        MissionType::Referral,
        MissionType::Attendance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionType::Challenge => "challenge",
            MissionType::Sns => "sns",
            MissionType::Review => "review",
            MissionType::Referral => "referral",
            MissionType::Attendance => "attendance",
        }
    }
}

impl FromStr for MissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "challenge" => Ok(MissionType::Challenge),
            "sns" => Ok(MissionType::Sns),
            "review" => Ok(MissionType::Review),
            "referral" => Ok(MissionType::Referral),
            "attendance" => Ok(MissionType::Attendance),
            other => Err(format!("unknown mission type: {}", other)),
        }
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스트릭 활동 타입
///
/// (user, activity) 당 스트릭 1개. 일일 로그인 + 미션 타입별 스트릭.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakActivity {
    DailyLogin,
    Challenge,
    Sns,
    Review,
    Referral,
    Attendance,
}

impl StreakActivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreakActivity::DailyLogin => "daily_login",
            StreakActivity::Challenge => "challenge",
            StreakActivity::Sns => "sns",
            StreakActivity::Review => "review",
            StreakActivity::Referral => "referral",
            StreakActivity::Attendance => "attendance",
        }
    }
}

impl From<MissionType> for StreakActivity {
    fn from(mission_type: MissionType) -> Self {
        match mission_type {
            MissionType::Challenge => StreakActivity::Challenge,
            MissionType::Sns => StreakActivity::Sns,
            MissionType::Review => StreakActivity::Review,
            MissionType::Referral => StreakActivity::Referral,
            MissionType::Attendance => StreakActivity::Attendance,
        }
    }
}

impl FromStr for StreakActivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily_login" => Ok(StreakActivity::DailyLogin),
            "challenge" => Ok(StreakActivity::Challenge),
            "sns" => Ok(StreakActivity::Sns),
            "review" => Ok(StreakActivity::Review),
            "referral" => Ok(StreakActivity::Referral),
            "attendance" => Ok(StreakActivity::Attendance),
            other => Err(format!("unknown streak activity: {}", other)),
        }
    }
}

impl fmt::Display for StreakActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 미션 참여 상태 (외부 Mission Workflow 소유, 여기서는 읽기 전용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Pending => "pending",
            ParticipationStatus::InProgress => "in_progress",
            ParticipationStatus::Completed => "completed",
            ParticipationStatus::Rejected => "rejected",
        }
    }
}

/// 페이백 상태
///
/// pending → paid (승인) | rejected (거부). paid/rejected는 종결 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaybackStatus {
    Pending,
    Paid,
    Rejected,
}

impl PaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaybackStatus::Pending => "pending",
            PaybackStatus::Paid => "paid",
            PaybackStatus::Rejected => "rejected",
        }
    }

    /// 종결 상태 여부 (종결 후에는 반대 전이 불가)
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaybackStatus::Paid | PaybackStatus::Rejected)
    }
}

impl FromStr for PaybackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaybackStatus::Pending),
            "paid" => Ok(PaybackStatus::Paid),
            "rejected" => Ok(PaybackStatus::Rejected),
            other => Err(format!("unknown payback status: {}", other)),
        }
    }
}

/// 뱃지 희귀도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

/// 관리자 역할
///
/// super_admin은 모든 지점에 대한 권한, store_admin은 배정된 지점만
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    StoreAdmin,
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(AdminRole::SuperAdmin),
            "store_admin" => Ok(AdminRole::StoreAdmin),
            other => Err(format!("unknown admin role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_type_round_trip() {
        for mt in MissionType::ALL {
            assert_eq!(mt.as_str().parse::<MissionType>().unwrap(), mt);
        }
    }

    #[test]
    fn test_payback_terminal_states() {
        assert!(!PaybackStatus::Pending.is_terminal());
        assert!(PaybackStatus::Paid.is_terminal());
        assert!(PaybackStatus::Rejected.is_terminal());
    }
}

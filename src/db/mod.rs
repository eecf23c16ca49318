//! Database Module
//!
//! # Interview Q&A
//!
//! Q: 왜 PostgreSQL을 선택했는가?
//! A: 보상/정산 백엔드에 적합한 이유
//!
//!    1. ACID 트랜잭션: 페이백(현금) 데이터 무결성 보장
//!    2. 유니크 제약: (user_id, badge_id), (user_id, mission_id) 키로
//!       중복 지급을 스키마 수준에서 차단
//!    3. JSON 지원: 인증 자료(proof_data), 알림 payload 저장 용이
//!    4. 집계 쿼리: 뱃지 조건 평가 (COUNT / SUM)
//!    5. 생태계: SQLx, Diesel 등 Rust 라이브러리 지원
//!
//! Q: 낙관적 잠금(version 컬럼)을 쓰는 이유는?
//! A: 동시 미션 완료가 같은 사용자의 진행도/스트릭을 read-modify-write할 때
//!    나중 쓰기가 먼저 쓰기를 덮어쓰는 갱신 유실 방지
//!
//!    ```sql
//!    UPDATE user_progressions SET ..., version = version + 1
//!    WHERE user_id = $1 AND version = $expected
//!    ```
//!
//!    영향 행 수 0이면 충돌 → 서비스 레이어가 재시도
//!
//! Q: 커넥션 풀은 어떻게 관리하는가?
//! A: SQLx의 PgPool 사용
//!    - 최소/최대 커넥션 수 설정
//!    - 커넥션 재사용 (오버헤드 감소)
//!    - 자동 health check
//!    - 타임아웃 처리

mod models;
mod repository;

pub use models::*;
pub use repository::*;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

/// 데이터베이스 연결 및 쿼리 담당
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 데이터베이스 연결
    ///
    /// # Connection Pool Settings
    ///
    /// - max_connections: 10 (트래픽에 따라 조정)
    /// - min_connections: 1 (idle 시 최소 유지)
    /// - acquire_timeout: 3초 (커넥션 획득 대기)
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// 마이그레이션 실행
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ProgressionStore for Database {
    async fn get_or_create(&self, user_id: Uuid) -> Result<UserProgression> {
        // 없으면 생성 (레벨 1, 경험치 0), 있으면 무시
        sqlx::query(
            r#"
            INSERT INTO user_progressions (user_id, level, experience_points, total_experience, version, updated_at)
            VALUES ($1, 1, 0, 0, 0, NOW())
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let progression = sqlx::query_as::<_, UserProgression>(
            r#"
            SELECT user_id, level, experience_points, total_experience, version, updated_at
            FROM user_progressions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(progression)
    }

    async fn save(&self, progression: &UserProgression, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_progressions
            SET level = $2,
                experience_points = $3,
                total_experience = $4,
                version = version + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND version = $5
            "#,
        )
        .bind(progression.user_id)
        .bind(progression.level)
        .bind(progression.experience_points)
        .bind(progression.total_experience)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl StreakStore for Database {
    async fn find(&self, user_id: Uuid, activity_type: &str) -> Result<Option<Streak>> {
        let streak = sqlx::query_as::<_, Streak>(
            r#"
            SELECT user_id, activity_type, current_count, max_count,
                   last_activity_at, bonus_multiplier, version
            FROM user_streaks
            WHERE user_id = $1 AND activity_type = $2
            "#,
        )
        .bind(user_id)
        .bind(activity_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(streak)
    }

    async fn get_or_create(
        &self,
        user_id: Uuid,
        activity_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Streak> {
        sqlx::query(
            r#"
            INSERT INTO user_streaks
                (user_id, activity_type, current_count, max_count, last_activity_at, bonus_multiplier, version)
            VALUES ($1, $2, 0, 0, $3, 1.0, 0)
            ON CONFLICT (user_id, activity_type) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(activity_type)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let streak = sqlx::query_as::<_, Streak>(
            r#"
            SELECT user_id, activity_type, current_count, max_count,
                   last_activity_at, bonus_multiplier, version
            FROM user_streaks
            WHERE user_id = $1 AND activity_type = $2
            "#,
        )
        .bind(user_id)
        .bind(activity_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(streak)
    }

    async fn save(&self, streak: &Streak, expected_version: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_streaks
            SET current_count = $3,
                max_count = $4,
                last_activity_at = $5,
                bonus_multiplier = $6,
                version = version + 1
            WHERE user_id = $1 AND activity_type = $2 AND version = $7
            "#,
        )
        .bind(streak.user_id)
        .bind(&streak.activity_type)
        .bind(streak.current_count)
        .bind(streak.max_count)
        .bind(streak.last_activity_at)
        .bind(streak.bonus_multiplier)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl BadgeStore for Database {
    async fn earned_badge_ids(&self, user_id: Uuid) -> Result<Vec<String>> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT badge_id FROM user_badges WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<UserBadge>> {
        let badges = sqlx::query_as::<_, UserBadge>(
            r#"
            SELECT user_id, badge_id, earned_at
            FROM user_badges
            WHERE user_id = $1
            ORDER BY earned_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(badges)
    }

    async fn award(&self, user_id: Uuid, badge_id: &str, earned_at: DateTime<Utc>) -> Result<bool> {
        // (user_id, badge_id) 유니크, 경합 시에도 1회만 지급됨
        let result = sqlx::query(
            r#"
            INSERT INTO user_badges (user_id, badge_id, earned_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, badge_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(badge_id)
        .bind(earned_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl ParticipationStore for Database {
    async fn find(&self, participation_id: Uuid) -> Result<Option<MissionParticipation>> {
        // 보상 금액과 미션 타입은 미션 정의에서 조인
        let participation = sqlx::query_as::<_, MissionParticipation>(
            r#"
            SELECT p.id, p.user_id, p.mission_id, p.store_id,
                   m.mission_type, m.reward_amount,
                   p.status, p.proof_data, p.started_at, p.completed_at
            FROM mission_participations p
            JOIN mission_definitions m ON m.id = p.mission_id
            WHERE p.id = $1
            "#,
        )
        .bind(participation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participation)
    }

    async fn count_completed(&self, user_id: Uuid, mission_type: Option<&str>) -> Result<i64> {
        let count: (i64,) = match mission_type {
            Some(mt) => {
                sqlx::query_as(
                    r#"
                    SELECT COUNT(*)
                    FROM mission_participations p
                    JOIN mission_definitions m ON m.id = p.mission_id
                    WHERE p.user_id = $1 AND p.status = 'completed' AND m.mission_type = $2
                    "#,
                )
                .bind(user_id)
                .bind(mt)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT COUNT(*)
                    FROM mission_participations
                    WHERE user_id = $1 AND status = 'completed'
                    "#,
                )
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(count.0)
    }
}

#[async_trait]
impl PaybackStore for Database {
    async fn find(&self, user_id: Uuid, mission_id: Uuid) -> Result<Option<Payback>> {
        let payback = sqlx::query_as::<_, Payback>(
            r#"
            SELECT user_id, mission_id, store_id, amount, status,
                   paid_at, rejection_reason, updated_at
            FROM paybacks
            WHERE user_id = $1 AND mission_id = $2
            "#,
        )
        .bind(user_id)
        .bind(mission_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payback)
    }

    /// 페이백 생성/업데이트 (upsert)
    async fn upsert(&self, payback: &Payback) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO paybacks (
                user_id, mission_id, store_id, amount, status,
                paid_at, rejection_reason, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            ON CONFLICT (user_id, mission_id)
            DO UPDATE SET
                store_id = EXCLUDED.store_id,
                amount = EXCLUDED.amount,
                status = EXCLUDED.status,
                paid_at = EXCLUDED.paid_at,
                rejection_reason = EXCLUDED.rejection_reason,
                updated_at = NOW()
            "#,
        )
        .bind(payback.user_id)
        .bind(payback.mission_id)
        .bind(payback.store_id)
        .bind(payback.amount)
        .bind(&payback.status)
        .bind(payback.paid_at)
        .bind(&payback.rejection_reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Payback>> {
        let paybacks = sqlx::query_as::<_, Payback>(
            r#"
            SELECT user_id, mission_id, store_id, amount, status,
                   paid_at, rejection_reason, updated_at
            FROM paybacks
            WHERE user_id = $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(paybacks)
    }

    async fn total_paid(&self, user_id: Uuid) -> Result<i64> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(amount), 0)::BIGINT
            FROM paybacks
            WHERE user_id = $1 AND status = 'paid'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.0)
    }
}

#[async_trait]
impl AdminStore for Database {
    async fn find_admin(&self, admin_id: Uuid) -> Result<Option<AdminAccount>> {
        let admin =
            sqlx::query_as::<_, AdminAccount>("SELECT id, role FROM admin_users WHERE id = $1")
                .bind(admin_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(admin)
    }

    async fn has_active_assignment(&self, admin_id: Uuid, store_id: Option<i64>) -> Result<bool> {
        let exists: (bool,) = match store_id {
            Some(store) => {
                sqlx::query_as(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM admin_store_assignments
                        WHERE admin_user_id = $1 AND store_id = $2 AND is_active = TRUE
                    )
                    "#,
                )
                .bind(admin_id)
                .bind(store)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT EXISTS (
                        SELECT 1 FROM admin_store_assignments
                        WHERE admin_user_id = $1 AND is_active = TRUE
                    )
                    "#,
                )
                .bind(admin_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(exists.0)
    }
}

#[async_trait]
impl ReferralStore for Database {
    async fn count_verified(&self, referrer_id: Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM referrals
            WHERE referrer_id = $1 AND is_verified = TRUE
            "#,
        )
        .bind(referrer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}

#[async_trait]
impl NotificationStore for Database {
    async fn insert(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, notification_type, title, message, data, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT user_id, notification_type, title, message, data, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }
}

#[async_trait]
impl CouponStore for Database {
    async fn issue(&self, user_id: Uuid, coupon_code: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_coupons (user_id, coupon_code, issued_at)
            VALUES ($1, $2, NOW())
            "#,
        )
        .bind(user_id)
        .bind(coupon_code)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

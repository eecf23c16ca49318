//! Routes Module
//!
//! HTTP 핸들러 레이어. 역할은 3가지뿐:
//! 요청 역직렬화 → 서비스 호출 → 응답 직렬화.
//! 비즈니스 로직은 전부 services/에 있다.

pub mod admin;
pub mod gamification;
pub mod health;
pub mod missions;
pub mod notifications;
pub mod paybacks;

//! 도메인 모델
//!
//! 부트스트랩 계층이 알아야 하는 도메인 정보는 자동 스키마 생성 대상 엔티티뿐입니다.
//!
//! - [`entities`] - 테이블 스키마와 엔티티 구조체

pub mod entities;

pub use entities::{Entity, EntitySchema, ENTITIES};

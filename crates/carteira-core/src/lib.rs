//! # Carteira Core
//!
//! 펀더멘털 집계 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 데이터 계층과 CLI에서 공통으로 사용하는 기본 타입을 제공합니다:
//! - 공급자별 원시 값 파서 ([`parse`], [`ParseValue`])
//! - 단위가 명시된 비율 타입 ([`Fraction`])
//! - 티커 정규화 및 자산 유형
//! - 펀더멘털 레코드와 추세 계산
//! - 시세 및 환율
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;

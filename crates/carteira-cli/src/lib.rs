//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 펀더멘털 조회 및 출력 (table/json)
//! - 시세/환율 조회
//! - 캐시 관리

pub mod commands;

pub use commands::output::OutputFormat;

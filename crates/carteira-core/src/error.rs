//! 핵심 도메인 에러 타입.
//!
//! 설정 로드, 티커 정규화 등 core 계층에서 발생하는 에러를 정의합니다.
//! 공급자(provider) 및 캐시 에러는 `carteira-data`에서 별도로 다룹니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 정규화할 수 없는 티커
    #[error("잘못된 티커: {0:?}")]
    InvalidTicker(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// core 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

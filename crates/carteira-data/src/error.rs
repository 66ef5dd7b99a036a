//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 공급자 어댑터 내부 오류.
///
/// 어댑터 내부에서만 `?`로 전파되며, 트레이트 경계에서 `None`으로 변환됩니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 요청 실패 (네트워크, 타임아웃 포함)
    #[error("HTTP 요청 실패: {0}")]
    Http(#[from] reqwest::Error),

    /// 2xx가 아닌 응답
    #[error("HTTP 상태 오류: {0}")]
    Status(u16),

    /// 예상하지 않은 Content-Type
    #[error("예상하지 않은 Content-Type: {0}")]
    ContentType(String),

    /// JSON 파싱 실패
    #[error("JSON 파싱 실패: {0}")]
    Json(#[from] serde_json::Error),

    /// 데이터 없음
    #[error("데이터 없음: {0}")]
    NotFound(String),

    /// 응답 본문의 오류 표식 (호출 한도 안내 등)
    #[error("API 오류: {0}")]
    ApiError(String),

    /// API 키 미설정
    #[error("API 키가 설정되지 않음: {0}")]
    MissingApiKey(&'static str),

    /// 응답 해석 실패
    #[error("응답 해석 실패: {0}")]
    Parse(String),

    /// 호출 제한 시간 초과
    #[error("호출 시간 초과 ({0}ms)")]
    Timeout(u64),
}

impl ProviderError {
    /// 정상적인 "데이터 없음" 결과인지 확인합니다 (debug 레벨 로깅 대상).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::MissingApiKey(_) | Self::Status(404)
        )
    }
}

/// 데이터 계층 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 공급자 오류
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// 캐시 오류
    #[error("Cache error: {0}")]
    Cache(String),

    /// Redis 오류
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<carteira_core::CoreError> for DataError {
    fn from(err: carteira_core::CoreError) -> Self {
        DataError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(ProviderError::NotFound("XXXX3".into()).is_not_found());
        assert!(ProviderError::Status(404).is_not_found());
        assert!(ProviderError::MissingApiKey("fmp").is_not_found());
        assert!(!ProviderError::Status(500).is_not_found());
        assert!(!ProviderError::ApiError("rate limit".into()).is_not_found());
        assert!(!ProviderError::Timeout(10_000).is_not_found());
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DataError = json_err.into();
        assert!(matches!(err, DataError::Serialization(_)));

        let err: DataError = ProviderError::Status(503).into();
        assert_eq!(err.to_string(), "Provider error: HTTP 상태 오류: 503");
    }
}

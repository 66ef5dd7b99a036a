//! 데이터 공급자(Provider) 모듈.
//!
//! 여러 외부 소스에서 펀더멘털과 시세를 가져오는 어댑터를 정의합니다.
//! 모든 어댑터는 실패 시 `None`을 반환하며 오류를 호출자에게 전파하지 않습니다.
//!
//! ## 1차 공급자
//! - `BrapiClient`: brapi.dev 펀더멘털/시세/가격 이력/암호화폐/환율 API
//!
//! ## 보강 공급자 (우선순위 순)
//! - `FundamentusScraper`: Fundamentus HTML 스크래핑 (B3 종목)
//! - `HgBrasilClient`: HG Brasil Finance API (API 키 필요)
//! - `YahooClient`: Yahoo Finance quote API
//! - `AlphaVantageClient`: Alpha Vantage OVERVIEW/GLOBAL_QUOTE (API 키 필요)
//! - `FmpClient`: Financial Modeling Prep TTM 지표 (API 키 필요)

pub mod alpha_vantage;
pub mod brapi;
pub mod fields;
pub mod fmp;
pub mod fundamentus;
pub mod hgbrasil;
pub mod http;
pub mod yahoo;

use crate::error::ProviderError;
use async_trait::async_trait;
use carteira_core::{
    AssetType, DataSource, ExchangeRate, Fundamentals, PricePoint, Quote, Ticker, TickerDescriptor,
};
use tracing::{debug, warn};

pub use alpha_vantage::AlphaVantageClient;
pub use brapi::BrapiClient;
pub use fmp::FmpClient;
pub use fundamentus::FundamentusScraper;
pub use hgbrasil::HgBrasilClient;
pub use yahoo::YahooClient;

/// 공급자 공통 정보.
pub trait Provider: Send + Sync {
    /// 공급자 식별자.
    fn id(&self) -> DataSource;
}

/// 펀더멘털 공급자.
#[async_trait]
pub trait FundamentalsProvider: Provider {
    /// 정규화된 티커의 펀더멘털을 조회합니다.
    ///
    /// 네트워크 실패, 비정상 응답, 데이터 없음은 모두 `None`입니다.
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Option<Fundamentals>;
}

/// 시세 공급자.
#[async_trait]
pub trait QuoteProvider: Provider {
    /// 지원하는 자산 유형인지 확인합니다. 기본값은 암호화폐 제외.
    fn supports(&self, asset_type: AssetType) -> bool {
        !asset_type.is_crypto()
    }

    /// 시세를 조회합니다. 가격이 없으면 `None`입니다.
    async fn fetch_quote(&self, descriptor: &TickerDescriptor) -> Option<Quote>;
}

/// 환율 공급자.
#[async_trait]
pub trait ExchangeRateProvider: Provider {
    /// 통화쌍(예: `USD-BRL`) 환율을 조회합니다.
    async fn fetch_exchange_rate(&self, pair: &str) -> Option<ExchangeRate>;
}

/// 가격 이력 공급자.
#[async_trait]
pub trait PriceHistoryProvider: Provider {
    /// 기간(`1mo`, `1y` 등)의 일별 종가를 날짜 오름차순으로 조회합니다.
    ///
    /// 실패하면 빈 목록입니다.
    async fn fetch_price_history(&self, ticker: &Ticker, range: &str) -> Vec<PricePoint>;
}

/// 어댑터 내부 결과를 트레이트 경계의 `Option`으로 변환합니다.
///
/// 데이터 없음은 debug, 그 밖의 실패는 warn으로 기록합니다.
pub(crate) fn settle<T>(
    provider: DataSource,
    ticker: &str,
    result: Result<T, ProviderError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_not_found() => {
            debug!(provider = %provider, ticker = ticker, error = %e, "공급자 데이터 없음");
            None
        }
        Err(e) => {
            warn!(provider = %provider, ticker = ticker, error = %e, "공급자 조회 실패");
            None
        }
    }
}

/// 설정된 API 키를 요구합니다.
pub(crate) fn require_key<'a>(
    key: Option<&'a str>,
    provider: &'static str,
) -> Result<&'a str, ProviderError> {
    key.ok_or(ProviderError::MissingApiKey(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle() {
        assert_eq!(settle(DataSource::Brapi, "PETR4", Ok(1)), Some(1));
        assert_eq!(
            settle::<i32>(
                DataSource::Yahoo,
                "PETR4",
                Err(ProviderError::NotFound("PETR4".into()))
            ),
            None
        );
        assert_eq!(
            settle::<i32>(DataSource::Fmp, "PETR4", Err(ProviderError::Status(500))),
            None
        );
    }

    #[test]
    fn test_require_key() {
        assert_eq!(require_key(Some("k"), "fmp").unwrap(), "k");
        assert!(require_key(None, "fmp").unwrap_err().is_not_found());
    }
}

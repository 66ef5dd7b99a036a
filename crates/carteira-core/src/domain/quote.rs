//! 실시간 시세 및 환율.

use super::source::DataSource;
use crate::types::AssetType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 기본 통화.
pub const DEFAULT_CURRENCY: &str = "BRL";

/// 종목 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// 티커
    pub ticker: String,
    /// 자산 유형
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// 현재가
    pub price: Option<Decimal>,
    /// 전일 대비
    pub change: Option<Decimal>,
    /// 등락률 (%)
    pub change_percent: Option<Decimal>,
    /// 전일 종가
    pub previous_close: Option<Decimal>,
    /// 시가
    pub open: Option<Decimal>,
    /// 고가
    pub high: Option<Decimal>,
    /// 저가
    pub low: Option<Decimal>,
    /// 거래량
    pub volume: Option<Decimal>,
    /// 시가총액
    pub market_cap: Option<Decimal>,
    /// 통화
    pub currency: String,
    /// 공급자
    pub source: Option<DataSource>,
    /// 조회 시각
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// 값이 비어 있는 시세를 생성합니다.
    pub fn new(ticker: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            ticker: ticker.into(),
            asset_type,
            price: None,
            change: None,
            change_percent: None,
            previous_close: None,
            open: None,
            high: None,
            low: None,
            volume: None,
            market_cap: None,
            currency: DEFAULT_CURRENCY.to_string(),
            source: None,
            updated_at: Utc::now(),
        }
    }

    /// 모든 공급자가 실패했을 때의 시세.
    pub fn unavailable(ticker: impl Into<String>, asset_type: AssetType) -> Self {
        Self::new(ticker, asset_type)
    }

    /// 가격이 있는지 확인합니다.
    pub fn is_available(&self) -> bool {
        self.price.is_some()
    }

    /// 변동폭/등락률이 비어 있으면 전일 종가로 계산합니다.
    ///
    /// 전일 종가가 0이거나 `Decimal` 범위를 넘으면 해당 필드는 비워 둡니다.
    pub fn derive_change(&mut self) {
        let (Some(price), Some(prev)) = (self.price, self.previous_close) else {
            return;
        };
        let diff = price.checked_sub(prev);
        if self.change.is_none() {
            self.change = diff;
        }
        if self.change_percent.is_none() {
            self.change_percent = diff
                .and_then(|d| d.checked_div(prev))
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                .map(|pct| pct.round_dp(4));
        }
    }
}

/// 환율.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    /// 통화쌍 (예: USD-BRL)
    pub pair: String,
    /// 매수 호가
    pub bid: Option<Decimal>,
    /// 매도 호가
    pub ask: Option<Decimal>,
    /// 공급자
    pub source: Option<DataSource>,
    /// 조회 시각
    pub updated_at: DateTime<Utc>,
}

// ==================== 가격 이력 ====================

/// 기본 가격 이력 기간.
pub const DEFAULT_HISTORY_RANGE: &str = "1y";

/// 조회 가능한 가격 이력 기간.
pub const HISTORY_RANGES: &[&str] = &[
    "1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max",
];

/// 기간 문자열을 정규화합니다. 지원하지 않는 기간이면 `None`입니다.
pub fn history_range(range: &str) -> Option<&'static str> {
    let range = range.trim().to_lowercase();
    HISTORY_RANGES.iter().copied().find(|r| *r == range)
}

/// 일별 가격 이력의 한 점.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// 거래일
    pub date: DateTime<Utc>,
    /// 종가
    pub price: Decimal,
    /// 거래량
    pub volume: Option<Decimal>,
}

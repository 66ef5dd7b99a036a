//! 티커 및 자산 유형 정의.
//!
//! - `Ticker` - 정규화된 거래 심볼 (대문자, 따옴표/공백 제거)
//! - `AssetType` - 자산 유형 (주식, FII, ETF, BDR, 암호화폐)
//! - `TickerDescriptor` - 시세 조회 요청 단위 (`{ticker, type}`)

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 티커에서 제거할 따옴표 문자.
const QUOTE_CHARS: &[char] = &['\'', '"', '`', '‘', '’', '“', '”'];

/// B3(브라질 거래소) 심볼 접미사.
const B3_SUFFIX: &str = ".SA";

/// 정규화된 거래 심볼.
///
/// 사용자 입력이나 저장된 포트폴리오에서 온 문자열은 따옴표, 공백,
/// 소문자가 섞여 있을 수 있으므로 모든 공급자 호출 전에 정규화합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// 원시 문자열을 정규화하여 티커를 생성합니다.
    ///
    /// ```
    /// use carteira_core::types::Ticker;
    ///
    /// let ticker = Ticker::parse("  petr4' ").unwrap();
    /// assert_eq!(ticker.as_str(), "PETR4");
    /// ```
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let ticker = Self::sanitized(raw);

        let valid = !ticker.0.is_empty()
            && ticker
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_'));

        if !valid {
            return Err(CoreError::InvalidTicker(raw.to_string()));
        }

        Ok(ticker)
    }

    /// 검증 없이 정리만 수행합니다.
    ///
    /// 유효하지 않은 입력에 대해서도 응답 레코드를 만들어야 할 때 사용합니다.
    /// 결과는 빈 문자열일 수 있습니다.
    pub fn sanitized(raw: &str) -> Self {
        Self(
            raw.chars()
                .filter(|c| !c.is_whitespace() && !QUOTE_CHARS.contains(c))
                .collect::<String>()
                .to_uppercase(),
        )
    }

    /// 티커 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// B3 형식 심볼인지 확인합니다.
    ///
    /// 영문 4자 + 숫자 1~2자리, 분할 시장용 `F` 접미사 허용 (예: PETR4, TAEE11, ITSA4F).
    pub fn is_b3(&self) -> bool {
        let s = self.0.strip_suffix('F').unwrap_or(&self.0);
        let bytes = s.as_bytes();
        if bytes.len() < 5 || bytes.len() > 6 {
            return false;
        }
        let (letters, digits) = bytes.split_at(4);
        letters.iter().all(u8::is_ascii_uppercase) && digits.iter().all(u8::is_ascii_digit)
    }

    /// 해외 공급자(Yahoo, Alpha Vantage, FMP)용 심볼.
    ///
    /// B3 심볼에만 `.SA`를 붙이고, 이미 접미사가 있거나 해외 심볼이면 그대로 둡니다.
    pub fn b3_symbol(&self) -> String {
        if !self.0.contains('.') && self.is_b3() {
            format!("{}{}", self.0, B3_SUFFIX)
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ticker {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 자산 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    /// 주식 ("Ação")
    #[default]
    Stock,
    /// 부동산 투자 펀드 ("FII")
    Fii,
    /// 상장지수펀드
    Etf,
    /// 브라질 예탁증서
    Bdr,
    /// 암호화폐
    Crypto,
}

impl AssetType {
    /// 레이블을 관대하게 해석합니다. 알 수 없는 값은 `Stock`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "fii" | "fiis" | "reit" => Self::Fii,
            "etf" | "etfs" => Self::Etf,
            "bdr" | "bdrs" => Self::Bdr,
            "crypto" | "cripto" | "criptomoeda" | "cryptocurrency" => Self::Crypto,
            _ => Self::Stock,
        }
    }

    /// 표시용 레이블.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stock => "Ação",
            Self::Fii => "FII",
            Self::Etf => "ETF",
            Self::Bdr => "BDR",
            Self::Crypto => "Crypto",
        }
    }

    /// 암호화폐 여부.
    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for AssetType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<AssetType> for String {
    fn from(asset_type: AssetType) -> Self {
        asset_type.label().to_string()
    }
}

impl FromStr for AssetType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

/// 시세 조회 요청 단위.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickerDescriptor {
    /// 원시 티커 (조회 시 정규화됨)
    pub ticker: String,
    /// 자산 유형
    #[serde(rename = "type", default)]
    pub asset_type: AssetType,
}

impl TickerDescriptor {
    /// 새 요청을 생성합니다.
    pub fn new(ticker: impl Into<String>, asset_type: AssetType) -> Self {
        Self {
            ticker: ticker.into(),
            asset_type,
        }
    }

    /// 주식 요청을 생성합니다.
    pub fn stock(ticker: impl Into<String>) -> Self {
        Self::new(ticker, AssetType::Stock)
    }
}

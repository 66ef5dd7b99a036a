//! 종목별 펀더멘털 레코드.
//!
//! 여러 공급자의 데이터를 하나로 합친 정규화된 스냅샷입니다.
//! 모든 수치 필드는 문서화된 단위의 유한한 값이거나 `None`입니다.
//! 수익성/배당 필드는 `Fraction`(0.15 = 15%)으로만 저장됩니다.

use super::source::DataSource;
use super::trend::{TrendSnapshot, Trends};
use crate::types::{Fraction, Ticker};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 분류 정보가 없을 때의 표식.
pub const NOT_AVAILABLE: &str = "N/A";

/// 모든 수치 필드에 대해 주어진 매크로를 호출합니다.
///
/// 필드 병합/집계 로직이 필드 목록을 한 곳에서만 관리하도록 합니다.
macro_rules! with_numeric_fields {
    ($mac:ident) => {
        $mac!(
            price_earnings,
            price_to_book,
            price_to_sales,
            ev_to_ebitda,
            peg_ratio,
            return_on_equity,
            return_on_assets,
            return_on_invested_capital,
            net_margin,
            dividend_yield,
            last_dividend_per_share,
            earnings_per_share,
            book_value_per_share,
            debt_to_ebitda,
            debt_to_equity,
            revenue_growth_trailing_5y,
            earnings_growth,
            price,
            market_cap
        )
    };
}

/// 필수 필드 (ROE, 배당수익률, P/VP).
///
/// 하나라도 비어 있으면 보조 공급자로 보강합니다.
pub const ESSENTIAL_FIELDS: [&str; 3] = ["returnOnEquity", "dividendYield", "priceToBook"];

/// 종목 펀더멘털.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    /// 정규화된 티커
    pub ticker: Ticker,

    // ==================== 가치 평가 ====================
    /// P/L (주가수익비율)
    pub price_earnings: Option<Decimal>,
    /// P/VP (주가순자산비율)
    pub price_to_book: Option<Decimal>,
    /// PSR (주가매출비율)
    pub price_to_sales: Option<Decimal>,
    /// EV/EBITDA
    pub ev_to_ebitda: Option<Decimal>,
    /// PEG (P/L ÷ 성장률), 로컬 계산 전용
    pub peg_ratio: Option<Decimal>,

    // ==================== 수익성 (소수 비율) ====================
    /// ROE
    pub return_on_equity: Option<Fraction>,
    /// ROA
    pub return_on_assets: Option<Fraction>,
    /// ROIC
    pub return_on_invested_capital: Option<Fraction>,
    /// 순이익률
    pub net_margin: Option<Fraction>,

    // ==================== 배당/주당 지표 ====================
    /// 배당수익률
    pub dividend_yield: Option<Fraction>,
    /// 최근 주당 배당금
    pub last_dividend_per_share: Option<Decimal>,
    /// LPA (주당순이익)
    pub earnings_per_share: Option<Decimal>,
    /// VPA (주당순자산)
    pub book_value_per_share: Option<Decimal>,

    // ==================== 레버리지 ====================
    /// 순부채/EBITDA
    pub debt_to_ebitda: Option<Decimal>,
    /// 총부채/자기자본
    pub debt_to_equity: Option<Decimal>,

    // ==================== 성장 ====================
    /// 최근 5년 매출 성장률
    #[serde(rename = "revenueGrowthTrailing5y")]
    pub revenue_growth_trailing_5y: Option<Fraction>,
    /// 이익 성장률 (PEG 계산용)
    pub earnings_growth: Option<Fraction>,

    // ==================== 시장 ====================
    /// 현재가
    pub price: Option<Decimal>,
    /// 시가총액
    pub market_cap: Option<Decimal>,

    // ==================== 분류 ====================
    /// 섹터 (없으면 "N/A")
    pub sector: String,
    /// 업종 (없으면 "N/A")
    pub industry: String,

    // ==================== 출처 ====================
    /// 가장 많은 필드를 제공한 공급자
    pub source: Option<DataSource>,
    /// 조회 시각
    pub updated_at: DateTime<Utc>,
    /// 이전 스냅샷 대비 추세 (이전 스냅샷이 있을 때만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trends: Option<Trends>,
}

impl Fundamentals {
    /// 모든 값이 비어 있는 레코드를 생성합니다.
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            price_earnings: None,
            price_to_book: None,
            price_to_sales: None,
            ev_to_ebitda: None,
            peg_ratio: None,
            return_on_equity: None,
            return_on_assets: None,
            return_on_invested_capital: None,
            net_margin: None,
            dividend_yield: None,
            last_dividend_per_share: None,
            earnings_per_share: None,
            book_value_per_share: None,
            debt_to_ebitda: None,
            debt_to_equity: None,
            revenue_growth_trailing_5y: None,
            earnings_growth: None,
            price: None,
            market_cap: None,
            sector: NOT_AVAILABLE.to_string(),
            industry: NOT_AVAILABLE.to_string(),
            source: None,
            updated_at: Utc::now(),
            trends: None,
        }
    }

    /// 모든 공급자가 실패했을 때 반환하는 표준 레코드.
    pub fn unavailable(ticker: Ticker) -> Self {
        Self::new(ticker)
    }

    /// 데이터를 제공한 공급자를 지정합니다.
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = Some(source);
        self
    }

    /// 섹터를 설정합니다. 빈 문자열이나 "N/A"는 무시합니다.
    pub fn set_sector(&mut self, sector: Option<&str>) {
        if let Some(s) = classification(sector) {
            self.sector = s;
        }
    }

    /// 업종을 설정합니다. 빈 문자열이나 "N/A"는 무시합니다.
    pub fn set_industry(&mut self, industry: Option<&str>) {
        if let Some(s) = classification(industry) {
            self.industry = s;
        }
    }

    /// 비어 있는 필드만 `other`의 값으로 채웁니다.
    ///
    /// 이미 값이 있는 필드는 절대 덮어쓰지 않습니다.
    /// 채운 필드 수를 반환합니다.
    pub fn fill_gaps(&mut self, other: &Fundamentals) -> usize {
        let this = self;
        let mut filled = 0;

        macro_rules! fill {
            ($($field:ident),+) => {
                $(
                    if this.$field.is_none() && other.$field.is_some() {
                        this.$field = other.$field;
                        filled += 1;
                    }
                )+
            };
        }
        with_numeric_fields!(fill);

        if this.sector == NOT_AVAILABLE && other.sector != NOT_AVAILABLE {
            this.sector = other.sector.clone();
            filled += 1;
        }
        if this.industry == NOT_AVAILABLE && other.industry != NOT_AVAILABLE {
            this.industry = other.industry.clone();
            filled += 1;
        }

        filled
    }

    /// 값이 있는 필드 수 (분류 포함).
    pub fn populated_count(&self) -> usize {
        let this = self;
        let mut count = 0;

        macro_rules! tally {
            ($($field:ident),+) => {
                $(
                    if this.$field.is_some() {
                        count += 1;
                    }
                )+
            };
        }
        with_numeric_fields!(tally);

        count
            + usize::from(this.sector != NOT_AVAILABLE)
            + usize::from(this.industry != NOT_AVAILABLE)
    }

    /// 수치 필드를 (이름, 값) 목록으로 반환합니다.
    pub fn numeric_values(&self) -> Vec<(&'static str, Option<Decimal>)> {
        let this = self;
        let mut values = Vec::new();

        macro_rules! collect {
            ($($field:ident),+) => {
                $(
                    values.push((stringify!($field), this.$field.map(Decimal::from)));
                )+
            };
        }
        with_numeric_fields!(collect);

        values
    }

    /// 필수 필드(ROE, DY, P/VP)가 모두 있는지 확인합니다.
    pub fn has_all_essentials(&self) -> bool {
        self.missing_essentials().is_empty()
    }

    /// 필수 필드 중 하나라도 있는지 확인합니다.
    pub fn has_any_essential(&self) -> bool {
        self.missing_essentials().len() < ESSENTIAL_FIELDS.len()
    }

    /// 비어 있는 필수 필드 이름.
    pub fn missing_essentials(&self) -> Vec<&'static str> {
        let present = [
            self.return_on_equity.is_some(),
            self.dividend_yield.is_some(),
            self.price_to_book.is_some(),
        ];
        ESSENTIAL_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }

    /// 캐시된 레코드를 그대로 반환해도 되는지 확인합니다 (ROE와 DY 모두 존재).
    pub fn is_cache_complete(&self) -> bool {
        self.return_on_equity.is_some() && self.dividend_yield.is_some()
    }

    /// 모든 필드가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.populated_count() == 0
    }

    /// PEG를 계산합니다: P/L ÷ (성장률 × 100).
    ///
    /// 이익 성장률을 우선 사용하고, 없으면 5년 매출 성장률을 사용합니다.
    /// 성장률이 0 이하이거나 계산이 `Decimal` 범위를 넘으면 비워 둡니다.
    pub fn derive_peg(&mut self) {
        if self.peg_ratio.is_some() {
            return;
        }
        let Some(pe) = self.price_earnings else {
            return;
        };
        let Some(growth) = self.earnings_growth.or(self.revenue_growth_trailing_5y) else {
            return;
        };

        let Some(growth_pct) = growth.as_percent().filter(|g| *g > Decimal::ZERO) else {
            return;
        };
        self.peg_ratio = pe.checked_div(growth_pct).map(|v| v.round_dp(4).normalize());
    }

    /// 추세 비교용 축약 스냅샷.
    pub fn snapshot(&self) -> TrendSnapshot {
        TrendSnapshot {
            price_earnings: self.price_earnings,
            return_on_equity: self.return_on_equity.map(Fraction::value),
            dividend_yield: self.dividend_yield.map(Fraction::value),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

fn classification(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() || value.eq_ignore_ascii_case(NOT_AVAILABLE) {
        None
    } else {
        Some(value.to_string())
    }
}

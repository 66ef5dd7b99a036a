//! brapi.dev 클라이언트.
//!
//! 펀더멘털 파이프라인의 1차 공급자입니다.
//!
//! ## 엔드포인트
//! - `/fundamentals/{T}`: 통합 펀더멘털 (pl, pvp, roe, dy 등, 소수 비율)
//! - `/quote/{T}?fundamental=true`: 시세 + 기본 지표 (roe, dividendYield 등은 퍼센트)
//! - `/quote/{T}?range={R}&interval=1d`: 일별 가격 이력 (`historicalDataPrice`)
//! - `/v2/crypto?coin={T}&currency=BRL`: 암호화폐 시세
//! - `/v2/currency?currency=USD-BRL`: 환율
//!
//! 토큰 없이도 일부 종목은 조회할 수 있으므로 토큰은 선택 사항입니다.

use super::fields::{first, fraction, percent, plain, ratio, text};
use super::http::get_json;
use super::{
    settle, ExchangeRateProvider, FundamentalsProvider, PriceHistoryProvider, Provider,
    QuoteProvider,
};
use crate::error::ProviderError;
use async_trait::async_trait;
use carteira_core::{
    history_range, AssetType, DataSource, ExchangeRate, Fundamentals, PricePoint, Quote, Ticker,
    TickerDescriptor, DEFAULT_CURRENCY,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

/// brapi.dev API 클라이언트.
#[derive(Clone)]
pub struct BrapiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl BrapiClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// API 토큰을 설정합니다.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    fn query<'a>(&'a self, params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut query = params.to_vec();
        if let Some(token) = &self.token {
            query.push(("token", token.as_str()));
        }
        query
    }

    /// `results[0]`을 가져옵니다.
    async fn first_result(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let payload = get_json(&self.client, &url, &self.query(params)).await?;
        Ok(first(&payload, "results").cloned())
    }

    /// 펀더멘털 + 시세 엔드포인트를 동시에 호출하여 병합합니다.
    ///
    /// 펀더멘털 엔드포인트 값이 시세 엔드포인트 값보다 우선합니다.
    async fn load_fundamentals(&self, ticker: &Ticker) -> Result<Fundamentals, ProviderError> {
        let fundamentals_path = format!("/fundamentals/{}", ticker);
        let quote_path = format!("/quote/{}", ticker);

        let (fundamentals, quote) = tokio::join!(
            self.first_result(&fundamentals_path, &[]),
            self.first_result(&quote_path, &[("fundamental", "true")]),
        );

        let (fundamentals, quote) = match (fundamentals, quote) {
            (Err(e), Err(_)) => return Err(e),
            (f, q) => (
                log_partial(f, "fundamentals", ticker),
                log_partial(q, "quote", ticker),
            ),
        };

        if fundamentals.is_none() && quote.is_none() {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }

        let mut result = match &fundamentals {
            Some(payload) => map_fundamentals(ticker, payload),
            None => Fundamentals::new(ticker.clone()).with_source(DataSource::Brapi),
        };
        if let Some(payload) = &quote {
            result.fill_gaps(&map_quote_fundamentals(ticker, payload));
        }

        if result.is_empty() {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }
        Ok(result)
    }

    async fn load_quote(&self, descriptor: &TickerDescriptor) -> Result<Quote, ProviderError> {
        let path = format!("/quote/{}", descriptor.ticker);
        let payload = self
            .first_result(&path, &[])
            .await?
            .ok_or_else(|| ProviderError::NotFound(descriptor.ticker.clone()))?;

        map_quote(descriptor, &payload)
    }

    async fn load_price_history(
        &self,
        ticker: &Ticker,
        range: &str,
    ) -> Result<Vec<PricePoint>, ProviderError> {
        let range = history_range(range)
            .ok_or_else(|| ProviderError::Parse(format!("지원하지 않는 기간: {}", range)))?;
        let path = format!("/quote/{}", ticker);
        let payload = self
            .first_result(&path, &[("range", range), ("interval", "1d")])
            .await?
            .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;

        Ok(map_price_history(&payload))
    }

    async fn load_crypto(&self, descriptor: &TickerDescriptor) -> Result<Quote, ProviderError> {
        let url = format!("{}/v2/crypto", self.base_url);
        let params = [
            ("coin", descriptor.ticker.as_str()),
            ("currency", DEFAULT_CURRENCY),
        ];
        let payload = get_json(&self.client, &url, &self.query(&params)).await?;
        let coin = first(&payload, "coins")
            .ok_or_else(|| ProviderError::NotFound(descriptor.ticker.clone()))?;

        map_quote(descriptor, coin)
    }

    async fn load_exchange_rate(&self, pair: &str) -> Result<ExchangeRate, ProviderError> {
        let url = format!("{}/v2/currency", self.base_url);
        let payload = get_json(&self.client, &url, &self.query(&[("currency", pair)])).await?;
        let rate = first(&payload, "currency")
            .ok_or_else(|| ProviderError::NotFound(pair.to_string()))?;

        let bid = plain(rate, &["bidPrice"]);
        if bid.is_none() {
            return Err(ProviderError::Parse(format!("{} 매수 호가 없음", pair)));
        }

        Ok(ExchangeRate {
            pair: pair.to_string(),
            bid,
            ask: plain(rate, &["askPrice"]),
            source: Some(DataSource::Brapi),
            updated_at: Utc::now(),
        })
    }
}

fn log_partial(
    result: Result<Option<Value>, ProviderError>,
    endpoint: &'static str,
    ticker: &Ticker,
) -> Option<Value> {
    match result {
        Ok(payload) => payload,
        Err(e) => {
            debug!(provider = "brapi", endpoint, ticker = %ticker, error = %e, "엔드포인트 실패, 나머지 응답만 사용");
            None
        }
    }
}

// ==================== 필드 매핑 ====================

/// `/fundamentals` 응답 매핑 (비율은 모두 소수).
fn map_fundamentals(ticker: &Ticker, f: &Value) -> Fundamentals {
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::Brapi);

    out.price_earnings = ratio(f, &["pl"]);
    out.price_to_book = ratio(f, &["pvp"]);
    out.price_to_sales = ratio(f, &["ps"]);
    out.ev_to_ebitda = ratio(f, &["evEbitda"]);
    out.return_on_equity = fraction(f, &["roe", "returnOnEquity"]);
    out.return_on_assets = fraction(f, &["roa", "returnOnAssets"]);
    out.return_on_invested_capital = fraction(f, &["roic"]);
    out.net_margin = fraction(f, &["margemLiquida", "profitMargin"]);
    out.dividend_yield = fraction(f, &["dy"]);
    out.last_dividend_per_share = ratio(f, &["ultimoDividendo", "lastDividend"]);
    out.earnings_per_share = ratio(f, &["lucroPorAcao"]);
    out.book_value_per_share = ratio(f, &["valorPatrimonialPorAcao"]);
    out.debt_to_ebitda = ratio(f, &["dividaLiquidaEbitda", "netDebtToEbitda", "debtToEbitda"]);
    out.debt_to_equity = ratio(f, &["debtEquity"]);
    out.revenue_growth_trailing_5y = fraction(f, &["crescimentoReceita5Anos", "revenueGrowth"]);
    out.set_sector(text(f, &["setor"]));
    out.set_industry(text(f, &["subSetor"]));

    out
}

/// `/quote?fundamental=true` 응답 매핑 (수익성/배당 지표는 퍼센트).
fn map_quote_fundamentals(ticker: &Ticker, q: &Value) -> Fundamentals {
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::Brapi);
    let profile = q.get("summaryProfile").unwrap_or(&Value::Null);

    out.price_earnings = ratio(q, &["priceEarnings"]);
    out.price_to_book = ratio(q, &["priceToBook"]);
    out.price_to_sales = ratio(q, &["priceToSalesTrailing12Months"]);
    out.ev_to_ebitda = ratio(q, &["enterpriseValueToEbitda"]);
    out.return_on_equity = percent(q, &["roe"]);
    out.return_on_assets = percent(q, &["roa"]);
    out.net_margin = percent(q, &["profitMargin", "liquidMargin"]);
    out.dividend_yield = percent(q, &["dividendYield"]);
    out.debt_to_equity = percent(q, &["debtToEquity"]).map(Decimal::from);
    out.earnings_per_share = ratio(q, &["earningsPerShare"]);
    out.earnings_growth = fraction(q, &["earningsGrowth"]);
    out.price = ratio(q, &["regularMarketPrice"]);
    out.market_cap = ratio(q, &["marketCap"]);
    out.set_sector(text(q, &["sector"]).or_else(|| text(profile, &["sector"])));
    out.set_industry(text(q, &["industry"]).or_else(|| text(profile, &["industry"])));

    out
}

/// `regularMarket*` 필드 시세 매핑 (주식/암호화폐 공통).
fn map_quote(descriptor: &TickerDescriptor, q: &Value) -> Result<Quote, ProviderError> {
    let mut quote = Quote::new(descriptor.ticker.clone(), descriptor.asset_type);

    quote.price = ratio(q, &["regularMarketPrice"]);
    if quote.price.is_none() {
        return Err(ProviderError::NotFound(descriptor.ticker.clone()));
    }
    quote.change = ratio(q, &["regularMarketChange"]);
    quote.change_percent = ratio(q, &["regularMarketChangePercent"]);
    quote.previous_close = ratio(q, &["regularMarketPreviousClose"]);
    quote.open = ratio(q, &["regularMarketOpen"]);
    quote.high = ratio(q, &["regularMarketDayHigh"]);
    quote.low = ratio(q, &["regularMarketDayLow"]);
    quote.volume = ratio(q, &["regularMarketVolume"]);
    quote.market_cap = ratio(q, &["marketCap"]);
    if let Some(currency) = text(q, &["currency"]) {
        quote.currency = currency.to_string();
    }
    quote.source = Some(DataSource::Brapi);
    quote.derive_change();

    Ok(quote)
}

/// `historicalDataPrice`를 날짜 오름차순 가격 이력으로 변환합니다.
///
/// 날짜(유닉스 초)나 종가가 없는 항목은 건너뜁니다.
fn map_price_history(payload: &Value) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = payload
        .get("historicalDataPrice")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(map_price_point).collect())
        .unwrap_or_default();
    points.sort_by_key(|p| p.date);
    points
}

fn map_price_point(item: &Value) -> Option<PricePoint> {
    let date = item
        .get("date")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))?;
    Some(PricePoint {
        date,
        price: plain(item, &["close"])?,
        volume: plain(item, &["volume"]),
    })
}

// ==================== 트레이트 구현 ====================

impl Provider for BrapiClient {
    fn id(&self) -> DataSource {
        DataSource::Brapi
    }
}

#[async_trait]
impl FundamentalsProvider for BrapiClient {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Option<Fundamentals> {
        settle(self.id(), ticker.as_str(), self.load_fundamentals(ticker).await)
    }
}

#[async_trait]
impl QuoteProvider for BrapiClient {
    fn supports(&self, _asset_type: AssetType) -> bool {
        true
    }

    async fn fetch_quote(&self, descriptor: &TickerDescriptor) -> Option<Quote> {
        let result = if descriptor.asset_type.is_crypto() {
            self.load_crypto(descriptor).await
        } else {
            self.load_quote(descriptor).await
        };
        settle(self.id(), &descriptor.ticker, result)
    }
}

#[async_trait]
impl ExchangeRateProvider for BrapiClient {
    async fn fetch_exchange_rate(&self, pair: &str) -> Option<ExchangeRate> {
        settle(self.id(), pair, self.load_exchange_rate(pair).await)
    }
}

#[async_trait]
impl PriceHistoryProvider for BrapiClient {
    async fn fetch_price_history(&self, ticker: &Ticker, range: &str) -> Vec<PricePoint> {
        settle(self.id(), ticker.as_str(), self.load_price_history(ticker, range).await)
            .unwrap_or_default()
    }
}

//! Yahoo Finance quote API 클라이언트.
//!
//! `/v7/finance/quote?symbols=PETR4.SA` 하나로 펀더멘털 보강과 시세를 모두 처리합니다.
//! B3 종목은 `.SA` 접미사를 붙여 조회합니다.

use super::fields::{first, fraction, percent, ratio, text};
use super::http::get_json;
use super::{settle, FundamentalsProvider, Provider, QuoteProvider};
use crate::error::ProviderError;
use async_trait::async_trait;
use carteira_core::{DataSource, Fundamentals, Quote, Ticker, TickerDescriptor};
use reqwest::Client;
use serde_json::Value;

/// Yahoo Finance 클라이언트.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `quoteResponse.result[0]`을 가져옵니다.
    async fn quote_result(&self, ticker: &Ticker) -> Result<Value, ProviderError> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let symbol = ticker.b3_symbol();
        let payload = get_json(&self.client, &url, &[("symbols", symbol.as_str())]).await?;

        let response = payload.get("quoteResponse").unwrap_or(&Value::Null);
        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            return Err(ProviderError::ApiError(error.to_string()));
        }

        first(response, "result")
            .cloned()
            .ok_or(ProviderError::NotFound(symbol))
    }

    async fn load_fundamentals(&self, ticker: &Ticker) -> Result<Fundamentals, ProviderError> {
        let result = self.quote_result(ticker).await?;
        let fundamentals = map_fundamentals(ticker, &result);
        if fundamentals.is_empty() {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }
        Ok(fundamentals)
    }

    async fn load_quote(&self, descriptor: &TickerDescriptor) -> Result<Quote, ProviderError> {
        let ticker = Ticker::parse(&descriptor.ticker)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let result = self.quote_result(&ticker).await?;
        map_quote(descriptor, &result)
    }
}

// ==================== 필드 매핑 ====================

fn map_fundamentals(ticker: &Ticker, r: &Value) -> Fundamentals {
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::Yahoo);

    out.price_earnings = ratio(r, &["trailingPE", "forwardPE"]);
    out.price_to_book = ratio(r, &["priceToBook"]);
    out.dividend_yield = fraction(r, &["trailingAnnualDividendYield"])
        .or_else(|| percent(r, &["dividendYield"]));
    out.return_on_equity = fraction(r, &["returnOnEquity"]);
    out.net_margin = fraction(r, &["profitMargins"]);
    out.earnings_per_share = ratio(r, &["epsTrailingTwelveMonths"]);
    out.book_value_per_share = ratio(r, &["bookValue"]);
    out.last_dividend_per_share = ratio(r, &["trailingAnnualDividendRate"]);
    out.market_cap = ratio(r, &["marketCap"]);
    out.price = ratio(r, &["regularMarketPrice"]);
    out.set_sector(text(r, &["sector"]));
    out.set_industry(text(r, &["industry"]));

    out
}

fn map_quote(descriptor: &TickerDescriptor, r: &Value) -> Result<Quote, ProviderError> {
    let mut quote = Quote::new(descriptor.ticker.clone(), descriptor.asset_type);

    quote.price = ratio(r, &["regularMarketPrice"]);
    if quote.price.is_none() {
        return Err(ProviderError::NotFound(descriptor.ticker.clone()));
    }
    quote.change = ratio(r, &["regularMarketChange"]);
    quote.change_percent = ratio(r, &["regularMarketChangePercent"]);
    quote.previous_close = ratio(r, &["regularMarketPreviousClose"]);
    quote.open = ratio(r, &["regularMarketOpen"]);
    quote.high = ratio(r, &["regularMarketDayHigh"]);
    quote.low = ratio(r, &["regularMarketDayLow"]);
    quote.volume = ratio(r, &["regularMarketVolume"]);
    quote.market_cap = ratio(r, &["marketCap"]);
    if let Some(currency) = text(r, &["currency"]) {
        quote.currency = currency.to_string();
    }
    quote.source = Some(DataSource::Yahoo);
    quote.derive_change();

    Ok(quote)
}

// ==================== 트레이트 구현 ====================

impl Provider for YahooClient {
    fn id(&self) -> DataSource {
        DataSource::Yahoo
    }
}

#[async_trait]
impl FundamentalsProvider for YahooClient {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Option<Fundamentals> {
        settle(self.id(), ticker.as_str(), self.load_fundamentals(ticker).await)
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn fetch_quote(&self, descriptor: &TickerDescriptor) -> Option<Quote> {
        settle(self.id(), &descriptor.ticker, self.load_quote(descriptor).await)
    }
}

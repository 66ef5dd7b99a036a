//! HG Brasil Finance 클라이언트.
//!
//! 브라질 종목 전문 API로 `results[{TICKER}]` 객체에 지표를 담아 돌려줍니다.
//! 비율 지표(`dividend_yield`, `return_on_equity`, `net_margin`)는 소수 비율입니다.

use super::fields::{fraction, ratio, text};
use super::http::get_json;
use super::{require_key, settle, FundamentalsProvider, Provider};
use crate::error::ProviderError;
use async_trait::async_trait;
use carteira_core::{DataSource, Fundamentals, Ticker};
use reqwest::Client;
use serde_json::Value;

/// HG Brasil API 클라이언트.
#[derive(Clone)]
pub struct HgBrasilClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HgBrasilClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// API 키를 설정합니다.
    pub fn with_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    async fn load(&self, ticker: &Ticker) -> Result<Fundamentals, ProviderError> {
        let key = require_key(self.api_key.as_deref(), "hgbrasil")?;
        let url = format!("{}/finance/stock_price", self.base_url);
        let payload = get_json(
            &self.client,
            &url,
            &[("key", key), ("symbol", ticker.as_str())],
        )
        .await?;

        if payload.get("valid_key").and_then(Value::as_bool) == Some(false) {
            return Err(ProviderError::ApiError("유효하지 않은 API 키".to_string()));
        }

        let entry = payload
            .get("results")
            .and_then(|results| results.get(ticker.as_str()))
            .filter(|entry| entry.is_object())
            .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;

        if entry.get("error").and_then(Value::as_bool) == Some(true) {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }

        let result = map_stock(ticker, entry);
        if result.is_empty() {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }
        Ok(result)
    }
}

fn map_stock(ticker: &Ticker, s: &Value) -> Fundamentals {
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::HgBrasil);

    out.price_earnings = ratio(s, &["price_earnings"]);
    out.price_to_book = ratio(s, &["price_book_value", "price_to_book"]);
    out.dividend_yield = fraction(s, &["dividend_yield"]);
    out.return_on_equity = fraction(s, &["return_on_equity"]);
    out.net_margin = fraction(s, &["net_margin"]);
    out.market_cap = ratio(s, &["market_cap"]);
    out.price = ratio(s, &["price"]);
    out.set_sector(text(s, &["sector"]));

    out
}

impl Provider for HgBrasilClient {
    fn id(&self) -> DataSource {
        DataSource::HgBrasil
    }
}

#[async_trait]
impl FundamentalsProvider for HgBrasilClient {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Option<Fundamentals> {
        settle(self.id(), ticker.as_str(), self.load(ticker).await)
    }
}

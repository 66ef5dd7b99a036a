//! Financial Modeling Prep(FMP) 클라이언트.
//!
//! TTM 비율(`ratios-ttm`)과 TTM 핵심 지표(`key-metrics-ttm`)를 동시에 조회하여 병합합니다.
//! 두 응답 모두 배열이며 첫 번째 원소만 사용합니다.

use super::fields::{fraction, percent, ratio};
use super::http::get_json;
use super::{require_key, settle, FundamentalsProvider, Provider};
use crate::error::ProviderError;
use async_trait::async_trait;
use carteira_core::{DataSource, Fundamentals, Ticker};
use reqwest::Client;
use serde_json::Value;

/// FMP API 클라이언트.
#[derive(Clone)]
pub struct FmpClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FmpClient {
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

    /// 배열 응답의 첫 번째 원소를 가져옵니다.
    async fn first_entry(&self, endpoint: &str, symbol: &str) -> Result<Option<Value>, ProviderError> {
        let key = require_key(self.api_key.as_deref(), "fmp")?;
        let url = format!("{}/api/v3/{}/{}", self.base_url, endpoint, symbol);
        let payload = get_json(&self.client, &url, &[("apikey", key)]).await?;

        if let Some(message) = payload.get("Error Message").and_then(Value::as_str) {
            return Err(ProviderError::ApiError(message.to_string()));
        }

        Ok(payload
            .as_array()
            .and_then(|items| items.first())
            .filter(|item| item.is_object())
            .cloned())
    }

    async fn load(&self, ticker: &Ticker) -> Result<Fundamentals, ProviderError> {
        let symbol = ticker.b3_symbol();
        let (ratios, metrics) = tokio::join!(
            self.first_entry("ratios-ttm", &symbol),
            self.first_entry("key-metrics-ttm", &symbol),
        );
        let (ratios, metrics) = (ratios?, metrics?);

        if ratios.is_none() && metrics.is_none() {
            return Err(ProviderError::NotFound(symbol));
        }

        let result = map_ttm(
            ticker,
            ratios.as_ref().unwrap_or(&Value::Null),
            metrics.as_ref().unwrap_or(&Value::Null),
        );
        if result.is_empty() {
            return Err(ProviderError::NotFound(symbol));
        }
        Ok(result)
    }
}

// ==================== 필드 매핑 ====================

fn map_ttm(ticker: &Ticker, r: &Value, m: &Value) -> Fundamentals {
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::Fmp);

    out.price_earnings = ratio(r, &["peRatioTTM", "priceEarningsRatioTTM"]);
    out.price_to_book = ratio(r, &["priceToBookRatioTTM", "priceToBookValueRatioTTM"]);
    out.price_to_sales = ratio(r, &["priceToSalesRatioTTM"]);
    out.ev_to_ebitda = ratio(r, &["enterpriseValueMultipleTTM"])
        .or_else(|| ratio(m, &["enterpriseValueOverEBITDATTM"]));
    out.return_on_equity = fraction(r, &["returnOnEquityTTM"]);
    out.return_on_assets = fraction(r, &["returnOnAssetsTTM"]);
    out.net_margin = fraction(r, &["netProfitMarginTTM"]);
    out.dividend_yield = fraction(r, &["dividendYieldTTM"])
        .or_else(|| percent(r, &["dividendYielPercentageTTM", "dividendYieldPercentageTTM"]));
    out.debt_to_equity = ratio(r, &["debtEquityRatioTTM"]);

    out.return_on_invested_capital = fraction(m, &["roicTTM"]);
    out.debt_to_ebitda = ratio(m, &["netDebtToEBITDATTM"]);
    out.book_value_per_share = ratio(m, &["bookValuePerShareTTM"]);
    out.earnings_per_share = ratio(m, &["netIncomePerShareTTM"]);
    out.market_cap = ratio(m, &["marketCapTTM"]);

    out
}

impl Provider for FmpClient {
    fn id(&self) -> DataSource {
        DataSource::Fmp
    }
}

#[async_trait]
impl FundamentalsProvider for FmpClient {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Option<Fundamentals> {
        settle(self.id(), ticker.as_str(), self.load(ticker).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::build_client;
    use carteira_core::Fraction;
    use mockito::Matcher;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;

    fn client(base_url: &str) -> FmpClient {
        let http = build_client(Duration::from_secs(5), "carteira-test").unwrap();
        FmpClient::new(http, base_url).with_key(Some("fmp-key".to_string()))
    }

    #[test]
    fn test_map_ttm() {
        let ticker = Ticker::parse("MSFT").unwrap();
        let f = map_ttm(
            &ticker,
            &json!({
                "peRatioTTM": 35.2, "priceToBookRatioTTM": 11.9,
                "returnOnEquityTTM": 0.35, "dividendYielPercentageTTM": 0.72,
                "netProfitMarginTTM": 0.36, "debtEquityRatioTTM": 0.29
            }),
            &json!({"roicTTM": 0.27, "marketCapTTM": 3100000000000u64, "netIncomePerShareTTM": 11.8}),
        );
        assert_eq!(f.price_earnings, Some(dec!(35.2)));
        assert_eq!(f.dividend_yield.map(Fraction::value), Some(dec!(0.0072)));
        assert_eq!(f.return_on_invested_capital.map(Fraction::value), Some(dec!(0.27)));
        assert_eq!(f.earnings_per_share, Some(dec!(11.8)));
        assert_eq!(f.source, Some(DataSource::Fmp));
    }

    #[tokio::test]
    async fn test_fetch_merges_both_endpoints() {
        let mut server = mockito::Server::new_async().await;
        let ratios = server
            .mock("GET", "/api/v3/ratios-ttm/BBAS3.SA")
            .match_query(Matcher::UrlEncoded("apikey".into(), "fmp-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"priceToBookRatioTTM": 0.9, "dividendYieldTTM": 0.095}]"#)
            .create_async()
            .await;
        let metrics = server
            .mock("GET", "/api/v3/key-metrics-ttm/BBAS3.SA")
            .match_query(Matcher::UrlEncoded("apikey".into(), "fmp-key".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"bookValuePerShareTTM": 31.2}]"#)
            .create_async()
            .await;

        let ticker = Ticker::parse("BBAS3").unwrap();
        let f = client(&server.url()).fetch_fundamentals(&ticker).await.unwrap();
        assert_eq!(f.price_to_book, Some(dec!(0.9)));
        assert_eq!(f.dividend_yield.map(Fraction::value), Some(dec!(0.095)));
        assert_eq!(f.book_value_per_share, Some(dec!(31.2)));
        ratios.assert_async().await;
        metrics.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_arrays_are_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v3/.*".into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(2)
            .create_async()
            .await;

        let ticker = Ticker::parse("ZZZZ3").unwrap();
        let err = client(&server.url()).load(&ticker).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v3/.*".into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let ticker = Ticker::parse("MSFT").unwrap();
        assert!(client(&server.url()).fetch_fundamentals(&ticker).await.is_none());
    }
}

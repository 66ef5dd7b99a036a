//! Alpha Vantage 클라이언트.
//!
//! 해외 상장 종목과 B3 종목(`.SA`)의 OVERVIEW 지표를 제공합니다.
//! 모든 수치는 `.` 소수점 문자열이며 값이 없으면 `"None"`입니다.
//!
//! 무료 키는 호출 한도가 낮아 한도 초과 시 `Note`/`Information` 필드만 담긴
//! 정상 응답(200)을 돌려주므로 본문 표식을 확인해야 합니다.

use super::fields::{plain, text};
use super::http::get_json;
use super::{require_key, settle, FundamentalsProvider, Provider, QuoteProvider};
use crate::error::ProviderError;
use async_trait::async_trait;
use carteira_core::{DataSource, Fraction, Fundamentals, Quote, Ticker, TickerDescriptor};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

/// Alpha Vantage API 클라이언트.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageClient {
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

    /// `/query?function=..&symbol=..` 호출 후 본문 표식을 확인합니다.
    async fn query(&self, function: &str, symbol: &str) -> Result<Value, ProviderError> {
        let key = require_key(self.api_key.as_deref(), "alpha_vantage")?;
        let url = format!("{}/query", self.base_url);
        let payload = get_json(
            &self.client,
            &url,
            &[("function", function), ("symbol", symbol), ("apikey", key)],
        )
        .await?;

        check_sentinels(symbol, payload)
    }

    async fn load_fundamentals(&self, ticker: &Ticker) -> Result<Fundamentals, ProviderError> {
        let symbol = ticker.b3_symbol();
        let overview = self.query("OVERVIEW", &symbol).await?;

        let mut result = map_overview(ticker, &overview);
        if result.return_on_equity.is_none() {
            result.return_on_equity = self.statement_roe(&symbol).await;
        }

        if result.is_empty() {
            return Err(ProviderError::NotFound(symbol));
        }
        Ok(result)
    }

    /// 최근 연간 보고서의 순이익 ÷ 자기자본으로 ROE를 계산합니다.
    ///
    /// 자기자본이 0 이하이면 계산하지 않습니다.
    async fn statement_roe(&self, symbol: &str) -> Option<Fraction> {
        let (income, balance) = tokio::join!(
            self.query("INCOME_STATEMENT", symbol),
            self.query("BALANCE_SHEET", symbol),
        );

        match (income, balance) {
            (Ok(income), Ok(balance)) => roe_from_statements(&income, &balance),
            (Err(e), _) | (_, Err(e)) => {
                debug!(provider = "alpha_vantage", symbol, error = %e, "재무제표 조회 실패, ROE 계산 생략");
                None
            }
        }
    }

    async fn load_quote(&self, descriptor: &TickerDescriptor) -> Result<Quote, ProviderError> {
        let ticker = Ticker::parse(&descriptor.ticker)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        let payload = self.query("GLOBAL_QUOTE", &ticker.b3_symbol()).await?;
        let global = payload
            .get("Global Quote")
            .filter(|q| q.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(|| ProviderError::NotFound(descriptor.ticker.clone()))?;

        map_global_quote(descriptor, global)
    }
}

/// 오류/한도 표식을 확인합니다.
fn check_sentinels(symbol: &str, payload: Value) -> Result<Value, ProviderError> {
    if payload.get("Error Message").is_some() {
        return Err(ProviderError::NotFound(symbol.to_string()));
    }
    for sentinel in ["Note", "Information"] {
        if let Some(message) = payload.get(sentinel).and_then(Value::as_str) {
            return Err(ProviderError::ApiError(message.to_string()));
        }
    }
    if payload.as_object().map_or(true, |o| o.is_empty()) {
        return Err(ProviderError::NotFound(symbol.to_string()));
    }
    Ok(payload)
}

// ==================== 필드 매핑 ====================

fn map_overview(ticker: &Ticker, o: &Value) -> Fundamentals {
    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::AlphaVantage);
    let frac = |keys: &[&str]| plain(o, keys).map(Fraction::from_fraction);

    out.price_earnings = plain(o, &["PERatio"]);
    out.price_to_book = plain(o, &["PriceToBookRatio"]);
    out.price_to_sales = plain(o, &["PriceToSalesRatioTTM"]);
    out.ev_to_ebitda = plain(o, &["EVToEBITDA"]);
    out.return_on_equity = frac(&["ReturnOnEquityTTM"]);
    out.return_on_assets = frac(&["ReturnOnAssetsTTM"]);
    out.net_margin = frac(&["ProfitMargin"]);
    out.dividend_yield = frac(&["DividendYield"]);
    out.earnings_per_share = plain(o, &["EPS"]);
    out.book_value_per_share = plain(o, &["BookValue"]);
    out.last_dividend_per_share = plain(o, &["DividendPerShare"]);
    out.earnings_growth = frac(&["QuarterlyEarningsGrowthYOY"]);
    out.market_cap = plain(o, &["MarketCapitalization"]);
    out.set_sector(text(o, &["Sector"]));
    out.set_industry(text(o, &["Industry"]));

    out
}

fn roe_from_statements(income: &Value, balance: &Value) -> Option<Fraction> {
    let latest = |v: &Value| {
        v.get("annualReports")
            .and_then(Value::as_array)
            .and_then(|reports| reports.first())
            .cloned()
    };
    let net_income = plain(&latest(income)?, &["netIncome"])?;
    let equity = plain(&latest(balance)?, &["totalShareholderEquity"])?;

    if equity <= Decimal::ZERO {
        return None;
    }
    net_income
        .checked_div(equity)
        .map(|roe| Fraction::from_fraction(roe.round_dp(6).normalize()))
}

fn map_global_quote(descriptor: &TickerDescriptor, q: &Value) -> Result<Quote, ProviderError> {
    let mut quote = Quote::new(descriptor.ticker.clone(), descriptor.asset_type);

    quote.price = plain(q, &["05. price"]);
    if quote.price.is_none() {
        return Err(ProviderError::NotFound(descriptor.ticker.clone()));
    }
    quote.open = plain(q, &["02. open"]);
    quote.high = plain(q, &["03. high"]);
    quote.low = plain(q, &["04. low"]);
    quote.volume = plain(q, &["06. volume"]);
    quote.previous_close = plain(q, &["08. previous close"]);
    quote.change = plain(q, &["09. change"]);
    quote.change_percent = plain(q, &["10. change percent"]);
    quote.source = Some(DataSource::AlphaVantage);
    quote.derive_change();

    Ok(quote)
}

// ==================== 트레이트 구현 ====================

impl Provider for AlphaVantageClient {
    fn id(&self) -> DataSource {
        DataSource::AlphaVantage
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageClient {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Option<Fundamentals> {
        settle(self.id(), ticker.as_str(), self.load_fundamentals(ticker).await)
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn fetch_quote(&self, descriptor: &TickerDescriptor) -> Option<Quote> {
        settle(self.id(), &descriptor.ticker, self.load_quote(descriptor).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::build_client;
    use mockito::Matcher;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;

    fn client(base_url: &str) -> AlphaVantageClient {
        let http = build_client(Duration::from_secs(5), "carteira-test").unwrap();
        AlphaVantageClient::new(http, base_url).with_key(Some("av-key".to_string()))
    }

    fn function(name: &str) -> Matcher {
        Matcher::UrlEncoded("function".into(), name.into())
    }

    #[test]
    fn test_map_overview_plain_strings() {
        let ticker = Ticker::parse("AAPL").unwrap();
        let f = map_overview(
            &ticker,
            &json!({
                "Symbol": "AAPL", "PERatio": "29.5", "PriceToBookRatio": "45.1",
                "ReturnOnEquityTTM": "1.479", "DividendYield": "0.0044",
                "EVToEBITDA": "None", "MarketCapitalization": "3400000000000",
                "Sector": "TECHNOLOGY", "Industry": "ELECTRONIC COMPUTERS"
            }),
        );
        assert_eq!(f.price_earnings, Some(dec!(29.5)));
        assert_eq!(f.return_on_equity.map(Fraction::value), Some(dec!(1.479)));
        assert_eq!(f.dividend_yield.map(Fraction::value), Some(dec!(0.0044)));
        assert!(f.ev_to_ebitda.is_none());
        assert_eq!(f.market_cap, Some(dec!(3400000000000)));
        assert_eq!(f.sector, "TECHNOLOGY");
    }

    #[test]
    fn test_sentinels() {
        assert!(check_sentinels("X", json!({"Error Message": "Invalid API call"}))
            .unwrap_err()
            .is_not_found());
        assert!(matches!(
            check_sentinels("X", json!({"Note": "Thank you for using Alpha Vantage!"})),
            Err(ProviderError::ApiError(_))
        ));
        assert!(check_sentinels("X", json!({})).unwrap_err().is_not_found());
        assert!(check_sentinels("X", json!({"Symbol": "X"})).is_ok());
    }

    #[test]
    fn test_roe_from_statements() {
        let income = json!({"annualReports": [{"netIncome": "2000"}, {"netIncome": "1"}]});
        let balance = json!({"annualReports": [{"totalShareholderEquity": "10000"}]});
        assert_eq!(
            roe_from_statements(&income, &balance).map(Fraction::value),
            Some(dec!(0.2))
        );

        let negative = json!({"annualReports": [{"totalShareholderEquity": "-5"}]});
        assert!(roe_from_statements(&income, &negative).is_none());
    }

    #[test]
    fn test_map_global_quote() {
        let descriptor = TickerDescriptor::stock("IBM");
        let quote = map_global_quote(
            &descriptor,
            &json!({
                "01. symbol": "IBM", "05. price": "210.5000", "08. previous close": "208.0000",
                "09. change": "2.5000", "10. change percent": "1.2019%", "06. volume": "3100000"
            }),
        )
        .unwrap();
        assert_eq!(quote.price, Some(dec!(210.5)));
        assert_eq!(quote.change_percent, Some(dec!(1.2019)));
        assert_eq!(quote.volume, Some(dec!(3100000)));
    }

    #[tokio::test]
    async fn test_roe_from_statements_when_overview_lacks_it() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::AllOf(vec![
                function("OVERVIEW"),
                Matcher::UrlEncoded("symbol".into(), "VALE3.SA".into()),
                Matcher::UrlEncoded("apikey".into(), "av-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Symbol": "VALE3.SA", "PERatio": "6.1", "ReturnOnEquityTTM": "None"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/query")
            .match_query(function("INCOME_STATEMENT"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"annualReports": [{"netIncome": "30000"}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/query")
            .match_query(function("BALANCE_SHEET"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"annualReports": [{"totalShareholderEquity": "200000"}]}"#)
            .create_async()
            .await;

        let ticker = Ticker::parse("VALE3").unwrap();
        let f = client(&server.url()).fetch_fundamentals(&ticker).await.unwrap();
        assert_eq!(f.price_earnings, Some(dec!(6.1)));
        assert_eq!(f.return_on_equity.map(Fraction::value), Some(dec!(0.15)));
    }

    #[tokio::test]
    async fn test_rate_limit_note_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Note": "Our standard API call frequency is 5 calls per minute"}"#)
            .create_async()
            .await;

        let ticker = Ticker::parse("AAPL").unwrap();
        assert!(client(&server.url()).fetch_fundamentals(&ticker).await.is_none());
    }
}

//! Fundamentus 스크래퍼.
//!
//! B3 종목 상세 페이지(`/detalhes.php?papel=`)에서 지표를 수집합니다.
//!
//! ## 페이지 구조
//! 지표는 `td.label` / `td.data` 셀 쌍으로 나열되며, 실제 텍스트는 `span.txt`에 있습니다.
//! "Indicadores fundamentalistas" 표의 값을 우선 사용하고, 그 밖의 표(시세, 섹터 등)는
//! 문서 전체의 셀 쌍에서 보완합니다.
//!
//! ## 단위
//! 값은 브라질 표기법(`69,9%`)이며, 수익성/배당/성장률 지표는 퍼센트이므로 ÷100 합니다.
//!
//! 성공한 결과는 스크래핑 캐시(기본 24시간)에 저장되어 재요청 시 네트워크를 건너뜁니다.

use super::http::get_html;
use super::{settle, FundamentalsProvider, Provider};
use crate::cache::CacheNamespace;
use crate::error::ProviderError;
use async_trait::async_trait;
use carteira_core::{parse_text, DataSource, Fundamentals, RawUnit, Ticker};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::debug;

/// 지표 표를 찾는 기준 문구.
const ANCHOR_PHRASE: &str = "Indicadores fundamentalistas";

/// "종목 없음" 페이지 표식 (소문자 비교).
const NOT_FOUND_MARKERS: &[&str] = &["não encontrado", "nenhum papel encontrado"];

// ==================== 라벨 후보 ====================

const PRICE_EARNINGS: &[&str] = &["P/L"];
const PRICE_TO_BOOK: &[&str] = &["P/VP"];
const PRICE_TO_SALES: &[&str] = &["PSR"];
const EV_TO_EBITDA: &[&str] = &["EV / EBITDA", "EV/EBITDA"];
const RETURN_ON_EQUITY: &[&str] = &["ROE"];
const RETURN_ON_INVESTED_CAPITAL: &[&str] = &["ROIC"];
const NET_MARGIN: &[&str] = &["Marg. Líquida", "Marg. Líq."];
const DIVIDEND_YIELD: &[&str] = &["Div. Yield"];
const DEBT_TO_EQUITY: &[&str] = &["Dív. Brut/ Patrim.", "Div Br/ Patrim"];
const DEBT_TO_EBITDA: &[&str] = &["Dív. Líquida/EBITDA", "Dív.Líq/EBITDA", "Div Liq/EBITDA"];
const REVENUE_GROWTH_5Y: &[&str] = &["Cres. Rec (5a)", "Cresc. Rec.5a"];
const BOOK_VALUE_PER_SHARE: &[&str] = &["VPA"];
const EARNINGS_PER_SHARE: &[&str] = &["LPA"];
const SECTOR: &[&str] = &["Setor"];
const INDUSTRY: &[&str] = &["Subsetor"];
const PRICE: &[&str] = &["Cotação"];
const MARKET_CAP: &[&str] = &["Valor de mercado"];

/// Fundamentus HTML 스크래퍼.
pub struct FundamentusScraper {
    client: Client,
    base_url: String,
    cache: Option<CacheNamespace>,
}

impl FundamentusScraper {
    /// 새 스크래퍼를 생성합니다.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: None,
        }
    }

    /// 스크래핑 결과 캐시를 설정합니다.
    pub fn with_cache(mut self, cache: CacheNamespace) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn load(&self, ticker: &Ticker) -> Result<Fundamentals, ProviderError> {
        if !ticker.is_b3() {
            return Err(ProviderError::NotFound(format!("B3 종목이 아님: {}", ticker)));
        }

        if let Some(cache) = &self.cache {
            if let Some(entry) = cache.get::<Fundamentals>(ticker.as_str()).await {
                debug!(provider = "fundamentus", ticker = %ticker, "스크래핑 캐시 히트");
                return Ok(entry.data);
            }
        }

        let url = format!("{}/detalhes.php", self.base_url);
        let body = get_html(&self.client, &url, &[("papel", ticker.as_str())]).await?;
        let fundamentals = parse_page(ticker, &body)?;

        if let Some(cache) = &self.cache {
            cache.set(ticker.as_str(), &fundamentals).await;
        }

        Ok(fundamentals)
    }
}

// ==================== 파싱 ====================

/// 상세 페이지를 펀더멘털로 변환합니다.
///
/// ROE, DY, P/L 중 하나도 없으면 실패합니다.
pub fn parse_page(ticker: &Ticker, body: &str) -> Result<Fundamentals, ProviderError> {
    let lowered = body.to_lowercase();
    if NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Err(ProviderError::NotFound(ticker.to_string()));
    }

    let document = Html::parse_document(body);
    let labels = collect_labels(&document)?;

    let number = |candidates: &[&str]| lookup(&labels, candidates).and_then(parse_text);
    let scaled =
        |candidates: &[&str], unit: RawUnit| number(candidates).map(|v| unit.to_fraction(v));

    let mut out = Fundamentals::new(ticker.clone()).with_source(DataSource::Fundamentus);
    out.price_earnings = number(PRICE_EARNINGS);
    out.price_to_book = number(PRICE_TO_BOOK);
    out.price_to_sales = number(PRICE_TO_SALES);
    out.ev_to_ebitda = number(EV_TO_EBITDA);
    out.return_on_equity = scaled(RETURN_ON_EQUITY, RawUnit::Percent);
    out.return_on_invested_capital = scaled(RETURN_ON_INVESTED_CAPITAL, RawUnit::Percent);
    out.net_margin = scaled(NET_MARGIN, RawUnit::Percent);
    out.dividend_yield = scaled(DIVIDEND_YIELD, RawUnit::Percent);
    out.debt_to_equity = number(DEBT_TO_EQUITY);
    out.debt_to_ebitda = number(DEBT_TO_EBITDA);
    out.revenue_growth_trailing_5y = scaled(REVENUE_GROWTH_5Y, RawUnit::Percent);
    out.book_value_per_share = number(BOOK_VALUE_PER_SHARE);
    out.earnings_per_share = number(EARNINGS_PER_SHARE);
    out.price = number(PRICE);
    out.market_cap = number(MARKET_CAP);
    out.set_sector(lookup(&labels, SECTOR));
    out.set_industry(lookup(&labels, INDUSTRY));

    if out.return_on_equity.is_none() && out.dividend_yield.is_none() && out.price_earnings.is_none()
    {
        return Err(ProviderError::NotFound(format!("{} 지표 없음", ticker)));
    }

    Ok(out)
}

/// 정규화된 라벨 → 값 맵.
///
/// 기준 표의 값이 문서 전체의 값보다 우선합니다.
fn collect_labels(document: &Html) -> Result<HashMap<String, String>, ProviderError> {
    let table_selector = selector("table")?;

    let mut labels = HashMap::new();
    labels.extend(label_pairs(document.root_element())?);

    match document
        .select(&table_selector)
        .find(|table| table.text().collect::<String>().contains(ANCHOR_PHRASE))
    {
        Some(table) => labels.extend(label_pairs(table)?),
        None => debug!(provider = "fundamentus", "기준 표 없음, 문서 전체 라벨 사용"),
    }

    Ok(labels)
}

/// 요소 안의 `td.label` → 다음 `td.data` 쌍을 수집합니다.
fn label_pairs(scope: ElementRef<'_>) -> Result<Vec<(String, String)>, ProviderError> {
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;
    let text_selector = selector("span.txt")?;

    let cell_text = |cell: ElementRef<'_>| -> String {
        let source = cell.select(&text_selector).next().unwrap_or(cell);
        source.text().collect::<String>()
    };

    let mut pairs = Vec::new();
    for row in scope.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_selector).collect();
        for window in cells.windows(2) {
            let (label, data) = (window[0], window[1]);
            if has_class(label, "label") && has_class(data, "data") {
                pairs.push((normalize_label(&cell_text(label)), cell_text(data).trim().to_string()));
            }
        }
    }

    Ok(pairs)
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// 라벨 정규화: 공백 정리, 소문자, 끝의 `:` 제거.
fn normalize_label(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(':')
        .trim_end()
        .to_lowercase()
}

/// 후보 라벨 중 첫 번째로 일치하는 값.
fn lookup<'a>(labels: &'a HashMap<String, String>, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .find_map(|candidate| labels.get(&normalize_label(candidate)))
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

fn selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::Parse(format!("셀렉터 {}: {}", css, e)))
}

// ==================== 트레이트 구현 ====================

impl Provider for FundamentusScraper {
    fn id(&self) -> DataSource {
        DataSource::Fundamentus
    }
}

#[async_trait]
impl FundamentalsProvider for FundamentusScraper {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Option<Fundamentals> {
        settle(self.id(), ticker.as_str(), self.load(ticker).await)
    }
}

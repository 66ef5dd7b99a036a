//! 시세 조회기.
//!
//! 자산 유형별 공급자 체인에서 가격을 가져오고 짧은 메모리 캐시에 보관합니다.
//!
//! - 암호화폐: 암호화폐를 지원하는 공급자(brapi)만 사용
//! - 그 외: brapi → Yahoo → Alpha Vantage, 가격을 돌려준 첫 공급자 채택
//!
//! 가격이 없는 시세는 캐시하지 않습니다. 새 항목을 넣을 때 만료된 항목을 함께 정리합니다.
//! 가격 이력은 캐시 없이 이력 공급자(brapi)에 그대로 위임합니다.

use crate::error::ProviderError;
use crate::provider::{ExchangeRateProvider, PriceHistoryProvider, QuoteProvider};
use carteira_core::{ExchangeRate, PricePoint, Quote, Ticker, TickerDescriptor};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

/// 기본 시세 캐시 유지 시간.
pub const DEFAULT_QUOTE_TTL: Duration = Duration::from_secs(60);

type TimedCache<T> = RwLock<HashMap<String, (Instant, T)>>;

/// 시세/환율 조회기.
pub struct QuoteFetcher {
    providers: Vec<Arc<dyn QuoteProvider>>,
    exchange_rates: Option<Arc<dyn ExchangeRateProvider>>,
    history: Option<Arc<dyn PriceHistoryProvider>>,
    ttl: Duration,
    provider_timeout: Duration,
    quotes: TimedCache<Quote>,
    rates: TimedCache<ExchangeRate>,
}

impl QuoteFetcher {
    /// 우선순위 순서의 시세 공급자로 조회기를 생성합니다.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>) -> Self {
        Self {
            providers,
            exchange_rates: None,
            history: None,
            ttl: DEFAULT_QUOTE_TTL,
            provider_timeout: crate::resolver::DEFAULT_PROVIDER_TIMEOUT,
            quotes: RwLock::new(HashMap::new()),
            rates: RwLock::new(HashMap::new()),
        }
    }

    /// 환율 공급자를 설정합니다.
    pub fn with_exchange_rates(mut self, provider: Arc<dyn ExchangeRateProvider>) -> Self {
        self.exchange_rates = Some(provider);
        self
    }

    /// 가격 이력 공급자를 설정합니다.
    pub fn with_price_history(mut self, provider: Arc<dyn PriceHistoryProvider>) -> Self {
        self.history = Some(provider);
        self
    }

    /// 캐시 유지 시간을 설정합니다.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// 공급자 호출 제한 시간을 설정합니다.
    pub fn with_provider_timeout(mut self, provider_timeout: Duration) -> Self {
        self.provider_timeout = provider_timeout;
        self
    }

    /// 시세를 조회합니다. `force_refresh`면 캐시를 읽지 않습니다.
    ///
    /// 모든 공급자가 실패하면 가격이 없는 시세를 반환합니다.
    pub async fn fetch_quote(&self, descriptor: &TickerDescriptor, force_refresh: bool) -> Quote {
        let ticker = match Ticker::parse(&descriptor.ticker) {
            Ok(ticker) => ticker,
            Err(e) => {
                warn!(ticker = %descriptor.ticker, error = %e, "유효하지 않은 티커");
                return Quote::unavailable(descriptor.ticker.clone(), descriptor.asset_type);
            }
        };
        let descriptor = TickerDescriptor::new(ticker.as_str(), descriptor.asset_type);
        let key = format!("{}:{}", ticker, descriptor.asset_type.label());

        if !force_refresh {
            if let Some(quote) = self.cached(&self.quotes, &key).await {
                debug!(ticker = %ticker, "시세 캐시 히트");
                return quote;
            }
        }

        for provider in self.providers.iter().filter(|p| p.supports(descriptor.asset_type)) {
            let id = provider.id();
            match timeout(self.provider_timeout, provider.fetch_quote(&descriptor)).await {
                Ok(Some(quote)) if quote.is_available() => {
                    debug!(provider = %id, ticker = %ticker, "시세 조회 성공");
                    self.store(&self.quotes, key, quote.clone()).await;
                    return quote;
                }
                Ok(_) => debug!(provider = %id, ticker = %ticker, "시세 없음, 다음 공급자"),
                Err(_) => {
                    let e = ProviderError::Timeout(self.provider_timeout.as_millis() as u64);
                    warn!(provider = %id, ticker = %ticker, error = %e, "시세 공급자 시간 초과");
                }
            }
        }

        warn!(ticker = %ticker, asset_type = %descriptor.asset_type, "모든 공급자에서 시세를 찾지 못함");
        Quote::unavailable(descriptor.ticker, descriptor.asset_type)
    }

    /// 여러 시세를 동시에 조회합니다. 결과 순서는 입력 순서와 같습니다.
    pub async fn fetch_quotes(
        &self,
        descriptors: &[TickerDescriptor],
        force_refresh: bool,
    ) -> Vec<Quote> {
        join_all(descriptors.iter().map(|d| self.fetch_quote(d, force_refresh))).await
    }

    /// 환율을 조회합니다 (예: `USD-BRL`).
    pub async fn fetch_exchange_rate(&self, pair: &str) -> Option<ExchangeRate> {
        let pair = pair.trim().to_uppercase();
        if let Some(rate) = self.cached(&self.rates, &pair).await {
            debug!(pair = %pair, "환율 캐시 히트");
            return Some(rate);
        }

        let Some(provider) = &self.exchange_rates else {
            debug!(pair = %pair, "환율 공급자 없음");
            return None;
        };

        match timeout(self.provider_timeout, provider.fetch_exchange_rate(&pair)).await {
            Ok(Some(rate)) => {
                self.store(&self.rates, pair, rate.clone()).await;
                Some(rate)
            }
            Ok(None) => None,
            Err(_) => {
                let e = ProviderError::Timeout(self.provider_timeout.as_millis() as u64);
                warn!(provider = %provider.id(), pair = %pair, error = %e, "환율 공급자 시간 초과");
                None
            }
        }
    }

    /// 일별 가격 이력을 조회합니다. 실패하면 빈 목록입니다.
    pub async fn fetch_price_history(&self, ticker: &str, range: &str) -> Vec<PricePoint> {
        let ticker = match Ticker::parse(ticker) {
            Ok(ticker) => ticker,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "유효하지 않은 티커");
                return Vec::new();
            }
        };
        let Some(provider) = &self.history else {
            debug!(ticker = %ticker, "가격 이력 공급자 없음");
            return Vec::new();
        };

        match timeout(self.provider_timeout, provider.fetch_price_history(&ticker, range)).await {
            Ok(points) => {
                debug!(provider = %provider.id(), ticker = %ticker, range, points = points.len(), "가격 이력 조회");
                points
            }
            Err(_) => {
                let e = ProviderError::Timeout(self.provider_timeout.as_millis() as u64);
                warn!(provider = %provider.id(), ticker = %ticker, error = %e, "가격 이력 공급자 시간 초과");
                Vec::new()
            }
        }
    }

    /// 시세/환율 캐시를 비웁니다.
    pub async fn clear_cache(&self) {
        self.quotes.write().await.clear();
        self.rates.write().await.clear();
        debug!("시세 캐시 초기화");
    }

    async fn cached<T: Clone>(&self, cache: &TimedCache<T>, key: &str) -> Option<T> {
        let cache = cache.read().await;
        let (stored_at, value) = cache.get(key)?;
        (stored_at.elapsed() <= self.ttl).then(|| value.clone())
    }

    async fn store<T>(&self, cache: &TimedCache<T>, key: String, value: T) {
        let mut cache = cache.write().await;
        cache.retain(|_, (stored_at, _)| stored_at.elapsed() <= self.ttl);
        cache.insert(key, (Instant::now(), value));
    }
}

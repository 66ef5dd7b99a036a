//! 데이터 서비스 파사드.
//!
//! 설정으로부터 HTTP 클라이언트, 공급자 어댑터, 캐시 저장소, 오케스트레이터,
//! 시세 조회기를 조립합니다. 생성 단계에서만 실패할 수 있으며 조회는 실패하지 않습니다.
//!
//! brapi가 비활성화되면 활성화된 첫 보강 공급자가 펀더멘털 1차 공급자가 되고,
//! 환율과 가격 이력은 빈 결과를 돌려줍니다.

use crate::cache::{CacheNamespace, Clock, SnapshotStore, SystemClock};
use crate::error::{DataError, Result};
use crate::provider::http::build_client;
use crate::provider::{
    AlphaVantageClient, BrapiClient, FmpClient, FundamentalsProvider, FundamentusScraper,
    HgBrasilClient, QuoteProvider, YahooClient,
};
use crate::quote::QuoteFetcher;
use crate::resolver::FundamentalsResolver;
use crate::storage::{KeyValueStore, MemoryStore, RedisConfig, RedisStore};
use carteira_core::{
    AppConfig, CacheBackend, ExchangeRate, Fundamentals, PricePoint, Quote, TickerDescriptor,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 펀더멘털/시세 조회 진입점.
pub struct DataService {
    resolver: FundamentalsResolver,
    quotes: QuoteFetcher,
}

impl DataService {
    /// 이미 조립된 구성 요소로 서비스를 생성합니다.
    pub fn new(resolver: FundamentalsResolver, quotes: QuoteFetcher) -> Self {
        Self { resolver, quotes }
    }

    /// 설정의 캐시 백엔드(메모리/Redis)로 서비스를 생성합니다.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match config.cache.backend {
            CacheBackend::Memory => Arc::new(MemoryStore::new()),
            CacheBackend::Redis => {
                let redis = RedisConfig {
                    url: config.cache.redis_url.clone(),
                };
                Arc::new(RedisStore::connect(&redis).await?)
            }
        };

        Self::from_config_with_store(config, store, Arc::new(SystemClock))
    }

    /// 주어진 저장소와 시계로 서비스를 생성합니다.
    pub fn from_config_with_store(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let providers = &config.providers;
        let cache = &config.cache;
        let http = build_client(providers.http_timeout(), &providers.user_agent)?;

        let fundamentals_cache = CacheNamespace::new(
            store.clone(),
            clock.clone(),
            cache.fundamentals_prefix.clone(),
            Some(Duration::from_secs(cache.fundamentals_ttl_secs)),
        );
        let scrape_cache = CacheNamespace::new(
            store.clone(),
            clock.clone(),
            cache.scrape_prefix.clone(),
            Some(Duration::from_secs(cache.scrape_ttl_secs)),
        );
        let snapshots = SnapshotStore::new(store, clock, cache.snapshot_prefix.clone());

        let brapi = providers.brapi.enabled.then(|| {
            Arc::new(
                BrapiClient::new(http.clone(), providers.brapi.base_url())
                    .with_token(providers.brapi.api_key().map(str::to_string)),
            )
        });
        if brapi.is_none() {
            debug!(provider = "brapi", "비활성화, 공급자 건너뜀");
        }
        let yahoo = Arc::new(YahooClient::new(http.clone(), providers.yahoo.base_url()));
        let alpha_vantage = providers.alpha_vantage.api_key().map(|key| {
            Arc::new(
                AlphaVantageClient::new(http.clone(), providers.alpha_vantage.base_url())
                    .with_key(Some(key.to_string())),
            )
        });

        // ==================== 펀더멘털 체인 ====================
        let mut secondaries: Vec<Arc<dyn FundamentalsProvider>> = Vec::new();
        if let Some(brapi) = &brapi {
            secondaries.push(brapi.clone());
        }
        if providers.fundamentus.enabled {
            secondaries.push(Arc::new(
                FundamentusScraper::new(http.clone(), providers.fundamentus.base_url())
                    .with_cache(scrape_cache),
            ));
        }
        if providers.hgbrasil.enabled {
            match providers.hgbrasil.api_key() {
                Some(key) => secondaries.push(Arc::new(
                    HgBrasilClient::new(http.clone(), providers.hgbrasil.base_url())
                        .with_key(Some(key.to_string())),
                )),
                None => debug!(provider = "hgbrasil", "API 키 없음, 공급자 건너뜀"),
            }
        }
        if providers.yahoo.enabled {
            secondaries.push(yahoo.clone());
        }
        if providers.alpha_vantage.enabled {
            match &alpha_vantage {
                Some(av) => secondaries.push(av.clone()),
                None => debug!(provider = "alpha_vantage", "API 키 없음, 공급자 건너뜀"),
            }
        }
        if providers.fmp.enabled {
            match providers.fmp.api_key() {
                Some(key) => secondaries.push(Arc::new(
                    FmpClient::new(http.clone(), providers.fmp.base_url())
                        .with_key(Some(key.to_string())),
                )),
                None => debug!(provider = "fmp", "API 키 없음, 공급자 건너뜀"),
            }
        }

        let mut chain = secondaries.into_iter();
        let primary = chain
            .next()
            .ok_or_else(|| DataError::Config("no fundamentals provider enabled".to_string()))?;

        let resolver = FundamentalsResolver::builder(primary, fundamentals_cache, snapshots)
            .secondaries(chain.collect::<Vec<_>>())
            .provider_timeout(config.resolver.provider_timeout())
            .build();

        // ==================== 시세 체인 ====================
        let mut quote_providers: Vec<Arc<dyn QuoteProvider>> = Vec::new();
        if let Some(brapi) = &brapi {
            quote_providers.push(brapi.clone());
        }
        if providers.yahoo.enabled {
            quote_providers.push(yahoo);
        }
        if let (true, Some(av)) = (providers.alpha_vantage.enabled, alpha_vantage) {
            quote_providers.push(av);
        }

        let mut quotes = QuoteFetcher::new(quote_providers)
            .with_ttl(Duration::from_secs(cache.quote_ttl_secs))
            .with_provider_timeout(config.resolver.provider_timeout());
        if let Some(brapi) = brapi {
            quotes = quotes
                .with_exchange_rates(brapi.clone())
                .with_price_history(brapi);
        }

        info!(
            backend = ?cache.backend,
            providers = ?resolver.provider_ids(),
            "데이터 서비스 초기화 완료"
        );

        Ok(Self::new(resolver, quotes))
    }

    /// 펀더멘털 오케스트레이터.
    pub fn resolver(&self) -> &FundamentalsResolver {
        &self.resolver
    }

    /// 펀더멘털을 조회합니다 (캐시 우선).
    pub async fn get_fundamentals(&self, ticker: &str) -> Fundamentals {
        self.resolver.get_fundamentals(ticker).await
    }

    /// 여러 종목의 펀더멘털을 동시에 조회합니다.
    pub async fn get_fundamentals_batch(&self, tickers: &[String]) -> Vec<Fundamentals> {
        self.resolver.get_fundamentals_batch(tickers).await
    }

    /// 캐시를 건너뛰고 펀더멘털을 다시 조회합니다.
    pub async fn refresh_fundamentals(&self, ticker: &str) -> Fundamentals {
        self.resolver.refresh(ticker).await
    }

    /// 캐시된 펀더멘털을 삭제합니다.
    pub async fn invalidate_fundamentals(&self, ticker: &str) -> Result<()> {
        self.resolver.invalidate(ticker).await
    }

    /// 시세를 조회합니다.
    pub async fn get_quote(&self, descriptor: &TickerDescriptor, force_refresh: bool) -> Quote {
        self.quotes.fetch_quote(descriptor, force_refresh).await
    }

    /// 여러 시세를 동시에 조회합니다.
    pub async fn get_quotes(&self, descriptors: &[TickerDescriptor], force_refresh: bool) -> Vec<Quote> {
        self.quotes.fetch_quotes(descriptors, force_refresh).await
    }

    /// 환율을 조회합니다.
    pub async fn get_exchange_rate(&self, pair: &str) -> Option<ExchangeRate> {
        self.quotes.fetch_exchange_rate(pair).await
    }

    /// 일별 가격 이력을 조회합니다 (예: `1mo`, `1y`). 실패하면 빈 목록입니다.
    pub async fn get_price_history(&self, ticker: &str, range: &str) -> Vec<PricePoint> {
        self.quotes.fetch_price_history(ticker, range).await
    }

    /// 시세 캐시를 비웁니다.
    pub async fn clear_quote_cache(&self) {
        self.quotes.clear_cache().await;
    }
}

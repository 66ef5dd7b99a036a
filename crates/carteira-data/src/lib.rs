//! 펀더멘털/시세 데이터 계층.
//!
//! 이 crate는 다음을 제공합니다:
//! - 외부 공급자 어댑터 (brapi, Fundamentus, HG Brasil, Yahoo, Alpha Vantage, FMP)
//! - 메모리/Redis 키-값 저장소와 TTL 캐시 네임스페이스
//! - 우선순위 기반 폴백 오케스트레이터 ([`FundamentalsResolver`])
//! - 짧은 캐시를 갖춘 시세 조회기 ([`QuoteFetcher`])
//! - 설정 기반 조립 파사드 ([`DataService`])

pub mod cache;
pub mod error;
pub mod provider;
pub mod quote;
pub mod resolver;
pub mod service;
pub mod storage;

pub use error::{DataError, ProviderError, Result};

// 캐시/저장소 재내보내기
pub use cache::{CacheEntry, CacheNamespace, Clock, ManualClock, SnapshotStore, SystemClock};
pub use storage::{KeyValueStore, MemoryStore, RedisConfig, RedisStore};

// 공급자 재내보내기
pub use provider::{
    AlphaVantageClient, BrapiClient, ExchangeRateProvider, FmpClient, FundamentalsProvider,
    FundamentusScraper, HgBrasilClient, PriceHistoryProvider, Provider, QuoteProvider,
    YahooClient,
};

pub use quote::QuoteFetcher;
pub use resolver::{FundamentalsResolver, ResolverBuilder};
pub use service::DataService;

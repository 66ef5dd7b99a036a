//! 펀더멘털 폴백 오케스트레이터.
//!
//! 1차 공급자와 보강 공급자 체인을 조합하여 종목당 하나의 펀더멘털 레코드를 만듭니다.
//!
//! # 동작 흐름
//!
//! ```text
//! get_fundamentals("  petr4' ")
//!         │
//! ┌───────▼────────┐
//! │ 0. 티커 정규화   │ ← 유효하지 않으면 빈 레코드
//! └───────┬────────┘
//!   ┌─────┴─────┐
//!   │ 캐시 완전? │ ← ROE와 DY가 모두 있어야 히트
//!   └─────┬─────┘
//!     YES │ NO
//!         │  │
//!         │  ▼
//!         │ ┌──────────────────────┐
//!         │ │ 2. 1차 공급자 (brapi) │
//!         │ └──────────┬───────────┘
//!         │ ┌──────────▼───────────┐
//!         │ │ 3~4. 보강 공급자 순회  │ ← 빈 필드만 채움, 필수 필드 충족 시 중단
//!         │ └──────────┬───────────┘
//!         │ ┌──────────▼───────────┐
//!         │ │ 5~6. PEG, 추세 계산   │
//!         │ └──────────┬───────────┘
//!         │ ┌──────────▼───────────┐
//!         │ │ 7. 캐시/스냅샷 저장   │ ← 필수 필드가 하나라도 있을 때만
//!         │ └──────────┬───────────┘
//!         ▼            ▼
//!       Fundamentals (실패 없음)
//! ```

use crate::cache::{CacheNamespace, SnapshotStore};
use crate::error::{ProviderError, Result};
use crate::provider::FundamentalsProvider;
use carteira_core::{compute_trends, DataSource, Fundamentals, Ticker};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn, Instrument};

/// 공급자 호출 하나에 허용하는 기본 시간.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// [`FundamentalsResolver`] 빌더.
pub struct ResolverBuilder {
    primary: Arc<dyn FundamentalsProvider>,
    secondaries: Vec<Arc<dyn FundamentalsProvider>>,
    cache: CacheNamespace,
    snapshots: SnapshotStore,
    provider_timeout: Duration,
}

impl ResolverBuilder {
    /// 보강 공급자를 우선순위 순으로 추가합니다.
    pub fn secondary(mut self, provider: Arc<dyn FundamentalsProvider>) -> Self {
        self.secondaries.push(provider);
        self
    }

    /// 보강 공급자 목록을 한 번에 추가합니다.
    pub fn secondaries(
        mut self,
        providers: impl IntoIterator<Item = Arc<dyn FundamentalsProvider>>,
    ) -> Self {
        self.secondaries.extend(providers);
        self
    }

    /// 공급자 호출 제한 시간.
    pub fn provider_timeout(mut self, provider_timeout: Duration) -> Self {
        self.provider_timeout = provider_timeout;
        self
    }

    pub fn build(self) -> FundamentalsResolver {
        FundamentalsResolver {
            primary: self.primary,
            secondaries: self.secondaries,
            cache: self.cache,
            snapshots: self.snapshots,
            provider_timeout: self.provider_timeout,
        }
    }
}

/// 펀더멘털 오케스트레이터.
///
/// 모든 조회는 실패하지 않으며, 최악의 경우 [`Fundamentals::unavailable`]을 반환합니다.
pub struct FundamentalsResolver {
    primary: Arc<dyn FundamentalsProvider>,
    secondaries: Vec<Arc<dyn FundamentalsProvider>>,
    cache: CacheNamespace,
    snapshots: SnapshotStore,
    provider_timeout: Duration,
}

impl FundamentalsResolver {
    /// 빌더를 생성합니다.
    pub fn builder(
        primary: Arc<dyn FundamentalsProvider>,
        cache: CacheNamespace,
        snapshots: SnapshotStore,
    ) -> ResolverBuilder {
        ResolverBuilder {
            primary,
            secondaries: Vec::new(),
            cache,
            snapshots,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// 호출 순서대로의 공급자 목록.
    pub fn provider_ids(&self) -> Vec<DataSource> {
        std::iter::once(&self.primary)
            .chain(&self.secondaries)
            .map(|p| p.id())
            .collect()
    }

    /// 펀더멘털을 조회합니다 (캐시 우선).
    pub async fn get_fundamentals(&self, raw_ticker: &str) -> Fundamentals {
        match normalize(raw_ticker) {
            Ok(ticker) => self.resolve(ticker, true).await,
            Err(unavailable) => unavailable,
        }
    }

    /// 캐시를 건너뛰고 다시 조회합니다. 결과는 평소처럼 저장됩니다.
    pub async fn refresh(&self, raw_ticker: &str) -> Fundamentals {
        match normalize(raw_ticker) {
            Ok(ticker) => self.resolve(ticker, false).await,
            Err(unavailable) => unavailable,
        }
    }

    /// 여러 종목을 동시에 조회합니다. 결과 순서는 입력 순서와 같습니다.
    pub async fn get_fundamentals_batch(&self, raw_tickers: &[String]) -> Vec<Fundamentals> {
        join_all(raw_tickers.iter().map(|t| self.get_fundamentals(t))).await
    }

    /// 캐시된 펀더멘털을 삭제합니다.
    pub async fn invalidate(&self, raw_ticker: &str) -> Result<()> {
        let ticker = Ticker::parse(raw_ticker)?;
        self.cache.remove(ticker.as_str()).await?;
        info!(ticker = %ticker, "펀더멘털 캐시 삭제");
        Ok(())
    }

    async fn resolve(&self, ticker: Ticker, use_cache: bool) -> Fundamentals {
        let started = Instant::now();

        // 1. 캐시
        if use_cache {
            if let Some(entry) = self.cache.get::<Fundamentals>(ticker.as_str()).await {
                if entry.data.is_cache_complete() {
                    debug!(ticker = %ticker, "완전한 캐시 항목 반환");
                    return entry.data;
                }
                debug!(ticker = %ticker, "불완전한 캐시 항목, 다시 조회");
            }
        }

        // 2. 1차 공급자
        let mut draft = self
            .call(&self.primary, &ticker)
            .await
            .unwrap_or_else(|| Fundamentals::new(ticker.clone()));
        draft.ticker = ticker.clone();

        let mut contributions = vec![(self.primary.id(), draft.populated_count())];

        // 3~4. 보강
        for provider in &self.secondaries {
            if draft.has_all_essentials() {
                debug!(ticker = %ticker, "필수 필드 충족, 보강 중단");
                break;
            }
            debug!(
                ticker = %ticker,
                provider = %provider.id(),
                missing = ?draft.missing_essentials(),
                "보강 공급자 호출"
            );

            let filled = match self.call(provider, &ticker).await {
                Some(other) => draft.fill_gaps(&other),
                None => 0,
            };
            contributions.push((provider.id(), filled));
        }

        if !draft.has_any_essential() {
            warn!(
                ticker = %ticker,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "모든 공급자에서 필수 지표를 찾지 못함"
            );
            return Fundamentals::unavailable(ticker);
        }

        draft.source = best_source(&contributions);

        // 5. 파생 지표
        draft.derive_peg();

        // 6. 추세
        let previous = self.snapshots.load(&ticker).await;
        draft.trends = compute_trends(&draft, previous.as_ref());

        // 7. 저장
        self.cache.set(ticker.as_str(), &draft).await;
        self.snapshots.save(&draft).await;

        info!(
            ticker = %ticker,
            source = ?draft.source,
            filled = ?contributions,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "펀더멘털 조회 완료"
        );

        draft
    }

    /// 제한 시간 안에서 공급자를 호출합니다.
    async fn call(
        &self,
        provider: &Arc<dyn FundamentalsProvider>,
        ticker: &Ticker,
    ) -> Option<Fundamentals> {
        let id = provider.id();
        let span = carteira_core::provider_span!("fetch_fundamentals", id, ticker);
        let started = Instant::now();

        let result = timeout(self.provider_timeout, provider.fetch_fundamentals(ticker))
            .instrument(span)
            .await;

        match result {
            Ok(fundamentals) => {
                debug!(
                    provider = %id,
                    ticker = %ticker,
                    found = fundamentals.is_some(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "공급자 응답"
                );
                fundamentals
            }
            Err(_) => {
                let e = ProviderError::Timeout(self.provider_timeout.as_millis() as u64);
                warn!(provider = %id, ticker = %ticker, error = %e, "공급자 시간 초과");
                None
            }
        }
    }
}

/// 티커를 정규화합니다. 실패하면 반환할 빈 레코드를 돌려줍니다.
fn normalize(raw_ticker: &str) -> std::result::Result<Ticker, Fundamentals> {
    Ticker::parse(raw_ticker).map_err(|e| {
        warn!(ticker = raw_ticker, error = %e, "유효하지 않은 티커");
        Fundamentals::unavailable(Ticker::sanitized(raw_ticker))
    })
}

/// 가장 많은 필드를 제공한 공급자. 동률이면 먼저 호출된 공급자.
fn best_source(contributions: &[(DataSource, usize)]) -> Option<DataSource> {
    contributions
        .iter()
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(DataSource, usize)>, &(id, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((id, count)),
        })
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_source_prefers_earlier_on_tie() {
        let contributions = [
            (DataSource::Brapi, 3),
            (DataSource::Fundamentus, 5),
            (DataSource::Yahoo, 5),
        ];
        assert_eq!(best_source(&contributions), Some(DataSource::Fundamentus));
        assert_eq!(
            best_source(&[(DataSource::Brapi, 0), (DataSource::Yahoo, 0)]),
            None
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  petr4' ").unwrap().as_str(), "PETR4");

        let unavailable = normalize("  ").unwrap_err();
        assert!(unavailable.is_empty());
        assert_eq!(unavailable.ticker.as_str(), "");
    }
}

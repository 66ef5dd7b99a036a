//! 추세 비교용 스냅샷 저장소.

use super::clock::Clock;
use crate::storage::KeyValueStore;
use carteira_core::{Fundamentals, Ticker, TrendSnapshot};
use std::sync::Arc;
use tracing::{debug, warn};

/// `snapshot_<TICKER>` 키에 마지막 P/L, ROE, DY를 만료 없이 저장합니다.
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
}

impl SnapshotStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            prefix: prefix.into(),
        }
    }

    fn key(&self, ticker: &Ticker) -> String {
        format!("{}{}", self.prefix, ticker)
    }

    /// 직전 스냅샷을 읽습니다. 오류는 스냅샷 없음으로 처리합니다.
    pub async fn load(&self, ticker: &Ticker) -> Option<TrendSnapshot> {
        let key = self.key(ticker);
        let raw = match self.store.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "스냅샷 조회 실패");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(key = %key, error = %e, "손상된 스냅샷");
                None
            }
        }
    }

    /// 현재 레코드로 스냅샷을 덮어씁니다.
    pub async fn save(&self, fundamentals: &Fundamentals) {
        let key = self.key(&fundamentals.ticker);
        let mut snapshot = fundamentals.snapshot();
        snapshot.timestamp = self.clock.now_ms();

        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "스냅샷 직렬화 실패");
                return;
            }
        };

        match self.store.set(&key, raw, None).await {
            Ok(()) => debug!(key = %key, "스냅샷 저장"),
            Err(e) => warn!(key = %key, error = %e, "스냅샷 저장 실패"),
        }
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::storage::MemoryStore;
    use carteira_core::Fraction;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_save_and_load() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let snapshots = SnapshotStore::new(store.clone(), Arc::new(ManualClock::new(42)), "snapshot_");
        let ticker = Ticker::parse("BBSE3").unwrap();

        assert!(snapshots.load(&ticker).await.is_none());

        let mut f = Fundamentals::new(ticker.clone());
        f.price_earnings = Some(dec!(7.5));
        f.dividend_yield = Some(Fraction::from_fraction(dec!(0.08)));
        snapshots.save(&f).await;

        let snapshot = snapshots.load(&ticker).await.unwrap();
        assert_eq!(snapshot.price_earnings, Some(dec!(7.5)));
        assert_eq!(snapshot.dividend_yield, Some(dec!(0.08)));
        assert!(snapshot.return_on_equity.is_none());
        assert_eq!(snapshot.timestamp, 42);

        let raw = store.get("snapshot_BBSE3").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["timestamp"], 42);
        assert!(json.get("dividendYield").is_some());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_none() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store
            .set("snapshot_ITSA4", "{broken".to_string(), None)
            .await
            .unwrap();
        let snapshots = SnapshotStore::new(store, Arc::new(ManualClock::new(0)), "snapshot_");
        assert!(snapshots.load(&Ticker::parse("ITSA4").unwrap()).await.is_none());
    }
}

//! 접두사와 TTL이 지정된 캐시 네임스페이스.

use super::clock::Clock;
use crate::error::Result;
use crate::storage::KeyValueStore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 캐시 항목: `{data, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// 저장된 데이터
    pub data: T,
    /// 저장 시각 (epoch ms)
    pub timestamp: i64,
}

/// `prefix + key` 형태의 키를 사용하는 캐시 영역.
///
/// 모든 저장소 오류와 손상된 항목은 캐시 미스로 처리되며 호출자에게 전파되지 않습니다.
/// 접두사의 버전을 올리면 기존 항목 전체가 무효화됩니다.
#[derive(Clone)]
pub struct CacheNamespace {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
    ttl: Option<Duration>,
}

impl CacheNamespace {
    /// 새 네임스페이스를 생성합니다. `ttl`이 `None`이면 만료되지 않습니다.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        prefix: impl Into<String>,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            store,
            clock,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// 저장소에서 사용하는 전체 키.
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// 신선한 항목을 조회합니다.
    ///
    /// 항목이 없거나, TTL이 지났거나, 저장소/역직렬화 오류가 나면 `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let full_key = self.key(key);

        let raw = match self.store.get(&full_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %full_key, "캐시 미스");
                return None;
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "캐시 조회 실패");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %full_key, error = %e, "손상된 캐시 항목");
                return None;
            }
        };

        if self.is_expired(entry.timestamp) {
            debug!(key = %full_key, timestamp = entry.timestamp, "캐시 만료");
            return None;
        }

        debug!(key = %full_key, "캐시 히트");
        Some(entry)
    }

    /// 현재 시각으로 항목을 저장합니다. 실패는 로그만 남깁니다.
    pub async fn set<T: Serialize>(&self, key: &str, data: &T) {
        let full_key = self.key(key);
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_ms(),
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %full_key, error = %e, "캐시 직렬화 실패");
                return;
            }
        };

        if let Err(e) = self.store.set(&full_key, raw, self.ttl).await {
            warn!(key = %full_key, error = %e, "캐시 저장 실패");
        }
    }

    /// 항목을 삭제합니다.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.delete(&self.key(key)).await
    }

    fn is_expired(&self, timestamp: i64) -> bool {
        match self.ttl {
            Some(ttl) => {
                let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                self.clock.now_ms().saturating_sub(timestamp) > ttl_ms
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheNamespace")
            .field("prefix", &self.prefix)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::DataError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;

    const HOUR_MS: i64 = 3_600_000;

    fn namespace(store: Arc<dyn KeyValueStore>, clock: Arc<ManualClock>) -> CacheNamespace {
        CacheNamespace::new(store, clock, "test_v1_", Some(Duration::from_secs(4 * 3600)))
    }

    /// 항상 실패하는 저장소.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(DataError::Cache("unavailable".into()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<()> {
            Err(DataError::Cache("unavailable".into()))
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Err(DataError::Cache("unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_round_trip_with_timestamp() {
        let clock = Arc::new(ManualClock::new(1_000));
        let ns = namespace(Arc::new(MemoryStore::new()), clock);

        ns.set("PETR4", &vec![1, 2, 3]).await;
        let entry: CacheEntry<Vec<i32>> = ns.get("PETR4").await.unwrap();
        assert_eq!(entry.data, vec![1, 2, 3]);
        assert_eq!(entry.timestamp, 1_000);
    }

    #[tokio::test]
    async fn test_expiry_is_strictly_greater_than_ttl() {
        let clock = Arc::new(ManualClock::new(0));
        let ns = namespace(Arc::new(MemoryStore::new()), clock.clone());
        ns.set("VALE3", &"x").await;

        clock.set_ms(4 * HOUR_MS);
        assert!(ns.get::<String>("VALE3").await.is_some());

        clock.advance_ms(1);
        assert!(ns.get::<String>("VALE3").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_miss() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let ns = namespace(store.clone(), clock);

        store
            .set("test_v1_ITUB4", "not json".to_string(), None)
            .await
            .unwrap();
        assert!(ns.get::<String>("ITUB4").await.is_none());
    }

    #[tokio::test]
    async fn test_store_errors_are_swallowed() {
        let ns = namespace(Arc::new(BrokenStore), Arc::new(ManualClock::new(0)));
        ns.set("BBAS3", &1).await;
        assert!(ns.get::<i32>("BBAS3").await.is_none());
        assert!(ns.remove("BBAS3").await.is_err());
    }

    #[tokio::test]
    async fn test_prefix_versioning_isolates_entries() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let v1 = CacheNamespace::new(store.clone(), clock.clone(), "fundamentals_v1_", None);
        let v2 = CacheNamespace::new(store, clock, "fundamentals_v2_", None);

        v1.set("WEGE3", &"old").await;
        assert!(v2.get::<String>("WEGE3").await.is_none());
        assert_eq!(v1.key("WEGE3"), "fundamentals_v1_WEGE3");
    }

    #[tokio::test]
    async fn test_remove() {
        let ns = namespace(Arc::new(MemoryStore::new()), Arc::new(ManualClock::new(0)));
        ns.set("TAEE11", &1).await;
        ns.remove("TAEE11").await.unwrap();
        assert!(ns.get::<i32>("TAEE11").await.is_none());
    }
}

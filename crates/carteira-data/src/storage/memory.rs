//! 프로세스 내 메모리 저장소.

use super::KeyValueStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// 메모리 저장소 항목 (값, 만료 시각).
type Slot = (String, Option<Instant>);

/// `RwLock<HashMap>` 기반 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 키 수 (만료된 항목 포함).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        let value = entries.get(key).and_then(|(value, expires_at)| match expires_at {
            Some(at) if Instant::now() >= *at => None,
            _ => Some(value.clone()),
        });
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        // 표현할 수 없을 만큼 긴 TTL은 만료 없음
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        assert!(store.get("a").await.unwrap().is_none());

        store.set("a", "1".to_string(), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.set("a", "2".to_string(), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));

        store.delete("a").await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        // 없는 키 삭제
        store.delete("a").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_backstop() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(store.get("k").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unrepresentable_ttl_never_expires() {
        let store = MemoryStore::new();
        store
            .set("k", "v".to_string(), Some(Duration::MAX))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}

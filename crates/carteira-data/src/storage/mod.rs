//! 키-값 저장소 백엔드.
//!
//! 캐시 계층([`crate::cache`])은 문자열 키-값 저장소 위에서 동작합니다.
//!
//! - `MemoryStore`: 프로세스 내 저장소 (기본값, 테스트용)
//! - `RedisStore`: Redis 저장소 (여러 프로세스 간 공유)

pub mod memory;
pub mod redis;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use self::memory::MemoryStore;
pub use self::redis::{RedisConfig, RedisStore};

/// 비동기 키-값 저장소.
///
/// `ttl`은 저장소 수준의 만료 보조 장치입니다. 신선도 판단은
/// 캐시 항목의 타임스탬프로 합니다.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 값을 조회합니다.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 값을 저장합니다. `ttl`이 `None`이면 만료되지 않습니다.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    /// 키를 삭제합니다. 없는 키 삭제는 오류가 아닙니다.
    async fn delete(&self, key: &str) -> Result<()>;
}

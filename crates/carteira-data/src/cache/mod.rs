//! 캐싱 레이어.
//!
//! - `CacheNamespace`: 접두사/TTL 단위의 JSON 캐시 (`{data, timestamp}`)
//! - `SnapshotStore`: 추세 비교용 직전 스냅샷 (만료 없음)
//! - `Clock`: 만료 판단용 시계 (테스트에서 교체 가능)

mod clock;
mod namespace;
mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use namespace::{CacheEntry, CacheNamespace};
pub use snapshot::SnapshotStore;

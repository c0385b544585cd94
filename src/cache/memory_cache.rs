use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::route_cache::{CacheError, RouteCache, ttl_secs};

struct Entry {
    value: String,
    expires_at: Instant,
    last_access: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    tick: u64,
}

/// 进程内路线缓存，未配置 Redis 时使用
///
/// 可选的容量上限：写入新键且已满时，先清理过期条目，
/// 仍然满则淘汰最久未访问的条目。
#[derive(Default)]
pub struct MemoryRouteCache {
    inner: Mutex<Inner>,
    capacity: Option<usize>,
}

impl MemoryRouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::default(),
            capacity: Some(capacity.max(1)),
        }
    }

    /// 当前条目数（包含尚未清理的过期条目）
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, CacheError> {
        self.inner
            .lock()
            .map_err(|_| CacheError::Backend("memory cache lock poisoned".into()))
    }
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_for(&mut self, capacity: usize, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
        while self.entries.len() >= capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    tracing::debug!("Evicting route cache entry: {}", key);
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl RouteCache for MemoryRouteCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut inner = self.lock()?;
        let now = Instant::now();
        let tick = inner.next_tick();

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.last_access = tick;
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            inner.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut inner = self.lock()?;
        let now = Instant::now();
        let tick = inner.next_tick();

        if let Some(capacity) = self.capacity {
            if !inner.entries.contains_key(key) {
                inner.evict_for(capacity, now);
            }
        }

        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                // 与 Redis 一致，按整秒过期
                expires_at: now + Duration::from_secs(ttl_secs(ttl)),
                last_access: tick,
            },
        );
        Ok(())
    }
}

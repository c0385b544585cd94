use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheError, RouteCache, keys::route_key};
use crate::database::{LocationStore, StoreError};
use crate::models::Location;
use crate::utils::{haversine_km, is_valid_latitude, is_valid_longitude};

/// 路线缓存默认过期时间
pub const DEFAULT_ROUTE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid coordinate: latitude {lat}, longitude {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error(transparent)]
    StoreUnavailable(StoreError),
    #[error("route computation exceeded its deadline")]
    DeadlineExceeded,
}

/// 按距离参考点由近到远排列全部地点，结果按量化后的参考点缓存
///
/// 地点变更时不主动失效缓存，过期前可能返回旧的排序。
#[derive(Clone)]
pub struct RouteService {
    store: Arc<dyn LocationStore>,
    cache: Arc<dyn RouteCache>,
    ttl: Duration,
}

impl RouteService {
    pub fn new(store: Arc<dyn LocationStore>, cache: Arc<dyn RouteCache>) -> Self {
        Self {
            store,
            cache,
            ttl: DEFAULT_ROUTE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_route_from(&self, lat: f64, lon: f64) -> Result<Vec<Location>, RouteError> {
        if !is_valid_latitude(lat) || !is_valid_longitude(lon) {
            return Err(RouteError::InvalidCoordinate { lat, lon });
        }

        let key = route_key(lat, lon);
        // 缓存不可用或内容损坏都按未命中处理
        match self.cached_route(&key).await {
            Ok(Some(locations)) => {
                tracing::debug!("Route cache hit: {}", key);
                return Ok(locations);
            }
            Ok(None) => tracing::debug!("Route cache miss: {}", key),
            Err(e) => tracing::warn!("Route cache read failed for {}, bypassing cache: {}", key, e),
        }

        let locations = self
            .store
            .find_all()
            .await
            .map_err(RouteError::StoreUnavailable)?;
        let sorted = sort_by_distance(lat, lon, locations);

        if let Err(e) = self.store_route(&key, &sorted).await {
            tracing::warn!("Route cache write failed for {}, skipping: {}", key, e);
        }
        Ok(sorted)
    }

    /// 与 `get_route_from` 相同，但整个过程受 `deadline` 限制；
    /// 超时后立即返回，未完成的存储查询被取消，缓存不会被写入
    pub async fn get_route_within(
        &self,
        lat: f64,
        lon: f64,
        deadline: Duration,
    ) -> Result<Vec<Location>, RouteError> {
        match tokio::time::timeout(deadline, self.get_route_from(lat, lon)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Route computation timed out after {:?}", deadline);
                Err(RouteError::DeadlineExceeded)
            }
        }
    }

    async fn cached_route(&self, key: &str) -> Result<Option<Vec<Location>>, CacheError> {
        let Some(json) = self.cache.get(key).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    async fn store_route(&self, key: &str, locations: &[Location]) -> Result<(), CacheError> {
        let json = serde_json::to_string(locations)?;
        self.cache.set(key, json, self.ttl).await
    }
}

/// 按到参考点的距离升序排列，距离相同的保持原有顺序
pub fn sort_by_distance(lat: f64, lon: f64, locations: Vec<Location>) -> Vec<Location> {
    let mut keyed: Vec<(f64, Location)> = locations
        .into_iter()
        .map(|l| (haversine_km(lat, lon, l.latitude, l.longitude), l))
        .collect();
    // sort_by 是稳定排序
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, l)| l).collect()
}

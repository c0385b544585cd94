use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Config;

const RATE_LIMIT_PREFIX: &str = "rate_limit:";

// 内存窗口数量超过该值时清理已过期的窗口
const MEMORY_PRUNE_THRESHOLD: usize = 10_000;

/// 固定窗口限流，按客户端 IP 计数；配置了 Redis 时共享计数，否则使用进程内计数
pub struct RateLimiter {
    backend: Backend,
    limit: i64,
    window: Duration,
}

enum Backend {
    Redis(Arc<redis::Client>),
    Memory(Mutex<HashMap<String, Window>>),
}

struct Window {
    count: i64,
    started: Instant,
}

/// 一次计数的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub count: i64,
    /// 距离当前窗口结束的秒数
    pub reset_secs: u64,
}

/// 根据窗口内计数判断是否放行，并给出剩余次数
pub fn decide(count: i64, limit: i64) -> (bool, i64) {
    (count <= limit, (limit - count).max(0))
}

/// 依次从 x-real-ip、x-forwarded-for 首个非空项、连接地址中取客户端 IP
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
                .map(str::to_string)
        })
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn secs_until(deadline: Instant, now: Instant) -> u64 {
    let left = deadline.saturating_duration_since(now);
    left.as_secs() + u64::from(left.subsec_nanos() > 0)
}

impl RateLimiter {
    pub fn redis(redis: Arc<redis::Client>, config: &Config) -> Self {
        Self::with_backend(Backend::Redis(redis), config)
    }

    pub fn in_memory(config: &Config) -> Self {
        Self::with_backend(Backend::Memory(Mutex::default()), config)
    }

    fn with_backend(backend: Backend, config: &Config) -> Self {
        Self {
            backend,
            limit: i64::from(config.rate_limit_requests),
            // 窗口至少一秒，与 Redis EXPIRE 的粒度一致
            window: config.rate_limit_window().max(Duration::from_secs(1)),
        }
    }

    /// 记录一次请求并返回窗口内的累计次数
    pub async fn hit(&self, ip: &str) -> Result<Hit, redis::RedisError> {
        match &self.backend {
            Backend::Redis(client) => self.hit_redis(client, ip).await,
            Backend::Memory(windows) => Ok(self.hit_memory(windows, ip).await),
        }
    }

    async fn hit_redis(&self, client: &redis::Client, ip: &str) -> Result<Hit, redis::RedisError> {
        let key = format!("{}{}", RATE_LIMIT_PREFIX, ip);
        let window_secs = self.window.as_secs();
        let mut conn = client.get_multiplexed_async_connection().await?;

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .ttl(&key)
            .query_async(&mut conn)
            .await?;

        // 新建的键，或上次设置过期失败而没有 TTL 的键，都在这里补上过期时间
        let reset_secs = if ttl < 0 {
            let _: () = conn.expire(&key, window_secs as i64).await?;
            window_secs
        } else {
            ttl as u64
        };

        Ok(Hit { count, reset_secs })
    }

    async fn hit_memory(&self, windows: &Mutex<HashMap<String, Window>>, ip: &str) -> Hit {
        let mut windows = windows.lock().await;
        let now = Instant::now();

        if windows.len() > MEMORY_PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| w.started + window > now);
        }

        let entry = windows.entry(ip.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });
        if entry.started + self.window <= now {
            entry.count = 0;
            entry.started = now;
        }
        entry.count += 1;

        Hit {
            count: entry.count,
            reset_secs: secs_until(entry.started + self.window, now),
        }
    }

    pub async fn check_rate_limit(&self, req: Request<Body>, next: Next) -> Response {
        let remote = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        let ip = client_ip(req.headers(), remote);

        let hit = match self.hit(&ip).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::error!("Rate limiter error: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Rate limiter error" })),
                )
                    .into_response();
            }
        };

        let (allowed, remaining) = decide(hit.count, self.limit);
        let mut response = if allowed {
            next.run(req).await
        } else {
            tracing::warn!("Rate limit exceeded for {}", ip);
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "message": "Rate limit exceeded" })),
            )
                .into_response()
        };

        let reset_at = chrono::Utc::now().timestamp() + hit.reset_secs as i64;
        let headers = response.headers_mut();
        headers.insert("x-ratelimit-limit", HeaderValue::from(self.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at));
        response
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> Option<SocketAddr> {
        Some("10.0.0.9:51000".parse().unwrap())
    }

    fn limiter(requests: u32, window_secs: u64) -> RateLimiter {
        let config = Config {
            rate_limit_requests: requests,
            rate_limit_window_secs: window_secs,
            ..Config::default()
        };
        RateLimiter::in_memory(&config)
    }

    #[test]
    fn decide_allows_up_to_the_limit() {
        assert_eq!(decide(1, 10), (true, 9));
        assert_eq!(decide(10, 10), (true, 0));
        assert_eq!(decide(11, 10), (false, 0));
        assert_eq!(decide(50, 10), (false, 0));
    }

    #[test]
    fn real_ip_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 1.2.3.4 "));
        headers.insert("x-forwarded-for", HeaderValue::from_static("5.6.7.8"));
        assert_eq!(client_ip(&headers, remote()), "1.2.3.4");
    }

    #[test]
    fn first_forwarded_entry_is_used() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 5.6.7.8, 9.9.9.9"));
        assert_eq!(client_ip(&headers, remote()), "5.6.7.8");
    }

    #[test]
    fn falls_back_to_connection_address() {
        assert_eq!(client_ip(&HeaderMap::new(), remote()), "10.0.0.9");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn memory_window_counts_per_ip_and_resets() {
        let limiter = limiter(10, 60);

        for expected in 1..=11 {
            let hit = limiter.hit("1.1.1.1").await.unwrap();
            assert_eq!(hit.count, expected);
            assert_eq!(hit.reset_secs, 60);
        }
        assert_eq!(decide(11, limiter.limit), (false, 0));
        assert_eq!(limiter.hit("2.2.2.2").await.unwrap().count, 1);

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(limiter.hit("1.1.1.1").await.unwrap().reset_secs, 15);

        tokio::time::advance(Duration::from_secs(15)).await;
        let hit = limiter.hit("1.1.1.1").await.unwrap();
        assert_eq!(hit, Hit { count: 1, reset_secs: 60 });
    }

    #[tokio::test]
    async fn unreachable_redis_reports_an_error() {
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let limiter = RateLimiter::redis(Arc::new(client), &Config::default());
        assert!(limiter.hit("1.1.1.1").await.is_err());
    }
}

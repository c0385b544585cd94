use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use location_routing::{
    AppState, build_router, with_rate_limit,
    cache::{MemoryRouteCache, RedisRouteCache, RouteCache},
    config::Config,
    database::{LocationStore, MemoryLocationStore, PgLocationStore},
    middleware::RateLimiter,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置地点存储
    let mut pool: Option<PgPool> = None;
    let store: Arc<dyn LocationStore> = match &config.database_url {
        Some(url) => {
            let pg = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("Failed to connect to Postgres");
            let store = PgLocationStore::new(pg.clone());
            store.migrate().await.expect("Migration failed");
            tracing::info!("Database connection established");
            pool = Some(pg);
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory location store");
            Arc::new(MemoryLocationStore::new())
        }
    };

    // 设置 Redis 客户端；连接失败时路线缓存会自动降级
    let redis = config.redis_url.as_ref().map(|url| {
        Arc::new(redis::Client::open(url.as_str()).expect("Failed to create Redis client"))
    });
    let cache: Arc<dyn RouteCache> = match (&redis, config.route_cache_capacity) {
        (Some(client), _) => Arc::new(RedisRouteCache::new(client.clone())),
        (None, Some(capacity)) => Arc::new(MemoryRouteCache::with_capacity(capacity)),
        (None, None) => Arc::new(MemoryRouteCache::new()),
    };
    if redis.is_none() {
        tracing::warn!("REDIS_URL not set, using in-memory route cache and rate limiter");
    }

    let state = AppState::new(store, cache, config.clone());
    let router = build_router(state);

    // 设置限流器：有 Redis 时共享计数，否则按进程计数
    let limiter = match redis {
        Some(client) => RateLimiter::redis(client, &config),
        None => RateLimiter::in_memory(&config),
    };
    let router = with_rate_limit(router, Arc::new(limiter));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connection closed");
    }
    tracing::info!("Server exited");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Gracefully shutting down server...");
}

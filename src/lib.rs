use std::sync::Arc;

use axum::{Router, routing::get};
use config::Config;
use database::LocationStore;
use service::RouteService;
use tower_http::trace::TraceLayer;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LocationStore>,
    pub routes: RouteService,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LocationStore>,
        cache: Arc<dyn cache::RouteCache>,
        config: Config,
    ) -> Self {
        let routes =
            RouteService::new(store.clone(), cache).with_ttl(config.route_cache_ttl());
        Self {
            store,
            routes,
            config,
        }
    }
}

/// 组装完整路由：健康检查、`api_base_uri` 下的业务接口以及日志中间件
pub fn build_router(state: AppState) -> Router {
    let base = state.config.api_base_uri.trim_end_matches('/');
    let router = Router::new().route("/health", get(routes::health));
    // axum 不允许在根路径 nest
    let router = if base.is_empty() {
        router.merge(routes::api_routes())
    } else {
        router.nest(base, routes::api_routes())
    };

    router
        .layer(axum::middleware::from_fn(middleware::log_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 在最外层挂载按 IP 的限流
pub fn with_rate_limit(router: Router, limiter: Arc<middleware::RateLimiter>) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        limiter,
        middleware::rate_limit,
    ))
}

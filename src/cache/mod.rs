// 缓存模块
// 路线缓存接口、缓存键以及 Redis / 内存两种实现

pub mod keys;
pub mod memory_cache;
pub mod redis_cache;
pub mod route_cache;

// 重新导出常用类型，方便其他模块使用
pub use memory_cache::MemoryRouteCache;
pub use redis_cache::RedisRouteCache;
pub use route_cache::{CacheError, RouteCache};

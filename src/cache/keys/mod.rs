/// 缓存键模块
/// 提供缓存键生成函数

// 路线缓存键模块
pub mod route_keys;

pub use route_keys::{quantize, route_key};

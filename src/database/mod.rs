// 数据库模块
// 地点存储接口及其 Postgres / 内存实现

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryLocationStore;
pub use postgres::PgLocationStore;
pub use store::{LocationStore, StoreError};

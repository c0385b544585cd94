use async_trait::async_trait;

use crate::models::{Location, NewLocation};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("location {0} not found")]
    NotFound(i64),
    #[error("location store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// 地点持久化接口，实现必须可以被多个请求并发调用
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn create(&self, location: NewLocation) -> Result<Location, StoreError>;

    /// 按 id 升序返回全部地点
    async fn find_all(&self) -> Result<Vec<Location>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Location, StoreError>;

    /// 覆盖可变字段并刷新 updated_at，created_at 保持不变
    async fn update(&self, id: i64, location: NewLocation) -> Result<Location, StoreError>;

    async fn paginate(&self, limit: i64, offset: i64) -> Result<Vec<Location>, StoreError>;
}

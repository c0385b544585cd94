use async_trait::async_trait;
use sqlx::PgPool;

use super::store::{LocationStore, StoreError};
use crate::models::{Location, NewLocation};

pub struct PgLocationStore {
    pool: PgPool,
}

impl PgLocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 执行内嵌的数据库迁移
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    async fn create(&self, location: NewLocation) -> Result<Location, StoreError> {
        let created = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, latitude, longitude, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, name, latitude, longitude, color, created_at, updated_at
            "#,
        )
        .bind(location.name())
        .bind(location.latitude())
        .bind(location.longitude())
        .bind(location.color())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created location: {}", created.id);
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<Location>, StoreError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, latitude, longitude, color, created_at, updated_at
            FROM locations
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    async fn find_by_id(&self, id: i64) -> Result<Location, StoreError> {
        sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, latitude, longitude, color, created_at, updated_at
            FROM locations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: i64, location: NewLocation) -> Result<Location, StoreError> {
        sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations
            SET name = $2, latitude = $3, longitude = $4, color = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, latitude, longitude, color, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(location.name())
        .bind(location.latitude())
        .bind(location.longitude())
        .bind(location.color())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    async fn paginate(&self, limit: i64, offset: i64) -> Result<Vec<Location>, StoreError> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT id, name, latitude, longitude, color, created_at, updated_at
            FROM locations
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }
}

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::store::{LocationStore, StoreError};
use crate::models::{Location, NewLocation};

/// 进程内存储，未配置数据库时使用
#[derive(Default)]
pub struct MemoryLocationStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    // 按 id 升序，插入总是追加到末尾
    locations: Vec<Location>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn create(&self, location: NewLocation) -> Result<Location, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let created = Location {
            id: inner.next_id,
            name: location.name,
            latitude: location.latitude,
            longitude: location.longitude,
            color: location.color,
            created_at: now,
            updated_at: now,
        };
        inner.locations.push(created.clone());
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<Location>, StoreError> {
        Ok(self.inner.read().await.locations.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Location, StoreError> {
        self.inner
            .read()
            .await
            .locations
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: i64, location: NewLocation) -> Result<Location, StoreError> {
        let mut inner = self.inner.write().await;
        let existing = inner
            .locations
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(StoreError::NotFound(id))?;

        existing.name = location.name;
        existing.latitude = location.latitude;
        existing.longitude = location.longitude;
        existing.color = location.color;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn paginate(&self, limit: i64, offset: i64) -> Result<Vec<Location>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let offset = usize::try_from(offset).unwrap_or(0);
        Ok(self
            .inner
            .read()
            .await
            .locations
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_location(name: &str, lat: f64, lon: f64) -> NewLocation {
        NewLocation::new(name, lat, lon, "#123456").unwrap()
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids() {
        let store = MemoryLocationStore::new();
        let a = store.create(new_location("A", 1.0, 1.0)).await.unwrap();
        let b = store.create(new_location("B", 2.0, 2.0)).await.unwrap();
        assert!(a.id < b.id);
        assert_eq!(store.find_all().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let store = MemoryLocationStore::new();
        let a = store.create(new_location("A", 1.0, 1.0)).await.unwrap();
        let updated = store.update(a.id, new_location("A2", 3.0, 4.0)).await.unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(updated.name, "A2");
        assert_eq!(updated.created_at, a.created_at);
        assert!(updated.updated_at >= a.updated_at);
        assert_eq!(store.find_by_id(a.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = MemoryLocationStore::new();
        assert!(matches!(store.find_by_id(9).await, Err(StoreError::NotFound(9))));
        assert!(matches!(
            store.update(9, new_location("X", 0.0, 0.0)).await,
            Err(StoreError::NotFound(9))
        ));
    }

    #[tokio::test]
    async fn paginate_applies_limit_and_offset() {
        let store = MemoryLocationStore::new();
        for i in 0..5 {
            store.create(new_location(&format!("L{i}"), 0.0, 0.0)).await.unwrap();
        }
        let page = store.paginate(2, 1).await.unwrap();
        let names: Vec<_> = page.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["L1", "L2"]);
        assert!(store.paginate(10, 5).await.unwrap().is_empty());
    }
}

//! In-memory media repository.

use crate::domain::Media;
use crate::ports::{MediaRepository, RepositoryError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct InMemoryMediaRepository {
    /// media id -> media, ordered so deletes report ids deterministically
    media: RwLock<BTreeMap<String, Media>>,
}

impl InMemoryMediaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.media.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.read().is_empty()
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepository {
    async fn insert(&self, media: Media) -> Result<(), RepositoryError> {
        self.media.write().insert(media.id.clone(), media);
        Ok(())
    }

    async fn find_by_product(&self, product_id: &str) -> Result<Vec<Media>, RepositoryError> {
        Ok(self
            .media
            .read()
            .values()
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn delete_by_product_ids(
        &self,
        product_ids: &[String],
    ) -> Result<Vec<String>, RepositoryError> {
        let mut media = self.media.write();
        let doomed: Vec<String> = media
            .values()
            .filter(|m| product_ids.contains(&m.product_id))
            .map(|m| m.id.clone())
            .collect();
        for id in &doomed {
            media.remove(id);
        }
        Ok(doomed)
    }
}

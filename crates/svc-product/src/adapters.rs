//! In-memory product repository.

use crate::domain::Product;
use crate::ports::{ProductRepository, RepositoryError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, product: Product) -> Result<(), RepositoryError> {
        self.products.write().insert(product.id.clone(), product);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().get(id).cloned())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read();
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.products.write().remove(id).is_some())
    }
}

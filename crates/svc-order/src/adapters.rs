//! In-memory order repository.

use crate::domain::Order;
use crate::ports::{OrderRepository, RepositoryError};
use async_trait::async_trait;
use parking_lot::RwLock;

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: Order) -> Result<(), RepositoryError> {
        self.orders.write().push(order);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .orders
            .read()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }
}

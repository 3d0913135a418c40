//! Document store seam shared by both jobs.
//!
//! Jobs only see [`DocumentStore`]: typed queries over the `users` and `orders`
//! collections plus an atomic [`WriteBatch`]. `PgDocumentStore` backs it with
//! PostgreSQL through sea-orm; `MemoryStore` keeps everything in process.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

use crate::error::{AppError, AppResult};
use crate::models::{Order, OrderStatus, Subscriber};
use crate::utils::DayWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberQuery {
    All,
    Active,
}

/// Orders of one user with a given status dated inside a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSelector {
    pub user_id: String,
    pub status: OrderStatus,
    pub window: DayWindow,
}

impl OrderSelector {
    pub fn matches(&self, order: &Order) -> bool {
        order.user_id == self.user_id
            && order.status == self.status
            && self.window.contains(order.date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Full overwrite, creating the record if missing.
    SetOrder(Order),
    UpdateOrderStatus { order_id: String, status: OrderStatus },
    UpdateSubscriptionEndDate { user_id: String, end_date: DateTime<Utc> },
}

/// Writes staged for one atomic commit.
#[derive(Debug, Clone)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
    limit: usize,
}

impl WriteBatch {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            ops: Vec::new(),
            limit,
        }
    }

    fn stage(&mut self, op: WriteOp) -> AppResult<()> {
        if self.ops.len() >= self.limit {
            return Err(AppError::BatchFull(self.limit));
        }
        self.ops.push(op);
        Ok(())
    }

    pub fn set_order(&mut self, order: Order) -> AppResult<()> {
        self.stage(WriteOp::SetOrder(order))
    }

    pub fn update_order_status(&mut self, order_id: &str, status: OrderStatus) -> AppResult<()> {
        self.stage(WriteOp::UpdateOrderStatus {
            order_id: order_id.to_string(),
            status,
        })
    }

    pub fn update_subscription_end_date(
        &mut self,
        user_id: &str,
        end_date: DateTime<Utc>,
    ) -> AppResult<()> {
        self.stage(WriteOp::UpdateSubscriptionEndDate {
            user_id: user_id.to_string(),
            end_date,
        })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn subscribers(&self, query: SubscriberQuery) -> AppResult<Vec<Subscriber>>;

    async fn find_orders(&self, selector: &OrderSelector) -> AppResult<Vec<Order>>;

    /// Upper bound on operations in one committed batch.
    fn max_batch_writes(&self) -> usize;

    fn batch(&self) -> WriteBatch {
        WriteBatch::with_limit(self.max_batch_writes())
    }

    /// All staged writes land or none do. Updating a missing record fails the
    /// whole batch.
    async fn commit(&self, batch: WriteBatch) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_refuses_past_limit() {
        let mut batch = WriteBatch::with_limit(2);
        batch
            .update_order_status("sub-1-2024-03-05-Lunch", OrderStatus::Paused)
            .unwrap();
        batch
            .update_order_status("sub-1-2024-03-05-Dinner", OrderStatus::Paused)
            .unwrap();
        let err = batch
            .update_subscription_end_date("user-1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::BatchFull(2)));
        assert_eq!(batch.len(), 2);
    }
}

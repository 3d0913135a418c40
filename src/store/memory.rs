use super::{DocumentStore, OrderSelector, SubscriberQuery, WriteBatch, WriteOp};
use crate::error::{AppError, AppResult};
use crate::models::{Order, Subscriber};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct Collections {
    users: BTreeMap<String, Subscriber>,
    orders: BTreeMap<String, Order>,
}

/// In-process document store.
///
/// Commits are applied to a copy and swapped in only when every operation
/// succeeds, so a failed batch leaves no trace.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<Collections>>,
    failing_commits: Arc<Mutex<usize>>,
    max_batch_writes: usize,
}

impl MemoryStore {
    pub fn new(max_batch_writes: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(Collections::default())),
            failing_commits: Arc::new(Mutex::new(0)),
            max_batch_writes,
        }
    }

    pub async fn put_subscriber(&self, subscriber: Subscriber) {
        let mut state = self.state.lock().await;
        state.users.insert(subscriber.id.clone(), subscriber);
    }

    pub async fn put_order(&self, order: Order) {
        let mut state = self.state.lock().await;
        state.orders.insert(order.id.clone(), order);
    }

    pub async fn subscriber(&self, id: &str) -> Option<Subscriber> {
        self.state.lock().await.users.get(id).cloned()
    }

    pub async fn order(&self, id: &str) -> Option<Order> {
        self.state.lock().await.orders.get(id).cloned()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.values().cloned().collect()
    }

    /// Makes the next `n` commits fail as if the store were unreachable.
    pub async fn fail_next_commits(&self, n: usize) {
        *self.failing_commits.lock().await = n;
    }
}

impl Collections {
    fn apply(&mut self, op: WriteOp) -> AppResult<()> {
        match op {
            WriteOp::SetOrder(order) => {
                self.orders.insert(order.id.clone(), order);
            }
            WriteOp::UpdateOrderStatus { order_id, status } => {
                let order = self
                    .orders
                    .get_mut(&order_id)
                    .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
                order.status = status;
            }
            WriteOp::UpdateSubscriptionEndDate { user_id, end_date } => {
                let user = self
                    .users
                    .get_mut(&user_id)
                    .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
                user.subscription_end_date = Some(end_date);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribers(&self, query: SubscriberQuery) -> AppResult<Vec<Subscriber>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| query == SubscriberQuery::All || u.active_subscription)
            .cloned()
            .collect())
    }

    async fn find_orders(&self, selector: &OrderSelector) -> AppResult<Vec<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .filter(|o| selector.matches(o))
            .cloned()
            .collect())
    }

    fn max_batch_writes(&self) -> usize {
        self.max_batch_writes
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        {
            let mut failing = self.failing_commits.lock().await;
            if *failing > 0 {
                *failing -= 1;
                return Err(AppError::InternalError("store unavailable".into()));
            }
        }
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        for op in batch.into_ops() {
            next.apply(op)?;
        }
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderMeal, OrderStatus};
    use chrono::{TimeZone, Utc};

    fn order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            subscription_id: "sub-1".to_string(),
            user_id: "user-1".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            meal_type: OrderMeal::Lunch,
            category: None,
            status: OrderStatus::PendingDelivery,
            delivery_assigned_to: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_store_unchanged() {
        let store = MemoryStore::new(10);
        store.put_order(order("sub-1-2024-03-05-Lunch")).await;

        let mut batch = store.batch();
        batch
            .update_order_status("sub-1-2024-03-05-Lunch", OrderStatus::Paused)
            .unwrap();
        batch
            .update_order_status("sub-1-2024-03-05-Dinner", OrderStatus::Paused)
            .unwrap();
        let err = store.commit(batch).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        let kept = store.order("sub-1-2024-03-05-Lunch").await.unwrap();
        assert_eq!(kept.status, OrderStatus::PendingDelivery);
    }

    #[tokio::test]
    async fn test_injected_commit_failure() {
        let store = MemoryStore::new(10);
        store.fail_next_commits(1).await;

        let mut batch = store.batch();
        batch.set_order(order("sub-1-2024-03-05-Lunch")).unwrap();
        assert!(store.commit(batch.clone()).await.is_err());
        assert!(store.orders().await.is_empty());

        store.commit(batch).await.unwrap();
        assert_eq!(store.orders().await.len(), 1);
    }
}

use crate::error::AppResult;
use crate::models::Subscriber;
use crate::services::chunked::{JobReport, StageSubscriber, commit_in_chunks};
use crate::services::order_plan::orders_to_create;
use crate::store::{DocumentStore, SubscriberQuery, WriteBatch};
use crate::utils::ServiceDay;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Creates tomorrow's orders for every active, unpaused subscription.
#[derive(Clone)]
pub struct OrderGenerationService {
    store: Arc<dyn DocumentStore>,
    tz: Tz,
    subscribers_per_chunk: usize,
}

struct GenerateStep {
    day: ServiceDay,
    now: DateTime<Utc>,
}

#[async_trait]
impl StageSubscriber for GenerateStep {
    async fn stage(&self, subscriber: &Subscriber, batch: &mut WriteBatch) -> AppResult<()> {
        for order in orders_to_create(subscriber, &self.day, self.now)? {
            batch.set_order(order)?;
        }
        Ok(())
    }
}

impl OrderGenerationService {
    pub const JOB: &'static str = "generate_orders";

    pub fn new(store: Arc<dyn DocumentStore>, tz: Tz, subscribers_per_chunk: usize) -> Self {
        Self {
            store,
            tz,
            subscribers_per_chunk,
        }
    }

    pub async fn generate_tomorrow_orders(&self) -> AppResult<JobReport> {
        self.generate_at(Utc::now()).await
    }

    /// Runs as if triggered at `now`. Orders are upserted by id, so running
    /// twice for the same day rewrites the same records.
    pub async fn generate_at(&self, now: DateTime<Utc>) -> AppResult<JobReport> {
        let day = ServiceDay::tomorrow(now, self.tz);
        log::info!("Generating orders for {}", day.key());

        let subscribers = self.store.subscribers(SubscriberQuery::Active).await?;
        let mut report = JobReport {
            job: Self::JOB,
            day: day.key(),
            ..Default::default()
        };
        let step = GenerateStep { day, now };
        commit_in_chunks(
            self.store.as_ref(),
            &step,
            &subscribers,
            self.subscribers_per_chunk,
            &mut report,
        )
        .await;

        log::info!(
            "Order generation for {} finished: {} subscribers, {} orders written, {} chunks failed",
            report.day,
            report.subscribers,
            report.writes,
            report.chunks_failed
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderMeal, OrderStatus};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn subscriber(id: &str, meal_type: &str, end_day: u32) -> Subscriber {
        Subscriber {
            id: id.to_string(),
            active_subscription: true,
            subscription_id: Some(format!("sub-{id}")),
            subscription_end_date: Some(Utc.with_ymd_and_hms(2024, 3, end_day, 0, 0, 0).unwrap()),
            is_paused: false,
            meal_type: Some(meal_type.to_string()),
            category: Some("veg".to_string()),
        }
    }

    fn trigger() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
    }

    fn service(store: &MemoryStore, chunk: usize) -> OrderGenerationService {
        OrderGenerationService::new(Arc::new(store.clone()), UTC, chunk)
    }

    #[tokio::test]
    async fn test_generates_lunch_and_dinner() {
        let store = MemoryStore::new(500);
        store.put_subscriber(subscriber("u1", "Both", 31)).await;

        let report = service(&store, 100).generate_at(trigger()).await.unwrap();

        assert_eq!(report.day, "2024-03-05");
        assert_eq!(report.writes, 2);
        assert!(report.is_clean());
        let lunch = store.order("sub-u1-2024-03-05-Lunch").await.unwrap();
        let dinner = store.order("sub-u1-2024-03-05-Dinner").await.unwrap();
        assert_eq!(lunch.meal_type, OrderMeal::Lunch);
        assert_eq!(dinner.meal_type, OrderMeal::Dinner);
        assert_eq!(lunch.status, OrderStatus::PendingDelivery);
        assert_eq!(dinner.status, OrderStatus::PendingDelivery);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let store = MemoryStore::new(500);
        store.put_subscriber(subscriber("u1", "Both", 31)).await;
        let svc = service(&store, 100);

        svc.generate_at(trigger()).await.unwrap();
        let first = store.orders().await;
        svc.generate_at(trigger()).await.unwrap();
        let second = store.orders().await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_skips_expired_paused_and_inactive() {
        let store = MemoryStore::new(500);
        store.put_subscriber(subscriber("expired", "Both", 4)).await;
        let mut paused = subscriber("paused", "Both", 31);
        paused.is_paused = true;
        store.put_subscriber(paused).await;
        let mut inactive = subscriber("inactive", "Both", 31);
        inactive.active_subscription = false;
        store.put_subscriber(inactive).await;

        let report = service(&store, 100).generate_at(trigger()).await.unwrap();

        assert_eq!(report.subscribers, 2);
        assert_eq!(report.writes, 0);
        assert!(store.orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_subscriber_only_drops_its_chunk() {
        let store = MemoryStore::new(500);
        store.put_subscriber(subscriber("a", "Lunch", 31)).await;
        let mut broken = subscriber("b", "Lunch", 31);
        broken.subscription_end_date = None;
        store.put_subscriber(broken).await;
        store.put_subscriber(subscriber("c", "Dinner", 31)).await;

        // chunks: [a, b] [c]
        let report = service(&store, 2).generate_at(trigger()).await.unwrap();

        assert_eq!(report.chunks_failed, 1);
        assert_eq!(report.chunks_committed, 1);
        assert!(store.order("sub-a-2024-03-05-Lunch").await.is_none());
        assert!(store.order("sub-c-2024-03-05-Dinner").await.is_some());
    }

    #[tokio::test]
    async fn test_commit_failure_is_reported() {
        let store = MemoryStore::new(500);
        store.put_subscriber(subscriber("a", "Both", 31)).await;
        store.fail_next_commits(1).await;

        let report = service(&store, 100).generate_at(trigger()).await.unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.writes, 0);
        assert!(store.orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_chunk_fails_against_batch_limit() {
        let store = MemoryStore::new(3);
        store.put_subscriber(subscriber("a", "Both", 31)).await;
        store.put_subscriber(subscriber("b", "Both", 31)).await;

        let report = service(&store, 2).generate_at(trigger()).await.unwrap();
        assert_eq!(report.chunks_failed, 1);

        let report = service(&store, 1).generate_at(trigger()).await.unwrap();
        assert_eq!(report.chunks_committed, 2);
        assert_eq!(store.orders().await.len(), 4);
    }
}

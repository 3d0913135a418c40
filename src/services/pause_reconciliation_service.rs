use crate::error::AppResult;
use crate::models::{OrderStatus, Subscriber};
use crate::services::chunked::{JobReport, StageSubscriber, commit_in_chunks};
use crate::services::order_plan::{PauseAction, pause_action};
use crate::store::{DocumentStore, SubscriberQuery, WriteBatch};
use crate::utils::ServiceDay;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Brings tomorrow's orders in line with each subscriber's pause flag.
///
/// Paused subscribers get their end date pushed out by one day and tomorrow's
/// pending orders paused; everyone else gets tomorrow's paused orders back.
#[derive(Clone)]
pub struct PauseReconciliationService {
    store: Arc<dyn DocumentStore>,
    tz: Tz,
    subscribers_per_chunk: usize,
}

struct ReconcileStep<'a> {
    store: &'a dyn DocumentStore,
    day: ServiceDay,
}

#[async_trait]
impl StageSubscriber for ReconcileStep<'_> {
    async fn stage(&self, subscriber: &Subscriber, batch: &mut WriteBatch) -> AppResult<()> {
        match pause_action(subscriber, &self.day)? {
            PauseAction::Pause {
                extended_end_date,
                orders,
            } => {
                batch.update_subscription_end_date(&subscriber.id, extended_end_date)?;
                for order in self.store.find_orders(&orders).await? {
                    batch.update_order_status(&order.id, OrderStatus::Paused)?;
                }
            }
            PauseAction::Resume { orders } => {
                for order in self.store.find_orders(&orders).await? {
                    batch.update_order_status(&order.id, OrderStatus::PendingDelivery)?;
                }
            }
            PauseAction::Nothing => {}
        }
        Ok(())
    }
}

impl PauseReconciliationService {
    pub const JOB: &'static str = "reconcile_pauses";

    pub fn new(store: Arc<dyn DocumentStore>, tz: Tz, subscribers_per_chunk: usize) -> Self {
        Self {
            store,
            tz,
            subscribers_per_chunk,
        }
    }

    pub async fn reconcile_tomorrow(&self) -> AppResult<JobReport> {
        self.reconcile_at(Utc::now()).await
    }

    pub async fn reconcile_at(&self, now: DateTime<Utc>) -> AppResult<JobReport> {
        let day = ServiceDay::tomorrow(now, self.tz);
        log::info!("Reconciling paused subscriptions for {}", day.key());

        let subscribers = self.store.subscribers(SubscriberQuery::All).await?;
        let mut report = JobReport {
            job: Self::JOB,
            day: day.key(),
            ..Default::default()
        };
        let step = ReconcileStep {
            store: self.store.as_ref(),
            day,
        };
        commit_in_chunks(
            self.store.as_ref(),
            &step,
            &subscribers,
            self.subscribers_per_chunk,
            &mut report,
        )
        .await;

        log::info!(
            "Daily pause finalization for {} finished: {} subscribers, {} writes, {} chunks failed",
            report.day,
            report.subscribers,
            report.writes,
            report.chunks_failed
        );
        Ok(report)
    }
}

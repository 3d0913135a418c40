use crate::error::AppResult;
use crate::models::Subscriber;
use crate::store::{DocumentStore, WriteBatch};
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub job: &'static str,
    pub day: String,
    pub subscribers: usize,
    pub writes: usize,
    pub chunks_committed: usize,
    pub chunks_failed: usize,
}

impl JobReport {
    pub fn is_clean(&self) -> bool {
        self.chunks_failed == 0
    }
}

/// One job's per-subscriber staging logic.
#[async_trait]
pub(crate) trait StageSubscriber: Sync {
    async fn stage(&self, subscriber: &Subscriber, batch: &mut WriteBatch) -> AppResult<()>;
}

/// Stages subscribers chunk by chunk, committing one batch per chunk.
///
/// A staging or commit error drops only the chunk it happened in.
pub(crate) async fn commit_in_chunks<S: StageSubscriber>(
    store: &dyn DocumentStore,
    step: &S,
    subscribers: &[Subscriber],
    chunk_size: usize,
    report: &mut JobReport,
) {
    report.subscribers = subscribers.len();
    for (index, chunk) in subscribers.chunks(chunk_size.max(1)).enumerate() {
        let mut batch = store.batch();
        let mut dropped = false;
        for subscriber in chunk {
            if let Err(e) = step.stage(subscriber, &mut batch).await {
                log::error!(
                    "{}: chunk {index} dropped at subscriber {}: {e}",
                    report.job,
                    subscriber.id
                );
                dropped = true;
                break;
            }
        }
        if dropped {
            report.chunks_failed += 1;
            continue;
        }

        let writes = batch.len();
        if writes == 0 {
            continue;
        }
        match store.commit(batch).await {
            Ok(()) => {
                report.chunks_committed += 1;
                report.writes += writes;
            }
            Err(e) => {
                log::error!("{}: failed to commit chunk {index}: {e}", report.job);
                report.chunks_failed += 1;
            }
        }
    }
}

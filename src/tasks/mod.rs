//! Daily scheduled jobs.
//!
//! Order generation runs at local midnight and pause finalization at 22:00 by
//! default; both cron expressions and the time zone come from `ScheduleConfig`.
//! Call `start_all` once during startup.

use crate::config::ScheduleConfig;
use crate::error::AppResult;
use crate::services::{JobReport, OrderGenerationService, PauseReconciliationService};
use tokio_cron_scheduler::{Job, JobScheduler};

/// Register both jobs and start the scheduler.
///
/// Notes
/// - Each job is idempotent and re-derives its writes from current state, so a
///   failed run is simply picked up by the next trigger.
/// - The returned scheduler must be kept alive; call `shutdown` on exit.
pub async fn start_all(
    schedule: &ScheduleConfig,
    order_generation_service: OrderGenerationService,
    pause_reconciliation_service: PauseReconciliationService,
) -> AppResult<JobScheduler> {
    let tz = schedule.tz()?;
    let sched = JobScheduler::new().await?;

    // 每天零点生成次日订单
    {
        let svc = order_generation_service.clone();
        sched
            .add(Job::new_async_tz(
                schedule.generate_orders.as_str(),
                tz,
                move |_uuid, _lock| {
                    let svc = svc.clone();
                    Box::pin(async move {
                        log_run(
                            OrderGenerationService::JOB,
                            svc.generate_tomorrow_orders().await,
                        );
                    })
                },
            )?)
            .await?;
    }

    // 每天 22:00 结算暂停状态
    {
        let svc = pause_reconciliation_service.clone();
        sched
            .add(Job::new_async_tz(
                schedule.reconcile_pauses.as_str(),
                tz,
                move |_uuid, _lock| {
                    let svc = svc.clone();
                    Box::pin(async move {
                        log_run(
                            PauseReconciliationService::JOB,
                            svc.reconcile_tomorrow().await,
                        );
                    })
                },
            )?)
            .await?;
    }

    sched.start().await?;
    log::info!(
        "Scheduled {} at '{}' and {} at '{}' ({})",
        OrderGenerationService::JOB,
        schedule.generate_orders,
        PauseReconciliationService::JOB,
        schedule.reconcile_pauses,
        schedule.time_zone
    );
    Ok(sched)
}

fn log_run(job: &str, result: AppResult<JobReport>) {
    match result {
        Ok(report) if report.is_clean() => {
            log::info!("{job} completed: {}", report_json(&report));
        }
        Ok(report) => {
            log::error!("{job} completed with failed chunks: {}", report_json(&report));
        }
        Err(e) => log::error!("{job} failed: {e:?}"),
    }
}

fn report_json(report: &JobReport) -> String {
    serde_json::to_string(report).unwrap_or_else(|_| format!("{report:?}"))
}

//! Daily timer trigger.
//!
//! Registers a cron job that runs the scheduled report once a day at a fixed
//! local time. A failed run is logged and the job simply fires again the next
//! day.

use std::sync::Arc;

use chrono::{NaiveTime, Timelike};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::pipeline::{ReportPipeline, Trigger};

pub struct DailyScheduler {
    pipeline: Arc<ReportPipeline>,
    at: NaiveTime,
}

impl DailyScheduler {
    pub fn new(pipeline: Arc<ReportPipeline>, at: NaiveTime) -> Self {
        Self { pipeline, at }
    }

    /// Starts the job scheduler on the current runtime.
    ///
    /// The returned scheduler keeps running until it is shut down or dropped
    /// together with the runtime.
    pub async fn start(self) -> Result<JobScheduler, JobSchedulerError> {
        let tz = self.pipeline.timezone();
        let mut scheduler = JobScheduler::new().await?;
        let job_id = scheduler.add(daily_job(self.pipeline, self.at)?).await?;
        scheduler.start().await?;

        match scheduler.next_tick_for_job(job_id).await {
            Ok(Some(next)) => info!(at = %self.at, %tz, next = %next.with_timezone(&tz), "scheduler started"),
            _ => info!(at = %self.at, %tz, "scheduler started"),
        }
        Ok(scheduler)
    }
}

/// `sec min hour day month weekday`, firing every day at `at`.
pub fn cron_expression(at: NaiveTime) -> String {
    format!("0 {} {} * * *", at.minute(), at.hour())
}

/// The scheduled report as a job evaluated in the pipeline's time zone.
pub fn daily_job(pipeline: Arc<ReportPipeline>, at: NaiveTime) -> Result<Job, JobSchedulerError> {
    let tz = pipeline.timezone();
    Job::new_async_tz(cron_expression(at).as_str(), tz, move |_id, _scheduler| {
        let pipeline = pipeline.clone();
        Box::pin(async move {
            info!("cron processed");
            match pipeline.run(Trigger::Scheduled).await {
                Ok(summary) => info!(devices = summary.readings.len(), "scheduled report sent"),
                Err(e) => error!(error = %e, "scheduled report failed"),
            }
        })
    })
}

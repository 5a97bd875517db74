use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::db::Store;
use crate::services::password_reset::RATE_LIMIT_WINDOW_MINUTES;

/// Background compaction of stale password-reset attempt rows.
///
/// Correctness never depends on this job: the rate limiter windows by
/// time, so stale rows are invisible either way.
pub struct Scheduler {
    store: Store,
    config: SchedulerConfig,
}

impl Scheduler {
    #[must_use]
    pub const fn new(store: Store, config: SchedulerConfig) -> Self {
        Self { store, config }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        let interval_mins = self.config.attempt_purge_interval_minutes;
        info!("Attempt purge running every {} minutes", interval_mins);

        let sched = JobScheduler::new().await?;

        let store = self.store.clone();
        let cron = format!("0 */{interval_mins} * * * *");
        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let store = store.clone();
            Box::pin(async move {
                purge_stale_attempts(&store).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        // Keep the task alive; the caller aborts it on shutdown.
        let mut tick = interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
        }
    }
}

async fn purge_stale_attempts(store: &Store) {
    let cutoff = Utc::now() - ChronoDuration::minutes(RATE_LIMIT_WINDOW_MINUTES);

    match store.attempts().purge_older_than(cutoff).await {
        Ok(0) => debug!("No stale reset attempts to purge"),
        Ok(n) => info!("Purged {n} stale reset attempts"),
        Err(e) => warn!("Reset attempt purge failed: {e}"),
    }
}

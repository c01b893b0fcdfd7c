use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::api::{self, AppState};

/// Start re-scraping on `schedule` (six-field cron: sec min hour day month weekday).
///
/// The returned scheduler must be kept alive for the jobs to keep firing.
pub async fn start(state: Arc<AppState>, schedule: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_id, _scheduler| {
        let state = state.clone();
        Box::pin(async move {
            info!("Scheduled Mars scrape starting");
            if let Err(e) = api::refresh(&state).await {
                error!(error = %format!("{:#}", e), "Scheduled Mars scrape failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(%schedule, "Periodic scraping enabled");

    Ok(scheduler)
}

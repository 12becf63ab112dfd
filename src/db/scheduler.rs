use super::{DBClient, UserExt};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every hour, on the hour
const CLEANUP_SCHEDULE: &str = "0 0 * * * *";

impl DBClient {
    /// Starts the background job that drops expired password reset tokens.
    ///
    /// The scheduler runs on its own task; the returned handle keeps it alive.
    pub async fn start_cleanup_task(&self) -> Result<JobScheduler, JobSchedulerError> {
        let sched = JobScheduler::new().await?;
        let db_client = self.clone();

        let job = Job::new_async(CLEANUP_SCHEDULE, move |uuid, _l| {
            let db_client = db_client.clone();
            Box::pin(async move {
                tracing::debug!("Running reset token cleanup job {:?}", uuid);

                match db_client.clear_expired_reset_tokens().await {
                    Ok(cleared) => {
                        tracing::info!(job = %uuid, cleared, "Reset token cleanup finished");
                    }
                    Err(e) => {
                        tracing::error!(job = %uuid, "Reset token cleanup failed: {}", e);
                    }
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        Ok(sched)
    }
}

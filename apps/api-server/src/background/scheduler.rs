//! Cron-style job scheduler using tokio-cron-scheduler.

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use inkwell_core::ports::RateLimiter;

/// Every minute, on the minute.
pub const RATE_LIMIT_SWEEP_SCHEDULE: &str = "0 * * * * *";

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    enabled: bool,
}

impl Scheduler {
    /// A disabled scheduler accepts jobs but never runs them.
    pub async fn new(enabled: bool) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, enabled })
    }

    /// Add a cron job. `schedule` has a leading seconds field.
    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

/// Drop idle keys from every limiter once a minute.
pub async fn register_rate_limit_sweep(
    scheduler: &Scheduler,
    limiters: Vec<(&'static str, Arc<dyn RateLimiter>)>,
    window: Duration,
) -> Result<uuid::Uuid, JobSchedulerError> {
    let limiters = Arc::new(limiters);

    scheduler
        .add_cron(RATE_LIMIT_SWEEP_SCHEDULE, move || {
            let limiters = limiters.clone();
            async move { sweep_all(&limiters, window) }
        })
        .await
}

fn sweep_all(limiters: &[(&'static str, Arc<dyn RateLimiter>)], window: Duration) {
    for (name, limiter) in limiters {
        let removed = limiter.sweep(window);
        tracing::debug!(
            limiter = name,
            removed,
            tracked = limiter.tracked_keys(),
            "Rate limiter sweep"
        );
    }
}

#[cfg(test)]
mod tests {
    use inkwell_core::ports::Quota;
    use inkwell_infra::SlidingWindowRateLimiter;

    use super::*;

    #[test]
    fn test_sweep_all_drops_expired_keys() {
        let limiter = Arc::new(SlidingWindowRateLimiter::new());
        let quota = Quota::new(5, Duration::from_millis(1));
        limiter.check("a", quota);
        limiter.check("b", quota);
        std::thread::sleep(Duration::from_millis(5));

        let limiters: Vec<(&'static str, Arc<dyn RateLimiter>)> = vec![("admin", limiter.clone())];
        sweep_all(&limiters, Duration::from_millis(1));

        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_disabled_scheduler_does_not_start() {
        let scheduler = Scheduler::new(false).await.unwrap();
        let limiter: Arc<dyn RateLimiter> = Arc::new(SlidingWindowRateLimiter::new());

        register_rate_limit_sweep(&scheduler, vec![("public", limiter)], Duration::from_secs(60))
            .await
            .unwrap();
        scheduler.start().await.unwrap();
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::jobs::JobDeps;

/// Runs `job` on its own cadence forever, enforcing a deadline of half the
/// cadence per spec.md §5 ("Scheduled jobs carry a deadline equal to half
/// their cadence; on timeout, the job aborts and its next run retries.").
/// A timed-out or panicking run is logged and simply waits for the next
/// tick rather than tearing down the process.
pub fn spawn<F, Fut>(name: &'static str, cadence_secs: u64, deps: Arc<JobDeps>, job: F)
where
    F: Fn(Arc<JobDeps>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cadence_secs.max(1)));
        let deadline = Duration::from_secs((cadence_secs / 2).max(1));
        loop {
            ticker.tick().await;
            match tokio::time::timeout(deadline, job(deps.clone())).await {
                Ok(()) => {}
                Err(_) => warn!(job = name, deadline_secs = deadline.as_secs(), "job run exceeded its deadline, aborting"),
            }
        }
    });
}

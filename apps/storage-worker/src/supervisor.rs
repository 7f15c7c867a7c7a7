use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::drain::{run_project_drain, DrainDeps};

/// Polls Redis for project queues and spawns one drain task per
/// newly-seen project. Tasks are never stopped once started; a project
/// that goes quiet just means its drain loop blocks on an empty queue.
/// That trade favors simplicity over reclaiming idle task slots, which is
/// fine at the scale this worker targets — see the design notes for the
/// rationale.
pub async fn run(deps: Arc<DrainDeps>) {
    let mut spawned: HashSet<String> = HashSet::new();
    let interval = Duration::from_secs(deps.settings.project_discovery_interval_secs);

    loop {
        match deps.queue.known_project_ids().await {
            Ok(project_ids) => {
                for project_id in project_ids {
                    if spawned.insert(project_id.clone()) {
                        info!(project_id, "starting drain task for newly observed project");
                        let deps = deps.clone();
                        tokio::spawn(run_project_drain(project_id, deps));
                    }
                }
            }
            Err(err) => warn!(error = %err, "failed to list known project queues"),
        }
        tokio::time::sleep(interval).await;
    }
}

use crate::{cli::spinner, config, error, pipeline::Runner, success};

/// Pulls the user's recently played tracks into the local rolling history.
pub async fn sync_history(user_id: &str) {
    let runner = match Runner::from_env() {
        Ok(runner) => runner,
        Err(e) => error!("Cannot set up the Spotify client. Err: {}", e),
    };

    let retention_days = config::history_retention_days();
    let pb = spinner("Fetching recently played tracks...");
    let added = runner.sync_history(user_id, retention_days).await;
    pb.finish_and_clear();

    match added {
        Ok(added) => success!(
            "Stored {} new plays for {} (keeping {} days)",
            added,
            user_id,
            retention_days
        ),
        Err(e) => error!("Failed to sync listening history. Err: {}", e),
    }
}

use chrono::Utc;
use tabled::Table;

use crate::{
    cli::spinner,
    config, error, info,
    management::{ModuleStore, RunLog},
    pipeline::Runner,
    success,
    types::{RunRecord, TrackTableRow},
    warning,
};

/// Runs a module once and prints the resulting track list.
pub async fn run(module_id: &str) {
    let data_dir = config::data_dir();
    let module = match ModuleStore::new(data_dir.clone()).load(module_id).await {
        Ok(module) => module,
        Err(e) => error!("Cannot load module {}. Err: {}", module_id, e),
    };

    let runner = match Runner::from_env() {
        Ok(runner) => runner,
        Err(e) => error!("Cannot set up the Spotify client. Err: {}", e),
    };

    let pb = spinner(&format!("Running module {}...", module.id));
    let outcome = runner.run(&module).await;
    pb.finish_and_clear();

    let record = RunRecord {
        module_id: module.id.clone(),
        timestamp: Utc::now(),
        was_scheduled: false,
        failed: outcome.is_err(),
    };
    if let Err(e) = RunLog::new(data_dir).append(&record).await {
        warning!("Failed to record run. Err: {}", e);
    }

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => error!("Module {} failed. Err: {}", module.id, e),
    };

    for source_id in &outcome.failed_sources {
        warning!("Source {} contributed no tracks", source_id);
    }
    for dropped in &outcome.dropped_pages {
        warning!(
            "Page at offset {} of source {} was skipped",
            dropped.offset,
            dropped.source_id
        );
    }

    if outcome.tracks.is_empty() {
        info!("Module {} produced no tracks", module.id);
    } else {
        let rows: Vec<TrackTableRow> = outcome
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| TrackTableRow {
                position: i + 1,
                name: t.name.clone(),
                uri: t.uri.clone(),
            })
            .collect();
        println!("{}", Table::new(rows));
    }

    if outcome.sync.removed > 0 {
        info!(
            "Removed {} tracks from {}",
            outcome.sync.removed, module.destination.playlist_id
        );
    }
    success!(
        "Wrote {} tracks to {} in {} batches",
        outcome.sync.inserted,
        module.destination.playlist_id,
        outcome.sync.insert_batches
    );
}

use chrono::Utc;
use tabled::Table;

use crate::{
    config, error, info,
    management::{RunLog, ScheduleStore},
    schedule::{HttpTimer, LifecycleOutcome, ReconcileMode, ScheduleLifecycle, upcoming},
    success,
    types::{Schedule, TriggerTableRow},
    utils, warning,
};

async fn load_schedule(store: &ScheduleStore, schedule_id: &str) -> Schedule {
    match store.load(schedule_id).await {
        Ok(schedule) => schedule,
        Err(e) => error!("Cannot load schedule {}. Err: {}", schedule_id, e),
    }
}

fn timer() -> HttpTimer {
    match HttpTimer::from_env() {
        Ok(timer) => timer,
        Err(e) => error!("Cannot set up the timer facility. Err: {}", e),
    }
}

/// Arms the timer of a schedule for its first trigger.
pub async fn arm_schedule(schedule_id: &str) {
    let data_dir = config::data_dir();
    let schedules = ScheduleStore::new(data_dir.clone());
    let runs = RunLog::new(data_dir);
    let timer = timer();

    let mut schedule = load_schedule(&schedules, schedule_id).await;
    let lifecycle = ScheduleLifecycle::new(&timer, &schedules, &runs);

    match lifecycle
        .reconcile(&mut schedule, ReconcileMode::Arm, Utc::now())
        .await
    {
        Ok(LifecycleOutcome::Armed(instant)) => {
            success!("Schedule {} armed for {}", schedule.id, instant)
        }
        Ok(LifecycleOutcome::Terminated) => {
            warning!("Schedule {} has nothing left to trigger", schedule.id)
        }
        Err(e) => error!("Failed to arm schedule {}. Err: {}", schedule.id, e),
    }
}

/// Soft-deletes a schedule and disarms its timer.
pub async fn remove_schedule(schedule_id: &str) {
    let data_dir = config::data_dir();
    let schedules = ScheduleStore::new(data_dir.clone());
    let runs = RunLog::new(data_dir);
    let timer = timer();

    let mut schedule = load_schedule(&schedules, schedule_id).await;
    let lifecycle = ScheduleLifecycle::new(&timer, &schedules, &runs);

    if let Err(e) = lifecycle.retire(&mut schedule, Utc::now()).await {
        error!("Failed to remove schedule {}. Err: {}", schedule.id, e);
    }
    success!("Schedule {} removed", schedule.id);
}

/// Prints the next `count` trigger instants of a schedule.
///
/// Starts from the stored next trigger, or from now when the schedule is not armed.
pub async fn next_triggers(schedule_id: &str, count: usize) {
    let schedules = ScheduleStore::new(config::data_dir());
    let schedule = load_schedule(&schedules, schedule_id).await;

    let Some(rule) = &schedule.repetition_rule else {
        match schedule.next_trigger {
            Some(instant) => info!(
                "Schedule {} fires once at {} ({})",
                schedule.id,
                instant,
                utils::cron_expression(instant)
            ),
            None => info!("Schedule {} fires once and is not armed", schedule.id),
        }
        return;
    };

    let from = schedule.next_trigger.unwrap_or_else(Utc::now);
    let rows: Vec<TriggerTableRow> = upcoming(rule, from, count)
        .into_iter()
        .enumerate()
        .map(|(i, instant)| TriggerTableRow {
            occurrence: i + 1,
            instant: instant.to_rfc3339(),
            cron: utils::cron_expression(instant),
        })
        .collect();

    println!("{}", Table::new(rows));
}

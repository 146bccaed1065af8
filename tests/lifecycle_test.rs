mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sporlflow::{
    error::Error,
    management::{RunLog, ScheduleStore},
    schedule::{LifecycleOutcome, ReconcileMode, ScheduleLifecycle, should_continue},
    types::{RepetitionRule, RunRecord, Schedule},
};
use tempfile::TempDir;

use common::{FakeTimer, nz};

const MODULE: &str = "weekly-mix";

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn daily_schedule(next_trigger: Option<DateTime<Utc>>, armed: bool) -> Schedule {
    Schedule {
        id: "weekly-mix-schedule".to_string(),
        module_id: MODULE.to_string(),
        next_trigger,
        repetition_rule: Some(RepetitionRule::Days { quantity: nz(1) }),
        end_date: None,
        max_occurrences: None,
        has_armed_timer: armed,
        deleted_at: None,
    }
}

struct Fixture {
    _dir: TempDir,
    schedules: ScheduleStore,
    runs: RunLog,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            schedules: ScheduleStore::new(dir.path().to_path_buf()),
            runs: RunLog::new(dir.path().to_path_buf()),
            _dir: dir,
        }
    }

    async fn record_runs(&self, count: usize, was_scheduled: bool, failed: bool) {
        for _ in 0..count {
            self.runs
                .append(&RunRecord {
                    module_id: MODULE.to_string(),
                    timestamp: Utc::now(),
                    was_scheduled,
                    failed,
                })
                .await
                .unwrap();
        }
    }
}

#[test]
fn test_should_continue_boundaries() {
    let now = at(2024, 6, 10, 12);
    let mut schedule = daily_schedule(None, false);
    assert!(should_continue(&schedule, 0, now));

    schedule.max_occurrences = Some(3);
    assert!(should_continue(&schedule, 2, now));
    assert!(!should_continue(&schedule, 3, now));
    assert!(!should_continue(&schedule, 4, now));

    schedule.max_occurrences = None;
    schedule.end_date = Some(now);
    assert!(should_continue(&schedule, 0, now));
    schedule.end_date = Some(now - Duration::seconds(1));
    assert!(!should_continue(&schedule, 0, now));
    schedule.end_date = Some(now + Duration::days(1));
    assert!(should_continue(&schedule, 0, now));
}

#[tokio::test]
async fn test_first_arming_uses_future_seed() {
    let fx = Fixture::new();
    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let now = at(2024, 6, 10, 12);
    let seed = at(2024, 6, 11, 8);
    let mut schedule = daily_schedule(Some(seed), false);

    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::Arm, now)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Armed(seed));

    let armed = timer.armed();
    assert_eq!(armed.len(), 1);
    assert_eq!(armed[0].1, "0 8 11 6 *");
    assert_eq!(armed[0].2.module_id, MODULE);
    assert_eq!(armed[0].2.schedule_id.as_deref(), Some("weekly-mix-schedule"));
    assert_eq!(timer.disarm_count(), 0);

    let stored = fx.schedules.load("weekly-mix-schedule").await.unwrap();
    assert!(stored.has_armed_timer);
    assert_eq!(stored.next_trigger, Some(seed));
}

#[tokio::test]
async fn test_first_arming_skips_past_triggers() {
    let fx = Fixture::new();
    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let now = at(2024, 6, 10, 12);
    let mut schedule = daily_schedule(Some(at(2024, 6, 7, 8)), false);

    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::Arm, now)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Armed(at(2024, 6, 11, 8)));
}

#[tokio::test]
async fn test_after_run_disarms_and_rearms_next_instant() {
    let fx = Fixture::new();
    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let fired = at(2024, 6, 10, 8);
    let mut schedule = daily_schedule(Some(fired), true);
    schedule.repetition_rule = Some(RepetitionRule::Weeks {
        quantity: nz(1),
        days_of_week: Default::default(),
    });

    let outcome = lifecycle
        .reconcile(
            &mut schedule,
            ReconcileMode::AfterRun,
            fired + Duration::seconds(5),
        )
        .await
        .unwrap();

    assert_eq!(outcome, LifecycleOutcome::Armed(at(2024, 6, 17, 8)));
    assert_eq!(timer.disarm_count(), 1);
    assert_eq!(timer.armed().len(), 1);
    assert!(schedule.has_armed_timer);
}

#[tokio::test]
async fn test_after_run_terminates_when_occurrences_exhausted() {
    let fx = Fixture::new();
    fx.record_runs(3, true, false).await;

    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let fired = at(2024, 6, 10, 8);
    let mut schedule = daily_schedule(Some(fired), true);
    schedule.max_occurrences = Some(3);

    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::AfterRun, fired)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Terminated);
    assert_eq!(timer.disarm_count(), 1);
    assert!(timer.armed().is_empty());

    let stored = fx.schedules.load("weekly-mix-schedule").await.unwrap();
    assert_eq!(stored.next_trigger, None);
    assert!(!stored.has_armed_timer);
}

#[tokio::test]
async fn test_only_successful_scheduled_runs_count() {
    let fx = Fixture::new();
    fx.record_runs(2, true, false).await;
    fx.record_runs(2, true, true).await;
    fx.record_runs(2, false, false).await;

    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let fired = at(2024, 6, 10, 8);
    let mut schedule = daily_schedule(Some(fired), true);
    schedule.max_occurrences = Some(3);

    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::AfterRun, fired)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Armed(at(2024, 6, 11, 8)));
}

#[tokio::test]
async fn test_after_run_terminates_past_end_date() {
    let fx = Fixture::new();
    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let fired = at(2024, 6, 10, 8);
    let mut schedule = daily_schedule(Some(fired), true);
    schedule.end_date = Some(at(2024, 6, 10, 0));

    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::AfterRun, fired)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Terminated);
}

#[tokio::test]
async fn test_disarming_unarmed_schedule_is_noop() {
    let fx = Fixture::new();
    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let now = at(2024, 6, 10, 8);
    let mut schedule = daily_schedule(Some(now), true);
    schedule.end_date = Some(at(2024, 6, 1, 0));

    lifecycle
        .reconcile(&mut schedule, ReconcileMode::AfterRun, now)
        .await
        .unwrap();
    assert_eq!(timer.disarm_count(), 1);

    // already terminated: nothing armed, nothing to disarm
    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::AfterRun, now)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Terminated);
    assert_eq!(timer.disarm_count(), 1);
    assert!(timer.armed().is_empty());
}

#[tokio::test]
async fn test_one_shot_schedule_terminates_after_run() {
    let fx = Fixture::new();
    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let fired = at(2024, 6, 10, 8);
    let mut schedule = daily_schedule(Some(fired), true);
    schedule.repetition_rule = None;

    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::AfterRun, fired)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Terminated);
    assert_eq!(schedule.next_trigger, None);
}

#[tokio::test]
async fn test_failed_arm_never_persists_armed_state() {
    let fx = Fixture::new();
    let timer = FakeTimer::failing();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let fired = at(2024, 6, 10, 8);
    let mut schedule = daily_schedule(Some(fired), true);

    let result = lifecycle
        .reconcile(&mut schedule, ReconcileMode::AfterRun, fired)
        .await;
    assert!(matches!(result, Err(Error::SchedulingBackend(_))));

    let stored = fx.schedules.load("weekly-mix-schedule").await.unwrap();
    assert!(!stored.has_armed_timer);
    assert_eq!(timer.disarm_count(), 1);
}

#[tokio::test]
async fn test_retire_soft_deletes_and_disarms() {
    let fx = Fixture::new();
    let timer = FakeTimer::default();
    let lifecycle = ScheduleLifecycle::new(&timer, &fx.schedules, &fx.runs);

    let now = at(2024, 6, 10, 12);
    let mut schedule = daily_schedule(Some(at(2024, 6, 11, 8)), true);

    lifecycle.retire(&mut schedule, now).await.unwrap();
    assert_eq!(timer.disarm_count(), 1);

    let stored = fx.schedules.load("weekly-mix-schedule").await.unwrap();
    assert_eq!(stored.deleted_at, Some(now));
    assert_eq!(stored.next_trigger, None);
    assert!(!stored.has_armed_timer);

    // a deleted schedule never re-arms
    let outcome = lifecycle
        .reconcile(&mut schedule, ReconcileMode::Arm, now)
        .await
        .unwrap();
    assert_eq!(outcome, LifecycleOutcome::Terminated);
    assert!(timer.armed().is_empty());
}

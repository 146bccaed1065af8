use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    info,
    management::{RunLog, ScheduleStore},
    schedule::{recurrence::next_trigger, timer::TimerFacility},
    types::{InvokeRequest, RepetitionRule, Schedule},
    utils, warning,
};

/// Upper bound on missed triggers skipped in one reconciliation.
pub const MAX_CATCH_UP: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// First arming of a freshly created schedule.
    Arm,
    /// End of a scheduled invocation.
    AfterRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOutcome {
    Armed(DateTime<Utc>),
    Terminated,
}

/// Whether a schedule may fire again given `completed` successful scheduled runs.
pub fn should_continue(schedule: &Schedule, completed: u32, now: DateTime<Utc>) -> bool {
    if schedule.end_date.is_some_and(|end| end < now) {
        return false;
    }
    if schedule.max_occurrences.is_some_and(|max| completed >= max) {
        return false;
    }
    true
}

/// Keeps the persisted `{next_trigger, has_armed_timer}` pair in step with the
/// external timer facility.
///
/// The armed flag is only ever persisted as `true` after the facility confirmed the
/// arm. A failed disarm leaves the stored state untouched.
pub struct ScheduleLifecycle<'a> {
    timer: &'a dyn TimerFacility,
    schedules: &'a ScheduleStore,
    runs: &'a RunLog,
}

impl<'a> ScheduleLifecycle<'a> {
    pub fn new(timer: &'a dyn TimerFacility, schedules: &'a ScheduleStore, runs: &'a RunLog) -> Self {
        Self {
            timer,
            schedules,
            runs,
        }
    }

    pub async fn reconcile(
        &self,
        schedule: &mut Schedule,
        mode: ReconcileMode,
        now: DateTime<Utc>,
    ) -> Result<LifecycleOutcome> {
        if schedule.is_deleted() {
            self.retire(schedule, now).await?;
            return Ok(LifecycleOutcome::Terminated);
        }

        let completed = self.runs.count_completed(&schedule.module_id).await?;

        if schedule.has_armed_timer {
            self.timer.disarm(&schedule.id).await?;
            schedule.has_armed_timer = false;
        }

        let next = if should_continue(schedule, completed, now) || mode == ReconcileMode::Arm {
            next_instant(schedule, mode, now)
        } else {
            info!(
                "Schedule {} finished after {} runs",
                schedule.id, completed
            );
            None
        };

        let Some(instant) = next else {
            schedule.next_trigger = None;
            self.schedules.persist(schedule).await?;
            return Ok(LifecycleOutcome::Terminated);
        };

        let payload = InvokeRequest {
            module_id: schedule.module_id.clone(),
            schedule_id: Some(schedule.id.clone()),
        };
        let cron = utils::cron_expression(instant);

        if let Err(e) = self.timer.arm(&schedule.id, &cron, &payload).await {
            // the disarm above is confirmed, the arm is not
            self.schedules.persist(schedule).await?;
            return Err(e);
        }

        schedule.next_trigger = Some(instant);
        schedule.has_armed_timer = true;
        self.schedules.persist(schedule).await?;
        info!("Schedule {} armed for {} ({})", schedule.id, instant, cron);
        Ok(LifecycleOutcome::Armed(instant))
    }

    /// Disarms a removed schedule and persists it as terminated.
    pub async fn retire(&self, schedule: &mut Schedule, now: DateTime<Utc>) -> Result<()> {
        self.timer.disarm(&schedule.id).await?;
        schedule.next_trigger = None;
        schedule.has_armed_timer = false;
        schedule.deleted_at.get_or_insert(now);
        self.schedules.persist(schedule).await
    }
}

fn next_instant(
    schedule: &Schedule,
    mode: ReconcileMode,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let seed = schedule.next_trigger?;

    match (mode, schedule.repetition_rule.as_ref()) {
        (ReconcileMode::Arm, _) if seed > now => Some(seed),
        (_, None) => None,
        (_, Some(rule)) => {
            let first = next_trigger(rule, seed);
            let instant = catch_up(rule, first, now);
            if instant.is_none() {
                warning!(
                    "Schedule {} could not reach a future trigger, terminating",
                    schedule.id
                );
            }
            instant
        }
    }
}

/// Applies `rule` until the instant lies after `now`, skipping missed triggers.
fn catch_up(
    rule: &RepetitionRule,
    mut instant: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    for _ in 0..MAX_CATCH_UP {
        if instant > now {
            return Some(instant);
        }
        instant = next_trigger(rule, instant);
    }
    (instant > now).then_some(instant)
}

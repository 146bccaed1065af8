//! # Schedule Module
//!
//! Recurring invocations of a module. The process itself keeps no timers: the
//! next instant is computed by [`recurrence::next_trigger`] and handed to an external
//! [`timer::TimerFacility`], which calls `POST /invoke` back when it fires.
//!
//! ## Lifecycle
//!
//! ```text
//! unarmed ──reconcile(Arm)──────→ armed
//! armed ──fires, run, reconcile(AfterRun)──→ armed (next instant) | unarmed (finished)
//! any ──retire──→ unarmed, soft-deleted
//! ```
//!
//! A schedule finishes when its end date has passed, when the number of successful
//! scheduled runs reaches `max_occurrences`, or when it has no repetition rule.

pub mod lifecycle;
pub mod recurrence;
pub mod timer;

pub use lifecycle::{LifecycleOutcome, ReconcileMode, ScheduleLifecycle, should_continue};
pub use recurrence::{next_trigger, upcoming};
pub use timer::{HttpTimer, TimerFacility};

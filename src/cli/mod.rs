//! # CLI Module
//!
//! Command-line front end of the service. Every command loads what it needs from the
//! stores below the data directory, reports progress with the crate's logging macros
//! and exits through `error!` when it cannot continue.
//!
//! ## Commands
//!
//! ### Running modules
//!
//! - [`run`] - Runs a module once, outside of its schedule, and prints the tracks
//!   written to the destination playlist. The run is logged as unscheduled, so it does
//!   not count against `max_occurrences`.
//!
//! ### Schedules
//!
//! - [`arm_schedule`] - Arms the timer of a schedule for its first trigger
//! - [`remove_schedule`] - Soft-deletes a schedule and disarms its timer
//! - [`next_triggers`] - Previews upcoming trigger instants and their cron expressions
//!
//! ### Listening history
//!
//! - [`sync_history`] - Pulls recently played tracks into the rolling history that
//!   `recently_listened` sources read from
//!
//! ## Usage Patterns
//!
//! ```bash
//! sporlflow run --module weekly-mix
//! sporlflow schedule next --schedule weekly-mix-schedule --count 5
//! sporlflow schedule arm --schedule weekly-mix-schedule
//! sporlflow history sync --user alice
//! ```

mod history;
mod run;
mod schedule;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use history::sync_history;
pub use run::run;
pub use schedule::{arm_schedule, next_triggers, remove_schedule};

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}

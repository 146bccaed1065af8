//! Spotify Playlist Pipeline Library
//!
//! This library runs user-defined playlist pipelines ("modules"): it gathers tracks
//! from declared sources, folds a list of actions over them and writes the result into
//! a destination playlist. Modules may carry a recurring schedule that is armed in an
//! external timer facility which calls back into the invocation endpoint.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for invocations and health checks
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by the pipeline, the scheduler and the API
//! - `management` - JSON backed stores for credentials, modules, schedules and logs
//! - `pipeline` - Source aggregation, action pipeline and playlist sync writer
//! - `resilient` - Single refresh-and-retry wrapper around provider calls
//! - `schedule` - Recurrence engine, schedule lifecycle and timer facility
//! - `server` - HTTP server bootstrap
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Calendar and batching helpers
//!
//! # Example
//!
//! ```
//! use sporlflow::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> sporlflow::error::Result<()> {
//!     config::load_env().await?;
//!     server::start_api_server().await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod pipeline;
pub mod resilient;
pub mod schedule;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// Prints an informational message with a blue bullet point.
///
/// Used for general information and status updates throughout the application.
///
/// # Example
///
/// ```
/// info!("Fetching {} sources", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Playlist synced with {} tracks", count);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for unrecoverable errors at the binary's top level. Library code returns
/// [`error::Error`] instead.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Every locally recovered failure (an unavailable source, a dropped page, a
/// rate-limit wait) is reported through this macro.
///
/// # Example
///
/// ```
/// warning!("Source {} unavailable: {}", id, err);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

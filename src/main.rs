use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use sporlflow::{cli, config, error, server};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server receiving invocations
    Serve,

    /// Run a module once, outside of its schedule
    Run(RunOptions),

    /// Handle module schedules
    Schedule(ScheduleOptions),

    /// Handle the local listening history
    History(HistoryOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct RunOptions {
    /// Id of the module to run
    #[clap(long)]
    module: String,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Handle module schedules")]
pub struct ScheduleOptions {
    #[command(subcommand)]
    pub command: ScheduleSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScheduleSubcommand {
    /// Arm the timer for the first trigger
    Arm(ScheduleTarget),

    /// Remove a schedule and disarm its timer
    Remove(ScheduleTarget),

    /// Preview upcoming triggers
    Next(NextOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct ScheduleTarget {
    /// Id of the schedule
    #[clap(long)]
    pub schedule: String,
}

#[derive(Parser, Debug, Clone)]
pub struct NextOpts {
    /// Id of the schedule
    #[clap(long)]
    pub schedule: String,

    /// Number of triggers to show
    #[clap(long, default_value_t = 5)]
    pub count: usize,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Handle the local listening history")]
pub struct HistoryOptions {
    #[command(subcommand)]
    pub command: HistorySubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum HistorySubcommand {
    /// Pull recently played tracks into the history
    Sync(HistorySyncOpts),
}

#[derive(Parser, Debug, Clone)]
pub struct HistorySyncOpts {
    /// Id of the user whose history is synced
    #[clap(long)]
    pub user: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            if let Err(e) = server::start_api_server().await {
                error!("Server stopped. Err: {}", e);
            }
        }
        Command::Run(opt) => cli::run(&opt.module).await,
        Command::Schedule(opt) => match opt.command {
            ScheduleSubcommand::Arm(t) => cli::arm_schedule(&t.schedule).await,
            ScheduleSubcommand::Remove(t) => cli::remove_schedule(&t.schedule).await,
            ScheduleSubcommand::Next(n) => cli::next_triggers(&n.schedule, n.count).await,
        },
        Command::History(opt) => match opt.command {
            HistorySubcommand::Sync(s) => cli::sync_history(&s.user).await,
        },
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}

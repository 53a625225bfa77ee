use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use globalt_notifier::cli_style::{self, get_styles, CommandHelp};
use globalt_notifier::config::{AppConfig, CliConfig, FileConfig};
use globalt_notifier::local_store::{LocalStateStore, MemoryLocalStore, SqliteLocalStore};
use globalt_notifier::metrics;
use globalt_notifier::notifications::{
    create_poller, AggregateNotificationState, Aggregator, BackendClient, CategoryId,
    NotificationBell, PollerHandle, WatermarkStore,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(styles = get_styles(), version)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the flags below.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Base URL of the school backend.
    #[clap(long)]
    pub base_url: Option<String>,

    /// Bearer token of the current session.
    #[clap(long, env = "GLOBALT_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Path to the SQLite file holding the last-seen watermarks.
    #[clap(long, value_parser = parse_path)]
    pub state_db: Option<PathBuf>,

    /// Seconds between two poll cycles.
    #[clap(long)]
    pub poll_interval_secs: Option<u64>,

    /// Per-request timeout in seconds.
    #[clap(long)]
    pub request_timeout_secs: Option<u64>,

    /// Maximum number of entries listed in the panel.
    #[clap(long)]
    pub panel_max_items: Option<usize>,

    /// Poll once, print the aggregate as JSON and exit.
    #[clap(long)]
    pub once: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            base_url: self.base_url.clone(),
            auth_token: self.auth_token.clone(),
            state_db: self.state_db.clone(),
            poll_interval_secs: self.poll_interval_secs,
            request_timeout_secs: self.request_timeout_secs,
            panel_max_items: self.panel_max_items,
        }
    }
}

#[derive(Parser)]
#[command(styles = get_styles(), name = "", disable_help_subcommand = true)]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Shows the badge and the per-category counts of the last poll.
    Status,

    /// Opens the panel and marks every category as seen.
    Open,

    /// Closes the panel.
    Close,

    /// Polls the backend right away.
    Refresh,

    /// Marks a single category as seen.
    Seen { category: String },

    /// Shows the stored last-seen instants.
    Watermarks,

    /// Forgets every last-seen instant.
    Reset,

    /// Prints the Prometheus metrics.
    Metrics,

    /// Shows this list.
    Help,

    /// Close this program.
    Exit,
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "status",
        args: "",
        description: "Badge and per-category counts",
    },
    CommandHelp {
        name: "open",
        args: "",
        description: "Open the panel, marking everything as seen",
    },
    CommandHelp {
        name: "close",
        args: "",
        description: "Close the panel",
    },
    CommandHelp {
        name: "refresh",
        args: "",
        description: "Poll the backend now",
    },
    CommandHelp {
        name: "seen",
        args: "<category>",
        description: "Mark one category as seen",
    },
    CommandHelp {
        name: "watermarks",
        args: "",
        description: "Show last-seen instants",
    },
    CommandHelp {
        name: "reset",
        args: "",
        description: "Forget every last-seen instant",
    },
    CommandHelp {
        name: "metrics",
        args: "",
        description: "Print Prometheus metrics",
    },
    CommandHelp {
        name: "help",
        args: "",
        description: "Show this list",
    },
    CommandHelp {
        name: "exit",
        args: "",
        description: "Quit",
    },
];

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

/// Everything the REPL thread needs to act on the bell.
struct ReplContext {
    runtime: Handle,
    poller: PollerHandle,
    bell: Arc<Mutex<NotificationBell>>,
    watermarks: Arc<WatermarkStore>,
}

fn print_state(bell: &NotificationBell) {
    cli_style::print_badge_line(bell.badge());
    match bell.latest() {
        Some(state) => cli_style::print_counts(state),
        None => cli_style::print_empty_list("No poll finished yet"),
    }
}

fn execute_command(line: String, ctx: &ReplContext) -> CommandExecutionResult {
    if line.trim().is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => match cli.command {
            InnerCommand::Status => {
                print_state(&ctx.bell.lock().unwrap());
            }
            InnerCommand::Open => {
                let mut bell = ctx.bell.lock().unwrap();
                if bell.open(Utc::now()) {
                    cli_style::print_success("All categories marked as seen");
                }
                match bell.panel() {
                    Some(state) => cli_style::print_panel(state),
                    None => cli_style::print_empty_list("No poll finished yet"),
                }
            }
            InnerCommand::Close => {
                ctx.bell.lock().unwrap().close();
                cli_style::print_success("Panel closed");
            }
            InnerCommand::Refresh => match ctx.runtime.block_on(ctx.poller.refresh()) {
                Ok(state) => {
                    let mut bell = ctx.bell.lock().unwrap();
                    bell.apply_poll(state);
                    print_state(&bell);
                }
                Err(err) => return CommandExecutionResult::Error(format!("{}", err)),
            },
            InnerCommand::Seen { category } => match CategoryId::parse(&category) {
                Some(category) => {
                    ctx.watermarks.advance_one(category, Utc::now());
                    cli_style::print_success(&format!("{} marked as seen", category.label()));
                }
                None => {
                    let known: Vec<&str> = CategoryId::ALL.iter().map(|c| c.as_str()).collect();
                    return CommandExecutionResult::Error(format!(
                        "Unknown category '{}', expected one of: {}",
                        category,
                        known.join(", ")
                    ));
                }
            },
            InnerCommand::Watermarks => {
                cli_style::print_watermarks(&ctx.watermarks.snapshot());
            }
            InnerCommand::Reset => {
                ctx.watermarks.clear();
                cli_style::print_warning("Watermarks cleared, every record counts as new");
            }
            InnerCommand::Metrics => {
                print!("{}", metrics::render());
            }
            InnerCommand::Help => cli_style::print_help(COMMANDS),
            InnerCommand::Exit => return CommandExecutionResult::Exit,
        },

        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
        }
    }
    CommandExecutionResult::Ok
}

#[derive(rustyline_derive::Hinter)]
struct CommandHelper {
    commands_names: Vec<String>,
}

impl CommandHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandHelper { commands_names }
    }
}

impl Completer for CommandHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandHelper {}
impl Validator for CommandHelper {}
impl Helper for CommandHelper {}

fn run_repl(ctx: ReplContext) -> Result<()> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<CommandHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(CommandHelper::new()));

    let prompt = cli_style::get_prompt();
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &ctx) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Error(err) => cli_style::print_error(&err),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}

/// Applies every published poll to the bell, reprinting the badge when the total moves.
async fn watch_polls(
    mut updates: watch::Receiver<Option<AggregateNotificationState>>,
    bell: Arc<Mutex<NotificationBell>>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let Some(state) = updates.borrow_and_update().clone() else {
                    continue;
                };
                let mut bell = bell.lock().unwrap();
                let previous = bell.latest().map(|s| s.total);
                let total = state.total;
                if bell.apply_poll(state) && previous != Some(total) {
                    cli_style::print_badge_line(bell.badge());
                    cli_style::flush();
                }
            }
        }
    }
}

fn open_local_store(config: &AppConfig) -> Arc<dyn LocalStateStore> {
    match SqliteLocalStore::new(&config.state_db) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                "Could not open state db {:?}, last-seen marks will not survive a restart: {:#}",
                config.state_db, e
            );
            Arc::new(MemoryLocalStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    metrics::init_metrics();

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let watermarks = Arc::new(WatermarkStore::new(open_local_store(&config)));

    let backend = BackendClient::new(
        config.base_url.clone(),
        config.request_timeout_secs,
        config.auth_token.clone(),
    )
    .context("Failed to build backend HTTP client")?;
    let fetchers = backend.fetchers(config.endpoints.enabled());
    let aggregator = Arc::new(Aggregator::new(
        fetchers,
        watermarks.clone(),
        Duration::from_secs(config.request_timeout_secs),
        config.panel_max_items,
    ));
    info!(
        "Watching {:?} on {}",
        aggregator.categories(),
        backend.base_url()
    );

    if cli_args.once {
        let state = aggregator.poll().await;
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let (poller, poller_handle) = create_poller(
        aggregator,
        Duration::from_secs(config.poll_interval_secs),
        shutdown.clone(),
    );
    let poller_task = tokio::spawn(poller.run());

    let bell = Arc::new(Mutex::new(NotificationBell::new(watermarks.clone())));
    let watcher_task = tokio::spawn(watch_polls(
        poller_handle.subscribe(),
        bell.clone(),
        shutdown.clone(),
    ));

    cli_style::print_welcome(backend.base_url(), &config.state_db.display().to_string());

    let ctx = ReplContext {
        runtime: Handle::current(),
        poller: poller_handle,
        bell: bell.clone(),
        watermarks,
    };
    let repl_result = tokio::task::spawn_blocking(move || run_repl(ctx))
        .await
        .context("REPL thread panicked")?;

    bell.lock().unwrap().teardown();
    shutdown.cancel();
    let _ = poller_task.await;
    let _ = watcher_task.await;
    cli_style::print_goodbye();

    repl_result
}

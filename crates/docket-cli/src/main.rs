#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "docket: issue tracker client with a kanban board",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Config file (default: $XDG_CONFIG_HOME/docket/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        about = "Show a project as a kanban board",
        long_about = "Fetch a project's tickets and group them into To Do, In Progress, and Done.",
        after_help = "EXAMPLES:\n    # Show the board\n    dk board -p 65f0c2\n\n    # Only high-priority tickets\n    dk board -p 65f0c2 --priority high"
    )]
    Board(cmd::board::BoardArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets",
        long_about = "List a project's tickets in board order with optional filters.",
        after_help = "EXAMPLES:\n    # List everything\n    dk list -p 65f0c2\n\n    # Search open tickets\n    dk list -p 65f0c2 --status open --search login\n\n    # Emit machine-readable output\n    dk list -p 65f0c2 --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Board",
        about = "Move a ticket to another column",
        long_about = "Move a ticket on the board and persist its new status.",
        after_help = "EXAMPLES:\n    # Start work on a ticket\n    dk move 65f0d9 -p 65f0c2 --to in-progress\n\n    # Put it at the top of Done\n    dk move 65f0d9 -p 65f0c2 --to closed --index 0"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Create a ticket",
        after_help = "EXAMPLES:\n    # Create a ticket\n    dk create -p 65f0c2 --title \"Login returns 500\" --priority high"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Tickets",
        about = "Edit a ticket",
        after_help = "EXAMPLES:\n    # Rename and reassign\n    dk update 65f0d9 -p 65f0c2 --title \"Login 500 on SSO\" --assignee 65f0aa\n\n    # Unassign\n    dk update 65f0d9 -p 65f0c2 --assignee \"\""
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    dk completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DOCKET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "docket=debug,info"
        } else {
            "docket=info,warn"
        })
    });

    let format = env::var("DOCKET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    docket_core::init();

    let output = cli.output_mode();
    debug!(?output, "resolved output mode");
    let open_session = || cmd::Session::open(cli.config.as_deref(), output);

    match &cli.command {
        Commands::Board(args) => cmd::board::run_board(args, &open_session()?),
        Commands::List(args) => cmd::list::run_list(args, &open_session()?),
        Commands::Move(args) => cmd::move_cmd::run_move(args, &open_session()?),
        Commands::Create(args) => cmd::create::run_create(args, &open_session()?),
        Commands::Update(args) => cmd::update::run_update(args, &open_session()?),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

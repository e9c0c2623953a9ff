//! idepack CLI - package manager for IDE rule packs and MCP servers

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod error;
mod exit_codes;
mod util;

use commands::Context;
use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "idepack")]
#[command(author = "idepack Contributors")]
#[command(version)]
#[command(about = "Package manager for IDE rule packs and MCP servers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .idepack/project.yaml in a project
    Init {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// IDE to sync (repeatable)
        #[arg(long = "ide")]
        ides: Vec<String>,

        /// Overwrite an existing project config
        #[arg(long)]
        force: bool,
    },

    /// Install packages and their dependencies
    Install {
        /// Package names
        #[arg(required = true)]
        names: Vec<String>,

        /// Reinstall packages that are already installed
        #[arg(long)]
        force: bool,
    },

    /// Remove installed packages
    Uninstall {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List available packages
    List {
        /// Only show installed packages
        #[arg(long)]
        installed: bool,
    },

    /// Search packages by name or description
    Search { query: String },

    /// Show package details and template variables
    Info { name: String },

    /// Download the latest official registry
    Update,

    /// Use a local package directory instead of the published package
    Link {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Remove a linked development package
    Unlink {
        /// Package name
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Remove every link
        #[arg(long)]
        all: bool,
    },

    /// Regenerate IDE rules and MCP config for a project
    Sync {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },

    /// Build a distributable archive from a package directory
    Pack {
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output directory (defaults to the package directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove downloaded archives
    Clean,

    /// Read or change user settings
    #[command(subcommand)]
    Config(ConfigAction),
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print every setting
    Show,

    /// Print one setting
    Get { key: String },

    /// Change one setting
    Set { key: String, value: String },
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {e}")))?;

    let ctx = Context::load()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Init {
                project,
                ides,
                force,
            } => commands::init::run(&project, &ides, force),
            Commands::Install { names, force } => commands::install::run(&ctx, &names, force).await,
            Commands::Uninstall { names } => commands::uninstall::run(&ctx, &names),
            Commands::List { installed } => commands::list::run(&ctx, installed),
            Commands::Search { query } => commands::search::run(&ctx, &query),
            Commands::Info { name } => commands::info::run(&ctx, &name),
            Commands::Update => commands::update::run(&ctx).await,
            Commands::Link { dir } => commands::link::link(&ctx, &dir),
            Commands::Unlink { name, all } => commands::link::unlink(&ctx, name.as_deref(), all),
            Commands::Sync { project } => commands::sync::run(&ctx, &project),
            Commands::Pack { dir, output } => commands::pack::run(&dir, output.as_deref()),
            Commands::Clean => commands::clean::run(&ctx),
            Commands::Config(ConfigAction::Show) => commands::config::show(&ctx),
            Commands::Config(ConfigAction::Get { key }) => commands::config::get(&ctx, &key),
            Commands::Config(ConfigAction::Set { key, value }) => {
                commands::config::set(&ctx, &key, &value)
            }
        }
    })
}

/// Log to stderr; `--debug` raises the default level, `RUST_LOG` overrides it
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

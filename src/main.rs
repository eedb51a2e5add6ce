//! Block Dashboard - CLI entry point
//!
//! `bdash tui` opens the interactive dashboard, `bdash watch` streams event
//! hashes to stdout, and `bdash config` manages the configuration file.

use block_dashboard::client::SessionConfig;
use block_dashboard::config::{
    default, error::ConfigError, loader::ConfigLoader, schema::Config, xdg,
};
use block_dashboard::logging::{self, LogTarget};
use block_dashboard::tui::app::App;
use block_dashboard::watch::run_watch;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Terminal dashboard for ledger block and transaction notifications
#[derive(Parser)]
#[command(name = "bdash")]
#[command(version, about = "Terminal dashboard for ledger block and transaction notifications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the bdash CLI
#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal user interface
    Tui {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Connect immediately and print `block <hash>` / `tx <hash>` lines
    Watch {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by commands that talk to a node.
#[derive(Args, Debug, Clone, Default)]
struct ConnectionArgs {
    /// Base WebSocket URL of the node (overrides server.url)
    #[arg(long)]
    url: Option<String>,

    /// Configuration file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Create default configuration file
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate {
        /// File to validate instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tui { connection } => run_tui_command(&connection),
        Commands::Watch { connection } => run_watch_command(&connection),
        Commands::Config { action } => run_config_command(action),
    }
}

/// Loads configuration, applies CLI overrides, and validates the result.
fn resolve(args: &ConnectionArgs) -> Result<(Config, SessionConfig), ConfigError> {
    let mut config = ConfigLoader::load(args.config.as_deref())?;
    if let Some(url) = &args.url {
        config.server.url = url.clone();
    }
    config.validate()?;
    let session = SessionConfig::for_server(&config.server.url, config.server.heartbeat_duration()?);
    Ok((config, session))
}

fn run_tui_command(args: &ConnectionArgs) -> ExitCode {
    let (config, session) = match resolve(args) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&config.log, LogTarget::file_for(&config.log)) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    let tick_rate = match config.tui.tick_rate_duration() {
        Ok(rate) => rate,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let mut app = App::new(session, config.tui.row_cap());
    if let Err(e) = rt.block_on(app.run(tick_rate)) {
        eprintln!("TUI error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run_watch_command(args: &ConnectionArgs) -> ExitCode {
    let (config, session) = match resolve(args) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&config.log, LogTarget::Stderr) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };
    let result = rt.block_on(async {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        };
        run_watch(session, &mut out, shutdown).await
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_config_command(action: ConfigAction) -> ExitCode {
    let result = match action {
        ConfigAction::Init { force } => default::create_default_config(&xdg::config_path(), force)
            .map(|path| println!("Created configuration at {}", path.display())),
        ConfigAction::Path => {
            println!("{}", xdg::config_path().display());
            Ok(())
        }
        ConfigAction::Validate { config } => ConfigLoader::load(config.as_deref())
            .and_then(|config| config.validate().map(|()| config))
            .map(|config| {
                println!("Configuration is valid");
                println!("{config:#?}");
            }),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}

//! Binary entrypoint for the macropad keypad driver.
use std::{
    path::{Path, PathBuf},
    process,
    sync::Arc,
    time::Duration,
};

use clap::{Parser, Subcommand};
use config::{load_from_path, resolve_config_path};
use logging::LogArgs;
use macropad_engine::{
    ActionContext, CommandRunner, LogNotifier, NotificationSink, Orchestrator, RealCommandRunner,
    TerminalNotifier,
};
use tokio::{runtime::Builder, signal};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Admin HTTP endpoint.
mod admin;
/// Config key table to engine actions.
mod bindings;
mod error;
/// Device discovery and opening.
mod transport;

use crate::error::Result;

/// Time allowed for blocking work (stdin reads, commands) when exiting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "macropad", about = "Drive a serial macro keypad", version)]
/// Command-line interface for the `macropad` binary.
struct Cli {
    /// Optional subcommand.
    #[command(subcommand)]
    command: Option<Command>,

    /// Logging controls
    #[command(flatten)]
    log: LogArgs,

    /// Optional path to the config file (defaults to ~/.macropad.ron)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Keypad device to open (overrides the config and probing)
    #[arg(long, value_name = "PATH", conflicts_with = "stdio")]
    port: Option<PathBuf>,

    /// Talk to the keypad over stdin/stdout instead of a device
    #[arg(long)]
    stdio: bool,

    /// Log notifications instead of showing them on the desktop
    #[arg(long)]
    log_notifications: bool,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Load and validate the configuration then exit.
    Check {
        /// Path to configuration file to check (defaults to ~/.macropad.ron)
        path: Option<PathBuf>,

        /// Dump the parsed configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    if let Some(Command::Check { path, dump }) = &cli.command {
        let explicit = path.as_deref().or(cli.config.as_deref());
        process::exit(check(explicit, *dump));
    }

    let rt = match Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            process::exit(1);
        }
    };
    let res = rt.block_on(run(cli));
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    if let Err(e) = res {
        error!(error = %e, "macropad_exit");
        eprintln!("{e}");
        process::exit(1);
    }
}

/// Validate the config at `explicit` (or the default path). Returns the exit code.
fn check(explicit: Option<&Path>, dump: bool) -> i32 {
    let cfg = match resolve_config_path(explicit).and_then(|p| load_from_path(&p)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e.pretty());
            return 1;
        }
    };
    if !dump {
        println!("OK ({} keys)", cfg.keys.len());
        return 0;
    }
    match serde_json::to_string_pretty(&cfg) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            1
        }
    }
}

/// Load the config, open the keypad, and drive it until Ctrl-C or disconnect.
async fn run(cli: Cli) -> Result<()> {
    let path = resolve_config_path(cli.config.as_deref())?;
    let cfg = load_from_path(&path)?;
    info!(path = %path.display(), keys = cfg.keys.len(), "config_loaded");

    let source = transport::select(cli.stdio, cli.port.as_deref(), cfg.port.as_deref())?;
    let (reader, writer) = transport::open(&source)?;

    let runner: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
    let notifier: Arc<dyn NotificationSink> = if cli.log_notifications {
        Arc::new(LogNotifier)
    } else {
        Arc::new(TerminalNotifier::new(runner.clone()))
    };
    let mut orch = Orchestrator::new(reader, writer, notifier);
    let ctx = ActionContext {
        messages: orch.messages(),
        runner,
        tracker: bindings::tracker(&cfg)?,
    };
    bindings::register(&mut orch, &cfg.keys, &ctx);

    let admin_stop = CancellationToken::new();
    if let Some(admin) = &cfg.admin {
        admin::spawn(admin.listen.clone(), cfg.keys.clone(), admin_stop.clone());
    }

    let stop = orch.shutdown_handle();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt_received");
                stop.shutdown();
            }
            Err(e) => warn!(error = %e, "ctrl_c_handler_failed"),
        }
    });

    let res = orch.run().await;
    admin_stop.cancel();
    orch.stop_actions().await;
    res?;
    Ok(())
}

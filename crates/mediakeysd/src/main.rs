//! Binary entrypoint for the mediakeys daemon and its control CLI.
use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use config::{Settings, load_from_path, load_or_default, resolve_config_path};
use mediakeys_protocol::{MediaKey, Msg};
use mediakeysd::{
    Error, Result, client,
    daemon::{self, DaemonOptions},
};
use tokio::runtime::Builder;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "mediakeysd", about = "Route macOS media keys to the right player", version)]
/// Command-line interface for the `mediakeysd` binary.
struct Cli {
    /// Subcommand; defaults to `run`.
    #[command(subcommand)]
    command: Option<Cmd>,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Optional path to the config file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Control socket path (overrides the config file)
    #[arg(long, value_name = "PATH", global = true)]
    socket: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Cmd {
    /// Run the daemon in the foreground.
    Run,
    /// Simulate a media key press (play, next or previous).
    Press {
        /// Key to press.
        key: MediaKey,
    },
    /// Show engine state.
    Status {
        /// Print the raw report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start capturing media keys.
    Enable,
    /// Stop capturing media keys; they reach the system again.
    Disable,
    /// Flip the capture switch.
    Toggle,
    /// Load and validate the configuration then exit.
    Check {
        /// Path to configuration file to check (defaults to ~/.mediakeys/config.ron)
        path: Option<PathBuf>,

        /// Dump the parsed configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_stderr(&cli.log.spec());
    if let Err(e) = dispatch(&cli) {
        let text = match &e {
            Error::Config(c) => c.pretty(),
            other => other.to_string(),
        };
        eprintln!("mediakeysd: {text}");
        process::exit(1);
    }
}

/// Run the selected subcommand.
fn dispatch(cli: &Cli) -> Result<()> {
    let config_path = resolve_config_path(cli.config.as_deref());
    match cli.command.as_ref().unwrap_or(&Cmd::Run) {
        Cmd::Run => {
            let settings = load_or_default(&config_path)?;
            let socket = cli.socket.clone().unwrap_or_else(|| settings.socket_path());
            daemon::run(DaemonOptions {
                settings,
                config_path,
                socket,
            })
        }
        Cmd::Check { path, dump } => {
            let path = path.clone().unwrap_or(config_path);
            let settings = load_from_path(&path)?;
            if *dump {
                println!("{}", serde_json::to_string_pretty(&settings).unwrap_or_default());
            } else {
                println!("{}: ok", path.display());
            }
            Ok(())
        }
        Cmd::Press { key } => remote(cli, &config_path, &Msg::Press { key: *key }, false),
        Cmd::Status { json } => remote(cli, &config_path, &Msg::Status, *json),
        Cmd::Enable => remote(cli, &config_path, &Msg::SetEnabled { enabled: true }, false),
        Cmd::Disable => remote(cli, &config_path, &Msg::SetEnabled { enabled: false }, false),
        Cmd::Toggle => remote(cli, &config_path, &Msg::Toggle, false),
    }
}

/// Socket to talk to: explicit flag, else the config file's, else the default.
fn socket_for(explicit: Option<&Path>, config_path: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    match load_or_default(config_path) {
        Ok(s) => s.socket_path(),
        Err(e) => {
            warn!(error = %e, "config_unreadable_using_default_socket");
            Settings::default().socket_path()
        }
    }
}

/// Send one request to the running daemon and print the reply.
fn remote(cli: &Cli, config_path: &Path, msg: &Msg, json: bool) -> Result<()> {
    let socket = socket_for(cli.socket.as_deref(), config_path);
    let runtime = Builder::new_current_thread().enable_all().build()?;
    match runtime.block_on(client::request(&socket, msg))? {
        Msg::StatusReport(report) if json => {
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            Ok(())
        }
        Msg::StatusReport(report) => {
            println!("{}", client::render_status(&report));
            Ok(())
        }
        Msg::Error { message } => Err(Error::Ipc(message)),
        other => Err(Error::Ipc(format!("unexpected reply: {other:?}"))),
    }
}

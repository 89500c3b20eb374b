//! Binary entrypoint for the native-messaging host.
//!
//! stdout belongs to the browser, so logs go to a file under the state
//! directory.
use std::{path::PathBuf, process};

use clap::Parser;
use native_host::{RECONNECT_DELAY, Relay};
use tokio::{io, runtime::Builder};
use tracing::error;

#[derive(Parser, Debug)]
#[command(
    name = "mediakeys-native-host",
    about = "Relay between the mediakeys extension and mediakeysd",
    version
)]
/// Command-line interface for the native host.
struct Cli {
    /// Control socket path (defaults to the configured one)
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Log file path
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Arguments added by the browser (the caller origin); ignored.
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    browser_args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| config::state_dir().join("native-host.log"));
    if let Err(e) = logging::init_file(&cli.log.spec(), &log_path) {
        eprintln!("mediakeys-native-host: cannot open log {}: {e}", log_path.display());
    }

    let socket = cli.socket.unwrap_or_else(|| {
        let path = config::resolve_config_path(None);
        config::load_or_default(&path)
            .unwrap_or_default()
            .socket_path()
    });
    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("mediakeys-native-host: {e}");
            process::exit(1);
        }
    };
    let relay = Relay::new(socket, io::stdin(), io::stdout(), RECONNECT_DELAY);
    if let Err(e) = runtime.block_on(relay.run()) {
        error!(error = %e, "relay_failed");
        eprintln!("mediakeys-native-host: {e}");
        process::exit(1);
    }
}

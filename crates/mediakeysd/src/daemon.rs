//! Daemon assembly: engine, sinks, tap, pollers and control socket.

use std::{path::PathBuf, sync::Arc};

use config::Settings;
use mediakeys_engine::{Engine, SystemFocus};
use tokio::{
    runtime::Builder,
    select,
    signal::{
        self,
        unix::{SignalKind, signal as unix_signal},
    },
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    Result,
    hosts::HostRegistry,
    osascript::{Osascript, ScriptRunner},
    poller::Poller,
    server::{ControlServer, Shared},
    sinks::build_sinks,
    tap::KeyRouter,
};

/// Everything `run` needs.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Loaded settings.
    pub settings: Settings,
    /// Where the enable switch is persisted.
    pub config_path: PathBuf,
    /// Control socket path.
    pub socket: PathBuf,
}

/// Report missing permissions with guidance. The tap needs Accessibility;
/// Input Monitoring is needed on some macOS versions.
fn preflight() {
    let status = permissions::check_permissions();
    if !status.accessibility_ok {
        warn!("accessibility_permission_missing");
        eprintln!(
            "mediakeysd: Accessibility permission is missing. Grant it in System Settings > \
             Privacy & Security > Accessibility, then restart mediakeysd."
        );
        permissions::request_accessibility();
    }
    if !status.input_ok {
        warn!("input_monitoring_permission_missing");
        eprintln!(
            "mediakeysd: Input Monitoring permission is missing. If media keys are not \
             captured, grant it in System Settings > Privacy & Security > Input Monitoring."
        );
    }
}

/// Run the daemon until SIGINT or SIGTERM.
pub fn run(opts: DaemonOptions) -> Result<()> {
    let DaemonOptions {
        settings,
        config_path,
        socket,
    } = opts;
    preflight();

    let runner: Arc<dyn ScriptRunner> = Arc::new(Osascript);
    let hosts = HostRegistry::new();
    let sinks = build_sinks(&settings, &runner, hosts.clone());
    let focus = Arc::new(SystemFocus::new(settings.focus.clone()));
    let engine = Engine::new(&settings.policy, settings.enabled, focus, sinks)?;
    info!(
        enabled = settings.enabled,
        config = %config_path.display(),
        "engine_started"
    );

    // Without a tap the daemon still serves observations and simulated
    // presses.
    let router = match KeyRouter::start(&engine) {
        Ok(r) => Some(r),
        Err(e) => {
            error!(error = %e, "media_key_tap_unavailable");
            eprintln!("mediakeysd: media keys will not be captured: {e}");
            None
        }
    };

    let runtime = Builder::new_multi_thread().enable_all().build()?;
    let poll_interval = settings.poll_interval();
    let poller = Arc::new(Poller::new(runner, settings.browsers.clone()));
    let shared = Arc::new(Shared::new(engine.clone(), hosts, settings, config_path));
    let cancel = CancellationToken::new();

    let result = runtime.block_on(async {
        let server = ControlServer::bind(&socket, shared)?;
        let polling = tokio::spawn(poller.run(engine.clone(), poll_interval, cancel.clone()));
        let signals = tokio::spawn(wait_for_shutdown(cancel.clone()));
        let served = server.run(cancel.clone()).await;
        cancel.cancel();
        polling.await.ok();
        signals.abort();
        served
    });

    drop(router);
    engine.sync();
    info!("daemon_stopped");
    result
}

/// Cancel `cancel` on SIGINT or SIGTERM.
async fn wait_for_shutdown(cancel: CancellationToken) {
    let mut term = match unix_signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "sigterm_handler_failed");
            signal::ctrl_c().await.ok();
            cancel.cancel();
            return;
        }
    };
    select! {
        _ = signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
    info!("shutdown_requested");
    cancel.cancel();
}

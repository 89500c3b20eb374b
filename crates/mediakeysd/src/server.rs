//! Control socket: a Unix listener speaking length-prefixed JSON [`Msg`]s.
//!
//! Every peer opens with [`Msg::Hello`]. Command line clients then send
//! requests and read one reply each; native-messaging hosts push observations
//! and command results and receive [`Msg::Action`] frames.

use std::{
    fs, future, io,
    os::unix::fs::{FileTypeExt as _, MetadataExt as _, PermissionsExt as _},
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::BytesMut;
use config::Settings;
use futures::{SinkExt as _, StreamExt as _};
use mediakeys_engine::Engine;
use mediakeys_protocol::{
    Msg, Role, StatusReport,
    codec::{decode, encode, frame_codec},
};
use parking_lot::Mutex;
use tokio::{
    net::{UnixListener, UnixStream},
    select,
    sync::mpsc::UnboundedReceiver,
};
use tokio_util::{
    codec::{Framed, LengthDelimitedCodec},
    sync::CancellationToken,
};
use tracing::{debug, info, trace, warn};

use crate::{Error, Result, hosts::HostRegistry};

/// A framed control connection.
type Conn = Framed<UnixStream, LengthDelimitedCodec>;

/// State shared by every connection.
pub struct Shared {
    /// Routing engine.
    engine: Engine,
    /// Connected native-messaging hosts.
    hosts: HostRegistry,
    /// Current settings; rewritten when the enable switch changes.
    settings: Mutex<Settings>,
    /// Where settings are persisted.
    config_path: PathBuf,
}

impl Shared {
    /// Bundle the daemon's shared state.
    pub fn new(
        engine: Engine,
        hosts: HostRegistry,
        settings: Settings,
        config_path: PathBuf,
    ) -> Self {
        Self {
            engine,
            hosts,
            settings: Mutex::new(settings),
            config_path,
        }
    }

    /// Engine status plus the connected host count.
    pub fn status(&self) -> StatusReport {
        let mut report = self.engine.status();
        report.hosts = self.hosts.count();
        report
    }

    /// Handle one request; `None` means no reply is sent.
    pub fn handle(&self, msg: Msg) -> Option<Msg> {
        match msg {
            Msg::Observation {
                source,
                available,
                playing,
            } => {
                self.engine.observe(source, available, playing);
                None
            }
            Msg::CommandResult {
                source,
                success,
                message,
            } => {
                self.engine.confirm(source, success, message.as_deref());
                None
            }
            Msg::Press { key } => {
                let r = self.engine.handle_key(key);
                debug!(%key, target = ?r.target, reason = %r.reason, "simulated_press");
                Some(Msg::StatusReport(self.status()))
            }
            Msg::SetEnabled { enabled } => Some(self.switch(|_| enabled)),
            Msg::Toggle => Some(self.switch(|on| !on)),
            Msg::Status => Some(Msg::StatusReport(self.status())),
            Msg::Hello { .. } => Some(error_reply("duplicate hello")),
            Msg::StatusReport(_) | Msg::Action { .. } | Msg::Error { .. } => {
                Some(error_reply("unexpected message"))
            }
        }
    }

    /// Set the enable switch to `f(current)` and persist it.
    fn switch(&self, f: impl FnOnce(bool) -> bool) -> Msg {
        {
            let mut settings = self.settings.lock();
            let on = f(self.engine.is_enabled());
            self.engine.set_enabled(on);
            if settings.enabled != on {
                settings.enabled = on;
                if let Err(e) = config::save_to_path(&settings, &self.config_path) {
                    warn!(error = %e, "enable_switch_not_persisted");
                    return error_reply(&e.to_string());
                }
            }
        }
        Msg::StatusReport(self.status())
    }
}

/// Build an error reply.
fn error_reply(message: &str) -> Msg {
    Msg::Error {
        message: message.to_string(),
    }
}

/// Control socket listener.
pub struct ControlServer {
    /// Socket path, unlinked on drop.
    path: PathBuf,
    /// Bound listener.
    listener: UnixListener,
    /// Shared daemon state.
    shared: Arc<Shared>,
}

impl ControlServer {
    /// Prepare the socket directory and bind. Must be called inside a tokio
    /// runtime.
    pub fn bind(path: &Path, shared: Arc<Shared>) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
            let mut perms = fs::metadata(parent)?.permissions();
            // 0o700: user-only access
            perms.set_mode(0o700);
            fs::set_permissions(parent, perms)?;
        }
        validate_or_unlink_existing_socket(path)?;
        let listener = UnixListener::bind(path).map_err(|e| {
            Error::Ipc(format!("Failed to bind to socket {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "control_socket_listening");
        Ok(Self {
            path: path.to_path_buf(),
            listener,
            shared,
        })
    }

    /// Accept connections until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        loop {
            select! {
                _ = cancel.cancelled() => {
                    debug!("control_socket_shutdown");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, _) = accepted?;
                    let shared = self.shared.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, &shared, &cancel).await {
                            debug!(error = %e, "connection_ended_with_error");
                        }
                    });
                }
            }
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        // Only unlink if it still points to a socket owned by us.
        validate_or_unlink_existing_socket(&self.path).ok();
    }
}

/// Read the hello frame, then serve the connection in the role it names.
async fn serve_connection(
    stream: UnixStream,
    shared: &Shared,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut conn = Framed::new(stream, frame_codec());
    let role = match conn.next().await {
        None => return Ok(()),
        Some(frame) => match decode::<Msg>(&frame?) {
            Ok(Msg::Hello { role }) => role,
            Ok(other) => {
                trace!(?other, "missing_hello");
                send(&mut conn, &error_reply("expected hello")).await?;
                return Ok(());
            }
            Err(e) => {
                send(&mut conn, &error_reply(&e.to_string())).await?;
                return Ok(());
            }
        },
    };
    debug!(?role, "peer_connected");
    match role {
        Role::Cli => serve(&mut conn, shared, None, cancel).await,
        Role::Host => {
            let (id, rx) = shared.hosts.register();
            let r = serve(&mut conn, shared, Some(rx), cancel).await;
            shared.hosts.unregister(id);
            r
        }
    }
}

/// Request/reply loop, interleaved with outbound frames for hosts.
async fn serve(
    conn: &mut Conn,
    shared: &Shared,
    mut outbound: Option<UnboundedReceiver<Msg>>,
    cancel: &CancellationToken,
) -> Result<()> {
    loop {
        select! {
            _ = cancel.cancelled() => return Ok(()),
            frame = conn.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                if let Some(reply) = handle_frame(shared, &frame?) {
                    send(conn, &reply).await?;
                }
            }
            Some(msg) = next_outbound(&mut outbound) => {
                send(conn, &msg).await?;
            }
        }
    }
}

/// Decode and handle one frame.
fn handle_frame(shared: &Shared, frame: &BytesMut) -> Option<Msg> {
    match decode::<Msg>(frame) {
        Ok(msg) => {
            trace!(?msg, "request");
            shared.handle(msg)
        }
        Err(e) => Some(error_reply(&e.to_string())),
    }
}

/// Next queued message, or never when the peer is not a host.
async fn next_outbound(rx: &mut Option<UnboundedReceiver<Msg>>) -> Option<Msg> {
    match rx {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}

/// Write one message.
async fn send(conn: &mut Conn, msg: &Msg) -> Result<()> {
    conn.send(encode(msg)?).await?;
    Ok(())
}

/// Validate that an existing path is a Unix domain socket owned by the current
/// user. If so, unlink it to make room for a new bind. If the path does not
/// exist, this is a no-op. If the path exists but is not a socket (or is not
/// owned by us), return an error and do not unlink.
fn validate_or_unlink_existing_socket(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Ipc(format!(
            "Failed to lstat existing path '{}': {}",
            path.display(),
            e
        ))),
        Ok(meta) => {
            let ft = meta.file_type();
            if !ft.is_socket() {
                return Err(Error::Ipc(format!(
                    "Refusing to remove non-socket at '{}': {:?}",
                    path.display(),
                    ft
                )));
            }
            // SAFETY: getuid has no preconditions and cannot fail.
            let uid = unsafe { libc::getuid() } as u32;
            if meta.uid() != uid {
                return Err(Error::Ipc(format!(
                    "Socket at '{}' not owned by current user (uid {} != {})",
                    path.display(),
                    meta.uid(),
                    uid
                )));
            }
            fs::remove_file(path).map_err(|e| {
                Error::Ipc(format!(
                    "Failed to remove pre-existing socket '{}': {}",
                    path.display(),
                    e
                ))
            })
        }
    }
}

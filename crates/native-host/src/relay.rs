//! Browser <-> daemon relay loop.

use std::{path::PathBuf, time::Duration};

use futures::{SinkExt as _, StreamExt as _};
use mediakeys_protocol::{
    ExtensionAction, ExtensionMsg, Msg, Role,
    codec::{decode, encode, frame_codec},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::UnixStream,
    pin, select, time,
};
use tokio_util::codec::{Framed, FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{debug, info, trace, warn};

use crate::Result;

/// Pause between attempts to reach the daemon.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Why a daemon session ended.
enum SessionEnd {
    /// The browser closed stdin; the host should exit.
    BrowserClosed,
    /// The daemon went away; reconnect.
    DaemonClosed,
}

/// Relays frames between the browser (`R`/`W`) and the daemon socket.
pub struct Relay<R, W> {
    /// Daemon control socket.
    socket: PathBuf,
    /// Frames from the extension.
    browser_in: FramedRead<R, LengthDelimitedCodec>,
    /// Frames to the extension.
    browser_out: FramedWrite<W, LengthDelimitedCodec>,
    /// Reconnect back-off.
    backoff: Duration,
}

impl<R, W> Relay<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Relay between `reader`/`writer` (the browser) and `socket`.
    pub fn new(socket: PathBuf, reader: R, writer: W, backoff: Duration) -> Self {
        Self {
            socket,
            browser_in: FramedRead::new(reader, frame_codec()),
            browser_out: FramedWrite::new(writer, frame_codec()),
            backoff,
        }
    }

    /// Relay until the browser closes stdin. Daemon outages are survived by
    /// reconnecting; browser I/O errors are fatal.
    pub async fn run(mut self) -> Result<()> {
        loop {
            match self.connect().await {
                Ok(conn) => {
                    info!(socket = %self.socket.display(), "daemon_connected");
                    match self.session(conn).await? {
                        SessionEnd::BrowserClosed => break,
                        SessionEnd::DaemonClosed => warn!("daemon_disconnected"),
                    }
                }
                Err(e) => debug!(error = %e, "daemon_unavailable"),
            }
            if !self.wait(self.backoff).await? {
                break;
            }
        }
        info!("browser_closed");
        Ok(())
    }

    /// Connect and introduce ourselves as a host.
    async fn connect(&self) -> Result<Framed<UnixStream, LengthDelimitedCodec>> {
        let stream = UnixStream::connect(&self.socket).await?;
        let mut conn = Framed::new(stream, frame_codec());
        conn.send(encode(&Msg::Hello { role: Role::Host })?).await?;
        Ok(conn)
    }

    /// Pump frames both ways until one side closes.
    async fn session(
        &mut self,
        conn: Framed<UnixStream, LengthDelimitedCodec>,
    ) -> Result<SessionEnd> {
        let (mut to_daemon, mut from_daemon) = conn.split();
        loop {
            select! {
                frame = self.browser_in.next() => {
                    let Some(frame) = frame else {
                        return Ok(SessionEnd::BrowserClosed);
                    };
                    let msg = match decode::<ExtensionMsg>(&frame?) {
                        Ok(m) => m.into_msg(),
                        Err(e) => {
                            warn!(error = %e, "unrecognized_extension_message");
                            continue;
                        }
                    };
                    trace!(?msg, "to_daemon");
                    if to_daemon.send(encode(&msg)?).await.is_err() {
                        return Ok(SessionEnd::DaemonClosed);
                    }
                }
                frame = from_daemon.next() => {
                    let Some(Ok(frame)) = frame else {
                        return Ok(SessionEnd::DaemonClosed);
                    };
                    match decode::<Msg>(&frame) {
                        Ok(Msg::Action { action }) => {
                            trace!(%action, "to_extension");
                            self.browser_out.send(encode(&ExtensionAction { action })?).await?;
                        }
                        Ok(other) => debug!(?other, "ignored_daemon_message"),
                        Err(e) => warn!(error = %e, "undecodable_daemon_message"),
                    }
                }
            }
        }
    }

    /// Sleep for `d` while draining the browser, whose messages have nowhere
    /// to go. Returns false if the browser closed.
    async fn wait(&mut self, d: Duration) -> Result<bool> {
        let sleep = time::sleep(d);
        pin!(sleep);
        loop {
            select! {
                _ = &mut sleep => return Ok(true),
                frame = self.browser_in.next() => match frame {
                    None => return Ok(false),
                    Some(frame) => {
                        frame?;
                        debug!("daemon_unavailable_message_dropped");
                    }
                },
            }
        }
    }
}

//! macOS system media key interception.
//!
//! A [`MediaKeyTap`] installs a CoreGraphics event tap on a dedicated thread,
//! decodes play/pause, next and previous from `NX_SYSDEFINED` events and
//! forwards each key press over a channel. While the shared enable flag is set
//! our keys are swallowed so the system default player never launches; when
//! it is cleared every event passes through untouched. Other system keys
//! (volume, brightness, backlight) are never touched.
//!
//! On platforms other than macOS, [`MediaKeyTap::start`] reports
//! [`Error::Unsupported`].

use std::{
    sync::{Arc, atomic::AtomicBool},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Sender, bounded};
use mediakeys_protocol::MediaKey;
use tracing::{debug, warn};

mod decode;
mod error;
mod policy;

#[cfg(target_os = "macos")]
mod sys;
#[cfg(not(target_os = "macos"))]
#[path = "unsupported.rs"]
mod sys;

pub use decode::{KeyEvent, NX_SYSDEFINED, RawKey, decode};
pub use error::{Error, Result};
pub use policy::{Decision, classify};

/// State the tap callback reads on every event.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
struct TapCtx {
    /// Capture switch shared with the owner.
    enabled: Arc<AtomicBool>,
    /// Destination for key presses.
    tx: Sender<MediaKey>,
}

/// Running media key tap. Dropping it stops the tap thread.
pub struct MediaKeyTap {
    /// Handle used to stop the tap run loop.
    ctrl: Arc<sys::SysControl>,
    /// Tap thread.
    thread: Option<JoinHandle<()>>,
}

impl MediaKeyTap {
    /// Start the tap and block until it is installed or has failed.
    ///
    /// `enabled` is read on every event, so flipping it takes effect on the
    /// next key without restarting the tap.
    pub fn start(enabled: Arc<AtomicBool>, tx: Sender<MediaKey>) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let ctrl = Arc::new(sys::SysControl::new());
        let ctx = TapCtx { enabled, tx };
        let ctrl_thread = ctrl.clone();
        let thread = thread::Builder::new()
            .name("mediakey-tap".into())
            .spawn(move || {
                if let Err(e) = sys::run_event_loop(ctx, &ready_tx, &ctrl_thread) {
                    warn!(error = %e, "media_key_tap_failed");
                }
            })
            .map_err(|e| Error::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                debug!("media_key_tap_ready");
                Ok(Self {
                    ctrl,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                thread.join().ok();
                Err(e)
            }
            Err(_) => {
                thread.join().ok();
                Err(Error::Thread("tap thread exited before reporting".into()))
            }
        }
    }

    /// Stop the tap and wait for its thread.
    pub fn stop(&mut self) {
        self.ctrl.stop();
        if let Some(t) = self.thread.take() {
            t.join().ok();
        }
    }
}

impl Drop for MediaKeyTap {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(all(test, not(target_os = "macos")))]
mod tests {
    use super::*;

    #[test]
    fn start_reports_unsupported() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let err = MediaKeyTap::start(Arc::new(AtomicBool::new(true)), tx)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Unsupported));
    }
}

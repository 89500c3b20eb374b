//! Wiring between the OS media key tap and the engine.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, unbounded};
use mac_mediakey::MediaKeyTap;
use mediakeys_engine::Engine;
use mediakeys_protocol::MediaKey;
use tracing::{debug, trace};

use crate::Result;

/// Running tap plus the thread that feeds its keys to the engine.
pub struct KeyRouter {
    /// The OS tap; shares the engine's enable switch.
    tap: MediaKeyTap,
    /// Router thread; exits once the tap drops its sender.
    thread: Option<JoinHandle<()>>,
}

impl KeyRouter {
    /// Install the tap and start routing keys into `engine`.
    pub fn start(engine: &Engine) -> Result<Self> {
        let (tx, rx) = unbounded();
        let tap = MediaKeyTap::start(engine.enabled_flag(), tx)?;
        let engine = engine.clone();
        let thread = thread::Builder::new()
            .name("mediakey-router".into())
            .spawn(move || route(&rx, &engine))?;
        Ok(Self {
            tap,
            thread: Some(thread),
        })
    }
}

impl Drop for KeyRouter {
    fn drop(&mut self) {
        self.tap.stop();
        if let Some(t) = self.thread.take() {
            t.join().ok();
        }
    }
}

/// Feed keys to the engine until the channel closes.
fn route(rx: &Receiver<MediaKey>, engine: &Engine) {
    debug!("key_router_started");
    for key in rx {
        let r = engine.handle_key(key);
        trace!(%key, target = ?r.target, "key_routed");
    }
    debug!("key_router_stopped");
}

//! Stand-in used on platforms without CoreGraphics event taps.

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::{Error, Result, TapCtx};

/// No-op control handle.
pub struct SysControl;

impl SysControl {
    /// Empty handle.
    pub fn new() -> Self {
        Self
    }

    /// Nothing to stop.
    pub fn stop(&self) {}
}

/// Always reports [`Error::Unsupported`].
pub fn run_event_loop(
    _ctx: TapCtx,
    ready: &Sender<Result<()>>,
    _ctrl: &Arc<SysControl>,
) -> Result<()> {
    ready.send(Err(Error::Unsupported)).ok();
    Err(Error::Unsupported)
}

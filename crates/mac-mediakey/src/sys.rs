//! macOS event tap (CoreGraphics) integration for media key interception.
//!
//! Media keys arrive as `NX_SYSDEFINED` events, a type the `core-graphics`
//! `CGEventType` enum does not model, so the tap is created through the raw
//! `CGEventTapCreate` entry point with an explicit mask. Returning NULL from
//! the callback suppresses delivery; returning the event passes it on.

use std::{
    ffi::c_void,
    ptr,
    sync::{
        Arc,
        atomic::{AtomicPtr, Ordering},
    },
};

use core_foundation::{
    base::TCFType,
    mach_port::{CFMachPort, CFMachPortRef},
    runloop::{CFRunLoop, kCFRunLoopCommonModes},
};
use crossbeam_channel::Sender;
use objc2::{
    ClassType,
    encode::{Encoding, RefEncode},
    msg_send,
    rc::{Retained, autoreleasepool},
    runtime::AnyObject,
};
use objc2_app_kit::NSEvent;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{Error, Result, TapCtx, decode, policy};

/// Opaque `CGEvent` as seen through the C API.
#[repr(C)]
pub struct CGEvent {
    /// Zero-sized marker.
    _private: [u8; 0],
}

// SAFETY: matches the Objective-C type encoding of `CGEventRef`.
unsafe impl RefEncode for CGEvent {
    const ENCODING_REF: Encoding = Encoding::Pointer(&Encoding::Struct("__CGEvent", &[]));
}

/// Raw `CGEventRef`.
type CGEventRef = *mut CGEvent;

/// Event tap callback signature.
type TapCallback = unsafe extern "C" fn(
    proxy: *mut c_void,
    etype: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef;

#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGEventTapCreate(
        tap: u32,
        place: u32,
        options: u32,
        events_of_interest: u64,
        callback: TapCallback,
        user_info: *mut c_void,
    ) -> CFMachPortRef;
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

/// `kCGSessionEventTap`.
const SESSION_EVENT_TAP: u32 = 1;
/// `kCGHeadInsertEventTap`.
const HEAD_INSERT_EVENT_TAP: u32 = 0;
/// `kCGEventTapOptionDefault` (active tap, may swallow events).
const TAP_OPTION_DEFAULT: u32 = 0;
/// `kCGEventTapDisabledByTimeout`.
const TAP_DISABLED_BY_TIMEOUT: u32 = 0xFFFF_FFFE;
/// `kCGEventTapDisabledByUserInput`.
const TAP_DISABLED_BY_USER_INPUT: u32 = 0xFFFF_FFFF;

/// Shared control handle to stop the run loop from other threads.
pub struct SysControl {
    /// Run loop of the tap thread, once it is running.
    rl: Mutex<Option<CFRunLoop>>,
}

impl SysControl {
    /// Empty handle; the tap thread fills in its run loop.
    pub fn new() -> Self {
        Self {
            rl: Mutex::new(None),
        }
    }

    /// Record the tap thread's run loop.
    fn set_rl(&self, rl: CFRunLoop) {
        *self.rl.lock() = Some(rl);
    }

    /// Stop the tap run loop if it is running.
    pub fn stop(&self) {
        if let Some(rl) = self.rl.lock().take() {
            rl.stop();
        }
    }
}

/// State reachable from the C callback.
struct CallbackState {
    /// Shared switch and output channel.
    ctx: TapCtx,
    /// Tap port, for re-enabling after the OS disables it.
    port: AtomicPtr<c_void>,
}

/// Read `(subtype, data1)` from a system-defined event via `NSEvent`.
fn read_sysdefined(event: CGEventRef) -> Option<(i16, i64)> {
    autoreleasepool(|_| {
        // SAFETY: `event` is the live event handed to the tap callback and
        // `eventWithCGEvent:` copies what it needs.
        let ns: Option<Retained<AnyObject>> =
            unsafe { msg_send![NSEvent::class(), eventWithCGEvent: event] };
        let ns = ns?;
        // SAFETY: only NX_SYSDEFINED events reach here, for which `subtype`
        // and `data1` are valid selectors.
        let subtype: i16 = unsafe { msg_send![&*ns, subtype] };
        let data1: isize = unsafe { msg_send![&*ns, data1] };
        Some((subtype, data1 as i64))
    })
}

/// C entry point for the tap.
unsafe extern "C" fn tap_callback(
    _proxy: *mut c_void,
    etype: u32,
    event: CGEventRef,
    user_info: *mut c_void,
) -> CGEventRef {
    if user_info.is_null() {
        return event;
    }
    // SAFETY: `user_info` points at the `CallbackState` owned by
    // `run_event_loop`, which outlives the tap.
    let state = unsafe { &*(user_info as *const CallbackState) };
    match etype {
        TAP_DISABLED_BY_TIMEOUT | TAP_DISABLED_BY_USER_INPUT => {
            let p = state.port.load(Ordering::SeqCst) as CFMachPortRef;
            if !p.is_null() {
                warn!(etype, "tap_disabled_by_os_reenabling");
                // SAFETY: `p` is the port created for this tap.
                unsafe { CGEventTapEnable(p, true) };
            }
            event
        }
        decode::NX_SYSDEFINED => {
            let Some((subtype, data1)) = read_sysdefined(event) else {
                return event;
            };
            let decoded = decode::decode(subtype, data1);
            let enabled = state.ctx.enabled.load(Ordering::SeqCst);
            let d = policy::classify(enabled, decoded);
            trace!(subtype, data1, ?decoded, enabled, ?d, "tap_event");
            if d.emit
                && let Some(ev) = decoded
                && state.ctx.tx.send(ev.key).is_err()
            {
                warn!("media_key_receiver_gone");
            }
            if d.intercept { ptr::null_mut() } else { event }
        }
        _ => event,
    }
}

/// Create the tap, attach it to this thread's run loop and run until
/// [`SysControl::stop`] is called.
pub fn run_event_loop(
    ctx: TapCtx,
    ready: &Sender<Result<()>>,
    ctrl: &Arc<SysControl>,
) -> Result<()> {
    if !permissions::accessibility_ok() {
        warn!("accessibility_permission_missing");
        ready.send(Err(Error::PermissionDenied("Accessibility"))).ok();
        return Err(Error::PermissionDenied("Accessibility"));
    }

    let state = Box::new(CallbackState {
        ctx,
        port: AtomicPtr::new(ptr::null_mut()),
    });
    let user_info = (&*state as *const CallbackState).cast_mut().cast::<c_void>();

    debug!("creating_event_tap");
    // SAFETY: the callback and `user_info` stay valid until the tap is
    // disabled below, after the run loop exits.
    let raw = unsafe {
        CGEventTapCreate(
            SESSION_EVENT_TAP,
            HEAD_INSERT_EVENT_TAP,
            TAP_OPTION_DEFAULT,
            1u64 << decode::NX_SYSDEFINED,
            tap_callback,
            user_info,
        )
    };
    if raw.is_null() {
        warn!("event_tap_create_failed");
        ready.send(Err(Error::EventTapStart)).ok();
        return Err(Error::EventTapStart);
    }
    // SAFETY: `CGEventTapCreate` follows the create rule.
    let port = unsafe { CFMachPort::wrap_under_create_rule(raw) };
    state
        .port
        .store(port.as_concrete_TypeRef() as *mut c_void, Ordering::SeqCst);

    let Ok(source) = port.create_runloop_source(0) else {
        warn!("run_loop_source_create_failed");
        ready.send(Err(Error::EventTapStart)).ok();
        return Err(Error::EventTapStart);
    };

    let rl = CFRunLoop::get_current();
    ctrl.set_rl(rl.clone());
    // SAFETY: reading an immutable framework constant.
    let mode = unsafe { kCFRunLoopCommonModes };
    rl.add_source(&source, mode);
    // SAFETY: `port` is a valid event tap port.
    unsafe { CGEventTapEnable(port.as_concrete_TypeRef(), true) };

    ready.send(Ok(())).ok();
    debug!("event_tap_started_run_loop");

    CFRunLoop::run_current();

    // SAFETY: as above; disabling before `state` drops keeps the callback
    // from observing a dangling pointer.
    unsafe { CGEventTapEnable(port.as_concrete_TypeRef(), false) };
    state.port.store(ptr::null_mut(), Ordering::SeqCst);
    drop(state);
    debug!("event_tap_exited");
    Ok(())
}

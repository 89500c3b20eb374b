use objc2::rc::autoreleasepool;
use objc2_app_kit::{NSRunningApplication, NSWorkspace};
use objc2_foundation::NSString;
use tracing::trace;

use crate::{Error, FrontApp};

pub(crate) fn frontmost_app() -> Result<FrontApp, Error> {
    autoreleasepool(|_| {
        // SAFETY: NSWorkspace queries are documented as thread-safe.
        let ws = unsafe { NSWorkspace::sharedWorkspace() };
        let app = unsafe { ws.frontmostApplication() }.ok_or(Error::NoFrontmostApp)?;
        let front = describe(&app);
        trace!(bundle_id = ?front.bundle_id, pid = front.pid, "frontmost_app");
        Ok(front)
    })
}

pub(crate) fn is_running(bundle_id: &str) -> bool {
    autoreleasepool(|_| {
        let bid = NSString::from_str(bundle_id);
        let apps = unsafe { NSRunningApplication::runningApplicationsWithBundleIdentifier(&bid) };
        apps.count() > 0
    })
}

fn describe(app: &NSRunningApplication) -> FrontApp {
    unsafe {
        FrontApp {
            bundle_id: app.bundleIdentifier().map(|s| s.to_string()),
            name: app.localizedName().map(|s| s.to_string()),
            pid: app.processIdentifier(),
        }
    }
}

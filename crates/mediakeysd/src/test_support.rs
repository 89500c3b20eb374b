//! Canned AppleScript replies for sink and poller tests.

use parking_lot::Mutex;

use crate::osascript::ScriptRunner;

/// Runner that answers from a rule table and records every script.
pub struct ScriptedRunner {
    /// `(needle, reply)`: the first needle contained in the script wins.
    rules: Vec<(String, Result<String, String>)>,
    /// Reply when no rule matches.
    default: Result<String, String>,
    /// Scripts run so far.
    log: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    /// Runner replying `default` to everything.
    pub fn new(default: Result<&str, &str>) -> Self {
        Self {
            rules: Vec::new(),
            default: owned(default),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Reply `reply` to scripts containing `needle`.
    #[must_use]
    pub fn on(mut self, needle: &str, reply: Result<&str, &str>) -> Self {
        self.rules.push((needle.to_string(), owned(reply)));
        self
    }

    /// Scripts run so far.
    pub fn scripts(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

/// Own both sides of a reply.
fn owned(r: Result<&str, &str>) -> Result<String, String> {
    r.map(str::to_string).map_err(str::to_string)
}

impl ScriptRunner for ScriptedRunner {
    fn run(&self, script: &str) -> Result<String, String> {
        self.log.lock().push(script.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map_or_else(|| self.default.clone(), |(_, reply)| reply.clone())
    }
}

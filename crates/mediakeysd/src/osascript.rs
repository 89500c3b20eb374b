//! Running AppleScript through `osascript`.

use std::process::Command;

use tracing::trace;

/// Executes AppleScript source and returns its trimmed textual result.
///
/// Sinks and pollers take a runner so tests can substitute canned replies.
pub trait ScriptRunner: Send + Sync {
    /// Run `script`; `Err` carries the interpreter's error text.
    fn run(&self, script: &str) -> Result<String, String>;
}

/// Runner backed by `/usr/bin/osascript`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Osascript;

impl ScriptRunner for Osascript {
    fn run(&self, script: &str) -> Result<String, String> {
        trace!(len = script.len(), "osascript_run");
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|e| format!("failed to spawn osascript: {e}"))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(format!(
                "AppleScript failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        }
    }
}

/// Quote `text` as an AppleScript string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_quotes_and_backslashes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(quote(r"a\b"), r#""a\\b""#);
    }
}

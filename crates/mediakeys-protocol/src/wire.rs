//! Message types for the control socket and the browser extension.

use serde::{Deserialize, Serialize};

use crate::{Command, MediaKey, Source};

/// Who is on the other end of a control socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A native-messaging host relaying for the browser extension. Hosts
    /// receive [`Msg::Action`] frames.
    Host,
    /// A one-shot command line client.
    Cli,
}

/// Messages exchanged over the daemon's control socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Msg {
    /// First frame sent by every peer.
    Hello {
        /// The connecting peer's role.
        role: Role,
    },
    /// Availability/playing push for one source.
    Observation {
        /// Observed source.
        source: Source,
        /// At least one controllable instance exists.
        available: bool,
        /// The source is producing audio right now.
        playing: bool,
    },
    /// Out-of-band result of a command delivered by the extension.
    CommandResult {
        /// Source the command was delivered to.
        source: Source,
        /// Whether the content script found its controls.
        success: bool,
        /// Free-form detail from the extension.
        #[serde(default)]
        message: Option<String>,
    },
    /// Simulate a media key press through the full engine path.
    Press {
        /// The simulated key.
        key: MediaKey,
    },
    /// Set and persist the enable switch.
    SetEnabled {
        /// New state.
        enabled: bool,
    },
    /// Flip and persist the enable switch.
    Toggle,
    /// Request a [`Msg::StatusReport`].
    Status,
    /// Current engine state.
    StatusReport(StatusReport),
    /// Daemon to host: forward an action to the extension.
    Action {
        /// Command to perform in the active media tab.
        action: Command,
    },
    /// Generic failure reply.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// Per-source line of a [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    /// The source.
    pub source: Source,
    /// Fresh-or-false availability.
    pub available: bool,
    /// Fresh-or-false playing state.
    pub playing: bool,
    /// Age of the last observation, if any was ever received.
    pub age_ms: Option<u64>,
}

/// Snapshot of engine state for the `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Whether media keys are captured.
    pub enabled: bool,
    /// One entry per source, in declaration order.
    pub sources: Vec<SourceStatus>,
    /// Most recent dispatch target.
    pub last_target: Option<Source>,
    /// Time since the most recent dispatch.
    pub last_dispatch_ms_ago: Option<u64>,
    /// Time since the most recent confirmed success.
    pub last_success_ms_ago: Option<u64>,
    /// Number of native-messaging hosts currently connected.
    pub hosts: usize,
}

/// Tag carried by the extension's periodic tab state message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TabStateTag {
    /// `"type": "tabState"`
    #[serde(rename = "tabState")]
    TabState,
}

/// Messages the browser extension sends to its native host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExtensionMsg {
    /// Periodic summary of the media tabs the extension can see.
    TabState {
        /// Always `tabState`.
        #[serde(rename = "type")]
        tag: TabStateTag,
        /// At least one matching tab exists.
        #[serde(rename = "hasTabs")]
        has_tabs: bool,
        /// Any matching tab is playing.
        #[serde(rename = "isPlaying", default)]
        is_playing: bool,
        /// Which site the state describes; older extensions omit it.
        #[serde(default, alias = "activeTabService")]
        service: Option<Source>,
    },
    /// Response to a forwarded action.
    Response {
        /// Whether the content script performed the action.
        success: bool,
        /// Free-form detail.
        #[serde(default)]
        message: Option<String>,
        /// Which site responded; older extensions omit it.
        #[serde(default)]
        service: Option<Source>,
    },
}

impl ExtensionMsg {
    /// Source assumed when the extension does not say which site it means.
    pub const DEFAULT_SOURCE: Source = Source::Bandcamp;

    /// Translate into the control socket message the daemon understands.
    pub fn into_msg(self) -> Msg {
        match self {
            Self::TabState {
                has_tabs,
                is_playing,
                service,
                ..
            } => Msg::Observation {
                source: service.unwrap_or(Self::DEFAULT_SOURCE),
                available: has_tabs,
                playing: has_tabs && is_playing,
            },
            Self::Response {
                success,
                message,
                service,
            } => Msg::CommandResult {
                source: service.unwrap_or(Self::DEFAULT_SOURCE),
                success,
                message,
            },
        }
    }
}

/// Message the native host writes to the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionAction {
    /// Action for the content script.
    pub action: Command,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tab_state_becomes_observation() {
        let m: ExtensionMsg =
            serde_json::from_value(json!({"type": "tabState", "hasTabs": true, "isPlaying": true}))
                .unwrap();
        assert_eq!(
            m.into_msg(),
            Msg::Observation {
                source: Source::Bandcamp,
                available: true,
                playing: true
            }
        );
    }

    #[test]
    fn tab_state_with_service() {
        let m: ExtensionMsg = serde_json::from_value(json!({
            "type": "tabState",
            "hasTabs": true,
            "isPlaying": false,
            "activeTabService": "youtube"
        }))
        .unwrap();
        assert!(matches!(
            m.into_msg(),
            Msg::Observation {
                source: Source::YouTube,
                available: true,
                playing: false
            }
        ));
    }

    #[test]
    fn playing_without_tabs_is_not_playing() {
        let m: ExtensionMsg =
            serde_json::from_value(json!({"type": "tabState", "hasTabs": false, "isPlaying": true}))
                .unwrap();
        assert!(matches!(m.into_msg(), Msg::Observation { playing: false, .. }));
    }

    #[test]
    fn legacy_response_becomes_command_result() {
        let m: ExtensionMsg =
            serde_json::from_value(json!({"success": false, "message": "No media tab open"}))
                .unwrap();
        assert_eq!(
            m.into_msg(),
            Msg::CommandResult {
                source: Source::Bandcamp,
                success: false,
                message: Some("No media tab open".into())
            }
        );
    }

    #[test]
    fn control_messages_are_type_tagged() {
        let v = serde_json::to_value(Msg::Press {
            key: MediaKey::Next,
        })
        .unwrap();
        assert_eq!(v, json!({"type": "press", "key": "next"}));

        let v = serde_json::to_value(Msg::Action {
            action: Command::TogglePlayPause,
        })
        .unwrap();
        assert_eq!(v, json!({"type": "action", "action": "playPause"}));

        let back: Msg = serde_json::from_value(json!({"type": "toggle"})).unwrap();
        assert_eq!(back, Msg::Toggle);
    }

    #[test]
    fn status_report_is_flattened_under_tag() {
        let report = StatusReport {
            enabled: true,
            sources: vec![SourceStatus {
                source: Source::Spotify,
                available: true,
                playing: false,
                age_ms: Some(12),
            }],
            last_target: Some(Source::Spotify),
            last_dispatch_ms_ago: None,
            last_success_ms_ago: None,
            hosts: 0,
        };
        let v = serde_json::to_value(Msg::StatusReport(report.clone())).unwrap();
        assert_eq!(v["type"], "statusReport");
        assert_eq!(v["enabled"], true);
        let back: Msg = serde_json::from_value(v).unwrap();
        assert_eq!(back, Msg::StatusReport(report));
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A controllable media target.
///
/// The set is closed: every source has exactly one record in the observation
/// store and a fixed slot given by [`Source::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// A bandcamp.com tab in a browser.
    Bandcamp,
    /// A youtube.com/watch tab in a browser.
    YouTube,
    /// The native Spotify application.
    Spotify,
}

/// Which kind of frontmost application owns a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFamily {
    /// Hosted in a web browser tab.
    Browser,
    /// A native desktop application.
    Native,
}

impl Source {
    /// Number of sources.
    pub const COUNT: usize = 3;

    /// All sources in declaration order.
    pub const ALL: [Self; Self::COUNT] = [Self::Bandcamp, Self::YouTube, Self::Spotify];

    /// Stable slot for per-source storage.
    pub const fn index(self) -> usize {
        match self {
            Self::Bandcamp => 0,
            Self::YouTube => 1,
            Self::Spotify => 2,
        }
    }

    /// The application family that hosts this source.
    pub const fn family(self) -> SourceFamily {
        match self {
            Self::Bandcamp | Self::YouTube => SourceFamily::Browser,
            Self::Spotify => SourceFamily::Native,
        }
    }

    /// Lowercase identifier, matching the serde representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bandcamp => "bandcamp",
            Self::YouTube => "youtube",
            Self::Spotify => "spotify",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`Source`] or [`MediaKey`] from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseError {
    /// What was being parsed.
    kind: &'static str,
    /// The rejected input.
    value: String,
}

impl FromStr for Source {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bandcamp" => Ok(Self::Bandcamp),
            "youtube" => Ok(Self::YouTube),
            "spotify" => Ok(Self::Spotify),
            _ => Err(ParseError {
                kind: "source",
                value: s.to_string(),
            }),
        }
    }
}

/// A physical media key, as classified by the key event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKey {
    /// Play/pause (F8).
    PlayPause,
    /// Next track or fast-forward (F9).
    Next,
    /// Previous track or rewind (F7).
    Previous,
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PlayPause => "play_pause",
            Self::Next => "next",
            Self::Previous => "previous",
        })
    }
}

impl FromStr for MediaKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" | "pause" | "playpause" | "play_pause" | "play-pause" => Ok(Self::PlayPause),
            "next" | "fast" => Ok(Self::Next),
            "previous" | "prev" | "rewind" => Ok(Self::Previous),
            _ => Err(ParseError {
                kind: "media key",
                value: s.to_string(),
            }),
        }
    }
}

/// Abstract transport command delivered to a source's sink.
///
/// The serde names are the action strings understood by the browser
/// extension's content script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Toggle between playing and paused.
    #[serde(rename = "playPause")]
    TogglePlayPause,
    /// Skip to the next track.
    #[serde(rename = "next")]
    SkipForward,
    /// Skip to the previous track (or restart the current one).
    #[serde(rename = "previous")]
    SkipBackward,
}

impl Command {
    /// The extension-facing action name.
    pub const fn action(self) -> &'static str {
        match self {
            Self::TogglePlayPause => "playPause",
            Self::SkipForward => "next",
            Self::SkipBackward => "previous",
        }
    }
}

impl From<MediaKey> for Command {
    fn from(key: MediaKey) -> Self {
        match key {
            MediaKey::PlayPause => Self::TogglePlayPause,
            MediaKey::Next => Self::SkipForward,
            MediaKey::Previous => Self::SkipBackward,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_declaration_order() {
        for (i, s) in Source::ALL.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn families() {
        assert_eq!(Source::Bandcamp.family(), SourceFamily::Browser);
        assert_eq!(Source::YouTube.family(), SourceFamily::Browser);
        assert_eq!(Source::Spotify.family(), SourceFamily::Native);
    }

    #[test]
    fn parse_keys_and_sources() {
        assert_eq!("play".parse::<MediaKey>().unwrap(), MediaKey::PlayPause);
        assert_eq!("Prev".parse::<MediaKey>().unwrap(), MediaKey::Previous);
        assert_eq!("fast".parse::<MediaKey>().unwrap(), MediaKey::Next);
        assert!("volume".parse::<MediaKey>().is_err());
        assert_eq!("YouTube".parse::<Source>().unwrap(), Source::YouTube);
        assert!("tidal".parse::<Source>().is_err());
    }

    #[test]
    fn command_serializes_as_extension_action() {
        assert_eq!(
            serde_json::to_string(&Command::TogglePlayPause).unwrap(),
            "\"playPause\""
        );
        assert_eq!(Command::from(MediaKey::Next), Command::SkipForward);
        assert_eq!(Command::from(MediaKey::Previous).action(), "previous");
    }

    #[test]
    fn source_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Source::YouTube).unwrap(), "\"youtube\"");
        let s: Source = serde_json::from_str("\"spotify\"").unwrap();
        assert_eq!(s, Source::Spotify);
    }
}

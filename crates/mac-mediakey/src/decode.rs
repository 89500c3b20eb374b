//! Decoding of `NX_SYSDEFINED` auxiliary control button payloads.
//!
//! A system-defined event carries its key in `data1`:
//! bits 16..32 hold the `NX_KEYTYPE_*` code, bits 8..16 the key state
//! (`0x0A` down, `0x0B` up) and bit 0 the auto-repeat flag.

use mediakeys_protocol::MediaKey;

/// Event type number of `NX_SYSDEFINED`.
pub const NX_SYSDEFINED: u32 = 14;

/// Subtypes that carry auxiliary control buttons.
const AUX_SUBTYPES: [i16; 2] = [7, 8];

/// `NX_KEYTYPE_PLAY`.
const KEYTYPE_PLAY: u32 = 16;
/// `NX_KEYTYPE_FAST`.
const KEYTYPE_FAST: u32 = 17;
/// `NX_KEYTYPE_REWIND`.
const KEYTYPE_REWIND: u32 = 18;
/// `NX_KEYTYPE_NEXT`.
const KEYTYPE_NEXT: u32 = 19;
/// `NX_KEYTYPE_PREVIOUS`.
const KEYTYPE_PREVIOUS: u32 = 20;

/// Key state value for a press.
const STATE_DOWN: u32 = 0x0A;

/// A decoded system-defined key event, whether or not it is one of ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKey {
    /// `NX_KEYTYPE_*` code.
    pub code: u32,
    /// True on key down.
    pub pressed: bool,
    /// True for OS auto-repeat.
    pub repeat: bool,
}

impl RawKey {
    /// Split a `data1` payload into its parts.
    pub fn from_data1(data1: i64) -> Self {
        let data1 = data1 as u64;
        let code = ((data1 & 0xFFFF_0000) >> 16) as u32;
        let flags = (data1 & 0x0000_FFFF) as u32;
        let state = (flags & 0xFF00) >> 8;
        Self {
            code,
            pressed: state == STATE_DOWN,
            repeat: flags & 0x1 != 0,
        }
    }

    /// Media key for this code, if it is one we handle.
    pub fn media_key(&self) -> Option<MediaKey> {
        match self.code {
            KEYTYPE_PLAY => Some(MediaKey::PlayPause),
            KEYTYPE_NEXT | KEYTYPE_FAST => Some(MediaKey::Next),
            KEYTYPE_PREVIOUS | KEYTYPE_REWIND => Some(MediaKey::Previous),
            _ => None,
        }
    }
}

/// A media key transition the tap cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Logical key.
    pub key: MediaKey,
    /// True on key down.
    pub pressed: bool,
    /// True for OS auto-repeat.
    pub repeat: bool,
}

/// Decode a system-defined event. Returns `None` for subtypes other than
/// auxiliary control buttons and for keys we do not redirect (brightness,
/// volume, keyboard backlight and so on).
pub fn decode(subtype: i16, data1: i64) -> Option<KeyEvent> {
    if !AUX_SUBTYPES.contains(&subtype) {
        return None;
    }
    let raw = RawKey::from_data1(data1);
    raw.media_key().map(|key| KeyEvent {
        key,
        pressed: raw.pressed,
        repeat: raw.repeat,
    })
}

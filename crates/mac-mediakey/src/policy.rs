use crate::decode::KeyEvent;

/// What the tap does with one system-defined event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Forward the key to the engine.
    pub emit: bool,
    /// Swallow the event so no other application sees it.
    pub intercept: bool,
}

impl Decision {
    /// Leave the event alone.
    const PASS: Self = Self {
        emit: false,
        intercept: false,
    };
}

/// Classify how the tap should handle a decoded event.
///
/// - Keys we do not redirect always pass through.
/// - While disabled, our keys pass through too.
/// - A key down, including OS auto-repeat, is emitted and swallowed.
/// - Key up is swallowed without emitting, so the system default player
///   never sees half of a press.
pub fn classify(enabled: bool, event: Option<KeyEvent>) -> Decision {
    let Some(ev) = event else {
        return Decision::PASS;
    };
    if !enabled {
        return Decision::PASS;
    }
    Decision {
        emit: ev.pressed,
        intercept: true,
    }
}

#[cfg(test)]
mod tests {
    use mediakeys_protocol::MediaKey;

    use super::*;

    const DOWN: KeyEvent = KeyEvent {
        key: MediaKey::PlayPause,
        pressed: true,
        repeat: false,
    };
    const UP: KeyEvent = KeyEvent {
        key: MediaKey::PlayPause,
        pressed: false,
        repeat: false,
    };
    const REPEAT: KeyEvent = KeyEvent {
        key: MediaKey::Next,
        pressed: true,
        repeat: true,
    };

    #[test]
    fn foreign_keys_pass_through() {
        assert_eq!(classify(true, None), Decision::PASS);
        assert_eq!(classify(false, None), Decision::PASS);
    }

    #[test]
    fn disabled_passes_our_keys_through() {
        assert_eq!(classify(false, Some(DOWN)), Decision::PASS);
        assert_eq!(classify(false, Some(UP)), Decision::PASS);
    }

    #[test]
    fn down_and_repeat_are_emitted_and_swallowed() {
        for ev in [DOWN, REPEAT] {
            let d = classify(true, Some(ev));
            assert!(d.emit);
            assert!(d.intercept);
        }
    }

    #[test]
    fn up_is_swallowed_silently() {
        let d = classify(true, Some(UP));
        assert!(!d.emit);
        assert!(d.intercept);
    }
}

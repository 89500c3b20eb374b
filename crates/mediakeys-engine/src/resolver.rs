//! Target resolution.
//!
//! [`Resolver::resolve`] is a pure function of its inputs. Rules are tried in
//! priority order and the first that yields a source wins:
//!
//! 1. Exactly one source playing: that source.
//! 2. Several playing: narrow to those owned by the frontmost application
//!    when any are, then prefer the last target, then the tie-break order.
//! 3. Nothing playing: the available sources owned by the frontmost
//!    application, preferring the last target, then the tie-break order.
//! 4. Nothing playing: the last target if it is available.
//! 5. The fallback source if it is available.
//! 6. No target.

use std::fmt;

use config::Policy;
use mediakeys_protocol::{MediaKey, Source};

use crate::{DispatchHistory, FocusSignal, Snapshot};

/// Why a target was (or was not) chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The only playing source.
    Exclusive,
    /// Several playing; the frontmost application owns the target.
    ContentionFocus,
    /// Several playing; the target was the last one dispatched to.
    ContentionRecent,
    /// Several playing; the tie-break order decided.
    ContentionTieBreak,
    /// Nothing playing; the frontmost application owns the target.
    Focus,
    /// Nothing playing; the target was the last one dispatched to.
    Recent,
    /// The configured fallback source.
    Fallback,
    /// Reused inside the sticky window without resolving.
    Sticky,
    /// Nothing is available.
    NoTarget,
    /// Capture is switched off.
    Disabled,
}

impl Reason {
    /// Short machine-friendly tag, used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exclusive => "exclusive",
            Self::ContentionFocus => "contention_focus",
            Self::ContentionRecent => "contention_recent",
            Self::ContentionTieBreak => "contention_tie_break",
            Self::Focus => "focus",
            Self::Recent => "recent",
            Self::Fallback => "fallback",
            Self::Sticky => "sticky",
            Self::NoTarget => "no_target",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Chosen target, if any.
    pub target: Option<Source>,
    /// Rule that produced it.
    pub reason: Reason,
}

impl Resolution {
    /// A chosen target.
    pub const fn to(target: Source, reason: Reason) -> Self {
        Self {
            target: Some(target),
            reason,
        }
    }

    /// No target.
    pub const fn none(reason: Reason) -> Self {
        Self {
            target: None,
            reason,
        }
    }
}

/// Priority-ordered target selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    /// Total order used to break ties.
    tie_break: Vec<Source>,
    /// Source tried last.
    fallback: Option<Source>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(&Policy::default())
    }
}

impl Resolver {
    /// Resolver for `policy`. Sources missing from the tie-break list are
    /// appended in declaration order, so the order is always total.
    pub fn new(policy: &Policy) -> Self {
        let mut tie_break: Vec<Source> = Vec::with_capacity(Source::COUNT);
        for s in policy.tie_break.iter().chain(Source::ALL.iter()) {
            if !tie_break.contains(s) {
                tie_break.push(*s);
            }
        }
        Self {
            tie_break,
            fallback: policy.fallback,
        }
    }

    /// Tie-break order in effect.
    pub fn tie_break(&self) -> &[Source] {
        &self.tie_break
    }

    /// Pick a target. The key does not influence the choice.
    pub fn resolve(
        &self,
        snapshot: &Snapshot,
        focus: FocusSignal,
        history: &DispatchHistory,
        _key: MediaKey,
    ) -> Resolution {
        let last = history.last_target;

        match snapshot.playing_count() {
            0 => {}
            1 => {
                if let Some(only) = snapshot.playing_sources().next() {
                    return Resolution::to(only, Reason::Exclusive);
                }
            }
            _ => return self.contention(snapshot, focus, last),
        }

        let focused = |s: Source| focus.owns(s) && snapshot.available(s);
        if let Some(s) = last.filter(|s| focused(*s)) {
            return Resolution::to(s, Reason::Focus);
        }
        if let Some(s) = self.first(focused) {
            return Resolution::to(s, Reason::Focus);
        }
        if let Some(s) = last.filter(|s| snapshot.available(*s)) {
            return Resolution::to(s, Reason::Recent);
        }
        if let Some(s) = self.fallback.filter(|s| snapshot.available(*s)) {
            return Resolution::to(s, Reason::Fallback);
        }
        Resolution::none(Reason::NoTarget)
    }

    /// Rule 2: more than one source playing.
    fn contention(
        &self,
        snapshot: &Snapshot,
        focus: FocusSignal,
        last: Option<Source>,
    ) -> Resolution {
        let focused_playing = |s: Source| snapshot.playing(s) && focus.owns(s);
        let narrowed = snapshot.playing_sources().any(focused_playing);

        let candidate = |s: Source| {
            if narrowed {
                focused_playing(s)
            } else {
                snapshot.playing(s)
            }
        };

        if let Some(s) = last.filter(|s| candidate(*s)) {
            let reason = if narrowed {
                Reason::ContentionFocus
            } else {
                Reason::ContentionRecent
            };
            return Resolution::to(s, reason);
        }
        match self.first(candidate) {
            Some(s) if narrowed => Resolution::to(s, Reason::ContentionFocus),
            Some(s) => Resolution::to(s, Reason::ContentionTieBreak),
            None => Resolution::none(Reason::NoTarget),
        }
    }

    /// First source in tie-break order satisfying `pred`.
    fn first(&self, pred: impl Fn(Source) -> bool) -> Option<Source> {
        self.tie_break.iter().copied().find(|s| pred(*s))
    }
}

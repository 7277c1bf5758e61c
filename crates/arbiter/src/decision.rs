//! Pure transition logic - no IO, no timers, fully testable.
//!
//! Given what the arbiter knows about a source and what the actuator just
//! reported, decide which write (if any) to request.

use crate::actuator::Level;
use crate::policy::level_for_percent;
use crate::state::SourceState;

/// Inputs read at decision time.
#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub current_level: Level,
    pub max_level: Level,
    /// Configured attenuation for the source.
    pub percent: u8,
}

impl Reading {
    pub fn target_ad_level(&self) -> Level {
        level_for_percent(self.max_level, self.percent)
    }
}

/// What the arbiter should do about one accepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Ad started (or continued on a new signal): drop to the ad level.
    Attenuate { target: Level },
    /// Ad ended and the level is still where we left it.
    Restore { target: Level },
    /// Ad ended but no baseline was stored.
    RestoreDefault { target: Level },
    /// Ad ended but the level was changed while it played.
    SkipRestore { current: Level, expected: Level },
    /// Nothing to write.
    NoChange,
}

/// Purpose of a pending write, carried through to its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Attenuate,
    Restore,
    RestoreDefault,
}

impl Purpose {
    /// Restorations clear the source's baseline once they settle.
    pub fn is_restore(self) -> bool {
        matches!(self, Purpose::Restore | Purpose::RestoreDefault)
    }
}

impl Decision {
    /// The write this decision asks for, if any.
    pub fn write(&self) -> Option<(Purpose, Level)> {
        match *self {
            Decision::Attenuate { target } => Some((Purpose::Attenuate, target)),
            Decision::Restore { target } => Some((Purpose::Restore, target)),
            Decision::RestoreDefault { target } => Some((Purpose::RestoreDefault, target)),
            Decision::SkipRestore { .. } | Decision::NoChange => None,
        }
    }
}

/// Apply baseline capture and the transition table to `state`.
///
/// Mutates `state` the way an accepted event does: the baseline may be
/// stored and `was_ad` always takes the event's flag. Clearing the baseline
/// after a restoration is left to the completion path.
pub fn decide(
    state: &mut SourceState,
    is_ad: bool,
    reading: Reading,
    default_restore_percent: u8,
) -> Decision {
    let current = reading.current_level;

    if !is_ad && state.original_level.is_none() && !state.was_ad {
        state.original_level = Some(current);
    }

    let was_ad_prev = std::mem::replace(&mut state.was_ad, is_ad);

    if is_ad {
        if state.original_level.is_none() {
            state.original_level = Some(current);
        }
        return Decision::Attenuate {
            target: reading.target_ad_level(),
        };
    }

    if !was_ad_prev {
        return Decision::NoChange;
    }

    match state.original_level {
        Some(original) => {
            let expected = reading.target_ad_level();
            if current == expected {
                Decision::Restore { target: original }
            } else {
                Decision::SkipRestore { current, expected }
            }
        }
        None => Decision::RestoreDefault {
            target: level_for_percent(reading.max_level, default_restore_percent),
        },
    }
}

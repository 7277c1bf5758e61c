//! The shared output level the arbiter drives.
//!
//! Writes are fire-and-forget: a device may ignore or coalesce them, so the
//! only way to know what happened is to read the level back later.

use std::sync::{Mutex, PoisonError};

use crate::error::ActuatorError;

/// Absolute volume step in `0..=max_level`.
pub type Level = u32;

/// Output device with a single integer volume.
pub trait VolumeActuator: Send + Sync {
    fn level(&self) -> Result<Level, ActuatorError>;

    fn max_level(&self) -> Result<Level, ActuatorError>;

    /// Request a new level. Success only means the request was handed over.
    fn set_level(&self, level: Level) -> Result<(), ActuatorError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    level: Level,
    max_level: Level,
    ignore_writes: bool,
    fail_reads: bool,
    fail_writes: bool,
    writes: Vec<Level>,
}

/// In-process actuator for dry runs and tests.
///
/// Can be told to ignore writes (a device that never converges) or to fail
/// reads and writes outright. Every write request is recorded, applied or not.
#[derive(Debug, Default)]
pub struct MemoryActuator {
    state: Mutex<MemoryState>,
}

impl MemoryActuator {
    pub fn new(level: Level, max_level: Level) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                level: level.min(max_level),
                max_level,
                ..Default::default()
            }),
        }
    }

    /// Change the level behind the arbiter's back, like a user pressing a
    /// hardware key. Not recorded as a write.
    pub fn set_external(&self, level: Level) {
        let mut state = self.lock();
        state.level = level.min(state.max_level);
    }

    pub fn ignore_writes(&self, ignore: bool) {
        self.lock().ignore_writes = ignore;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Levels requested so far, in order.
    pub fn writes(&self) -> Vec<Level> {
        self.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    /// Current level, ignoring any injected read failure.
    pub fn current(&self) -> Level {
        self.lock().level
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VolumeActuator for MemoryActuator {
    fn level(&self) -> Result<Level, ActuatorError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(ActuatorError::Read("injected read failure".into()));
        }
        Ok(state.level)
    }

    fn max_level(&self) -> Result<Level, ActuatorError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(ActuatorError::Read("injected read failure".into()));
        }
        Ok(state.max_level)
    }

    fn set_level(&self, level: Level) -> Result<(), ActuatorError> {
        let mut state = self.lock();
        state.writes.push(level);
        if state.fail_writes {
            return Err(ActuatorError::Write("injected write failure".into()));
        }
        if !state.ignore_writes {
            state.level = level.min(state.max_level);
        }
        Ok(())
    }
}

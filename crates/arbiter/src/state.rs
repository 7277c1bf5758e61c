//! Arbiter state records.

use std::collections::HashMap;
use std::sync::Arc;

use volume0_config::EnabledSources;
use volume0_events::ClassificationEvent;

use crate::actuator::Level;

/// Per-source restoration bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceState {
    /// Level to restore once the source leaves the ad condition.
    pub original_level: Option<Level>,
    /// Ad flag last applied for this source (not merely observed).
    pub was_ad: bool,
}

impl SourceState {
    /// Forget the baseline after a restoration completes.
    pub fn clear(&mut self) {
        self.original_level = None;
        self.was_ad = false;
    }
}

/// Why an event was dropped before reaching the decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// Same source and same ad flag as the last accepted event.
    Duplicate,
    /// Arrived within the debounce window of the last accepted event.
    TooSoon { elapsed_ms: u64 },
}

/// Global debounce gate shared by all sources.
#[derive(Debug, Clone, Default)]
pub struct DebounceGate {
    last_source_id: Option<String>,
    last_is_ad: Option<bool>,
    /// `None` until the first event is accepted.
    last_time_ms: Option<u64>,
}

impl DebounceGate {
    /// Check an event against both gates without recording it.
    ///
    /// A timestamp earlier than the last accepted one counts as zero elapsed.
    pub fn check(&self, event: &ClassificationEvent, window_ms: u64) -> Result<(), GateRejection> {
        if self.last_source_id.as_deref() == Some(event.source_id.as_str())
            && self.last_is_ad == Some(event.is_ad)
        {
            return Err(GateRejection::Duplicate);
        }

        if let Some(last) = self.last_time_ms {
            let elapsed_ms = event.timestamp_ms.saturating_sub(last);
            if elapsed_ms < window_ms {
                return Err(GateRejection::TooSoon { elapsed_ms });
            }
        }

        Ok(())
    }

    /// Record an accepted event.
    pub fn accept(&mut self, event: &ClassificationEvent) {
        self.last_source_id = Some(event.source_id.clone());
        self.last_is_ad = Some(event.is_ad);
        self.last_time_ms = Some(event.timestamp_ms);
    }
}

/// Everything the arbiter remembers between events.
#[derive(Debug, Default)]
pub struct ArbiterState {
    /// Replaced wholesale on configuration change, never edited in place.
    pub enabled_sources: Arc<EnabledSources>,
    pub gate: DebounceGate,
    pub per_source: HashMap<String, SourceState>,
}

impl ArbiterState {
    pub fn new(enabled_sources: EnabledSources) -> Self {
        Self {
            enabled_sources: Arc::new(enabled_sources),
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.gate = DebounceGate::default();
        self.per_source.clear();
    }
}

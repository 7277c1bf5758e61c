//! The volume arbiter.
//!
//! Synchronous and single-owner: every method takes `&mut self`, so whoever
//! owns the arbiter is the serialization domain. [`crate::ArbiterService`]
//! is the async owner used in production.

use std::sync::Arc;

use volume0_config::EnabledSources;
use volume0_events::{
    emit_event, event_names, ClassificationEvent, EventBusRef, VolumeObservation,
};

use crate::actuator::{Level, VolumeActuator};
use crate::decision::{decide, Decision, Purpose, Reading};
use crate::policy::ArbiterConfig;
use crate::retry::{CheckOutcome, PendingRequest, RequestId, RetryScheduler};
use crate::state::{ArbiterState, SourceState};

/// Decides, per classification event, whether and where to move the shared
/// volume, and sees each write through to confirmation or abandonment.
pub struct VolumeArbiter {
    config: ArbiterConfig,
    actuator: Arc<dyn VolumeActuator>,
    scheduler: Arc<dyn RetryScheduler>,
    bus: EventBusRef,
    state: ArbiterState,
    pending: Option<PendingRequest>,
    next_request: u64,
    torn_down: bool,
}

impl VolumeArbiter {
    pub fn new(
        config: ArbiterConfig,
        actuator: Arc<dyn VolumeActuator>,
        scheduler: Arc<dyn RetryScheduler>,
        bus: EventBusRef,
        enabled_sources: EnabledSources,
    ) -> Self {
        Self {
            config,
            actuator,
            scheduler,
            bus,
            state: ArbiterState::new(enabled_sources),
            pending: None,
            next_request: 0,
            torn_down: false,
        }
    }

    /// Process one classification event. Never fails; actuator faults are
    /// logged and absorbed.
    pub fn handle_event(&mut self, event: &ClassificationEvent) {
        if self.torn_down {
            tracing::debug!(source_id = %event.source_id, "Arbiter torn down, ignoring event");
            return;
        }

        let snapshot = Arc::clone(&self.state.enabled_sources);
        let Some(percent) = snapshot.percent(&event.source_id) else {
            tracing::debug!(source_id = %event.source_id, "Source not enabled, ignoring event");
            return;
        };

        if let Err(rejection) = self
            .state
            .gate
            .check(event, self.config.debounce_window_ms)
        {
            tracing::debug!(
                source_id = %event.source_id,
                is_ad = event.is_ad,
                ?rejection,
                "Event gated"
            );
            return;
        }

        let (max_level, current_level) = match self.read_levels() {
            Ok(levels) => levels,
            Err(e) => {
                // Gate not committed, so the next notification can try again.
                tracing::warn!(
                    source_id = %event.source_id,
                    error = %e,
                    "Failed to read volume, dropping event"
                );
                return;
            }
        };
        self.state.gate.accept(event);

        let reading = Reading {
            current_level,
            max_level,
            percent,
        };
        let source = self
            .state
            .per_source
            .entry(event.source_id.clone())
            .or_default();
        let had_baseline = source.original_level.is_some();
        let decision = decide(
            source,
            event.is_ad,
            reading,
            self.config.default_restore_percent,
        );
        let captured_baseline =
            !had_baseline && !event.is_ad && source.original_level.is_some();

        tracing::debug!(
            source_id = %event.source_id,
            is_ad = event.is_ad,
            current_level,
            max_level,
            percent,
            ?decision,
            "Decision"
        );

        if captured_baseline {
            tracing::debug!(
                source_id = %event.source_id,
                baseline = current_level,
                "Captured baseline"
            );
            self.observe(current_level, max_level);
        }

        match decision {
            Decision::SkipRestore { current, expected } => {
                tracing::info!(
                    source_id = %event.source_id,
                    current,
                    expected,
                    "Volume changed during ad, leaving it alone"
                );
            }
            Decision::RestoreDefault { target } => {
                tracing::warn!(
                    source_id = %event.source_id,
                    restore_to = target,
                    "No stored volume, restoring to default"
                );
            }
            _ => {}
        }

        if let Some((purpose, target)) = decision.write() {
            self.request_level(&event.source_id, purpose, target, max_level, current_level);
        }
    }

    /// Swap in a new enabled-source snapshot.
    pub fn refresh_config(&mut self, enabled_sources: EnabledSources) {
        tracing::info!(enabled = enabled_sources.len(), "Enabled sources updated");
        self.state.enabled_sources = Arc::new(enabled_sources);
    }

    /// Continue the request `id` after its delay elapsed.
    ///
    /// Checks for superseded requests, or arriving after teardown, do nothing.
    pub fn on_check(&mut self, id: RequestId) {
        if self.torn_down {
            tracing::debug!(%id, "Arbiter torn down, ignoring check");
            return;
        }

        let mut pending = match self.pending.take() {
            Some(p) if p.id == id => p,
            other => {
                self.pending = other;
                tracing::debug!(%id, "Stale check, ignoring");
                return;
            }
        };

        match pending.record_check(self.actuator.level(), self.config.retry_ceiling) {
            CheckOutcome::Confirmed(level) => {
                tracing::debug!(
                    %id,
                    source_id = %pending.source_id,
                    confirmed = level,
                    "Volume confirmed"
                );
                self.complete(&pending, level);
            }
            CheckOutcome::Retry => {
                tracing::warn!(
                    %id,
                    source_id = %pending.source_id,
                    observed = pending.last_observed,
                    requested = pending.target,
                    attempt = pending.retries,
                    ceiling = self.config.retry_ceiling,
                    "Volume not applied, retrying"
                );
                self.write(pending.target);
                self.scheduler.schedule(id, self.config.retry_delay);
                self.pending = Some(pending);
            }
            CheckOutcome::Abandoned(level) => {
                tracing::warn!(
                    %id,
                    source_id = %pending.source_id,
                    requested = pending.target,
                    actual = level,
                    "Gave up setting volume"
                );
                self.complete(&pending, level);
            }
        }
    }

    /// Drop every pending check and all per-source state. Anything arriving
    /// afterwards is ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.pending = None;
        self.state.clear();
        self.scheduler.cancel_all();
        tracing::info!("Arbiter torn down");
    }

    pub fn source_state(&self, source_id: &str) -> Option<&SourceState> {
        self.state.per_source.get(source_id)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_id(&self) -> Option<RequestId> {
        self.pending.as_ref().map(|p| p.id)
    }

    pub fn enabled_sources(&self) -> Arc<EnabledSources> {
        Arc::clone(&self.state.enabled_sources)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn read_levels(&self) -> Result<(Level, Level), crate::ActuatorError> {
        let max_level = self.actuator.max_level()?;
        let current_level = self.actuator.level()?;
        Ok((max_level, current_level))
    }

    fn request_level(
        &mut self,
        source_id: &str,
        purpose: Purpose,
        target: Level,
        max_level: Level,
        level_before: Level,
    ) {
        self.next_request += 1;
        let id = RequestId(self.next_request);

        if let Some(previous) = self.pending.take() {
            tracing::debug!(
                superseded = %previous.id,
                by = %id,
                source_id = %previous.source_id,
                "Pending volume request superseded"
            );
        }

        tracing::debug!(%id, source_id, ?purpose, requested = target, "Requesting volume");
        self.write(target);
        self.pending = Some(PendingRequest::new(
            id,
            source_id,
            purpose,
            target,
            max_level,
            level_before,
        ));
        self.scheduler.schedule(id, self.config.retry_delay);
    }

    fn write(&self, level: Level) {
        if let Err(e) = self.actuator.set_level(level) {
            // Treated like an ignored write; the check decides what happens.
            tracing::warn!(target_level = level, error = %e, "Volume write failed");
        }
    }

    fn complete(&mut self, request: &PendingRequest, level: Level) {
        if request.purpose.is_restore() {
            if let Some(source) = self.state.per_source.get_mut(&request.source_id) {
                source.clear();
            }
            tracing::debug!(source_id = %request.source_id, "Cleared stored volume");
        }
        self.observe(level, request.max_level);
    }

    fn observe(&self, level: Level, max_level: Level) {
        let observation = VolumeObservation::from_level(level, max_level);
        emit_event(self.bus.as_ref(), event_names::VOLUME_OBSERVED, &observation);
    }
}

//! Ad-aware volume arbitration for volume0.
//!
//! Consumes classification events ("source X is / is not playing an ad"),
//! attenuates the shared output volume while an ad plays, and restores the
//! user's level afterwards, unless the user changed it in the meantime.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  policy.rs   - Timing constants and ArbiterConfig           │
//! │  state.rs    - SourceState, DebounceGate, ArbiterState      │
//! │  decision.rs - Transition table (pure)                      │
//! │  retry.rs    - Confirmation state machine, RetryScheduler   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Core                                   │
//! │  arbiter.rs  - VolumeArbiter (sync, single owner)           │
//! │  actuator.rs - VolumeActuator trait, MemoryActuator         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  service.rs  - Tokio actor, TokioScheduler, ArbiterHandle   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use volume0_arbiter::{ArbiterConfig, ArbiterService, MemoryActuator};
//! use volume0_events::{ClassificationEvent, NullEventBus};
//!
//! let actuator = Arc::new(MemoryActuator::new(8, 10));
//! let enabled = [("com.spotify.music", 20)].into_iter().collect();
//! let mut handle = ArbiterService::spawn(
//!     ArbiterConfig::default(),
//!     actuator,
//!     Arc::new(NullEventBus),
//!     enabled,
//! );
//!
//! handle.submit(ClassificationEvent::new("com.spotify.music", true, 0))?;
//! handle.shutdown().await?;
//! ```

mod actuator;
mod arbiter;
mod decision;
mod error;
mod policy;
mod retry;
mod service;
mod state;

pub use actuator::{Level, MemoryActuator, VolumeActuator};
pub use arbiter::VolumeArbiter;
pub use decision::{decide, Decision, Purpose, Reading};
pub use error::{ActuatorError, ServiceError};
pub use policy::{
    level_for_percent, ArbiterConfig, DEBOUNCE_WINDOW_MS, DEFAULT_RESTORE_PERCENT, RETRY_CEILING,
    RETRY_DELAY,
};
pub use retry::{CheckOutcome, ManualScheduler, PendingRequest, RequestId, RetryScheduler};
pub use service::{ArbiterHandle, ArbiterService, Command, TokioScheduler};
pub use state::{ArbiterState, DebounceGate, GateRejection, SourceState};

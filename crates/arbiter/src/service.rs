//! Async owner of a [`VolumeArbiter`].
//!
//! One tokio task holds the arbiter and drains a command channel. Retry
//! delays are sleep tasks that post `Command::Check` back into the same
//! channel, so checks and events never interleave.
//!
//! Actuator calls may block (the `pactl` actuator spawns a process), so each
//! command runs on the blocking pool with the arbiter moved in and handed
//! back. The task still processes one command at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use volume0_config::EnabledSources;
use volume0_events::{ClassificationEvent, EventBusRef};

use crate::actuator::VolumeActuator;
use crate::arbiter::VolumeArbiter;
use crate::error::ServiceError;
use crate::policy::ArbiterConfig;
use crate::retry::{RequestId, RetryScheduler};

/// Work items for the arbiter task.
#[derive(Debug)]
pub enum Command {
    Classify(ClassificationEvent),
    ConfigChanged(EnabledSources),
    Check(RequestId),
    Shutdown,
}

/// Timer-backed scheduler feeding checks into the arbiter's channel.
///
/// Holds only a weak sender so pending timers never keep the service alive.
pub struct TokioScheduler {
    tx: mpsc::WeakUnboundedSender<Command>,
    cancel: CancellationToken,
}

impl TokioScheduler {
    pub fn new(tx: mpsc::WeakUnboundedSender<Command>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }
}

impl RetryScheduler for TokioScheduler {
    fn schedule(&self, id: RequestId, delay: Duration) {
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::trace!(%id, "Check cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(Command::Check(id));
                    }
                }
            }
        });
    }

    fn cancel_all(&self) {
        self.cancel.cancel();
    }
}

/// Spawns the arbiter task.
pub struct ArbiterService;

impl ArbiterService {
    /// Start the arbiter on the current tokio runtime.
    pub fn spawn(
        config: ArbiterConfig,
        actuator: Arc<dyn VolumeActuator>,
        bus: EventBusRef,
        enabled_sources: EnabledSources,
    ) -> ArbiterHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let scheduler = Arc::new(TokioScheduler::new(tx.downgrade(), cancel.child_token()));
        let arbiter = VolumeArbiter::new(config, actuator, scheduler, bus, enabled_sources);

        let task = tokio::spawn(run(arbiter, rx, cancel.clone()));

        ArbiterHandle {
            tx,
            cancel,
            task: Some(task),
        }
    }
}

async fn run(
    arbiter: VolumeArbiter,
    mut rx: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
) {
    tracing::info!("Arbiter service started");

    let mut arbiter = Some(arbiter);
    loop {
        let command = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Arbiter service cancelled");
                break;
            }
            command = rx.recv() => command,
        };

        let command = match command {
            Some(Command::Shutdown) => break,
            Some(command) => command,
            None => {
                tracing::info!("All arbiter handles dropped");
                break;
            }
        };

        let Some(current) = arbiter.take() else {
            break;
        };
        arbiter = apply(current, command).await;
    }

    if let Some(mut arbiter) = arbiter {
        arbiter.teardown();
    }
    tracing::info!("Arbiter service stopped");
}

/// Run one command against the arbiter off the async workers.
///
/// Returns `None` if the arbiter panicked; the service then stops.
async fn apply(mut arbiter: VolumeArbiter, command: Command) -> Option<VolumeArbiter> {
    let result = tokio::task::spawn_blocking(move || {
        match command {
            Command::Classify(event) => arbiter.handle_event(&event),
            Command::ConfigChanged(snapshot) => arbiter.refresh_config(snapshot),
            Command::Check(id) => arbiter.on_check(id),
            Command::Shutdown => {}
        }
        arbiter
    })
    .await;

    match result {
        Ok(arbiter) => Some(arbiter),
        Err(e) => {
            tracing::error!(error = %e, "Arbiter command failed");
            None
        }
    }
}

/// Handle to a running arbiter task.
///
/// Dropping every handle stops the task once the queue drains.
pub struct ArbiterHandle {
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ArbiterHandle {
    /// Queue a classification event.
    pub fn submit(&self, event: ClassificationEvent) -> Result<(), ServiceError> {
        self.send(Command::Classify(event))
    }

    /// Queue a fresh enabled-source snapshot.
    pub fn config_changed(&self, enabled_sources: EnabledSources) -> Result<(), ServiceError> {
        self.send(Command::ConfigChanged(enabled_sources))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop the arbiter after it drains what is already queued, and wait
    /// for it. Pending retry timers are dropped.
    ///
    /// Calling this twice is harmless.
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };

        if self.tx.send(Command::Shutdown).is_err() {
            self.cancel.cancel();
        }
        task.await?;
        self.cancel.cancel();
        Ok(())
    }

    fn send(&self, command: Command) -> Result<(), ServiceError> {
        self.tx.send(command).map_err(|_| ServiceError::Closed)
    }
}

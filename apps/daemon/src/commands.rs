//! Stdin command protocol and its dispatch.

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use volume0_arbiter::{ArbiterConfig, ArbiterHandle, ArbiterService, VolumeActuator};
use volume0_classify::{classify, Notification};
use volume0_config::{ConfigStore, EnabledSources};
use volume0_events::{emit_event, event_names, EventBusRef};

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    /// A media notification; a missing `timestamp_ms` defaults to now.
    Notification(NotificationLine),
    SetEnabled { source_id: String, enabled: bool },
    SetAttenuation { source_id: String, percent: u32 },
    ListSources,
}

/// Wire form of a notification. Unlike [`Notification`] the timestamp is
/// optional so an explicit `0` stays distinguishable from an absent field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotificationLine {
    pub source_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
}

impl NotificationLine {
    /// Convert to a [`Notification`], stamping `now_ms` only when the line
    /// carried no timestamp.
    pub fn into_notification(self, now_ms: impl FnOnce() -> u64) -> Notification {
        Notification {
            source_id: self.source_id,
            title: self.title,
            body: self.body,
            subtitle: self.subtitle,
            timestamp_ms: self.timestamp_ms.unwrap_or_else(now_ms),
        }
    }
}

/// Payload for [`event_names::COMMAND_FAILED`].
#[derive(Debug, Clone, Serialize)]
pub struct CommandFailed {
    pub error: String,
}

/// Glue between stdin, the settings store and the arbiter service.
pub struct Daemon {
    store: Arc<dyn ConfigStore>,
    bus: EventBusRef,
    arbiter: ArbiterHandle,
    enabled: EnabledSources,
}

impl Daemon {
    /// Load the enabled-source snapshot and start the arbiter.
    pub fn start(
        store: Arc<dyn ConfigStore>,
        actuator: Arc<dyn VolumeActuator>,
        bus: EventBusRef,
    ) -> anyhow::Result<Self> {
        let enabled = store
            .enabled_sources()
            .context("failed to load source settings")?;
        tracing::info!(enabled = enabled.len(), "Loaded source settings");

        let arbiter = ArbiterService::spawn(
            ArbiterConfig::default(),
            actuator,
            Arc::clone(&bus),
            enabled.clone(),
        );

        Ok(Self {
            store,
            bus,
            arbiter,
            enabled,
        })
    }

    /// Parse and run one input line. Blank lines are skipped.
    ///
    /// Failures are reported on the bus as well as returned.
    pub fn handle_line(&mut self, line: &str) -> anyhow::Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let result = serde_json::from_str::<Input>(line)
            .context("malformed command")
            .and_then(|input| self.dispatch(input));

        if let Err(e) = &result {
            emit_event(
                self.bus.as_ref(),
                event_names::COMMAND_FAILED,
                &CommandFailed {
                    error: format!("{e:#}"),
                },
            );
        }
        result
    }

    pub fn dispatch(&mut self, input: Input) -> anyhow::Result<()> {
        match input {
            Input::Notification(line) => self.on_notification(line.into_notification(now_ms)),
            Input::SetEnabled { source_id, enabled } => {
                self.store.set_enabled(&source_id, enabled)?;
                tracing::info!(source_id = %source_id, enabled, "Source toggled");
                self.refresh()
            }
            Input::SetAttenuation { source_id, percent } => {
                self.store.set_attenuation(&source_id, percent)?;
                tracing::info!(source_id = %source_id, percent, "Attenuation changed");
                self.refresh()
            }
            Input::ListSources => {
                let sources = self.store.load_all()?;
                emit_event(self.bus.as_ref(), event_names::SOURCES_LISTED, &sources);
                Ok(())
            }
        }
    }

    pub fn enabled_sources(&self) -> &EnabledSources {
        &self.enabled
    }

    /// Stop the arbiter, dropping any retry still in flight.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.arbiter.shutdown().await?;
        Ok(())
    }

    fn on_notification(&mut self, notification: Notification) -> anyhow::Result<()> {
        let classification = classify(&notification);

        // Only enabled sources are reported, but the arbiter sees everything
        // and filters with its own snapshot.
        if self.enabled.contains(&classification.source_id) {
            emit_event(
                self.bus.as_ref(),
                event_names::NOW_PLAYING,
                &classification.to_now_playing(),
            );
        }

        self.arbiter.submit(classification.to_event())?;
        Ok(())
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        self.enabled = self.store.enabled_sources()?;
        self.arbiter.config_changed(self.enabled.clone())?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

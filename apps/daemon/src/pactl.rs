//! Default-sink volume through `pactl` (PulseAudio or PipeWire-pulse).

use std::process::Command;

use volume0_arbiter::{ActuatorError, Level, VolumeActuator};

const SINK: &str = "@DEFAULT_SINK@";

/// Levels are whole percents; anything `pactl` reports above 100% is
/// clamped so the arbiter never sees a level over its max.
const MAX_PERCENT: Level = 100;

#[derive(Debug, Clone)]
pub struct PactlActuator {
    program: String,
}

impl Default for PactlActuator {
    fn default() -> Self {
        Self::new()
    }
}

impl PactlActuator {
    pub fn new() -> Self {
        Self {
            program: "pactl".to_string(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, ActuatorError> {
        let output = Command::new(&self.program).args(args).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ActuatorError::Unavailable(format!(
                "{} {} exited with {}: {}",
                self.program,
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VolumeActuator for PactlActuator {
    fn level(&self) -> Result<Level, ActuatorError> {
        let output = self.run(&["get-sink-volume", SINK])?;
        parse_volume(&output)
    }

    fn max_level(&self) -> Result<Level, ActuatorError> {
        Ok(MAX_PERCENT)
    }

    fn set_level(&self, level: Level) -> Result<(), ActuatorError> {
        let percent = format!("{}%", level.min(MAX_PERCENT));
        self.run(&["set-sink-volume", SINK, &percent])
            .map_err(|e| ActuatorError::Write(e.to_string()))?;
        Ok(())
    }
}

/// First channel's percentage from `pactl get-sink-volume` output, e.g.
/// `Volume: front-left: 32768 /  50% / -18.06 dB, ...`.
pub fn parse_volume(output: &str) -> Result<Level, ActuatorError> {
    output
        .split_whitespace()
        .find_map(|token| token.strip_suffix('%'))
        .and_then(|digits| digits.parse::<Level>().ok())
        .map(|percent| percent.min(MAX_PERCENT))
        .ok_or_else(|| ActuatorError::Parse(output.trim().to_string()))
}

//! Audible rain alert.
//!
//! A two-state machine (`Playing`/`Stopped`) driven only by poll
//! outcomes, plus the one-shot unlock gate: playback is not allowed
//! until the first genuine key press, mirroring host environments that
//! block autonomous audio. Before the gate is satisfied a start attempt
//! is swallowed and logged, never surfaced, and not retried until the
//! next poll.

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// What the latest poll outcome asks of the alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueDecision {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueState {
    Playing,
    Stopped,
}

/// Playback backend seam. The real sink drives an external player
/// process; tests substitute a recording stub.
pub trait AlertSink: Send {
    fn start(&mut self, volume: f32) -> Result<()>;
    fn stop(&mut self);
}

/// Spawns the configured player command and kills it on stop. The
/// `{volume}` placeholder in any argument is replaced with the volume
/// as a 0-100 percentage.
pub struct PlayerSink {
    command: Vec<String>,
    child: Option<Child>,
}

impl PlayerSink {
    pub fn new(command: Vec<String>) -> Self {
        Self { command, child: None }
    }
}

impl AlertSink for PlayerSink {
    fn start(&mut self, volume: f32) -> Result<()> {
        if self.child.is_some() {
            return Ok(());
        }
        let (program, args) = self
            .command
            .split_first()
            .context("audio player command is empty")?;
        let percent = format!("{}", (volume * 100.0).round() as u32);
        let args: Vec<String> = args
            .iter()
            .map(|a| a.replace("{volume}", &percent))
            .collect();

        let child = Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start audio player '{program}'"))?;
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                warn!("failed to stop audio player: {e}");
            }
        }
    }
}

/// One-shot permission gate. Armed at startup, satisfied exactly once
/// by the first user interaction, never reset.
#[derive(Debug)]
pub struct UnlockGate {
    satisfied: bool,
    volume: f32,
}

impl UnlockGate {
    pub fn new(volume: f32) -> Self {
        Self { satisfied: false, volume }
    }

    /// Still waiting for the first interaction?
    pub fn armed(&self) -> bool {
        !self.satisfied
    }

    pub fn satisfied(&self) -> bool {
        self.satisfied
    }

    /// Marks the gate satisfied. Returns the playback volume to apply on
    /// the first call only; later calls are no-ops.
    pub fn trigger(&mut self) -> Option<f32> {
        if self.satisfied {
            return None;
        }
        self.satisfied = true;
        info!("audio unlocked by user interaction");
        Some(self.volume)
    }
}

/// The alert state machine itself.
pub struct AudioCue {
    state: CueState,
    volume: f32,
    sink: Box<dyn AlertSink>,
}

impl AudioCue {
    pub fn new(sink: Box<dyn AlertSink>) -> Self {
        Self {
            state: CueState::Stopped,
            volume: 0.0,
            sink,
        }
    }

    pub fn state(&self) -> CueState {
        self.state
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    /// Applies the latest poll's decision. Stop is idempotent. Start is
    /// swallowed while the gate is unsatisfied, and a sink failure only
    /// logs; the next poll gets another chance.
    pub fn apply(&mut self, decision: CueDecision, unlocked: bool) {
        match decision {
            CueDecision::Start => {
                if !unlocked {
                    debug!("audio play blocked until user interaction");
                    return;
                }
                if self.state == CueState::Playing {
                    return;
                }
                match self.sink.start(self.volume) {
                    Ok(()) => self.state = CueState::Playing,
                    Err(e) => debug!("audio start failed: {e:#}"),
                }
            }
            CueDecision::Stop => {
                self.sink.stop();
                self.state = CueState::Stopped;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl AlertSink for RecordingSink {
        fn start(&mut self, volume: f32) -> Result<()> {
            self.calls.lock().unwrap().push(format!("start@{volume}"));
            Ok(())
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop".into());
        }
    }

    fn cue_with_recorder() -> (AudioCue, Arc<Mutex<Vec<String>>>) {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        (AudioCue::new(Box::new(sink)), calls)
    }

    #[test]
    fn test_start_blocked_while_gate_armed() {
        let (mut cue, calls) = cue_with_recorder();
        cue.apply(CueDecision::Start, false);
        assert_eq!(cue.state(), CueState::Stopped);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_start_after_gate_satisfied() {
        let (mut cue, calls) = cue_with_recorder();
        let mut gate = UnlockGate::new(0.2);
        let volume = gate.trigger().unwrap();
        cue.set_volume(volume);
        cue.apply(CueDecision::Start, gate.satisfied());
        assert_eq!(cue.state(), CueState::Playing);
        assert_eq!(calls.lock().unwrap().as_slice(), ["start@0.2"]);
    }

    #[test]
    fn test_start_is_level_triggered_not_restarted() {
        let (mut cue, calls) = cue_with_recorder();
        cue.set_volume(0.2);
        cue.apply(CueDecision::Start, true);
        cue.apply(CueDecision::Start, true);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut cue, calls) = cue_with_recorder();
        cue.apply(CueDecision::Stop, true);
        cue.apply(CueDecision::Stop, true);
        assert_eq!(cue.state(), CueState::Stopped);
        assert_eq!(calls.lock().unwrap().as_slice(), ["stop", "stop"]);
    }

    #[test]
    fn test_gate_triggers_exactly_once() {
        let mut gate = UnlockGate::new(0.2);
        assert!(gate.armed());
        assert_eq!(gate.trigger(), Some(0.2));
        assert!(gate.satisfied());
        assert_eq!(gate.trigger(), None);
        assert!(gate.satisfied());
    }

    #[test]
    fn test_volume_placeholder_substitution() {
        // 0.2 -> "20" percent in player args
        let percent = format!("{}", (0.2f32 * 100.0).round() as u32);
        assert_eq!(percent, "20");
    }
}

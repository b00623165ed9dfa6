//! The coordinating application loop.
//!
//! One `App` owns all mutable state (dashboard, optimistic control
//! flags, audio cue, unlock gate) and runs a single `tokio::select!`
//! loop over the poll tick, the feed channel, and terminal key events.
//! Request tasks only perform I/O and report back through the feed, so
//! every state mutation happens on this loop and no locking is needed.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::interval;
use tracing::{debug, info};

use crate::audio::{AlertSink, AudioCue, UnlockGate};
use crate::commands::{self, ControlState};
use crate::config::MonitorConfig;
use crate::dashboard::{self, DashboardState};
use crate::logs;
use crate::telemetry::{self, DeviceClient, PollOutcome};

/// Everything the main loop can receive from its request tasks.
#[derive(Debug)]
pub enum Feed {
    Poll(PollOutcome),
    Notice(String),
    Logs(String),
}

pub struct App {
    config: MonitorConfig,
    client: DeviceClient,
    dashboard: DashboardState,
    control: ControlState,
    cue: AudioCue,
    gate: UnlockGate,
}

impl App {
    pub fn new(config: MonitorConfig, sink: Box<dyn AlertSink>) -> Self {
        let client = DeviceClient::new(config.device_url.clone());
        let dashboard = DashboardState::new(config.series_capacity);
        let gate = UnlockGate::new(config.audio.volume);
        Self {
            config,
            client,
            dashboard,
            control: ControlState::new(),
            cue: AudioCue::new(sink),
            gate,
        }
    }

    /// Runs until the user quits. Polls once immediately, then on the
    /// fixed interval, unconditionally: no backoff and no in-flight
    /// guard, so a slow response can overlap the next tick and land
    /// after a fresher one. The series records resolution order.
    pub async fn run(&mut self, out: &mut impl Write) -> Result<()> {
        let (feed_tx, mut feed_rx) = mpsc::unbounded_channel();
        let mut tick = interval(Duration::from_secs(self.config.poll_interval_secs));
        let mut events = EventStream::new();

        info!("monitoring {}", self.client.base_url());
        self.render(out)?;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    telemetry::spawn_poll(&self.client, &feed_tx);
                }
                Some(feed) = feed_rx.recv() => {
                    self.on_feed(feed);
                    self.render(out)?;
                }
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            if self.on_event(event, &feed_tx) {
                                break;
                            }
                            self.render(out)?;
                        }
                        Some(Err(e)) => debug!("terminal event error: {e}"),
                        None => break,
                    }
                }
            }
        }
        Ok(())
    }

    fn on_feed(&mut self, feed: Feed) {
        match feed {
            Feed::Poll(outcome) => {
                let decision = self.dashboard.apply_poll(&outcome);
                self.cue.apply(decision, self.gate.satisfied());
            }
            Feed::Notice(notice) => self.dashboard.push_notice(notice),
            Feed::Logs(text) => self.dashboard.set_log_text(text),
        }
    }

    /// Handles one terminal event. Returns true on quit.
    fn on_event(&mut self, event: Event, feed: &UnboundedSender<Feed>) -> bool {
        let Event::Key(key) = event else { return false };
        if key.kind != KeyEventKind::Press {
            return false;
        }

        // Any first key press is the qualifying interaction.
        if let Some(volume) = self.gate.trigger() {
            self.cue.set_volume(volume);
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('l') => {
                let on = self.control.flip_light();
                commands::spawn_toggle_light(&self.client, on, feed);
            }
            KeyCode::Char('s') => {
                let angle = self.control.flip_servo();
                commands::spawn_toggle_servo(&self.client, angle, feed);
            }
            KeyCode::Char('r') => commands::spawn_reset_servo(&self.client, feed),
            KeyCode::Char('v') => logs::spawn_view_logs(&self.client, feed),
            KeyCode::Char('d') => logs::spawn_download_logs(self.client.base_url()),
            _ => {}
        }
        false
    }

    fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        dashboard::render(
            &self.dashboard,
            &self.control,
            self.cue.state(),
            self.gate.armed(),
            out,
        )
    }

    #[cfg(test)]
    fn parts(&self) -> (&DashboardState, &ControlState, crate::audio::CueState) {
        (&self.dashboard, &self.control, self.cue.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::CueState;
    use crate::dashboard::ERROR_MARKER;
    use crate::telemetry::{DeviceError, RainStatus, TelemetrySample};
    use chrono::Local;
    use crossterm::event::KeyEvent;

    struct StubSink;

    impl AlertSink for StubSink {
        fn start(&mut self, _volume: f32) -> anyhow::Result<()> {
            Ok(())
        }
        fn stop(&mut self) {}
    }

    fn app() -> App {
        App::new(MonitorConfig::default(), Box::new(StubSink))
    }

    fn rain_outcome() -> Feed {
        Feed::Poll(PollOutcome::Sample(TelemetrySample {
            timestamp: Local::now(),
            temperature: 20.0,
            humidity: 80.0,
            status: RainStatus::RainDetected,
            status_text: "Rain Detected".into(),
        }))
    }

    fn failed_outcome() -> Feed {
        Feed::Poll(PollOutcome::Failed(DeviceError::Payload("bad json".into())))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::from(code))
    }

    #[tokio::test]
    async fn test_rain_before_unlock_is_swallowed() {
        let mut app = app();
        app.on_feed(rain_outcome());
        let (dashboard, _, cue) = app.parts();
        assert_eq!(cue, CueState::Stopped);
        assert_eq!(dashboard.series.values(), vec![1]);
    }

    #[tokio::test]
    async fn test_rain_after_unlock_starts_playback() {
        let (feed_tx, _rx) = mpsc::unbounded_channel();
        let mut app = app();
        assert!(!app.on_event(key(KeyCode::Char('x')), &feed_tx));
        app.on_feed(rain_outcome());
        let (_, _, cue) = app.parts();
        assert_eq!(cue, CueState::Playing);
    }

    #[tokio::test]
    async fn test_failure_stops_playback_and_marks_status() {
        let (feed_tx, _rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.on_event(key(KeyCode::Char('x')), &feed_tx);
        app.on_feed(rain_outcome());
        app.on_feed(failed_outcome());
        let (dashboard, _, cue) = app.parts();
        assert_eq!(cue, CueState::Stopped);
        assert_eq!(dashboard.status, ERROR_MARKER);
        assert_eq!(dashboard.series.len(), 1);
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (feed_tx, _rx) = mpsc::unbounded_channel();
        let mut app = app();
        assert!(app.on_event(key(KeyCode::Char('q')), &feed_tx));
        assert!(app.on_event(key(KeyCode::Esc), &feed_tx));
    }

    #[tokio::test]
    async fn test_light_key_flips_optimistically_before_any_response() {
        let (feed_tx, _rx) = mpsc::unbounded_channel();
        let mut app = app();
        app.on_event(key(KeyCode::Char('l')), &feed_tx);
        let (_, control, _) = app.parts();
        assert!(control.light_on);
    }

    #[tokio::test]
    async fn test_notices_reach_the_dashboard() {
        let mut app = app();
        app.on_feed(Feed::Notice("💡 Light turned ON".into()));
        let (dashboard, _, _) = app.parts();
        assert_eq!(dashboard.notices().collect::<Vec<_>>(), vec!["💡 Light turned ON"]);
    }
}

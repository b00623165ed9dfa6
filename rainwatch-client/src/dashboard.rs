//! Presentation sink and terminal renderer.
//!
//! `DashboardState` owns every visible field plus the rolling series;
//! `apply_poll` is the single reducer that maps a poll outcome onto
//! them and decides what the audio cue should do. Rendering is purely a
//! read of the state, drawn as one crossterm frame per update.

use std::collections::VecDeque;
use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

use crate::audio::{CueDecision, CueState};
use crate::commands::ControlState;
use crate::series::RollingSeries;
use crate::telemetry::PollOutcome;

/// Fixed marker shown in the status field when a poll fails.
pub const ERROR_MARKER: &str = "ESP32 error";

const PLACEHOLDER: &str = "--";
const NOTICE_ROWS: usize = 4;
const LOG_ROWS: usize = 8;

pub struct DashboardState {
    pub temperature: String,
    pub humidity: String,
    pub status: String,
    pub last_updated: String,
    pub series: RollingSeries,
    notices: VecDeque<String>,
    log_text: Option<String>,
}

impl DashboardState {
    pub fn new(series_capacity: usize) -> Self {
        Self {
            temperature: PLACEHOLDER.to_string(),
            humidity: PLACEHOLDER.to_string(),
            status: PLACEHOLDER.to_string(),
            last_updated: PLACEHOLDER.to_string(),
            series: RollingSeries::new(series_capacity),
            notices: VecDeque::new(),
            log_text: None,
        }
    }

    /// Maps one resolved poll outcome onto the visible fields and the
    /// series, returning the audio cue decision.
    ///
    /// Failures only touch the status field: the series records
    /// successful observations, never error epochs.
    pub fn apply_poll(&mut self, outcome: &PollOutcome) -> CueDecision {
        match outcome {
            PollOutcome::Sample(sample) => {
                let time_label = sample.timestamp.format("%H:%M:%S").to_string();
                self.temperature = format!("{} °C", sample.temperature);
                self.humidity = format!("{} %", sample.humidity);
                self.status = sample.status_text.clone();
                self.last_updated = time_label.clone();
                let raining = sample.status.is_rain();
                self.series.push(time_label, raining as u8);
                if raining {
                    CueDecision::Start
                } else {
                    CueDecision::Stop
                }
            }
            PollOutcome::Failed(_) => {
                self.status = ERROR_MARKER.to_string();
                CueDecision::Stop
            }
        }
    }

    pub fn push_notice(&mut self, notice: String) {
        if self.notices.len() >= NOTICE_ROWS {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }

    pub fn set_log_text(&mut self, text: String) {
        self.log_text = Some(text);
    }

    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().map(String::as_str)
    }

    pub fn log_text(&self) -> Option<&str> {
        self.log_text.as_deref()
    }
}

/// Stepped sparkline of the series, oldest on the left (1 = rain).
fn sparkline(series: &RollingSeries) -> String {
    series
        .values()
        .iter()
        .map(|&v| if v == 1 { '█' } else { '▁' })
        .collect()
}

/// Draws one full dashboard frame.
pub fn render(
    state: &DashboardState,
    control: &ControlState,
    cue: CueState,
    audio_locked: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    let audio_line = match (cue, audio_locked) {
        (_, true) => "muted until first key press".to_string(),
        (CueState::Playing, false) => "playing".to_string(),
        (CueState::Stopped, false) => "stopped".to_string(),
    };

    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    queue!(out, Print(" Rainwatch - ESP32 rain station\r\n\r\n"))?;
    queue!(out, Print(format!(" Temperature : {}\r\n", state.temperature)))?;
    queue!(out, Print(format!(" Humidity    : {}\r\n", state.humidity)))?;

    queue!(out, Print(" Status      : "))?;
    if state.status == ERROR_MARKER {
        queue!(out, SetForegroundColor(Color::Red))?;
    } else if state.series.values().last() == Some(&1) {
        queue!(out, SetForegroundColor(Color::Blue))?;
    }
    queue!(out, Print(&state.status), ResetColor, Print("\r\n"))?;

    queue!(out, Print(format!(" Updated     : {}\r\n", state.last_updated)))?;
    queue!(out, Print(format!(" Rain alert  : {audio_line}\r\n\r\n")))?;

    queue!(
        out,
        Print(format!(
            " Rain, last {} polls: {}\r\n",
            state.series.len(),
            sparkline(&state.series)
        ))
    )?;
    let labels = state.series.labels();
    match (labels.first(), labels.last()) {
        (Some(first), Some(last)) if first != last => {
            queue!(out, Print(format!("   {first} … {last}\r\n\r\n")))?;
        }
        (Some(first), _) => queue!(out, Print(format!("   since {first}\r\n\r\n")))?,
        _ => queue!(out, Print("\r\n"))?,
    }

    queue!(
        out,
        Print(format!(
            " Light: {}   Servo: {}°\r\n\r\n",
            if control.light_on { "ON" } else { "OFF" },
            control.servo_angle()
        ))
    )?;

    queue!(
        out,
        Print(" [l] light  [s] servo  [r] servo auto  [v] view logs  [d] download logs  [q] quit\r\n\r\n")
    )?;

    for notice in state.notices() {
        queue!(out, Print(format!(" {notice}\r\n")))?;
    }

    if let Some(log_text) = state.log_text() {
        queue!(out, Print("\r\n Device logs:\r\n"))?;
        for line in log_text.lines().take(LOG_ROWS) {
            queue!(out, Print(format!(" | {line}\r\n")))?;
        }
    }

    out.flush()
}

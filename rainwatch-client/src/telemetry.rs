//! Telemetry poller and device HTTP client.
//!
//! One client owns every request to the station: the `/rain` status
//! poll, the light/servo commands, and the log fetch. All failures are
//! folded into `DeviceError` at this boundary; nothing here panics or
//! throws past the operation that issued the request.

use chrono::{DateTime, Local};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::app::Feed;

/// Exact wire string the station reports while its sensor sees rain.
/// Any other status value is treated as "no rain".
pub const RAIN_DETECTED: &str = "Rain Detected";

/// Device-facing failure taxonomy.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("device returned {0}")]
    Status(StatusCode),
    #[error("malformed telemetry payload: {0}")]
    Payload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainStatus {
    RainDetected,
    NoRain,
}

impl RainStatus {
    pub fn from_wire(status: &str) -> Self {
        if status == RAIN_DETECTED {
            RainStatus::RainDetected
        } else {
            RainStatus::NoRain
        }
    }

    pub fn is_rain(self) -> bool {
        matches!(self, RainStatus::RainDetected)
    }
}

/// One successful observation. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct TelemetrySample {
    pub timestamp: DateTime<Local>,
    pub temperature: f64,
    pub humidity: f64,
    pub status: RainStatus,
    /// Raw status text as reported by the device, shown verbatim.
    pub status_text: String,
}

/// Result of one poll cycle, as handed to the presentation sink.
#[derive(Debug)]
pub enum PollOutcome {
    Sample(TelemetrySample),
    Failed(DeviceError),
}

/// Raw `/rain` payload (matches the station firmware's JSON).
#[derive(Debug, Deserialize)]
struct RainPayload {
    temperature: f64,
    humidity: f64,
    status: String,
}

#[derive(Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
}

impl DeviceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One poll of the `/rain` status endpoint.
    pub async fn fetch_status(&self) -> Result<TelemetrySample, DeviceError> {
        let response = self.http.get(self.url("/rain")).send().await?;
        if !response.status().is_success() {
            return Err(DeviceError::Status(response.status()));
        }

        let body = response.text().await?;
        let payload: RainPayload =
            serde_json::from_str(&body).map_err(|e| DeviceError::Payload(e.to_string()))?;

        Ok(TelemetrySample {
            timestamp: Local::now(),
            temperature: payload.temperature,
            humidity: payload.humidity,
            status: RainStatus::from_wire(&payload.status),
            status_text: payload.status,
        })
    }

    /// POST `/toggleLight` with `state=on|off`.
    pub async fn set_light(&self, on: bool) -> Result<(), DeviceError> {
        let state = if on { "on" } else { "off" };
        self.post_form("/toggleLight", &[("state", state)]).await
    }

    /// POST `/toggleServo` with `angle=0|90`.
    pub async fn set_servo(&self, angle: u8) -> Result<(), DeviceError> {
        let angle = angle.to_string();
        self.post_form("/toggleServo", &[("angle", angle.as_str())])
            .await
    }

    /// Bare POST `/resetServo`; returns the servo to autonomous control.
    pub async fn reset_servo(&self) -> Result<(), DeviceError> {
        let response = self.http.post(self.url("/resetServo")).send().await?;
        if !response.status().is_success() {
            return Err(DeviceError::Status(response.status()));
        }
        Ok(())
    }

    /// GET `/logs`, returning the rendered HTML fragment as-is.
    pub async fn fetch_logs(&self) -> Result<String, DeviceError> {
        let response = self.http.get(self.url("/logs")).send().await?;
        if !response.status().is_success() {
            return Err(DeviceError::Status(response.status()));
        }
        Ok(response.text().await?)
    }

    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<(), DeviceError> {
        let response = self.http.post(self.url(path)).form(fields).send().await?;
        if !response.status().is_success() {
            return Err(DeviceError::Status(response.status()));
        }
        Ok(())
    }
}

/// Launches one poll cycle. Every tick spawns its own request task and
/// reports through `tx` when the response resolves, so overlapping polls
/// are possible and outcomes arrive in resolution order, not issuance
/// order. A result arriving after the receiver is gone is discarded.
pub fn spawn_poll(client: &DeviceClient, feed: &UnboundedSender<Feed>) {
    let client = client.clone();
    let feed = feed.clone();
    tokio::spawn(async move {
        let outcome = match client.fetch_status().await {
            Ok(sample) => {
                debug!(
                    "poll ok: {} °C, {} %, {}",
                    sample.temperature, sample.humidity, sample.status_text
                );
                PollOutcome::Sample(sample)
            }
            Err(e) => {
                warn!("rain poll failed: {e}");
                PollOutcome::Failed(e)
            }
        };
        let _ = feed.send(Feed::Poll(outcome));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rain_status_recognizes_exact_wire_string() {
        assert_eq!(RainStatus::from_wire("Rain Detected"), RainStatus::RainDetected);
        assert!(RainStatus::from_wire("Rain Detected").is_rain());
    }

    #[test]
    fn test_rain_status_treats_everything_else_as_no_rain() {
        assert_eq!(RainStatus::from_wire("No Rain"), RainStatus::NoRain);
        assert_eq!(RainStatus::from_wire("rain detected"), RainStatus::NoRain);
        assert_eq!(RainStatus::from_wire(""), RainStatus::NoRain);
    }

    #[test]
    fn test_base_url_trailing_slash_normalized() {
        let client = DeviceClient::new("http://10.0.0.5/");
        assert_eq!(client.url("/rain"), "http://10.0.0.5/rain");
    }

    #[test]
    fn test_payload_parse_rejects_missing_fields() {
        let err = serde_json::from_str::<RainPayload>(r#"{"temperature": 20.0}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_payload_parse_accepts_station_json() {
        let payload: RainPayload =
            serde_json::from_str(r#"{"temperature":22.5,"humidity":60,"status":"No Rain"}"#)
                .unwrap();
        assert_eq!(payload.temperature, 22.5);
        assert_eq!(payload.humidity, 60.0);
        assert_eq!(payload.status, "No Rain");
    }
}

//! Mock rain station.
//!
//! Serves the same HTTP surface as the ESP32 firmware (`/rain`,
//! `/toggleLight`, `/toggleServo`, `/resetServo`, `/logs`,
//! `/downloadLogs`) against simulated device state, plus a
//! `/simulate/rain` switch for driving the rain flag in tests and
//! local development.

use axum::{
    routing::{get, post},
    Router,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub mod handlers;

pub type Shared<T> = Arc<Mutex<T>>;

/// Simulated device state, shared across handlers.
#[derive(Debug)]
pub struct DeviceState {
    pub raining: bool,
    pub base_temperature: f64,
    pub base_humidity: f64,
    pub light_on: bool,
    pub servo_angle: u8,
    /// True while a manual `/toggleServo` overrides the rain logic.
    pub servo_manual: bool,
    pub log_entries: Vec<String>,
    /// Poll counter, used to wobble the simulated readings.
    pub polls: u64,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            raining: false,
            base_temperature: 21.0,
            base_humidity: 55.0,
            light_on: false,
            servo_angle: 0,
            servo_manual: false,
            log_entries: vec!["boot: rain station online".to_string()],
            polls: 0,
        }
    }
}

pub fn new_state() -> Shared<DeviceState> {
    Arc::new(Mutex::new(DeviceState::default()))
}

pub fn build_router(device: Shared<DeviceState>) -> Router {
    Router::new()
        .route("/rain", get(handlers::rain))
        .route("/toggleLight", post(handlers::toggle_light))
        .route("/toggleServo", post(handlers::toggle_servo))
        .route("/resetServo", post(handlers::reset_servo))
        .route("/logs", get(handlers::logs))
        .route("/downloadLogs", get(handlers::download_logs))
        .route("/simulate/rain", post(handlers::simulate_rain))
        .with_state(device)
}

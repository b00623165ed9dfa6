//! Rainwatch client - terminal monitor for an ESP32 rain station
//!
//! The client polls the station's telemetry endpoint on a fixed
//! interval, keeps a bounded rolling series of rain observations,
//! renders a terminal dashboard with an audible rain alert, and
//! dispatches best-effort light/servo commands and log retrieval
//! independently of the poll cycle.

pub mod app;
pub mod audio;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod logs;
pub mod series;
pub mod telemetry;

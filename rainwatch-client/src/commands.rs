//! Control command dispatcher.
//!
//! Each command flips its local optimistic flag first, sends one
//! fire-and-forget request, and reports the result as a user-facing
//! notice. Flags are never rolled back on failure, so the displayed
//! state can diverge from the device until the next successful toggle.
//! Commands are not coordinated with the poller or with each other.

use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::app::Feed;
use crate::telemetry::{DeviceClient, DeviceError};

/// Client-side best guess of the actuator states. Mutated only on the
/// main loop, and only by the flip helpers below; never reconciled
/// against telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlState {
    pub light_on: bool,
    pub servo_at_90: bool,
}

impl ControlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the light flag, returning the new desired state.
    pub fn flip_light(&mut self) -> bool {
        self.light_on = !self.light_on;
        self.light_on
    }

    /// Flips the servo flag, returning the new desired angle.
    pub fn flip_servo(&mut self) -> u8 {
        self.servo_at_90 = !self.servo_at_90;
        if self.servo_at_90 {
            90
        } else {
            0
        }
    }

    pub fn servo_angle(&self) -> u8 {
        if self.servo_at_90 {
            90
        } else {
            0
        }
    }
}

/// Sends the already-flipped light state to the device.
pub fn spawn_toggle_light(client: &DeviceClient, on: bool, feed: &UnboundedSender<Feed>) {
    let client = client.clone();
    let feed = feed.clone();
    tokio::spawn(async move {
        let notice = match client.set_light(on).await {
            Ok(()) => format!("💡 Light turned {}", if on { "ON" } else { "OFF" }),
            Err(DeviceError::Status(code)) => {
                warn!("light toggle rejected: {code}");
                "❌ Failed to toggle light.".to_string()
            }
            Err(e) => {
                warn!("light toggle error: {e}");
                "❌ Light request failed.".to_string()
            }
        };
        let _ = feed.send(Feed::Notice(notice));
    });
}

/// Sends the already-computed servo angle to the device.
pub fn spawn_toggle_servo(client: &DeviceClient, angle: u8, feed: &UnboundedSender<Feed>) {
    let client = client.clone();
    let feed = feed.clone();
    tokio::spawn(async move {
        let notice = match client.set_servo(angle).await {
            Ok(()) => format!("🔧 Servo moved to {angle}°"),
            Err(DeviceError::Status(code)) => {
                warn!("servo toggle rejected: {code}");
                "❌ Failed to move servo.".to_string()
            }
            Err(e) => {
                warn!("servo toggle error: {e}");
                "❌ Servo request failed.".to_string()
            }
        };
        let _ = feed.send(Feed::Notice(notice));
    });
}

/// Returns the servo to autonomous control. Stateless: does not touch
/// the optimistic servo flag.
pub fn spawn_reset_servo(client: &DeviceClient, feed: &UnboundedSender<Feed>) {
    let client = client.clone();
    let feed = feed.clone();
    tokio::spawn(async move {
        let notice = match client.reset_servo().await {
            Ok(()) => "✅ Servo is now in Auto Mode.".to_string(),
            Err(DeviceError::Status(code)) => {
                warn!("servo reset rejected: {code}");
                "❌ Failed to reset servo.".to_string()
            }
            Err(e) => {
                warn!("servo reset error: {e}");
                "❌ Reset request failed.".to_string()
            }
        };
        let _ = feed.send(Feed::Notice(notice));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_light_toggle_round_trips() {
        let mut control = ControlState::new();
        assert!(!control.light_on);
        assert!(control.flip_light());
        assert!(!control.flip_light());
        assert!(!control.light_on);
    }

    #[test]
    fn test_servo_angle_sequence() {
        // starting from servo_at_90 = false: 0 -> 90 -> 0
        let mut control = ControlState::new();
        assert_eq!(control.servo_angle(), 0);
        assert_eq!(control.flip_servo(), 90);
        assert_eq!(control.flip_servo(), 0);
    }

    #[test]
    fn test_flags_are_independent() {
        let mut control = ControlState::new();
        control.flip_light();
        assert!(control.light_on);
        assert!(!control.servo_at_90);
    }
}

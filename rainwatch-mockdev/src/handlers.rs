use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{DeviceState, Shared};

/// GET /rain - telemetry payload, wire-identical to the firmware.
pub async fn rain(State(device): State<Shared<DeviceState>>) -> Json<serde_json::Value> {
    let mut state = device.lock();
    state.polls += 1;

    // Small deterministic wobble so consecutive polls differ a little.
    let wobble = (state.polls % 5) as f64 * 0.1;
    let temperature = state.base_temperature + wobble;
    let humidity = if state.raining {
        state.base_humidity + 25.0
    } else {
        state.base_humidity + wobble
    };
    let status = if state.raining { "Rain Detected" } else { "No Rain" };

    Json(json!({
        "temperature": temperature,
        "humidity": humidity,
        "status": status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LightForm {
    state: String,
}

/// POST /toggleLight with `state=on|off`.
pub async fn toggle_light(
    State(device): State<Shared<DeviceState>>,
    Form(form): Form<LightForm>,
) -> StatusCode {
    let on = match form.state.as_str() {
        "on" => true,
        "off" => false,
        _ => return StatusCode::BAD_REQUEST,
    };
    let mut state = device.lock();
    state.light_on = on;
    state
        .log_entries
        .push(format!("light switched {}", form.state));
    info!("light -> {}", form.state);
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
pub struct ServoForm {
    angle: u8,
}

/// POST /toggleServo with `angle=0|90`.
pub async fn toggle_servo(
    State(device): State<Shared<DeviceState>>,
    Form(form): Form<ServoForm>,
) -> StatusCode {
    if form.angle != 0 && form.angle != 90 {
        return StatusCode::BAD_REQUEST;
    }
    let mut state = device.lock();
    state.servo_angle = form.angle;
    state.servo_manual = true;
    state
        .log_entries
        .push(format!("servo moved to {} &lt;manual&gt;", form.angle));
    info!("servo -> {}°", form.angle);
    StatusCode::OK
}

/// POST /resetServo - back to autonomous control.
pub async fn reset_servo(State(device): State<Shared<DeviceState>>) -> StatusCode {
    let mut state = device.lock();
    state.servo_manual = false;
    state.servo_angle = 0;
    state.log_entries.push("servo reset &lt;auto&gt;".to_string());
    info!("servo -> auto");
    StatusCode::OK
}

/// GET /logs - rendered HTML fragment, angle brackets entity-encoded
/// the way the firmware renders them.
pub async fn logs(State(device): State<Shared<DeviceState>>) -> Html<String> {
    let state = device.lock();
    let mut html = String::from("<div class=\"logs\">\n");
    for entry in &state.log_entries {
        html.push_str(&format!("  <p>{entry}</p>\n"));
    }
    html.push_str("</div>\n");
    Html(html)
}

/// GET /downloadLogs - plain-text attachment.
pub async fn download_logs(State(device): State<Shared<DeviceState>>) -> impl IntoResponse {
    let state = device.lock();
    let body = state.log_entries.join("\n");
    (
        [
            (header::CONTENT_TYPE, "text/plain".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"rainstation.log\"".to_string(),
            ),
        ],
        body,
    )
}

/// POST /simulate/rain - toggles the simulated rain flag (dev only,
/// not part of the firmware surface).
pub async fn simulate_rain(State(device): State<Shared<DeviceState>>) -> Json<serde_json::Value> {
    let mut state = device.lock();
    state.raining = !state.raining;
    info!("simulated rain -> {}", state.raining);
    Json(json!({ "raining": state.raining }))
}

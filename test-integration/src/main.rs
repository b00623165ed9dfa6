//! End-to-end check of the rain station wire contract.
//!
//! Runs against a live device (usually rainwatch-mockdev) and walks the
//! full surface: telemetry poll, rain simulation, light and servo
//! toggles, servo reset, and log retrieval. Exits non-zero when any
//! check fails.
//!
//! Usage:
//!   cargo run -p rainwatch-mockdev &
//!   RAINWATCH_DEVICE_URL=http://127.0.0.1:8090 cargo run

use anyhow::{anyhow, Context, Result};
use log::{error, info};

struct Checker {
    http: reqwest::Client,
    base_url: String,
    failures: u32,
}

impl Checker {
    fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            failures: 0,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn check(&mut self, name: &str, result: Result<()>) {
        match result {
            Ok(()) => info!("✅ {name}"),
            Err(e) => {
                self.failures += 1;
                error!("❌ {name}: {e:#}");
            }
        }
    }

    async fn telemetry(&self, expect_rain: bool) -> Result<()> {
        let response = self.http.get(self.url("/rain")).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("status {}", response.status()));
        }
        let payload: serde_json::Value = response.json().await?;
        for field in ["temperature", "humidity"] {
            if !payload[field].is_number() {
                return Err(anyhow!("field '{field}' missing or not a number"));
            }
        }
        let status = payload["status"]
            .as_str()
            .ok_or_else(|| anyhow!("field 'status' missing"))?;
        let raining = status == "Rain Detected";
        if raining != expect_rain {
            return Err(anyhow!("expected rain={expect_rain}, got status '{status}'"));
        }
        Ok(())
    }

    async fn simulate_rain(&self) -> Result<()> {
        let response = self.http.post(self.url("/simulate/rain")).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("status {}", response.status()));
        }
        Ok(())
    }

    async fn form_command(&self, path: &str, fields: &[(&str, &str)]) -> Result<()> {
        let response = self.http.post(self.url(path)).form(fields).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("status {}", response.status()));
        }
        Ok(())
    }

    async fn bare_command(&self, path: &str) -> Result<()> {
        let response = self.http.post(self.url(path)).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("status {}", response.status()));
        }
        Ok(())
    }

    async fn logs(&self) -> Result<()> {
        let response = self.http.get(self.url("/logs")).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("status {}", response.status()));
        }
        let html = response.text().await?;
        if !html.contains('<') {
            return Err(anyhow!("expected an HTML fragment"));
        }
        Ok(())
    }

    async fn download(&self) -> Result<()> {
        let response = self.http.get(self.url("/downloadLogs")).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("status {}", response.status()));
        }
        let disposition = response
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !disposition.contains("attachment") {
            return Err(anyhow!("expected attachment disposition"));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let base_url = std::env::var("RAINWATCH_DEVICE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8090".to_string());
    info!("🚀 Checking rain station at {base_url}");

    let mut checker = Checker::new(base_url);

    let r = checker.telemetry(false).await;
    checker.check("telemetry poll (no rain)", r);

    let r = checker.simulate_rain().await;
    checker.check("rain simulation on", r);

    let r = checker.telemetry(true).await;
    checker.check("telemetry poll (rain detected)", r);

    let r = checker.simulate_rain().await;
    checker.check("rain simulation off", r);

    let r = checker.form_command("/toggleLight", &[("state", "on")]).await;
    checker.check("light on", r);

    let r = checker.form_command("/toggleLight", &[("state", "off")]).await;
    checker.check("light off", r);

    let r = checker.form_command("/toggleServo", &[("angle", "90")]).await;
    checker.check("servo to 90", r);

    let r = checker.bare_command("/resetServo").await;
    checker.check("servo reset to auto", r);

    let r = checker.logs().await;
    checker.check("log fetch", r);

    let r = checker.download().await;
    checker.check("log download", r);

    if checker.failures > 0 {
        Err(anyhow!("{} check(s) failed", checker.failures)).context("Wire contract broken")
    } else {
        info!("🎉 All wire contract checks passed");
        Ok(())
    }
}

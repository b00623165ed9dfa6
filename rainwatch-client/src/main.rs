use std::io;

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{info, warn};

use rainwatch_client::app::App;
use rainwatch_client::audio::PlayerSink;
use rainwatch_client::config::MonitorConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr so the dashboard owns stdout.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .init();

    let first_run = MonitorConfig::is_first_time_setup();
    let config = MonitorConfig::load().await.context("Failed to load config")?;
    if first_run {
        if let Err(e) = config.save().await {
            warn!("could not write initial config file: {e:#}");
        } else {
            info!("wrote default config to {:?}", MonitorConfig::config_file_path()?);
        }
    }

    let sink = PlayerSink::new(config.audio.player_command.clone());
    let mut app = App::new(config, Box::new(sink));

    let mut stdout = io::stdout();
    enable_raw_mode().context("Failed to enter raw mode")?;
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = app.run(&mut stdout).await;

    // Restore the terminal even when the loop errored out.
    let _ = execute!(stdout, Show, LeaveAlternateScreen);
    let _ = disable_raw_mode();

    result.context("Monitor loop failed")
}

//! Log retrieval: fetch-and-display and browser download handoff.

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::app::Feed;
use crate::telemetry::{DeviceClient, DeviceError};

/// Strips markup from the rendered log fragment: removes `<...>` tag
/// runs, decodes the two entities `&lt;`/`&gt;`, and trims surrounding
/// whitespace. Deliberately narrow; the log source only ever encodes
/// angle brackets, so this does not try to be an HTML parser.
pub fn sanitize_log_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&lt;", "<").replace("&gt;", ">").trim().to_string()
}

/// Fetches `/logs`, sanitizes it, and feeds the text pane. Failures
/// surface as a notice only.
pub fn spawn_view_logs(client: &DeviceClient, feed: &UnboundedSender<Feed>) {
    let client = client.clone();
    let feed = feed.clone();
    tokio::spawn(async move {
        match client.fetch_logs().await {
            Ok(html) => {
                let _ = feed.send(Feed::Logs(sanitize_log_html(&html)));
                let _ = feed.send(Feed::Notice("📄 Logs fetched and displayed.".into()));
            }
            Err(DeviceError::Status(code)) => {
                warn!("log fetch rejected: {code}");
                let _ = feed.send(Feed::Notice("❌ Failed to fetch logs.".into()));
            }
            Err(e) => {
                warn!("log fetch error: {e}");
                let _ = feed.send(Feed::Notice("❌ Log request failed.".into()));
            }
        }
    });
}

/// Hands `/downloadLogs` to the platform opener so the browser's native
/// download handling takes over. Fire-and-forget: no feedback path.
pub fn spawn_download_logs(base_url: &str) {
    let url = format!("{}/downloadLogs", base_url.trim_end_matches('/'));
    let mut command = if cfg!(target_os = "macos") {
        let mut c = tokio::process::Command::new("open");
        c.arg(&url);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", "start", &url]);
        c
    } else {
        let mut c = tokio::process::Command::new("xdg-open");
        c.arg(&url);
        c
    };

    match command.spawn() {
        Ok(_) => debug!("opened log download: {url}"),
        Err(e) => debug!("log download handoff failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_tags_and_decodes_angle_entities() {
        assert_eq!(sanitize_log_html("<div>5°C &lt;ok&gt;</div>"), "5°C <ok>");
    }

    #[test]
    fn test_sanitize_trims_whitespace() {
        assert_eq!(sanitize_log_html("  <p>line</p>  \n"), "line");
    }

    #[test]
    fn test_sanitize_keeps_inner_text_of_nested_markup() {
        let html = "<ul><li>10:00 rain</li><li>10:05 dry</li></ul>";
        assert_eq!(sanitize_log_html(html), "10:00 rain10:05 dry");
    }

    #[test]
    fn test_sanitize_only_decodes_angle_bracket_entities() {
        // &amp; is outside the documented entity set and passes through
        assert_eq!(sanitize_log_html("a &amp; b"), "a &amp; b");
    }

    #[test]
    fn test_sanitize_plain_text_untouched() {
        assert_eq!(sanitize_log_html("no markup here"), "no markup here");
    }
}

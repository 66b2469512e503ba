//! Chrome discovery and process launch.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::BrowserError;

const READY_ATTEMPTS: u32 = 30;
const READY_POLL: Duration = Duration::from_millis(200);

/// Locate a Chrome or Chromium executable on this machine.
///
/// Checks well-known install locations for the current OS, then falls back
/// to scanning PATH.
pub fn find_chrome() -> Option<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    };

    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    find_in_path(&["google-chrome", "google-chrome-stable", "chromium", "chrome"])
}

fn find_in_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Launch Chrome with remote debugging enabled.
///
/// The returned child is not yet guaranteed to accept DevTools connections;
/// callers should follow up with [`wait_until_ready`].
pub async fn launch_chrome(config: &BrowserConfig) -> Result<Child, BrowserError> {
    let chrome = config
        .chrome_path
        .clone()
        .or_else(find_chrome)
        .ok_or(BrowserError::ChromeNotFound)?;

    let profile_dir = config.resolve_profile_dir();
    tokio::fs::create_dir_all(&profile_dir)
        .await
        .map_err(|e| BrowserError::LaunchFailed(format!("profile dir: {e}")))?;

    let mut command = Command::new(&chrome);
    command
        .arg(format!("--remote-debugging-port={}", config.debug_port))
        .arg(format!("--user-data-dir={}", profile_dir.display()))
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-accelerated-2d-canvas")
        .arg("--no-first-run")
        .arg("--no-zygote")
        .arg("--disable-gpu")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    if config.headless {
        command.arg("--headless=new");
    }

    let child = command
        .spawn()
        .map_err(|e| BrowserError::LaunchFailed(format!("{}: {e}", chrome.display())))?;

    info!(
        path = %chrome.display(),
        port = config.debug_port,
        headless = config.headless,
        "launched chrome"
    );
    Ok(child)
}

/// Poll the DevTools HTTP endpoint until it answers.
pub async fn wait_until_ready(endpoint: &str) -> Result<(), BrowserError> {
    let url = format!("{endpoint}/json/version");
    let client = reqwest::Client::new();

    for attempt in 1..=READY_ATTEMPTS {
        match client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(attempt, "devtools endpoint ready");
                return Ok(());
            }
            Ok(response) => {
                debug!(attempt, status = %response.status(), "devtools endpoint not ready");
            }
            Err(e) => {
                debug!(attempt, error = %e, "devtools endpoint not ready");
            }
        }
        tokio::time::sleep(READY_POLL).await;
    }

    warn!(endpoint, "devtools endpoint never became ready");
    Err(BrowserError::EndpointUnreachable(endpoint.to_string()))
}

/// Whether a DevTools endpoint is already answering, e.g. from a previous run.
pub async fn endpoint_alive(endpoint: &str) -> bool {
    let url = format!("{endpoint}/json/version");
    match reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_secs(2))
        .send()
        .await
    {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

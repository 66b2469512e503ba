//! Browser handle configuration.

use std::path::PathBuf;

/// User agent presented to sites, matching a stock desktop Chrome.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for launching and attaching to Chrome.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Explicit Chrome executable; discovered from well-known paths when None.
    pub chrome_path: Option<PathBuf>,
    /// Remote debugging port.
    pub debug_port: u16,
    /// Run Chrome headless.
    pub headless: bool,
    /// Viewport width in CSS pixels.
    pub viewport_width: u32,
    /// Viewport height in CSS pixels.
    pub viewport_height: u32,
    /// User agent override applied to the page.
    pub user_agent: String,
    /// Profile directory; a per-user default is created when None.
    pub profile_dir: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            debug_port: 9222,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            profile_dir: None,
        }
    }
}

impl BrowserConfig {
    /// DevTools HTTP endpoint for this configuration.
    pub fn endpoint(&self) -> String {
        format!("http://127.0.0.1:{}", self.debug_port)
    }

    /// Profile directory, defaulting to ~/.tubepilot/browser-profile.
    pub fn resolve_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".tubepilot")
                .join("browser-profile")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrowserConfig::default();
        assert_eq!(config.debug_port, 9222);
        assert!(config.headless);
        assert_eq!(config.viewport_width, 1920);
        assert_eq!(config.viewport_height, 1080);
        assert!(config.user_agent.contains("Chrome/120"));
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_endpoint() {
        let config = BrowserConfig {
            debug_port: 9333,
            ..Default::default()
        };
        assert_eq!(config.endpoint(), "http://127.0.0.1:9333");
    }

    #[test]
    fn test_resolve_profile_dir_explicit() {
        let config = BrowserConfig {
            profile_dir: Some(PathBuf::from("/tmp/profile")),
            ..Default::default()
        };
        assert_eq!(config.resolve_profile_dir(), PathBuf::from("/tmp/profile"));
    }

    #[test]
    fn test_resolve_profile_dir_default() {
        let config = BrowserConfig::default();
        let dir = config.resolve_profile_dir();
        assert!(dir.ends_with("browser-profile"));
    }
}

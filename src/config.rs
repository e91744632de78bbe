//! Harness configuration
//!
//! Layered configuration: built-in defaults, then an optional YAML file,
//! then `CAREBOOK_*` environment variables. The file lives at
//! `<config dir>/carebook/config.yaml` unless a path is passed on the
//! command line.

use anyhow::{Context, Result};
use cdp_driver::DriverConfig;
use flow_runner::RunnerConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, warn};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://stage_ketamin.uat.provider.ecarehealth.com/";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HarnessConfig {
    /// Portal origin the flows run against
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Login credentials for the portal
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserSettings,

    /// Wait and deadline settings
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Failure artifact settings
    #[serde(default)]
    pub artifacts: ArtifactSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CredentialsConfig {
    /// Account email
    pub email: String,

    /// Account password
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BrowserSettings {
    /// Run without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Viewport width in pixels
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Viewport height in pixels
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Explicit Chrome binary, detected on PATH when unset
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Explicit profile directory, a workspace-local one when unset
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeoutSettings {
    /// Per-step deadline in milliseconds
    #[serde(default = "default_action_ms")]
    pub action_ms: u64,

    /// Navigation deadline in milliseconds
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,

    /// Quiet window for network-idle waits in milliseconds
    #[serde(default = "default_network_quiet_ms")]
    pub network_quiet_ms: u64,

    /// Deadline for probing steps marked optional
    #[serde(default = "default_optional_probe_ms")]
    pub optional_probe_ms: u64,

    /// Whole-flow deadline in milliseconds
    #[serde(default = "default_flow_ms")]
    pub flow_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ArtifactSettings {
    /// Directory failure artifacts are written to
    #[serde(default = "default_artifacts_dir")]
    pub dir: PathBuf,

    /// Capture a full-page screenshot when a flow fails
    #[serde(default = "default_screenshot_on_failure")]
    pub screenshot_on_failure: bool,
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base url parses")
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_action_ms() -> u64 {
    30_000
}

fn default_navigation_ms() -> u64 {
    60_000
}

fn default_network_quiet_ms() -> u64 {
    500
}

fn default_optional_probe_ms() -> u64 {
    5_000
}

fn default_flow_ms() -> u64 {
    300_000
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./carebook-artifacts")
}

fn default_screenshot_on_failure() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credentials: CredentialsConfig::default(),
            browser: BrowserSettings::default(),
            timeouts: TimeoutSettings::default(),
            artifacts: ArtifactSettings::default(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email: "amol.shete+TP@medarch.com".to_string(),
            password: "Test@123$".to_string(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            chrome_executable: None,
            profile_dir: None,
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            action_ms: default_action_ms(),
            navigation_ms: default_navigation_ms(),
            network_quiet_ms: default_network_quiet_ms(),
            optional_probe_ms: default_optional_probe_ms(),
            flow_ms: default_flow_ms(),
        }
    }
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            dir: default_artifacts_dir(),
            screenshot_on_failure: default_screenshot_on_failure(),
        }
    }
}

impl HarnessConfig {
    /// Browser launch settings in the driver's terms.
    pub fn driver_config(&self) -> DriverConfig {
        let mut driver = DriverConfig::default();
        driver.headless = self.browser.headless;
        driver.window_width = self.browser.window_width;
        driver.window_height = self.browser.window_height;
        driver.navigation_deadline_ms = self.timeouts.navigation_ms;
        if let Some(path) = &self.browser.chrome_executable {
            driver.executable = Some(path.clone());
        }
        if let Some(dir) = &self.browser.profile_dir {
            driver.user_data_dir = dir.clone();
        }
        driver
    }

    /// Step timing settings in the runner's terms.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            action_timeout_ms: self.timeouts.action_ms,
            optional_timeout_ms: self.timeouts.optional_probe_ms,
            network_quiet_ms: self.timeouts.network_quiet_ms,
            navigation_timeout_ms: self.timeouts.navigation_ms,
            ..RunnerConfig::default()
        }
    }
}

/// Loads configuration from the given path, or from the default location,
/// falling back to built-in defaults when no file exists. Environment
/// overrides are applied last.
pub async fn load_config(config_path: Option<&PathBuf>) -> Result<HarnessConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => {
            let mut path = dirs::config_dir().context("Failed to get config directory")?;
            path.push("carebook");
            path.push("config.yaml");
            path
        }
    };

    let mut config = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;

        let config: HarnessConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded configuration from: {}", config_path.display());
        config
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        HarnessConfig::default()
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Applies `CAREBOOK_*` environment variables on top of the loaded file.
pub fn apply_env_overrides(config: &mut HarnessConfig) -> Result<()> {
    if let Ok(raw) = env::var("CAREBOOK_BASE_URL") {
        config.base_url = Url::parse(raw.trim()).context("Invalid CAREBOOK_BASE_URL")?;
    }

    if let Ok(email) = env::var("CAREBOOK_EMAIL") {
        config.credentials.email = email;
    }

    if let Ok(password) = env::var("CAREBOOK_PASSWORD") {
        config.credentials.password = password;
    }

    if let Ok(raw) = env::var("CAREBOOK_HEADLESS") {
        let lower = raw.trim().to_ascii_lowercase();
        config.browser.headless = !matches!(lower.as_str(), "0" | "false" | "no" | "off");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_point_at_staging_portal() {
        let config = HarnessConfig::default();
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.credentials.email, "amol.shete+TP@medarch.com");
        assert!(config.browser.headless);
        assert_eq!(config.timeouts.flow_ms, 300_000);
        assert!(config.artifacts.screenshot_on_failure);
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
credentials:
  email: qa@example.com
  password: hunter2
timeouts:
  action_ms: 1000
"#;
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.credentials.email, "qa@example.com");
        assert_eq!(config.timeouts.action_ms, 1000);
        assert_eq!(config.timeouts.network_quiet_ms, 500);
        assert_eq!(config.base_url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    #[serial]
    fn test_env_overrides_take_precedence() {
        let saved_url = env::var("CAREBOOK_BASE_URL").ok();
        let saved_email = env::var("CAREBOOK_EMAIL").ok();
        env::set_var("CAREBOOK_BASE_URL", "https://qa.example.com/");
        env::set_var("CAREBOOK_EMAIL", "override@example.com");

        let mut config = HarnessConfig::default();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.base_url.as_str(), "https://qa.example.com/");
        assert_eq!(config.credentials.email, "override@example.com");

        match saved_url {
            Some(value) => env::set_var("CAREBOOK_BASE_URL", value),
            None => env::remove_var("CAREBOOK_BASE_URL"),
        }
        match saved_email {
            Some(value) => env::set_var("CAREBOOK_EMAIL", value),
            None => env::remove_var("CAREBOOK_EMAIL"),
        }
    }

    #[test]
    #[serial]
    fn test_invalid_base_url_override_is_rejected() {
        let saved = env::var("CAREBOOK_BASE_URL").ok();
        env::set_var("CAREBOOK_BASE_URL", "not a url");

        let mut config = HarnessConfig::default();
        assert!(apply_env_overrides(&mut config).is_err());

        match saved {
            Some(value) => env::set_var("CAREBOOK_BASE_URL", value),
            None => env::remove_var("CAREBOOK_BASE_URL"),
        }
    }

    #[test]
    fn test_driver_config_reflects_browser_settings() {
        let mut config = HarnessConfig::default();
        config.browser.headless = false;
        config.browser.window_width = 1280;
        config.browser.chrome_executable = Some(PathBuf::from("/opt/chrome"));
        config.timeouts.navigation_ms = 45_000;

        let driver = config.driver_config();
        assert!(!driver.headless);
        assert_eq!(driver.window_width, 1280);
        assert_eq!(driver.executable, Some(PathBuf::from("/opt/chrome")));
        assert_eq!(driver.navigation_deadline_ms, 45_000);

        let runner = config.runner_config();
        assert_eq!(runner.navigation_timeout_ms, 45_000);
        assert_eq!(runner.network_quiet_ms, 500);
    }
}

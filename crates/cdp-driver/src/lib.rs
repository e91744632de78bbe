//! Chromium driver for carebook flows.
//!
//! This crate owns the browser side of a run: it launches a managed Chromium
//! over the DevTools Protocol, resolves locators through injected probes,
//! dispatches real mouse and keyboard input, and tracks network activity so
//! callers can wait for the page to settle instead of sleeping.

use std::{env, path::PathBuf};
use which::which;

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by the driver.
    #[derive(Clone, Debug, Error, Serialize, Deserialize)]
    pub enum DriverErrorKind {
        #[error("browser launch failed")]
        Launch,
        #[error("navigation timed out")]
        NavTimeout,
        #[error("cdp i/o failure")]
        CdpIo,
        #[error("target element not found")]
        TargetNotFound,
        #[error("option not found")]
        OptionNotFound,
        #[error("script evaluation failed")]
        Eval,
        #[error("internal error")]
        Internal,
    }

    /// Enriched error metadata passed back to higher layers.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct DriverError {
        pub kind: DriverErrorKind,
        pub hint: Option<String>,
        pub retriable: bool,
    }

    impl fmt::Display for DriverError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for DriverError {}

    impl DriverError {
        pub fn new(kind: DriverErrorKind) -> Self {
            Self {
                kind,
                hint: None,
                retriable: false,
            }
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }

        pub fn retriable(mut self, flag: bool) -> Self {
            self.retriable = flag;
            self
        }
    }

    pub type DriverResult<T> = Result<T, DriverError>;
}

pub mod config {
    use crate::detect_chrome_executable;
    use serde::{Deserialize, Serialize};
    use std::{env, path::PathBuf};

    /// Configuration for launching and tuning the driver.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct DriverConfig {
        pub executable: Option<PathBuf>,
        pub user_data_dir: PathBuf,
        pub headless: bool,
        pub window_width: u32,
        pub window_height: u32,
        pub navigation_deadline_ms: u64,
        pub request_timeout_ms: u64,
        pub launch_timeout_ms: u64,
        pub poll_interval_ms: u64,
    }

    impl Default for DriverConfig {
        fn default() -> Self {
            Self {
                executable: detect_chrome_executable(),
                user_data_dir: default_profile_dir(),
                headless: resolve_headless_default(),
                window_width: 1920,
                window_height: 1080,
                navigation_deadline_ms: 60_000,
                request_timeout_ms: 30_000,
                launch_timeout_ms: 20_000,
                poll_interval_ms: 100,
            }
        }
    }

    fn resolve_headless_default() -> bool {
        // CAREBOOK_HEADLESS: "0", "false", "no", "off" means headful
        match env::var("CAREBOOK_HEADLESS") {
            Ok(value) => {
                let lower = value.to_ascii_lowercase();
                !matches!(lower.as_str(), "0" | "false" | "no" | "off")
            }
            Err(_) => true,
        }
    }

    fn default_profile_dir() -> PathBuf {
        if let Ok(path) = env::var("CAREBOOK_CHROME_PROFILE") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        PathBuf::from("./.carebook-profile")
    }
}

pub mod watch {
    //! Light network tap: counts in-flight requests and remembers the last
    //! time anything moved on the wire, which is all a quiet-window wait
    //! needs.

    use std::time::{Duration, Instant};
    use tokio::sync::Mutex;

    /// Network lifecycle signals mirrored from the DevTools `Network` domain.
    #[derive(Clone, Copy, Debug)]
    pub enum NetEvent {
        RequestWillBeSent,
        ResponseReceived,
        LoadingFinished,
        LoadingFailed,
    }

    /// Point-in-time view of the tap, used for timeout hints.
    #[derive(Clone, Copy, Debug)]
    pub struct NetSnapshot {
        pub inflight: u64,
        pub since_last_activity: Duration,
    }

    struct Counters {
        inflight: u64,
        last_activity: Instant,
    }

    pub struct NetWatch {
        counters: Mutex<Counters>,
    }

    impl NetWatch {
        pub fn new() -> Self {
            Self {
                counters: Mutex::new(Counters {
                    inflight: 0,
                    last_activity: Instant::now(),
                }),
            }
        }

        pub async fn record(&self, event: NetEvent) {
            let mut counters = self.counters.lock().await;
            match event {
                NetEvent::RequestWillBeSent => counters.inflight += 1,
                NetEvent::ResponseReceived => {}
                NetEvent::LoadingFinished | NetEvent::LoadingFailed => {
                    counters.inflight = counters.inflight.saturating_sub(1);
                }
            }
            counters.last_activity = Instant::now();
        }

        /// True when nothing is in flight and the wire has been silent for at
        /// least `window`.
        pub async fn quiet(&self, window: Duration) -> bool {
            let counters = self.counters.lock().await;
            counters.inflight == 0 && counters.last_activity.elapsed() >= window
        }

        pub async fn snapshot(&self) -> NetSnapshot {
            let counters = self.counters.lock().await;
            NetSnapshot {
                inflight: counters.inflight,
                since_last_activity: counters.last_activity.elapsed(),
            }
        }
    }

    impl Default for NetWatch {
        fn default() -> Self {
            Self::new()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn quiet_requires_empty_inflight_and_elapsed_window() {
            let watch = NetWatch::new();
            watch.record(NetEvent::RequestWillBeSent).await;
            tokio::time::sleep(Duration::from_millis(60)).await;
            assert!(!watch.quiet(Duration::from_millis(30)).await);

            watch.record(NetEvent::LoadingFinished).await;
            assert!(!watch.quiet(Duration::from_millis(30)).await);

            tokio::time::sleep(Duration::from_millis(60)).await;
            assert!(watch.quiet(Duration::from_millis(30)).await);
        }

        #[tokio::test]
        async fn failed_loads_release_inflight_slots() {
            let watch = NetWatch::new();
            watch.record(NetEvent::RequestWillBeSent).await;
            watch.record(NetEvent::RequestWillBeSent).await;
            watch.record(NetEvent::LoadingFailed).await;
            watch.record(NetEvent::LoadingFinished).await;
            // a stray completion must not underflow
            watch.record(NetEvent::LoadingFinished).await;
            let snapshot = watch.snapshot().await;
            assert_eq!(snapshot.inflight, 0);
        }

        #[tokio::test]
        async fn responses_refresh_activity_without_completing() {
            let watch = NetWatch::new();
            watch.record(NetEvent::RequestWillBeSent).await;
            watch.record(NetEvent::ResponseReceived).await;
            let snapshot = watch.snapshot().await;
            assert_eq!(snapshot.inflight, 1);
        }
    }
}

pub mod driver {
    use async_trait::async_trait;
    use element_locator::{ElementHit, Locator};

    use crate::error::DriverResult;

    /// Page-level operations a flow runs against.
    ///
    /// Implementations own the browser session; callers reason only in
    /// locators and millisecond bounds, which keeps the runner testable
    /// without a browser.
    #[async_trait]
    pub trait PageDriver: Send + Sync {
        /// Navigate the active page and wait for the document to become
        /// usable.
        async fn goto(&self, url: &str) -> DriverResult<()>;

        /// Look for a visible element matching `locator`, without waiting.
        async fn probe(&self, locator: &Locator) -> DriverResult<Option<ElementHit>>;

        /// Click the center of the first visible match.
        async fn click(&self, locator: &Locator) -> DriverResult<()>;

        /// Focus the first visible match and replace its content with `text`.
        async fn type_text(&self, locator: &Locator, text: &str) -> DriverResult<()>;

        /// Choose `option` on the first visible `<select>` match.
        async fn select_option(&self, locator: &Locator, option: &str) -> DriverResult<()>;

        /// Wait until the document ready state is interactive or complete.
        async fn wait_dom_ready(&self, deadline_ms: u64) -> DriverResult<()>;

        /// Wait until no request has been in flight for `quiet_ms`.
        async fn wait_network_quiet(&self, quiet_ms: u64, deadline_ms: u64) -> DriverResult<()>;

        /// Capture a PNG of the current viewport.
        async fn screenshot(&self) -> DriverResult<Vec<u8>>;
    }
}

mod chromium;

pub use chromium::ChromiumDriver;
pub use config::DriverConfig;
pub use driver::PageDriver;
pub use error::{DriverError, DriverErrorKind, DriverResult};
pub use watch::{NetEvent, NetSnapshot, NetWatch};

/// Locate a usable Chromium binary.
///
/// Order: `CAREBOOK_CHROME` override, well-known executable names on `PATH`,
/// then OS-specific install locations unless `CAREBOOK_SKIP_OS_PATHS` is set.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("CAREBOOK_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var("CAREBOOK_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);

    if !skip_defaults {
        for candidate in os_specific_chrome_paths() {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(any(target_os = "macos", target_os = "linux", target_os = "freebsd"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        &["chrome"]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for root in windows_search_roots() {
            paths.push(root.join("Google/Chrome/Application/chrome.exe"));
            paths.push(root.join("Chromium/Application/chrome.exe"));
            paths.push(root.join("Microsoft/Edge/Application/msedge.exe"));
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        Vec::new()
    }
}

#[cfg(target_os = "windows")]
fn windows_search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                roots.push(PathBuf::from(trimmed));
            }
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::{chrome_executable_names, detect_chrome_executable};
    use serial_test::serial;
    use std::{env, fs};
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn detects_from_env_var() {
        let dir = tempdir().unwrap();
        let exe_path = dir.path().join("my-chrome");
        fs::write(&exe_path, b"").unwrap();
        let original = env::var("CAREBOOK_CHROME").ok();
        env::set_var("CAREBOOK_CHROME", exe_path.to_string_lossy().to_string());
        let detected = detect_chrome_executable();
        if let Some(value) = original {
            env::set_var("CAREBOOK_CHROME", value);
        } else {
            env::remove_var("CAREBOOK_CHROME");
        }
        assert_eq!(detected, Some(exe_path));
    }

    #[test]
    #[serial]
    fn detects_from_path_entries() {
        let dir = tempdir().unwrap();
        let name = chrome_executable_names()
            .first()
            .expect("chrome executable names must not be empty");
        let exe_path = dir.path().join(name);
        fs::write(&exe_path, b"").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o755);
            fs::set_permissions(&exe_path, perms).unwrap();
        }
        let original_path = env::var("PATH").ok();
        let original_env = env::var("CAREBOOK_CHROME").ok();
        let skip_flag = env::var("CAREBOOK_SKIP_OS_PATHS").ok();
        env::set_var("CAREBOOK_CHROME", "");
        env::set_var("CAREBOOK_SKIP_OS_PATHS", "1");
        env::set_var("PATH", dir.path());
        let detected = detect_chrome_executable();
        if let Some(value) = original_path {
            env::set_var("PATH", value);
        }
        if let Some(value) = original_env {
            env::set_var("CAREBOOK_CHROME", value);
        } else {
            env::remove_var("CAREBOOK_CHROME");
        }
        if let Some(value) = skip_flag {
            env::set_var("CAREBOOK_SKIP_OS_PATHS", value);
        } else {
            env::remove_var("CAREBOOK_SKIP_OS_PATHS");
        }
        assert_eq!(detected, Some(exe_path));
    }
}

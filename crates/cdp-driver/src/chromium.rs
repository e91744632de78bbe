//! Concrete [`PageDriver`] backed by a managed Chromium instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
    EventResponseReceived,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use element_locator::{js, ElementHit, Locator, ProbeOutcome};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::detect_chrome_executable;
use crate::driver::PageDriver;
use crate::error::{DriverError, DriverErrorKind, DriverResult};
use crate::watch::{NetEvent, NetWatch};

/// Drives a single page in a Chromium it launched itself.
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    watch: Arc<NetWatch>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    config: DriverConfig,
}

impl ChromiumDriver {
    /// Launch Chromium, open a blank page, set the viewport and start the
    /// network tap.
    pub async fn launch(config: DriverConfig) -> DriverResult<Self> {
        let browser_config = build_browser_config(&config)?;
        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|err| {
            DriverError::new(DriverErrorKind::Launch)
                .with_hint(format!("chromium failed to start: {err}"))
        })?;
        info!(target: "cdp-driver", headless = config.headless, "chromium launched");

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        let drain_cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = drain_cancel.cancelled() => break,
                    message = handler.next() => match message {
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            debug!(target: "cdp-driver", %err, "handler event error");
                        }
                        None => break,
                    },
                }
            }
        }));

        let page = browser.new_page("about:blank").await.map_err(|err| {
            DriverError::new(DriverErrorKind::Launch)
                .with_hint(format!("initial page failed to open: {err}"))
        })?;

        page.execute(EnableParams::default())
            .await
            .map_err(|err| cdp_io("Network.enable failed", err))?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(config.window_width))
            .height(i64::from(config.window_height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(|err| DriverError::new(DriverErrorKind::Internal).with_hint(err))?;
        page.execute(metrics)
            .await
            .map_err(|err| cdp_io("viewport override failed", err))?;

        let watch = Arc::new(NetWatch::new());
        tasks.push(spawn_network_tap(&page, Arc::clone(&watch), cancel.clone()).await?);

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            watch,
            cancel,
            tasks: Mutex::new(tasks),
            config,
        })
    }

    /// Shut the browser down and stop the background tasks.
    pub async fn close(&self) -> DriverResult<()> {
        self.cancel.cancel();
        {
            let mut browser = self.browser.lock().await;
            if let Err(err) = browser.close().await {
                warn!(target: "cdp-driver", %err, "browser close failed");
            }
            if let Err(err) = browser.wait().await {
                debug!(target: "cdp-driver", %err, "browser did not exit cleanly");
            }
        }
        for task in self.tasks.lock().await.drain(..) {
            task.abort();
        }
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, expression: String, what: &str) -> DriverResult<T> {
        let evaluation = self.page.evaluate(expression).await.map_err(|err| {
            DriverError::new(DriverErrorKind::Eval).with_hint(format!("{what}: {err}"))
        })?;
        evaluation.into_value::<T>().map_err(|err| {
            DriverError::new(DriverErrorKind::Eval)
                .with_hint(format!("{what}: unexpected result shape: {err}"))
        })
    }

    async fn dispatch_mouse(
        &self,
        kind: DispatchMouseEventType,
        hit: ElementHit,
    ) -> DriverResult<()> {
        let params = DispatchMouseEventParams::builder()
            .r#type(kind)
            .x(hit.x)
            .y(hit.y)
            .button(MouseButton::Left)
            .buttons(1)
            .click_count(1)
            .build()
            .map_err(|err| DriverError::new(DriverErrorKind::Internal).with_hint(err))?;
        self.page
            .execute(params)
            .await
            .map_err(|err| cdp_io("mouse event dispatch failed", err))?;
        Ok(())
    }
}

impl Drop for ChromiumDriver {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Ok(mut tasks) = self.tasks.try_lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        let deadline_ms = self.config.navigation_deadline_ms;
        match tokio::time::timeout(Duration::from_millis(deadline_ms), self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                return Err(cdp_io(&format!("navigation to {url} failed"), err));
            }
            Err(_) => {
                return Err(DriverError::new(DriverErrorKind::NavTimeout)
                    .with_hint(format!("navigation to {url} exceeded {deadline_ms}ms"))
                    .retriable(true));
            }
        }
        self.wait_dom_ready(deadline_ms).await
    }

    async fn probe(&self, locator: &Locator) -> DriverResult<Option<ElementHit>> {
        let outcome: ProbeOutcome = self
            .eval(js::probe_expression(locator), "element probe failed")
            .await?;
        Ok(outcome.into_hit())
    }

    async fn click(&self, locator: &Locator) -> DriverResult<()> {
        let hit = self.probe(locator).await?.ok_or_else(|| {
            DriverError::new(DriverErrorKind::TargetNotFound)
                .with_hint(format!("click target not found for locator '{locator}'"))
        })?;
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, hit)
            .await?;
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, hit)
            .await?;
        debug!(target: "cdp-driver", %locator, x = hit.x, y = hit.y, "clicked");
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> DriverResult<()> {
        let outcome: ProbeOutcome = self
            .eval(js::focus_expression(locator), "focus failed")
            .await?;
        match outcome.status.as_str() {
            "focused" => {}
            "not-found" => {
                return Err(DriverError::new(DriverErrorKind::TargetNotFound)
                    .with_hint(format!("type target not found for locator '{locator}'")));
            }
            other => {
                return Err(DriverError::new(DriverErrorKind::Internal)
                    .with_hint(format!("unexpected focus status '{other}'")));
            }
        }
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(|err| cdp_io("text insertion failed", err))?;
        debug!(target: "cdp-driver", %locator, chars = text.len(), "typed");
        Ok(())
    }

    async fn select_option(&self, locator: &Locator, option: &str) -> DriverResult<()> {
        let outcome: ProbeOutcome = self
            .eval(
                js::select_option_expression(locator, option),
                "option selection failed",
            )
            .await?;
        match outcome.status.as_str() {
            "selected" => {
                debug!(target: "cdp-driver", %locator, option, "selected");
                Ok(())
            }
            "option-missing" => Err(DriverError::new(DriverErrorKind::OptionNotFound)
                .with_hint(format!(
                    "option '{option}' not available for locator '{locator}'"
                ))),
            "not-found" => Err(DriverError::new(DriverErrorKind::TargetNotFound)
                .with_hint(format!("select target not found for locator '{locator}'"))),
            other => Err(DriverError::new(DriverErrorKind::Internal)
                .with_hint(format!("unexpected select status '{other}'"))),
        }
    }

    async fn wait_dom_ready(&self, deadline_ms: u64) -> DriverResult<()> {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        loop {
            if Instant::now() >= deadline {
                return Err(DriverError::new(DriverErrorKind::NavTimeout)
                    .with_hint(format!("document not ready after {deadline_ms}ms"))
                    .retriable(true));
            }
            match self.page.evaluate("document.readyState").await {
                Ok(evaluation) => {
                    if let Ok(state) = evaluation.into_value::<String>() {
                        if matches!(state.as_str(), "interactive" | "complete") {
                            return Ok(());
                        }
                    }
                }
                Err(err) => {
                    // evaluation fails while the execution context swaps out
                    debug!(target: "cdp-driver", %err, "ready-state probe failed");
                }
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn wait_network_quiet(&self, quiet_ms: u64, deadline_ms: u64) -> DriverResult<()> {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        let window = Duration::from_millis(quiet_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        loop {
            if Instant::now() >= deadline {
                let snapshot = self.watch.snapshot().await;
                return Err(DriverError::new(DriverErrorKind::NavTimeout)
                    .with_hint(format!(
                        "network never settled: {} request(s) in flight after {deadline_ms}ms",
                        snapshot.inflight
                    ))
                    .retriable(true));
            }
            if self.watch.quiet(window).await {
                return Ok(());
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await
            .map_err(|err| cdp_io("screenshot capture failed", err))
    }
}

async fn spawn_network_tap(
    page: &Page,
    watch: Arc<NetWatch>,
    cancel: CancellationToken,
) -> DriverResult<JoinHandle<()>> {
    let mut requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(|err| cdp_io("network event subscription failed", err))?;
    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|err| cdp_io("network event subscription failed", err))?;
    let mut finished = page
        .event_listener::<EventLoadingFinished>()
        .await
        .map_err(|err| cdp_io("network event subscription failed", err))?;
    let mut failed = page
        .event_listener::<EventLoadingFailed>()
        .await
        .map_err(|err| cdp_io("network event subscription failed", err))?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(_) = requests.next() => watch.record(NetEvent::RequestWillBeSent).await,
                Some(_) = responses.next() => watch.record(NetEvent::ResponseReceived).await,
                Some(_) = finished.next() => watch.record(NetEvent::LoadingFinished).await,
                Some(_) = failed.next() => watch.record(NetEvent::LoadingFailed).await,
                else => break,
            }
        }
    }))
}

fn build_browser_config(cfg: &DriverConfig) -> DriverResult<BrowserConfig> {
    let executable = match &cfg.executable {
        Some(path) => path.clone(),
        None => detect_chrome_executable().ok_or_else(|| {
            DriverError::new(DriverErrorKind::Launch).with_hint(
                "no chromium executable found; install Chrome or set CAREBOOK_CHROME",
            )
        })?,
    };
    if !executable.exists() {
        return Err(DriverError::new(DriverErrorKind::Launch).with_hint(format!(
            "chrome executable not found at {}",
            executable.display()
        )));
    }

    let profile_dir = if cfg.user_data_dir.is_absolute() {
        cfg.user_data_dir.clone()
    } else {
        let cwd = std::env::current_dir().map_err(|err| {
            DriverError::new(DriverErrorKind::Internal)
                .with_hint(format!("failed to resolve cwd for user-data-dir: {err}"))
        })?;
        cwd.join(&cfg.user_data_dir)
    };
    std::fs::create_dir_all(&profile_dir).map_err(|err| {
        DriverError::new(DriverErrorKind::Internal)
            .with_hint(format!("failed to ensure user-data-dir: {err}"))
    })?;

    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_millis(cfg.request_timeout_ms))
        .launch_timeout(Duration::from_millis(cfg.launch_timeout_ms));

    if !cfg.headless {
        builder = builder.with_head();
    }

    if std::env::var("CAREBOOK_DISABLE_SANDBOX")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
    {
        builder = builder.no_sandbox();
    }

    let mut args = vec![
        "--disable-background-networking".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-breakpad".to_string(),
        "--disable-client-side-phishing-detection".to_string(),
        "--disable-component-update".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-extensions".to_string(),
        "--disable-hang-monitor".to_string(),
        "--disable-popup-blocking".to_string(),
        "--disable-prompt-on-repost".to_string(),
        "--disable-sync".to_string(),
        "--metrics-recording-only".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--password-store=basic".to_string(),
        "--remote-allow-origins=*".to_string(),
        "--use-mock-keychain".to_string(),
        format!("--window-size={},{}", cfg.window_width, cfg.window_height),
    ];
    if cfg.headless {
        args.push("--headless=new".to_string());
        args.push("--hide-scrollbars".to_string());
        args.push("--mute-audio".to_string());
    }
    builder = builder.args(args);

    builder = builder.chrome_executable(executable);
    builder = builder.user_data_dir(profile_dir);

    builder.build().map_err(|err| {
        DriverError::new(DriverErrorKind::Internal)
            .with_hint(format!("browser config error: {err}"))
    })
}

fn cdp_io(what: &str, err: impl std::fmt::Display) -> DriverError {
    DriverError::new(DriverErrorKind::CdpIo).with_hint(format!("{what}: {err}"))
}

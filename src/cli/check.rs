use crate::config::HarnessConfig;
use anyhow::{bail, Result};

pub async fn cmd_check(config: &HarnessConfig) -> Result<()> {
    println!("Carebook Harness");
    println!("================");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("BUILD_DATE", "unknown"));
    println!("Git Commit: {}", env!("GIT_HASH", "unknown"));
    println!();

    println!("Configuration:");
    println!("- Portal: {}", config.base_url);
    println!("- Account: {}", config.credentials.email);
    println!("- Headless: {}", config.browser.headless);
    println!(
        "- Viewport: {}x{}",
        config.browser.window_width, config.browser.window_height
    );
    println!("- Action timeout: {}ms", config.timeouts.action_ms);
    println!("- Navigation timeout: {}ms", config.timeouts.navigation_ms);
    println!("- Flow timeout: {}ms", config.timeouts.flow_ms);
    println!("- Artifacts: {}", config.artifacts.dir.display());
    println!();

    let chrome = config
        .browser
        .chrome_executable
        .clone()
        .or_else(cdp_driver::detect_chrome_executable);

    match chrome {
        Some(path) => {
            println!("Chrome: {}", path.display());
            Ok(())
        }
        None => {
            println!("Chrome: not found");
            bail!("no Chrome executable found; set CAREBOOK_CHROME or pass --chrome to `carebook run`")
        }
    }
}

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where an already-running Chrome with remote debugging is expected.
const ATTACH_URL: &str = "http://127.0.0.1:9222";

/// Persistent browser session. Created once at startup, reused for every
/// capture; the tab is only replaced when the user clears the session.
pub struct BrowserSession {
    _browser: Browser,
    pub tab: Arc<Tab>,
}

impl BrowserSession {
    /// Attach to a running Chrome on port 9222 if there is one, otherwise
    /// launch our own instance with a persistent profile.
    ///
    /// Script execution, DOM storage and default caching are Chrome defaults
    /// and stay enabled; the page scripts we inject depend on them.
    pub fn launch(headless: bool, chrome_path: Option<PathBuf>) -> Result<Self> {
        eprintln!("[Chrome] Attempting to attach to existing Chrome on port 9222...");
        if let Ok(browser) = Browser::connect(ATTACH_URL.to_string()) {
            eprintln!("[Chrome] Attached to existing Chrome.");

            let tab = {
                let tabs_lock = browser.get_tabs();
                let tabs = tabs_lock.lock().unwrap();
                if let Some(t) = tabs.first() {
                    eprintln!("[Chrome] Using existing tab.");
                    t.clone()
                } else {
                    eprintln!("[Chrome] No tabs found, creating new one.");
                    browser.new_tab()?
                }
            };

            return Ok(Self {
                _browser: browser,
                tab,
            });
        }

        eprintln!("[Chrome] Could not attach. Launching a dedicated instance...");

        let profile = profile_dir()?;
        std::fs::create_dir_all(&profile)
            .with_context(|| format!("creating profile dir {profile:?}"))?;

        let options = LaunchOptions {
            headless,
            path: chrome_path,
            user_data_dir: Some(profile),
            args: vec![
                OsStr::new("--no-first-run"),
                OsStr::new("--no-default-browser-check"),
            ],
            // Interactive tool: the user may leave the window idle for a
            // long time between captures.
            idle_browser_timeout: Duration::from_secs(3600),
            ..Default::default()
        };

        let browser = Browser::new(options).map_err(|e| {
            eprintln!("[Chrome] Browser launch failed: {}", e);
            anyhow::anyhow!("Browser launch failed: {}", e)
        })?;

        eprintln!("[Chrome] Chrome started, creating tab...");
        let tab = browser.new_tab()?;
        tab.navigate_to("about:blank")?;

        eprintln!("[Chrome] Chrome ready.");

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    /// Drop the current tab (and its navigation history) and start from a
    /// blank one.
    pub fn reset(&mut self) -> Result<()> {
        let tab = self._browser.new_tab()?;
        tab.navigate_to("about:blank")?;
        self.tab = tab;
        Ok(())
    }
}

/// Dedicated profile so we never lock the user's real browser profile, and
/// logins persist between runs.
fn profile_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("no local data directory on this platform"))?;
    Ok(base.join("page-inspector").join("profile"))
}

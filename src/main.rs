mod extract;
mod face;
mod hands;
mod session;
mod snapshot;

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use extract::PageBridge;
use face::{UiCommand, UiEvent};
use session::{CaptureSession, SubmitAction};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;

/// Inspect the interactive elements of a web page through a real Chrome
/// session: load a URL, let the page settle, then capture its inputs,
/// buttons and selects as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Base port for the web UI (falls forward to the next free port).
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Run Chrome headless instead of opening a window.
    #[arg(long)]
    headless: bool,

    /// Explicit path to the Chrome executable.
    #[arg(long)]
    chrome: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    eprintln!("[Inspector] Starting page inspector...");

    // 1. Launch web UI first (so user sees something immediately)
    let (mut cmd_rx, event_tx) = face::start_server(args.port).await;

    // 2. Launch browser in a blocking task (it can take a while)
    eprintln!("[Inspector] Launching Chrome...");
    let chrome = args
        .chrome
        .or_else(|| std::env::var_os("INSPECTOR_CHROME").map(PathBuf::from));
    let headless = args.headless;
    let browser =
        tokio::task::spawn_blocking(move || hands::BrowserSession::launch(headless, chrome))
            .await
            .map_err(|e| anyhow::anyhow!("Browser launch panicked: {}", e))??;
    eprintln!("[Inspector] Chrome launched successfully.");

    let mut inspector = Inspector {
        session: CaptureSession::new(),
        browser,
        events: event_tx,
    };

    eprintln!("[Inspector] Ready. Waiting for commands...");

    // 3. Process commands from the web UI, one at a time. A second GET INFO
    // arriving while a capture is settling queues behind it; nothing is
    // debounced or cancelled.
    while let Some(command) = cmd_rx.recv().await {
        match command {
            UiCommand::GetInfo { url } => inspector.get_info(&url).await,
            UiCommand::Clear => inspector.clear(),
        }
    }

    Ok(())
}

/// Owns the capture session, the browser and the display channel. Everything
/// that mutates session state or the display runs on the one command loop.
struct Inspector {
    session: CaptureSession,
    browser: hands::BrowserSession,
    events: broadcast::Sender<UiEvent>,
}

impl Inspector {
    fn display(&self, text: impl Into<String>) {
        let _ = self.events.send(UiEvent::Display { text: text.into() });
    }

    async fn get_info(&mut self, raw_url: &str) {
        match self.session.submit(raw_url) {
            SubmitAction::Reject { message } => {
                eprintln!("[Inspector] Rejected input: {}", message);
                self.display(message);
            }
            SubmitAction::LoadAndCapture { url, settle_ms } => {
                self.display("Loading page...");
                let tab = self.browser.tab.clone();
                let nav = tokio::task::spawn_blocking(move || -> Result<()> {
                    tab.navigate_to(&url)?;
                    Ok(())
                })
                .await;
                match nav {
                    Ok(Ok(())) => eprintln!("[Inspector] Page load started."),
                    // No load-failure signal in this flow: extraction still
                    // runs after the settle delay and captures whatever DOM
                    // is there (error page included).
                    Ok(Err(e)) => eprintln!("[Inspector] Warning: navigation failed: {:#}", e),
                    Err(e) => eprintln!("[Inspector] Warning: navigation task panicked: {}", e),
                }
                self.capture_after(settle_ms).await;
            }
            SubmitAction::Recapture { settle_ms } => {
                self.display("Capturing current page state...");
                self.capture_after(settle_ms).await;
            }
        }
    }

    /// Let the page settle, then run one extraction. The fixed delay stands
    /// in for a load-complete signal on purpose: Chrome's own notification
    /// fires on network completion, not when client-side rendering is done.
    async fn capture_after(&mut self, settle_ms: u64) {
        tokio::time::sleep(Duration::from_millis(settle_ms)).await;

        let tab = self.browser.tab.clone();
        let page = self.session.next_page();
        let result = tokio::task::spawn_blocking(move || extract::run(&tab, page)).await;

        match result {
            Ok(Ok(envelope)) => extract::deliver(&envelope, self),
            Ok(Err(e)) => self.on_error(format!("{:#}", e)),
            Err(e) => self.on_error(format!("extraction task panicked: {}", e)),
        }
    }

    fn clear(&mut self) {
        self.session.clear();
        self.display(session::INITIAL_PROMPT);
        if let Err(e) = self.browser.reset() {
            eprintln!("[Inspector] Warning: failed to reset browser tab: {:#}", e);
        }
    }
}

impl PageBridge for Inspector {
    fn on_page_info(&mut self, snapshot_json: String) {
        eprintln!(
            "[Bridge] Received page {} ({} bytes)",
            self.session.next_page(),
            snapshot_json.len()
        );
        let text = self.session.record(snapshot_json);
        self.display(text);
    }

    fn on_error(&mut self, message: String) {
        eprintln!("[Bridge] Error: {}", message);
        self.display(session::render_error(&message));
    }
}

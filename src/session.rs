/// Settle delay after loading a freshly submitted URL, before extraction.
pub const NEW_URL_SETTLE_MS: u64 = 2000;
/// Settle delay when re-capturing the URL already loaded (SPA navigation).
pub const RECAPTURE_SETTLE_MS: u64 = 500;

pub const INITIAL_PROMPT: &str = "Enter a URL and click GET INFO";

/// What the host should do in response to a GET INFO submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// Input was rejected; show the message, nothing else changes.
    Reject { message: &'static str },
    /// New URL: load it, then capture after the long settle delay.
    LoadAndCapture { url: String, settle_ms: u64 },
    /// Same URL as the current session: capture again after the short delay.
    Recapture { settle_ms: u64 },
}

/// Capture state for the currently inspected URL.
///
/// One session per submitted URL: submitting a different URL or clearing
/// starts over. `history` holds the raw snapshot JSON in capture order, so
/// `history.len()` always equals `capture_count` between extractions.
#[derive(Debug, Default)]
pub struct CaptureSession {
    current_url: String,
    capture_count: u32,
    history: Vec<String>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what a GET INFO click means given the raw input text.
    ///
    /// A new URL resets the session before any navigation happens; the same
    /// URL keeps the session so the user can capture an SPA mid-navigation.
    pub fn submit(&mut self, raw: &str) -> SubmitAction {
        let url = raw.trim();
        if url.is_empty() {
            return SubmitAction::Reject {
                message: "Please enter a URL",
            };
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return SubmitAction::Reject {
                message: "URL must start with http:// or https://",
            };
        }

        if url != self.current_url {
            self.current_url = url.to_string();
            self.capture_count = 0;
            self.history.clear();
            SubmitAction::LoadAndCapture {
                url: url.to_string(),
                settle_ms: NEW_URL_SETTLE_MS,
            }
        } else {
            SubmitAction::Recapture {
                settle_ms: RECAPTURE_SETTLE_MS,
            }
        }
    }

    /// Forget everything captured so far.
    pub fn clear(&mut self) {
        self.current_url.clear();
        self.capture_count = 0;
        self.history.clear();
    }

    /// Page number the next successful capture will carry (1-based).
    pub fn next_page(&self) -> u32 {
        self.capture_count + 1
    }

    /// Record a successful capture and return the text to display.
    pub fn record(&mut self, snapshot_json: String) -> String {
        self.capture_count += 1;
        let text = format!(
            "=== PAGE {count} ===\n\n{json}\n\n[Captured pages: {count}]\n\
             [Navigate in the webpage, then click GET INFO to capture next page]\n\
             [Click CLEAR to reset]",
            count = self.capture_count,
            json = snapshot_json,
        );
        self.history.push(snapshot_json);
        text
    }

    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn capture_count(&self) -> u32 {
        self.capture_count
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

/// Display text for an extraction failure. Does not touch the session.
pub fn render_error(message: &str) -> String {
    format!("Error: {message}")
}

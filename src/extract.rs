use anyhow::{Result, anyhow};
use headless_chrome::Tab;
use std::sync::Arc;

use crate::snapshot;

/// Error messages from page content are untrusted; cap what we display.
const ERROR_MESSAGE_MAX_CHARS: usize = 500;

const FALLBACK_ERROR: &str = "Unknown error";

/// JavaScript injected into the page to describe its interactive elements.
/// NON-DESTRUCTIVE: reads the DOM without modifying it.
///
/// The script:
///   1. Collects inputs, buttons (including link-buttons and submit/button
///      inputs) and selects with their identifying attributes.
///   2. Serializes them as indented JSON, page number spliced in by the host.
///   3. Hands the result to a two-method bridge object. Exactly one bridge
///      call happens per run: the first call wins, a trailing guard turns a
///      zero-call run into an error delivery.
///
/// The evaluate transport returns the script's completion value to the host,
/// so the bridge records its single delivery into an {ok, info|error}
/// envelope and the script returns that envelope serialized.
const EXTRACT_JS: &str = r#"
(function () {
  let delivered = null;
  const bridge = {
    onPageInfo: function (json) {
      if (delivered === null) delivered = { ok: true, info: json };
    },
    onError: function (message) {
      if (delivered === null) delivered = { ok: false, error: message };
    }
  };

  try {
    const inputs = Array.from(document.querySelectorAll('input'));
    const buttons = Array.from(document.querySelectorAll('button, a[role="button"], input[type="submit"], input[type="button"]'));
    const selects = Array.from(document.querySelectorAll('select'));

    const info = {
      page: __PAGE__,
      title: document.title,
      url: window.location.href,
      inputs: inputs.map(i => ({
        type: i.type || 'text',
        placeholder: i.placeholder || '',
        name: i.name || '',
        id: i.id || '',
        value: i.value || ''
      })),
      buttons: buttons.map(b => ({
        text: (b.innerText || b.value || b.textContent || '').trim(),
        id: b.id || '',
        className: b.className || ''
      })),
      selects: selects.map(s => ({
        name: s.name || '',
        id: s.id || '',
        options: Array.from(s.options).map(o => o.text)
      }))
    };

    bridge.onPageInfo(JSON.stringify(info, null, 2));
  } catch (e) {
    bridge.onError((e && e.message) || 'Unknown error');
  }

  if (delivered === null) delivered = { ok: false, error: 'Unknown error' };
  return JSON.stringify(delivered);
})()
"#;

/// Host-side receiver for extraction results. The page environment is
/// untrusted, so this is the whole surface it can reach: one success entry
/// point, one error entry point, nothing else.
pub trait PageBridge {
    fn on_page_info(&mut self, snapshot_json: String);
    fn on_error(&mut self, message: String);
}

/// Envelope the in-page bridge returns through the evaluate channel.
#[derive(Debug, serde::Deserialize)]
struct Delivery {
    ok: bool,
    #[serde(default)]
    info: String,
    #[serde(default)]
    error: String,
}

/// The extraction script with the page number spliced in.
pub fn extraction_script(page: u32) -> String {
    EXTRACT_JS.replace("__PAGE__", &page.to_string())
}

/// Run the extractor in the page and return the raw delivery envelope.
pub fn run(tab: &Arc<Tab>, page: u32) -> Result<String> {
    let result = tab.evaluate(&extraction_script(page), false)?;
    result
        .value
        .and_then(|v| v.as_str().map(String::from))
        .ok_or_else(|| anyhow!("page script returned no result"))
}

/// Decode an envelope and dispatch it to the bridge. Exactly one bridge
/// method is called per envelope, whatever the page sent back.
pub fn deliver(envelope: &str, bridge: &mut dyn PageBridge) {
    let delivery: Delivery = match serde_json::from_str(envelope) {
        Ok(d) => d,
        Err(e) => {
            bridge.on_error(format!("unreadable page result: {e}"));
            return;
        }
    };

    if delivery.ok {
        // Validate the shape before it enters history; the page can send
        // anything it likes through this channel.
        match snapshot::parse(&delivery.info) {
            Ok(_) => bridge.on_page_info(delivery.info),
            Err(e) => bridge.on_error(format!("malformed page info: {e}")),
        }
    } else {
        bridge.on_error(sanitize_message(&delivery.error));
    }
}

/// Strip control characters and cap untrusted error text.
fn sanitize_message(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(ERROR_MESSAGE_MAX_CHARS)
        .collect();
    if cleaned.is_empty() {
        FALLBACK_ERROR.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingBridge {
        infos: Vec<String>,
        errors: Vec<String>,
    }

    impl PageBridge for RecordingBridge {
        fn on_page_info(&mut self, snapshot_json: String) {
            self.infos.push(snapshot_json);
        }
        fn on_error(&mut self, message: String) {
            self.errors.push(message);
        }
    }

    fn snapshot_json() -> String {
        r#"{"page": 1, "title": "t", "url": "https://example.com", "inputs": [], "buttons": [], "selects": []}"#
            .to_string()
    }

    #[test]
    fn script_splices_the_page_number() {
        let script = extraction_script(3);
        assert!(script.contains("page: 3,"));
        assert!(!script.contains("__PAGE__"));
    }

    #[test]
    fn success_envelope_reaches_on_page_info_verbatim() {
        let envelope = serde_json::json!({ "ok": true, "info": snapshot_json() }).to_string();
        let mut bridge = RecordingBridge::default();
        deliver(&envelope, &mut bridge);
        assert_eq!(bridge.infos, vec![snapshot_json()]);
        assert!(bridge.errors.is_empty());
    }

    #[test]
    fn error_envelope_reaches_on_error() {
        let envelope = r#"{"ok": false, "error": "boom"}"#;
        let mut bridge = RecordingBridge::default();
        deliver(envelope, &mut bridge);
        assert!(bridge.infos.is_empty());
        assert_eq!(bridge.errors, vec!["boom".to_string()]);
    }

    #[test]
    fn garbage_envelope_becomes_an_error_not_a_capture() {
        let mut bridge = RecordingBridge::default();
        deliver("<html>not json</html>", &mut bridge);
        assert!(bridge.infos.is_empty());
        assert_eq!(bridge.errors.len(), 1);
        assert!(bridge.errors[0].starts_with("unreadable page result"));
    }

    #[test]
    fn malformed_snapshot_payload_is_rejected() {
        let envelope = r#"{"ok": true, "info": "{\"title\": \"missing page\"}"}"#;
        let mut bridge = RecordingBridge::default();
        deliver(envelope, &mut bridge);
        assert!(bridge.infos.is_empty());
        assert!(bridge.errors[0].starts_with("malformed page info"));
    }

    #[test]
    fn exactly_one_call_per_envelope() {
        let mut bridge = RecordingBridge::default();
        deliver(
            &serde_json::json!({ "ok": true, "info": snapshot_json() }).to_string(),
            &mut bridge,
        );
        deliver(r#"{"ok": false, "error": "x"}"#, &mut bridge);
        deliver("junk", &mut bridge);
        assert_eq!(bridge.infos.len() + bridge.errors.len(), 3);
    }

    #[test]
    fn error_text_is_sanitized_and_capped() {
        assert_eq!(sanitize_message("  boom  "), "boom");
        assert_eq!(sanitize_message(""), "Unknown error");
        assert_eq!(sanitize_message("\u{1b}[31mred\u{1b}[0m"), "[31mred[0m");
        let long = "x".repeat(2000);
        assert_eq!(sanitize_message(&long).len(), ERROR_MESSAGE_MAX_CHARS);
    }
}

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// User actions coming from the web UI.
#[derive(Debug)]
pub enum UiCommand {
    GetInfo { url: String },
    Clear,
}

/// Updates streamed back to the browser via SSE. The whole UI contract is a
/// single text pane whose content gets replaced.
#[derive(Clone, Debug)]
pub enum UiEvent {
    Display { text: String },
}

impl UiEvent {
    fn to_sse_event(&self) -> Event {
        match self {
            UiEvent::Display { text } => Event::default()
                .event("display")
                .data(format!("{{\"text\":{}}}", serde_json::json!(text))),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cmd_tx: mpsc::Sender<UiCommand>,
    pub event_tx: broadcast::Sender<UiEvent>,
}

#[derive(Deserialize)]
struct GetInfoPayload {
    url: String,
}

/// Start the web UI on localhost. Returns the shared channels.
pub async fn start_server(base_port: u16) -> (mpsc::Receiver<UiCommand>, broadcast::Sender<UiEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<UiCommand>(8);
    let (event_tx, _) = broadcast::channel::<UiEvent>(64);

    let state = Arc::new(AppState {
        cmd_tx,
        event_tx: event_tx.clone(),
    });

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/get-info", post(get_info_handler))
        .route("/clear", post(clear_handler))
        .route("/events", get(sse_handler))
        .route(
            "/favicon.ico",
            get(|| async { axum::http::StatusCode::NO_CONTENT }),
        ) // Silence 404
        .with_state(state);

    // Try the base port first, fall forward if it is in use
    let mut listener = None;
    let mut port = base_port;
    for p in base_port..base_port.saturating_add(10) {
        match tokio::net::TcpListener::bind(format!("127.0.0.1:{}", p)).await {
            Ok(l) => {
                listener = Some(l);
                port = p;
                break;
            }
            Err(_) => continue,
        }
    }
    let listener = listener.unwrap_or_else(|| {
        panic!(
            "Could not bind to any port {}-{}. Kill the old inspector first.",
            base_port,
            base_port.saturating_add(9)
        )
    });

    eprintln!("Web UI running at http://localhost:{}", port);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("[Web] Server stopped: {}", e);
        }
    });

    (cmd_rx, event_tx)
}

async fn index_handler() -> Html<&'static str> {
    eprintln!("[Web] GET /");
    Html(INDEX_HTML)
}

async fn get_info_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GetInfoPayload>,
) -> &'static str {
    eprintln!("[Web] POST /get-info: {}", payload.url);
    let _ = state.cmd_tx.send(UiCommand::GetInfo { url: payload.url }).await;
    "ok"
}

async fn clear_handler(State(state): State<Arc<AppState>>) -> &'static str {
    eprintln!("[Web] POST /clear");
    let _ = state.cmd_tx.send(UiCommand::Clear).await;
    "ok"
}

async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result: Result<UiEvent, _>| match result {
        Ok(event) => Some(Ok::<_, Infallible>(event.to_sse_event())),
        Err(_) => None,
    });
    Sse::new(stream)
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Page Inspector</title>
<style>
  * { margin: 0; padding: 0; box-sizing: border-box; }
  body {
    background: #0a0a0f;
    color: #e0e0e0;
    font-family: 'Segoe UI', system-ui, -apple-system, sans-serif;
    height: 100vh;
    display: flex;
    flex-direction: column;
  }
  header {
    padding: 24px 32px;
    border-bottom: 1px solid #1a1a2e;
    display: flex;
    align-items: center;
    gap: 12px;
  }
  header h1 {
    font-size: 20px;
    font-weight: 600;
    color: #fff;
  }
  header .dot {
    width: 8px; height: 8px;
    border-radius: 50%;
    background: #22c55e;
    animation: pulse 2s infinite;
  }
  @keyframes pulse {
    0%, 100% { opacity: 1; }
    50% { opacity: 0.4; }
  }
  .main {
    flex: 1;
    display: flex;
    flex-direction: column;
    max-width: 800px;
    width: 100%;
    margin: 0 auto;
    padding: 24px 32px;
    gap: 16px;
    overflow: hidden;
  }
  .input-area {
    display: flex;
    gap: 8px;
  }
  #url {
    flex: 1;
    background: #111118;
    border: 1px solid #222;
    border-radius: 8px;
    padding: 12px 16px;
    color: #fff;
    font-size: 16px;
    outline: none;
    transition: border-color 0.2s;
  }
  #url:focus { border-color: #6366f1; }
  #url::placeholder { color: #555; }
  button {
    background: #6366f1;
    color: #fff;
    border: none;
    border-radius: 8px;
    padding: 12px 24px;
    font-size: 15px;
    font-weight: 600;
    cursor: pointer;
    transition: background 0.2s;
  }
  button:hover { background: #4f46e5; }
  button.secondary { background: #27272a; }
  button.secondary:hover { background: #3f3f46; }
  #info {
    flex: 1;
    overflow-y: auto;
    background: #111118;
    border: 1px solid #1a1a2e;
    border-left: 3px solid #3b82f6;
    border-radius: 8px;
    padding: 14px 16px;
    font-family: 'Cascadia Code', 'Fira Code', monospace;
    font-size: 13px;
    line-height: 1.5;
    white-space: pre-wrap;
    word-break: break-word;
  }
  #info::-webkit-scrollbar { width: 6px; }
  #info::-webkit-scrollbar-track { background: transparent; }
  #info::-webkit-scrollbar-thumb { background: #333; border-radius: 3px; }
</style>
</head>
<body>
  <header>
    <div class="dot"></div>
    <h1>Page Inspector</h1>
  </header>
  <div class="main">
    <div class="input-area">
      <input type="text" id="url" placeholder="https://example.com" autofocus />
      <button onclick="getInfo()">GET INFO</button>
      <button class="secondary" onclick="clearAll()">CLEAR</button>
    </div>
    <pre id="info">Enter a URL and click GET INFO</pre>
  </div>
<script>
  const url = document.getElementById('url');
  const info = document.getElementById('info');

  async function getInfo() {
    await fetch('/get-info', {
      method: 'POST',
      headers: {'Content-Type': 'application/json'},
      body: JSON.stringify({url: url.value}),
    });
  }

  async function clearAll() {
    await fetch('/clear', {method: 'POST'});
  }

  url.addEventListener('keydown', e => {
    if (e.key === 'Enter') getInfo();
  });

  const es = new EventSource('/events');

  es.addEventListener('display', e => {
    info.textContent = JSON.parse(e.data).text;
  });
</script>
</body>
</html>
"##;

//! Development server with live reload support

use std::{convert::Infallible, path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tower_http::services::ServeDir;

/// Live reload message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMessage {
    /// Full page reload.
    Reload,
    /// Only stylesheets changed.
    CssReload,
}

impl ReloadMessage {
    fn as_str(self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::CssReload => "css-reload",
        }
    }
}

/// Server state containing the reload broadcaster.
#[derive(Clone)]
pub struct ServerState {
    /// Broadcast channel for live reload events.
    pub reload_tx: broadcast::Sender<ReloadMessage>,
}

impl ServerState {
    pub fn new() -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self { reload_tx }
    }

    /// Tell connected browsers to reload. Nobody listening is fine.
    pub fn notify(&self, message: ReloadMessage) {
        let _ = self.reload_tx.send(message);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the development server router.
pub fn create_router(output_dir: &Path, state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/__livereload", get(livereload_handler))
        .fallback_service(ServeDir::new(output_dir))
        .with_state(state)
}

/// Server-Sent Events handler for live reload.
async fn livereload_handler(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.reload_tx.subscribe();
    // Lagged receivers just skip ahead.
    let stream = BroadcastStream::new(rx)
        .filter_map(|msg| msg.ok().map(|m| Ok(Event::default().data(m.as_str()))));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Script appended to every page body while watching.
pub const LIVERELOAD_SCRIPT: &str = r#"<script>
(function() {
    const source = new EventSource('/__livereload');
    source.onmessage = function(event) {
        if (event.data === 'reload') {
            window.location.reload();
        } else if (event.data === 'css-reload') {
            document.querySelectorAll('link[rel="stylesheet"]').forEach(function(link) {
                const href = link.href.split('?')[0];
                link.href = href + '?v=' + Date.now();
            });
        }
    };
    source.onerror = function() {
        console.log('[livereload] Connection lost, retrying...');
    };
})();
</script>"#;

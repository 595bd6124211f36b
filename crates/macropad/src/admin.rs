//! Admin HTTP endpoint for inspecting key bindings.
//!
//! - `GET /keys?k=K1` returns the key's descriptor as JSON, or 404.
//! - `DELETE /keys?k=K1` answers 501: bindings are fixed while the loop runs.

use std::{collections::BTreeMap, io, sync::Arc};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use config::ActionDescriptor;
use serde::Deserialize;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Body returned for removal requests.
const UNREGISTER_UNSUPPORTED: &str = "Unregistering keys while running is not supported";

/// Key table shared with the handlers.
type Keys = Arc<BTreeMap<String, ActionDescriptor>>;

/// Query string selecting one key.
#[derive(Debug, Deserialize)]
struct KeyQuery {
    /// Key identifier.
    k: String,
}

/// Build the admin router over the configured key table.
pub fn router(keys: BTreeMap<String, ActionDescriptor>) -> Router {
    Router::new()
        .route("/keys", get(show_key).delete(remove_key))
        .with_state(Arc::new(keys))
}

/// `GET /keys`
async fn show_key(
    State(keys): State<Keys>,
    Query(q): Query<KeyQuery>,
) -> Result<Json<ActionDescriptor>, StatusCode> {
    debug!(key = %q.k, "admin_show_key");
    keys.get(&q.k)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// `DELETE /keys`
async fn remove_key(Query(q): Query<KeyQuery>) -> (StatusCode, &'static str) {
    info!(key = %q.k, "admin_unregister_rejected");
    (StatusCode::NOT_IMPLEMENTED, UNREGISTER_UNSUPPORTED)
}

/// Serve the admin router on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    keys: BTreeMap<String, ActionDescriptor>,
    shutdown: CancellationToken,
) -> io::Result<()> {
    info!(addr = %listener.local_addr()?, "admin_listening");
    axum::serve(listener, router(keys))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

/// Bind `listen` and serve in the background. Failures are logged only.
pub fn spawn(
    listen: String,
    keys: BTreeMap<String, ActionDescriptor>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(&listen).await {
            Ok(l) => l,
            Err(e) => {
                warn!(addr = %listen, error = %e, "admin_bind_failed");
                return;
            }
        };
        if let Err(e) = serve(listener, keys, shutdown).await {
            warn!(error = %e, "admin_server_failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    fn keys() -> BTreeMap<String, ActionDescriptor> {
        let mut keys = BTreeMap::new();
        keys.insert(
            "K1".to_string(),
            ActionDescriptor {
                kind: "Macro".into(),
                args: vec!["open".into(), "-a".into(), "Mail".into()],
                ..ActionDescriptor::default()
            },
        );
        keys
    }

    async fn start() -> (SocketAddr, CancellationToken, JoinHandle<io::Result<()>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, keys(), token.clone()));
        (addr, token, handle)
    }

    #[tokio::test]
    async fn get_returns_descriptor_json() {
        let (addr, token, handle) = start().await;
        let resp = reqwest::get(format!("http://{addr}/keys?k=K1")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["kind"], "Macro");
        assert_eq!(body["args"][0], "open");

        token.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let (addr, token, _handle) = start().await;
        let resp = reqwest::get(format!("http://{addr}/keys?k=K9")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 404);
        token.cancel();
    }

    #[tokio::test]
    async fn delete_is_not_implemented() {
        let (addr, token, _handle) = start().await;
        let resp = reqwest::Client::new()
            .delete(format!("http://{addr}/keys?k=K1"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 501);
        assert_eq!(resp.text().await.unwrap(), UNREGISTER_UNSUPPORTED);
        token.cancel();
    }

    #[tokio::test]
    async fn bind_failure_is_not_fatal() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();
        let handle = spawn(addr.to_string(), keys(), CancellationToken::new());
        handle.await.unwrap();
    }
}

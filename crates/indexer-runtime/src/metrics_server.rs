//! Admin HTTP endpoint: Prometheus scrape target and liveness probe.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use payroll_ledger::EventDispatcher;
use payroll_telemetry::encode_metrics;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

/// Build the admin router.
pub fn router(dispatcher: Arc<EventDispatcher>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .with_state(dispatcher)
}

/// Bind `0.0.0.0:port` and serve until `shutdown` fires.
pub async fn serve(
    port: u16,
    dispatcher: Arc<EventDispatcher>,
    shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Starting metrics server");
    serve_on(listener, router(dispatcher), shutdown).await
}

pub async fn serve_on(
    listener: TcpListener,
    router: Router,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            loop {
                let stop = *shutdown.borrow();
                if stop {
                    break;
                }
                if shutdown.changed().await.is_err() {
                    // Sender gone: keep serving until the process exits.
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
}

async fn health_check(State(dispatcher): State<Arc<EventDispatcher>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "lastEventTimestamp": dispatcher.last_timestamp(),
    }))
}

async fn metrics() -> Response {
    match encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payroll_ledger::{InMemoryEventLog, InMemoryLedgerStore, LedgerConfig};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get_path(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_health_and_metrics_endpoints() {
        let dispatcher = Arc::new(EventDispatcher::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryEventLog::new()),
            LedgerConfig::default(),
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = watch::channel(false);
        let server = tokio::spawn(serve_on(listener, router(dispatcher), rx));

        let health = get_path(addr, "/health").await;
        assert!(health.starts_with("HTTP/1.1 200"));
        assert!(health.contains(r#""status":"ok""#));
        assert!(health.contains(r#""lastEventTimestamp":null"#));

        let metrics = get_path(addr, "/metrics").await;
        assert!(metrics.starts_with("HTTP/1.1 200"));
        assert!(metrics.contains("text/plain"));

        tx.send(true).unwrap();
        server.await.unwrap().unwrap();
    }
}

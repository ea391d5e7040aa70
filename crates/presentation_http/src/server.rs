//! Serving with a bounded graceful shutdown

use std::{
    future::{Future, IntoFuture},
    net::SocketAddr,
    time::Duration,
};

use axum::Router;
use tokio::{net::TcpListener, sync::watch};
use tracing::{info, warn};

/// How the server stopped after the shutdown signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every open connection finished within the deadline
    Drained,
    /// The deadline passed with connections still open; they were dropped
    DeadlineExceeded,
}

/// Serve `app` until `signal` resolves, then give open connections at most
/// `drain_timeout` to finish.
pub async fn serve_with_drain_deadline<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    drain_timeout: Duration,
) -> std::io::Result<ShutdownOutcome>
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = stop_rx.wait_for(|stop| *stop).await;
    })
    .into_future();
    tokio::pin!(serve);
    tokio::pin!(signal);

    tokio::select! {
        result = &mut serve => return result.map(|()| ShutdownOutcome::Drained),
        () = &mut signal => {},
    }

    info!(timeout_secs = drain_timeout.as_secs(), "Draining open connections");
    let _ = stop_tx.send(true);

    match tokio::time::timeout(drain_timeout, serve).await {
        Ok(result) => result.map(|()| ShutdownOutcome::Drained),
        Err(_) => {
            warn!(
                timeout_secs = drain_timeout.as_secs(),
                "Connections still open after drain deadline, closing"
            );
            Ok(ShutdownOutcome::DeadlineExceeded)
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::routing::get;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
        sync::{Notify, oneshot},
    };

    use super::*;

    async fn start(
        app: Router,
        drain: Duration,
    ) -> (
        SocketAddr,
        oneshot::Sender<()>,
        tokio::task::JoinHandle<std::io::Result<ShutdownOutcome>>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_with_drain_deadline(
            listener,
            app,
            async move {
                let _ = rx.await;
            },
            drain,
        ));
        (addr, tx, handle)
    }

    async fn send_get(addr: SocketAddr, path: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        stream
    }

    #[tokio::test]
    async fn idle_server_drains_immediately() {
        let app = Router::new().route("/", get(|| async { "ok" }));
        let (addr, stop, handle) = start(app, Duration::from_secs(5)).await;

        let mut stream = send_get(addr, "/").await;
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));

        stop.send(()).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(outcome, ShutdownOutcome::Drained);
    }

    #[tokio::test]
    async fn stuck_request_is_cut_at_the_deadline() {
        let started = Arc::new(Notify::new());
        let entered = Arc::clone(&started);
        let app = Router::new().route(
            "/slow",
            get(move || {
                let entered = Arc::clone(&entered);
                async move {
                    entered.notify_one();
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "late"
                }
            }),
        );
        let (addr, stop, handle) = start(app, Duration::from_millis(100)).await;

        let _stream = send_get(addr, "/slow").await;
        started.notified().await;

        stop.send(()).unwrap();
        let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(outcome, ShutdownOutcome::DeadlineExceeded);
    }
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use pe3d_downloader::config::settings::Settings;
use pe3d_downloader::domain::models::download::DownloadJob;
use pe3d_downloader::portal::PortalSession;
use pe3d_downloader::workers::coordinator::NoopObserver;
use pe3d_downloader::workers::{DownloadCoordinator, HttpFileFetcher};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct ServerStats {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    served: AtomicUsize,
}

async fn serve_file(
    State(stats): State<Arc<ServerStats>>,
    Path(name): Path<String>,
) -> (StatusCode, Vec<u8>) {
    let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    stats.served.fetch_add(1, Ordering::SeqCst);

    if name.starts_with("broken") {
        (StatusCode::NOT_FOUND, Vec::new())
    } else {
        (StatusCode::OK, name.into_bytes())
    }
}

async fn start_test_server(stats: Arc<ServerStats>) -> SocketAddr {
    let app = Router::new()
        .route("/files/{name}", get(serve_file))
        .with_state(stats);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_http_downloads_respect_concurrency_limit() {
    let stats = Arc::new(ServerStats::default());
    let addr = start_test_server(stats.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let session = PortalSession::new(&Settings::with_base_url(format!("http://{addr}"))).unwrap();
    let fetcher = Arc::new(HttpFileFetcher::from_session(&session, 8192));
    let coordinator = DownloadCoordinator::new(fetcher, 3);

    let mut jobs: Vec<DownloadJob> = (0..9)
        .map(|i| {
            DownloadJob::new(
                format!("http://{addr}/files/tile{i}.zip"),
                dir.path().join(format!("tile{i}.zip")),
            )
        })
        .collect();
    jobs.push(DownloadJob::new(
        format!("http://{addr}/files/broken.zip"),
        dir.path().join("broken.zip"),
    ));

    let batch = coordinator.download_all(jobs, &NoopObserver).await;

    assert_eq!(batch.completed, 10);
    assert_eq!(batch.succeeded.len(), 9);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(stats.served.load(Ordering::SeqCst), 10);
    assert!(stats.max_in_flight.load(Ordering::SeqCst) <= 3);
    assert_eq!(
        std::fs::read(dir.path().join("tile4.zip")).unwrap(),
        b"tile4.zip"
    );
    assert!(!dir.path().join("broken.zip").exists());

    coordinator.shutdown().await;
}

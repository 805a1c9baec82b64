// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{mount_portal, zip_bytes, RecordingHost};
use pe3d_downloader::application::{DownloadPipeline, DownloadRequest, RunStatus};
use pe3d_downloader::config::settings::Settings;
use pe3d_downloader::domain::models::credentials::Credentials;
use pe3d_downloader::domain::models::product::ProductType;
use pe3d_downloader::utils::errors::PortalError;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(area: &str) -> DownloadRequest {
    DownloadRequest {
        area: area.to_string(),
        product: ProductType::TerrainRaster,
        credentials: Credentials::new("user@example.com", "hunter2", "x7k2"),
    }
}

async fn mount_login(server: &MockServer, body: &str) {
    Mock::given(method("POST"))
        .and(path("/login.php"))
        .and(body_string_contains("tela=login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_links(server: &MockServer, html: String) {
    Mock::given(method("POST"))
        .and(path("/baixararquivo.php"))
        .and(body_string_contains("tipo=4"))
        .and(body_string_contains("id%5B%5D=Recife"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_downloads_and_loads_layers() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_login(&server, "ok\n").await;

    let html = format!(
        "<iframe src='{0}/files/a.zip'></iframe><iframe src='{0}/files/b.zip'></iframe>\
         <iframe src='files/c.zip'></iframe>",
        server.uri()
    );
    mount_links(&server, html).await;

    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(zip_bytes(&[("dem.tif", b"GeoTIFF"), ("readme.txt", b"r")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/b.zip"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(zip_bytes(&[("points.xyz", b"1 2 3")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/c.zip"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let host = Arc::new(RecordingHost::new(Some(dir.path().to_path_buf()), true));
    let mut pipeline =
        DownloadPipeline::new(Settings::with_base_url(server.uri()), host.clone()).unwrap();

    pipeline.open().await.unwrap();
    assert_eq!(host.captcha_count(), 1);
    assert_eq!(host.last_status().as_deref(), Some("Waiting for credentials."));
    assert_eq!(pipeline.catalog().unwrap().len(), 2);

    let report = pipeline.run(&request("recife")).await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.resolved, 3);
    assert_eq!(report.downloaded.len(), 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.archives_attempted, 2);
    assert_eq!(report.layers.len(), 1);
    assert_eq!(report.layers[0].name, "dem");

    assert!(dir.path().join("a.zip").exists());
    assert!(dir.path().join("dem.tif").exists());
    assert!(!dir.path().join("c.zip").exists());
    assert!(!dir.path().join("c.zip.part").exists());

    assert!(host.saw_status("Login successful!"));
    assert!(host.saw_status("Fetching the list of files for 'Recife'..."));
    assert!(host.saw_status("Download complete!"));
    assert_eq!(
        host.last_status().as_deref(),
        Some("1 layer(s) loaded into the project!")
    );
    assert_eq!(*host.layers.lock(), vec!["dem".to_string()]);
    assert_eq!(*host.load_prompts.lock(), vec![2]);

    let progress = host.progress.lock().clone();
    assert_eq!(progress.first(), Some(&0));
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    pipeline.shutdown().await;
}

#[tokio::test]
async fn test_rejected_login_shows_fresh_captcha() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_login(&server, "Captcha incorreto").await;
    Mock::given(method("POST"))
        .and(path("/baixararquivo.php"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let host = Arc::new(RecordingHost::new(None, false));
    let mut pipeline =
        DownloadPipeline::new(Settings::with_base_url(server.uri()), host.clone()).unwrap();
    pipeline.open().await.unwrap();

    let err = pipeline.run(&request("Recife")).await.unwrap_err();

    assert!(matches!(err, PortalError::AuthRejected));
    assert!(host.saw_status("Login failed."));
    assert_eq!(host.captcha_count(), 2);
}

#[tokio::test]
async fn test_no_links_reports_no_files() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_login(&server, "ok").await;
    mount_links(&server, "<p>Nenhum arquivo</p>".to_string()).await;

    let host = Arc::new(RecordingHost::new(None, false));
    let mut pipeline =
        DownloadPipeline::new(Settings::with_base_url(server.uri()), host.clone()).unwrap();
    pipeline.open().await.unwrap();

    let report = pipeline.run(&request("Recife")).await.unwrap();

    assert_eq!(report.status, RunStatus::NoFiles);
    assert_eq!(report.resolved, 0);
    assert_eq!(host.last_status().as_deref(), Some("No files available."));
    assert!(host.progress.lock().is_empty());
}

#[tokio::test]
async fn test_missing_destination_cancels_without_downloading() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_login(&server, "ok").await;
    mount_links(&server, format!("<iframe src='{}/files/a.zip'>", server.uri())).await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let host = Arc::new(RecordingHost::new(None, true));
    let mut pipeline =
        DownloadPipeline::new(Settings::with_base_url(server.uri()), host.clone()).unwrap();
    pipeline.open().await.unwrap();

    let report = pipeline.run(&request("Recife")).await.unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.resolved, 1);
    assert_eq!(host.last_status().as_deref(), Some("Download cancelled."));
}

#[tokio::test]
async fn test_configured_output_dir_and_auto_load_skip_prompts() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    mount_login(&server, "ok").await;
    mount_links(&server, format!("<iframe src='{}/files/a.zip'>", server.uri())).await;
    Mock::given(method("GET"))
        .and(path("/files/a.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(zip_bytes(&[("mdt.TIF", b"x")])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut settings = Settings::with_base_url(server.uri());
    settings.download.output_dir = Some(dir.path().join("out"));
    settings.extraction.auto_load = true;

    let host = Arc::new(RecordingHost::new(None, false));
    let mut pipeline = DownloadPipeline::new(settings, host.clone()).unwrap();
    pipeline.open().await.unwrap();

    let report = pipeline.run(&request("Recife")).await.unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.downloaded, vec![dir.path().join("out").join("a.zip")]);
    assert_eq!(report.layers[0].name, "mdt");
    assert!(host.load_prompts.lock().is_empty());
}

#[tokio::test]
async fn test_unknown_area_is_rejected_before_login() {
    let server = MockServer::start().await;
    mount_portal(&server).await;
    Mock::given(method("POST"))
        .and(path("/login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(0)
        .mount(&server)
        .await;

    let host = Arc::new(RecordingHost::new(None, false));
    let mut pipeline =
        DownloadPipeline::new(Settings::with_base_url(server.uri()), host.clone()).unwrap();
    pipeline.open().await.unwrap();

    let err = pipeline.run(&request("Atlantis")).await.unwrap_err();

    assert!(matches!(err, PortalError::InputValidation(_)));
    assert_eq!(
        host.last_status().as_deref(),
        Some("Error: unknown area 'Atlantis'")
    );
}

#[tokio::test]
async fn test_catalog_failure_leaves_area_selection_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/estados_pe.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get_captcha.php"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;

    let host = Arc::new(RecordingHost::new(None, false));
    let mut pipeline =
        DownloadPipeline::new(Settings::with_base_url(server.uri()), host.clone()).unwrap();

    assert!(pipeline.open().await.is_err());
    assert!(pipeline.catalog().is_none());
    assert_eq!(host.captcha_count(), 1);
    assert!(host.saw_status("CAPTCHA loaded."));
    assert_eq!(
        host.last_status().as_deref(),
        Some("Could not load the list of areas.")
    );
}

use std::fs;

use graph_crawler::error::AppError;
use graph_crawler::models::CrawlerConfig;
use graph_crawler::services::ResourceDownloader;
use graph_crawler::services::rewriter::AssetKind;
use graph_crawler::storage::FailureLog;
use graph_crawler::utils::http::create_async_client;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn downloader(root: &std::path::Path) -> ResourceDownloader {
    let client = create_async_client(&CrawlerConfig::default()).unwrap();
    ResourceDownloader::new(client, root, FailureLog::new(root.join("failed")), 2)
}

fn failure_records(root: &std::path::Path) -> usize {
    fs::read_dir(root.join("failed")).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn download_writes_body_to_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("post/0.jpeg");
    let saved = downloader(dir.path())
        .download(&format!("{}/img/a.png", server.uri()), &target)
        .await
        .unwrap();

    assert_eq!(saved, target);
    assert_eq!(fs::read(&target).unwrap(), b"PNGDATA");
    let leftovers: Vec<_> = fs::read_dir(dir.path().join("post")).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[tokio::test]
async fn download_skips_existing_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("new"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("kept.jpeg");
    fs::write(&target, "old").unwrap();

    downloader(dir.path())
        .download(&format!("{}/img/a.png", server.uri()), &target)
        .await
        .unwrap();

    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
}

#[tokio::test]
async fn download_records_http_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("gone.jpeg");
    let err = downloader(dir.path())
        .download(&format!("{}/gone.png", server.uri()), &target)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::HttpStatus { status: 404, .. }));
    assert!(!target.exists());
    assert_eq!(failure_records(dir.path()), 1);
}

#[tokio::test]
async fn shared_resource_is_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/res/page_main.v42.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let downloader = downloader(dir.path());
    let url = format!("{}/res/page_main.v42.css", server.uri());

    let (first, second) = tokio::join!(
        downloader.download_shared(&url, AssetKind::Stylesheet),
        downloader.download_shared(&url, AssetKind::Stylesheet),
    );

    assert_eq!(first.unwrap(), "css/page_main.css");
    assert_eq!(second.unwrap(), "css/page_main.css");
    assert_eq!(downloader.shared_count().await, 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("css/page_main.css")).unwrap(),
        "body{}"
    );
}

#[tokio::test]
async fn shared_resource_failure_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/res/app.js"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let downloader = downloader(dir.path());
    let url = format!("{}/res/app.js", server.uri());

    assert!(downloader.download_shared(&url, AssetKind::Script).await.is_err());
    assert!(downloader.download_shared(&url, AssetKind::Script).await.is_err());
    assert_eq!(downloader.shared_count().await, 0);
}

#[tokio::test]
async fn batch_download_orders_results_and_combines_failures() {
    let server = MockServer::start().await;
    for name in ["a", "b", "c"] {
        Mock::given(method("GET"))
            .and(path(format!("/media/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(name))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/media/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let downloader = downloader(dir.path());
    let media = |name: &str| format!("{}/media/{name}", server.uri());

    let saved = downloader
        .download_batch(&[media("a"), media("b"), media("c")], &dir.path().join("7"))
        .await
        .unwrap();
    let indexes: Vec<_> = saved.iter().map(|m| m.index).collect();
    assert_eq!(indexes, vec![1, 2, 3]);
    assert_eq!(fs::read_to_string(dir.path().join("7/2.jpeg")).unwrap(), "b");

    let err = downloader
        .download_batch(&[media("a"), media("missing")], &dir.path().join("8"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Batch { failed: 1, .. }));
    assert!(dir.path().join("8/1.jpeg").exists());
}

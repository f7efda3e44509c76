use std::fs;
use std::sync::Arc;
use std::time::Duration;

use graph_crawler::models::{Config, MediaMode};
use graph_crawler::services::ArticleCrawler;
use graph_crawler::storage::LocalStorage;
use graph_crawler::utils::http::create_async_client;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article_page(base: &str, title: &str, image: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head>
<meta property="og:title" content="{title}">
<meta name="description" content="About {title}">
<link rel="stylesheet" href="{base}/res/page_main.v9.css">
<title>old</title>
</head><body>
<div id="js_article">
  <p><span>Closing line</span></p>
  <section>Opening line</section>
  <img data-src="{base}/img/{image}" class="rich_pages">
</div>
<script>
window.picture_page_info_list = [
  {{ width: '1080' * 1, cdn_url: '{base}/img/{image}', watermark_info: {{ cdn_url: '{base}/wm/{image}' }} }},
];
</script>
</body></html>"#
    )
}

fn quiet_config(mode: MediaMode) -> Config {
    let mut config = Config::default();
    config.crawler.dispatch_delay_min_ms = 0;
    config.crawler.dispatch_delay_max_ms = 0;
    config.crawler.max_concurrent = 2;
    config.crawler.media_mode = mode;
    config
}

async fn mount_articles(server: &MockServer) {
    let base = server.uri();
    // The first article answers last, so completion order differs from input order.
    Mock::given(method("GET"))
        .and(path("/s/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_page(&base, "First Post", "a.png"))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page(&base, "Third Post", "c.png")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/res/page_main.v9.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
        .expect(1)
        .mount(server)
        .await;
    for image in ["a.png", "c.png"] {
        Mock::given(method("GET"))
            .and(path(format!("/img/{image}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(image.as_bytes().to_vec()))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn crawl_keeps_order_and_isolates_failures() {
    let server = MockServer::start().await;
    mount_articles(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(MediaMode::Inline);
    let storage = Arc::new(LocalStorage::new(dir.path(), &config.output));
    let client = create_async_client(&config.crawler).unwrap();
    let crawler = ArticleCrawler::new(&config, client, storage);

    let urls: Vec<String> = (1..=3).map(|i| format!("{}/s/{i}", server.uri())).collect();
    let report = crawler.crawl(&urls).await.unwrap();

    let sequences: Vec<_> = report.outcomes.iter().map(|o| o.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(report.attempted(), 3);
    assert_eq!(report.succeeded(), 2);
    assert!(report.error_summary().starts_with("#2 "));

    let first = &report.outcomes[0];
    assert_eq!(first.title, "First Post");
    assert_eq!(first.slug.as_deref(), Some("First_Post"));
    assert_eq!(first.media_urls, vec![format!("{}/img/a.png", server.uri())]);
    assert!(first.body_text.contains("正文内容 ---------------\r\nOpening line\nClosing line\r\n"));

    let consolidated = fs::read_to_string(dir.path().join("content.txt")).unwrap();
    assert!(consolidated.starts_with("第 1 篇文章====>\r\n标题： First Post\r\n描述： About First Post\r\n"));
    assert!(!consolidated.contains("第 2 篇文章"));
    let first_block = consolidated.find("第 1 篇文章").unwrap();
    let third_block = consolidated.find("第 3 篇文章").unwrap();
    assert!(first_block < third_block);

    assert!(dir.path().join("texts/1_First_Post.txt").exists());
    assert!(dir.path().join("texts/3_Third_Post.txt").exists());
    assert_eq!(report.article_files.len(), 2);

    let snapshot = fs::read_to_string(dir.path().join("First_Post.html")).unwrap();
    assert!(snapshot.contains(r#"data-src="First_Post/0.jpeg""#));
    assert!(snapshot.contains(r#"href="css/page_main.css""#));
    assert!(snapshot.contains("<title>First_Post</title>"));
    assert_eq!(fs::read(dir.path().join("First_Post/0.jpeg")).unwrap(), b"a.png");
    assert_eq!(fs::read_to_string(dir.path().join("css/page_main.css")).unwrap(), "body{}");

    let failures: Vec<_> = fs::read_dir(dir.path().join("failed_downloads"))
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(failures.len(), 1);
    let record = fs::read_to_string(failures[0].path()).unwrap();
    assert!(record.starts_with("类型: 文章\n"));
}

#[tokio::test]
async fn batch_mode_downloads_media_list() {
    let server = MockServer::start().await;
    mount_articles(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(MediaMode::Batch);
    let storage = Arc::new(LocalStorage::new(dir.path(), &config.output));
    let client = create_async_client(&config.crawler).unwrap();
    let crawler = ArticleCrawler::new(&config, client, storage);

    let report = crawler
        .crawl(&[format!("{}/s/3", server.uri())])
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(fs::read(dir.path().join("1/1.jpeg")).unwrap(), b"c.png");
}

#[tokio::test]
async fn missing_meta_keeps_media_but_skips_text() {
    let server = MockServer::start().await;
    let base = server.uri();
    let page = format!(
        r#"<html><head></head><body><div id="js_article"><section>text</section></div>
<script>window.picture_page_info_list = [{{ cdn_url: "{base}/img/x.png" }}];</script></body></html>"#
    );
    Mock::given(method("GET"))
        .and(path("/s/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(MediaMode::Inline);
    let storage = Arc::new(LocalStorage::new(dir.path(), &config.output));
    let client = create_async_client(&config.crawler).unwrap();
    let crawler = ArticleCrawler::new(&config, client, storage);

    let report = crawler
        .crawl(&[format!("{base}/s/bare")])
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert!(outcome.is_success());
    assert!(outcome.body_text.is_empty());
    assert_eq!(outcome.media_urls, vec![format!("{base}/img/x.png")]);
    assert!(report.article_files.is_empty());
}

#[tokio::test]
async fn same_title_articles_share_a_snapshot_without_clobbering() {
    let server = MockServer::start().await;
    let base = server.uri();
    for id in ["a", "b"] {
        Mock::given(method("GET"))
            .and(path(format!("/s/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_page(&base, "Same", "shared.png")))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/img/shared.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"IMG".to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/res/page_main.v9.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(MediaMode::Inline);
    let storage = Arc::new(LocalStorage::new(dir.path(), &config.output));
    let client = create_async_client(&config.crawler).unwrap();
    let crawler = ArticleCrawler::new(&config, client, storage);

    let report = crawler
        .crawl(&[format!("{base}/s/a"), format!("{base}/s/b")])
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    for outcome in &report.outcomes {
        assert_eq!(outcome.saved_files.len(), 2, "#{} lost a file", outcome.sequence);
    }
    assert!(!dir.path().join("failed_downloads").exists());
    assert_eq!(fs::read(dir.path().join("Same/0.jpeg")).unwrap(), b"IMG");
    assert_eq!(fs::read_dir(dir.path().join("Same")).unwrap().count(), 1);

    let snapshot = fs::read_to_string(dir.path().join("Same.html")).unwrap();
    assert!(snapshot.contains(r#"data-src="Same/0.jpeg""#));
}

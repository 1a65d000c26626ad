//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! end-to-end: real HTTP fetching, real CSV output on disk.

use page_harvest::config::Config;
use page_harvest::crawler::{run_crawl, Coordinator, HttpFetcher, Record};
use page_harvest::output::{
    read_records, CsvSink, Sink, SinkResult, Termination, EXIT_EMPTY_ITEM_QUERY,
};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `seed` and writing to `csv_path`
fn create_test_config(seed: &str, csv_path: &Path, max_pages: u32) -> Config {
    let mut config = Config::default();
    config.crawler.seed = Some(seed.to_string());
    config.crawler.max_pages = max_pages;
    config.crawler.request_timeout_ms = 2_000;
    config.crawler.connect_timeout_ms = 1_000;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.csv_path = csv_path.display().to_string();
    config
}

fn product(base: &str, slug: &str, price: &str) -> String {
    format!(
        r#"<li class="product type-product">
            <a href="{base}/product/{slug}/" class="woocommerce-LoopProduct-link">
                <img src="{base}/wp-content/uploads/{slug}.jpg" class="attachment-woocommerce_thumbnail">
                <h2 class="woocommerce-loop-product__title">{slug}</h2>
                <span class="price"><span class="woocommerce-Price-amount amount">{price}</span></span>
            </a>
        </li>"#
    )
}

fn listing_page(products: &[String], pagination: &[&str]) -> String {
    let links: String = pagination
        .iter()
        .map(|href| format!(r#"<li><a class="page-numbers" href="{href}">{href}</a></li>"#))
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>Shop</title></head><body>
        <ul class="products columns-4">{}</ul>
        <nav class="woocommerce-pagination"><ul class="page-numbers">{}</ul></nav>
        </body></html>"#,
        products.concat(),
        links
    )
}

async fn mount_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_page_crawl_writes_all_records() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[
                product(&base_url, "abominable-hoodie", "$69.00"),
                product(&base_url, "adrienne-trek-jacket", "$57.00"),
            ],
            &["/shop/page/2/"],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(&[product(&base_url, "aeon-capri", "$48.00")], &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let config = create_test_config(&format!("{}/shop/", base_url), &csv_path, 5);

    let report = run_crawl(&config, None).await.expect("Crawl failed");

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.records, 3);
    assert_eq!(report.termination, Some(Termination::FrontierExhausted));
    assert_eq!(report.exit_code(), 0);

    let records = read_records(&csv_path).expect("Failed to read output");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].name, "abominable-hoodie");
    assert_eq!(records[0].price, "$69.00");
    assert_eq!(
        records[0].url,
        format!("{}/product/abominable-hoodie/", base_url)
    );
    assert_eq!(
        records[2].image,
        format!("{}/wp-content/uploads/aeon-capri.jpg", base_url)
    );

    let content = std::fs::read_to_string(&csv_path).unwrap();
    assert!(content.starts_with("url,image,name,price\n"));
}

#[tokio::test]
async fn test_empty_item_page_still_followed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/shop/", listing_page(&[], &["/shop/page/2/"])).await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(
            &[
                product(&base_url, "breathe-easy-tank", "$34.00"),
                product(&base_url, "bruno-compete-hoodie", "$63.00"),
            ],
            &[],
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let seed = format!("{}/shop/", base_url);
    let config = create_test_config(&seed, &csv_path, 5);

    let report = run_crawl(&config, None).await.expect("Crawl failed");

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.records, 2);
    assert_eq!(report.empty_item_pages, vec![seed]);
    assert_eq!(report.exit_code(), EXIT_EMPTY_ITEM_QUERY);
    assert_eq!(read_records(&csv_path).unwrap().len(), 2);
}

#[tokio::test]
async fn test_server_errors_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[product(&base_url, "a", "$1.00")],
            &["/shop/page/2/", "/shop/page/3/", "/shop/page/4/"],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/shop/page/2/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    // No mock for page 3: wiremock answers 404
    mount_page(
        &mock_server,
        "/shop/page/4/",
        listing_page(&[product(&base_url, "d", "$4.00")], &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let config = create_test_config(&format!("{}/shop/", base_url), &csv_path, 10);

    let report = run_crawl(&config, None).await.expect("Crawl failed");

    assert_eq!(report.pages_visited, 4);
    assert_eq!(report.fetch_failures, 2);
    assert_eq!(report.records, 2);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(&[product(&base_url, "a", "$1.00")], &["/shop/page/2/"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/shop/page/2/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(listing_page(&[product(&base_url, "b", "$2.00")], &[]), "text/html")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let mut config = create_test_config(&format!("{}/shop/", base_url), &csv_path, 5);
    config.crawler.request_timeout_ms = 200;

    let report = run_crawl(&config, None).await.expect("Crawl failed");

    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(read_records(&csv_path).unwrap().len(), 1);
}

#[tokio::test]
async fn test_pagination_cycle_visits_each_page_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let all_pages = ["/shop/", "/shop/page/2/", "/shop/page/3/"];

    for (n, at) in all_pages.iter().enumerate() {
        mount_page(
            &mock_server,
            at,
            listing_page(&[product(&base_url, &format!("p{}", n), "$1.00")], &all_pages),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let config = create_test_config(&format!("{}/shop/", base_url), &csv_path, 10);

    let report = run_crawl(&config, None).await.expect("Crawl failed");

    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.records, 3);
    assert_eq!(report.termination, Some(Termination::FrontierExhausted));

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_output_matches_memory_after_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[
                product(&base_url, "comma,name", "$1,000.00"),
                product(&base_url, "second", "$2.00"),
            ],
            &["/shop/page/2/"],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(&[product(&base_url, "plain", "$3.00")], &["/shop/page/3/"]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let config = create_test_config(&format!("{}/shop/", base_url), &csv_path, 2);

    let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent).unwrap();
    let sink = CsvSink::new(&csv_path);
    let mut coordinator = Coordinator::new(&config, fetcher, sink).unwrap();

    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.termination, Some(Termination::BudgetExhausted));
    assert_eq!(coordinator.sink().flushes(), 2);
    assert_eq!(read_records(&csv_path).unwrap(), coordinator.records());
    assert_eq!(coordinator.records()[0].name, "comma,name");
    assert_eq!(coordinator.records()[0].price, "$1,000.00");
}

#[tokio::test]
async fn test_budget_of_one_visits_only_seed() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(&[product(&base_url, "a", "$1.00")], &["/shop/page/2/"]),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(&[product(&base_url, "b", "$2.00")], &[]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let config = create_test_config(&format!("{}/shop/", base_url), &csv_path, 1);

    let report = run_crawl(&config, None).await.expect("Crawl failed");

    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.urls_pending, 1);
    assert_eq!(report.termination, Some(Termination::BudgetExhausted));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

/// CSV sink that reads its file back after every successful flush
struct CheckedCsvSink {
    inner: CsvSink,
    on_disk: Vec<Vec<Record>>,
}

impl Sink for CheckedCsvSink {
    fn flush(&mut self, records: &[Record]) -> SinkResult<()> {
        self.inner.flush(records)?;
        let written = read_records(self.inner.path())?;
        assert_eq!(written, records, "file incomplete after flush");
        self.on_disk.push(written);
        Ok(())
    }
}

#[tokio::test]
async fn test_cancel_during_fetch_keeps_completed_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/shop/",
        listing_page(
            &[
                product(&base_url, "first", "$1.00"),
                product(&base_url, "second", "$2.00"),
            ],
            &["/shop/page/2/"],
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/shop/page/2/",
        listing_page(&[product(&base_url, "third", "$3.00")], &["/shop/page/3/"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/shop/page/3/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(listing_page(&[product(&base_url, "late", "$4.00")], &[]), "text/html")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("products.csv");
    let mut config = create_test_config(&format!("{}/shop/", base_url), &csv_path, 5);
    config.crawler.request_timeout_ms = 30_000;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent).unwrap();
    let sink = CheckedCsvSink {
        inner: CsvSink::new(&csv_path),
        on_disk: Vec::new(),
    };
    let mut coordinator = Coordinator::new(&config, fetcher, sink)
        .unwrap()
        .with_shutdown(shutdown_rx);

    let cancel = async {
        loop {
            let seen = mock_server
                .received_requests()
                .await
                .map(|requests| requests.len())
                .unwrap_or(0);
            if seen >= 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        shutdown_tx.send(true).unwrap();
    };

    let (report, ()) = tokio::join!(coordinator.run(), cancel);
    let report = report.expect("Crawl failed");

    assert_eq!(report.termination, Some(Termination::Cancelled));
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.fetch_failures, 0);

    let sizes: Vec<usize> = coordinator.sink().on_disk.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 3]);

    let records = read_records(&csv_path).unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(records, coordinator.records());
}

// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::mock_browser::ScriptedBrowser;
use super::helpers::{create_use_case, detail_page, fast_fetcher, listing, search_page};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use vacancy_crawler::application::use_cases::crawl_use_case::CrawlOptions;
use vacancy_crawler::domain::models::search_query::{ExperienceBracket, SearchQuery};
use vacancy_crawler::domain::models::vacancy::VacancyRecord;
use vacancy_crawler::engines::traits::EngineError;
use vacancy_crawler::infrastructure::sinks::{JsonLinesSink, MemorySink};
use vacancy_crawler::utils::errors::CrawlError;
use vacancy_crawler::utils::robots::RobotsChecker;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search_url(server: &MockServer, exp: &str) -> String {
    format!("{}/vacancies/?category=Python&exp={}", server.uri(), exp)
}

async fn mount_detail(server: &MockServer, route: &str, paragraphs: &[&str], expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(paragraphs)))
        .expect(expected)
        .mount(server)
        .await;
}

fn sorted(mut records: Vec<VacancyRecord>) -> Vec<VacancyRecord> {
    records.sort_by(|a, b| a.title.cmp(&b.title));
    records
}

#[tokio::test]
async fn test_crawl_emits_tagged_records() {
    let server = MockServer::start().await;
    mount_detail(&server, "/vacancies/1/", &["We use Python and Docker daily"], 1).await;
    mount_detail(&server, "/vacancies/2/", &["Django", "REST framework"], 1).await;

    let url = search_url(&server, "1-3");
    let first = listing("Backend Developer", "/vacancies/1/", "Acme");
    let second = listing("Django Developer", "/vacancies/2/", "Globex");
    let browser = ScriptedBrowser::new().page(
        &url,
        vec![
            search_page(&[first.clone()], true),
            search_page(&[first, second], false),
        ],
    );

    let use_case = create_use_case(Arc::new(browser.clone()), CrawlOptions::default());
    let sink = MemorySink::new();
    let (_tx, rx) = watch::channel(false);
    let report = use_case
        .run(&[SearchQuery::parse(&url).unwrap()], Box::new(sink.clone()), rx)
        .await
        .unwrap();

    assert_eq!(report.load_more_clicks, 1);
    assert_eq!(report.listings_found, 2);
    assert_eq!(report.records_emitted, 2);
    assert_eq!(report.detail_failures, 0);
    assert!(!report.cancelled);
    assert_eq!(browser.launches(), 1);
    assert_eq!(browser.closes(), 1);

    let records = sorted(sink.records());
    assert_eq!(
        records[0],
        VacancyRecord {
            title: "Backend Developer".to_string(),
            link: "/vacancies/1/".to_string(),
            exp: ExperienceBracket::OneToThree,
            company: Some("Acme".to_string()),
            salary: None,
            cities: Some("Kyiv".to_string()),
            // "daily" contains "ai"
            tags: vec!["Python".to_string(), "Docker".to_string(), "AI".to_string()],
        }
    );
    assert_eq!(records[1].tags, vec!["Django", "REST"]);
}

#[tokio::test]
async fn test_duplicate_links_are_fetched_once() {
    let server = MockServer::start().await;
    mount_detail(&server, "/vacancies/7/", &["Python"], 1).await;

    let junior = search_url(&server, "0-1");
    let middle = search_url(&server, "1-3");
    let item = listing("Python Developer", "/vacancies/7/", "Acme");
    let browser = ScriptedBrowser::new()
        .page(&junior, vec![search_page(&[item.clone()], false)])
        .page(&middle, vec![search_page(&[item], false)]);

    let use_case = create_use_case(Arc::new(browser), CrawlOptions::default());
    let sink = MemorySink::new();
    let (_tx, rx) = watch::channel(false);
    let queries = vec![
        SearchQuery::parse(&junior).unwrap(),
        SearchQuery::parse(&middle).unwrap(),
    ];
    let report = use_case.run(&queries, Box::new(sink.clone()), rx).await.unwrap();

    assert_eq!(report.listings_found, 2);
    assert_eq!(report.duplicates_skipped, 1);
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].exp, ExperienceBracket::UpToOne);
}

#[tokio::test]
async fn test_duplicates_kept_when_dedupe_disabled() {
    let server = MockServer::start().await;
    mount_detail(&server, "/vacancies/7/", &["Python"], 2).await;

    let url = search_url(&server, "3-5");
    let item = listing("Python Developer", "/vacancies/7/", "Acme");
    let browser = ScriptedBrowser::new().page(&url, vec![search_page(&[item.clone(), item], false)]);

    let options = CrawlOptions {
        dedupe: false,
        ..Default::default()
    };
    let use_case = create_use_case(Arc::new(browser), options);
    let sink = MemorySink::new();
    let (_tx, rx) = watch::channel(false);
    let report = use_case
        .run(&[SearchQuery::parse(&url).unwrap()], Box::new(sink.clone()), rx)
        .await
        .unwrap();

    assert_eq!(report.duplicates_skipped, 0);
    assert_eq!(sink.records().len(), 2);
}

#[tokio::test]
async fn test_failed_detail_is_dropped() {
    let server = MockServer::start().await;
    mount_detail(&server, "/vacancies/1/", &["SQL"], 1).await;
    Mock::given(method("GET"))
        .and(path("/vacancies/2/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = search_url(&server, "5plus");
    let browser = ScriptedBrowser::new().page(
        &url,
        vec![search_page(
            &[
                listing("Data Engineer", "/vacancies/1/", "Acme"),
                listing("Gone", "/vacancies/2/", "Initech"),
            ],
            false,
        )],
    );

    let use_case = create_use_case(Arc::new(browser), CrawlOptions::default());
    let sink = MemorySink::new();
    let (_tx, rx) = watch::channel(false);
    let report = use_case
        .run(&[SearchQuery::parse(&url).unwrap()], Box::new(sink.clone()), rx)
        .await
        .unwrap();

    assert_eq!(report.records_emitted, 1);
    assert_eq!(report.detail_failures, 1);
    let records = sink.records();
    assert_eq!(records[0].title, "Data Engineer");
    assert_eq!(records[0].exp, ExperienceBracket::FivePlus);
    assert_eq!(records[0].tags, vec!["SQL"]);
}

#[tokio::test]
async fn test_unreachable_query_does_not_stop_run() {
    let server = MockServer::start().await;
    mount_detail(&server, "/vacancies/1/", &["Linux"], 1).await;

    let broken = "http://127.0.0.1:9/vacancies/?exp=0-1";
    let url = search_url(&server, "1-3");
    let browser = ScriptedBrowser::new().page(
        &url,
        vec![search_page(&[listing("Sysadmin", "/vacancies/1/", "Acme")], false)],
    );

    let use_case = create_use_case(Arc::new(browser.clone()), CrawlOptions::default());
    let sink = MemorySink::new();
    let (_tx, rx) = watch::channel(false);
    let queries = vec![
        SearchQuery::parse(broken).unwrap(),
        SearchQuery::parse(&url).unwrap(),
    ];
    let report = use_case.run(&queries, Box::new(sink.clone()), rx).await.unwrap();

    assert_eq!(report.queries, 2);
    assert_eq!(report.queries_failed, 1);
    assert_eq!(report.records_emitted, 1);
    assert_eq!(browser.closes(), 1);
}

#[tokio::test]
async fn test_launch_failure_is_reported() {
    let browser = ScriptedBrowser::new().failing();
    let use_case = create_use_case(Arc::new(browser.clone()), CrawlOptions::default());
    let (_tx, rx) = watch::channel(false);
    let query = SearchQuery::parse("https://jobs.dou.ua/vacancies/?exp=1-3").unwrap();

    let result = use_case.run(&[query], Box::new(MemorySink::new()), rx).await;

    assert!(matches!(
        result,
        Err(CrawlError::Engine(EngineError::Launch(_)))
    ));
    assert_eq!(browser.closes(), 0);
}

#[tokio::test]
async fn test_shutdown_closes_browser_session() {
    let url = "https://jobs.dou.ua/vacancies/?category=Python&exp=1-3";
    let browser = ScriptedBrowser::new()
        .page(url, vec![search_page(&[], true), search_page(&[], false)])
        .hanging();

    let use_case = create_use_case(Arc::new(browser.clone()), CrawlOptions::default());
    let sink = MemorySink::new();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let _ = tx.send(true);
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        use_case.run(&[SearchQuery::parse(url).unwrap()], Box::new(sink.clone()), rx),
    )
    .await
    .expect("run should stop after shutdown")
    .unwrap();

    assert!(report.cancelled);
    assert_eq!(browser.closes(), 1);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_robots_disallowed_details_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /vacancies/2/\n"),
        )
        .mount(&server)
        .await;
    mount_detail(&server, "/vacancies/1/", &["Python"], 1).await;
    mount_detail(&server, "/vacancies/2/", &["Python"], 0).await;

    let url = search_url(&server, "1-3");
    let browser = ScriptedBrowser::new().page(
        &url,
        vec![search_page(
            &[
                listing("Allowed", "/vacancies/1/", "Acme"),
                listing("Blocked", "/vacancies/2/", "Acme"),
            ],
            false,
        )],
    );

    let robots = RobotsChecker::new(fast_fetcher().client().clone());
    let use_case =
        create_use_case(Arc::new(browser), CrawlOptions::default()).with_robots(Arc::new(robots));
    let sink = MemorySink::new();
    let (_tx, rx) = watch::channel(false);
    let report = use_case
        .run(&[SearchQuery::parse(&url).unwrap()], Box::new(sink.clone()), rx)
        .await
        .unwrap();

    assert_eq!(report.robots_blocked, 1);
    assert_eq!(report.records_emitted, 1);
    assert_eq!(sink.records()[0].title, "Allowed");
}

#[tokio::test]
async fn test_records_written_as_json_lines() {
    let server = MockServer::start().await;
    mount_detail(&server, "/vacancies/1/", &["Kubernetes and Terraform"], 1).await;

    let url = search_url(&server, "1-3");
    let browser = ScriptedBrowser::new().page(
        &url,
        vec![search_page(&[listing("DevOps", "/vacancies/1/", "Acme")], false)],
    );

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out").join("vacancies.jsonl");
    let sink = JsonLinesSink::create(&output).await.unwrap();

    let use_case = create_use_case(Arc::new(browser), CrawlOptions::default());
    let (_tx, rx) = watch::channel(false);
    use_case
        .run(&[SearchQuery::parse(&url).unwrap()], Box::new(sink), rx)
        .await
        .unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);

    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value["title"], "DevOps");
    assert_eq!(value["link"], "/vacancies/1/");
    assert_eq!(value["exp"], "1-3");
    assert_eq!(value["salary"], serde_json::Value::Null);
    assert_eq!(value["tags"], serde_json::json!(["Kubernetes", "Terraform"]));
}

#[tokio::test]
async fn test_shutdown_during_detail_fetches_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vacancies/1/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page(&["Python"]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let url = search_url(&server, "1-3");
    let browser = ScriptedBrowser::new().page(
        &url,
        vec![search_page(&[listing("Slow", "/vacancies/1/", "Acme")], false)],
    );

    let use_case = create_use_case(Arc::new(browser.clone()), CrawlOptions::default());
    let sink = MemorySink::new();
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = tx.send(true);
    });

    let report = tokio::time::timeout(
        Duration::from_secs(2),
        use_case.run(&[SearchQuery::parse(&url).unwrap()], Box::new(sink.clone()), rx),
    )
    .await
    .expect("run should stop without waiting for slow detail pages")
    .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.listings_found, 1);
    assert_eq!(report.records_emitted, 0);
    assert!(sink.records().is_empty());
    assert_eq!(browser.closes(), 1);
}

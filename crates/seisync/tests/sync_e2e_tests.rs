//! End-to-end sync tests
//!
//! Runs the full pipeline through the real NetFile and Socrata clients
//! against two mock servers.

mod common;

use common::{cover_page, schedule_page, sync_config, SCHEMA_JSON};
use seisync::category::Category;
use seisync::config::Variant;
use seisync::{run_sync, SyncError, SyncStage};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::{
    matchers::{method, path, path_regex, query_param},
    Mock, MockServer, ResponseTemplate,
};

/// Rows each category of the fixture pages produces
const FIXTURE_ROWS: [(Category, u64); 8] = [
    (Category::Cover, 2),
    (Category::Comments, 1),
    (Category::ScheduleA1, 1),
    (Category::ScheduleA2, 3),
    (Category::ScheduleB, 1),
    (Category::ScheduleC, 1),
    (Category::ScheduleD, 2),
    (Category::ScheduleE, 1),
];

fn schema_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SCHEMA_JSON.as_bytes()).unwrap();
    file
}

fn created(rows: u64) -> Value {
    json!({"Errors": 0, "Rows Created": rows, "Rows Updated": 0, "Rows Deleted": 0})
}

async fn mount_netfile(server: &MockServer, redacted: &str, cover: Value, schedule: Value) {
    mount_session_and_cover(server, redacted, cover).await;

    Mock::given(method("POST"))
        .and(path("/Connect2/api/public/sei/export/schedule"))
        .and(query_param("IsRedacted", redacted))
        .and(query_param("CurrentPageIndex", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(schedule))
        .mount(server)
        .await;
}

async fn mount_session_and_cover(server: &MockServer, redacted: &str, cover: Value) {
    Mock::given(method("POST"))
        .and(path("/Connect2/api/authenticate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Connect2/api/public/sei/export/cover"))
        .and(query_param("IsRedacted", redacted))
        .and(query_param("CurrentPageIndex", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cover))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fixture_sync_publishes_every_category() {
    let netfile = MockServer::start().await;
    let socrata = MockServer::start().await;
    mount_netfile(&netfile, "true", cover_page(), schedule_page()).await;

    for (category, rows) in FIXTURE_ROWS {
        Mock::given(method("PUT"))
            .and(path(format!("/resource/red-{}.json", category)))
            .respond_with(ResponseTemplate::new(200).set_body_json(created(rows)))
            .expect(1)
            .mount(&socrata)
            .await;
    }

    Mock::given(method("POST"))
        .and(path_regex(r"^/resource/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created(0)))
        .expect(0)
        .mount(&socrata)
        .await;

    let schema = schema_file();
    let config = sync_config(&netfile.uri(), &socrata.uri(), schema.path());

    let report = run_sync(&config, Variant::Redacted).await.unwrap();

    assert_eq!(report.stage, SyncStage::SchedulesLoadReconciled);
    assert_eq!(report.variant, Variant::Redacted);
    for (category, rows) in FIXTURE_ROWS {
        let counter = report.counter(category);
        assert_eq!(counter.send, rows, "{category} send");
        assert_eq!(counter.created, rows, "{category} created");
    }
    assert_eq!(report.items.total, 8);
    assert_eq!(report.items.received, 8);
    assert_eq!(report.items.created, 10);
}

#[tokio::test]
async fn test_schedule_pages_after_the_first_are_each_fetched_once() {
    let netfile = MockServer::start().await;
    let socrata = MockServer::start().await;
    mount_session_and_cover(&netfile, "true", cover_page()).await;

    let filings = ["F-100", "F-200", "F-100"];
    for (index, filing_id) in filings.into_iter().enumerate() {
        let mut page = json!({
            "totalMatchingCount": 3, "totalMatchingPages": 3,
            "scheduleA1": [], "scheduleA2": [], "scheduleB": [],
            "scheduleC": [], "scheduleD": [], "scheduleE": []
        });
        page["comments"] = json!([
            {"filingId": filing_id, "scheduleName": "C", "comment": format!("page {}", index + 1)}
        ]);
        Mock::given(method("POST"))
            .and(path("/Connect2/api/public/sei/export/schedule"))
            .and(query_param("IsRedacted", "true"))
            .and(query_param("CurrentPageIndex", (index + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(page))
            .expect(1)
            .mount(&netfile)
            .await;
    }

    Mock::given(method("PUT"))
        .and(path_regex(r"^/resource/red-.*\.json$"))
        .respond_with(move |request: &wiremock::Request| {
            let rows: Vec<Value> = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(200).set_body_json(created(rows.len() as u64))
        })
        .mount(&socrata)
        .await;

    let schema = schema_file();
    let config = sync_config(&netfile.uri(), &socrata.uri(), schema.path());

    let report = run_sync(&config, Variant::Redacted).await.unwrap();

    assert_eq!(report.stage, SyncStage::SchedulesLoadReconciled);
    assert_eq!(report.items.total, 3);
    assert_eq!(report.items.received, 3);
    assert_eq!(report.counter(Category::Comments).created, 3);

    let requests = socrata.received_requests().await.unwrap();
    let comments = requests
        .iter()
        .find(|r| r.url.path() == "/resource/red-comments.json")
        .unwrap();
    let rows: Vec<Value> = serde_json::from_slice(&comments.body).unwrap();
    let published: Vec<_> = rows.iter().map(|row| row["comment"].clone()).collect();
    assert_eq!(published, vec![json!("page 1"), json!("page 2"), json!("page 3")]);
    assert_eq!(rows[1]["filingId"], json!("F-200"));
    assert_eq!(rows[1]["filerName"], json!("Grace Hopper"));
}

#[tokio::test]
async fn test_published_cover_rows_are_projected() {
    let netfile = MockServer::start().await;
    let socrata = MockServer::start().await;
    mount_netfile(&netfile, "false", cover_page(), schedule_page()).await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/resource/unred-.*\.json$"))
        .respond_with(move |request: &wiremock::Request| {
            let rows: Vec<Value> = serde_json::from_slice(&request.body).unwrap();
            ResponseTemplate::new(200).set_body_json(created(rows.len() as u64))
        })
        .mount(&socrata)
        .await;

    let schema = schema_file();
    let config = sync_config(&netfile.uri(), &socrata.uri(), schema.path());

    run_sync(&config, Variant::Unredacted).await.unwrap();

    let requests = socrata.received_requests().await.unwrap();
    let cover = requests
        .iter()
        .find(|r| r.url.path() == "/resource/unred-cover.json")
        .unwrap();
    let rows: Vec<Value> = serde_json::from_slice(&cover.body).unwrap();
    assert_eq!(
        rows[0],
        json!({
            "filingId": "F-100",
            "filerName": "Ada Lovelace",
            "departmentName": "Ethics Commission",
            "positionName": "Commissioner",
            "offices": "Commissioner - 1",
            "periodStart": "2019-01-01T00:00:00",
            "periodEnd": "2019-12-31",
            "filingDate": "2020-03-30T16:02:11"
        })
    );
    assert_eq!(rows[1]["offices"], json!("Director - 2 Clerk - 3"));

    let app_token = cover.headers.get("x-app-token").unwrap();
    assert_eq!(app_token, common::SOCRATA_APP_TOKEN);
}

#[tokio::test]
async fn test_catalog_row_errors_halt_the_run() {
    let netfile = MockServer::start().await;
    let socrata = MockServer::start().await;
    mount_netfile(&netfile, "true", cover_page(), schedule_page()).await;

    Mock::given(method("PUT"))
        .and(path("/resource/red-cover.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Errors": 1, "Rows Created": 1})),
        )
        .expect(1)
        .mount(&socrata)
        .await;

    let schema = schema_file();
    let config = sync_config(&netfile.uri(), &socrata.uri(), schema.path());

    let err = run_sync(&config, Variant::Redacted).await.unwrap_err();

    match err {
        SyncError::Load { category, dataset, .. } => {
            assert_eq!(category, Category::Cover);
            assert_eq!(dataset, "red-cover");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_cover_page_halts_before_any_load() {
    let netfile = MockServer::start().await;
    let socrata = MockServer::start().await;

    let mut cover = cover_page();
    cover["totalMatchingCount"] = json!(3);
    cover["totalMatchingPages"] = json!(2);
    mount_netfile(&netfile, "true", cover, schedule_page()).await;

    Mock::given(method("POST"))
        .and(path("/Connect2/api/public/sei/export/cover"))
        .and(query_param("CurrentPageIndex", "2"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such page"))
        .expect(1)
        .mount(&netfile)
        .await;

    Mock::given(path_regex(r"^/resource/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created(0)))
        .expect(0)
        .mount(&socrata)
        .await;

    let schema = schema_file();
    let config = sync_config(&netfile.uri(), &socrata.uri(), schema.path());

    let err = run_sync(&config, Variant::Redacted).await.unwrap_err();

    assert!(matches!(err, SyncError::Extraction { .. }));
}

#[tokio::test]
async fn test_unreadable_schema_fails_before_any_request() {
    let netfile = MockServer::start().await;
    let socrata = MockServer::start().await;

    Mock::given(path_regex(".*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&netfile)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = sync_config(
        &netfile.uri(),
        &socrata.uri(),
        &dir.path().join("missing.json"),
    );

    let err = run_sync(&config, Variant::Redacted).await.unwrap_err();

    assert!(matches!(err, SyncError::Schema(_)));
}

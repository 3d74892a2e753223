use chrono::NaiveDate;
use gamigrate_core::{MigrateError, ReferrerPolicy, ReportConnector, ReportRequest};
use gamigrate_google::Ga4Connector;
use gamigrate_google::adapter::RealAdapter;
use httpmock::prelude::*;
use serde_json::json;

const TOKEN: &str = "ya29.test-token";

fn connector(server: &MockServer) -> Ga4Connector {
    let adapter = RealAdapter::builder(TOKEN)
        .ga4_base_url(server.base_url())
        .build()
        .unwrap();
    Ga4Connector::from_real(adapter)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
}

fn row(path: &str, pv: &str, s: &str) -> serde_json::Value {
    let dims = [
        path,
        "Home",
        "Firefox",
        "Linux",
        "desktop",
        "2560x1440",
        "202405170812",
        "DE",
        "https://duckduckgo.com/",
    ];
    json!({
        "dimensionValues": dims.iter().map(|v| json!({"value": v})).collect::<Vec<_>>(),
        "metricValues": [{"value": pv}, {"value": s}],
    })
}

#[tokio::test]
async fn posts_run_report_with_token_and_paging() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1beta/properties/123456:runReport")
                .header("authorization", format!("Bearer {TOKEN}"))
                .body_includes(r#""dateRanges":[{"startDate":"2024-05-17","endDate":"2024-05-17"}]"#)
                .body_includes(r#"{"name":"pagePathPlusQueryString"}"#)
                .body_includes(r#""metrics":[{"name":"screenPageViews"},{"name":"sessions"}]"#)
                .body_includes(r#""offset":200"#)
                .body_includes(r#""limit":100"#);
            then.status(200).json_body(json!({
                "rows": [row("/a?b=1", "4", "2"), row("/c", "1", "0")],
                "rowCount": 202,
            }));
        })
        .await;

    let req = ReportRequest {
        property: "properties/123456".into(),
        date: day(),
        offset: 200,
        limit: 100,
    };
    let page = connector(&server).fetch_page(&req).await.unwrap();
    mock.assert_async().await;

    assert_eq!(page.row_count, 202);
    assert_eq!(page.rows.len(), 2);
    let first = &page.rows[0];
    assert_eq!(first.dimensions.url_path, "/a?b=1");
    assert_eq!(first.dimensions.date_hour_minute, "202405170812");
    assert_eq!(first.dimensions.referrer, "https://duckduckgo.com/");
    assert_eq!((first.page_views, first.sessions), (4, 2));
    assert_eq!(page.rows[1].sessions, 0);
}

#[tokio::test]
async fn empty_report_has_no_rows() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1beta/properties/42:runReport");
            then.status(200).json_body(json!({"kind": "analyticsData#runReport"}));
        })
        .await;
    let req = ReportRequest::first_page("42", day(), 100_000);
    let page = connector(&server).fetch_page(&req).await.unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.row_count, 0);
}

#[tokio::test]
async fn permission_errors_name_the_connector() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1beta/properties/42:runReport");
            then.status(403).json_body(json!({
                "error": {
                    "code": 403,
                    "message": "User does not have sufficient permissions for this property.",
                    "status": "PERMISSION_DENIED"
                }
            }));
        })
        .await;
    let req = ReportRequest::first_page("42", day(), 10);
    let err = connector(&server).fetch_page(&req).await.unwrap_err();
    let MigrateError::Connector { connector, msg } = &err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(connector, "gamigrate-ga4");
    assert!(msg.contains("403"));
    assert!(msg.contains("PERMISSION_DENIED"));
    assert_eq!(err.stage(), "fetch");
}

#[tokio::test]
async fn short_rows_are_data_errors() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1beta/properties/42:runReport");
            then.status(200).json_body(json!({
                "rows": [{"dimensionValues": [{"value": "/"}], "metricValues": [{"value": "1"}, {"value": "1"}]}],
                "rowCount": 1,
            }));
        })
        .await;
    let req = ReportRequest::first_page("42", day(), 10);
    let err = connector(&server).fetch_page(&req).await.unwrap_err();
    assert!(matches!(err, MigrateError::Data(_)));
}

#[tokio::test]
async fn non_json_success_is_a_data_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1beta/properties/42:runReport");
            then.status(200).body("<html>captive portal</html>");
        })
        .await;
    let req = ReportRequest::first_page("42", day(), 10);
    let err = connector(&server).fetch_page(&req).await.unwrap_err();
    assert!(matches!(err, MigrateError::Data(_)));
}

#[test]
fn advertises_full_url_referrers() {
    let c = Ga4Connector::new("token").unwrap();
    assert_eq!(c.name(), "gamigrate-ga4");
    assert_eq!(c.referrer_policy(), ReferrerPolicy::FullUrl);
    assert_eq!(Ga4Connector::KEY.as_str(), c.name());
}

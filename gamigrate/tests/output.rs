mod helpers;

use std::collections::{HashMap, HashSet};

use gamigrate::OutputFormat;
use helpers::*;

fn quoted_uuids(line: &str) -> Vec<&str> {
    line.split('\'')
        .filter(|s| s.len() == 36 && uuid::Uuid::parse_str(s).is_ok())
        .collect()
}

#[tokio::test]
async fn sql_statements_reference_their_sessions() {
    let m = mock_migrator("P", day(2024, 1, 1), day(2024, 1, 1))
        .build()
        .unwrap();
    let (sql, _) = run_to_string(&m).await;

    let mut sessions = HashSet::new();
    let mut events_per_session: HashMap<String, usize> = HashMap::new();
    for line in sql.lines() {
        if line.starts_with("INSERT INTO public.session ") {
            let ids = quoted_uuids(line);
            assert_eq!(ids[1], WEBSITE);
            assert!(sessions.insert(ids[0].to_string()));
        } else if line.starts_with("INSERT INTO public.website_event ") {
            let ids = quoted_uuids(line);
            // event_id, website_id, session_id, visit_id
            assert_eq!(ids.len(), 4);
            assert!(sessions.contains(ids[2]), "event before its session");
            *events_per_session.entry(ids[2].to_string()).or_default() += 1;
            assert!(line.contains("'pageview'"));
        }
    }
    assert_eq!(sessions.len() as u64, DAY_SESSIONS);
    assert!(events_per_session.values().all(|&n| n >= 1));
    assert_eq!(events_per_session.values().sum::<usize>() as u64, DAY_EVENTS);
}

#[tokio::test]
async fn sql_escapes_and_splits_fields() {
    let m = mock_migrator("P", day(2024, 1, 1), day(2024, 1, 1))
        .build()
        .unwrap();
    let (sql, _) = run_to_string(&m).await;

    let article: Vec<_> = sql
        .lines()
        .filter(|l| l.contains("'/article/o''brien'"))
        .collect();
    assert_eq!(article.len(), 5);
    assert!(article[0].contains("'Title of /article/o''brien'"));
    assert!(article[0].contains("'/xyz', '', 't.co'"));

    let news: Vec<_> = sql.lines().filter(|l| l.contains("'/news', 'page=2'")).collect();
    assert_eq!(news.len(), 6);
    // "(direct)" is not a URL, so all referrer columns are empty
    assert!(news[0].contains("'page=2', '', '', '', 'Title of /news?page=2'"));

    let session = sql
        .lines()
        .find(|l| l.starts_with("INSERT INTO public.session "))
        .unwrap();
    assert!(session.contains(&format!("'{HOST}', 'Chrome', 'Windows', 'desktop', '1920x1080', 'ES'")));
    assert!(session.contains("'2024-01-01 00:00:00.000+0000'"));
}

#[tokio::test]
async fn sql_ends_with_one_watermark_for_the_latest_day() {
    let m = mock_migrator("P", day(2024, 1, 30), day(2024, 2, 1))
        .build()
        .unwrap();
    let (sql, report) = run_to_string(&m).await;
    let updates: Vec<_> = sql.lines().filter(|l| l.starts_with("UPDATE ")).collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(
        sql.lines().last().unwrap(),
        format!(
            "UPDATE public.website SET reset_at = '2024-02-01', created_at = '2024-02-01' WHERE website_id = '{WEBSITE}';"
        )
        .as_str()
    );
    assert_eq!(
        report.max_event_at.map(|t| t.to_rfc3339()),
        Some("2024-02-01T23:59:00+00:00".to_string())
    );
}

#[test]
fn watermark_follows_latest_timestamp_not_write_order() {
    use gamigrate::{ExpansionEngine, SqlWriter};
    use gamigrate_mock::fixtures::rows::row;

    let rows = vec![
        row(day(2024, 2, 5), "2300", "/late", "", 3, 2),
        row(day(2024, 2, 1), "0100", "/early", "", 2, 1),
        row(day(2024, 2, 3), "0000", "/middle", "", 2, 1),
    ];
    let mut writer = SqlWriter::new(Vec::new(), "memory", ExpansionEngine::new(website(), HOST));
    writer.write_rows(&rows).unwrap();
    let (sink, stats) = writer.finish().unwrap();
    let sql = String::from_utf8(sink).unwrap();

    assert_eq!((stats.rows, stats.sessions, stats.events), (3, 4, 7));
    assert_eq!(
        stats.max_event_at.map(|t| t.to_rfc3339()),
        Some("2024-02-05T23:00:00+00:00".to_string())
    );
    assert_eq!(
        sql.lines().last().unwrap(),
        format!(
            "UPDATE public.website SET reset_at = '2024-02-05', created_at = '2024-02-05' WHERE website_id = '{WEBSITE}';"
        )
        .as_str()
    );
}

#[tokio::test]
async fn utc_offset_shows_in_timestamps() {
    let offset = chrono::FixedOffset::east_opt(3600).unwrap();
    let m = mock_migrator("P", day(2024, 1, 1), day(2024, 1, 1))
        .utc_offset(offset)
        .build()
        .unwrap();
    let (sql, _) = run_to_string(&m).await;
    assert!(sql.contains("'2024-01-01 18:45:00.000+0100'"));
    assert!(!sql.contains("+0000'"));
}

#[tokio::test]
async fn csv_is_a_row_passthrough() {
    let m = mock_migrator("P", day(2024, 1, 1), day(2024, 1, 2))
        .output_format(OutputFormat::Csv)
        .build()
        .unwrap();
    let (csv, report) = run_to_string(&m).await;
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "path,title,browser,os,device,screen,datetime,country_id,referral_path,count"
    );
    assert_eq!(lines.len() as u64, 1 + 2 * DAY_ROWS);
    assert_eq!(
        lines[2],
        "/news?page=2,Title of /news?page=2,Chrome,Windows,desktop,1920x1080,2024-01-01 09:15:00.000+0000,ES,(direct),6"
    );
    assert_eq!(report.sessions, 0);
    assert_eq!(report.rows, 2 * DAY_ROWS);
    assert_eq!(report.events, 2 * DAY_EVENTS);
}

#[tokio::test]
async fn json_dumps_raw_rows_with_their_day() {
    let m = mock_migrator("P", day(2024, 1, 1), day(2024, 1, 2))
        .output_format(OutputFormat::Json)
        .build()
        .unwrap();
    let (json, report) = run_to_string(&m).await;
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len() as u64, 2 * DAY_ROWS);
    assert_eq!(arr[0]["date"], "2024-01-01");
    assert_eq!(arr[6]["date"], "2024-01-02");
    // zero sessions are dumped as reported, before normalization
    assert_eq!(arr[3]["sessions"], 0);
    assert_eq!(arr[3]["page_views"], 2);
    assert_eq!(arr[3]["dimensions"]["url_path"], "/contact");
    assert_eq!(report.rows, 2 * DAY_ROWS);
}

#[tokio::test]
async fn json_for_no_rows_is_an_empty_array() {
    let m = mock_migrator(gamigrate_mock::EMPTY_PROPERTY, day(2024, 1, 1), day(2024, 1, 1))
        .output_format(OutputFormat::Json)
        .build()
        .unwrap();
    let (json, _) = run_to_string(&m).await;
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v, serde_json::json!([]));
}

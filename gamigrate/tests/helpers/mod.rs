// Shared fixtures for pipeline tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use gamigrate::{Migrator, MigratorBuilder, ReportConnector};
use gamigrate_mock::MockConnector;
use uuid::Uuid;

pub const WEBSITE: &str = "3f1c5a2e-7d1b-4c3a-9e2f-0b8d6a4c2e10";
pub const HOST: &str = "www.example.org";

/// Sessions and events the mock reports per day.
pub const DAY_SESSIONS: u64 = 14;
pub const DAY_EVENTS: u64 = 21;
pub const DAY_ROWS: u64 = 6;

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn website() -> Uuid {
    Uuid::parse_str(WEBSITE).unwrap()
}

/// Builder preloaded with everything but the connector and dates.
pub fn builder(connector: Arc<dyn ReportConnector>, property: &str) -> MigratorBuilder {
    Migrator::builder()
        .with_connector(connector)
        .property(property)
        .website_id(website())
        .hostname(HOST)
}

pub fn mock_migrator(property: &str, start: NaiveDate, end: NaiveDate) -> MigratorBuilder {
    builder(Arc::new(MockConnector::new()), property).date_range(start, end)
}

/// Run into memory and return the output as text.
pub async fn run_to_string(m: &Migrator) -> (String, gamigrate::MigrationReport) {
    let (buf, report) = m.run(Vec::new(), "memory").await.unwrap();
    (String::from_utf8(buf).unwrap(), report)
}

use std::sync::Arc;

use chrono::NaiveDate;
use gamigrate::{Migrator, OutputFormat};
use gamigrate_mock::MockConnector;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Register the fixture connector and describe the destination site.
    let migrator = Migrator::builder()
        .with_connector(Arc::new(MockConnector::new()))
        .property("123456")
        .website_id(Uuid::parse_str("3f1c5a2e-7d1b-4c3a-9e2f-0b8d6a4c2e10")?)
        .hostname("www.example.org")
        .date_range(
            NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("bad date")?,
            NaiveDate::from_ymd_opt(2024, 3, 2).ok_or("bad date")?,
        )
        .output_format(OutputFormat::Sql)
        .build()?;

    // 2. Expand both days into an in-memory SQL script.
    let (sql, report) = migrator.run(Vec::new(), "memory").await?;

    // 3. Show the watermark statement and the run summary.
    let sql = String::from_utf8(sql)?;
    if let Some(last) = sql.lines().last() {
        println!("{last}");
    }
    println!("{report:#?}");

    Ok(())
}

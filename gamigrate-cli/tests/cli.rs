use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const WEBSITE: &str = "3f1c5a2e-7d1b-4c3a-9e2f-0b8d6a4c2e10";

const SITES: &str = r#"
[sites.BLOG]
property = "properties/123456"
website_id = "3f1c5a2e-7d1b-4c3a-9e2f-0b8d6a4c2e10"
hostname = "blog.example.org"

[sites.SHOP]
property = "ga:998877"
website_id = "0e5d8f7c-1a2b-4c3d-8e9f-a0b1c2d3e4f5"
hostname = "shop.example.org"
"#;

fn gamigrate(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("gamigrate").unwrap();
    cmd.current_dir(dir)
        .env_remove("GAMIGRATE_SITES")
        .env_remove("GAMIGRATE_TOKEN_FILE")
        .env("RUST_LOG", "warn");
    cmd
}

fn sites_file(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("sites.toml");
    fs::write(&path, SITES).unwrap();
    path
}

#[test]
fn sites_lists_every_entry() {
    let dir = TempDir::new().unwrap();
    let sites = sites_file(dir.path());
    gamigrate(dir.path())
        .args(["sites", "--sites"])
        .arg(&sites)
        .assert()
        .success()
        .stdout(predicate::str::contains("BLOG\tproperties/123456"))
        .stdout(predicate::str::contains("SHOP\tga:998877"));
}

#[test]
fn inverted_range_fails_in_config() {
    let dir = TempDir::new().unwrap();
    gamigrate(dir.path())
        .args([
            "migrate",
            "--api",
            "mock",
            "--property",
            "123",
            "--website-id",
            WEBSITE,
            "--hostname",
            "www.example.org",
            "--start-date",
            "2024-03-10",
            "--end-date",
            "2024-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: config:"))
        .stderr(predicate::str::contains("precedes start date"));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn unknown_site_names_the_known_ones() {
    let dir = TempDir::new().unwrap();
    let sites = sites_file(dir.path());
    gamigrate(dir.path())
        .args(["migrate", "--api", "mock", "--site", "NEWS", "--sites"])
        .arg(&sites)
        .args(["--start-date", "2024-03-01", "--end-date", "2024-03-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: config:"))
        .stderr(predicate::str::contains("BLOG, SHOP"));
}

#[test]
fn site_without_sites_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    gamigrate(dir.path())
        .args(["migrate", "--api", "mock", "--site", "BLOG"])
        .args(["--start-date", "2024-03-01", "--end-date", "2024-03-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--sites"));
}

#[test]
fn google_apis_need_a_token_file() {
    let dir = TempDir::new().unwrap();
    let sites = sites_file(dir.path());
    gamigrate(dir.path())
        .args(["migrate", "--site", "BLOG", "--sites"])
        .arg(&sites)
        .args(["--start-date", "2024-03-01", "--end-date", "2024-03-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: config:"))
        .stderr(predicate::str::contains("--token-file"));
}

#[test]
fn mock_run_writes_default_named_sql_file() {
    let dir = TempDir::new().unwrap();
    let sites = sites_file(dir.path());
    gamigrate(dir.path())
        .args(["migrate", "--api", "mock", "--site", "BLOG", "--sites"])
        .arg(&sites)
        .args(["--start-date", "2024-03-01", "--end-date", "2024-03-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("days: 2"))
        .stdout(predicate::str::contains("sessions: 28"))
        .stdout(predicate::str::contains("events: 42"));

    let out = dir.path().join("BLOG-2024-03-01-to-2024-03-02.sql");
    let sql = fs::read_to_string(&out).unwrap();
    assert!(sql.contains("'blog.example.org'"));
    assert_eq!(sql.matches("UPDATE public.website").count(), 1);
    assert!(!dir.path().join("BLOG-2024-03-01-to-2024-03-02.sql.partial").exists());
}

#[test]
fn csv_to_stdout_keeps_summary_off_stdout() {
    let dir = TempDir::new().unwrap();
    let output = gamigrate(dir.path())
        .args([
            "migrate",
            "--api",
            "mock",
            "--property",
            "123",
            "--website-id",
            WEBSITE,
            "--hostname",
            "www.example.org",
            "--start-date",
            "2024-03-01",
            "--end-date",
            "2024-03-01",
            "--format",
            "csv",
            "--utc-offset",
            "+01:00",
            "--output",
            "-",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("rows: 6"))
        .get_output()
        .stdout
        .clone();
    let csv = String::from_utf8(output).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("path,title,browser,os,device,screen,datetime,country_id,referral_path,count")
    );
    assert_eq!(lines.count(), 6);
    assert!(csv.contains("+0100"));
}

#[test]
fn json_summary_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let assert = gamigrate(dir.path())
        .args([
            "migrate",
            "--api",
            "mock",
            "--property",
            "123",
            "--website-id",
            WEBSITE,
            "--hostname",
            "www.example.org",
            "--start-date",
            "2024-03-01",
            "--end-date",
            "2024-03-01",
            "--format",
            "json",
            "--json-summary",
        ])
        .assert()
        .success();
    let summary: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(summary["rows"], 6);
    assert_eq!(summary["days"], 1);
    assert!(dir
        .path()
        .join(format!("{WEBSITE}-2024-03-01-to-2024-03-01.json"))
        .exists());
}

#[test]
fn bad_offset_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    gamigrate(dir.path())
        .args(["migrate", "--api", "mock", "--property", "1", "--website-id", WEBSITE])
        .args(["--hostname", "h", "--start-date", "2024-03-01", "--end-date", "2024-03-01"])
        .args(["--utc-offset", "0200"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start with + or -"));
}

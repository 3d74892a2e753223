//! `gamigrate`: expand Google Analytics aggregate reports into Umami sessions
//! and events.
//!
//! ```text
//! gamigrate migrate --site BLOG --sites sites.toml \
//!     --start-date 2023-01-01 --end-date 2023-06-30 --token-file token.txt
//! gamigrate sites --sites sites.toml
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG` (default `info`).

mod sites;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use chrono::{FixedOffset, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gamigrate::{
    MigrateError, MigrationReport, Migrator, OutputFormat, ReferrerPolicy, ReportConnector,
    default_output_path,
};
use gamigrate_google::{Ga4Connector, UaConnector};
use gamigrate_mock::MockConnector;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gamigrate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a date range and write it as SQL, CSV or JSON
    Migrate(Box<MigrateArgs>),
    /// List the sites of a sites file
    Sites {
        /// TOML file of named sites
        #[arg(long, env = "GAMIGRATE_SITES")]
        sites: PathBuf,
    },
}

#[derive(Args)]
struct MigrateArgs {
    /// Site mnemonic to look up in the sites file
    #[arg(long)]
    site: Option<String>,
    /// TOML file of named sites
    #[arg(long, env = "GAMIGRATE_SITES")]
    sites: Option<PathBuf>,
    /// GA4 property or legacy view id (overrides the site entry)
    #[arg(long)]
    property: Option<String>,
    /// Umami website id (overrides the site entry)
    #[arg(long)]
    website_id: Option<Uuid>,
    /// Public hostname of the site (overrides the site entry)
    #[arg(long)]
    hostname: Option<String>,
    /// First day to migrate, YYYY-MM-DD
    #[arg(long)]
    start_date: NaiveDate,
    /// Last day to migrate, YYYY-MM-DD (inclusive)
    #[arg(long)]
    end_date: NaiveDate,
    #[arg(long, value_enum, default_value_t = Format::Sql)]
    format: Format,
    /// Reporting API to read from
    #[arg(long, value_enum, default_value_t = Api::Ga4)]
    api: Api,
    /// File holding an OAuth2 access token
    #[arg(long, env = "GAMIGRATE_TOKEN_FILE")]
    token_file: Option<PathBuf>,
    /// Output file, or `-` for stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Offset of the property's reporting time zone, e.g. +02:00
    #[arg(long, value_parser = parse_utc_offset, default_value = "+00:00")]
    utc_offset: FixedOffset,
    /// Override the connector's referrer handling
    #[arg(long, value_enum)]
    referrer_policy: Option<Policy>,
    #[arg(long, default_value_t = gamigrate::DEFAULT_PAGE_SIZE)]
    page_size: u64,
    /// Print the run summary as JSON
    #[arg(long)]
    json_summary: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Sql,
    Csv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Sql => Self::Sql,
            Format::Csv => Self::Csv,
            Format::Json => Self::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Api {
    Ga4,
    Ua,
    /// Offline fixture data
    Mock,
}

#[derive(Clone, Copy, ValueEnum)]
enum Policy {
    FullUrl,
    BareHost,
}

impl From<Policy> for ReferrerPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::FullUrl => Self::FullUrl,
            Policy::BareHost => Self::BareHost,
        }
    }
}

/// Accepts `Z`, `+HH`, `+HHMM` and `+HH:MM`.
fn parse_utc_offset(raw: &str) -> Result<FixedOffset, String> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
    }
    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(format!("offset {raw:?} must start with + or -")),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    let (h, m) = match digits.len() {
        2 => (digits.as_str(), "00"),
        4 => digits.split_at(2),
        _ => return Err(format!("offset {raw:?} is not +HH:MM")),
    };
    let h: i32 = h.parse().map_err(|_| format!("offset {raw:?} is not +HH:MM"))?;
    let m: i32 = m.parse().map_err(|_| format!("offset {raw:?} is not +HH:MM"))?;
    if h > 23 || m > 59 {
        return Err(format!("offset {raw:?} is out of range"));
    }
    FixedOffset::east_opt(sign * (h * 3600 + m * 60))
        .ok_or_else(|| format!("offset {raw:?} is out of range"))
}

fn read_token(path: &Path) -> Result<String, MigrateError> {
    let token = std::fs::read_to_string(path).map_err(|e| MigrateError::Io {
        path: path.display().to_string(),
        msg: e.to_string(),
    })?;
    Ok(token.trim().to_string())
}

fn connector(args: &MigrateArgs) -> Result<Arc<dyn ReportConnector>, MigrateError> {
    let token = || {
        args.token_file
            .as_deref()
            .ok_or_else(|| MigrateError::Config("--token-file is required for this api".into()))
            .and_then(read_token)
    };
    let c: Arc<dyn ReportConnector> = match args.api {
        Api::Ga4 => Arc::new(Ga4Connector::new(token()?)?),
        Api::Ua => Arc::new(UaConnector::new(token()?)?),
        Api::Mock => Arc::new(MockConnector::new()),
    };
    Ok(c)
}

async fn migrate(args: &MigrateArgs) -> anyhow::Result<MigrationReport> {
    let mut builder = Migrator::builder();
    let label = match &args.site {
        Some(name) => {
            let path = args.sites.as_deref().ok_or_else(|| {
                MigrateError::Config("--site needs a sites file (--sites)".to_string())
            })?;
            let file = sites::load(path)?;
            let site = file.site(name)?;
            builder = builder
                .property(site.property.clone())
                .website_id(site.website_id)
                .hostname(site.hostname.clone());
            name.clone()
        }
        None => args
            .website_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "gamigrate".to_string()),
    };
    if let Some(p) = &args.property {
        builder = builder.property(p.clone());
    }
    if let Some(id) = args.website_id {
        builder = builder.website_id(id);
    }
    if let Some(h) = &args.hostname {
        builder = builder.hostname(h.clone());
    }
    if let Some(p) = args.referrer_policy {
        builder = builder.referrer_policy(p.into());
    }
    let format = OutputFormat::from(args.format);
    let migrator = builder
        .with_connector(connector(args)?)
        .date_range(args.start_date, args.end_date)
        .page_size(args.page_size)
        .utc_offset(args.utc_offset)
        .output_format(format)
        .build()?;

    let path = args.output.clone().unwrap_or_else(|| {
        default_output_path(&label, args.start_date, args.end_date, format)
    });
    if path.as_os_str() == "-" {
        let (mut out, report) = migrator
            .run(std::io::BufWriter::new(std::io::stdout()), "stdout")
            .await?;
        out.flush().context("flushing stdout")?;
        return Ok(report);
    }
    tracing::info!(site = %label, output = %path.display(), "migration starting");
    Ok(migrator.run_to_path(&path).await?)
}

fn print_summary(report: &MigrationReport, json: bool, to_stderr: bool) -> anyhow::Result<()> {
    let text = if json {
        serde_json::to_string_pretty(report)?
    } else {
        let latest = report
            .max_event_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        let output = report
            .output
            .as_ref()
            .map_or_else(|| "stdout".to_string(), |p| p.display().to_string());
        format!(
            "days: {}\npages: {}\nrows: {}\nsessions: {}\nevents: {}\nlatest event: {latest}\noutput: {output}",
            report.days, report.pages, report.rows, report.sessions, report.events
        )
    };
    if to_stderr {
        eprintln!("{text}");
    } else {
        println!("{text}");
    }
    Ok(())
}

fn list_sites(path: &Path) -> anyhow::Result<()> {
    let file = sites::load(path)?;
    for (name, site) in &file.sites {
        println!("{name}\t{}\t{}\t{}", site.property, site.website_id, site.hostname);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Migrate(args) => {
            let report = migrate(&args).await?;
            let to_stderr = args.output.as_deref().is_some_and(|p| p.as_os_str() == "-");
            print_summary(&report, args.json_summary, to_stderr)
        }
        Command::Sites { sites } => list_sites(&sites),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<MigrateError>() {
                Some(e) => eprintln!("error: {}: {e}", e.stage()),
                None => eprintln!("error: run: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_accept_common_spellings() {
        let plus_two = FixedOffset::east_opt(7200).unwrap();
        assert_eq!(parse_utc_offset("+02:00").unwrap(), plus_two);
        assert_eq!(parse_utc_offset("+0200").unwrap(), plus_two);
        assert_eq!(parse_utc_offset("+02").unwrap(), plus_two);
        assert_eq!(
            parse_utc_offset("-05:30").unwrap(),
            FixedOffset::west_opt(5 * 3600 + 1800).unwrap()
        );
        assert_eq!(parse_utc_offset("Z").unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn offsets_reject_garbage() {
        assert!(parse_utc_offset("02:00").is_err());
        assert!(parse_utc_offset("+123").is_err());
        assert!(parse_utc_offset("+24:00").is_err());
        assert!(parse_utc_offset("+ab:cd").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

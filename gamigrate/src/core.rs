use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use gamigrate_core::{
    DEFAULT_PAGE_SIZE, MigrateError, MigrationReport, OutputFormat, ReferrerPolicy,
    ReportConnector, RunConfig, split_days,
};
use uuid::Uuid;

use crate::fetch::ReportFetcher;
use crate::output::OutputWriter;

/// Suffix of the file a run writes into before it is complete.
pub const PARTIAL_SUFFIX: &str = "partial";

/// Pipeline that fetches aggregate rows day by day and serializes them.
pub struct Migrator {
    pub(crate) connector: Arc<dyn ReportConnector>,
    pub(crate) property: String,
    pub(crate) cfg: RunConfig,
}

/// Builder for a [`Migrator`].
pub struct MigratorBuilder {
    connector: Option<Arc<dyn ReportConnector>>,
    property: Option<String>,
    website_id: Option<Uuid>,
    hostname: Option<String>,
    dates: Option<(NaiveDate, NaiveDate)>,
    page_size: u64,
    utc_offset: FixedOffset,
    referrer_policy: Option<ReferrerPolicy>,
    output_format: OutputFormat,
}

impl Default for MigratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MigratorBuilder {
    /// Create a builder with default page size, UTC timestamps and SQL output.
    ///
    /// A connector, property, website, hostname and date range must be set
    /// before [`build`](Self::build) succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connector: None,
            property: None,
            website_id: None,
            hostname: None,
            dates: None,
            page_size: DEFAULT_PAGE_SIZE,
            utc_offset: Utc.fix(),
            referrer_policy: None,
            output_format: OutputFormat::default(),
        }
    }

    /// Set the report source.
    ///
    /// Unless [`referrer_policy`](Self::referrer_policy) is set explicitly, the
    /// connector's own policy is used.
    #[must_use]
    pub fn with_connector(mut self, c: Arc<dyn ReportConnector>) -> Self {
        self.connector = Some(c);
        self
    }

    /// Provider-side property (or legacy view) to read from.
    #[must_use]
    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Destination website stamped on every record.
    #[must_use]
    pub const fn website_id(mut self, id: Uuid) -> Self {
        self.website_id = Some(id);
        self
    }

    /// Hostname stamped on every session.
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Inclusive range of days to migrate.
    #[must_use]
    pub const fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.dates = Some((start, end));
        self
    }

    /// Rows requested per report page.
    #[must_use]
    pub const fn page_size(mut self, rows: u64) -> Self {
        self.page_size = rows;
        self
    }

    /// Offset at which group-key wall clock times are interpreted.
    #[must_use]
    pub const fn utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Override the connector's referrer policy.
    #[must_use]
    pub const fn referrer_policy(mut self, policy: ReferrerPolicy) -> Self {
        self.referrer_policy = Some(policy);
        self
    }

    /// Select the output format.
    #[must_use]
    pub const fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Build the migrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` when no connector was set and `Config` when a run
    /// parameter is missing or fails [`RunConfig::validate`].
    pub fn build(self) -> Result<Migrator, MigrateError> {
        let connector = self.connector.ok_or_else(|| {
            MigrateError::InvalidArg(
                "no connector registered; add one via with_connector(...)".to_string(),
            )
        })?;
        let missing = |what: &str| MigrateError::Config(format!("{what} is required"));
        let property = self.property.ok_or_else(|| missing("property"))?;
        if property.trim().is_empty() {
            return Err(MigrateError::Config("property must not be empty".to_string()));
        }
        let website_id = self.website_id.ok_or_else(|| missing("website id"))?;
        let hostname = self.hostname.ok_or_else(|| missing("hostname"))?;
        let (start, end) = self.dates.ok_or_else(|| missing("date range"))?;

        let mut cfg = RunConfig::new(website_id, hostname, start, end);
        cfg.page_size = self.page_size;
        cfg.utc_offset = self.utc_offset;
        cfg.referrer_policy = self
            .referrer_policy
            .unwrap_or_else(|| connector.referrer_policy());
        cfg.output_format = self.output_format;
        cfg.validate()?;

        Ok(Migrator {
            connector,
            property,
            cfg,
        })
    }
}

/// Wrap errors a connector raised without naming itself.
pub fn tag_err(connector: &str, e: MigrateError) -> MigrateError {
    match e {
        e @ (MigrateError::Connector { .. } | MigrateError::Data(_)) => e,
        other => MigrateError::Connector {
            connector: connector.to_string(),
            msg: other.to_string(),
        },
    }
}

/// Conventional output file name, `<name>-<start>-to-<end>.<suffix>`.
#[must_use]
pub fn default_output_path(
    name: &str,
    start: NaiveDate,
    end: NaiveDate,
    format: OutputFormat,
) -> PathBuf {
    PathBuf::from(format!(
        "{name}-{start}-to-{end}.{}",
        format.file_suffix()
    ))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

impl Migrator {
    /// Start building a new `Migrator`.
    ///
    /// ```rust,ignore
    /// let migrator = gamigrate::Migrator::builder()
    ///     .with_connector(Arc::new(Ga4Connector::new(token)?))
    ///     .property("123456789")
    ///     .website_id(website_id)
    ///     .hostname("www.example.com")
    ///     .date_range(start, end)
    ///     .build()?;
    /// let report = migrator.run_to_path(Path::new("out.sql")).await?;
    /// ```
    #[must_use]
    pub fn builder() -> MigratorBuilder {
        MigratorBuilder::new()
    }

    /// The validated run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.cfg
    }

    /// Provider-side property being read.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Run the whole pipeline into `sink`.
    ///
    /// Days are processed in ascending order, and each day's pages in ascending
    /// offset order; every page is serialized before the next is requested.
    /// `label` names the destination in I/O errors.
    ///
    /// # Errors
    /// The first failure of any stage aborts the run. Output already written to
    /// `sink` is left as is.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "gamigrate::core::run",
            skip(self, sink),
            fields(
                connector = self.connector.name(),
                property = %self.property,
                start = %self.cfg.start_date,
                end = %self.cfg.end_date,
                format = ?self.cfg.output_format,
            ),
        )
    )]
    pub async fn run<W: Write>(
        &self,
        sink: W,
        label: &str,
    ) -> Result<(W, MigrationReport), MigrateError> {
        let days = split_days(self.cfg.start_date, self.cfg.end_date)?;
        let mut writer = OutputWriter::new(&self.cfg, sink, label)?;
        let mut report = MigrationReport::default();

        for day in days {
            let mut fetcher = ReportFetcher::new(
                Arc::clone(&self.connector),
                self.property.clone(),
                day,
                self.cfg.page_size,
            );
            let mut day_rows = 0u64;
            while let Some(rows) = fetcher.next_page().await? {
                day_rows += rows.len() as u64;
                writer.write_rows(day, &rows)?;
            }
            report.days += 1;
            report.pages += fetcher.pages();
            report.rows += day_rows;
            #[cfg(feature = "tracing")]
            tracing::info!(date = %day, rows = day_rows, pages = fetcher.pages(), "day migrated");
        }

        let (sink, stats) = writer.finish()?;
        report.sessions = stats.sessions;
        report.events = stats.events;
        report.max_event_at = stats.max_event_at;
        Ok((sink, report))
    }

    /// Run the pipeline into a file at `path`.
    ///
    /// Output goes to `<path>.partial` first and is renamed to `path` only after
    /// the run completes, so a file at `path` is always a finished run. A failed
    /// run leaves its partial file behind.
    ///
    /// # Errors
    /// Same as [`Migrator::run`], plus `Io` for file creation and renaming.
    pub async fn run_to_path(&self, path: &Path) -> Result<MigrationReport, MigrateError> {
        let partial = partial_path(path);
        let file = File::create(&partial).map_err(|e| MigrateError::io(partial.display(), &e))?;
        let label = partial.display().to_string();
        let (sink, mut report) = self.run(BufWriter::new(file), &label).await?;
        let file = sink
            .into_inner()
            .map_err(|e| MigrateError::io(&label, e.error()))?;
        file.sync_all()
            .map_err(|e| MigrateError::io(&label, &e))?;
        std::fs::rename(&partial, path).map_err(|e| MigrateError::io(path.display(), &e))?;
        report.output = Some(path.to_path_buf());
        Ok(report)
    }
}

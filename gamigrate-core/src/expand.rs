//! Expansion of one aggregate row into synthetic sessions and events.
//!
//! The source only reports `(page_views, sessions)` per group and day. The
//! engine reconstructs discrete records whose counts reproduce those totals
//! exactly:
//!
//! - `sessions` is normalized to at least 1, and `page_views` to at least
//!   `sessions`, so every session owns at least one event.
//! - Equal counts give one event per session.
//! - Evenly divisible counts give `page_views / sessions` events per session.
//! - Otherwise every session gets one event and the last-created session
//!   absorbs the remaining `page_views - sessions`.
//!
//! Rows are independent: nothing is carried between calls, so days can be
//! expanded in any order or in parallel.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use uuid::Uuid;

use crate::referrer::normalize_referrer;
use crate::timestamp::parse_group_key;
use crate::{AggregateRow, MigrateError, ReferrerPolicy, RunConfig, SyntheticEvent, SyntheticSession};

/// How a row's page views are distributed over its sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// One event per session.
    Equal {
        /// Sessions to create.
        sessions: u64,
    },
    /// The same number of events for every session.
    Even {
        /// Sessions to create.
        sessions: u64,
        /// Events owned by each session.
        per_session: u64,
    },
    /// One event per session, with the remainder attached to the last session.
    Remainder {
        /// Sessions to create.
        sessions: u64,
        /// Events added to the last session on top of its first one.
        extra: u64,
    },
}

impl Allocation {
    /// Normalize the raw counters and choose an allocation regime.
    #[must_use]
    pub const fn plan(page_views: u64, sessions: u64) -> Self {
        let sessions = if sessions == 0 { 1 } else { sessions };
        let page_views = if page_views < sessions {
            sessions
        } else {
            page_views
        };
        if page_views == sessions {
            Self::Equal { sessions }
        } else if page_views % sessions == 0 {
            Self::Even {
                sessions,
                per_session: page_views / sessions,
            }
        } else {
            Self::Remainder {
                sessions,
                extra: page_views - sessions,
            }
        }
    }

    /// Number of sessions this allocation creates.
    #[must_use]
    pub const fn sessions(&self) -> u64 {
        match *self {
            Self::Equal { sessions }
            | Self::Even { sessions, .. }
            | Self::Remainder { sessions, .. } => sessions,
        }
    }

    /// Number of events owned by the session in creation slot `slot`.
    #[must_use]
    pub const fn events_for(&self, slot: u64) -> u64 {
        match *self {
            Self::Equal { .. } => 1,
            Self::Even { per_session, .. } => per_session,
            Self::Remainder { sessions, extra } => {
                if slot + 1 == sessions {
                    1 + extra
                } else {
                    1
                }
            }
        }
    }

    /// Total number of events across all sessions.
    #[must_use]
    pub const fn total_events(&self) -> u64 {
        match *self {
            Self::Equal { sessions } => sessions,
            Self::Even {
                sessions,
                per_session,
            } => sessions * per_session,
            Self::Remainder { sessions, extra } => sessions + extra,
        }
    }
}

/// A synthetic session together with the events it owns (never empty).
///
/// Events are not stored: [`events`](Self::events) mints them on demand, so a
/// session absorbing a large remainder costs one event at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedSession {
    /// The session record.
    pub session: SyntheticSession,
    event_count: u64,
    template: SyntheticEvent,
}

impl ExpandedSession {
    /// Number of page-view events this session owns.
    #[must_use]
    pub const fn event_count(&self) -> u64 {
        self.event_count
    }

    /// The session's events in creation order.
    ///
    /// Every call mints fresh event identifiers; iterate once per output.
    #[must_use]
    pub fn events(&self) -> SessionEvents<'_> {
        SessionEvents {
            template: &self.template,
            left: self.event_count,
        }
    }
}

/// Lazy iterator over the events of one [`ExpandedSession`].
#[derive(Debug)]
pub struct SessionEvents<'a> {
    template: &'a SyntheticEvent,
    left: u64,
}

impl Iterator for SessionEvents<'_> {
    type Item = SyntheticEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        Some(SyntheticEvent {
            event_id: Uuid::new_v4(),
            ..self.template.clone()
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.left).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

/// Stateless expander bound to one destination website.
#[derive(Debug, Clone)]
pub struct ExpansionEngine {
    website_id: Uuid,
    hostname: String,
    utc_offset: FixedOffset,
    referrer_policy: ReferrerPolicy,
}

impl ExpansionEngine {
    /// Engine for `website_id`/`hostname` with UTC timestamps and full-URL referrers.
    #[must_use]
    pub fn new(website_id: Uuid, hostname: impl Into<String>) -> Self {
        Self {
            website_id,
            hostname: hostname.into(),
            utc_offset: Utc.fix(),
            referrer_policy: ReferrerPolicy::FullUrl,
        }
    }

    /// Engine configured from a run configuration.
    #[must_use]
    pub fn from_config(cfg: &RunConfig) -> Self {
        Self::new(cfg.website_id, cfg.hostname.clone())
            .with_utc_offset(cfg.utc_offset)
            .with_referrer_policy(cfg.referrer_policy)
    }

    /// Interpret group keys as wall-clock time at `offset`.
    #[must_use]
    pub const fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Select the referrer normalization policy.
    #[must_use]
    pub const fn with_referrer_policy(mut self, policy: ReferrerPolicy) -> Self {
        self.referrer_policy = policy;
        self
    }

    /// Destination website of every generated record.
    #[must_use]
    pub const fn website_id(&self) -> Uuid {
        self.website_id
    }

    /// Expand `row` into its synthetic sessions, lazily, in creation order.
    ///
    /// # Errors
    /// Returns `Parse` when the row's `date_hour_minute` is malformed. The row is
    /// never skipped silently.
    pub fn expand<'a>(&'a self, row: &'a AggregateRow) -> Result<Expansion<'a>, MigrateError> {
        let created_at = parse_group_key(&row.dimensions.date_hour_minute, self.utc_offset)?;
        let referrer = normalize_referrer(&row.dimensions.referrer, self.referrer_policy);
        Ok(Expansion {
            engine: self,
            row,
            allocation: Allocation::plan(row.page_views, row.sessions),
            created_at,
            referrer,
            next_slot: 0,
        })
    }

    /// Expand `row` and collect every session.
    ///
    /// # Errors
    /// Same as [`ExpansionEngine::expand`].
    pub fn expand_all(&self, row: &AggregateRow) -> Result<Vec<ExpandedSession>, MigrateError> {
        Ok(self.expand(row)?.collect())
    }
}

/// Iterator over the sessions produced from one row.
#[derive(Debug)]
pub struct Expansion<'a> {
    engine: &'a ExpansionEngine,
    row: &'a AggregateRow,
    allocation: Allocation,
    created_at: DateTime<FixedOffset>,
    referrer: String,
    next_slot: u64,
}

impl Expansion<'_> {
    /// The allocation chosen for this row.
    #[must_use]
    pub const fn allocation(&self) -> Allocation {
        self.allocation
    }

    /// Timestamp shared by every record of this row.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    fn session(&self) -> SyntheticSession {
        let d = &self.row.dimensions;
        SyntheticSession {
            session_id: Uuid::new_v4(),
            website_id: self.engine.website_id,
            visit_id: Uuid::new_v4(),
            created_at: self.created_at,
            hostname: self.engine.hostname.clone(),
            browser: d.browser.clone(),
            os: d.os.clone(),
            device: d.device_category.clone(),
            screen: d.screen_resolution.clone(),
            country: d.country_code.clone(),
        }
    }

    fn event(&self, session: &SyntheticSession) -> SyntheticEvent {
        let d = &self.row.dimensions;
        SyntheticEvent {
            event_id: Uuid::new_v4(),
            website_id: self.engine.website_id,
            session_id: session.session_id,
            visit_id: session.visit_id,
            created_at: self.created_at,
            url: d.url_path.clone(),
            title: d.page_title.clone(),
            referrer: self.referrer.clone(),
        }
    }
}

impl Iterator for Expansion<'_> {
    type Item = ExpandedSession;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.next_slot;
        if slot >= self.allocation.sessions() {
            return None;
        }
        self.next_slot += 1;
        let session = self.session();
        let template = self.event(&session);
        Some(ExpandedSession {
            session,
            event_count: self.allocation.events_for(slot),
            template,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.allocation.sessions().saturating_sub(self.next_slot);
        let left = usize::try_from(left).unwrap_or(usize::MAX);
        (left, Some(left))
    }
}

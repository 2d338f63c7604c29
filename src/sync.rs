//! Live Sync Engine - keeps the session's list mirrors in step with the record store.
//!
//! One feed per record kind is subscribed for the lifetime of a session. Each snapshot
//! replaces the corresponding list whole, after which the list is re-rendered and the
//! dashboard and charts are recomputed from both current lists. The two feeds are not
//! coordinated: a recompute may pair a fresh collection list with an EMI list one push
//! behind. Every recompute is a full rescan, so the next push corrects it.

use crate::core::aggregation::{ChartSet, DashboardSummary};
use crate::errors::Result;
use crate::presentation::{Presenter, Severity};
use crate::session::Session;
use crate::store::{CollectionRecord, EmiRecord, RecordKind, RecordStore, SnapshotFeed};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Source of "today" for monthly figures.
pub type Clock = fn() -> NaiveDate;

/// The local calendar date.
#[must_use]
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// What a single [`LiveSync::next_update`] step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// A collection snapshot of this many records was applied
    Collections(usize),
    /// An EMI snapshot of this many records was applied
    Emis(usize),
    /// A feed failed to produce a snapshot; the held list was left as it was
    FeedError(RecordKind),
}

/// Consumes both snapshot feeds for one session.
pub struct LiveSync {
    mirror: Mirror,
    collections: Option<SnapshotFeed<CollectionRecord>>,
    emis: Option<SnapshotFeed<EmiRecord>>,
}

/// Where snapshots land: the session lists and the presenter.
///
/// Kept apart from the feeds so applying a snapshot only borrows shareable state.
struct Mirror {
    session: Arc<Session>,
    presenter: Arc<dyn Presenter>,
    clock: Clock,
}

async fn next_from<T>(feed: &mut Option<SnapshotFeed<T>>) -> Option<Result<Vec<T>>> {
    match feed {
        Some(feed) => feed.next_snapshot().await,
        None => None,
    }
}

impl LiveSync {
    /// Subscribes both feeds for the session's principal.
    #[instrument(skip_all, fields(owner = %session.owner()))]
    pub async fn attach(
        store: &dyn RecordStore,
        session: Arc<Session>,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Self> {
        let collections = store.subscribe_collections(session.owner()).await?;
        let emis = store.subscribe_emis(session.owner()).await?;
        debug!("Live sync attached");

        Ok(Self {
            mirror: Mirror {
                session,
                presenter,
                clock: local_today,
            },
            collections: Some(collections),
            emis: Some(emis),
        })
    }

    /// Replaces the clock used for monthly figures.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.mirror.clock = clock;
        self
    }

    /// Waits for the next snapshot from either feed and applies it.
    ///
    /// Returns `None` once both feeds have ended.
    pub async fn next_update(&mut self) -> Option<SyncEvent> {
        loop {
            tokio::select! {
                next = next_from(&mut self.collections), if self.collections.is_some() => {
                    match next {
                        Some(Ok(snapshot)) => return Some(self.mirror.apply_collections(snapshot).await),
                        Some(Err(e)) => return Some(self.mirror.report_failure(RecordKind::Collection, &e)),
                        None => {
                            debug!("Collection feed ended");
                            self.collections = None;
                        }
                    }
                }
                next = next_from(&mut self.emis), if self.emis.is_some() => {
                    match next {
                        Some(Ok(snapshot)) => return Some(self.mirror.apply_emis(snapshot).await),
                        Some(Err(e)) => return Some(self.mirror.report_failure(RecordKind::Emi, &e)),
                        None => {
                            debug!("EMI feed ended");
                            self.emis = None;
                        }
                    }
                }
                else => return None,
            }
        }
    }

    /// Applies snapshots until both feeds end.
    pub async fn run(mut self) {
        while let Some(event) = self.next_update().await {
            debug!(?event, "Snapshot processed");
        }
        info!("Live sync stopped");
    }
}

impl Mirror {
    async fn apply_collections(&self, snapshot: Vec<CollectionRecord>) -> SyncEvent {
        let collections = self.session.replace_collections(snapshot).await;
        self.presenter.render_collections(&collections);
        self.refresh().await;
        SyncEvent::Collections(collections.len())
    }

    async fn apply_emis(&self, snapshot: Vec<EmiRecord>) -> SyncEvent {
        let emis = self.session.replace_emis(snapshot).await;
        self.presenter.render_emis(&emis);
        self.refresh().await;
        SyncEvent::Emis(emis.len())
    }

    /// Recomputes the dashboard and both charts from the current lists.
    async fn refresh(&self) {
        let collections = self.session.collections().await;
        let emis = self.session.emis().await;
        let summary = DashboardSummary::compute(&collections, &emis, (self.clock)());
        let charts = ChartSet::from_summary(&summary);

        self.presenter.render_dashboard(&summary);
        self.presenter
            .render_charts(&charts.collections_vs_emi, &charts.profit_split);
    }

    fn report_failure(&self, kind: RecordKind, err: &crate::errors::Error) -> SyncEvent {
        error!(%kind, "Snapshot failed: {}", err);
        self.presenter
            .notify(&format!("Failed to sync {kind} records"), Severity::Error);
        SyncEvent::FeedError(kind)
    }
}

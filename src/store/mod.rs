//! Record Store Client - writes and live subscriptions for the two record collections.
//!
//! All operations are scoped to a principal's namespace, identified by its uid. Writes
//! suspend until the store acknowledges them; any store failure surfaces as
//! [`crate::errors::Error::RemoteUnavailable`] and is never retried here.
//!
//! Subscriptions return a [`SnapshotFeed`]: a lazy, non-restartable sequence of full
//! snapshots. The first poll yields the current contents; every later poll waits for the
//! next change to that kind in that namespace and yields the whole list again.

pub mod database;

use crate::core::validation::{NewCollection, NewEmi};
use crate::entities::{collection, emi};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt;

pub use database::DatabaseStore;

/// Store-assigned record identifier.
pub type RecordId = i64;
/// A collection as held in memory and delivered in snapshots.
pub type CollectionRecord = collection::Model;
/// An EMI as held in memory and delivered in snapshots.
pub type EmiRecord = emi::Model;

/// The two record collections under a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Cash inflows
    Collection,
    /// Recurring installments
    Emi,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => write!(f, "collection"),
            Self::Emi => write!(f, "EMI"),
        }
    }
}

/// Partial update for an EMI. The paid flag and paid date are the only mutable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmiPatch {
    /// New value of `is_paid_this_month`
    pub is_paid_this_month: bool,
    /// New value of `paid_date`
    pub paid_date: Option<NaiveDate>,
}

impl EmiPatch {
    /// Marks the current cycle paid on `date`.
    #[must_use]
    pub const fn paid_on(date: NaiveDate) -> Self {
        Self {
            is_paid_this_month: true,
            paid_date: Some(date),
        }
    }
}

/// One live subscription. Each call to [`SnapshotSource::next_snapshot`] yields a full
/// snapshot; `None` means the feed has ended and will not resume.
///
/// `next_snapshot` must be cancel safe: the sync engine races two feeds in
/// `tokio::select!` and drops the loser. A dropped call must leave any pending change
/// to be reported by the next call.
#[async_trait]
pub trait SnapshotSource<T>: Send {
    /// Waits for and returns the next full snapshot.
    async fn next_snapshot(&mut self) -> Option<Result<Vec<T>>>;
}

/// Boxed live subscription returned by [`RecordStore`].
pub type SnapshotFeed<T> = Box<dyn SnapshotSource<T>>;

/// Remote record store operations, scoped by principal uid.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates a collection and returns its identifier.
    async fn create_collection(&self, owner: &str, new: NewCollection) -> Result<RecordId>;

    /// Creates an EMI (unpaid, zero paid months) and returns its identifier.
    async fn create_emi(&self, owner: &str, new: NewEmi) -> Result<RecordId>;

    /// Applies a partial update to an EMI.
    async fn update_emi(&self, owner: &str, id: RecordId, patch: EmiPatch) -> Result<()>;

    /// Deletes a record. Deleting an absent record succeeds.
    async fn delete(&self, owner: &str, kind: RecordKind, id: RecordId) -> Result<()>;

    /// Live feed of the principal's collections, most recent date first.
    async fn subscribe_collections(&self, owner: &str) -> Result<SnapshotFeed<CollectionRecord>>;

    /// Live feed of the principal's EMIs, in arrival order.
    async fn subscribe_emis(&self, owner: &str) -> Result<SnapshotFeed<EmiRecord>>;
}

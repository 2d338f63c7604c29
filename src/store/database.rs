//! `SeaORM`-backed record store with broadcast change notification.
//!
//! Every successful write publishes a [`ChangeNotice`] on a broadcast channel. Feeds
//! filter notices for their own namespace and kind, then re-query the full list. Feeds
//! never diff: each yield is the complete current set.

use super::{
    CollectionRecord, EmiPatch, EmiRecord, RecordId, RecordKind, RecordStore, SnapshotFeed,
    SnapshotSource,
};
use crate::{
    core::validation::{NewCollection, NewEmi},
    entities::{Collection, Emi, collection, emi},
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::marker::PhantomData;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, instrument, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A write happened in `owner`'s namespace for `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChangeNotice {
    owner: String,
    kind: RecordKind,
}

/// Record store over a `SeaORM` connection.
#[derive(Clone)]
pub struct DatabaseStore {
    db: DatabaseConnection,
    changes: broadcast::Sender<ChangeNotice>,
}

impl DatabaseStore {
    /// Wraps an open connection whose tables already exist.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn publish(&self, owner: &str, kind: RecordKind) {
        // No receivers just means nobody is subscribed yet
        let receivers = self
            .changes
            .send(ChangeNotice {
                owner: owner.to_string(),
                kind,
            })
            .unwrap_or(0);
        debug!(%kind, receivers, "Published change notice");
    }

    fn feed<T: Snapshotted>(&self, owner: &str) -> SnapshotFeed<T> {
        Box::new(DatabaseFeed::<T> {
            db: self.db.clone(),
            owner: owner.to_string(),
            changes: self.changes.subscribe(),
            stale: true,
            _record: PhantomData,
        })
    }
}

#[allow(clippy::cast_possible_wrap)] // month() is 1..=12
fn month_number(date: NaiveDate) -> i32 {
    date.month() as i32
}

#[async_trait]
impl RecordStore for DatabaseStore {
    #[instrument(skip(self))]
    async fn create_collection(&self, owner: &str, new: NewCollection) -> Result<RecordId> {
        let model = collection::ActiveModel {
            owner_uid: Set(owner.to_string()),
            date: Set(new.date),
            amount: Set(new.amount),
            month: Set(month_number(new.date)),
            year: Set(new.date.year()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let inserted = model.insert(&self.db).await?;
        info!(id = inserted.id, "Collection created");
        self.publish(owner, RecordKind::Collection);
        Ok(inserted.id)
    }

    #[instrument(skip(self))]
    async fn create_emi(&self, owner: &str, new: NewEmi) -> Result<RecordId> {
        let now = Utc::now();
        let model = emi::ActiveModel {
            owner_uid: Set(owner.to_string()),
            name: Set(new.name),
            amount: Set(new.amount),
            due_day: Set(new.due_day),
            start_date: Set(new.start_date),
            total_months: Set(new.total_months),
            paid_months: Set(0),
            is_paid_this_month: Set(false),
            paid_date: Set(None),
            created_at: Set(now),
            last_updated: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(&self.db).await?;
        info!(id = inserted.id, "EMI created");
        self.publish(owner, RecordKind::Emi);
        Ok(inserted.id)
    }

    #[instrument(skip(self))]
    async fn update_emi(&self, owner: &str, id: RecordId, patch: EmiPatch) -> Result<()> {
        let existing = Emi::find_by_id(id)
            .filter(emi::Column::OwnerUid.eq(owner))
            .one(&self.db)
            .await?
            .ok_or(Error::RecordNotFound {
                kind: RecordKind::Emi,
                id,
            })?;

        let mut active_model: emi::ActiveModel = existing.into();
        active_model.is_paid_this_month = Set(patch.is_paid_this_month);
        active_model.paid_date = Set(patch.paid_date);
        active_model.last_updated = Set(Utc::now());
        active_model.update(&self.db).await?;

        info!("EMI updated");
        self.publish(owner, RecordKind::Emi);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner: &str, kind: RecordKind, id: RecordId) -> Result<()> {
        let rows_affected = match kind {
            RecordKind::Collection => {
                Collection::delete_many()
                    .filter(collection::Column::Id.eq(id))
                    .filter(collection::Column::OwnerUid.eq(owner))
                    .exec(&self.db)
                    .await?
                    .rows_affected
            }
            RecordKind::Emi => {
                Emi::delete_many()
                    .filter(emi::Column::Id.eq(id))
                    .filter(emi::Column::OwnerUid.eq(owner))
                    .exec(&self.db)
                    .await?
                    .rows_affected
            }
        };

        if rows_affected == 0 {
            debug!("Nothing to delete");
        } else {
            info!("Record deleted");
            self.publish(owner, kind);
        }
        Ok(())
    }

    async fn subscribe_collections(&self, owner: &str) -> Result<SnapshotFeed<CollectionRecord>> {
        debug!(owner, "Subscribing to collections");
        Ok(self.feed(owner))
    }

    async fn subscribe_emis(&self, owner: &str) -> Result<SnapshotFeed<EmiRecord>> {
        debug!(owner, "Subscribing to EMIs");
        Ok(self.feed(owner))
    }
}

/// Record types that can be loaded as a full per-owner snapshot.
#[async_trait]
trait Snapshotted: Sized + Send + 'static {
    const KIND: RecordKind;

    async fn load(db: &DatabaseConnection, owner: &str) -> Result<Vec<Self>>;
}

#[async_trait]
impl Snapshotted for CollectionRecord {
    const KIND: RecordKind = RecordKind::Collection;

    async fn load(db: &DatabaseConnection, owner: &str) -> Result<Vec<Self>> {
        Collection::find()
            .filter(collection::Column::OwnerUid.eq(owner))
            .order_by_desc(collection::Column::Date)
            .order_by_desc(collection::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl Snapshotted for EmiRecord {
    const KIND: RecordKind = RecordKind::Emi;

    async fn load(db: &DatabaseConnection, owner: &str) -> Result<Vec<Self>> {
        Emi::find()
            .filter(emi::Column::OwnerUid.eq(owner))
            .order_by_asc(emi::Column::Id)
            .all(db)
            .await
            .map_err(Into::into)
    }
}

/// Live feed over the change channel.
///
/// `stale` lives in the struct, not the future: a notice is consumed only by flipping it,
/// and it is cleared only once a snapshot has been loaded. Dropping a pending
/// `next_snapshot` therefore loses nothing, and the next call loads again.
struct DatabaseFeed<T> {
    db: DatabaseConnection,
    owner: String,
    changes: broadcast::Receiver<ChangeNotice>,
    stale: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: Snapshotted> DatabaseFeed<T> {
    /// Waits until a notice for this feed arrives. `false` when the channel has closed.
    async fn wait_for_change(&mut self) -> bool {
        loop {
            match self.changes.recv().await {
                Ok(notice) if notice.owner == self.owner && notice.kind == T::KIND => return true,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    // Snapshots are full, so re-querying covers whatever was skipped
                    warn!(skipped, kind = %T::KIND, "Change feed lagged");
                    return true;
                }
                Err(RecvError::Closed) => {
                    debug!(kind = %T::KIND, "Change feed closed");
                    return false;
                }
            }
        }
    }
}

#[async_trait]
impl<T: Snapshotted> SnapshotSource<T> for DatabaseFeed<T> {
    async fn next_snapshot(&mut self) -> Option<Result<Vec<T>>> {
        if !self.stale {
            if !self.wait_for_change().await {
                return None;
            }
            self.stale = true;
        }
        let snapshot = T::load(&self.db, &self.owner).await;
        self.stale = false;
        Some(snapshot)
    }
}

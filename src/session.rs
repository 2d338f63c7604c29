//! Session state for one authenticated principal.
//!
//! Created on sign-in, dropped on sign-out. Holds the two in-memory list mirrors and the
//! EMI awaiting payment confirmation. The lists are only ever replaced whole, by the sync
//! engine, so a reader sees either the previous snapshot or the next one.

use crate::auth::Principal;
use crate::store::{CollectionRecord, EmiRecord, RecordId};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::trace;

/// Process-wide state for one signed-in principal.
#[derive(Debug)]
pub struct Session {
    principal: Principal,
    collections: RwLock<Arc<Vec<CollectionRecord>>>,
    emis: RwLock<Arc<Vec<EmiRecord>>>,
    pending_payment: Mutex<Option<RecordId>>,
}

impl Session {
    /// Starts an empty session for `principal`.
    #[must_use]
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            collections: RwLock::new(Arc::new(Vec::new())),
            emis: RwLock::new(Arc::new(Vec::new())),
            pending_payment: Mutex::new(None),
        }
    }

    /// The signed-in principal.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Namespace uid for store calls.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.principal.uid
    }

    /// Current collection list, most recent first.
    pub async fn collections(&self) -> Arc<Vec<CollectionRecord>> {
        Arc::clone(&*self.collections.read().await)
    }

    /// Current EMI list, in arrival order.
    pub async fn emis(&self) -> Arc<Vec<EmiRecord>> {
        Arc::clone(&*self.emis.read().await)
    }

    /// Swaps in a new collection snapshot and returns it.
    pub async fn replace_collections(
        &self,
        snapshot: Vec<CollectionRecord>,
    ) -> Arc<Vec<CollectionRecord>> {
        let snapshot = Arc::new(snapshot);
        *self.collections.write().await = Arc::clone(&snapshot);
        trace!(count = snapshot.len(), "Collections replaced");
        snapshot
    }

    /// Swaps in a new EMI snapshot and returns it.
    pub async fn replace_emis(&self, snapshot: Vec<EmiRecord>) -> Arc<Vec<EmiRecord>> {
        let snapshot = Arc::new(snapshot);
        *self.emis.write().await = Arc::clone(&snapshot);
        trace!(count = snapshot.len(), "EMIs replaced");
        snapshot
    }

    /// Looks up an EMI in the current list.
    pub async fn find_emi(&self, id: RecordId) -> Option<EmiRecord> {
        self.emis().await.iter().find(|emi| emi.id == id).cloned()
    }

    /// EMI awaiting payment confirmation, if any.
    pub async fn pending_payment(&self) -> Option<RecordId> {
        *self.pending_payment.lock().await
    }

    /// Records (or clears) the EMI awaiting payment confirmation.
    pub async fn set_pending_payment(&self, id: Option<RecordId>) {
        *self.pending_payment.lock().await = id;
    }
}

//! Write-then-reflect mutations.
//!
//! Every mutation goes `Idle -> Pending -> Committed | Failed`. The cache is
//! only touched after the backend confirms, so a failed call leaves it at its
//! last known-good value and can simply be issued again. Mutations on the same
//! id are not serialized: whichever response lands last wins.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use taskflow_shared::{Record, RecordId, Task, TaskPatch};

use crate::error::ClientError;
use crate::repository::Repository;
use crate::store::RecordStore;

pub type TaskMutationCoordinator = MutationCoordinator<Task>;

/// How many settled mutations `recent` remembers.
const SETTLED_HISTORY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Nothing issued for the record yet.
    Idle,
    Pending,
    Committed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    ToggleComplete,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub sequence: u64,
    pub kind: MutationKind,
    pub collection: &'static str,
    /// `None` for a create until the backend assigns an id.
    pub record_id: Option<RecordId>,
    pub state: MutationState,
}

pub struct MutationCoordinator<R: Record> {
    store: Arc<dyn RecordStore<R>>,
    repository: Arc<Repository<R>>,
    in_flight: Mutex<BTreeMap<u64, MutationRecord>>,
    settled: Mutex<VecDeque<MutationRecord>>,
    sequence: AtomicU64,
}

/// A mutation in flight. Dropping it moves it from `in_flight` to the settled
/// history; dropped while still pending (the caller's future was cancelled)
/// it is just forgotten.
struct Tracked<'a, R: Record> {
    coordinator: &'a MutationCoordinator<R>,
    record: MutationRecord,
}

impl<R: Record> Tracked<'_, R> {
    fn settle<T>(mut self, outcome: &Result<T, ClientError>) {
        self.record.state = if outcome.is_ok() {
            MutationState::Committed
        } else {
            MutationState::Failed
        };
        let record = &self.record;
        match outcome {
            Ok(_) => debug!(
                "{:?} #{} on {} {:?}: Pending -> Committed",
                record.kind, record.sequence, record.collection, record.record_id
            ),
            Err(err) => warn!(
                "{:?} #{} on {} {:?}: Pending -> Failed ({}): {err}",
                record.kind,
                record.sequence,
                record.collection,
                record.record_id,
                err.kind()
            ),
        }
    }
}

impl<R: Record> Drop for Tracked<'_, R> {
    fn drop(&mut self) {
        self.coordinator.in_flight.lock().remove(&self.record.sequence);
        if self.record.state == MutationState::Pending {
            info!("{:?} #{} abandoned while pending", self.record.kind, self.record.sequence);
            return;
        }
        let mut settled = self.coordinator.settled.lock();
        if settled.len() == SETTLED_HISTORY {
            settled.pop_front();
        }
        settled.push_back(self.record.clone());
    }
}

impl<R: Record> MutationCoordinator<R> {
    pub fn new(store: Arc<dyn RecordStore<R>>, repository: Arc<Repository<R>>) -> Self {
        Self {
            store,
            repository,
            in_flight: Mutex::new(BTreeMap::new()),
            settled: Mutex::new(VecDeque::new()),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn repository(&self) -> &Arc<Repository<R>> {
        &self.repository
    }

    /// Mutations currently waiting on the backend, oldest first.
    pub fn in_flight(&self) -> Vec<MutationRecord> {
        self.in_flight.lock().values().cloned().collect()
    }

    pub fn is_pending(&self, id: RecordId) -> bool {
        self.in_flight
            .lock()
            .values()
            .any(|mutation| mutation.record_id == Some(id))
    }

    /// The most recently settled mutations, oldest first.
    pub fn recent(&self) -> Vec<MutationRecord> {
        self.settled.lock().iter().cloned().collect()
    }

    /// `Pending` while a mutation on `id` is in flight, otherwise the outcome
    /// of the last remembered one, or `Idle`.
    pub fn state_of(&self, id: RecordId) -> MutationState {
        if self.is_pending(id) {
            return MutationState::Pending;
        }
        self.settled
            .lock()
            .iter()
            .rev()
            .find(|mutation| mutation.record_id == Some(id))
            .map_or(MutationState::Idle, |mutation| mutation.state)
    }

    fn begin(&self, kind: MutationKind, record_id: Option<RecordId>) -> Tracked<'_, R> {
        let record = MutationRecord {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            kind,
            collection: R::COLLECTION,
            record_id,
            state: MutationState::Pending,
        };
        self.in_flight.lock().insert(record.sequence, record.clone());
        Tracked {
            coordinator: self,
            record,
        }
    }

    /// Checks the draft locally (no network on failure), creates it remotely
    /// and appends the stored record to the cache.
    pub async fn create(&self, draft: R::Draft) -> Result<R, ClientError> {
        R::validate_draft(&draft).map_err(ClientError::invalid)?;
        let mut mutation = self.begin(MutationKind::Create, None);
        let outcome = match self.store.create(&draft).await {
            Ok(record) => {
                mutation.record.record_id = Some(record.id());
                self.repository.commit_created(record.clone()).map(|()| record)
            }
            Err(err) => Err(err),
        };
        mutation.settle(&outcome);
        outcome
    }

    /// Updates a cached record. An id missing from the cache fails with
    /// `NotFound` before any remote call.
    pub async fn update(&self, id: RecordId, patch: R::Patch) -> Result<R, ClientError> {
        self.run_update(MutationKind::Update, id, patch).await
    }

    /// Deletes remotely and excises the cache entry once confirmed. Deleting
    /// an id that is already gone reports the backend's `NotFound`.
    pub async fn delete(&self, id: RecordId) -> Result<(), ClientError> {
        let mutation = self.begin(MutationKind::Delete, Some(id));
        let outcome = match self.store.delete(id).await {
            Ok(true) => self.repository.commit_deleted(id),
            Ok(false) => Err(ClientError::Unknown(format!(
                "backend declined to delete {} record {id}",
                R::COLLECTION
            ))),
            Err(err) => Err(err),
        };
        mutation.settle(&outcome);
        outcome
    }

    async fn run_update(&self, kind: MutationKind, id: RecordId, patch: R::Patch) -> Result<R, ClientError> {
        self.repository.by_id(id)?;
        R::validate_patch(&patch).map_err(ClientError::invalid)?;
        let mutation = self.begin(kind, Some(id));
        let outcome = match self.store.update(id, &patch).await {
            Ok(record) if record.id() != id => Err(ClientError::Unknown(format!(
                "backend answered an update of {} record {id} with record {}",
                R::COLLECTION,
                record.id()
            ))),
            Ok(record) => self.repository.commit_updated(record.clone()).map(|()| record),
            Err(err) => Err(err),
        };
        mutation.settle(&outcome);
        outcome
    }
}

impl MutationCoordinator<Task> {
    /// Flips `completed` on a cached task.
    pub async fn toggle_complete(&self, id: RecordId) -> Result<Task, ClientError> {
        let current = self.repository.by_id(id)?;
        let patch = TaskPatch::new().completed(!current.completed);
        self.run_update(MutationKind::ToggleComplete, id, patch).await
    }
}

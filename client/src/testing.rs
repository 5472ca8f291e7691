//! In-process record store for exercising the core without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use taskflow_shared::{ApiFailure, ListOrder, MemoryCollection, Record, RecordId};
use tokio::sync::Notify;

use crate::error::ClientError;
use crate::store::RecordStore;

pub(crate) struct MemoryStore<R: Record> {
    records: Mutex<MemoryCollection<R>>,
    failures: Mutex<VecDeque<ClientError>>,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
    next_gates: Mutex<VecDeque<Arc<Notify>>>,
}

impl<R: Record> MemoryStore<R> {
    pub(crate) fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub(crate) fn with_records(records: Vec<R>) -> Self {
        Self {
            records: Mutex::new(MemoryCollection::with_records(records)),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
            next_gates: Mutex::new(VecDeque::new()),
        }
    }

    /// The next call fails with `err` instead of touching the records.
    pub(crate) fn fail_next(&self, err: ClientError) {
        self.failures.lock().push_back(err);
    }

    /// Every later call is applied at once but its response is held until
    /// the returned handle is notified, once per call.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Holds only the response of the next call not already claimed by an
    /// earlier `hold_next`. Takes precedence over `hold`.
    pub(crate) fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.next_gates.lock().push_back(gate.clone());
        gate
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn records(&self) -> Vec<R> {
        self.records.lock().iter().cloned().collect()
    }

    async fn answer<T>(
        &self,
        id: Option<RecordId>,
        work: impl FnOnce(&mut MemoryCollection<R>) -> Result<T, ApiFailure>,
    ) -> Result<T, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.next_gates.lock().pop_front().or_else(|| self.gate.lock().clone());
        let injected = self.failures.lock().pop_front();
        let result = match injected {
            Some(err) => Err(err),
            None => work(&mut self.records.lock()).map_err(|failure| ClientError::from_failure(failure, R::COLLECTION, id)),
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn list_all(&self, order: Option<&ListOrder>) -> Result<Vec<R>, ClientError> {
        self.answer(None, |records| records.list(order)).await
    }

    async fn get_by_id(&self, id: RecordId) -> Result<R, ClientError> {
        self.answer(Some(id), |records| records.get(id)).await
    }

    async fn create(&self, draft: &R::Draft) -> Result<R, ClientError> {
        self.answer(None, |records| records.create(draft.clone(), Utc::now())).await
    }

    async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R, ClientError> {
        self.answer(Some(id), |records| records.update(id, patch.clone())).await
    }

    async fn delete(&self, id: RecordId) -> Result<bool, ClientError> {
        self.answer(Some(id), |records| records.delete(id)).await
    }

    async fn search(&self, query: &str, fields: &[&str]) -> Result<Vec<R>, ClientError> {
        let fields: Vec<String> = fields.iter().map(|field| field.to_string()).collect();
        self.answer(None, |records| records.search(query, &fields)).await
    }
}

//! Session-scoped caches of the remote collections.
//!
//! A repository owns the only client-side copy of its collection. Readers get
//! clones or a borrowed slice under a short read lock; the lock is never held
//! across a network await, so queries stay available while a refresh or a
//! mutation is in flight. The cache changes only through `refresh` and the
//! crate-private commit methods the mutation coordinator calls after the
//! backend confirms a change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::RwLock;
use taskflow_shared::{Category, CategoryId, ListOrder, Record, RecordId, Task};

use crate::error::ClientError;
use crate::store::RecordStore;

pub type TaskRepository = Repository<Task>;
pub type CategoryRepository = Repository<Category>;

pub struct Repository<R: Record> {
    store: Arc<dyn RecordStore<R>>,
    order: Option<ListOrder>,
    cache: RwLock<Vec<R>>,
    loaded: AtomicBool,
    detached: AtomicBool,
}

impl<R: Record> Repository<R> {
    pub fn new(store: Arc<dyn RecordStore<R>>) -> Self {
        Self {
            store,
            order: None,
            cache: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
            detached: AtomicBool::new(false),
        }
    }

    /// Ask the backend for this ordering on every refresh.
    pub fn with_order(mut self, order: ListOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Replaces the whole cache with the backend's listing. On failure the
    /// previous cache is kept and the error returned.
    pub async fn refresh(&self) -> Result<usize, ClientError> {
        let records = match self.store.list_all(self.order.as_ref()).await {
            Ok(records) => records,
            Err(err) => {
                warn!("refreshing {} failed, keeping cached copy: {err}", R::COLLECTION);
                return Err(err);
            }
        };
        if self.is_detached() {
            info!("discarding {} listing that arrived after teardown", R::COLLECTION);
            return Err(ClientError::Detached);
        }
        let count = records.len();
        *self.cache.write() = records;
        self.loaded.store(true, Ordering::SeqCst);
        debug!("{} cache replaced with {count} records", R::COLLECTION);
        Ok(count)
    }

    /// True once a refresh has succeeded; an empty cache before that means
    /// "unknown", not "empty".
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    pub fn by_id(&self, id: RecordId) -> Result<R, ClientError> {
        self.cache
            .read()
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found::<R>(id))
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.cache.read().iter().any(|record| record.id() == id)
    }

    pub fn all(&self) -> Vec<R> {
        self.cache.read().clone()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Runs `f` over the cached records without cloning them.
    pub fn read<T>(&self, f: impl FnOnce(&[R]) -> T) -> T {
        f(&self.cache.read())
    }

    /// Backend-side search; the cache is not touched.
    pub async fn search_remote(&self, query: &str) -> Result<Vec<R>, ClientError> {
        self.store.search(query, R::SEARCHABLE).await
    }

    /// Stops applying responses. Used when the owning session is torn down.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    fn filtered(&self, keep: impl Fn(&R) -> bool) -> Vec<R> {
        self.cache.read().iter().filter(|record| keep(record)).cloned().collect()
    }

    /// Appends a record the backend just created. A record whose id is
    /// already cached (a refresh got there first) is replaced instead.
    pub(crate) fn commit_created(&self, record: R) -> Result<(), ClientError> {
        self.ensure_attached()?;
        let mut cache = self.cache.write();
        match cache.iter_mut().find(|cached| cached.id() == record.id()) {
            Some(cached) => *cached = record,
            None => cache.push(record),
        }
        Ok(())
    }

    /// Replaces a cached record in place with the backend's version. Last
    /// response in wins; a record deleted meanwhile is not resurrected.
    pub(crate) fn commit_updated(&self, record: R) -> Result<(), ClientError> {
        self.ensure_attached()?;
        let mut cache = self.cache.write();
        match cache.iter_mut().find(|cached| cached.id() == record.id()) {
            Some(cached) => *cached = record,
            None => debug!("{} record {} left the cache before its update landed", R::COLLECTION, record.id()),
        }
        Ok(())
    }

    pub(crate) fn commit_deleted(&self, id: RecordId) -> Result<(), ClientError> {
        self.ensure_attached()?;
        self.cache.write().retain(|record| record.id() != id);
        Ok(())
    }

    fn ensure_attached(&self) -> Result<(), ClientError> {
        if self.is_detached() {
            info!("dropping late {} response after teardown", R::COLLECTION);
            return Err(ClientError::Detached);
        }
        Ok(())
    }
}

impl Repository<Task> {
    pub fn by_category(&self, category_id: CategoryId) -> Vec<Task> {
        self.filtered(|task| task.category_id == Some(category_id))
    }

    pub fn completed(&self) -> Vec<Task> {
        self.filtered(|task| task.completed)
    }

    pub fn pending(&self) -> Vec<Task> {
        self.filtered(|task| !task.completed)
    }

    /// Case-insensitive substring match on title and notes.
    pub fn matching(&self, query: &str) -> Vec<Task> {
        self.filtered(|task| task.matches_query(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;
    use taskflow_shared::{CategoryDraft, TaskDraft};

    fn task_store() -> Arc<MemoryStore<Task>> {
        let now = chrono::Utc::now();
        let mut done = Task::from_draft(3, TaskDraft::new("File taxes").with_category(1), now);
        done.completed = true;
        Arc::new(MemoryStore::with_records(vec![
            Task::from_draft(1, TaskDraft::new("Buy milk").with_category(1), now),
            Task::from_draft(2, TaskDraft::new("Walk dog").with_notes("take the LEASH"), now),
            done,
        ]))
    }

    #[tokio::test]
    async fn refresh_fills_the_cache() {
        let store = task_store();
        let repository = TaskRepository::new(store.clone());
        assert!(!repository.is_loaded());
        assert_eq!(repository.refresh().await.unwrap(), 3);
        assert!(repository.is_loaded());
        assert_eq!(repository.by_id(2).unwrap().title, "Walk dog");
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_cache() {
        let store = task_store();
        let repository = TaskRepository::new(store.clone());
        repository.refresh().await.unwrap();

        store.fail_next(ClientError::Network("connection reset".to_string()));
        let err = repository.refresh().await.unwrap_err();
        assert_eq!(err.kind(), "network");
        assert_eq!(repository.len(), 3);
    }

    #[tokio::test]
    async fn first_failed_refresh_is_not_an_empty_collection() {
        let store = task_store();
        store.fail_next(ClientError::Network("offline".to_string()));
        let repository = TaskRepository::new(store);
        assert!(repository.refresh().await.is_err());
        assert!(!repository.is_loaded());
        assert!(repository.is_empty());
    }

    #[tokio::test]
    async fn queries_derive_from_the_cache() {
        let repository = TaskRepository::new(task_store());
        repository.refresh().await.unwrap();

        let ids = |tasks: Vec<Task>| tasks.into_iter().map(|task| task.id).collect::<Vec<_>>();
        assert_eq!(ids(repository.by_category(1)), vec![1, 3]);
        assert_eq!(ids(repository.completed()), vec![3]);
        assert_eq!(ids(repository.pending()), vec![1, 2]);
        assert_eq!(ids(repository.matching("leash")), vec![2]);
        assert_eq!(ids(repository.matching("")), vec![1, 2, 3]);
        assert_eq!(
            repository.by_id(9).unwrap_err(),
            ClientError::NotFound { collection: "tasks", id: 9 }
        );
    }

    #[tokio::test]
    async fn ordering_is_requested_from_the_backend() {
        let repository = TaskRepository::new(task_store()).with_order(ListOrder::desc("title"));
        repository.refresh().await.unwrap();
        let titles: Vec<String> = repository.all().into_iter().map(|task| task.title).collect();
        assert_eq!(titles, vec!["Walk dog", "File taxes", "Buy milk"]);
    }

    #[tokio::test]
    async fn detached_repository_ignores_late_listing() {
        let store = task_store();
        let gate = store.hold();
        let repository = Arc::new(TaskRepository::new(store));

        let pending = tokio::spawn({
            let repository = repository.clone();
            async move { repository.refresh().await }
        });
        tokio::task::yield_now().await;
        repository.detach();
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), Err(ClientError::Detached));
        assert!(repository.is_empty());
    }

    #[tokio::test]
    async fn category_repository_keeps_backend_counts() {
        let mut work = Category::from_draft(1, CategoryDraft::new("Work", "#5B47E0", "Briefcase"), chrono::Utc::now());
        work.task_count = 12;
        let repository = CategoryRepository::new(Arc::new(MemoryStore::with_records(vec![work])));
        repository.refresh().await.unwrap();
        assert_eq!(repository.by_id(1).unwrap().task_count, 12);
        assert_eq!(repository.all().len(), 1);
    }

    #[tokio::test]
    async fn remote_search_leaves_cache_alone() {
        let repository = TaskRepository::new(task_store());
        let found = repository.search_remote("milk").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repository.is_empty());
    }
}

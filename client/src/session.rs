//! The surface presentation code talks to.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use taskflow_shared::{
    derive_view, Category, CategoryDraft, CategoryId, CategoryPatch, Filter, FilterCounts, Task, TaskDraft, TaskId,
    TaskPatch,
};

use crate::config::ClientConfig;
use crate::coordinator::{MutationCoordinator, MutationRecord, MutationState, TaskMutationCoordinator};
use crate::error::ClientError;
use crate::http::HttpRecordStore;
use crate::repository::{CategoryRepository, TaskRepository};
use crate::store::RecordStore;

/// Owned copy of a derived view, detached from the cache lock.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskView {
    pub visible: Vec<Task>,
    pub counts: FilterCounts,
}

/// One user session: both repositories plus the coordinators that mutate
/// them. Dropping or closing the session stops any response still in flight
/// from landing in its caches.
pub struct TaskSession {
    tasks: Arc<TaskRepository>,
    categories: Arc<CategoryRepository>,
    task_mutations: TaskMutationCoordinator,
    category_mutations: MutationCoordinator<Category>,
}

impl TaskSession {
    pub fn new(task_store: Arc<dyn RecordStore<Task>>, category_store: Arc<dyn RecordStore<Category>>) -> Self {
        let tasks = Arc::new(TaskRepository::new(task_store.clone()));
        let categories = Arc::new(CategoryRepository::new(category_store.clone()));
        Self {
            task_mutations: MutationCoordinator::new(task_store, tasks.clone()),
            category_mutations: MutationCoordinator::new(category_store, categories.clone()),
            tasks,
            categories,
        }
    }

    /// Session against the HTTP record store described by `config`.
    pub fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let store = Arc::new(HttpRecordStore::new(config)?);
        Ok(Self::new(store.clone(), store))
    }

    pub fn tasks(&self) -> &Arc<TaskRepository> {
        &self.tasks
    }

    pub fn category_repository(&self) -> &Arc<CategoryRepository> {
        &self.categories
    }

    pub async fn load_tasks(&self) -> Result<usize, ClientError> {
        self.tasks.refresh().await
    }

    pub async fn load_categories(&self) -> Result<usize, ClientError> {
        self.categories.refresh().await
    }

    /// Refreshes both collections concurrently. Each repository keeps its own
    /// outcome; the first error, if any, is returned.
    pub async fn load_all(&self) -> Result<(), ClientError> {
        let (tasks, categories) = futures::join!(self.load_tasks(), self.load_categories());
        tasks?;
        categories?;
        Ok(())
    }

    pub fn get_filtered_tasks(&self, filter: Filter, query: &str) -> Vec<Task> {
        self.view_at(filter, query, &Local::now()).visible
    }

    pub fn get_filter_counts(&self) -> FilterCounts {
        self.get_filter_counts_at(&Local::now())
    }

    pub fn get_filter_counts_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> FilterCounts {
        self.tasks.read(|tasks| FilterCounts::of(tasks, now))
    }

    pub fn view(&self, filter: Filter, query: &str) -> TaskView {
        self.view_at(filter, query, &Local::now())
    }

    /// Visible tasks and counts from a single consistent read of the cache.
    pub fn view_at<Tz: TimeZone>(&self, filter: Filter, query: &str, now: &DateTime<Tz>) -> TaskView {
        self.tasks.read(|tasks| {
            let view = derive_view(tasks, filter, query, now);
            TaskView {
                visible: view.visible.into_iter().cloned().collect(),
                counts: view.counts,
            }
        })
    }

    pub fn completed_tasks(&self) -> Vec<Task> {
        self.tasks.completed()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.all()
    }

    /// The task's category, or `None` when it has none or it points at a
    /// category that no longer exists.
    pub fn category_for(&self, task: &Task) -> Option<Category> {
        task.category_id.and_then(|id| self.categories.by_id(id).ok())
    }

    /// Backend-side search over title and notes; the cache is not touched.
    pub async fn search_remote(&self, query: &str) -> Result<Vec<Task>, ClientError> {
        self.tasks.search_remote(query).await
    }

    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task, ClientError> {
        self.task_mutations.create(draft).await
    }

    pub async fn update_task(&self, id: TaskId, patch: TaskPatch) -> Result<Task, ClientError> {
        self.task_mutations.update(id, patch).await
    }

    pub async fn toggle_complete(&self, id: TaskId) -> Result<Task, ClientError> {
        self.task_mutations.toggle_complete(id).await
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        self.task_mutations.delete(id).await
    }

    pub async fn create_category(&self, draft: CategoryDraft) -> Result<Category, ClientError> {
        self.category_mutations.create(draft).await
    }

    pub async fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> Result<Category, ClientError> {
        self.category_mutations.update(id, patch).await
    }

    /// Tasks that referenced the category keep their dangling id.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ClientError> {
        self.category_mutations.delete(id).await
    }

    pub fn pending_mutations(&self) -> Vec<MutationRecord> {
        let mut pending = self.task_mutations.in_flight();
        pending.extend(self.category_mutations.in_flight());
        pending
    }

    pub fn is_task_pending(&self, id: TaskId) -> bool {
        self.task_mutations.is_pending(id)
    }

    pub fn task_state(&self, id: TaskId) -> MutationState {
        self.task_mutations.state_of(id)
    }

    pub fn close(&self) {
        self.tasks.detach();
        self.categories.detach();
    }
}

impl Drop for TaskSession {
    fn drop(&mut self) {
        self.close();
    }
}

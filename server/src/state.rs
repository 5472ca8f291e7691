use std::time::Duration;

use parking_lot::RwLock;
use taskflow_shared::{Category, MemoryCollection, Record, Task};

pub struct AppState {
    pub tasks: RwLock<MemoryCollection<Task>>,
    pub categories: RwLock<MemoryCollection<Category>>,
    pub latency: Duration,
}

impl AppState {
    pub fn new(tasks: Vec<Task>, categories: Vec<Category>, latency: Duration) -> Self {
        Self {
            tasks: RwLock::new(MemoryCollection::with_records(tasks)),
            categories: RwLock::new(MemoryCollection::with_records(categories)),
            latency,
        }
    }

    pub fn empty(latency: Duration) -> Self {
        Self::new(Vec::new(), Vec::new(), latency)
    }

    /// Simulated round-trip time, applied before any collection is locked.
    pub async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            actix_web::rt::time::sleep(self.latency).await;
        }
    }
}

/// A record type this server hosts a collection for.
pub trait Served: Record {
    fn collection(state: &AppState) -> &RwLock<MemoryCollection<Self>>;

    /// Adjusts a record on its way out. Derived fields are filled in here.
    fn present(record: Self, _state: &AppState) -> Self {
        record
    }
}

impl Served for Task {
    fn collection(state: &AppState) -> &RwLock<MemoryCollection<Self>> {
        &state.tasks
    }
}

impl Served for Category {
    fn collection(state: &AppState) -> &RwLock<MemoryCollection<Self>> {
        &state.categories
    }

    fn present(mut category: Self, state: &AppState) -> Self {
        let count = state
            .tasks
            .read()
            .iter()
            .filter(|task| task.category_id == Some(category.id))
            .count();
        category.task_count = u32::try_from(count).unwrap_or(u32::MAX);
        category
    }
}

//! Client-side synchronization core for a taskflow backend.
//!
//! Presentation code holds a [`TaskSession`]: it loads the task and category
//! collections into session-scoped caches, answers filter/search queries from
//! those caches and routes every mutation through the backend before the
//! cache reflects it.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod repository;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use coordinator::{MutationCoordinator, MutationKind, MutationRecord, MutationState, TaskMutationCoordinator};
pub use error::ClientError;
pub use http::HttpRecordStore;
pub use repository::{CategoryRepository, Repository, TaskRepository};
pub use session::{TaskSession, TaskView};
pub use store::RecordStore;

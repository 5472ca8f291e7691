//! Types shared by the taskflow backend, the synchronization core and its front ends.

pub mod collection;
pub mod filter;
pub mod model;
pub mod patch;
pub mod protocol;
pub mod record;
pub mod wire;

pub use collection::MemoryCollection;
pub use filter::{derive_view, DerivedView, Filter, FilterCounts};
pub use model::{Category, CategoryDraft, CategoryId, CategoryPatch, Priority, Task, TaskDraft, TaskId, TaskPatch};
pub use patch::Patch;
pub use protocol::{ApiFailure, DeleteResponse, FailureCode, FieldError, ListOrder, ListParams, SortDirection};
pub use record::{Record, RecordId};

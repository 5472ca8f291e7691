use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{Category, CategoryDraft, CategoryPatch, Task, TaskDraft, TaskPatch};
use crate::protocol::FieldError;

pub type RecordId = u64;

/// An entity stored in a named record-store collection.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name, also the URL segment.
    const COLLECTION: &'static str;
    /// Text fields a search runs against when none are named.
    const SEARCHABLE: &'static [&'static str];

    type Draft: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Patch: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn id(&self) -> RecordId;

    fn validate_draft(draft: &Self::Draft) -> Result<(), Vec<FieldError>>;

    fn validate_patch(patch: &Self::Patch) -> Result<(), Vec<FieldError>>;

    /// Builds the stored record; `id` and `now` are assigned by the store.
    fn from_draft(id: RecordId, draft: Self::Draft, now: DateTime<Utc>) -> Self;

    /// Applies a partial update. Identity fields are never touched.
    fn apply(&mut self, patch: Self::Patch);

    /// Value of a searchable text field, `None` when absent or unknown.
    fn text(&self, field: &str) -> Option<&str>;

    fn is_searchable(field: &str) -> bool {
        Self::SEARCHABLE.iter().any(|candidate| *candidate == field)
    }

    /// Compares two records on `field`; `None` when the field cannot be ordered.
    fn compare_field(&self, other: &Self, field: &str) -> Option<Ordering>;
}

fn required(field: &str, value: &str, label: &str) -> Option<FieldError> {
    value.trim().is_empty().then(|| FieldError::new(field, format!("{label} is required")))
}

fn non_blank(notes: Option<String>) -> Option<String> {
    notes.filter(|notes| !notes.trim().is_empty())
}

fn into_result(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl Record for Task {
    const COLLECTION: &'static str = "tasks";
    const SEARCHABLE: &'static [&'static str] = &["title", "notes"];

    type Draft = TaskDraft;
    type Patch = TaskPatch;

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate_draft(draft: &TaskDraft) -> Result<(), Vec<FieldError>> {
        into_result(required("title", &draft.title, "Title").into_iter().collect())
    }

    fn validate_patch(patch: &TaskPatch) -> Result<(), Vec<FieldError>> {
        let errors = patch
            .title
            .as_set()
            .and_then(|title| required("title", title, "Title"))
            .into_iter()
            .collect();
        into_result(errors)
    }

    fn from_draft(id: RecordId, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        Task {
            id,
            title: draft.title.trim().to_string(),
            completed: false,
            priority: draft.priority,
            category_id: draft.category_id,
            due_date: draft.due_date,
            notes: non_blank(draft.notes),
            created_at: now,
        }
    }

    fn apply(&mut self, patch: TaskPatch) {
        let TaskPatch {
            title,
            completed,
            priority,
            category_id,
            due_date,
            notes,
        } = patch;
        if let Some(title) = title.as_set() {
            self.title = title.trim().to_string();
        }
        completed.apply_to(&mut self.completed);
        priority.apply_to(&mut self.priority);
        category_id.apply_to(&mut self.category_id);
        due_date.apply_to(&mut self.due_date);
        if let Some(notes) = notes.as_set() {
            self.notes = non_blank(notes.clone());
        }
    }

    fn text(&self, field: &str) -> Option<&str> {
        match field {
            "title" => Some(self.title.as_str()),
            "notes" => self.notes.as_deref(),
            _ => None,
        }
    }

    fn compare_field(&self, other: &Self, field: &str) -> Option<Ordering> {
        let ordering = match field {
            "id" => self.id.cmp(&other.id),
            "title" => self.title.to_lowercase().cmp(&other.title.to_lowercase()),
            "completed" => self.completed.cmp(&other.completed),
            "priority" => self.priority.rank().cmp(&other.priority.rank()),
            "category_id" => self.category_id.cmp(&other.category_id),
            "due_date" => self.due_date.cmp(&other.due_date),
            "created_at" => self.created_at.cmp(&other.created_at),
            _ => return None,
        };
        Some(ordering)
    }
}

impl Record for Category {
    const COLLECTION: &'static str = "categories";
    const SEARCHABLE: &'static [&'static str] = &["name"];

    type Draft = CategoryDraft;
    type Patch = CategoryPatch;

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate_draft(draft: &CategoryDraft) -> Result<(), Vec<FieldError>> {
        into_result(required("name", &draft.name, "Name").into_iter().collect())
    }

    fn validate_patch(patch: &CategoryPatch) -> Result<(), Vec<FieldError>> {
        let errors = patch
            .name
            .as_set()
            .and_then(|name| required("name", name, "Name"))
            .into_iter()
            .collect();
        into_result(errors)
    }

    fn from_draft(id: RecordId, draft: CategoryDraft, _now: DateTime<Utc>) -> Self {
        Category {
            id,
            name: draft.name.trim().to_string(),
            color: draft.color,
            icon: draft.icon,
            task_count: 0,
        }
    }

    fn apply(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name.as_set() {
            self.name = name.trim().to_string();
        }
        patch.color.apply_to(&mut self.color);
        patch.icon.apply_to(&mut self.icon);
    }

    fn text(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(self.name.as_str()),
            _ => None,
        }
    }

    fn compare_field(&self, other: &Self, field: &str) -> Option<Ordering> {
        let ordering = match field {
            "id" => self.id.cmp(&other.id),
            "name" => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
            "task_count" => self.task_count.cmp(&other.task_count),
            _ => return None,
        };
        Some(ordering)
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::patch::Patch;
use crate::wire;

pub type TaskId = u64;
pub type CategoryId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Sort rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority `{other}`")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Task {
    #[serde(alias = "Id")]
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<CategoryId>,
    #[serde(default, alias = "dueDate", with = "wire::optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a task. The backend assigns `id`,
/// `created_at` and `completed`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<CategoryId>,
    #[serde(default, alias = "dueDate", with = "wire::optional_timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update of a task. `id` and `created_at` have no field here and so
/// can never be changed through a patch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub completed: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub priority: Patch<Priority>,
    #[serde(default, alias = "categoryId", skip_serializing_if = "Patch::is_unchanged")]
    pub category_id: Patch<Option<CategoryId>>,
    #[serde(
        default,
        alias = "dueDate",
        deserialize_with = "wire::patch_timestamp",
        skip_serializing_if = "Patch::is_unchanged"
    )]
    pub due_date: Patch<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub notes: Patch<Option<String>>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_unchanged()
            && self.completed.is_unchanged()
            && self.priority.is_unchanged()
            && self.category_id.is_unchanged()
            && self.due_date.is_unchanged()
            && self.notes.is_unchanged()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Patch::Set(title.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Patch::Set(completed);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Patch::Set(priority);
        self
    }

    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = Patch::Set(category_id);
        self
    }

    pub fn due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Patch::Set(due_date);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Patch::Set(notes);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Category {
    #[serde(alias = "Id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    /// Backend-reported number of tasks in this category; may be stale.
    #[serde(default, alias = "taskCount")]
    pub task_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub icon: String,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>, color: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub color: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unchanged")]
    pub icon: Patch<String>,
}

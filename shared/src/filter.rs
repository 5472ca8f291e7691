//! Derived task views: filter buckets, per-bucket counts and free-text search.
//!
//! Everything here is a pure function of the task slice, the active bucket, the
//! query and the current instant. Counts are always computed over the full
//! slice so that buckets the user is not looking at still show accurate numbers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Today,
    Overdue,
    Pending,
    High,
}

impl Filter {
    pub const EVERY: [Filter; 5] = [Filter::All, Filter::Today, Filter::Overdue, Filter::Pending, Filter::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Today => "today",
            Filter::Overdue => "overdue",
            Filter::Pending => "pending",
            Filter::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Filter::All => "All Tasks",
            Filter::Today => "Due Today",
            Filter::Overdue => "Overdue",
            Filter::Pending => "Pending",
            Filter::High => "High Priority",
        }
    }

    pub fn matches<Tz: TimeZone>(&self, task: &Task, now: &DateTime<Tz>) -> bool {
        match self {
            Filter::All => true,
            Filter::Today => task.is_due_today(now),
            Filter::Overdue => task.is_overdue(now),
            Filter::Pending => !task.completed,
            Filter::High => task.priority == Priority::High,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::EVERY
            .into_iter()
            .find(|filter| filter.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter `{s}`"))
    }
}

impl Task {
    /// Due strictly before `now` and not completed.
    pub fn is_overdue<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < *now)
    }

    /// Due on the calendar day of `now`, in `now`'s time zone, whether or not
    /// the task is completed.
    pub fn is_due_today<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.due_date
            .is_some_and(|due| due.with_timezone(&now.timezone()).date_naive() == now.date_naive())
    }

    /// Case-insensitive substring match against title and notes. `needle`
    /// must already be lowercased.
    fn contains_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .notes
                .as_deref()
                .is_some_and(|notes| notes.to_lowercase().contains(needle))
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.contains_lowercase(&query.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCounts {
    pub all: usize,
    pub today: usize,
    pub overdue: usize,
    pub pending: usize,
    pub high: usize,
}

impl FilterCounts {
    pub fn of<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Self {
        tasks.iter().fold(FilterCounts::default(), |mut counts, task| {
            counts.all += 1;
            counts.today += usize::from(task.is_due_today(now));
            counts.overdue += usize::from(task.is_overdue(now));
            counts.pending += usize::from(!task.completed);
            counts.high += usize::from(task.priority == Priority::High);
            counts
        })
    }

    pub fn get(&self, filter: Filter) -> usize {
        match filter {
            Filter::All => self.all,
            Filter::Today => self.today,
            Filter::Overdue => self.overdue,
            Filter::Pending => self.pending,
            Filter::High => self.high,
        }
    }
}

/// Tasks to display, in collection order, plus counts for every bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView<'a> {
    pub visible: Vec<&'a Task>,
    pub counts: FilterCounts,
}

/// Intersects the active bucket with the search query (trimmed; blank means no
/// search) without reordering.
pub fn derive_view<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    filter: Filter,
    query: &str,
    now: &DateTime<Tz>,
) -> DerivedView<'a> {
    let query = query.trim().to_lowercase();
    let visible = tasks
        .iter()
        .filter(|task| filter.matches(task, now))
        .filter(|task| query.is_empty() || task.contains_lowercase(&query))
        .collect();
    DerivedView {
        visible,
        counts: FilterCounts::of(tasks, now),
    }
}

use chrono::{DateTime, Duration, Utc};
use taskflow_shared::{Category, CategoryDraft, Priority, Record, Task, TaskDraft};

const CATEGORIES: [(&str, &str, &str); 5] = [
    ("Work", "#5B47E0", "Briefcase"),
    ("Personal", "#F59E0B", "User"),
    ("Health", "#10B981", "Heart"),
    ("Learning", "#3B82F6", "BookOpen"),
    ("Projects", "#EF4444", "Folder"),
];

pub fn categories(now: DateTime<Utc>) -> Vec<Category> {
    CATEGORIES
        .iter()
        .zip(1..)
        .map(|((name, color, icon), id)| Category::from_draft(id, CategoryDraft::new(*name, *color, *icon), now))
        .collect()
}

/// A small working set with due dates spread around `now`.
pub fn tasks(now: DateTime<Utc>) -> Vec<Task> {
    let drafts = [
        TaskDraft::new("Prepare quarterly report")
            .with_priority(Priority::High)
            .with_category(1)
            .with_due_date(now),
        TaskDraft::new("Reply to client emails")
            .with_category(1)
            .with_due_date(now - Duration::days(2)),
        TaskDraft::new("Book dentist appointment")
            .with_priority(Priority::Low)
            .with_category(3)
            .with_due_date(now + Duration::days(5)),
        TaskDraft::new("Finish Rust ownership chapter")
            .with_category(4)
            .with_notes("Borrowing and lifetimes"),
        TaskDraft::new("Plan weekend trip")
            .with_priority(Priority::Low)
            .with_category(2),
        TaskDraft::new("Ship landing page redesign")
            .with_priority(Priority::High)
            .with_category(5)
            .with_due_date(now - Duration::days(1)),
    ];

    let mut tasks: Vec<Task> = drafts
        .into_iter()
        .zip(1..)
        .map(|(draft, id)| Task::from_draft(id, draft, now - Duration::days(7)))
        .collect();
    if let Some(done) = tasks.get_mut(1) {
        done.completed = true;
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_consistent() {
        let now = Utc::now();
        let categories = categories(now);
        let tasks = tasks(now);
        assert_eq!(
            categories.iter().map(|category| category.name.as_str()).collect::<Vec<_>>(),
            vec!["Work", "Personal", "Health", "Learning", "Projects"]
        );
        assert!(tasks
            .iter()
            .filter_map(|task| task.category_id)
            .all(|id| categories.iter().any(|category| category.id == id)));
        assert!(tasks.iter().all(|task| !task.title.is_empty()));
        assert_eq!(tasks.iter().filter(|task| task.completed).count(), 1);
    }
}

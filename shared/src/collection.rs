//! Ordered in-memory record collection with the record-store semantics.

use chrono::{DateTime, Utc};

use crate::protocol::{ApiFailure, FieldError, ListOrder, SortDirection};
use crate::record::{Record, RecordId};

/// Records in insertion order plus an id counter that only moves forward,
/// so an id is never handed out twice even after deletions.
#[derive(Debug, Clone)]
pub struct MemoryCollection<R> {
    records: Vec<R>,
    next_id: RecordId,
}

impl<R: Record> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> MemoryCollection<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn with_records(records: Vec<R>) -> Self {
        let next_id = records.iter().map(Record::id).max().map_or(1, |max| max + 1);
        Self { records, next_id }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    pub fn list(&self, order: Option<&ListOrder>) -> Result<Vec<R>, ApiFailure> {
        let mut records = self.records.clone();
        if let Some(order) = order {
            sort_records(&mut records, order)?;
        }
        Ok(records)
    }

    pub fn get(&self, id: RecordId) -> Result<R, ApiFailure> {
        self.position(id)
            .map(|index| self.records[index].clone())
            .ok_or_else(|| ApiFailure::not_found(R::COLLECTION, id))
    }

    pub fn create(&mut self, draft: R::Draft, now: DateTime<Utc>) -> Result<R, ApiFailure> {
        R::validate_draft(&draft).map_err(|errors| invalid::<R>(errors))?;
        let record = R::from_draft(self.next_id, draft, now);
        self.next_id += 1;
        self.records.push(record.clone());
        Ok(record)
    }

    pub fn update(&mut self, id: RecordId, patch: R::Patch) -> Result<R, ApiFailure> {
        let index = self
            .position(id)
            .ok_or_else(|| ApiFailure::not_found(R::COLLECTION, id))?;
        R::validate_patch(&patch).map_err(|errors| invalid::<R>(errors))?;
        let record = &mut self.records[index];
        record.apply(patch);
        Ok(record.clone())
    }

    pub fn delete(&mut self, id: RecordId) -> Result<bool, ApiFailure> {
        let index = self
            .position(id)
            .ok_or_else(|| ApiFailure::not_found(R::COLLECTION, id))?;
        self.records.remove(index);
        Ok(true)
    }

    /// Case-insensitive substring search, OR across `fields`. An empty field
    /// list searches the record's default text fields.
    pub fn search(&self, query: &str, fields: &[String]) -> Result<Vec<R>, ApiFailure> {
        let fields: Vec<&str> = if fields.is_empty() {
            R::SEARCHABLE.to_vec()
        } else {
            fields.iter().map(String::as_str).collect()
        };
        let unknown: Vec<FieldError> = fields
            .iter()
            .filter(|field| !R::is_searchable(field))
            .map(|field| FieldError::new(*field, "field is not searchable"))
            .collect();
        if !unknown.is_empty() {
            return Err(invalid::<R>(unknown));
        }

        let needle = query.to_lowercase();
        Ok(self
            .records
            .iter()
            .filter(|record| {
                fields
                    .iter()
                    .filter_map(|field| record.text(field))
                    .any(|text| text.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }
}

fn invalid<R: Record>(errors: Vec<FieldError>) -> ApiFailure {
    ApiFailure::validation(format!("invalid {} record", R::COLLECTION), errors)
}

fn sort_records<R: Record>(records: &mut [R], order: &ListOrder) -> Result<(), ApiFailure> {
    let orderable = records
        .first()
        .map_or(true, |record| record.compare_field(record, &order.field).is_some());
    if !orderable {
        return Err(invalid::<R>(vec![FieldError::new(&order.field, "field cannot be ordered")]));
    }
    records.sort_by(|a, b| {
        let ordering = a.compare_field(b, &order.field).unwrap_or(std::cmp::Ordering::Equal);
        match order.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Task, TaskDraft, TaskPatch};
    use crate::protocol::FailureCode;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn seeded() -> MemoryCollection<Task> {
        let mut tasks = MemoryCollection::new();
        for title in ["Buy milk", "Walk dog", "Call mom"] {
            tasks.create(TaskDraft::new(title), now()).unwrap();
        }
        tasks
    }

    #[test]
    fn ids_are_never_reused() {
        let mut tasks = seeded();
        assert!(tasks.delete(3).unwrap());
        let next = tasks.create(TaskDraft::new("Read"), now()).unwrap();
        assert_eq!(next.id, 4);
    }

    #[test]
    fn with_records_continues_after_highest_id() {
        let existing = seeded().list(None).unwrap();
        let mut tasks = MemoryCollection::with_records(existing);
        assert_eq!(tasks.create(TaskDraft::new("Next"), now()).unwrap().id, 4);
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut tasks = seeded();
        assert_eq!(tasks.get(99).unwrap_err().code, FailureCode::NotFound);
        assert_eq!(tasks.update(99, TaskPatch::new()).unwrap_err().code, FailureCode::NotFound);
        assert!(tasks.delete(1).unwrap());
        assert_eq!(tasks.delete(1).unwrap_err().code, FailureCode::NotFound);
    }

    #[test]
    fn blank_titles_are_rejected() {
        let mut tasks = seeded();
        let failure = tasks.create(TaskDraft::new(""), now()).unwrap_err();
        assert_eq!(failure.code, FailureCode::ValidationError);
        assert_eq!(failure.field_errors[0].field, "title");
        assert_eq!(tasks.len(), 3);
    }

    #[test]
    fn ordering_by_title_descending() {
        let tasks = seeded();
        let titles: Vec<String> = tasks
            .list(Some(&ListOrder::desc("title")))
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect();
        assert_eq!(titles, vec!["Walk dog", "Call mom", "Buy milk"]);
        assert!(tasks.list(Some(&ListOrder::asc("colour"))).is_err());
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut tasks = seeded();
        tasks
            .update(2, TaskPatch::new().notes(Some("pick up MILK on the way".to_string())))
            .unwrap();
        let ids: Vec<u64> = tasks.search("milk", &[]).unwrap().iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![1, 2]);

        let titles_only: Vec<u64> = tasks
            .search("milk", &["title".to_string()])
            .unwrap()
            .iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(titles_only, vec![1]);

        assert!(tasks.search("milk", &["created_at".to_string()]).is_err());
    }
}

//! Request parameters and failure bodies exchanged with the record store.

use serde::{Deserialize, Serialize};

use crate::record::RecordId;

/// Validation problem attached to a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    NotFound,
    ValidationError,
    Internal,
    #[serde(other)]
    Unknown,
}

/// Structured failure returned by the record store in place of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub code: FailureCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl ApiFailure {
    pub fn not_found(collection: &str, id: RecordId) -> Self {
        Self {
            code: FailureCode::NotFound,
            message: format!("{collection} record {id} not found"),
            field_errors: Vec::new(),
        }
    }

    pub fn validation(message: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            code: FailureCode::ValidationError,
            message: message.into(),
            field_errors,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: FailureCode::Internal,
            message: message.into(),
            field_errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOrder {
    pub field: String,
    pub direction: SortDirection,
}

impl ListOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Query string of a collection listing: optional ordering and optional
/// search (`q` matched against the comma separated `fields`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl ListParams {
    pub fn ordered(order: &ListOrder) -> Self {
        Self {
            order_by: Some(order.field.clone()),
            direction: Some(order.direction),
            ..Self::default()
        }
    }

    pub fn search(query: &str, fields: &[&str]) -> Self {
        Self {
            q: Some(query.to_string()),
            fields: (!fields.is_empty()).then(|| fields.join(",")),
            ..Self::default()
        }
    }

    pub fn order(&self) -> Option<ListOrder> {
        self.order_by.as_ref().map(|field| ListOrder {
            field: field.clone(),
            direction: self.direction.unwrap_or_default(),
        })
    }

    pub fn search_fields(&self) -> Vec<String> {
        self.fields
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

use taskflow_shared::{ApiFailure, FailureCode, FieldError, Record, RecordId};

/// Every way a repository or mutation call can fail. A failure is never folded
/// into an empty result: callers always see which of these happened.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("{collection} record {id} not found")]
    NotFound { collection: &'static str, id: RecordId },

    #[error("validation failed: {message}")]
    Validation { message: String, fields: Vec<FieldError> },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected backend failure: {0}")]
    Unknown(String),

    /// The owning session was closed before the response arrived.
    #[error("session closed before the response arrived")]
    Detached,
}

impl ClientError {
    pub fn not_found<R: Record>(id: RecordId) -> Self {
        ClientError::NotFound {
            collection: R::COLLECTION,
            id,
        }
    }

    pub fn invalid(fields: Vec<FieldError>) -> Self {
        let message = fields
            .iter()
            .map(|field| field.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        ClientError::Validation { message, fields }
    }

    /// Short classification string for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::NotFound { .. } => "not_found",
            ClientError::Validation { .. } => "validation",
            ClientError::Network(_) => "network",
            ClientError::Unknown(_) => "unknown",
            ClientError::Detached => "detached",
        }
    }

    /// Short human-readable text for a status line or toast.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::NotFound { .. } => "That item no longer exists".to_string(),
            ClientError::Validation { message, .. } => message.clone(),
            ClientError::Network(_) => "Could not reach the server, try again".to_string(),
            ClientError::Unknown(message) => format!("Something went wrong: {message}"),
            ClientError::Detached => "The view was closed".to_string(),
        }
    }

    /// Classifies a structured backend failure for a call on `collection`
    /// (and `id`, when the call addressed a single record).
    pub(crate) fn from_failure(failure: ApiFailure, collection: &'static str, id: Option<RecordId>) -> Self {
        match (failure.code, id) {
            (FailureCode::NotFound, Some(id)) => ClientError::NotFound { collection, id },
            (FailureCode::ValidationError, _) => ClientError::Validation {
                message: failure.message,
                fields: failure.field_errors,
            },
            _ => ClientError::Unknown(failure.message),
        }
    }

    /// Classifies a non-success HTTP response. The status decides the
    /// category; the body, when it parses, supplies the details.
    pub(crate) fn from_status(
        status: u16,
        body: &str,
        collection: &'static str,
        id: Option<RecordId>,
    ) -> Self {
        let failure = serde_json::from_str::<ApiFailure>(body).ok();
        let message = failure
            .as_ref()
            .map(|failure| failure.message.clone())
            .unwrap_or_else(|| format!("HTTP {status}: {}", body.trim()));
        match (status, id) {
            (404, Some(id)) => ClientError::NotFound { collection, id },
            (400 | 422, _) => ClientError::Validation {
                message,
                fields: failure.map(|failure| failure.field_errors).unwrap_or_default(),
            },
            _ => ClientError::Unknown(message),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            ClientError::Unknown(format!("malformed response: {err}"))
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_shared::Task;

    #[test]
    fn status_codes_map_to_categories() {
        let not_found = ClientError::from_status(404, "", "tasks", Some(9));
        assert_eq!(not_found, ClientError::NotFound { collection: "tasks", id: 9 });

        let body = r#"{"code":"VALIDATION_ERROR","message":"invalid tasks record","field_errors":[{"field":"title","message":"Title is required"}]}"#;
        match ClientError::from_status(422, body, "tasks", None) {
            ClientError::Validation { message, fields } => {
                assert_eq!(message, "invalid tasks record");
                assert_eq!(fields, vec![FieldError::new("title", "Title is required")]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert_eq!(
            ClientError::from_status(503, "upstream down", "tasks", None),
            ClientError::Unknown("HTTP 503: upstream down".to_string())
        );
    }

    #[test]
    fn not_found_without_id_is_unknown() {
        let failure = ApiFailure::not_found("tasks", 3);
        assert!(matches!(
            ClientError::from_failure(failure, "tasks", None),
            ClientError::Unknown(_)
        ));
    }

    #[test]
    fn invalid_joins_field_messages() {
        let err = ClientError::invalid(vec![FieldError::new("title", "Title is required")]);
        assert_eq!(err.user_message(), "Title is required");
        assert_eq!(err.kind(), "validation");
        assert_eq!(ClientError::not_found::<Task>(2).to_string(), "tasks record 2 not found");
    }
}

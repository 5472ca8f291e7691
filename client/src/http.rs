use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use taskflow_shared::{DeleteResponse, FieldError, ListOrder, ListParams, Record, RecordId};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::store::RecordStore;

/// `RecordStore` for every record type, speaking JSON over HTTP to
/// `{base_url}/{collection}[/{id}]`.
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpRecordStore {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(&config.base_url).map_err(|err| {
            ClientError::invalid(vec![FieldError::new("base_url", format!("invalid base url: {err}"))])
        })?;
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::Unknown(format!("cannot build url for `{path}`: {err}")))
    }

    fn collection_url<R: Record>(&self) -> Result<Url, ClientError> {
        self.url(R::COLLECTION)
    }

    fn record_url<R: Record>(&self, id: RecordId) -> Result<Url, ClientError> {
        self.url(&format!("{}/{id}", R::COLLECTION))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        collection: &'static str,
        id: Option<RecordId>,
    ) -> Result<T, ClientError> {
        let result = match request.send().await {
            Ok(response) => read(response, collection, id).await,
            Err(err) => Err(ClientError::from(err)),
        };
        if let Err(err) = &result {
            warn!("{collection} request failed ({}): {err}", err.kind());
        }
        result
    }
}

async fn read<T: DeserializeOwned>(
    response: Response,
    collection: &'static str,
    id: Option<RecordId>,
) -> Result<T, ClientError> {
    let status = response.status();
    debug!("{} {} -> {status}", collection, response.url());
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::from_status(status.as_u16(), &body, collection, id))
}

#[async_trait]
impl<R: Record> RecordStore<R> for HttpRecordStore {
    async fn list_all(&self, order: Option<&ListOrder>) -> Result<Vec<R>, ClientError> {
        let params = order.map(ListParams::ordered).unwrap_or_default();
        let request = self.http.get(self.collection_url::<R>()?).query(&params);
        self.send(request, R::COLLECTION, None).await
    }

    async fn get_by_id(&self, id: RecordId) -> Result<R, ClientError> {
        let request = self.http.get(self.record_url::<R>(id)?);
        self.send(request, R::COLLECTION, Some(id)).await
    }

    async fn create(&self, draft: &R::Draft) -> Result<R, ClientError> {
        let request = self.http.post(self.collection_url::<R>()?).json(draft);
        self.send(request, R::COLLECTION, None).await
    }

    async fn update(&self, id: RecordId, patch: &R::Patch) -> Result<R, ClientError> {
        let request = self.http.patch(self.record_url::<R>(id)?).json(patch);
        self.send(request, R::COLLECTION, Some(id)).await
    }

    async fn delete(&self, id: RecordId) -> Result<bool, ClientError> {
        let request = self.http.delete(self.record_url::<R>(id)?);
        let response: DeleteResponse = self.send(request, R::COLLECTION, Some(id)).await?;
        Ok(response.deleted)
    }

    async fn search(&self, query: &str, fields: &[&str]) -> Result<Vec<R>, ClientError> {
        let params = ListParams::search(query, fields);
        let request = self.http.get(self.collection_url::<R>()?).query(&params);
        self.send(request, R::COLLECTION, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use taskflow_shared::{Category, Priority, Task, TaskDraft, TaskPatch};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> HttpRecordStore {
        HttpRecordStore::new(&ClientConfig::new(server.uri())).unwrap()
    }

    fn task_json(id: u64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "completed": false,
            "priority": "medium",
            "category_id": null,
            "due_date": null,
            "notes": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn list_all_normalizes_camel_case_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                task_json(1, "Buy milk"),
                {
                    "Id": 2,
                    "title": "Walk dog",
                    "completed": true,
                    "priority": "high",
                    "categoryId": 3,
                    "dueDate": "2024-02-01T09:00:00.000Z",
                    "createdAt": "2024-01-02T00:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let tasks: Vec<Task> = store_for(&server).list_all(None).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].id, 2);
        assert_eq!(tasks[1].category_id, Some(3));
        assert_eq!(tasks[1].priority, Priority::High);
        assert!(tasks[1].due_date.is_some());
    }

    #[tokio::test]
    async fn list_all_sends_ordering() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categories"))
            .and(query_param("order_by", "name"))
            .and(query_param("direction", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Work", "color": "#5B47E0", "icon": "Briefcase", "task_count": 4}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let categories: Vec<Category> = store_for(&server)
            .list_all(Some(&ListOrder::desc("name")))
            .await
            .unwrap();
        assert_eq!(categories[0].task_count, 4);
    }

    #[tokio::test]
    async fn create_writes_canonical_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(body_json(json!({
                "title": "Buy milk",
                "priority": "medium",
                "category_id": 2,
                "due_date": null
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(task_json(7, "Buy milk")))
            .expect(1)
            .mount(&server)
            .await;

        let created: Task = store_for(&server)
            .create(&TaskDraft::new("Buy milk").with_category(2))
            .await
            .unwrap();
        assert_eq!(created.id, 7);
    }

    #[tokio::test]
    async fn update_sends_only_changed_fields() {
        let server = MockServer::start().await;
        let mut body = task_json(3, "Call mom");
        body["completed"] = json!(true);
        Mock::given(method("PATCH"))
            .and(path("/tasks/3"))
            .and(body_json(json!({"completed": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let updated: Task = store_for(&server)
            .update(3, &TaskPatch::new().completed(true))
            .await
            .unwrap();
        assert!(updated.completed);
    }

    #[tokio::test]
    async fn delete_reads_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/tasks/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"deleted": true})))
            .mount(&server)
            .await;

        let deleted = RecordStore::<Task>::delete(&store_for(&server), 5).await.unwrap();
        assert!(deleted);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/42"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "NOT_FOUND",
                "message": "tasks record 42 not found"
            })))
            .mount(&server)
            .await;

        let err = RecordStore::<Task>::get_by_id(&store_for(&server), 42).await.unwrap_err();
        assert_eq!(err, ClientError::NotFound { collection: "tasks", id: 42 });
    }

    #[tokio::test]
    async fn rejected_fields_are_validation_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": "VALIDATION_ERROR",
                "message": "invalid tasks record",
                "field_errors": [{"field": "title", "message": "Title is required"}]
            })))
            .mount(&server)
            .await;

        let err = RecordStore::<Task>::create(&store_for(&server), &TaskDraft::new("x"))
            .await
            .unwrap_err();
        match err {
            ClientError::Validation { fields, .. } => assert_eq!(fields[0].field, "title"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_are_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "code": "INTERNAL",
                "message": "disk on fire"
            })))
            .mount(&server)
            .await;

        let err = RecordStore::<Task>::list_all(&store_for(&server), None).await.unwrap_err();
        assert_eq!(err, ClientError::Unknown("disk on fire".to_string()));
    }

    #[tokio::test]
    async fn malformed_success_body_is_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = RecordStore::<Task>::list_all(&store_for(&server), None).await.unwrap_err();
        assert_eq!(err.kind(), "unknown");
    }

    #[tokio::test]
    async fn slow_responses_time_out_as_network_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = ClientConfig::new(server.uri()).with_timeout(Duration::from_millis(50));
        let store = HttpRecordStore::new(&config).unwrap();
        let err = RecordStore::<Task>::list_all(&store, None).await.unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let store = HttpRecordStore::new(&ClientConfig::new(uri)).unwrap();
        let err = RecordStore::<Task>::list_all(&store, None).await.unwrap_err();
        assert_eq!(err.kind(), "network");
    }

    #[tokio::test]
    async fn search_sends_query_and_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .and(query_param("q", "milk"))
            .and(query_param("fields", "title,notes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(1, "Buy milk")])))
            .expect(1)
            .mount(&server)
            .await;

        let found: Vec<Task> = store_for(&server).search("milk", &["title", "notes"]).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let store = HttpRecordStore::new(&ClientConfig::new("http://example.test/api")).unwrap();
        assert_eq!(store.url("tasks/1").unwrap().as_str(), "http://example.test/api/tasks/1");
        assert!(HttpRecordStore::new(&ClientConfig::new("not a url")).is_err());
    }
}

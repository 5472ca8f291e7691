use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use chrono::Utc;
use log::debug;
use taskflow_shared::{ApiFailure, Category, DeleteResponse, FailureCode, ListParams, RecordId, Task};

use crate::state::{AppState, Served};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] ApiFailure);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0.code {
            FailureCode::NotFound => StatusCode::NOT_FOUND,
            FailureCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            FailureCode::Internal | FailureCode::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

fn rejected(message: String) -> actix_web::Error {
    ApiError(ApiFailure::validation(message, Vec::new())).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| rejected(format!("malformed body: {err}"))))
        .app_data(web::PathConfig::default().error_handler(|err, _| rejected(format!("malformed record id: {err}"))))
        .app_data(web::QueryConfig::default().error_handler(|err, _| rejected(format!("malformed query: {err}"))));
    collection::<Task>(cfg);
    collection::<Category>(cfg);
}

fn collection<R: Served>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(format!("/{}", R::COLLECTION))
            .route(web::get().to(list::<R>))
            .route(web::post().to(create::<R>)),
    )
    .service(
        web::resource(format!("/{}/{{id}}", R::COLLECTION))
            .route(web::get().to(get::<R>))
            .route(web::patch().to(update::<R>))
            .route(web::delete().to(delete::<R>)),
    );
}

/// Lists a collection, or searches it when `q` is non-blank.
async fn list<R: Served>(state: web::Data<AppState>, params: web::Query<ListParams>) -> Result<HttpResponse, ApiError> {
    state.simulate_latency().await;
    let params = params.into_inner();
    let records = {
        let collection = R::collection(&state).read();
        match params.q.as_deref().map(str::trim).filter(|query| !query.is_empty()) {
            Some(query) => collection.search(query, &params.search_fields())?,
            None => collection.list(params.order().as_ref())?,
        }
    };
    let records: Vec<R> = records.into_iter().map(|record| R::present(record, &state)).collect();
    Ok(HttpResponse::Ok().json(records))
}

async fn get<R: Served>(state: web::Data<AppState>, id: web::Path<RecordId>) -> Result<HttpResponse, ApiError> {
    state.simulate_latency().await;
    let record = R::collection(&state).read().get(id.into_inner())?;
    Ok(HttpResponse::Ok().json(R::present(record, &state)))
}

async fn create<R: Served>(state: web::Data<AppState>, draft: web::Json<R::Draft>) -> Result<HttpResponse, ApiError> {
    state.simulate_latency().await;
    let record = R::collection(&state).write().create(draft.into_inner(), Utc::now())?;
    debug!("created {} record {}", R::COLLECTION, record.id());
    Ok(HttpResponse::Created().json(R::present(record, &state)))
}

async fn update<R: Served>(
    state: web::Data<AppState>,
    id: web::Path<RecordId>,
    patch: web::Json<R::Patch>,
) -> Result<HttpResponse, ApiError> {
    state.simulate_latency().await;
    let record = R::collection(&state).write().update(id.into_inner(), patch.into_inner())?;
    Ok(HttpResponse::Ok().json(R::present(record, &state)))
}

async fn delete<R: Served>(state: web::Data<AppState>, id: web::Path<RecordId>) -> Result<HttpResponse, ApiError> {
    state.simulate_latency().await;
    let id = id.into_inner();
    let deleted = R::collection(&state).write().delete(id)?;
    debug!("deleted {} record {id}", R::COLLECTION);
    Ok(HttpResponse::Ok().json(DeleteResponse { deleted }))
}

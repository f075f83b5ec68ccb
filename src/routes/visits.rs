use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::info;

use crate::AppState;
use crate::auth::Authorized;
use crate::connection::ClientEndpoint;
use crate::error::ApiError;
use crate::models::{Visit, VisitRequest};
use crate::service::ServiceError;

const SOURCE: &str = "visit";

fn service_error(e: ServiceError) -> ApiError {
    ApiError::from_service(SOURCE, e)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/visit", get(list_visits).post(create_visit))
        .route(
            "/visit/{id}",
            get(get_visit).put(update_visit).delete(delete_visit),
        )
}

async fn list_visits(
    State(state): State<AppState>,
    _auth: Authorized,
) -> Result<Response, ApiError> {
    info!("Calling GetAllVisits");
    let visits = state.service.list_all().await.map_err(service_error)?;

    if visits.is_empty() && state.config.empty_list_not_found {
        return Err(ApiError::NotFound);
    }
    Ok(Json(visits).into_response())
}

async fn get_visit(
    State(state): State<AppState>,
    _auth: Authorized,
    Path(id): Path<String>,
) -> Result<Json<Visit>, ApiError> {
    info!("Calling GetVisit {id}");
    let visit = state.service.get_by_id(&id).await.map_err(service_error)?;
    visit.map(Json).ok_or(ApiError::NotFound)
}

async fn create_visit(
    State(state): State<AppState>,
    _auth: Authorized,
    ClientEndpoint(endpoints): ClientEndpoint,
    Json(request): Json<VisitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let visit = Visit::new(request, &endpoints);
    info!("Calling CreateVisit {}", visit.id);

    let created = state
        .service
        .create(&visit)
        .await
        .map_err(service_error)?
        .ok_or(ApiError::NotFound)?;

    let location = format!("/visit/{}", created.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

async fn update_visit(
    State(state): State<AppState>,
    _auth: Authorized,
    Path(id): Path<String>,
    ClientEndpoint(endpoints): ClientEndpoint,
    Json(request): Json<VisitRequest>,
) -> Result<Json<Visit>, ApiError> {
    info!("Calling UpdateVisit {id}");
    // Full replacement: endpoints and creation date come from this request.
    let visit = Visit::from_request(id, request, &endpoints);
    let updated = state
        .service
        .update(&visit)
        .await
        .map_err(service_error)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(updated))
}

async fn delete_visit(
    State(state): State<AppState>,
    _auth: Authorized,
    Path(id): Path<String>,
) -> Result<Json<Visit>, ApiError> {
    info!("Calling DeleteVisit {id}");
    let deleted = state.service.delete(&id).await.map_err(service_error)?;
    deleted.map(Json).ok_or(ApiError::NotFound)
}

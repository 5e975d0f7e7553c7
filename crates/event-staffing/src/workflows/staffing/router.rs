use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::authorization::{Principal, PrincipalRole};
use super::domain::{
    ApplicationId, ApplicationSubmission, ClothingItemId, DecisionRequest, EventId, HostId,
    NewEvent, ScheduleWindow,
};
use super::error::StaffingError;
use super::repository::StaffingStore;
use super::service::StaffingEngine;
use super::transport::TripPlan;
use super::wardrobe::Reservation;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

type Engine<S> = State<Arc<StaffingEngine<S>>>;

/// Router builder exposing the staffing workflow over HTTP.
pub fn staffing_router<S>(engine: Arc<StaffingEngine<S>>) -> Router
where
    S: StaffingStore + 'static,
{
    Router::new()
        .route("/api/v1/events", post(register_event::<S>))
        .route(
            "/api/v1/events/:event_id",
            get(event_status::<S>).delete(remove_event::<S>),
        )
        .route("/api/v1/events/:event_id/approve", post(approve_event::<S>))
        .route("/api/v1/events/:event_id/reject", post(reject_event::<S>))
        .route(
            "/api/v1/events/:event_id/applications",
            post(submit_application::<S>).get(list_applications::<S>),
        )
        .route(
            "/api/v1/events/:event_id/transportation",
            get(transportation_summary::<S>).put(plan_trip::<S>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_status::<S>),
        )
        .route(
            "/api/v1/applications/:application_id/decision",
            post(decide_application::<S>),
        )
        .route("/api/v1/hosts/:host_id/conflicts", get(host_conflicts::<S>))
        .route("/api/v1/wardrobe/reserve", post(reserve_stock::<S>))
        .route("/api/v1/wardrobe/release", post(release_stock::<S>))
        .route("/api/v1/wardrobe/restock", put(restock::<S>))
        .with_state(engine)
}

/// Reads the caller identity forwarded by the authenticating gateway.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, StaffingError> {
    let id = headers
        .get(PRINCIPAL_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| StaffingError::forbidden("missing caller identity"))?;
    let id = id
        .trim()
        .parse::<u64>()
        .map_err(|_| StaffingError::validation(format!("principal id '{id}' is not an integer")))?;

    let role = headers
        .get(PRINCIPAL_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(PrincipalRole::parse)
        .ok_or_else(|| StaffingError::forbidden("missing or unknown caller role"))?;

    Ok(Principal { id, role })
}

fn parse_id(raw: &str, what: &str) -> Result<u64, StaffingError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| StaffingError::validation(format!("{what} '{raw}' is not an integer")))
}

pub(crate) async fn register_event<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Json(draft): Json<NewEvent>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event = engine.events.register(&principal, draft)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub(crate) async fn event_status<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, StaffingError> {
    let event_id = EventId(parse_id(&event_id, "event id")?);
    Ok(Json(engine.events.get(event_id)?))
}

pub(crate) async fn remove_event<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event_id = EventId(parse_id(&event_id, "event id")?);
    engine.events.remove(&principal, event_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn approve_event<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event_id = EventId(parse_id(&event_id, "event id")?);
    Ok(Json(engine.events.approve(&principal, event_id)?))
}

pub(crate) async fn reject_event<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event_id = EventId(parse_id(&event_id, "event id")?);
    Ok(Json(engine.events.reject(&principal, event_id)?))
}

pub(crate) async fn submit_application<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Json(submission): Json<ApplicationSubmission>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event_id = EventId(parse_id(&event_id, "event id")?);
    let application = engine.applications.submit(
        &principal,
        HostId(principal.id),
        event_id,
        submission,
    )?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn list_applications<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event_id = EventId(parse_id(&event_id, "event id")?);
    Ok(Json(
        engine
            .applications
            .applications_for_event(&principal, event_id)?,
    ))
}

pub(crate) async fn application_status<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let application_id = ApplicationId(parse_id(&application_id, "application id")?);
    Ok(Json(engine.applications.get_as(&principal, application_id)?))
}

pub(crate) async fn decide_application<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let application_id = ApplicationId(parse_id(&application_id, "application id")?);
    Ok(Json(
        engine
            .applications
            .decide(&principal, application_id, request)?,
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConflictQuery {
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    #[serde(default)]
    exclude: Option<u64>,
}

pub(crate) async fn host_conflicts<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(host_id): Path<String>,
    Query(query): Query<ConflictQuery>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let host = HostId(parse_id(&host_id, "host id")?);
    principal.require_admin_or_host(host)?;

    let window = ScheduleWindow::new(query.starts_at, query.ends_at)
        .ok_or_else(|| StaffingError::validation("window must start before it ends"))?;
    let overlapping =
        engine
            .conflicts
            .has_conflict(host, &window, query.exclude.map(ApplicationId))?;

    Ok(Json(json!({
        "host_id": host,
        "conflict": !overlapping.is_empty(),
        "overlapping": overlapping,
    })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StockRequest {
    item: ClothingItemId,
    size: String,
    #[serde(default)]
    quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
struct StockResponse {
    item: ClothingItemId,
    size: String,
    quantity: u32,
}

pub(crate) async fn reserve_stock<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Json(request): Json<StockRequest>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let reservation = engine
        .wardrobe
        .reserve_as(&principal, request.item, &request.size)?;
    let quantity = engine.wardrobe.quantity(request.item, &request.size)?;
    let status = match reservation {
        Reservation::Reserved => StatusCode::OK,
        Reservation::OutOfStock => StatusCode::CONFLICT,
    };

    Ok((
        status,
        Json(json!({
            "reserved": reservation == Reservation::Reserved,
            "item": request.item,
            "size": request.size,
            "quantity": quantity,
        })),
    ))
}

pub(crate) async fn release_stock<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Json(request): Json<StockRequest>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let quantity = engine
        .wardrobe
        .release_as(&principal, request.item, &request.size)?;
    Ok(Json(StockResponse {
        item: request.item,
        size: request.size,
        quantity,
    }))
}

pub(crate) async fn restock<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Json(request): Json<StockRequest>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let quantity = request
        .quantity
        .ok_or_else(|| StaffingError::validation("restock requires a quantity"))?;
    engine
        .wardrobe
        .restock(&principal, request.item, &request.size, quantity)?;
    Ok(Json(StockResponse {
        item: request.item,
        size: request.size,
        quantity,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryQuery {
    #[serde(default)]
    worst_case_seats: Option<u32>,
}

pub(crate) async fn transportation_summary<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event_id = EventId(parse_id(&event_id, "event id")?);
    Ok(Json(engine.transport.summary_for(
        &principal,
        event_id,
        query.worst_case_seats,
    )?))
}

pub(crate) async fn plan_trip<S: StaffingStore + 'static>(
    State(engine): Engine<S>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    Json(plan): Json<TripPlan>,
) -> Result<impl IntoResponse, StaffingError> {
    let principal = principal_from_headers(&headers)?;
    let event_id = EventId(parse_id(&event_id, "event id")?);
    Ok(Json(engine.transport.plan_trip(&principal, event_id, plan)?))
}

//! HTTP endpoints implemented by the registry (spec section 4.5, 6).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use marketplace_store::Store;
use marketplace_types::{Agent, AgentFilter, BidRequest, RfpRequest, UnixTimestamp};
use tracing::instrument;

use crate::error::ApiError;
use crate::wire::{
    CancelRequest, DeliveryRequest, OpenRfpsQuery, RateRequest, ReputationResponse,
    SelectRequest, SubscribeRequest,
};

pub fn routes(store: Store) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/agents/register", post(post_register_agent))
        .route("/agents", get(get_agents))
        .route("/agents/{id}", get(get_agent))
        .route("/agents/{id}/subscribe", post(post_subscribe))
        .route("/agents/{id}/rate", post(post_rate))
        .route("/agents/{id}/reputation", get(get_reputation))
        .route("/rfp/create", post(post_create_rfp))
        .route("/rfp/open", get(get_open_rfps))
        .route("/rfp/{rfp_id}", get(get_rfp))
        .route("/rfp/{rfp_id}/bid", post(post_bid))
        .route("/rfp/{rfp_id}/bids", get(get_bids))
        .route("/rfp/{rfp_id}/select", post(post_select))
        .route("/rfp/{rfp_id}/cancel", post(post_cancel))
        .route("/assignments/{id}/delivery", post(post_delivery))
        .with_state(store)
}

#[instrument(skip_all)]
async fn get_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip(store))]
async fn post_register_agent(
    State(store): State<Store>,
    Json(agent): Json<Agent>,
) -> Result<impl IntoResponse, ApiError> {
    let registered = store.register_agent(agent)?;
    Ok((StatusCode::OK, Json(registered)))
}

#[instrument(skip(store))]
async fn get_agents(
    State(store): State<Store>,
    Query(filter): Query<AgentFilter>,
) -> impl IntoResponse {
    Json(store.list_agents(&filter))
}

#[instrument(skip(store))]
async fn get_agent(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    store
        .get_agent(&id)
        .map(Json)
        .ok_or_else(|| marketplace_types::MarketplaceError::NotFound(format!("agent {id}")).into())
}

#[instrument(skip(store))]
async fn post_subscribe(
    State(store): State<Store>,
    Path(id): Path<String>,
    Json(request): Json<SubscribeRequest>,
) -> impl IntoResponse {
    store.subscribe(&id, &request.task_type);
    StatusCode::OK
}

#[instrument(skip(store))]
async fn post_create_rfp(
    State(store): State<Store>,
    Json(request): Json<RfpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = now_or_error()?;
    let rfp = store.create_rfp(request, now)?;
    Ok((StatusCode::OK, Json(rfp)))
}

#[instrument(skip(store))]
async fn get_open_rfps(
    State(store): State<Store>,
    Query(query): Query<OpenRfpsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = now_or_error()?;
    let task_types = query.task_type_list();
    Ok(Json(store.list_open_rfps(&task_types, now)))
}

#[instrument(skip(store))]
async fn get_rfp(
    State(store): State<Store>,
    Path(rfp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    store
        .get_rfp(&rfp_id)
        .map(Json)
        .ok_or_else(|| marketplace_types::MarketplaceError::NotFound(format!("rfp {rfp_id}")).into())
}

#[instrument(skip(store))]
async fn post_bid(
    State(store): State<Store>,
    Path(rfp_id): Path<String>,
    Json(request): Json<BidRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = now_or_error()?;
    let caller = request.bidder_agent_id.clone();
    let bid = store.submit_bid(&rfp_id, &caller, request, now).await?;
    Ok((StatusCode::OK, Json(bid)))
}

#[instrument(skip(store))]
async fn get_bids(
    State(store): State<Store>,
    Path(rfp_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let now = now_or_error()?;
    Ok(Json(store.list_bids(&rfp_id, now)?))
}

#[instrument(skip(store))]
async fn post_select(
    State(store): State<Store>,
    Path(rfp_id): Path<String>,
    Json(request): Json<SelectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = now_or_error()?;
    let assignment = store
        .select_winner(&rfp_id, &request.selector_agent_id, &request.bid_id, now)
        .await?;
    Ok((StatusCode::OK, Json(assignment)))
}

#[instrument(skip(store))]
async fn post_cancel(
    State(store): State<Store>,
    Path(rfp_id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rfp = store.cancel_rfp(&rfp_id, &request.requester_agent_id).await?;
    Ok((StatusCode::OK, Json(rfp)))
}

#[instrument(skip(store))]
async fn post_delivery(
    State(store): State<Store>,
    Path(assignment_id): Path<String>,
    Json(request): Json<DeliveryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = store
        .record_delivery(&assignment_id, &request.tx_signature)
        .await?;
    Ok((StatusCode::OK, Json(assignment)))
}

#[instrument(skip(store))]
async fn post_rate(
    State(store): State<Store>,
    Path(_rated_agent_id): Path<String>,
    Json(request): Json<RateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = now_or_error()?;
    let rating = store
        .rate(
            &request.assignment_id,
            &request.rater_agent_id,
            request.stars,
            request.review,
            now,
        )
        .await?;
    Ok((StatusCode::OK, Json(rating)))
}

#[instrument(skip(store))]
async fn get_reputation(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = store.reputation_summary(&id)?;
    Ok(Json(ReputationResponse {
        mean: summary.mean,
        count: summary.count,
        histogram: summary.histogram,
    }))
}

fn now_or_error() -> Result<UnixTimestamp, ApiError> {
    UnixTimestamp::try_now()
        .map_err(|e| marketplace_types::MarketplaceError::UpstreamUnavailable(e.to_string()).into())
}

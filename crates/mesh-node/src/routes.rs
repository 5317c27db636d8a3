//! # HTTP Routes
//!
//! Thin handlers over the services. Every response body is a status
//! envelope; failures reported by another service keep their status and
//! message.

use crate::container::AppState;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use shared_rpc::RpcError;
use shared_types::{Identity, Response as Envelope, StatusCode};
use svc_gateway::{envelope_response, ops_router, AccessValidationLayer};
use svc_media::MediaError;
use svc_order::OrderError;
use svc_product::ProductError;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: u64,
}

#[derive(Debug, Deserialize)]
pub struct NewMedia {
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewOrder {
    pub product_ids: Vec<String>,
}

/// API routes behind access validation, plus the unprotected ops routes.
pub fn router(state: AppState, access: AccessValidationLayer) -> Router {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", get(get_product).delete(delete_product))
        .route("/products/:id/media", get(list_media).post(attach_media))
        .route("/orders", post(create_order))
        .route("/users/:id/orders", get(list_orders))
        .layer(access)
        .with_state(state)
        .merge(ops_router())
}

async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<NewProduct>,
) -> Response {
    match state
        .products
        .create_product(&identity.user_id, &body.name, &body.description, body.price_cents)
        .await
    {
        Ok(product) => envelope_response(Envelope::created(product)),
        Err(e) => envelope_response(product_failure(e)),
    }
}

async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.products.get_product(&id).await {
        Ok(product) => envelope_response(Envelope::ok(product)),
        Err(e) => envelope_response(product_failure(e)),
    }
}

async fn delete_product(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Response {
    match state.products.delete_product(&identity.user_id, &id).await {
        Ok(result) => envelope_response(Envelope::ok(result).with_message("Product deleted")),
        Err(e) => envelope_response(product_failure(e)),
    }
}

async fn list_media(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.media.media_for_product(&id).await {
        Ok(media) => envelope_response(Envelope::ok(media)),
        Err(e) => envelope_response(media_failure(e)),
    }
}

async fn attach_media(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(body): Json<NewMedia>,
) -> Response {
    match state
        .media
        .attach_media(&identity.user_id, &id, &body.file_name)
        .await
    {
        Ok(media) => envelope_response(Envelope::created(media)),
        Err(e) => envelope_response(media_failure(e)),
    }
}

async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<NewOrder>,
) -> Response {
    match state
        .orders
        .create_order(&identity.user_id, body.product_ids)
        .await
    {
        Ok(order) => envelope_response(Envelope::created(order)),
        Err(e) => envelope_response(order_failure(e)),
    }
}

async fn list_orders(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    match state.orders.orders_for_user(&user_id).await {
        Ok(orders) => envelope_response(Envelope::ok(orders)),
        Err(e) => envelope_response(order_failure(e)),
    }
}

fn unavailable(service: &str, e: &RpcError) -> Envelope<()> {
    error!(service = service, error = %e, "Downstream call failed");
    Envelope::error(
        StatusCode::SERVICE_UNAVAILABLE,
        format!("{service} service unavailable"),
    )
}

fn product_failure(e: ProductError) -> Envelope<()> {
    match e {
        ProductError::NotFound(_) => Envelope::not_found(e.to_string()),
        ProductError::Forbidden { .. } => Envelope::forbidden(e.to_string()),
        ProductError::Invalid(message) => Envelope::bad_request(message),
        ProductError::Media(reply) => reply,
        ProductError::Rpc(e) => unavailable("media", &e),
        ProductError::Repository(e) => Envelope::internal(e.to_string()),
    }
}

fn media_failure(e: MediaError) -> Envelope<()> {
    match e {
        MediaError::Invalid(message) => Envelope::bad_request(message),
        MediaError::Ownership(reply) => reply,
        MediaError::Rpc(e) => unavailable("product", &e),
        MediaError::Repository(e) => Envelope::internal(e.to_string()),
    }
}

fn order_failure(e: OrderError) -> Envelope<()> {
    match e {
        OrderError::Invalid(message) => Envelope::bad_request(message),
        OrderError::UnknownProducts(ids) => Envelope::validation("Unknown products", ids),
        OrderError::ProductService(reply) => reply,
        OrderError::Rpc(e) => unavailable("product", &e),
        OrderError::Repository(e) => Envelope::internal(e.to_string()),
    }
}

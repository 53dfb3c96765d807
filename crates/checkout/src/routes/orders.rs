//! Order placement and lookup routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use tamarind_core::{AccountId, Money, OrderId, ProductId};

use crate::error::{AppError, Result};
use crate::models::Order;
use crate::pricing::DiscountOutcome;
use crate::services::{PlaceOrder, RequestedItem, ShippingContact};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
}

/// Request body for `POST /orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<ItemPayload>,
    pub shipping: ShippingPayload,
    pub payment_method: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[serde(default)]
    pub redeem_points: i64,
    /// Authenticated purchaser, if any.
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShippingPayload {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
}

/// Response body for `POST /orders`.
#[derive(Debug, Serialize)]
pub struct PlacedOrderResponse {
    pub order: Order,
    pub coupon: DiscountOutcome,
}

/// `POST /orders` - place an order.
async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>)> {
    let placed = state.checkout().place_order(payload.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse {
            order: placed.order,
            coupon: placed.discount,
        }),
    ))
}

/// `GET /orders/{id}` - fetch a placed order with its status history.
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = state
        .checkout()
        .order(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(Json(order))
}

impl From<CreateOrderRequest> for PlaceOrder {
    fn from(payload: CreateOrderRequest) -> Self {
        Self {
            items: payload
                .items
                .into_iter()
                .map(|item| RequestedItem {
                    product_id: item.product_id,
                    name: item.name,
                    unit_price: item.unit_price,
                    quantity: item.quantity,
                    variant: item.variant,
                })
                .collect(),
            shipping: ShippingContact {
                name: payload.shipping.name,
                email: payload.shipping.email,
                phone: payload.shipping.phone,
                address: payload.shipping.address,
            },
            payment_method: payload.payment_method,
            coupon_code: payload.coupon_code,
            redeem_points: payload.redeem_points,
            account_id: payload.account_id,
        }
    }
}

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::instrument;

use super::{
    dto::{OrderDetailsView, OrderHistoryView},
    services,
};
use crate::{
    auth::extractors::{Authorized, Customer},
    db::CheckoutError,
    error::AppError,
    flash::{self, Level},
    state::AppState,
    views::{redirect, Page},
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/order", get(order_history))
        .route("/buy-now", get(buy_now))
        .route("/:user_id/order-details/:order_id", get(order_details))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn order_history(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
) -> Result<Page<OrderHistoryView>, AppError> {
    let orders = services::history(&state, auth.user.id).await?;
    Page::render(&auth.session, "My Orders", OrderHistoryView { orders }).await
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn buy_now(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
) -> Result<Response, AppError> {
    match services::place_order(&state, auth.user.id).await {
        Ok(_) => {
            flash::push(&auth.session, Level::Success, "Your order is placed successfully!")
                .await?;
            Ok(redirect("/order"))
        }
        Err(CheckoutError::InsufficientStock { product_id, available, .. }) => {
            let name = state
                .store
                .find_product(product_id)
                .await?
                .map_or_else(|| format!("product {product_id}"), |p| p.name);
            flash::push(
                &auth.session,
                Level::Danger,
                format!("Only {available} of {name} left in stock. Your order was not placed."),
            )
            .await?;
            Ok(redirect("/cart"))
        }
        Err(CheckoutError::Other(e)) => Err(AppError::Internal(e)),
    }
}

#[instrument(skip(state, auth))]
pub async fn order_details(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
    Path((user_id, order_id)): Path<(i64, i64)>,
) -> Result<Page<OrderDetailsView>, AppError> {
    if user_id != auth.user.id {
        return Err(AppError::AuthorizationDenied);
    }
    let order = state
        .store
        .find_order(order_id)
        .await?
        .filter(|order| order.user_id == auth.user.id)
        .ok_or_else(|| AppError::not_found("/order"))?;
    let lines = state.store.order_lines(order.id).await?;
    Page::render(&auth.session, "Order Details", OrderDetailsView::new(order, lines)).await
}

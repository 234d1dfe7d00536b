use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Form, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{DashboardView, ProductForm, ShopOrderDetailsView, ShopOrdersView, ShopProductsView},
    services,
};
use crate::{
    auth::extractors::{Authorized, ShopOwner, ShopOwnerOrAdmin},
    catalog::stats,
    db::models::ProductFilter,
    error::AppError,
    flash::{self, Level},
    state::AppState,
    views::{redirect, Page},
};

pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/dashboard", get(dashboard))
        .route("/shop/orders", get(orders))
        .route("/shop/:shop_id/order-details/:order_id", get(order_details))
        .route("/shop/products", get(products).post(add_product))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    auth: Authorized<ShopOwner>,
) -> Result<Page<DashboardView>, AppError> {
    let shop = services::owned_shop(&state, &auth.user).await?;
    let products = state.store.list_products(&ProductFilter::for_shop(shop.id)).await?;
    let view = DashboardView {
        shop,
        breakdown: stats::breakdown(&products),
    };
    Page::render(&auth.session, "Dashboard", view).await
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    auth: Authorized<ShopOwner>,
) -> Result<Page<ShopOrdersView>, AppError> {
    let shop = services::owned_shop(&state, &auth.user).await?;
    let order_ids = state.store.order_ids_for_shop(shop.id).await?;
    let view = ShopOrdersView {
        shop_id: shop.id,
        order_ids,
    };
    Page::render(&auth.session, "My Orders", view).await
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn order_details(
    State(state): State<AppState>,
    auth: Authorized<ShopOwnerOrAdmin>,
    Path((shop_id, order_id)): Path<(i64, i64)>,
) -> Result<Page<ShopOrderDetailsView>, AppError> {
    services::ensure_shop_access(&state, &auth.user, shop_id).await?;
    let lines = services::shop_order_lines(&state, shop_id, order_id).await?;
    if lines.is_empty() {
        return Err(AppError::not_found("/shop/orders"));
    }
    let view = ShopOrderDetailsView {
        shop_id,
        order_id,
        total: lines.iter().map(|l| l.total).sum(),
        lines,
    };
    Page::render(&auth.session, "Order Details", view).await
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn products(
    State(state): State<AppState>,
    auth: Authorized<ShopOwner>,
) -> Result<Page<ShopProductsView>, AppError> {
    let shop = services::owned_shop(&state, &auth.user).await?;
    let products = state.store.list_products(&ProductFilter::for_shop(shop.id)).await?;
    Page::render(&auth.session, "My Products", ShopProductsView { shop, products }).await
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn add_product(
    State(state): State<AppState>,
    auth: Authorized<ShopOwner>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let shop = services::owned_shop(&state, &auth.user).await?;
    let new_product = form
        .check(shop.id)
        .map_err(|e| AppError::validation("My Products", e))?;
    let product = state.store.create_product(new_product).await?;
    info!(shop_id = shop.id, product_id = product.id, "product added");
    flash::push(&auth.session, Level::Success, "Product has been added!").await?;
    Ok(redirect("/shop/products"))
}

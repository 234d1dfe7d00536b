//! Cart and wishlist. Mutations are plain GET links that redirect back to
//! the listing.

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use super::dto::{CartView, WishlistView};
use crate::{
    auth::extractors::{Authorized, Customer},
    db::models::Product,
    error::AppError,
    state::AppState,
    views::{redirect, Page},
};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart))
        .route("/add-to-cart/:id", get(add_to_cart))
        .route("/remove-from-cart/:id", get(remove_from_cart))
}

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(wishlist))
        .route("/add-to-wishlist/:id", get(add_to_wishlist))
        .route("/remove-from-wishlist/:id", get(remove_from_wishlist))
}

/// A product that may be put in a cart or wishlist.
async fn listed_product(state: &AppState, id: i64) -> Result<Product, AppError> {
    let product = state
        .store
        .find_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("/"))?;
    match state.store.find_shop(product.shop_id).await? {
        Some(shop) if shop.is_active => Ok(product),
        _ => Err(AppError::not_found("/")),
    }
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn cart(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
) -> Result<Page<CartView>, AppError> {
    let lines = state.store.cart_lines(auth.user.id).await?;
    Page::render(&auth.session, "Cart", CartView::from(lines)).await
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let product = listed_product(&state, id).await?;
    let item = state.store.add_to_cart(auth.user.id, product.id).await?;
    info!(product_id = product.id, quantity = item.quantity, "added to cart");
    Ok(redirect("/cart"))
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if state.store.remove_from_cart(auth.user.id, id).await? {
        info!(product_id = id, "removed from cart");
    }
    Ok(redirect("/cart"))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn wishlist(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
) -> Result<Page<WishlistView>, AppError> {
    let products = state.store.wishlist(auth.user.id).await?;
    Page::render(&auth.session, "Wishlist", WishlistView { products }).await
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let product = listed_product(&state, id).await?;
    if state.store.add_to_wishlist(auth.user.id, product.id).await? {
        info!(product_id = product.id, "added to wishlist");
    }
    Ok(redirect("/wishlist"))
}

#[instrument(skip(state, auth), fields(user_id = auth.user.id))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    auth: Authorized<Customer>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if state.store.remove_from_wishlist(auth.user.id, id).await? {
        info!(product_id = id, "removed from wishlist");
    }
    Ok(redirect("/wishlist"))
}

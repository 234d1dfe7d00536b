//! Admin back office. Every route requires an admin; unknown ids fall back
//! to a listing page.

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{
    CustomerOrdersView, DashboardView, ProductView, SalesView, ShopOrdersView, ShopProductsView,
    ShopRequest, ShopRequestsView, ShopRow, ShopSalesView, UserDetailsView,
};
use crate::{
    auth::{self, dto::AccountForm, extractors::{Admin, Authorized}},
    catalog::stats,
    db::models::{ProductFilter, Shop, User, UserType},
    error::AppError,
    flash::{self, Level},
    orders,
    state::AppState,
    views::{redirect, Page},
};

const DASHBOARD: &str = "/admin/dashboard";
const SHOP_REQUESTS: &str = "/admin/shop-requests";

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/shop-requests", get(shop_requests))
        .route("/admin/approve/:shop_id", get(approve))
        .route("/admin/reject/:shop_id", get(reject))
        .route(
            "/admin/user-details/:user_type/:user_id",
            get(user_details).post(update_user),
        )
        .route("/admin/sale-details", get(sale_details))
        .route("/admin/sale-details/:shop_id", get(shop_sale_details))
        .route("/admin/shop/:shop_id/products", get(shop_products))
        .route("/admin/product/:product_id", get(product_detail))
        .route("/admin/orders/customer/:user_id", get(customer_orders))
        .route("/admin/orders/shopuser/:shop_id", get(shop_orders))
}

async fn shop_rows(state: &AppState, shops: Vec<Shop>) -> anyhow::Result<Vec<ShopRow>> {
    let mut rows = Vec::with_capacity(shops.len());
    for shop in shops {
        let products = state.store.list_products(&ProductFilter::for_shop(shop.id)).await?;
        rows.push(ShopRow {
            totals: stats::shop_totals(&products),
            shop,
        });
    }
    Ok(rows)
}

async fn shop_or(state: &AppState, shop_id: i64, fallback: &str) -> Result<Shop, AppError> {
    state
        .store
        .find_shop(shop_id)
        .await?
        .ok_or_else(|| AppError::not_found(fallback))
}

/// A customer or shop user whose stored role matches the one in the path.
async fn managed_user(state: &AppState, user_type: &str, user_id: i64) -> Result<User, AppError> {
    let wanted = match user_type.parse::<UserType>() {
        Ok(UserType::Admin) | Err(_) => return Err(AppError::not_found(DASHBOARD)),
        Ok(wanted) => wanted,
    };
    state
        .store
        .find_user(user_id)
        .await?
        .filter(|user| user.user_type == wanted)
        .ok_or_else(|| AppError::not_found(DASHBOARD))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
) -> Result<Page<DashboardView>, AppError> {
    let customers = state.store.list_users(UserType::Customer).await?;
    let shop_users = state.store.list_users(UserType::ShopUser).await?;
    let shops = shop_rows(&state, state.store.list_shops(None).await?).await?;
    let view = DashboardView {
        customers,
        shop_users,
        shops,
    };
    Page::render(&auth.session, "Dashboard", view).await
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn shop_requests(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
) -> Result<Page<ShopRequestsView>, AppError> {
    let pending = state.store.list_shops(Some(false)).await?;
    let mut requests = Vec::with_capacity(pending.len());
    for shop in pending {
        let owner = state.store.find_user(shop.user_id).await?;
        requests.push(ShopRequest { shop, owner });
    }
    Page::render(&auth.session, "Shop Requests", ShopRequestsView { requests }).await
}

#[instrument(skip(state, auth))]
pub async fn approve(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(shop_id): Path<i64>,
) -> Result<Response, AppError> {
    if state.store.set_shop_active(shop_id, true).await? {
        info!(shop_id, admin_id = auth.user.id, "shop approved");
        flash::push(&auth.session, Level::Success, "Shop registration approved.").await?;
    } else {
        warn!(shop_id, "approve: no such shop");
    }
    Ok(redirect(SHOP_REQUESTS))
}

/// Rejection removes a pending shop together with the account that registered it.
/// Approved shops are left alone.
#[instrument(skip(state, auth))]
pub async fn reject(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(shop_id): Path<i64>,
) -> Result<Response, AppError> {
    match state.store.find_shop(shop_id).await? {
        None => warn!(shop_id, "reject: no such shop"),
        Some(shop) if shop.is_active => {
            warn!(shop_id, "reject: shop already approved");
            flash::push(&auth.session, Level::Warning, "Approved shops cannot be rejected.").await?;
        }
        Some(_) => {
            if state.store.delete_pending_shop(shop_id).await? {
                info!(shop_id, admin_id = auth.user.id, "shop rejected");
                flash::push(&auth.session, Level::Info, "Shop registration rejected.").await?;
            }
        }
    }
    Ok(redirect(SHOP_REQUESTS))
}

#[instrument(skip(state, auth))]
pub async fn user_details(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path((user_type, user_id)): Path<(String, i64)>,
) -> Result<Page<UserDetailsView>, AppError> {
    let user = managed_user(&state, &user_type, user_id).await?;
    let shop = state.store.shop_for_owner(user.id).await?;
    Page::render(&auth.session, "User Details", UserDetailsView { user, shop }).await
}

#[instrument(skip(state, auth, form))]
pub async fn update_user(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path((user_type, user_id)): Path<(String, i64)>,
    Form(form): Form<AccountForm>,
) -> Result<Response, AppError> {
    let user = managed_user(&state, &user_type, user_id).await?;
    auth::services::update_profile(&state, &user, &form, "User Details").await?;
    flash::push(&auth.session, Level::Success, "User details have been updated!").await?;
    Ok(redirect(&format!("/admin/user-details/{}/{}", user.user_type, user.id)))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn sale_details(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
) -> Result<Page<SalesView>, AppError> {
    let shops = shop_rows(&state, state.store.list_shops(None).await?).await?;
    Page::render(&auth.session, "Sale Details", SalesView { shops }).await
}

#[instrument(skip(state, auth))]
pub async fn shop_sale_details(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(shop_id): Path<i64>,
) -> Result<Page<ShopSalesView>, AppError> {
    let shop = shop_or(&state, shop_id, "/admin/sale-details").await?;
    let products = state.store.list_products(&ProductFilter::for_shop(shop.id)).await?;
    let view = ShopSalesView {
        shop,
        breakdown: stats::breakdown(&products),
        products,
    };
    Page::render(&auth.session, "Sale Details", view).await
}

#[instrument(skip(state, auth))]
pub async fn shop_products(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(shop_id): Path<i64>,
) -> Result<Page<ShopProductsView>, AppError> {
    let shop = shop_or(&state, shop_id, DASHBOARD).await?;
    let products = state.store.list_products(&ProductFilter::for_shop(shop.id)).await?;
    Page::render(&auth.session, "Products", ShopProductsView { shop, products }).await
}

#[instrument(skip(state, auth))]
pub async fn product_detail(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(product_id): Path<i64>,
) -> Result<Page<ProductView>, AppError> {
    let product = state
        .store
        .find_product(product_id)
        .await?
        .ok_or_else(|| AppError::not_found(DASHBOARD))?;
    let shop = state.store.find_shop(product.shop_id).await?;
    Page::render(&auth.session, "Product", ProductView { product, shop }).await
}

#[instrument(skip(state, auth))]
pub async fn customer_orders(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(user_id): Path<i64>,
) -> Result<Page<CustomerOrdersView>, AppError> {
    let customer = managed_user(&state, UserType::Customer.as_str(), user_id).await?;
    let orders = orders::services::history(&state, customer.id).await?;
    Page::render(&auth.session, "Orders", CustomerOrdersView { customer, orders }).await
}

#[instrument(skip(state, auth))]
pub async fn shop_orders(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    Path(shop_id): Path<i64>,
) -> Result<Page<ShopOrdersView>, AppError> {
    let shop = shop_or(&state, shop_id, DASHBOARD).await?;
    let order_ids = state.store.order_ids_for_shop(shop.id).await?;
    Page::render(&auth.session, "Orders", ShopOrdersView { shop, order_ids }).await
}

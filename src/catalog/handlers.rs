use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use tracing::instrument;

use super::{
    dto::{CatalogQuery, CatalogView, ProductView},
    stats,
};
use crate::{
    auth::extractors::Visitor,
    db::models::ProductFilter,
    error::AppError,
    state::AppState,
    views::Page,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/product/:id", get(product_detail))
}

#[instrument(skip(state, visitor))]
pub async fn home(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<CatalogQuery>,
) -> Result<Page<CatalogView>, AppError> {
    let filter = query.into_filter();
    let visible = state
        .store
        .list_products(&ProductFilter {
            active_shops_only: true,
            ..ProductFilter::default()
        })
        .await?;
    let products = visible.iter().filter(|p| filter.matches(p)).cloned().collect();
    let view = CatalogView {
        products,
        categories: stats::distinct(&visible, |p| p.category.as_str()),
        brands: stats::distinct(&visible, |p| p.brand.as_str()),
        category: filter.category,
        brand: filter.brand,
    };
    Page::render(&visitor.session, "Home", view).await
}

/// Products of shops awaiting approval are not public.
#[instrument(skip(state, visitor))]
pub async fn product_detail(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<i64>,
) -> Result<Page<ProductView>, AppError> {
    let product = state
        .store
        .find_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("/"))?;
    let shop = state
        .store
        .find_shop(product.shop_id)
        .await?
        .filter(|shop| shop.is_active)
        .ok_or_else(|| AppError::not_found("/"))?;
    Page::render(&visitor.session, "Product", ProductView { product, shop }).await
}

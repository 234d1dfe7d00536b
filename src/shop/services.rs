use tracing::warn;

use crate::{
    db::models::{Shop, User, UserType},
    error::AppError,
    orders::dto::OrderLineView,
    state::AppState,
};

/// The shop a shop user owns.
pub async fn owned_shop(state: &AppState, user: &User) -> Result<Shop, AppError> {
    match state.store.shop_for_owner(user.id).await? {
        Some(shop) => Ok(shop),
        None => {
            warn!(user_id = user.id, "shop user without a shop");
            Err(AppError::AuthorizationDenied)
        }
    }
}

/// Admins see every shop; a shop user only their own.
pub async fn ensure_shop_access(state: &AppState, user: &User, shop_id: i64) -> Result<(), AppError> {
    if user.user_type == UserType::Admin {
        return Ok(());
    }
    if user.user_type == UserType::ShopUser && owned_shop(state, user).await?.id == shop_id {
        return Ok(());
    }
    warn!(user_id = user.id, shop_id, "foreign shop requested");
    Err(AppError::AuthorizationDenied)
}

/// The lines of an order that belong to one shop's products.
pub async fn shop_order_lines(
    state: &AppState,
    shop_id: i64,
    order_id: i64,
) -> anyhow::Result<Vec<OrderLineView>> {
    let lines = state.store.order_lines(order_id).await?;
    Ok(lines
        .into_iter()
        .filter(|line| line.product.shop_id == shop_id)
        .map(|line| OrderLineView {
            total: line.total(),
            detail: line.detail,
            product: line.product,
        })
        .collect())
}

use anyhow::Context;
use tracing::{info, warn};

use super::dto::OrderSummary;
use crate::{
    catalog::stats,
    db::{models::Receipt, CheckoutError},
    state::AppState,
};

/// Order history with totals, newest first.
pub async fn history(state: &AppState, user_id: i64) -> anyhow::Result<Vec<OrderSummary>> {
    let orders = state.store.orders_for_user(user_id).await?;
    let mut out = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = state
            .store
            .order_lines(order.id)
            .await
            .with_context(|| format!("lines of order {}", order.id))?;
        out.push(OrderSummary {
            total: stats::order_total(&lines),
            item_count: stats::order_item_count(&lines),
            order,
        });
    }
    Ok(out)
}

/// Check out the user's cart.
pub async fn place_order(state: &AppState, user_id: i64) -> Result<Receipt, CheckoutError> {
    match state.store.checkout(user_id).await {
        Ok(receipt) => {
            info!(
                user_id,
                order_id = receipt.order.id,
                lines = receipt.details.len(),
                "order placed"
            );
            Ok(receipt)
        }
        Err(e) => {
            warn!(user_id, error = %e, "checkout failed");
            Err(e)
        }
    }
}

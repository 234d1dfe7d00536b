use serde::Serialize;

use crate::{
    catalog::stats,
    db::models::{Order, OrderDetail, OrderLine, Product},
};

/// One row of an order history.
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order: Order,
    pub total: i64,
    pub item_count: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderLineView {
    pub detail: OrderDetail,
    pub product: Product,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailsView {
    pub order: Order,
    pub lines: Vec<OrderLineView>,
    pub total: i64,
    pub item_count: i64,
}

impl OrderDetailsView {
    pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
        let total = stats::order_total(&lines);
        let item_count = stats::order_item_count(&lines);
        let lines = lines
            .into_iter()
            .map(|line| OrderLineView {
                total: line.total(),
                detail: line.detail,
                product: line.product,
            })
            .collect();
        Self {
            order,
            lines,
            total,
            item_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderHistoryView {
    pub orders: Vec<OrderSummary>,
}

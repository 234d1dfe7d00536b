use serde::Serialize;

use crate::{
    catalog::stats,
    db::models::{CartItem, CartLine, Product},
};

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub item: CartItem,
    pub product: Product,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: i64,
    pub item_count: i64,
}

impl From<Vec<CartLine>> for CartView {
    fn from(lines: Vec<CartLine>) -> Self {
        let total = stats::cart_total(&lines);
        let item_count = lines.iter().map(|l| i64::from(l.item.quantity)).sum();
        let lines = lines
            .into_iter()
            .map(|line| CartLineView {
                total: line.total(),
                item: line.item,
                product: line.product,
            })
            .collect();
        Self {
            lines,
            total,
            item_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub products: Vec<Product>,
}

//! Stock and sales aggregates over product rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::models::{CartLine, OrderLine, Product};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StockSummary {
    pub stock_qty: i64,
    pub sold_qty: i64,
}

impl StockSummary {
    fn add(&mut self, product: &Product) {
        self.stock_qty += i64::from(product.quantity);
        self.sold_qty += i64::from(product.sold_quantity);
    }
}

/// Per-category and per-brand totals, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub category: BTreeMap<String, StockSummary>,
    pub brand: BTreeMap<String, StockSummary>,
}

pub fn breakdown(products: &[Product]) -> Breakdown {
    let mut out = Breakdown::default();
    for product in products {
        out.category
            .entry(product.category.clone())
            .or_default()
            .add(product);
        out.brand.entry(product.brand.clone()).or_default().add(product);
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShopTotals {
    pub total_stock: i64,
    pub total_sold: i64,
}

pub fn shop_totals(products: &[Product]) -> ShopTotals {
    products.iter().fold(ShopTotals::default(), |acc, p| ShopTotals {
        total_stock: acc.total_stock + i64::from(p.quantity),
        total_sold: acc.total_sold + i64::from(p.sold_quantity),
    })
}

pub fn cart_total(lines: &[CartLine]) -> i64 {
    lines.iter().map(CartLine::total).sum()
}

pub fn order_total(lines: &[OrderLine]) -> i64 {
    lines.iter().map(OrderLine::total).sum()
}

pub fn order_item_count(lines: &[OrderLine]) -> i64 {
    lines.iter().map(|l| i64::from(l.detail.quantity)).sum()
}

/// Distinct values of one product attribute, sorted.
pub fn distinct<'a>(products: &'a [Product], field: impl Fn(&'a Product) -> &'a str) -> Vec<String> {
    let mut values: Vec<String> = products.iter().map(|p| field(p).to_string()).collect();
    values.sort();
    values.dedup();
    values
}

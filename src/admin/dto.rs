use serde::Serialize;

use crate::{
    catalog::stats::{Breakdown, ShopTotals},
    db::models::{Product, Shop, User},
    orders::dto::OrderSummary,
};

/// A shop with its stock and sales totals.
#[derive(Debug, Serialize)]
pub struct ShopRow {
    pub shop: Shop,
    #[serde(flatten)]
    pub totals: ShopTotals,
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub customers: Vec<User>,
    pub shop_users: Vec<User>,
    pub shops: Vec<ShopRow>,
}

#[derive(Debug, Serialize)]
pub struct ShopRequest {
    pub shop: Shop,
    pub owner: Option<User>,
}

#[derive(Debug, Serialize)]
pub struct ShopRequestsView {
    pub requests: Vec<ShopRequest>,
}

#[derive(Debug, Serialize)]
pub struct UserDetailsView {
    pub user: User,
    pub shop: Option<Shop>,
}

#[derive(Debug, Serialize)]
pub struct SalesView {
    pub shops: Vec<ShopRow>,
}

#[derive(Debug, Serialize)]
pub struct ShopSalesView {
    pub shop: Shop,
    #[serde(flatten)]
    pub breakdown: Breakdown,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ShopProductsView {
    pub shop: Shop,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub product: Product,
    pub shop: Option<Shop>,
}

#[derive(Debug, Serialize)]
pub struct CustomerOrdersView {
    pub customer: User,
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Serialize)]
pub struct ShopOrdersView {
    pub shop: Shop,
    pub order_ids: Vec<i64>,
}

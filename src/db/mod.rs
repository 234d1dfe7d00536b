//! Persistence seam.
//!
//! Handlers and services only talk to [`Store`]. [`pg::PgStore`] is the
//! production implementation; tests run against the in-memory store.

use async_trait::async_trait;

pub mod models;
pub mod pg;

#[cfg(test)]
pub mod memory;

use models::{
    CartItem, CartLine, NewProduct, NewUser, Order, OrderLine, Product, ProductFilter,
    ProfileUpdate, Receipt, Shop, User, UserType,
};

/// Why a checkout was not persisted. Nothing is written in either case.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("product {product_id} has {available} in stock, {requested} requested")]
    InsufficientStock {
        product_id: i64,
        requested: i32,
        available: i32,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    // ---- users ----

    /// Insert a user. A `shop_name` also creates the (inactive) shop in the same unit.
    async fn create_user(&self, user: NewUser, shop_name: Option<String>) -> anyhow::Result<User>;
    async fn find_user(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn list_users(&self, user_type: UserType) -> anyhow::Result<Vec<User>>;
    async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> anyhow::Result<()>;
    async fn set_password(&self, id: i64, password_hash: &str) -> anyhow::Result<()>;

    // ---- shops ----

    async fn find_shop(&self, id: i64) -> anyhow::Result<Option<Shop>>;
    async fn shop_for_owner(&self, user_id: i64) -> anyhow::Result<Option<Shop>>;
    /// All shops, or only those whose `is_active` equals `active`.
    async fn list_shops(&self, active: Option<bool>) -> anyhow::Result<Vec<Shop>>;
    /// Returns false when the shop does not exist.
    async fn set_shop_active(&self, id: i64, active: bool) -> anyhow::Result<bool>;
    /// Delete a not yet approved shop together with its owning user.
    /// Returns false when no pending shop has that id.
    async fn delete_pending_shop(&self, shop_id: i64) -> anyhow::Result<bool>;

    // ---- products ----

    async fn find_product(&self, id: i64) -> anyhow::Result<Option<Product>>;
    async fn list_products(&self, filter: &ProductFilter) -> anyhow::Result<Vec<Product>>;
    async fn create_product(&self, product: NewProduct) -> anyhow::Result<Product>;

    // ---- cart ----

    async fn cart_lines(&self, user_id: i64) -> anyhow::Result<Vec<CartLine>>;
    /// Create the row with quantity 1, or bump an existing row by one.
    async fn add_to_cart(&self, user_id: i64, product_id: i64) -> anyhow::Result<CartItem>;
    /// Returns whether a row was removed.
    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool>;

    // ---- wishlist ----

    async fn wishlist(&self, user_id: i64) -> anyhow::Result<Vec<Product>>;
    /// Returns whether a row was created.
    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool>;
    /// Returns whether a row was removed.
    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool>;

    // ---- orders ----

    /// Turn the user's whole cart into a completed order as one unit.
    async fn checkout(&self, user_id: i64) -> Result<Receipt, CheckoutError>;
    async fn find_order(&self, id: i64) -> anyhow::Result<Option<Order>>;
    async fn orders_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Order>>;
    async fn order_lines(&self, order_id: i64) -> anyhow::Result<Vec<OrderLine>>;
    /// Ids of orders with at least one line for a product of the shop, ascending.
    async fn order_ids_for_shop(&self, shop_id: i64) -> anyhow::Result<Vec<i64>>;
}

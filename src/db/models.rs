use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// A stored tag that does not name a known variant.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownTag {
    kind: &'static str,
    value: String,
}

/// Role tag stored in `users.user_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Admin,
    #[serde(rename = "shopuser")]
    ShopUser,
    Customer,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Admin => "admin",
            UserType::ShopUser => "shopuser",
            UserType::Customer => "customer",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserType::Admin),
            "shopuser" => Ok(UserType::ShopUser),
            "customer" => Ok(UserType::Customer),
            other => Err(UnknownTag {
                kind: "user type",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for UserType {
    type Error = UnknownTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub fullname: String,
    pub dob: Date,
    pub email: String,
    pub gender: String,
    pub address: String,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 hash, never rendered
    #[sqlx(try_from = "String")]
    pub user_type: UserType,
    pub image_file: String,
}

/// Values for a new `users` row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub dob: Date,
    pub email: String,
    pub gender: String,
    pub address: String,
    pub password_hash: String,
    pub user_type: UserType,
}

/// Editable profile fields, shared by the account page and the admin user editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub fullname: String,
    pub dob: Date,
    pub email: String,
    pub gender: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub is_active: bool, // false until an admin approves the registration
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub quantity: i32,      // available stock, never negative
    pub sold_quantity: i32, // cumulative units sold
    pub price: i64,
    pub category: String,
    pub brand: String,
    pub shop_id: i64,
    pub image_file: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub quantity: i32,
    pub price: i64,
    pub category: String,
    pub brand: String,
    pub shop_id: i64,
}

/// Catalog query. `None` fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub shop_id: Option<i64>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub active_shops_only: bool,
}

impl ProductFilter {
    pub fn for_shop(shop_id: i64) -> Self {
        Self {
            shop_id: Some(shop_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.shop_id.map_or(true, |id| product.shop_id == id)
            && self
                .category
                .as_deref()
                .map_or(true, |c| product.category == c)
            && self.brand.as_deref().map_or(true, |b| product.brand == b)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// A cart row joined with its product.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    pub fn total(&self) -> i64 {
        i64::from(self.item.quantity) * self.product.price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WishlistItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            _ => Err(UnknownTag {
                kind: "order status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub date_completed: OffsetDateTime,
}

/// Snapshot line item written once at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderDetail {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub detail: OrderDetail,
    pub product: Product,
}

impl OrderLine {
    pub fn total(&self) -> i64 {
        i64::from(self.detail.quantity) * self.product.price
    }
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub order: Order,
    pub details: Vec<OrderDetail>,
}

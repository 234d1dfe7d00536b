use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    auth::dto::field_error,
    catalog::stats::Breakdown,
    db::models::{NewProduct, Product, Shop},
    orders::dto::OrderLineView,
};

/// Add-product form. Numbers arrive as text so a malformed value is a field error.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProductForm {
    #[serde(default)]
    #[validate(length(max = 50, message = "Name must be between 1 and 50 characters."))]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "Category must be between 1 and 50 characters."))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 50, message = "Brand must be between 1 and 50 characters."))]
    pub brand: String,
}

impl ProductForm {
    pub fn check(&self, shop_id: i64) -> Result<NewProduct, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        let name = required(&mut errors, "name", &self.name);
        let category = required(&mut errors, "category", &self.category);
        let brand = required(&mut errors, "brand", &self.brand);
        let quantity =
            non_negative::<i32>(&mut errors, "quantity", &self.quantity, "Quantity cannot be negative.");
        let price = non_negative::<i64>(&mut errors, "price", &self.price, "Price cannot be negative.");
        match (quantity, price) {
            (Some(quantity), Some(price)) if errors.is_empty() => Ok(NewProduct {
                name,
                quantity,
                price,
                category,
                brand,
                shop_id,
            }),
            _ => Err(errors),
        }
    }
}

fn required(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, field_error("required", "This field is required."));
    }
    value.to_string()
}

fn non_negative<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: &str,
    negative: &'static str,
) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value >= T::default() => Some(value),
        Ok(_) => {
            errors.add(field, field_error("range", negative));
            None
        }
        Err(_) => {
            errors.add(field, field_error("integer", "Not a valid integer value."));
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub shop: Shop,
    #[serde(flatten)]
    pub breakdown: Breakdown,
}

#[derive(Debug, Serialize)]
pub struct ShopOrdersView {
    pub shop_id: i64,
    pub order_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ShopOrderDetailsView {
    pub shop_id: i64,
    pub order_id: i64,
    pub lines: Vec<OrderLineView>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct ShopProductsView {
    pub shop: Shop,
    pub products: Vec<Product>,
}

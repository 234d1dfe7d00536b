use serde::{Deserialize, Serialize};

use crate::db::models::{Product, ProductFilter, Shop};

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
}

impl CatalogQuery {
    /// Blank values do not filter.
    pub fn into_filter(self) -> ProductFilter {
        let keep = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        ProductFilter {
            category: keep(self.category),
            brand: keep(self.brand),
            active_shops_only: true,
            ..ProductFilter::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub products: Vec<Product>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub product: Product,
    pub shop: Shop,
}

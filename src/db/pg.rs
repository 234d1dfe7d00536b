use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info};

use super::models::{
    CartItem, CartLine, NewProduct, NewUser, Order, OrderDetail, OrderLine, OrderStatus, Product,
    ProductFilter, ProfileUpdate, Receipt, Shop, User, UserType,
};
use super::{CheckoutError, Store};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Connect and apply the embedded migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self::new(db))
    }

    async fn products_by_id(&self, ids: Vec<i64>) -> anyhow::Result<HashMap<i64, Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, sold_quantity, price, category, brand, shop_id, image_file
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await
        .context("load products by id")?;
        Ok(rows.into_iter().map(|p| (p.id, p)).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser, shop_name: Option<String>) -> anyhow::Result<User> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (fullname, dob, email, gender, address, password, user_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, fullname, dob, email, gender, address, password, user_type, image_file
            "#,
        )
        .bind(&user.fullname)
        .bind(user.dob)
        .bind(&user.email)
        .bind(&user.gender)
        .bind(&user.address)
        .bind(&user.password_hash)
        .bind(user.user_type.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("insert user")?;

        if let Some(name) = shop_name {
            sqlx::query("INSERT INTO shops (name, is_active, user_id) VALUES ($1, FALSE, $2)")
                .bind(&name)
                .bind(created.id)
                .execute(&mut *tx)
                .await
                .context("insert shop")?;
        }

        tx.commit().await.context("commit tx")?;
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, dob, email, gender, address, password, user_type, image_file
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, dob, email, gender, address, password, user_type, image_file
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn list_users(&self, user_type: UserType) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, fullname, dob, email, gender, address, password, user_type, image_file
            FROM users
            WHERE user_type = $1
            ORDER BY id
            "#,
        )
        .bind(user_type.as_str())
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET fullname = $1, dob = $2, email = $3, gender = $4, address = $5
             WHERE id = $6
            "#,
        )
        .bind(&profile.fullname)
        .bind(profile.dob)
        .bind(&profile.email)
        .bind(&profile.gender)
        .bind(&profile.address)
        .bind(id)
        .execute(&self.db)
        .await
        .context("update profile")?;
        Ok(())
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.db)
            .await
            .context("set password")?;
        Ok(())
    }

    async fn find_shop(&self, id: i64) -> anyhow::Result<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(
            "SELECT id, name, is_active, user_id FROM shops WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find shop")?;
        Ok(shop)
    }

    async fn shop_for_owner(&self, user_id: i64) -> anyhow::Result<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(
            "SELECT id, name, is_active, user_id FROM shops WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("find shop by owner")?;
        Ok(shop)
    }

    async fn list_shops(&self, active: Option<bool>) -> anyhow::Result<Vec<Shop>> {
        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, name, is_active, user_id
            FROM shops
            WHERE $1::BOOLEAN IS NULL OR is_active = $1
            ORDER BY id
            "#,
        )
        .bind(active)
        .fetch_all(&self.db)
        .await
        .context("list shops")?;
        Ok(shops)
    }

    async fn set_shop_active(&self, id: i64, active: bool) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE shops SET is_active = $1 WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(&self.db)
            .await
            .context("set shop active")?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete_pending_shop(&self, shop_id: i64) -> anyhow::Result<bool> {
        // users -> shops -> products cascade; sold products are RESTRICTed by order_details
        let res = sqlx::query(
            "DELETE FROM users WHERE id = (SELECT user_id FROM shops WHERE id = $1 AND NOT is_active)",
        )
        .bind(shop_id)
        .execute(&self.db)
        .await
        .context("delete shop owner")?;
        Ok(res.rows_affected() == 1)
    }

    async fn find_product(&self, id: i64) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, quantity, sold_quantity, price, category, brand, shop_id, image_file
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find product")?;
        Ok(product)
    }

    async fn list_products(&self, filter: &ProductFilter) -> anyhow::Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.quantity, p.sold_quantity, p.price, p.category, p.brand,
                   p.shop_id, p.image_file
            FROM products p
            JOIN shops s ON s.id = p.shop_id
            WHERE ($1::BIGINT IS NULL OR p.shop_id = $1)
              AND ($2::TEXT IS NULL OR p.category = $2)
              AND ($3::TEXT IS NULL OR p.brand = $3)
              AND (NOT $4 OR s.is_active)
            ORDER BY p.id
            "#,
        )
        .bind(filter.shop_id)
        .bind(filter.category.as_deref())
        .bind(filter.brand.as_deref())
        .bind(filter.active_shops_only)
        .fetch_all(&self.db)
        .await
        .context("list products")?;
        Ok(products)
    }

    async fn create_product(&self, product: NewProduct) -> anyhow::Result<Product> {
        let created = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, quantity, sold_quantity, price, category, brand, shop_id)
            VALUES ($1, $2, 0, $3, $4, $5, $6)
            RETURNING id, name, quantity, sold_quantity, price, category, brand, shop_id, image_file
            "#,
        )
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.brand)
        .bind(product.shop_id)
        .fetch_one(&self.db)
        .await
        .context("insert product")?;
        Ok(created)
    }

    async fn cart_lines(&self, user_id: i64) -> anyhow::Result<Vec<CartLine>> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT id, user_id, product_id, quantity FROM cart_items WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list cart items")?;

        let products = self
            .products_by_id(items.iter().map(|i| i.product_id).collect())
            .await?;
        Ok(items
            .into_iter()
            .filter_map(|item| {
                products
                    .get(&item.product_id)
                    .cloned()
                    .map(|product| CartLine { item, product })
            })
            .collect())
    }

    async fn add_to_cart(&self, user_id: i64, product_id: i64) -> anyhow::Result<CartItem> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + 1
            RETURNING id, user_id, product_id, quantity
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&self.db)
        .await
        .context("upsert cart item")?;
        debug!(user_id, product_id, quantity = item.quantity, "cart item upserted");
        Ok(item)
    }

    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.db)
            .await
            .context("delete cart item")?;
        Ok(res.rows_affected() > 0)
    }

    async fn wishlist(&self, user_id: i64) -> anyhow::Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.quantity, p.sold_quantity, p.price, p.category, p.brand,
                   p.shop_id, p.image_file
            FROM wishlist_items w
            JOIN products p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list wishlist")?;
        Ok(products)
    }

    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            INSERT INTO wishlist_items (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.db)
        .await
        .context("insert wishlist item")?;
        Ok(res.rows_affected() == 1)
    }

    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.db)
            .await
            .context("delete wishlist item")?;
        Ok(res.rows_affected() > 0)
    }

    async fn checkout(&self, user_id: i64) -> Result<Receipt, CheckoutError> {
        // Dropping `tx` on an early return rolls everything back.
        let mut tx = self.db.begin().await.context("begin checkout tx")?;

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (user_id, status, date_completed)
            VALUES ($1, $2, now())
            RETURNING id, user_id, status, date_completed
            "#,
        )
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await
        .context("insert order")?;

        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT id, user_id, product_id, quantity
            FROM cart_items
            WHERE user_id = $1
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await
        .context("load cart for checkout")?;

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            let updated = sqlx::query(
                r#"
                UPDATE products
                   SET quantity = quantity - $1,
                       sold_quantity = sold_quantity + $1
                 WHERE id = $2 AND quantity >= $1
                "#,
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await
            .context("decrement stock")?;

            if updated.rows_affected() == 0 {
                let available: Option<i32> =
                    sqlx::query_scalar("SELECT quantity FROM products WHERE id = $1")
                        .bind(item.product_id)
                        .fetch_optional(&mut *tx)
                        .await
                        .context("read stock")?;
                return Err(CheckoutError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: available.unwrap_or(0),
                });
            }

            let detail = sqlx::query_as::<_, OrderDetail>(
                r#"
                INSERT INTO order_details (order_id, product_id, quantity)
                VALUES ($1, $2, $3)
                RETURNING id, order_id, product_id, quantity
                "#,
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await
            .context("insert order detail")?;

            sqlx::query("DELETE FROM cart_items WHERE id = $1")
                .bind(item.id)
                .execute(&mut *tx)
                .await
                .context("consume cart item")?;

            details.push(detail);
        }

        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders
               SET status = $1, date_completed = now()
             WHERE id = $2
            RETURNING id, user_id, status, date_completed
            "#,
        )
        .bind(OrderStatus::Completed.as_str())
        .bind(order.id)
        .fetch_one(&mut *tx)
        .await
        .context("complete order")?;

        tx.commit().await.context("commit checkout")?;
        info!(user_id, order_id = order.id, lines = details.len(), "order persisted");
        Ok(Receipt { order, details })
    }

    async fn find_order(&self, id: i64) -> anyhow::Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, user_id, status, date_completed FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find order")?;
        Ok(order)
    }

    async fn orders_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, user_id, status, date_completed
            FROM orders
            WHERE user_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list orders")?;
        Ok(orders)
    }

    async fn order_lines(&self, order_id: i64) -> anyhow::Result<Vec<OrderLine>> {
        let details = sqlx::query_as::<_, OrderDetail>(
            r#"
            SELECT id, order_id, product_id, quantity
            FROM order_details
            WHERE order_id = $1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await
        .context("list order details")?;

        let products = self
            .products_by_id(details.iter().map(|d| d.product_id).collect())
            .await?;
        Ok(details
            .into_iter()
            .filter_map(|detail| {
                products
                    .get(&detail.product_id)
                    .cloned()
                    .map(|product| OrderLine { detail, product })
            })
            .collect())
    }

    async fn order_ids_for_shop(&self, shop_id: i64) -> anyhow::Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT d.order_id
            FROM order_details d
            JOIN products p ON p.id = d.product_id
            WHERE p.shop_id = $1
            ORDER BY d.order_id
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.db)
        .await
        .context("list shop orders")?;
        Ok(ids)
    }
}

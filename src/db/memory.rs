use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use super::models::{
    CartItem, CartLine, NewProduct, NewUser, Order, OrderDetail, OrderLine, OrderStatus, Product,
    ProductFilter, ProfileUpdate, Receipt, Shop, User, UserType, WishlistItem,
};
use super::{CheckoutError, Store};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    shops: BTreeMap<i64, Shop>,
    products: BTreeMap<i64, Product>,
    cart: BTreeMap<i64, CartItem>,
    wishlist: BTreeMap<i64, WishlistItem>,
    orders: BTreeMap<i64, Order>,
    details: BTreeMap<i64, OrderDetail>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Mirrors the foreign keys: products referenced by another user's order lines block the delete.
    fn delete_user(&mut self, user_id: i64) -> anyhow::Result<()> {
        let shop_ids: Vec<i64> = self
            .shops
            .values()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.id)
            .collect();
        let product_ids: Vec<i64> = self
            .products
            .values()
            .filter(|p| shop_ids.contains(&p.shop_id))
            .map(|p| p.id)
            .collect();
        let order_ids: Vec<i64> = self
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .map(|o| o.id)
            .collect();
        if self
            .details
            .values()
            .any(|d| !order_ids.contains(&d.order_id) && product_ids.contains(&d.product_id))
        {
            anyhow::bail!(
                "update or delete on table \"products\" violates foreign key constraint \
                 on table \"order_details\""
            );
        }

        self.users.remove(&user_id);
        self.shops.retain(|_, s| s.user_id != user_id);
        self.products.retain(|id, _| !product_ids.contains(id));
        self.orders.retain(|id, _| !order_ids.contains(id));
        self.cart
            .retain(|_, c| c.user_id != user_id && !product_ids.contains(&c.product_id));
        self.wishlist
            .retain(|_, w| w.user_id != user_id && !product_ids.contains(&w.product_id));
        self.details.retain(|_, d| !order_ids.contains(&d.order_id));
        Ok(())
    }
}

/// Process-local [`Store`] with the same observable contract as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser, shop_name: Option<String>) -> anyhow::Result<User> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }
        let id = t.id();
        let created = User {
            id,
            fullname: user.fullname,
            dob: user.dob,
            email: user.email,
            gender: user.gender,
            address: user.address,
            password: user.password_hash,
            user_type: user.user_type,
            image_file: "default.jpg".into(),
        };
        t.users.insert(id, created.clone());
        if let Some(name) = shop_name {
            let shop_id = t.id();
            t.shops.insert(
                shop_id,
                Shop {
                    id: shop_id,
                    name,
                    is_active: false,
                    user_id: id,
                },
            );
        }
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, user_type: UserType) -> anyhow::Result<Vec<User>> {
        let t = self.tables.lock().await;
        Ok(t.users
            .values()
            .filter(|u| u.user_type == user_type)
            .cloned()
            .collect())
    }

    async fn update_profile(&self, id: i64, profile: &ProfileUpdate) -> anyhow::Result<()> {
        let mut t = self.tables.lock().await;
        if t
            .users
            .values()
            .any(|u| u.id != id && u.email == profile.email)
        {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }
        if let Some(user) = t.users.get_mut(&id) {
            user.fullname = profile.fullname.clone();
            user.dob = profile.dob;
            user.email = profile.email.clone();
            user.gender = profile.gender.clone();
            user.address = profile.address.clone();
        }
        Ok(())
    }

    async fn set_password(&self, id: i64, password_hash: &str) -> anyhow::Result<()> {
        if let Some(user) = self.tables.lock().await.users.get_mut(&id) {
            user.password = password_hash.to_string();
        }
        Ok(())
    }

    async fn find_shop(&self, id: i64) -> anyhow::Result<Option<Shop>> {
        Ok(self.tables.lock().await.shops.get(&id).cloned())
    }

    async fn shop_for_owner(&self, user_id: i64) -> anyhow::Result<Option<Shop>> {
        let t = self.tables.lock().await;
        Ok(t.shops.values().find(|s| s.user_id == user_id).cloned())
    }

    async fn list_shops(&self, active: Option<bool>) -> anyhow::Result<Vec<Shop>> {
        let t = self.tables.lock().await;
        Ok(t.shops
            .values()
            .filter(|s| active.map_or(true, |a| s.is_active == a))
            .cloned()
            .collect())
    }

    async fn set_shop_active(&self, id: i64, active: bool) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        Ok(match t.shops.get_mut(&id) {
            Some(shop) => {
                shop.is_active = active;
                true
            }
            None => false,
        })
    }

    async fn delete_pending_shop(&self, shop_id: i64) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let Some(owner) = t
            .shops
            .get(&shop_id)
            .filter(|s| !s.is_active)
            .map(|s| s.user_id)
        else {
            return Ok(false);
        };
        t.delete_user(owner)?;
        Ok(true)
    }

    async fn find_product(&self, id: i64) -> anyhow::Result<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> anyhow::Result<Vec<Product>> {
        let t = self.tables.lock().await;
        Ok(t.products
            .values()
            .filter(|p| filter.matches(p))
            .filter(|p| {
                !filter.active_shops_only
                    || t.shops.get(&p.shop_id).is_some_and(|s| s.is_active)
            })
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> anyhow::Result<Product> {
        let mut t = self.tables.lock().await;
        anyhow::ensure!(t.shops.contains_key(&product.shop_id), "unknown shop");
        anyhow::ensure!(product.quantity >= 0, "quantity must not be negative");
        let id = t.id();
        let created = Product {
            id,
            name: product.name,
            quantity: product.quantity,
            sold_quantity: 0,
            price: product.price,
            category: product.category,
            brand: product.brand,
            shop_id: product.shop_id,
            image_file: "placeholder.jpg".into(),
        };
        t.products.insert(id, created.clone());
        Ok(created)
    }

    async fn cart_lines(&self, user_id: i64) -> anyhow::Result<Vec<CartLine>> {
        let t = self.tables.lock().await;
        Ok(t.cart
            .values()
            .filter(|c| c.user_id == user_id)
            .filter_map(|item| {
                t.products.get(&item.product_id).map(|product| CartLine {
                    item: item.clone(),
                    product: product.clone(),
                })
            })
            .collect())
    }

    async fn add_to_cart(&self, user_id: i64, product_id: i64) -> anyhow::Result<CartItem> {
        let mut t = self.tables.lock().await;
        anyhow::ensure!(t.products.contains_key(&product_id), "unknown product");
        if let Some(item) = t
            .cart
            .values_mut()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
        {
            item.quantity += 1;
            return Ok(item.clone());
        }
        let id = t.id();
        let item = CartItem {
            id,
            user_id,
            product_id,
            quantity: 1,
        };
        t.cart.insert(id, item.clone());
        Ok(item)
    }

    async fn remove_from_cart(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let before = t.cart.len();
        t.cart
            .retain(|_, c| !(c.user_id == user_id && c.product_id == product_id));
        Ok(t.cart.len() != before)
    }

    async fn wishlist(&self, user_id: i64) -> anyhow::Result<Vec<Product>> {
        let t = self.tables.lock().await;
        Ok(t.wishlist
            .values()
            .filter(|w| w.user_id == user_id)
            .filter_map(|w| t.products.get(&w.product_id).cloned())
            .collect())
    }

    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        anyhow::ensure!(t.products.contains_key(&product_id), "unknown product");
        if t
            .wishlist
            .values()
            .any(|w| w.user_id == user_id && w.product_id == product_id)
        {
            return Ok(false);
        }
        let id = t.id();
        t.wishlist.insert(
            id,
            WishlistItem {
                id,
                user_id,
                product_id,
            },
        );
        Ok(true)
    }

    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().await;
        let before = t.wishlist.len();
        t.wishlist
            .retain(|_, w| !(w.user_id == user_id && w.product_id == product_id));
        Ok(t.wishlist.len() != before)
    }

    async fn checkout(&self, user_id: i64) -> Result<Receipt, CheckoutError> {
        let mut t = self.tables.lock().await;
        let items: Vec<CartItem> = t
            .cart
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();

        // Validate before mutating so a failed checkout leaves no trace.
        for item in &items {
            let available = t.products.get(&item.product_id).map_or(0, |p| p.quantity);
            if available < item.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available,
                });
            }
        }

        let order_id = t.id();
        t.orders.insert(
            order_id,
            Order {
                id: order_id,
                user_id,
                status: OrderStatus::Pending,
                date_completed: OffsetDateTime::now_utc(),
            },
        );

        let mut details = Vec::with_capacity(items.len());
        for item in items {
            let detail_id = t.id();
            let detail = OrderDetail {
                id: detail_id,
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
            };
            t.details.insert(detail_id, detail.clone());
            if let Some(product) = t.products.get_mut(&item.product_id) {
                product.sold_quantity += item.quantity;
                product.quantity -= item.quantity;
            }
            t.cart.remove(&item.id);
            details.push(detail);
        }

        let order = match t.orders.get_mut(&order_id) {
            Some(order) => {
                order.status = OrderStatus::Completed;
                order.date_completed = OffsetDateTime::now_utc();
                order.clone()
            }
            None => return Err(anyhow::anyhow!("order {order_id} vanished").into()),
        };
        Ok(Receipt { order, details })
    }

    async fn find_order(&self, id: i64) -> anyhow::Result<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn orders_for_user(&self, user_id: i64) -> anyhow::Result<Vec<Order>> {
        let t = self.tables.lock().await;
        Ok(t.orders
            .values()
            .rev()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn order_lines(&self, order_id: i64) -> anyhow::Result<Vec<OrderLine>> {
        let t = self.tables.lock().await;
        Ok(t.details
            .values()
            .filter(|d| d.order_id == order_id)
            .filter_map(|detail| {
                t.products.get(&detail.product_id).map(|product| OrderLine {
                    detail: detail.clone(),
                    product: product.clone(),
                })
            })
            .collect())
    }

    async fn order_ids_for_shop(&self, shop_id: i64) -> anyhow::Result<Vec<i64>> {
        let t = self.tables.lock().await;
        let mut ids: Vec<i64> = t
            .details
            .values()
            .filter(|d| {
                t.products
                    .get(&d.product_id)
                    .is_some_and(|p| p.shop_id == shop_id)
            })
            .map(|d| d.order_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn new_user(email: &str, user_type: UserType) -> NewUser {
        NewUser {
            fullname: "Test User".into(),
            dob: date!(1990 - 01 - 01),
            email: email.into(),
            gender: "female".into(),
            address: "Pune".into(),
            password_hash: "hash".into(),
            user_type,
        }
    }

    async fn shop_with_product(store: &MemoryStore, quantity: i32) -> (Shop, Product) {
        let owner = store
            .create_user(new_user("shop@demo.com", UserType::ShopUser), Some("Shop1".into()))
            .await
            .unwrap();
        let shop = store.shop_for_owner(owner.id).await.unwrap().unwrap();
        let product = store
            .create_product(NewProduct {
                name: "Analog Watch".into(),
                quantity,
                price: 6049,
                category: "Watch".into(),
                brand: "Fossil".into(),
                shop_id: shop.id,
            })
            .await
            .unwrap();
        (shop, product)
    }

    #[tokio::test]
    async fn repeated_add_increments_one_row() {
        let store = MemoryStore::new();
        let (_, product) = shop_with_product(&store, 5).await;
        let customer = store
            .create_user(new_user("c@demo.com", UserType::Customer), None)
            .await
            .unwrap();

        store.add_to_cart(customer.id, product.id).await.unwrap();
        store.add_to_cart(customer.id, product.id).await.unwrap();

        let lines = store.cart_lines(customer.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item.quantity, 2);
        assert_eq!(lines[0].total(), 2 * 6049);
    }

    #[tokio::test]
    async fn removal_is_idempotent() {
        let store = MemoryStore::new();
        let (_, product) = shop_with_product(&store, 5).await;
        let customer = store
            .create_user(new_user("c@demo.com", UserType::Customer), None)
            .await
            .unwrap();
        store.add_to_cart(customer.id, product.id).await.unwrap();

        assert!(store.remove_from_cart(customer.id, product.id).await.unwrap());
        assert!(!store.remove_from_cart(customer.id, product.id).await.unwrap());
        assert!(!store.remove_from_wishlist(customer.id, product.id).await.unwrap());
    }

    #[tokio::test]
    async fn wishlist_never_duplicates() {
        let store = MemoryStore::new();
        let (_, product) = shop_with_product(&store, 5).await;
        let customer = store
            .create_user(new_user("c@demo.com", UserType::Customer), None)
            .await
            .unwrap();

        assert!(store.add_to_wishlist(customer.id, product.id).await.unwrap());
        assert!(!store.add_to_wishlist(customer.id, product.id).await.unwrap());
        assert_eq!(store.wishlist(customer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_checkout_leaves_everything_untouched() {
        let store = MemoryStore::new();
        let (_, product) = shop_with_product(&store, 1).await;
        let customer = store
            .create_user(new_user("c@demo.com", UserType::Customer), None)
            .await
            .unwrap();
        store.add_to_cart(customer.id, product.id).await.unwrap();
        store.add_to_cart(customer.id, product.id).await.unwrap();

        let err = store.checkout(customer.id).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 2,
                available: 1,
                ..
            }
        ));
        assert!(store.orders_for_user(customer.id).await.unwrap().is_empty());
        assert_eq!(store.cart_lines(customer.id).await.unwrap().len(), 1);
        assert_eq!(store.find_product(product.id).await.unwrap().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn deleting_a_shop_removes_its_owner_and_products() {
        let store = MemoryStore::new();
        let (shop, product) = shop_with_product(&store, 3).await;

        assert!(store.delete_pending_shop(shop.id).await.unwrap());
        assert!(store.find_shop(shop.id).await.unwrap().is_none());
        assert!(store.find_user(shop.user_id).await.unwrap().is_none());
        assert!(store.find_product(product.id).await.unwrap().is_none());
        assert!(!store.delete_pending_shop(shop.id).await.unwrap());
    }

    #[tokio::test]
    async fn sold_products_keep_their_order_lines() {
        let store = MemoryStore::new();
        let (shop, product) = shop_with_product(&store, 3).await;
        let customer = store
            .create_user(new_user("c@demo.com", UserType::Customer), None)
            .await
            .unwrap();
        store.set_shop_active(shop.id, true).await.unwrap();
        store.add_to_cart(customer.id, product.id).await.unwrap();
        let receipt = store.checkout(customer.id).await.unwrap();

        assert!(!store.delete_pending_shop(shop.id).await.unwrap());

        store.set_shop_active(shop.id, false).await.unwrap();
        assert!(store.delete_pending_shop(shop.id).await.is_err());
        assert!(store.find_shop(shop.id).await.unwrap().is_some());
        assert_eq!(store.order_lines(receipt.order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("c@demo.com", UserType::Customer), None)
            .await
            .unwrap();
        assert!(store
            .create_user(new_user("c@demo.com", UserType::Customer), None)
            .await
            .is_err());
    }
}

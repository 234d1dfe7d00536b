//! In-process HTTP client over the full router, backed by the in-memory store.

use std::sync::{Arc, Mutex, OnceLock};

use axum::{
    body::{Body, Bytes},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, Request, StatusCode,
    },
    Router,
};
use time::macros::date;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::password::hash_password,
    db::models::{NewProduct, NewUser, Product, Shop, User, UserType},
    mail::RecordingMailer,
    state::AppState,
};

pub const PASSWORD: &str = "secret123";

fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("hash test password"))
        .clone()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn location(&self) -> &str {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

/// One browser: its own cookie jar over a shared app and state.
pub struct TestClient {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    app: Router,
    cookie: Mutex<Option<String>>,
}

impl TestClient {
    pub fn new() -> Self {
        let (state, mailer) = AppState::fake();
        Self {
            app: build_app(state.clone()),
            state,
            mailer,
            cookie: Mutex::new(None),
        }
    }

    /// A second browser on the same server.
    pub fn sharing(other: &TestClient) -> Self {
        Self {
            state: other.state.clone(),
            mailer: other.mailer.clone(),
            app: other.app.clone(),
            cookie: Mutex::new(None),
        }
    }

    async fn send(&self, mut req: Request<Body>) -> TestResponse {
        if let Some(cookie) = self.cookie.lock().unwrap().clone() {
            req.headers_mut().insert(COOKIE, cookie.parse().unwrap());
        }
        let resp = self.app.clone().oneshot(req).await.unwrap();
        if let Some(set) = resp.headers().get(SET_COOKIE).and_then(|v| v.to_str().ok()) {
            let mut jar = self.cookie.lock().unwrap();
            if set.contains("Max-Age=0") {
                *jar = None;
            } else if let Some(pair) = set.split(';').next() {
                *jar = Some(pair.to_string());
            }
        }
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn post_form(&self, path: &str, body: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    async fn seed_user(&self, email: &str, user_type: UserType, shop: Option<&str>) -> User {
        self.state
            .store
            .create_user(
                NewUser {
                    fullname: email.split('@').next().unwrap_or("user").to_string(),
                    dob: date!(1995 - 05 - 05),
                    email: email.to_string(),
                    gender: "male".into(),
                    address: "Pune".into(),
                    password_hash: password_hash(),
                    user_type,
                },
                shop.map(str::to_string),
            )
            .await
            .unwrap()
    }

    pub async fn seed_customer(&self, email: &str) -> User {
        self.seed_user(email, UserType::Customer, None).await
    }

    pub async fn seed_admin(&self, email: &str) -> User {
        self.seed_user(email, UserType::Admin, None).await
    }

    pub async fn seed_shop(&self, email: &str, name: &str, active: bool) -> (User, Shop) {
        let owner = self.seed_user(email, UserType::ShopUser, Some(name)).await;
        let store = &self.state.store;
        let shop = store.shop_for_owner(owner.id).await.unwrap().unwrap();
        if active {
            store.set_shop_active(shop.id, true).await.unwrap();
        }
        let shop = store.find_shop(shop.id).await.unwrap().unwrap();
        (owner, shop)
    }

    pub async fn seed_product(
        &self,
        shop_id: i64,
        name: &str,
        quantity: i32,
        price: i64,
        category: &str,
        brand: &str,
    ) -> Product {
        self.state
            .store
            .create_product(NewProduct {
                name: name.into(),
                quantity,
                price,
                category: category.into(),
                brand: brand.into(),
                shop_id,
            })
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str) {
        let body = format!("email={}&password={PASSWORD}", email.replace('@', "%40"));
        let resp = self.post_form("/login", &body).await;
        assert_eq!(resp.status, StatusCode::FOUND, "login as {email}");
    }

    pub async fn login_customer(&self, email: &str) -> User {
        let user = self.seed_customer(email).await;
        self.login(email).await;
        user
    }

    pub async fn login_admin(&self, email: &str) -> User {
        let user = self.seed_admin(email).await;
        self.login(email).await;
        user
    }

    pub async fn login_shop(&self, email: &str, name: &str) -> (User, Shop) {
        let seeded = self.seed_shop(email, name, true).await;
        self.login(email).await;
        seeded
    }

    /// Token from the newest password-reset mail.
    pub async fn last_reset_token(&self) -> String {
        let sent = self.mailer.sent.lock().await;
        let mail = sent.last().expect("a mail was sent");
        mail.body
            .split("/reset_password/")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .expect("reset link in mail")
            .to_string()
    }
}

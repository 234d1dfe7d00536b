//! The single authorization gate.
//!
//! Handlers declare the capability they need in their signature
//! (`Authorized<Admin>`, `Authorized<Customer>`, ...) and the extractor
//! answers before the handler body runs: no session user redirects to the
//! login page, a user whose role lacks the capability is sent home.

use std::marker::PhantomData;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::warn;

use crate::{
    db::models::{User, UserType},
    error::AppError,
    state::AppState,
};

pub const USER_ID_KEY: &str = "user_id";

pub trait Capability: Send + Sync + 'static {
    fn permits(user: &User) -> bool;
}

/// Any logged-in user.
pub struct AnyRole;
pub struct Admin;
pub struct ShopOwner;
pub struct Customer;
/// Shop owners and admins; ownership of a particular shop is checked by the handler.
pub struct ShopOwnerOrAdmin;

impl Capability for AnyRole {
    fn permits(_: &User) -> bool {
        true
    }
}

impl Capability for Admin {
    fn permits(user: &User) -> bool {
        user.user_type == UserType::Admin
    }
}

impl Capability for ShopOwner {
    fn permits(user: &User) -> bool {
        user.user_type == UserType::ShopUser
    }
}

impl Capability for Customer {
    fn permits(user: &User) -> bool {
        user.user_type == UserType::Customer
    }
}

impl Capability for ShopOwnerOrAdmin {
    fn permits(user: &User) -> bool {
        matches!(user.user_type, UserType::ShopUser | UserType::Admin)
    }
}

/// Logged-in user holding capability `C`.
pub struct Authorized<C: Capability = AnyRole> {
    pub user: User,
    pub session: Session,
    _capability: PhantomData<C>,
}

/// Whoever is calling, logged in or not.
pub struct Visitor {
    pub user: Option<User>,
    pub session: Session,
}

async fn session_of(parts: &mut Parts, state: &AppState) -> Result<Session, AppError> {
    Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!(msg)))
}

/// The user the session points at. A stale id (deleted account) is dropped.
pub async fn session_user(session: &Session, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(user_id) = session.get::<i64>(USER_ID_KEY).await? else {
        return Ok(None);
    };
    let user = state.store.find_user(user_id).await?;
    if user.is_none() {
        session.remove::<i64>(USER_ID_KEY).await?;
    }
    Ok(user)
}

#[async_trait]
impl FromRequestParts<AppState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_of(parts, state).await?;
        let user = session_user(&session, state).await?;
        Ok(Self { user, session })
    }
}

#[async_trait]
impl<C: Capability> FromRequestParts<AppState> for Authorized<C> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_of(parts, state).await?;
        let Some(user) = session_user(&session, state).await? else {
            return Err(AppError::AuthenticationRequired {
                next: parts.uri.path().to_string(),
            });
        };
        if !C::permits(&user) {
            warn!(user_id = user.id, role = %user.user_type, path = %parts.uri.path(), "access denied");
            return Err(AppError::AuthorizationDenied);
        }
        Ok(Self {
            user,
            session,
            _capability: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn user(user_type: UserType) -> User {
        User {
            id: 1,
            fullname: "Someone".into(),
            dob: date!(2000 - 01 - 01),
            email: "someone@demo.com".into(),
            gender: "male".into(),
            address: "Pune".into(),
            password: String::new(),
            user_type,
            image_file: "default.jpg".into(),
        }
    }

    #[test]
    fn capabilities_follow_roles() {
        let admin = user(UserType::Admin);
        let shop = user(UserType::ShopUser);
        let customer = user(UserType::Customer);

        assert!(Admin::permits(&admin));
        assert!(!Admin::permits(&customer));
        assert!(ShopOwner::permits(&shop));
        assert!(!ShopOwner::permits(&admin));
        assert!(Customer::permits(&customer));
        assert!(!Customer::permits(&shop));
        assert!(ShopOwnerOrAdmin::permits(&admin));
        assert!(ShopOwnerOrAdmin::permits(&shop));
        assert!(!ShopOwnerOrAdmin::permits(&customer));
        assert!(AnyRole::permits(&customer));
    }
}

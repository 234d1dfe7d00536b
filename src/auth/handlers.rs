use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{
            AccountForm, AccountView, LoginForm, LoginQuery, RegisterForm, ResetPasswordForm,
            ResetRequestForm, ResetTokenView,
        },
        extractors::{Authorized, Visitor, USER_ID_KEY},
        services,
    },
    db::models::{User, UserType},
    error::AppError,
    flash::{self, Level},
    state::AppState,
    views::{is_local_path, redirect, Blank, Page},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
        .route("/reset_password", get(reset_request_page).post(reset_request))
        .route("/reset_password/:token", get(reset_token_page).post(reset_token))
}

pub fn account_routes() -> Router<AppState> {
    Router::new().route("/account", get(account_page).post(update_account))
}

#[derive(Debug, Serialize)]
struct LoginView {
    next: Option<String>,
}

/// Where a fresh login lands.
fn landing_for(user: &User, next: Option<&str>) -> String {
    match user.user_type {
        UserType::Admin => "/admin/dashboard".into(),
        UserType::ShopUser => "/shop/dashboard".into(),
        UserType::Customer => next
            .filter(|target| is_local_path(target))
            .unwrap_or("/")
            .to_string(),
    }
}

#[instrument(skip_all)]
pub async fn register_page(visitor: Visitor) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    Ok(Page::render(&visitor.session, "Register", Blank::default())
        .await?
        .into_response())
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    services::register(&state, form).await?;
    flash::push(&visitor.session, Level::Success, "Your account has been created!").await?;
    Ok(redirect("/login"))
}

#[instrument(skip_all)]
pub async fn login_page(
    visitor: Visitor,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    let view = LoginView { next: query.next };
    Ok(Page::render(&visitor.session, "Login", view)
        .await?
        .into_response())
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    let session = visitor.session;
    let Some(user) = services::authenticate(&state, &form).await? else {
        flash::push(
            &session,
            Level::Danger,
            "Login Unsuccesful. Please check your email and password.",
        )
        .await?;
        let view = LoginView { next: query.next };
        return Ok(Page::render(&session, "Login", view).await?.into_response());
    };

    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await?;
    info!(user_id = user.id, user_type = %user.user_type, "user logged in");
    Ok(redirect(&landing_for(&user, query.next.as_deref())))
}

#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Response, AppError> {
    session.flush().await?;
    Ok(redirect("/"))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn account_page(auth: Authorized) -> Result<Response, AppError> {
    let image_file = format!("/static/profile_pics/{}", auth.user.image_file);
    let view = AccountView {
        user: auth.user,
        image_file,
    };
    Ok(Page::render(&auth.session, "Account", view)
        .await?
        .into_response())
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn update_account(
    State(state): State<AppState>,
    auth: Authorized,
    Form(form): Form<AccountForm>,
) -> Result<Response, AppError> {
    services::update_profile(&state, &auth.user, &form, "Account").await?;
    flash::push(&auth.session, Level::Success, "Your account has been Updated!").await?;
    Ok(redirect("/account"))
}

#[instrument(skip_all)]
pub async fn reset_request_page(visitor: Visitor) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    Ok(Page::render(&visitor.session, "Reset Password", Blank::default())
        .await?
        .into_response())
}

#[instrument(skip_all)]
pub async fn reset_request(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<ResetRequestForm>,
) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    let user = services::reset_target(&state, &form).await?;
    services::send_reset_email(&state, &user).await?;
    flash::push(
        &visitor.session,
        Level::Info,
        "An email has been sent with instructions to reset your password.",
    )
    .await?;
    Ok(redirect("/login"))
}

async fn token_rejected(session: &Session) -> Result<Response, AppError> {
    flash::push(session, Level::Warning, "The token is invalid or has expired").await?;
    Ok(redirect("/reset_password"))
}

#[instrument(skip_all)]
pub async fn reset_token_page(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    if services::verify_reset_token(&state, &token).await?.is_none() {
        return token_rejected(&visitor.session).await;
    }
    Ok(Page::render(&visitor.session, "Reset Password", ResetTokenView { token })
        .await?
        .into_response())
}

#[instrument(skip_all)]
pub async fn reset_token(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    if visitor.user.is_some() {
        return Ok(redirect("/"));
    }
    let Some(user) = services::verify_reset_token(&state, &token).await? else {
        return token_rejected(&visitor.session).await;
    };
    services::reset_password(&state, &user, form).await?;
    flash::push(&visitor.session, Level::Success, "Your password has been updated!").await?;
    Ok(redirect("/login"))
}

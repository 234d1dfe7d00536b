use axum::extract::FromRef;
use tracing::{error, info, warn};
use validator::{Validate, ValidationErrors};

use super::{
    dto::{field_error, AccountForm, LoginForm, RegisterForm, ResetPasswordForm, ResetRequestForm},
    password::{hash_password_blocking, verify_password_blocking},
    tokens::ResetKeys,
};
use crate::{
    db::models::{NewUser, User, UserType},
    error::AppError,
    mail::Mail,
    state::AppState,
};

const EMAIL_TAKEN: &str = "Email already registered.";

/// Fold the uniqueness check into the field errors.
fn with_unique_email<T>(
    checked: Result<T, ValidationErrors>,
    taken: bool,
) -> Result<T, ValidationErrors> {
    match checked {
        Ok(value) if !taken => Ok(value),
        Ok(_) => {
            let mut errors = ValidationErrors::new();
            errors.add("email", field_error("unique", EMAIL_TAKEN));
            Err(errors)
        }
        Err(mut errors) => {
            if taken {
                errors.add("email", field_error("unique", EMAIL_TAKEN));
            }
            Err(errors)
        }
    }
}

/// Create a customer or (inactive) shop user from a validated registration.
pub async fn register(state: &AppState, form: RegisterForm) -> Result<User, AppError> {
    let email = form.email.trim().to_string();
    let taken = state.store.find_user_by_email(&email).await?.is_some();
    if taken {
        warn!(email = %email, "email already registered");
    }
    let dob = with_unique_email(form.check(), taken)
        .map_err(|e| AppError::validation("Register", e))?;

    let user_type = if form.is_shop_user() {
        UserType::ShopUser
    } else {
        UserType::Customer
    };
    let shop_name = form.shop_name().filter(|_| user_type == UserType::ShopUser);
    let password_hash = hash_password_blocking(form.password).await?;
    let user = state
        .store
        .create_user(
            NewUser {
                fullname: form.fullname.trim().to_string(),
                dob,
                email,
                gender: form.gender.trim().to_string(),
                address: form.address.trim().to_string(),
                password_hash,
                user_type,
            },
            shop_name,
        )
        .await?;
    info!(user_id = user.id, user_type = %user.user_type, "user registered");

    if user.user_type == UserType::ShopUser {
        send_approval_request(state).await;
    }
    Ok(user)
}

/// Tell the admin mailbox a shop waits for approval. Delivery failure does not undo the registration.
async fn send_approval_request(state: &AppState) {
    let link = state.config.external_url("/admin/shop-requests");
    let mail = Mail {
        to: state.config.mail.admin_inbox.clone(),
        subject: "Shop Registration Request".into(),
        body: format!("To approve the registration of shop, visit the following link:\n\n{link}\n"),
    };
    if let Err(e) = state.mailer.send(mail).await {
        error!(error = %e, "approval request mail failed");
    }
}

/// The user behind valid credentials, or `None`.
pub async fn authenticate(state: &AppState, form: &LoginForm) -> Result<Option<User>, AppError> {
    if form.validate().is_err() {
        return Ok(None);
    }
    let Some(user) = state.store.find_user_by_email(form.email.trim()).await? else {
        warn!(email = %form.email, "login unknown email");
        return Ok(None);
    };
    let ok = verify_password_blocking(form.password.clone(), user.password.clone()).await?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Ok(None);
    }
    Ok(Some(user))
}

/// Apply profile edits to `target`. The email may not belong to any other user.
pub async fn update_profile(
    state: &AppState,
    target: &User,
    form: &AccountForm,
    title: &'static str,
) -> Result<(), AppError> {
    let taken = match state.store.find_user_by_email(form.email.trim()).await? {
        Some(other) => other.id != target.id,
        None => false,
    };
    let update =
        with_unique_email(form.check(), taken).map_err(|e| AppError::validation(title, e))?;
    state.store.update_profile(target.id, &update).await?;
    info!(user_id = target.id, "profile updated");
    Ok(())
}

/// The account a reset request names. Unknown addresses are a form error.
pub async fn reset_target(state: &AppState, form: &ResetRequestForm) -> Result<User, AppError> {
    const TITLE: &str = "Reset Password";
    form.validate().map_err(|e| AppError::validation(TITLE, e))?;
    match state.store.find_user_by_email(form.email.trim()).await? {
        Some(user) => Ok(user),
        None => {
            let mut errors = ValidationErrors::new();
            errors.add(
                "email",
                field_error(
                    "unknown",
                    "There is no account with this email. You must register first.",
                ),
            );
            Err(AppError::validation(TITLE, errors))
        }
    }
}

pub async fn send_reset_email(state: &AppState, user: &User) -> Result<(), AppError> {
    let keys = ResetKeys::from_ref(state);
    let token = keys.sign(user.id)?;
    let link = state.config.external_url(&format!("/reset_password/{token}"));
    let mail = Mail {
        to: user.email.clone(),
        subject: "Password Reset Request".into(),
        body: format!(
            "To reset your password, visit the following link:\n\n{link}\n\n\
             If you did not make this request, ignore this email and no changes will be made.\n"
        ),
    };
    state.mailer.send(mail).await?;
    info!(user_id = user.id, "password reset mail sent");
    Ok(())
}

/// The user a reset token was issued for. Bad, expired or orphaned tokens give `None`.
pub async fn verify_reset_token(state: &AppState, token: &str) -> Result<Option<User>, AppError> {
    let keys = ResetKeys::from_ref(state);
    let claims = match keys.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "reset token rejected");
            return Ok(None);
        }
    };
    Ok(state.store.find_user(claims.user_id).await?)
}

pub async fn reset_password(
    state: &AppState,
    user: &User,
    form: ResetPasswordForm,
) -> Result<(), AppError> {
    form.validate()
        .map_err(|e| AppError::validation("Reset Password", e))?;
    let hash = hash_password_blocking(form.password).await?;
    state.store.set_password(user.id, &hash).await?;
    info!(user_id = user.id, "password reset");
    Ok(())
}

/// Create the configured admin account unless its email is already registered.
pub async fn bootstrap_admin(state: &AppState) -> anyhow::Result<()> {
    let Some(admin) = state.config.admin.as_ref() else {
        return Ok(());
    };
    if state.store.find_user_by_email(&admin.email).await?.is_some() {
        return Ok(());
    }
    let password_hash = hash_password_blocking(admin.password.clone()).await?;
    let user = state
        .store
        .create_user(
            NewUser {
                fullname: "admin".into(),
                dob: time::macros::date!(2000 - 01 - 01),
                email: admin.email.clone(),
                gender: "other".into(),
                address: "-".into(),
                password_hash,
                user_type: UserType::Admin,
            },
            None,
        )
        .await?;
    info!(user_id = user.id, "admin account created");
    Ok(())
}

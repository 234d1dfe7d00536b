use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::db::models::{ProfileUpdate, User};

/// Registration form. Unchecked boxes are simply absent from the body.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters."))]
    pub fullname: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 10, message = "Gender must be between 2 and 10 characters."))]
    pub gender: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Address must be at most 200 characters."))]
    pub address: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Field must be equal to password."))]
    pub confirm_password: String,
    pub shopuser: Option<String>,
    #[serde(default)]
    pub shop_name: String,
}

impl RegisterForm {
    pub fn is_shop_user(&self) -> bool {
        self.shopuser.is_some()
    }

    /// Trimmed shop name, when one was given.
    pub fn shop_name(&self) -> Option<String> {
        let name = self.shop_name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Field rules plus the cross-field ones. Email uniqueness is checked by the service.
    pub fn check(&self) -> Result<Date, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        let dob = parse_dob(&self.dob, &mut errors);
        if self.is_shop_user() && self.shop_name().is_none() {
            errors.add("shop_name", field_error("required", "Shop Name is required."));
        }
        match dob {
            Some(dob) if errors.is_empty() => Ok(dob),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

/// Profile fields, used by the account page and the admin user editor.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AccountForm {
    #[serde(default)]
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters."))]
    pub fullname: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 10, message = "Gender must be between 2 and 10 characters."))]
    pub gender: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Address must be at most 200 characters."))]
    pub address: String,
}

impl AccountForm {
    pub fn check(&self) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = self.validate().err().unwrap_or_else(ValidationErrors::new);
        match parse_dob(&self.dob, &mut errors) {
            Some(dob) if errors.is_empty() => Ok(ProfileUpdate {
                fullname: self.fullname.trim().to_string(),
                dob,
                email: self.email.trim().to_string(),
                gender: self.gender.trim().to_string(),
                address: self.address.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ResetRequestForm {
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ResetPasswordForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Field must be equal to password."))]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Account page data; the password hash is never serialized.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub user: User,
    pub image_file: String,
}

#[derive(Debug, Serialize)]
pub struct ResetTokenView {
    pub token: String,
}

pub(crate) fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn parse_dob(raw: &str, errors: &mut ValidationErrors) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    match Date::parse(raw.trim(), &format) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add("dob", field_error("date", "Not a valid date value."));
            None
        }
    }
}

//! Input validation shared by the auth, account, checkout and product flows.
//!
//! Every validator collects field-level messages into [`FieldErrors`] and fails with
//! [`AppError::Validation`] before any write or upload is attempted.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    dto::{
        account::BecomeSellerRequest, auth::SignUpRequest, checkout::ShippingForm,
        products::ProductForm,
    },
    error::{AppError, AppResult, FieldErrors},
};

pub const REQUIRED: &str = "required";
pub const PASSWORD_RULE: &str = "Minimum eight characters, at least one uppercase letter, one lowercase letter and one number.";
pub const CATEGORIES: [&str; 5] = [
    "Accessories",
    "Clothing",
    "Delicacy",
    "Furnitures",
    "Handicrafts",
];

static ACCOUNT_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
        .expect("account email pattern")
});

static SHIPPING_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("shipping email pattern")
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(09|\+639)[0-9]{9}$").expect("phone pattern"));

static PASSWORD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{8,}$").expect("password pattern"));

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require(errors: &mut FieldErrors, field: &str, value: &str) {
    if blank(value) {
        errors.insert(field.to_string(), REQUIRED.to_string());
    }
}

fn finish(errors: FieldErrors) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn is_account_email(email: &str) -> bool {
    ACCOUNT_EMAIL.is_match(email)
}

pub fn is_shipping_email(email: &str) -> bool {
    SHIPPING_EMAIL.is_match(email)
}

/// Accepts `09xxxxxxxxx` and `+639xxxxxxxxx`, ignoring spaces.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.split_whitespace().collect();
    PHONE.is_match(&compact)
}

/// At least eight ASCII letters/digits with a lowercase, an uppercase and a digit.
pub fn is_strong_password(password: &str) -> bool {
    PASSWORD_CHARS.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Groups digits for display: `091 7123 4567`, or `+6391 7123 4567` for the `639` prefix.
pub fn format_phone_number(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let len = digits.len();
    if len < 4 {
        return digits;
    }

    let slice = |from: usize, to: usize| &digits[from.min(len)..to.min(len)];
    if len < 8 {
        return format!("{} {}", slice(0, 3), slice(3, len));
    }
    if digits.starts_with("639") && len >= 9 {
        return format!("+{} {} {}", slice(0, 4), slice(4, 8), slice(8, 12));
    }
    format!("{} {} {}", slice(0, 3), slice(3, 7), slice(7, 11))
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(AppError::field("password", PASSWORD_RULE))
    }
}

pub fn validate_sign_up(req: &SignUpRequest) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "name", &req.name);
    require(&mut errors, "email", &req.email);
    require(&mut errors, "phone", &req.phone);
    require(&mut errors, "password", &req.password);
    require(&mut errors, "confirm_password", &req.confirm_password);

    if !errors.contains_key("phone") && !is_valid_phone(&req.phone) {
        errors.insert("phone".into(), "Phone number is invalid".into());
    }
    if !errors.contains_key("email") && !is_account_email(req.email.trim()) {
        errors.insert("email".into(), "Invalid email".into());
    }
    if !errors.contains_key("password") && !is_strong_password(&req.password) {
        errors.insert("password".into(), PASSWORD_RULE.into());
    }
    if !errors.contains_key("confirm_password") && req.password != req.confirm_password {
        errors.insert("confirm_password".into(), "Password does not match".into());
    }
    finish(errors)
}

pub fn validate_shipping(form: &ShippingForm) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "first_name", &form.first_name);
    require(&mut errors, "last_name", &form.last_name);
    require(&mut errors, "email", &form.email);
    require(&mut errors, "address", &form.address);
    require(&mut errors, "city", &form.city);

    if !errors.contains_key("email") && !is_shipping_email(form.email.trim()) {
        errors.insert("email".into(), "Invalid email".into());
    }
    finish(errors)
}

pub fn validate_seller(req: &BecomeSellerRequest) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "shop_name", &req.shop_name);
    require(&mut errors, "shop_address", &req.shop_address);
    require(&mut errors, "shop_phone", &req.shop_phone);

    if !errors.contains_key("shop_phone") && !is_valid_phone(&req.shop_phone) {
        errors.insert("shop_phone".into(), "Invalid Phone Number".into());
    }
    finish(errors)
}

pub fn validate_product(form: &ProductForm) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "name", &form.name);
    require(&mut errors, "category", &form.category);
    match form.price {
        None | Some(0) => {
            errors.insert("price".into(), REQUIRED.into());
        }
        Some(price) if price < 0 => {
            errors.insert("price".into(), "must be greater than 0".into());
        }
        Some(_) => {}
    }

    if !errors.contains_key("category") && !CATEGORIES.contains(&form.category.trim()) {
        errors.insert("category".into(), "unknown category".into());
    }
    finish(errors)
}

use ladeno_storefront::{
    dto::{
        account::BecomeSellerRequest,
        auth::SignUpRequest,
        products::{OptionList, ProductForm},
    },
    error::{AppError, FieldErrors},
    validation::{
        CATEGORIES, PASSWORD_RULE, format_phone_number, is_account_email, is_shipping_email,
        is_strong_password, is_valid_phone, validate_product, validate_seller, validate_sign_up,
    },
};

fn field_errors(result: Result<(), AppError>) -> FieldErrors {
    match result {
        Err(AppError::Validation(errors)) => errors,
        other => panic!("expected field errors, got {other:?}"),
    }
}

fn sign_up() -> SignUpRequest {
    SignUpRequest {
        name: "Jose Rizal".into(),
        email: "jose@example.com".into(),
        phone: "09171234567".into(),
        password: "Abcdefg1".into(),
        confirm_password: "Abcdefg1".into(),
    }
}

#[test]
fn password_strength() {
    assert!(!is_strong_password("abc"));
    assert!(is_strong_password("Abcdefg1"));
    assert!(!is_strong_password("abcdefg1"), "needs an uppercase letter");
    assert!(!is_strong_password("ABCDEFG1"), "needs a lowercase letter");
    assert!(!is_strong_password("Abcdefgh"), "needs a digit");
    assert!(!is_strong_password("Abcdef1!"), "letters and digits only");
}

#[test]
fn sign_up_accepts_valid_request() {
    assert!(validate_sign_up(&sign_up()).is_ok());
}

#[test]
fn sign_up_rejects_weak_password() {
    let req = SignUpRequest {
        password: "abc".into(),
        confirm_password: "abc".into(),
        ..sign_up()
    };
    let errors = field_errors(validate_sign_up(&req));
    assert_eq!(errors.get("password").map(String::as_str), Some(PASSWORD_RULE));
}

#[test]
fn sign_up_reports_every_problem() {
    let req = SignUpRequest {
        name: " ".into(),
        email: "jose@".into(),
        phone: "12345".into(),
        password: "Abcdefg1".into(),
        confirm_password: "Abcdefg2".into(),
    };
    let errors = field_errors(validate_sign_up(&req));
    assert_eq!(errors.get("name").map(String::as_str), Some("required"));
    assert!(errors.contains_key("email"));
    assert!(errors.contains_key("phone"));
    assert_eq!(
        errors.get("confirm_password").map(String::as_str),
        Some("Password does not match")
    );
}

#[test]
fn phone_numbers() {
    assert!(is_valid_phone("09171234567"));
    assert!(is_valid_phone("+639171234567"));
    assert!(is_valid_phone("0917 123 4567"));
    assert!(!is_valid_phone("9171234567"));
    assert!(!is_valid_phone("091712345678"));

    assert_eq!(format_phone_number("09171234567"), "091 7123 4567");
    assert_eq!(format_phone_number("639171234567"), "+6391 7123 4567");
    assert_eq!(format_phone_number("+639171234567"), "+6391 7123 4567");
    assert_eq!(format_phone_number("091"), "091");
    assert_eq!(format_phone_number("09171"), "091 71");
}

#[test]
fn email_patterns() {
    assert!(is_account_email("a.b+c@example.co"));
    assert!(!is_account_email("no-at-sign"));
    assert!(is_shipping_email("maria.clara@example.com"));
    assert!(!is_shipping_email("maria@example"));
}

#[test]
fn seller_form_needs_shop_details() {
    let errors = field_errors(validate_seller(&BecomeSellerRequest::default()));
    for key in ["shop_name", "shop_address", "shop_phone"] {
        assert_eq!(errors.get(key).map(String::as_str), Some("required"), "{key}");
    }

    let bad_phone = BecomeSellerRequest {
        shop_name: "Habi".into(),
        shop_address: "Makati".into(),
        shop_phone: "555".into(),
        brand_image: None,
    };
    let errors = field_errors(validate_seller(&bad_phone));
    assert_eq!(
        errors.get("shop_phone").map(String::as_str),
        Some("Invalid Phone Number")
    );
}

#[test]
fn product_form_rules() {
    let errors = field_errors(validate_product(&ProductForm::default()));
    for key in ["name", "category", "price"] {
        assert_eq!(errors.get(key).map(String::as_str), Some("required"), "{key}");
    }

    let form = ProductForm {
        name: "Barong".into(),
        category: "Gadgets".into(),
        price: Some(-5),
        ..ProductForm::default()
    };
    let errors = field_errors(validate_product(&form));
    assert!(errors.contains_key("category"));
    assert!(errors.contains_key("price"));

    let form = ProductForm {
        name: "Barong".into(),
        category: CATEGORIES[1].into(),
        price: Some(3200),
        ..ProductForm::default()
    };
    assert!(validate_product(&form).is_ok());
}

#[test]
fn option_list_appends_and_pops_last() {
    let mut sizes: OptionList = ["S", " ", "M"].into_iter().collect();
    assert_eq!(sizes.as_slice(), ["S", "M"]);
    sizes.push(" L ");
    assert_eq!(sizes.as_slice(), ["S", "M", "L"]);
    assert_eq!(sizes.remove_last().as_deref(), Some("L"));
    assert_eq!(sizes.len(), 2);
}

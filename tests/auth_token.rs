use axum::http::{Request, header, request::Parts};
use ladeno_storefront::{error::AppError, middleware::auth::bearer_token};

fn parts(uri: &str, authorization: Option<&str>) -> Parts {
    let mut request = Request::builder().uri(uri);
    if let Some(value) = authorization {
        request = request.header(header::AUTHORIZATION, value);
    }
    request.body(()).expect("request").into_parts().0
}

#[test]
fn header_token_wins() {
    let parts = parts("/api/cart/live?access_token=query", Some("Bearer header"));
    assert_eq!(bearer_token(&parts).expect("token"), "header");
}

#[test]
fn query_token_is_percent_decoded() {
    let parts = parts("/api/cart/live?q=x&access_token=ab%2Bcd%3D%3D&page_size=5", None);
    assert_eq!(bearer_token(&parts).expect("token"), "ab+cd==");
}

#[test]
fn missing_or_empty_token_is_unauthorized() {
    assert!(matches!(
        bearer_token(&parts("/api/cart/live", None)),
        Err(AppError::Unauthorized)
    ));
    assert!(matches!(
        bearer_token(&parts("/api/cart/live?access_token=", None)),
        Err(AppError::Unauthorized)
    ));
}

#[test]
fn wrong_scheme_is_rejected() {
    assert!(matches!(
        bearer_token(&parts("/api/auth/me", Some("Basic abc"))),
        Err(AppError::BadRequest(_))
    ));
}

use chrono::Utc;
use ladeno_storefront::{
    checkout::{CheckoutSessions, CheckoutState, PendingOrder, SESSION_IDLE},
    dto::checkout::ShippingForm,
    error::AppError,
    models::CartItem,
};
use uuid::Uuid;

fn line(seller_id: Uuid, name: &str, price: i64, quantity: i32) -> CartItem {
    CartItem {
        id: Uuid::new_v4(),
        client_id: Uuid::nil(),
        product_id: Uuid::new_v4(),
        seller_id,
        name: name.to_string(),
        category: "Delicacy".to_string(),
        price,
        sizes: vec![],
        colors: vec![],
        image_url: None,
        quantity,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn form() -> ShippingForm {
    ShippingForm {
        first_name: "Maria".into(),
        last_name: "Clara".into(),
        email: "maria.clara@example.com".into(),
        address: "12 Rizal St".into(),
        city: "Manila".into(),
    }
}

#[test]
fn missing_fields_are_reported_and_form_kept() {
    let mut state = CheckoutState::default();
    let partial = ShippingForm {
        first_name: "Maria".into(),
        email: "not-an-email".into(),
        ..ShippingForm::default()
    };
    let cart = vec![line(Uuid::new_v4(), "Hat", 100, 1)];

    let err = state.submit_address(partial.clone(), &cart).expect_err("invalid form");
    match err {
        AppError::Validation(errors) => {
            assert_eq!(errors.get("last_name").map(String::as_str), Some("required"));
            assert_eq!(errors.get("address").map(String::as_str), Some("required"));
            assert_eq!(errors.get("city").map(String::as_str), Some("required"));
            assert!(errors.contains_key("email"));
            assert!(!errors.contains_key("first_name"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(state, CheckoutState::AddressEntry { form: partial });
}

#[test]
fn empty_cart_cannot_reach_summary() {
    let mut state = CheckoutState::default();
    let err = state.submit_address(form(), &[]).expect_err("empty cart");
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(state.step_index(), 0);
}

#[test]
fn summary_total_is_frozen_at_snapshot() {
    let seller = Uuid::new_v4();
    let mut cart = vec![line(seller, "Hat", 150, 2), line(seller, "Shoe", 1000, 1)];
    let mut state = CheckoutState::default();
    state.submit_address(form(), &cart).expect("valid");

    assert_eq!(state.step_index(), 1);
    assert_eq!(state.pending().map(|p| p.total_payment), Some(1300));

    cart[0].quantity = 10;
    cart.push(line(seller, "Mug", 500, 1));
    assert_eq!(state.pending().map(|p| p.total_payment), Some(1300));
    assert_eq!(state.pending().map(|p| p.lines.len()), Some(2));
}

#[test]
fn back_moves_one_step_and_keeps_form() {
    let cart = vec![line(Uuid::new_v4(), "Hat", 150, 1)];
    let mut state = CheckoutState::default();

    state.back().expect("no-op at address");
    assert_eq!(state, CheckoutState::default());

    state.submit_address(form(), &cart).expect("valid");
    state.back().expect("back to address");
    assert_eq!(state, CheckoutState::AddressEntry { form: form() });
}

#[test]
fn confirmation_is_terminal() {
    let cart = vec![line(Uuid::new_v4(), "Hat", 150, 2)];
    let mut state = CheckoutState::default();
    assert!(state.confirm(vec![]).is_err(), "nothing to confirm yet");

    state.submit_address(form(), &cart).expect("valid");
    let order_id = Uuid::new_v4();
    state.confirm(vec![order_id]).expect("confirm");

    assert_eq!(
        state,
        CheckoutState::Confirmation {
            order_ids: vec![order_id],
            total_payment: 300,
        }
    );
    assert!(state.back().is_err());
    assert!(state.submit_address(form(), &cart).is_err());
}

#[test]
fn pending_order_splits_per_seller_in_cart_order() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let cart = vec![
        line(b, "Mug", 200, 1),
        line(a, "Hat", 150, 2),
        line(b, "Plate", 100, 3),
    ];
    let pending = PendingOrder::snapshot(form(), &cart);
    assert_eq!(pending.total_payment, 800);

    let shares = pending.by_seller();
    assert_eq!(shares.len(), 2);
    assert_eq!(shares[0].seller_id, b);
    assert_eq!(shares[0].total_payment, 500);
    assert_eq!(shares[0].lines.len(), 2);
    assert_eq!(shares[1].seller_id, a);
    assert_eq!(shares[1].total_payment, 300);
}

#[tokio::test]
async fn sessions_are_per_user_and_resettable() {
    let sessions = CheckoutSessions::new();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
    let cart = vec![line(Uuid::new_v4(), "Hat", 150, 1)];

    sessions
        .session(alice)
        .await
        .lock()
        .await
        .submit_address(form(), &cart)
        .expect("valid");

    assert_eq!(sessions.session(alice).await.lock().await.step_index(), 1);
    assert_eq!(sessions.session(bob).await.lock().await.step_index(), 0);

    sessions.reset(alice).await;
    assert_eq!(sessions.session(alice).await.lock().await.step_index(), 0);
}

#[tokio::test(start_paused = true)]
async fn idle_sessions_are_evicted() {
    let sessions = CheckoutSessions::new();
    let (alice, bob, carol) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    sessions.session(alice).await;
    let held = sessions.session(bob).await;
    assert_eq!(sessions.len().await, 2);

    tokio::time::advance(SESSION_IDLE + std::time::Duration::from_secs(1)).await;
    sessions.session(carol).await;

    // bob's session is still held by a request, so it survives
    assert_eq!(sessions.len().await, 2);
    drop(held);

    sessions.session(carol).await;
    assert_eq!(sessions.len().await, 1);
}

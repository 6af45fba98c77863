use ladeno_storefront::{
    dto::orders::{ClientAction, SellerAction},
    models::OrderStatus::{self, *},
};

#[test]
fn badge_colours() {
    assert_eq!(Shipping.badge_color(), "yellow");
    assert_eq!(Delivered.badge_color(), "green");
    assert_eq!(Cancelled.badge_color(), "gray");
    assert_eq!(Refunded.badge_color(), "red");
}

#[test]
fn legal_transitions() {
    let allowed = [
        (Shipping, Delivered),
        (Shipping, Cancelled),
        (Shipping, Refunded),
        (Delivered, Refunded),
        (Cancelled, Shipping),
    ];
    for from in OrderStatus::ALL {
        for to in OrderStatus::ALL {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
}

#[test]
fn refunded_is_terminal() {
    assert!(OrderStatus::ALL.iter().all(|next| !Refunded.can_transition_to(*next)));
}

#[test]
fn status_text_round_trips() {
    for status in OrderStatus::ALL {
        assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
    }
    assert!("lost".parse::<OrderStatus>().is_err());
}

#[test]
fn actions_map_to_statuses() {
    assert_eq!(ClientAction::Delivered.target(), Delivered);
    assert_eq!(ClientAction::Cancel.target(), Cancelled);
    assert_eq!(SellerAction::Refund.target(), Refunded);
    assert_eq!(SellerAction::Cancel.target(), Cancelled);
    assert_eq!(SellerAction::Ship.target(), Shipping);
}

#[test]
fn seller_actions_parse_from_path_segments() {
    let action: SellerAction = serde_json::from_str("\"ship\"").expect("ship");
    assert_eq!(action, SellerAction::Ship);
    assert!(serde_json::from_str::<SellerAction>("\"deliver\"").is_err());
}

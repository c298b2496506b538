//! Registration lifecycle tests against the in-memory stores

mod helpers;

use assert_matches::assert_matches;

use alumnet::models::registration::NewGuest;
use alumnet::models::user::UserRole;
use alumnet::services::registration::{RegisterRequest, UpdateMyRegistrationRequest};
use alumnet::utils::errors::AlumnetError;

use helpers::{days_from_now, drain_background_tasks, hours_from_now, TestHarness};

fn register_request() -> RegisterRequest {
    RegisterRequest {
        agree_to_terms: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn paid_event_requires_payment_for_the_fee() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.registration_fee = 500.0;
    });

    let outcome = harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();

    assert!(outcome.payment_required);
    assert_eq!(outcome.payment_amount, 500.0);
    assert_eq!(outcome.registration.total_amount, 500.0);
    assert_eq!(outcome.registration.payment_status, "pending");
    assert_eq!(outcome.registration.status, "confirmed");
}

#[tokio::test]
async fn free_event_requires_no_payment() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|_| {});

    let outcome = harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();

    assert!(!outcome.payment_required);
    assert_eq!(outcome.registration.payment_status, "not_required");
}

#[tokio::test]
async fn second_registration_is_rejected_regardless_of_content() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|_| {});

    harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();

    let err = harness
        .services
        .registrations
        .register(
            event.id,
            user.id,
            RegisterRequest {
                meal_preference: Some("vegetarian".to_string()),
                donation_amount: Some(10.0),
                agree_to_terms: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_matches!(err, AlumnetError::DuplicateRegistration { .. });
}

#[tokio::test]
async fn full_event_rejects_with_capacity_message() {
    let harness = TestHarness::new();
    let event = harness.store.seed_event(|event| {
        event.max_capacity = Some(2);
    });

    for i in 0..2 {
        let user = harness.store.seed_user(
            &format!("member{}@example.com", i),
            "Member",
            UserRole::Member,
        );
        harness
            .services
            .registrations
            .register(event.id, user.id, register_request())
            .await
            .unwrap();
    }

    let third = harness.store.seed_user("late@example.com", "Late Member", UserRole::Member);
    let err = harness
        .services
        .registrations
        .register(event.id, third.id, register_request())
        .await
        .unwrap_err();

    assert_matches!(err, AlumnetError::RegistrationNotOpen(ref reason) if reason.contains("maximum capacity"));
}

#[tokio::test]
async fn missing_required_field_is_rejected_by_label() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|_| {});
    harness.store.seed_form_field(event.id, "T-shirt size", true);

    let err = harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap_err();

    assert_matches!(
        err,
        AlumnetError::MissingRequiredFields { ref labels } if labels == &vec!["T-shirt size".to_string()]
    );
}

#[tokio::test]
async fn required_field_with_response_is_accepted() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|_| {});
    let field = harness.store.seed_form_field(event.id, "T-shirt size", true);

    let mut request = register_request();
    request.form_responses = vec![alumnet::models::registration::SubmittedResponse {
        field_id: field.id,
        response: "L".to_string(),
    }];

    let outcome = harness
        .services
        .registrations
        .register(event.id, user.id, request)
        .await
        .unwrap();

    let my = harness
        .services
        .registrations
        .my_registration(event.id, user.id)
        .await
        .unwrap();
    assert_eq!(my.registration.id, outcome.registration.id);
    assert_eq!(my.form_responses.len(), 1);
    assert_eq!(my.form_responses[0].response, "L");
}

#[tokio::test]
async fn meal_preference_required_when_event_has_meals() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.has_meals = true;
    });

    let err = harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap_err();
    assert_matches!(err, AlumnetError::InvalidInput(ref reason) if reason.contains("meal preference"));

    let mut request = register_request();
    request.meal_preference = Some("vegan".to_string());
    let outcome = harness
        .services
        .registrations
        .register(event.id, user.id, request)
        .await
        .unwrap();
    assert_eq!(outcome.registration.meal_preference.as_deref(), Some("vegan"));
}

#[tokio::test]
async fn terms_must_be_agreed() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|_| {});

    let err = harness
        .services
        .registrations
        .register(event.id, user.id, RegisterRequest::default())
        .await
        .unwrap_err();

    assert_matches!(err, AlumnetError::InvalidInput(_));
}

#[tokio::test]
async fn confirmation_email_is_sent_after_registration() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.registration_fee = 120.0;
        event.title = "Winter Gala".to_string();
    });

    harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();

    drain_background_tasks().await;

    let sent = harness.emails.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada@example.com");
    assert!(sent[0].subject.contains("Winter Gala"));
    assert!(sent[0].body.contains("120.00"));
}

#[tokio::test]
async fn failing_notifier_does_not_fail_registration() {
    let harness = TestHarness::with_failing_notifier();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|_| {});

    let outcome = harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();

    drain_background_tasks().await;

    // the registration survived the delivery failure
    assert!(harness.store.registration(outcome.registration.id).is_some());
}

#[tokio::test]
async fn update_and_cancel_rejected_past_the_deadline() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    // event in 12 hours, deadline 24 hours before: already past
    let event = harness.store.seed_event(|event| {
        event.event_date = hours_from_now(12);
        event.registration_end_date = Some(hours_from_now(6));
        event.form_modification_deadline_hours = 24;
    });

    harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();

    let update_err = harness
        .services
        .registrations
        .update_my_registration(
            event.id,
            user.id,
            UpdateMyRegistrationRequest {
                meal_preference: Some("vegan".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(update_err, AlumnetError::ModificationClosed(_));

    let cancel_err = harness
        .services
        .registrations
        .cancel_my_registration(event.id, user.id)
        .await
        .unwrap_err();
    assert_matches!(cancel_err, AlumnetError::ModificationClosed(_));
}

#[tokio::test]
async fn update_inside_the_window_bumps_the_counter() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.has_meals = true;
        event.event_date = days_from_now(30);
    });

    let mut request = register_request();
    request.meal_preference = Some("standard".to_string());
    harness
        .services
        .registrations
        .register(event.id, user.id, request)
        .await
        .unwrap();

    let updated = harness
        .services
        .registrations
        .update_my_registration(
            event.id,
            user.id,
            UpdateMyRegistrationRequest {
                meal_preference: Some("vegan".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.meal_preference.as_deref(), Some("vegan"));
    assert_eq!(updated.modification_count, 1);
}

#[tokio::test]
async fn donation_update_recomputes_the_total() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.registration_fee = 100.0;
        event.has_donations = true;
    });

    let mut request = register_request();
    request.donation_amount = Some(25.0);
    let outcome = harness
        .services
        .registrations
        .register(event.id, user.id, request)
        .await
        .unwrap();
    assert_eq!(outcome.registration.total_amount, 125.0);

    let updated = harness
        .services
        .registrations
        .update_my_registration(
            event.id,
            user.id,
            UpdateMyRegistrationRequest {
                donation_amount: Some(75.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.donation_amount, 75.0);
    assert_eq!(updated.total_amount, 175.0);
}

#[tokio::test]
async fn cancellation_cancels_guests_too() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.has_guests = true;
        event.guest_fee = 50.0;
    });

    harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();
    harness
        .services
        .registrations
        .add_guest(
            event.id,
            user.id,
            NewGuest {
                name: "Grace Hopper".to_string(),
                meal_preference: None,
            },
        )
        .await
        .unwrap();

    let cancelled = harness
        .services
        .registrations
        .cancel_my_registration(event.id, user.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, "cancelled");

    let my = harness
        .services
        .registrations
        .my_registration(event.id, user.id)
        .await
        .unwrap();
    assert!(my.guests.is_empty());
    assert!(!my.can_modify.allowed);
}

#[tokio::test]
async fn guests_fold_into_the_total_and_respect_the_cap() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.registration_fee = 100.0;
        event.guest_fee = 50.0;
        event.has_guests = true;
        event.max_guests_per_registration = 2;
    });

    harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap();

    let (guest, updated) = harness
        .services
        .registrations
        .add_guest(
            event.id,
            user.id,
            NewGuest {
                name: "Grace Hopper".to_string(),
                meal_preference: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.guest_fees_paid, 50.0);
    assert_eq!(updated.total_amount, 150.0);

    harness
        .services
        .registrations
        .add_guest(
            event.id,
            user.id,
            NewGuest {
                name: "Katherine Johnson".to_string(),
                meal_preference: None,
            },
        )
        .await
        .unwrap();

    let err = harness
        .services
        .registrations
        .add_guest(
            event.id,
            user.id,
            NewGuest {
                name: "One Too Many".to_string(),
                meal_preference: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, AlumnetError::InvalidInput(ref reason) if reason.contains("at most 2"));

    let after_removal = harness
        .services
        .registrations
        .remove_guest(event.id, user.id, guest.id)
        .await
        .unwrap();
    assert_eq!(after_removal.guest_fees_paid, 50.0);
    assert_eq!(after_removal.total_amount, 150.0);
}

#[tokio::test]
async fn externally_linked_event_rejects_as_external_even_when_full() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.external_link = Some("https://tickets.example".to_string());
        event.max_capacity = Some(0);
    });

    let err = harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap_err();

    assert_matches!(err, AlumnetError::RegistrationNotOpen(ref reason) if reason.contains("externally"));
}

#[tokio::test]
async fn draft_events_are_invisible_to_members() {
    let harness = TestHarness::new();
    let user = harness.store.seed_user("ada@example.com", "Ada Lovelace", UserRole::Member);
    let event = harness.store.seed_event(|event| {
        event.status = "draft".to_string();
    });

    let err = harness
        .services
        .registrations
        .register(event.id, user.id, register_request())
        .await
        .unwrap_err();

    assert_matches!(err, AlumnetError::EventNotFound { .. });
}

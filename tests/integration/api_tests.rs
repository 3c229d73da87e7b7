//! API integration tests
//!
//! These run against a live server with a seeded database. Point them at
//! the fixtures with BOOKLINE_TEST_SALON, BOOKLINE_TEST_SERVICE_ID and
//! BOOKLINE_TEST_STAFF_ID.

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn salon_slug() -> String {
    std::env::var("BOOKLINE_TEST_SALON").unwrap_or_else(|_| "demo".to_string())
}

fn service_id() -> String {
    std::env::var("BOOKLINE_TEST_SERVICE_ID").expect("BOOKLINE_TEST_SERVICE_ID not set")
}

fn staff_id() -> String {
    std::env::var("BOOKLINE_TEST_STAFF_ID").expect("BOOKLINE_TEST_STAFF_ID not set")
}

/// Helper: first free slot in the next two weeks
async fn first_free_slot(client: &Client) -> String {
    let from = chrono::Utc::now().date_naive() + chrono::Duration::days(1);
    let to = from + chrono::Duration::days(14);
    let response = client
        .get(format!("{}/salons/{}/availability", BASE_URL, salon_slug()))
        .query(&[
            ("service_id", service_id()),
            ("staff_id", staff_id()),
            ("from", from.to_string()),
            ("to", to.to_string()),
        ])
        .send()
        .await
        .expect("Failed to send availability request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["slots"][0]
        .as_str()
        .expect("No free slot in the next two weeks")
        .to_string()
}

fn booking_payload(start_at: &str) -> Value {
    json!({
        "service_id": service_id(),
        "staff_id": staff_id(),
        "start_at": start_at,
        "customer_phone": "+33612345678",
        "customer_name": "Test Customer"
    })
}

async fn create_booking(client: &Client, key: &str, payload: &Value) -> reqwest::Response {
    client
        .post(format!("{}/salons/{}/bookings", BASE_URL, salon_slug()))
        .header("Idempotency-Key", key)
        .json(payload)
        .send()
        .await
        .expect("Failed to send create booking request")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_availability_range_validation() {
    let client = Client::new();

    let response = client
        .get(format!("{}/salons/{}/availability", BASE_URL, salon_slug()))
        .query(&[
            ("service_id", service_id()),
            ("staff_id", staff_id()),
            ("from", "2025-06-10".to_string()),
            ("to", "2025-06-01".to_string()),
        ])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
#[ignore]
async fn test_create_booking_missing_idempotency_key() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;

    let response = client
        .post(format!("{}/salons/{}/bookings", BASE_URL, salon_slug()))
        .json(&booking_payload(&slot))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_idempotent_replay_returns_same_booking() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;
    let key = Uuid::new_v4().to_string();
    let payload = booking_payload(&slot);

    let first = create_booking(&client, &key, &payload).await;
    assert_eq!(first.status(), 201);
    let first_body: Value = first.json().await.expect("Failed to parse response");

    let replay = create_booking(&client, &key, &payload).await;
    assert_eq!(replay.status(), 201);
    let replay_body: Value = replay.json().await.expect("Failed to parse response");

    // Replay is verbatim: same booking, no second row
    assert_eq!(first_body["id"], replay_body["id"]);
}

#[tokio::test]
#[ignore]
async fn test_key_reuse_with_different_payload_conflicts() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;
    let key = Uuid::new_v4().to_string();

    let first = create_booking(&client, &key, &booking_payload(&slot)).await;
    assert_eq!(first.status(), 201);

    let mut other = booking_payload(&slot);
    other["customer_name"] = json!("Someone Else");
    let second = create_booking(&client, &key, &other).await;

    assert_eq!(second.status(), 409);
    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "IDEMPOTENCY_CONFLICT");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_requests_for_same_slot() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;
    let payload = booking_payload(&slot);

    let key_a = Uuid::new_v4().to_string();
    let key_b = Uuid::new_v4().to_string();
    let a = create_booking(&client, &key_a, &payload);
    let b = create_booking(&client, &key_b, &payload);
    let (a, b) = tokio::join!(a, b);

    let mut statuses = [a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [201, 409]);

    let loser = if a.status() == 409 { a } else { b };
    let body: Value = loser.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "SLOT_UNAVAILABLE");
}

#[tokio::test]
#[ignore]
async fn test_lifecycle_terminal_state_is_final() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;

    let response = create_booking(&client, &Uuid::new_v4().to_string(), &booking_payload(&slot)).await;
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let id = booking["id"].as_str().unwrap();

    let cancel = client
        .post(format!(
            "{}/salons/{}/bookings/{}/cancel",
            BASE_URL,
            salon_slug(),
            id
        ))
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .send()
        .await
        .expect("Failed to send request");
    assert!(cancel.status().is_success());

    // Canceled is terminal: completing must fail
    let complete = client
        .post(format!(
            "{}/salons/{}/bookings/{}/complete",
            BASE_URL,
            salon_slug(),
            id
        ))
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(complete.status(), 409);
    let body: Value = complete.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "INVALID_TRANSITION");
}

#[tokio::test]
#[ignore]
async fn test_canceled_booking_frees_the_slot() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;

    let response = create_booking(&client, &Uuid::new_v4().to_string(), &booking_payload(&slot)).await;
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let id = booking["id"].as_str().unwrap();

    let cancel = client
        .post(format!(
            "{}/salons/{}/bookings/{}/cancel",
            BASE_URL,
            salon_slug(),
            id
        ))
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .send()
        .await
        .expect("Failed to send request");
    assert!(cancel.status().is_success());

    // The same slot is bookable again
    let rebook = create_booking(&client, &Uuid::new_v4().to_string(), &booking_payload(&slot)).await;
    assert_eq!(rebook.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_payment_flow_updates_payment_state() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;

    let response = create_booking(&client, &Uuid::new_v4().to_string(), &booking_payload(&slot)).await;
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let id = booking["id"].as_str().unwrap();
    assert_eq!(booking["payment_state"], "unpaid");

    let init = client
        .post(format!(
            "{}/salons/{}/bookings/{}/payments",
            BASE_URL,
            salon_slug(),
            id
        ))
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(init.status(), 201);
    let payment: Value = init.json().await.expect("Failed to parse response");

    let event_id = Uuid::new_v4().to_string();
    let webhook = client
        .post(format!("{}/webhooks/payments/checkout", BASE_URL))
        .json(&json!({
            "event_id": event_id,
            "payment_id": payment["payment_id"],
            "outcome": "captured"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(webhook.status().is_success());
    let body: Value = webhook.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "applied");

    // Replaying the same provider event is acknowledged without effect
    let replay = client
        .post(format!("{}/webhooks/payments/checkout", BASE_URL))
        .json(&json!({
            "event_id": event_id,
            "payment_id": payment["payment_id"],
            "outcome": "captured"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(replay.status().is_success());
    let body: Value = replay.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "replayed");

    let fetched = client
        .get(format!(
            "{}/salons/{}/bookings/{}",
            BASE_URL,
            salon_slug(),
            id
        ))
        .send()
        .await
        .expect("Failed to send request");
    let fetched: Value = fetched.json().await.expect("Failed to parse response");
    assert_eq!(fetched["payment_state"], "paid");
}

#[tokio::test]
#[ignore]
async fn test_commission_auto_settles_after_capture() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;

    let response = create_booking(&client, &Uuid::new_v4().to_string(), &booking_payload(&slot)).await;
    assert_eq!(response.status(), 201);
    let booking: Value = response.json().await.expect("Failed to parse response");
    let id = booking["id"].as_str().unwrap();

    let init = client
        .post(format!(
            "{}/salons/{}/bookings/{}/payments",
            BASE_URL,
            salon_slug(),
            id
        ))
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(init.status(), 201);
    let payment: Value = init.json().await.expect("Failed to parse response");

    let webhook = client
        .post(format!("{}/webhooks/payments/checkout", BASE_URL))
        .json(&json!({
            "event_id": Uuid::new_v4().to_string(),
            "payment_id": payment["payment_id"],
            "outcome": "captured"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(webhook.status().is_success());

    // Commission calculation runs as a post-commit side effect; poll for it
    let mut commission = None;
    for _ in 0..20 {
        let response = client
            .get(format!(
                "{}/salons/{}/bookings/{}/commission",
                BASE_URL,
                salon_slug(),
                id
            ))
            .send()
            .await
            .expect("Failed to send request");
        if response.status().is_success() {
            commission = Some(response.json::<Value>().await.expect("Failed to parse response"));
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    // Requires the test salon to carry an active commission policy
    let body = commission.expect("Commission was never calculated");
    assert_eq!(body["commission"]["status"], "charged");
    assert_eq!(body["payments"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore]
async fn test_reschedule_to_taken_slot_conflicts() {
    let client = Client::new();
    let slot = first_free_slot(&client).await;

    let first = create_booking(&client, &Uuid::new_v4().to_string(), &booking_payload(&slot)).await;
    assert_eq!(first.status(), 201);
    let first: Value = first.json().await.expect("Failed to parse response");

    let second_slot = first_free_slot(&client).await;
    let second = create_booking(
        &client,
        &Uuid::new_v4().to_string(),
        &booking_payload(&second_slot),
    )
    .await;
    assert_eq!(second.status(), 201);
    let second: Value = second.json().await.expect("Failed to parse response");

    // Moving the second booking onto the first one's slot must fail
    let reschedule = client
        .patch(format!(
            "{}/salons/{}/bookings/{}",
            BASE_URL,
            salon_slug(),
            second["id"].as_str().unwrap()
        ))
        .header("Idempotency-Key", Uuid::new_v4().to_string())
        .json(&json!({ "start_at": first["start_at"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(reschedule.status(), 409);
    let body: Value = reschedule.json().await.expect("Failed to parse response");
    assert_eq!(body["code"], "SLOT_UNAVAILABLE");
}

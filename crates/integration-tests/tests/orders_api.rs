//! Public order submission and the owner notification that follows it.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use menuboard_functions::store::{DocPath, DocumentStore};
use menuboard_integration_tests::{TestApp, error_status};

fn order() -> Value {
    json!({
        "customerName": "Ada",
        "customerEmail": "ada@example.org",
        "items": [
            {"name": "Margherita", "quantity": 2, "price": "9.50"},
            {"name": "Water", "price": "2.00"}
        ]
    })
}

#[tokio::test]
async fn test_order_is_stored_and_owner_notified() {
    let app = TestApp::new().await;
    app.put(
        "profile/u1",
        json!({"name": "Pizza Place", "email": "owner@pizza.test"}),
    )
    .await;

    let (status, body) = app
        .call(Method::POST, "/stores/u1/orders", None, Some(order()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));

    let order_id = body["orderId"].as_str().unwrap();
    let stored = app
        .documents
        .get(&DocPath::parse(&format!("submissions/u1/data/{order_id}")).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.data["customerName"], json!("Ada"));
    assert_eq!(stored.data["status"], json!("pending"));

    app.wait_for_mail_attempts(1).await;
    let sent = app.mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "owner@pizza.test");
    assert!(sent[0].subject.contains("Ada"));
    assert!(sent[0].text.contains("Margherita"));
}

#[tokio::test]
async fn test_store_without_email_gets_no_mail() {
    let app = TestApp::new().await;
    app.put("profile/u1", json!({"name": "Quiet Cafe"})).await;

    let (status, _) = app
        .call(Method::POST, "/stores/u1/orders", None, Some(order()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Give the worker a chance to run.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(app.mailer.attempts(), 0);
}

#[tokio::test]
async fn test_failed_mail_does_not_fail_order() {
    let app = TestApp::new().await;
    app.put(
        "profile/u1",
        json!({"name": "Pizza Place", "email": "owner@pizza.test"}),
    )
    .await;
    app.mailer.fail_sends(true);

    let (status, _) = app
        .call(Method::POST, "/stores/u1/orders", None, Some(order()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    app.wait_for_mail_attempts(1).await;
    assert!(app.mailer.sent().await.is_empty());
    assert_eq!(app.documents.count_prefix("submissions/u1/data/").await, 1);
}

#[tokio::test]
async fn test_unknown_store_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .call(Method::POST, "/stores/nobody/orders", None, Some(order()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_status(&body), "INVALID_ARGUMENT");
    assert_eq!(app.documents.count_prefix("submissions").await, 0);
}

#[tokio::test]
async fn test_invalid_orders_are_rejected() {
    let app = TestApp::new().await;
    app.put("profile/u1", json!({"name": "Cafe"})).await;

    let cases = [
        json!({"customerName": "Ada", "items": []}),
        json!({"customerName": "", "items": [{"name": "x", "price": "1"}]}),
        json!({"customerName": "Ada", "items": [{"name": "x", "price": "-3"}]}),
        json!({"customerName": "Ada", "items": [{"name": "x", "price": "not a number"}]}),
        json!("just a string"),
    ];
    for body in cases {
        let (status, response) = app
            .call(Method::POST, "/stores/u1/orders", None, Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(error_status(&response), "INVALID_ARGUMENT");
    }
    assert_eq!(app.documents.count_prefix("submissions").await, 0);
}

#[tokio::test]
async fn test_overflowing_total_is_rejected_and_mail_keeps_flowing() {
    let app = TestApp::new().await;
    app.put(
        "profile/u1",
        json!({"name": "Pizza Place", "email": "owner@pizza.test"}),
    )
    .await;

    let huge = json!({
        "customerName": "Ada",
        "items": [{"name": "Everything", "quantity": 2, "price": "79228162514264337593543950335"}]
    });
    let (status, body) = app
        .call(Method::POST, "/stores/u1/orders", None, Some(huge))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_status(&body), "INVALID_ARGUMENT");
    assert_eq!(app.documents.count_prefix("submissions").await, 0);

    let (status, _) = app
        .call(Method::POST, "/stores/u1/orders", None, Some(order()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.wait_for_mail_attempts(1).await;
    assert_eq!(app.mailer.sent().await.len(), 1);
}

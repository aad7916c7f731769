mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::TestApp;

fn shipment_payload(courier_id: Uuid) -> serde_json::Value {
    json!({
        "courier_id": courier_id.to_string(),
        "customer_name": "Acme Hardware",
        "customer_address": "12 Harbour Road, Bristol",
        "customer_phone": "+44 20 7946 0000",
        "items": [{ "item_name": "M8 hex bolts (box of 100)", "quantity": 30 }]
    })
}

#[tokio::test]
async fn create_shipment_generates_tracking_number() {
    let app = TestApp::new().await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/shipments",
            Some(shipment_payload(courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;

    let tracking = body["data"]["tracking_number"].as_str().unwrap();
    assert!(tracking.starts_with("TRK-"));
    assert_eq!(body["data"]["status"], json!("Pending"));
    assert_eq!(body["data"]["courier_name"], json!("Swift Couriers"));

    // Lookup by the generated tracking number.
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/shipments/track/{}", tracking),
            None,
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["tracking_number"], json!(tracking));
}

#[tokio::test]
async fn create_shipment_rejects_inactive_courier() {
    let app = TestApp::new().await;
    let courier = app.seed_courier(false).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/shipments",
            Some(shipment_payload(courier.id)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delivered_without_date_stamps_today() {
    let app = TestApp::new().await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/shipments",
            Some(shipment_payload(courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(body["data"]["delivery_date"].is_null());

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/shipments/{}/status", id),
            Some(json!({ "status": "Delivered" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], json!("Delivered"));
    assert!(
        body["data"]["delivery_date"].is_string(),
        "delivery date should be auto-assigned"
    );
}

#[tokio::test]
async fn picked_up_stamps_pickup_date_once() {
    let app = TestApp::new().await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/shipments",
            Some(shipment_payload(courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/shipments/{}/status", id),
            Some(json!({ "status": "Picked Up" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    let first_pickup = body["data"]["pickup_date"].as_str().unwrap().to_string();

    // Writing the same status again keeps the original timestamp.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/shipments/{}/status", id),
            Some(json!({ "status": "Picked Up" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["pickup_date"], json!(first_pickup));
}

#[tokio::test]
async fn status_transitions_are_unconstrained() {
    // The courier's progress does not always arrive in order; any status
    // may overwrite any other.
    let app = TestApp::new().await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/shipments",
            Some(shipment_payload(courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    for status in ["Delivered", "Pending", "Out for Delivery"] {
        let response = app
            .request_authenticated(
                Method::PUT,
                &format!("/api/v1/shipments/{}/status", id),
                Some(json!({ "status": status })),
            )
            .await;
        let body = TestApp::read_json(response, StatusCode::OK).await;
        assert_eq!(body["data"]["status"], json!(status));
    }
}

#[tokio::test]
async fn unknown_shipment_returns_404() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/shipments/{}", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/shipments/track/TRK-nope", None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_shipments_filters_by_status() {
    let app = TestApp::new().await;
    let courier = app.seed_courier(true).await;

    for _ in 0..2 {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/shipments",
                Some(shipment_payload(courier.id)),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/shipments?status=Pending", None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], json!(2));

    let response = app
        .request_authenticated(Method::GET, "/api/v1/shipments?status=Delivered", None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], json!(0));
}

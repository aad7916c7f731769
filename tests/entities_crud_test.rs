mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::TestApp;

#[tokio::test]
async fn customer_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/customers",
            Some(json!({
                "name": "Acme Hardware",
                "email": "orders@acme-hardware.example",
                "phone": "+44 20 7946 0000"
            })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/customers/{}", id),
            Some(json!({ "address": "12 Harbour Road, Bristol" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["address"], json!("12 Harbour Road, Bristol"));
    assert_eq!(body["data"]["name"], json!("Acme Hardware"));

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/customers/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/customers/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_customer_email_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/customers",
            Some(json!({ "name": "Acme", "email": "not-an-email" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn supplier_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "Fastenal",
                "contact_name": "Jo Smith",
                "email": "jo@fastenal.example"
            })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/suppliers/{}", id), None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["contact_name"], json!("Jo Smith"));
}

#[tokio::test]
async fn duplicate_invoice_number_conflicts() {
    let app = TestApp::new().await;
    let customer_id = Uuid::new_v4();

    let payload = json!({
        "invoice_number": "INV-2024-0001",
        "customer_id": customer_id.to_string(),
        "customer_name": "Acme Hardware",
        "amount": "199.99"
    });

    let response = app
        .request_authenticated(Method::POST, "/api/v1/invoices", Some(payload.clone()))
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    assert_eq!(body["data"]["status"], json!("Draft"));

    let response = app
        .request_authenticated(Method::POST, "/api/v1/invoices", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invoice_status_updates_and_filters() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/invoices",
            Some(json!({
                "invoice_number": "INV-2024-0002",
                "customer_id": Uuid::new_v4().to_string(),
                "customer_name": "Acme Hardware",
                "amount": "80.00"
            })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/invoices/{}", id),
            Some(json!({ "status": "Paid" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], json!("Paid"));

    let response = app
        .request_authenticated(Method::GET, "/api/v1/invoices?status=Paid", None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["total"], json!(1));
}

#[tokio::test]
async fn purchase_order_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "po_number": "PO-2024-0114",
                "supplier_id": Uuid::new_v4().to_string(),
                "supplier_name": "Fastenal",
                "total_amount": "640.00"
            })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], json!("Draft"));

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/purchase-orders/{}", id),
            Some(json!({ "status": "Received" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], json!("Received"));

    // Duplicate PO number conflicts.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/purchase-orders",
            Some(json!({
                "po_number": "PO-2024-0114",
                "supplier_id": Uuid::new_v4().to_string(),
                "supplier_name": "Fastenal",
                "total_amount": "10.00"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn order_crud_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "order_number": "ORD-2024-0551",
                "customer_id": Uuid::new_v4().to_string(),
                "customer_name": "Acme Hardware",
                "total_amount": "99.98"
            })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], json!("Pending"));

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/orders/{}", id),
            Some(json!({ "status": "Fulfilled" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], json!("Fulfilled"));

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/orders/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn product_crud_and_sku_conflict() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "M8 hex bolts (box of 100)",
                "sku": "BOLT-M8-100",
                "unit_price": "12.50"
            })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["is_active"], json!(true));

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Duplicate bolts",
                "sku": "BOLT-M8-100",
                "unit_price": "11.00"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/products/{}", id),
            Some(json!({ "is_active": false })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["is_active"], json!(false));
}

#[tokio::test]
async fn active_couriers_endpoint_filters_inactive() {
    let app = TestApp::new().await;
    let active = app.seed_courier(true).await;
    let _inactive = app.seed_courier(false).await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/couriers/active", None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!(active.id.to_string()));
}

#[tokio::test]
async fn status_and_health_are_open() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/v1/health", None).await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["checks"]["database"], json!("healthy"));
}

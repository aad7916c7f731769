mod common;

use axum::http::{Method, StatusCode};
use sea_orm::EntityTrait;
use serde_json::{json, Value};
use stockflow_api::entities::{dispatch_record, shipment};
use stockflow_api::services::dispatch::DispatchStockCommand;
use uuid::Uuid;

use common::TestApp;

fn dispatch_payload(stock_id: Uuid, quantity: i32, courier_id: Uuid) -> Value {
    json!({
        "stock_id": stock_id.to_string(),
        "dispatch_quantity": quantity,
        "invoice_id": Uuid::new_v4().to_string(),
        "customer_id": Uuid::new_v4().to_string(),
        "customer_name": "Acme Hardware",
        "courier_id": courier_id.to_string(),
        "customer_phone": "+44 20 7946 0000",
        "customer_address": "12 Harbour Road, Bristol",
        "notes": "leave at reception"
    })
}

#[tokio::test]
async fn dispatch_reduces_stock_and_links_records() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 100).await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/dispatch",
            Some(dispatch_payload(stock.id, 30, courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;

    assert_eq!(body["success"], json!(true));
    let data = &body["data"];

    // Stock reduced exactly once.
    assert_eq!(data["stock_item"]["quantity"], json!(70));

    // One shipment with a non-empty tracking number.
    let tracking = data["shipment"]["tracking_number"]
        .as_str()
        .expect("tracking number present");
    assert!(!tracking.is_empty());
    assert_eq!(data["shipment"]["status"], json!("Pending"));
    assert_eq!(data["shipment"]["courier_name"], json!("Swift Couriers"));

    // Dispatch record pending and linked to the new shipment.
    assert_eq!(data["dispatch_record"]["status"], json!("Pending"));
    assert_eq!(
        data["dispatch_record"]["shipment_id"],
        data["shipment"]["id"]
    );
    assert_eq!(data["dispatch_record"]["dispatched_quantity"], json!(30));

    // Persisted state agrees.
    let updated = app
        .state
        .services
        .stock
        .get_stock(stock.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.quantity, 70);

    let shipments = shipment::Entity::find().all(&*app.state.db).await.unwrap();
    assert_eq!(shipments.len(), 1);
    let records = dispatch_record::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn insufficient_stock_is_a_full_noop() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 10).await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/dispatch",
            Some(dispatch_payload(stock.id, 15, courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::BAD_REQUEST).await;
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("Insufficient stock"));

    // Nothing was written.
    let unchanged = app
        .state
        .services
        .stock
        .get_stock(stock.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.quantity, 10);
    assert!(shipment::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
    assert!(dispatch_record::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn missing_courier_is_rejected_before_any_write() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 50).await;

    // No courier_id at all: rejected at the schema boundary.
    let mut payload = dispatch_payload(stock.id, 5, Uuid::new_v4());
    payload.as_object_mut().unwrap().remove("courier_id");
    let response = app
        .request_authenticated(Method::POST, "/api/v1/dispatch", Some(payload))
        .await;
    assert!(
        response.status().is_client_error(),
        "expected client error, got {}",
        response.status()
    );

    // Empty customer name: rejected by field validation with 400.
    let mut payload = dispatch_payload(stock.id, 5, Uuid::new_v4());
    payload["customer_name"] = json!("");
    let response = app
        .request_authenticated(Method::POST, "/api/v1/dispatch", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown courier id: rejected after lookup, still before any write.
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/dispatch",
            Some(dispatch_payload(stock.id, 5, Uuid::new_v4())),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let unchanged = app
        .state
        .services
        .stock
        .get_stock(stock.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.quantity, 50);
    assert!(shipment::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
    assert!(dispatch_record::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn inactive_courier_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 50).await;
    let courier = app.seed_courier(false).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/dispatch",
            Some(dispatch_payload(stock.id, 5, courier.id)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unchanged = app
        .state
        .services
        .stock
        .get_stock(stock.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.quantity, 50);
}

#[tokio::test]
async fn resubmitting_an_identical_dispatch_creates_a_second_one() {
    // Re-submission does not self-cancel: the system has no dedup key, so
    // the same request twice means two shipments, two records, and two
    // decrements. Documented behavior, not a bug.
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 100).await;
    let courier = app.seed_courier(true).await;

    let payload = dispatch_payload(stock.id, 30, courier.id);

    let first = app
        .request_authenticated(Method::POST, "/api/v1/dispatch", Some(payload.clone()))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .request_authenticated(Method::POST, "/api/v1/dispatch", Some(payload))
        .await;
    assert_eq!(second.status(), StatusCode::CREATED);

    let updated = app
        .state
        .services
        .stock
        .get_stock(stock.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.quantity, 40);

    let shipments = shipment::Entity::find().all(&*app.state.db).await.unwrap();
    assert_eq!(shipments.len(), 2);
    assert_ne!(shipments[0].tracking_number, shipments[1].tracking_number);

    let records = dispatch_record::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn concurrent_dispatches_cannot_overdraw_stock() {
    // Two dispatches whose combined quantity exceeds availability: the
    // conditional decrement guarantees at most one of them lands.
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 30).await;
    let courier = app.seed_courier(true).await;

    let make_command = |qty: i32| DispatchStockCommand {
        stock_id: stock.id,
        dispatch_quantity: qty,
        invoice_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        customer_name: "Acme Hardware".to_string(),
        courier_id: courier.id,
        customer_phone: "+44 20 7946 0000".to_string(),
        customer_address: "12 Harbour Road, Bristol".to_string(),
        estimated_delivery: None,
        notes: None,
    };

    let service_a = app.state.services.dispatch.clone();
    let service_b = app.state.services.dispatch.clone();
    let (command_a, command_b) = (make_command(20), make_command(20));

    let task_a = tokio::spawn(async move { service_a.dispatch_stock(command_a).await.is_ok() });
    let task_b = tokio::spawn(async move { service_b.dispatch_stock(command_b).await.is_ok() });

    let successes = [task_a.await.unwrap(), task_b.await.unwrap()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "exactly one of the two dispatches may land");

    let final_stock = app
        .state
        .services
        .stock
        .get_stock(stock.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(final_stock.quantity, 10);

    // The loser's saga rolled its writes back: one shipment, one record.
    let shipments = shipment::Entity::find().all(&*app.state.db).await.unwrap();
    assert_eq!(shipments.len(), 1);
    let records = dispatch_record::Entity::find()
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn dispatch_status_updates_independently_of_shipment() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 100).await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/dispatch",
            Some(dispatch_payload(stock.id, 10, courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let dispatch_id = body["data"]["dispatch_record"]["dispatch_id"]
        .as_str()
        .unwrap()
        .to_string();
    let shipment_id = body["data"]["shipment"]["id"].as_str().unwrap().to_string();

    // Move the dispatch record to In Transit; the shipment stays Pending.
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/dispatch/{}/status", dispatch_id),
            Some(json!({ "status": "In Transit", "notes": "handed to courier" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], json!("In Transit"));
    assert_eq!(body["data"]["notes"], json!("handed to courier"));

    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/shipments/{}", shipment_id),
            None,
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["status"], json!("Pending"));
}

#[tokio::test]
async fn unknown_dispatch_status_is_rejected() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 100).await;
    let courier = app.seed_courier(true).await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/dispatch",
            Some(dispatch_payload(stock.id, 10, courier.id)),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let dispatch_id = body["data"]["dispatch_record"]["dispatch_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/dispatch/{}/status", dispatch_id),
            Some(json!({ "status": "Teleported" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

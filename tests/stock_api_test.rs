mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::TestApp;

#[tokio::test]
async fn stock_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/stock", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::POST, "/api/v1/stock", Some(json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stock_crud_round_trip() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/stock",
            Some(json!({
                "product_id": product.id.to_string(),
                "item_name": "M8 hex bolts (box of 100)",
                "quantity": 40,
                "location": "Aisle 4, Shelf B",
                "supplier": "Fastenal",
                "batch_number": "B-2219"
            })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::CREATED).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["quantity"], json!(40));

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/stock/{}", id), None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["item_name"], json!("M8 hex bolts (box of 100)"));

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/stock/{}", id),
            Some(json!({ "quantity": 55, "location": "Aisle 1, Shelf A" })),
        )
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["quantity"], json!(55));
    assert_eq!(body["data"]["location"], json!("Aisle 1, Shelf A"));

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/stock/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/stock/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_quantity_never_reaches_the_store() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let stock = app.seed_stock(product.id, 20).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/stock/{}", stock.id),
            Some(json!({ "quantity": -5 })),
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
    assert_eq!(unchanged.quantity, 20);
}

#[tokio::test]
async fn stock_creation_requires_existing_product() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/stock",
            Some(json!({
                "product_id": Uuid::new_v4().to_string(),
                "item_name": "Phantom stock",
                "quantity": 5,
                "location": "Nowhere",
                "supplier": "Nobody"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn low_stock_lists_items_at_or_below_threshold() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    let low = app.seed_stock(product.id, 3).await;
    let _plenty = app.seed_stock(product.id, 500).await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/stock/low?threshold=10", None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!(low.id.to_string()));
}

#[tokio::test]
async fn stock_list_paginates() {
    let app = TestApp::new().await;
    let product = app.seed_product("BOLT-M8-100").await;
    for _ in 0..5 {
        app.seed_stock(product.id, 10).await;
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/stock?page=1&limit=2", None)
        .await;
    let body = TestApp::read_json(response, StatusCode::OK).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], json!(5));
    assert_eq!(body["data"]["total_pages"], json!(3));
}

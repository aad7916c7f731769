#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use stockflow_api::{
    api_v1_routes,
    auth::AuthService,
    config::AppConfig,
    db,
    entities::{courier, product, stock_item},
    events::{process_events, EventSender},
    handlers::AppServices,
    services::couriers::CreateCourierInput,
    services::products::CreateProductInput,
    services::stock::CreateStockItemInput,
    AppState,
};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Test harness: the real router over a file-backed SQLite database that
/// lives for the duration of the test.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir for test database");
        let db_path = db_dir.path().join("stockflow_test.db");
        let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(
            database_url,
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("run migrations");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), event_sender.clone());
        let auth_service = Arc::new(AuthService::new(
            &cfg.jwt_secret,
            Duration::from_secs(3600),
        ));
        let token = auth_service
            .mint_token("test-user", Some("Test User"))
            .expect("mint test token");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", api_v1_routes())
            .layer(axum::middleware::from_fn_with_state(
                auth_service,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: axum::http::Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            token,
            _db_dir: db_dir,
        }
    }

    /// Sends a request without an Authorization header.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            })
            .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    /// Sends a request with the harness's bearer token attached.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            })
            .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    /// Reads a JSON response body, asserting the expected status first.
    pub async fn read_json(response: Response<Body>, expected: StatusCode) -> Value {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(
            status,
            expected,
            "unexpected status; body: {}",
            String::from_utf8_lossy(&bytes)
        );
        serde_json::from_slice(&bytes).expect("parse JSON body")
    }

    pub async fn seed_product(&self, sku: &str) -> product::Model {
        self.state
            .services
            .products
            .create_product(CreateProductInput {
                name: format!("Product {}", sku),
                sku: sku.to_string(),
                description: None,
                category: Some("Test".to_string()),
                unit_price: Decimal::new(1_250, 2),
                is_active: Some(true),
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_stock(&self, product_id: Uuid, quantity: i32) -> stock_item::Model {
        self.state
            .services
            .stock
            .create_stock(CreateStockItemInput {
                product_id,
                item_name: "M8 hex bolts (box of 100)".to_string(),
                quantity,
                location: "Aisle 4, Shelf B".to_string(),
                supplier: "Fastenal".to_string(),
                batch_number: Some("B-2219".to_string()),
            })
            .await
            .expect("seed stock item")
    }

    pub async fn seed_courier(&self, active: bool) -> courier::Model {
        self.state
            .services
            .couriers
            .create_courier(CreateCourierInput {
                name: "Swift Couriers".to_string(),
                phone: Some("+44 117 000 0000".to_string()),
                pricing: Decimal::new(799, 2),
                rating: Decimal::new(45, 1),
                is_active: Some(active),
                service_areas: Some("Bristol,Bath".to_string()),
            })
            .await
            .expect("seed courier")
    }
}

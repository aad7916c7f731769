use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockflow API",
        version = "0.3.0",
        description = r#"
# Stockflow Inventory Management API

Backend for a small-business inventory system: product catalog, stock
tracking, the dispatch/shipment workflow, customers, suppliers, invoicing,
and purchase orders.

## Authentication

All entity and workflow endpoints require a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Only `/api/v1/status` and `/api/v1/health` are open.

## Dispatch workflow

`POST /api/v1/dispatch` is the one multi-step operation: it creates a
shipment, writes an append-only dispatch record linked to it, and
atomically decrements the stock item's quantity. A request that fails
validation or has insufficient stock is a full no-op; a failure partway
through rolls the earlier writes back and, if that rollback itself fails,
reports exactly which records survived.

## Pagination

List endpoints accept `page` and `limit` query parameters and return
`{ items, total, page, limit, total_pages }`.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "products", description = "Product catalog endpoints"),
        (name = "stock", description = "Stock tracking endpoints"),
        (name = "dispatch", description = "Dispatch workflow and history"),
        (name = "shipments", description = "Shipment tracking endpoints"),
        (name = "health", description = "Liveness and readiness")
    ),
    paths(
        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Stock
        crate::handlers::stock::list_stock,
        crate::handlers::stock::low_stock,
        crate::handlers::stock::get_stock,
        crate::handlers::stock::create_stock,
        crate::handlers::stock::update_stock,
        crate::handlers::stock::delete_stock,

        // Dispatch
        crate::handlers::dispatch::dispatch_stock,
        crate::handlers::dispatch::list_dispatches,
        crate::handlers::dispatch::get_dispatch,
        crate::handlers::dispatch::update_dispatch_status,

        // Shipments
        crate::handlers::shipments::list_shipments,
        crate::handlers::shipments::get_shipment,
        crate::handlers::shipments::track_by_number,
        crate::handlers::shipments::create_shipment,
        crate::handlers::shipments::update_shipment,
        crate::handlers::shipments::update_shipment_status,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,

            crate::handlers::products::ProductResponse,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,

            crate::handlers::stock::StockItemResponse,
            crate::handlers::stock::CreateStockItemRequest,
            crate::handlers::stock::UpdateStockItemRequest,

            crate::handlers::dispatch::DispatchRequest,
            crate::handlers::dispatch::DispatchResponse,
            crate::handlers::dispatch::DispatchRecordResponse,
            crate::handlers::dispatch::UpdateDispatchStatusRequest,

            crate::handlers::shipments::ShipmentResponse,
            crate::handlers::shipments::CreateShipmentRequest,
            crate::handlers::shipments::ShipmentLineRequest,
            crate::handlers::shipments::UpdateShipmentRequest,
            crate::handlers::shipments::UpdateShipmentStatusRequest,

            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_generates() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Stockflow API"));
        assert!(json.contains("/api/v1/dispatch"));
    }
}

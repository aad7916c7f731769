pub mod couriers;
pub mod customers;
pub mod dispatch;
pub mod invoices;
pub mod orders;
pub mod products;
pub mod purchase_orders;
pub mod shipments;
pub mod stock;
pub mod suppliers;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<crate::services::products::ProductService>,
    pub stock: Arc<crate::services::stock::StockService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub suppliers: Arc<crate::services::suppliers::SupplierService>,
    pub invoices: Arc<crate::services::invoices::InvoiceService>,
    pub purchase_orders: Arc<crate::services::purchase_orders::PurchaseOrderService>,
    pub couriers: Arc<crate::services::couriers::CourierService>,
    pub shipments: Arc<crate::services::shipments::ShipmentService>,
    pub dispatch: Arc<crate::services::dispatch::DispatchService>,
    pub orders: Arc<crate::services::orders::OrderService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        let products = Arc::new(crate::services::products::ProductService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let stock = crate::services::stock::StockService::new(
            db_pool.clone(),
            event_sender.clone(),
        );
        let customers = Arc::new(crate::services::customers::CustomerService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let suppliers = Arc::new(crate::services::suppliers::SupplierService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let invoices = Arc::new(crate::services::invoices::InvoiceService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let purchase_orders = Arc::new(
            crate::services::purchase_orders::PurchaseOrderService::new(
                db_pool.clone(),
                event_sender.clone(),
            ),
        );
        let couriers = Arc::new(crate::services::couriers::CourierService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let shipments = Arc::new(crate::services::shipments::ShipmentService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let dispatch = Arc::new(crate::services::dispatch::DispatchService::new(
            db_pool.clone(),
            event_sender.clone(),
            stock.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool,
            event_sender,
        ));

        Self {
            products,
            stock: Arc::new(stock),
            customers,
            suppliers,
            invoices,
            purchase_orders,
            couriers,
            shipments,
            dispatch,
            orders,
        }
    }
}

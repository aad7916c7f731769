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

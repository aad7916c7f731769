use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by services after successful writes. Delivery is
/// best-effort: a full or closed channel never fails the originating
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Stock events
    StockCreated(Uuid),
    StockAdjusted {
        stock_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
    },
    StockDispatched {
        stock_id: Uuid,
        dispatched_quantity: i32,
        dispatch_id: String,
        shipment_id: Uuid,
    },
    StockDeleted(Uuid),

    // Dispatch events
    DispatchRecordCreated(String),
    DispatchStatusChanged {
        dispatch_id: String,
        old_status: String,
        new_status: String,
    },

    // Shipment events
    ShipmentCreated(Uuid),
    ShipmentUpdated(Uuid),
    ShipmentStatusChanged {
        shipment_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Partner and billing events
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    InvoiceCreated(Uuid),
    InvoiceUpdated(Uuid),
    PurchaseOrderCreated(Uuid),
    PurchaseOrderUpdated(Uuid),
    OrderCreated(Uuid),
    OrderUpdated(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging rather than propagating failure. Services
    /// call this after their write has already committed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(err) = self.send(event.clone()).await {
            warn!(?event, "dropping event: {}", err);
        }
    }
}

/// Background consumer for domain events. Runs for the lifetime of the
/// process and logs each event; integrations hook in here.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::StockDispatched {
                stock_id,
                dispatched_quantity,
                dispatch_id,
                shipment_id,
            } => {
                info!(
                    %stock_id,
                    dispatched_quantity,
                    dispatch_id = %dispatch_id,
                    %shipment_id,
                    "stock dispatched"
                );
            }
            Event::ShipmentStatusChanged {
                shipment_id,
                old_status,
                new_status,
            } => {
                info!(%shipment_id, old_status, new_status, "shipment status changed");
            }
            other => info!(event = ?other, "domain event"),
        }
    }
    info!("event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::StockCreated(Uuid::new_v4()))
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::StockCreated(_)) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out.
        sender.send_or_log(Event::ProductDeleted(Uuid::new_v4())).await;
    }
}

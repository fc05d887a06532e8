//! Demo session against an in-process storeroom.
//!
//! Reads `STOREROOM_*` configuration, runs a short borrow/return session and
//! prints the resulting read models as JSON. A subscriber thread logs every
//! published event, standing in for a persistence or reporting consumer.

use std::sync::Arc;
use std::thread;

use anyhow::Context;
use chrono::{Duration, Utc};

use stockroom_events::{EventBus, InMemoryEventBus};
use stockroom_infra::{InventoryEnvelope, Storeroom, StoreroomConfig};
use stockroom_inventory::{
    BorrowLine, BorrowRequest, Borrower, Category, LocationRequest, NewComponent, ReturnLine, SubLocationKind,
};

fn main() -> anyhow::Result<()> {
    stockroom_observability::init();

    let config = StoreroomConfig::from_env().context("loading storeroom configuration")?;
    let bus: Arc<InMemoryEventBus<InventoryEnvelope>> = Arc::new(InMemoryEventBus::new());

    let subscription = bus.subscribe();
    let consumer = thread::spawn(move || {
        while let Ok(envelope) = subscription.recv() {
            tracing::info!(
                sequence_number = envelope.sequence_number(),
                event_type = envelope.event_type(),
                stream = envelope.stream(),
                stream_id = %envelope.stream_id(),
                "event received"
            );
        }
    });

    let storeroom = Storeroom::new(config, bus.clone()).context("building storeroom")?;

    let a1 = storeroom
        .containers()
        .by_code("A1")
        .map(|c| c.id)
        .context("container A1 is not provisioned")?;
    let esp32 = storeroom.create_component(
        &NewComponent {
            name: "ESP32 DevKit".to_string(),
            category: Category::Microcontroller,
            total_quantity: 10,
            remarks: None,
            is_controlled: false,
        },
        &LocationRequest::cabinet(1, 1)
            .in_container(a1)
            .with_sub(SubLocationKind::Box, 1),
    )?;
    let resistor = storeroom.create_component(
        &NewComponent {
            name: "10k resistor".to_string(),
            category: Category::Passive,
            total_quantity: 200,
            remarks: Some("1/4 W".to_string()),
            is_controlled: false,
        },
        &LocationRequest::drawer(3).with_sub(SubLocationKind::Partition, 2),
    )?;

    let tx = storeroom.create_borrow(&BorrowRequest {
        borrower: Borrower::new("Demo Student", "tp000001", "000-0000", None)?,
        reason: "Final year project".to_string(),
        expected_return_date: Utc::now().date_naive() - Duration::days(2),
        pic_name: "Lab Officer".to_string(),
        items: vec![
            BorrowLine {
                component_id: esp32.id,
                quantity: 2,
            },
            BorrowLine {
                component_id: resistor.id,
                quantity: 20,
            },
        ],
        occurred_at: Utc::now(),
    })?;

    storeroom.return_item(
        "Lab Officer",
        ReturnLine {
            transaction_id: tx.id(),
            component_id: resistor.id,
            quantity: 20,
            remarks: Some("all accounted for".to_string()),
        },
    )?;

    let today = Utc::now().date_naive();
    println!("{}", serde_json::to_string_pretty(&storeroom.components()?)?);
    println!("{}", serde_json::to_string_pretty(&storeroom.active_loans_by_borrower(today)?)?);
    println!("{}", serde_json::to_string_pretty(&storeroom.return_history()?)?);

    let violations = storeroom.audit()?;
    anyhow::ensure!(violations.is_empty(), "conservation audit failed: {violations:?}");

    // Dropping the last bus handle disconnects the subscriber.
    drop(storeroom);
    drop(bus);
    consumer
        .join()
        .map_err(|_| anyhow::anyhow!("event consumer panicked"))?;
    Ok(())
}

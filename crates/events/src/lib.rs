//! Domain events and their in-process distribution.
//!
//! Committed inventory mutations are described as [`Event`]s, wrapped in an
//! [`EventEnvelope`] and fanned out over an [`EventBus`] to whatever
//! persistence or reporting layer subscribes.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};

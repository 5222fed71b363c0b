//! # crisiswire-hub
//!
//! Real-time notification hub for crisiswire.
//!
//! The platform backend is stateless and exposes no push channel, so this
//! crate emulates one: per-scope feed tasks synthesize events probabilistically
//! and fan them out to registered listeners. The publish/subscribe surface is
//! transport-agnostic: replacing the simulator with a genuine streaming
//! connection means implementing [`EventSource`] and touching nothing else.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use crisiswire_core::{EventKind, Notification};
//! use crisiswire_hub::{Listener, NotificationHub};
//!
//! # async fn run() {
//! let hub = NotificationHub::simulated();
//! hub.activate();
//!
//! let on_update: Listener = Arc::new(|n: &Notification| {
//!     println!("disaster updated: {:?}", n.disaster_id);
//! });
//! hub.subscribe(EventKind::DisasterUpdated, on_update.clone());
//!
//! // A detail view mounts for disaster "d1"...
//! hub.enter_scope("d1");
//! // ...and unmounts.
//! hub.leave_scope("d1");
//! hub.unsubscribe(EventKind::DisasterUpdated, &on_update);
//!
//! hub.shutdown();
//! # }
//! ```

pub mod hub;
pub mod source;

// Re-export core event types alongside the hub
pub use crisiswire_core::{EventKind, Notification, Scope};

pub use hub::{EventSink, Listener, NotificationHub};
pub use source::{EventSource, SimulatedSource, SimulationConfig};

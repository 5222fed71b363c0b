//! The notification hub: connection lifecycle, scoped feeds, and listener
//! fan-out.
//!
//! The hub presents an always-on publish/subscribe surface to the rest of the
//! application and hides whether the transport behind it is a persistent push
//! connection or periodic polling. Consumers subscribe listeners per
//! [`EventKind`]; views watching a single disaster enter that disaster's scope
//! on mount and leave it on unmount. Every operation completes synchronously
//! and none of them can fail: unknown scopes and unmatched listeners are
//! silent no-ops.
//!
//! ## Lifecycle
//!
//! | Operation | Disconnected | Connected |
//! |-----------|--------------|-----------|
//! | `activate` | → Connected, opens general feed | no-op |
//! | `shutdown` | no-op | → Disconnected, aborts every feed |
//! | `enter_scope` | no-op (intent not remembered) | opens the scope's feed |
//! | `leave_scope` | no-op | aborts the scope's feed |
//!
//! Listener registration is independent of connection state and survives
//! reconnects. Dropping the last hub handle aborts every feed task, so timers
//! are released on all exit paths.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crisiswire_core::{ConnectionState, EventKind, Notification, Scope};

use crate::source::{EventSource, SimulatedSource};

/// A registered notification listener.
///
/// The `Arc` is the listener's identity: registering the same `Arc` twice
/// creates two independent registrations, and [`NotificationHub::unsubscribe`]
/// removes exactly the first occurrence that is pointer-equal to its argument.
pub type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Recover the guard from a poisoned mutex.
///
/// Listener panics are caught before they can unwind through a hub lock, so
/// poisoning can only come from a panic in the hub itself; the registries
/// remain structurally valid either way.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Connection state plus the per-scope feed tasks, guarded as one unit so
/// lifecycle transitions and feed creation are atomic.
struct FeedTable {
    state: ConnectionState,
    tasks: HashMap<Scope, JoinHandle<()>>,
}

pub(crate) struct HubInner {
    source: Arc<dyn EventSource>,
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
    feeds: Mutex<FeedTable>,
}

impl HubInner {
    /// Fan a notification out to the listeners registered for its kind.
    ///
    /// Operates on a point-in-time snapshot of the listener list: mutations
    /// made while a fan-out is in flight (including from inside a listener)
    /// take effect on the next emit, never mid-iteration. A panicking
    /// listener is logged and skipped; later listeners still run.
    pub(crate) fn dispatch(&self, notification: &Notification) {
        let snapshot: Vec<Listener> = {
            let listeners = lock(&self.listeners);
            listeners
                .get(&notification.kind)
                .cloned()
                .unwrap_or_default()
        };

        debug!(
            kind = %notification.kind,
            event_id = %notification.event_id,
            listeners = snapshot.len(),
            "Dispatching notification"
        );

        for listener in snapshot {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(notification))) {
                error!(
                    kind = %notification.kind,
                    event_id = %notification.event_id,
                    error = %panic_message(payload.as_ref()),
                    "Notification listener panicked"
                );
            }
        }
    }
}

impl Drop for HubInner {
    fn drop(&mut self) {
        let feeds = match self.feeds.get_mut() {
            Ok(feeds) => feeds,
            Err(poisoned) => poisoned.into_inner(),
        };
        for (_, task) in feeds.tasks.drain() {
            task.abort();
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Event sink
// ============================================================================

/// Ingestion port that feed tasks (and a future push transport) deliver into.
///
/// Holds a weak reference to the hub, so an in-flight feed task never keeps a
/// torn-down hub alive and delivery after teardown is a silent no-op.
#[derive(Clone)]
pub struct EventSink {
    inner: Weak<HubInner>,
}

impl EventSink {
    pub(crate) fn new(inner: Weak<HubInner>) -> Self {
        Self { inner }
    }

    /// Deliver a notification to the hub's subscribers.
    ///
    /// Returns `false` when the hub no longer exists; sources should stop
    /// their feed loop at that point.
    pub fn deliver(&self, notification: Notification) -> bool {
        match self.inner.upgrade() {
            Some(hub) => {
                hub.dispatch(&notification);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Notification hub
// ============================================================================

/// Handle to the notification hub.
///
/// Cheap to clone; all clones share one hub. Construct once per application
/// process and inject into the components that need it.
#[derive(Clone)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    /// Create a hub over the given event source.
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            inner: Arc::new(HubInner {
                source,
                listeners: Mutex::new(HashMap::new()),
                feeds: Mutex::new(FeedTable {
                    state: ConnectionState::Disconnected,
                    tasks: HashMap::new(),
                }),
            }),
        }
    }

    /// Create a hub over the default probabilistic simulator.
    pub fn simulated() -> Self {
        Self::new(Arc::new(SimulatedSource::default()))
    }

    /// Connect the hub and open the general feed. Idempotent.
    pub fn activate(&self) {
        let mut feeds = lock(&self.inner.feeds);
        if feeds.state == ConnectionState::Connected {
            return;
        }
        feeds.state = ConnectionState::Connected;
        let task = self.spawn_feed(Scope::General);
        feeds.tasks.insert(Scope::General, task);
        info!(transport = "polling", "Notification hub connected");
    }

    /// Disconnect the hub, aborting every feed task across all scopes.
    ///
    /// Listener registrations are kept: they are independent of connection
    /// state and survive a later re-activation. Idempotent.
    pub fn shutdown(&self) {
        let mut feeds = lock(&self.inner.feeds);
        if feeds.state == ConnectionState::Disconnected {
            return;
        }
        feeds.state = ConnectionState::Disconnected;
        for (scope, task) in feeds.tasks.drain() {
            task.abort();
            debug!(scope = %scope, "Feed cancelled");
        }
        info!("Notification hub disconnected");
    }

    /// Open the feed for one disaster's scope.
    ///
    /// No-op while disconnected (the intent is not remembered for a later
    /// activation) and when the scope's feed is already open.
    pub fn enter_scope(&self, disaster_id: impl Into<String>) {
        let scope = Scope::disaster(disaster_id);
        let mut feeds = lock(&self.inner.feeds);
        if feeds.state != ConnectionState::Connected {
            debug!(scope = %scope, "enter_scope ignored while disconnected");
            return;
        }
        if feeds.tasks.contains_key(&scope) {
            return;
        }
        let task = self.spawn_feed(scope.clone());
        info!(scope = %scope, "Joined disaster feed");
        feeds.tasks.insert(scope, task);
    }

    /// Close the feed for one disaster's scope, if it is open.
    pub fn leave_scope(&self, disaster_id: impl Into<String>) {
        let scope = Scope::disaster(disaster_id);
        let mut feeds = lock(&self.inner.feeds);
        if feeds.state != ConnectionState::Connected {
            return;
        }
        if let Some(task) = feeds.tasks.remove(&scope) {
            task.abort();
            info!(scope = %scope, "Left disaster feed");
        }
    }

    /// Register a listener for one event kind. Allowed in any connection
    /// state; notification order is registration order.
    pub fn subscribe(&self, kind: EventKind, listener: Listener) {
        let mut listeners = lock(&self.inner.listeners);
        listeners.entry(kind).or_default().push(listener);
        debug!(kind = %kind, "Listener registered");
    }

    /// Remove the first registration of `listener` under `kind`, by identity.
    /// No-op when it was never registered.
    pub fn unsubscribe(&self, kind: EventKind, listener: &Listener) {
        let mut listeners = lock(&self.inner.listeners);
        if let Some(list) = listeners.get_mut(&kind) {
            if let Some(pos) = list.iter().position(|l| Arc::ptr_eq(l, listener)) {
                list.remove(pos);
                debug!(kind = %kind, "Listener removed");
            }
        }
    }

    /// Fan a notification out to its kind's listeners.
    ///
    /// This is the same path feed tasks deliver through, exposed directly so
    /// application code (and tests) can inject events.
    pub fn emit(&self, notification: Notification) {
        self.inner.dispatch(&notification);
    }

    /// Whether the hub is currently connected.
    pub fn is_connected(&self) -> bool {
        lock(&self.inner.feeds).state == ConnectionState::Connected
    }

    /// Number of open feeds, the general feed included.
    pub fn active_scopes(&self) -> usize {
        lock(&self.inner.feeds).tasks.len()
    }

    /// Whether a disaster scope's feed is currently open.
    pub fn has_scope(&self, disaster_id: &str) -> bool {
        lock(&self.inner.feeds)
            .tasks
            .contains_key(&Scope::disaster(disaster_id))
    }

    /// Number of listeners registered for one event kind.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        lock(&self.inner.listeners)
            .get(&kind)
            .map_or(0, |list| list.len())
    }

    fn spawn_feed(&self, scope: Scope) -> JoinHandle<()> {
        let source = Arc::clone(&self.inner.source);
        let sink = EventSink::new(Arc::downgrade(&self.inner));
        tokio::spawn(async move { source.run(scope, sink).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Listener that appends a tag to a shared log on every delivery.
    fn recording(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Listener {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Arc::new(move |_n: &Notification| {
            log.lock().unwrap().push(tag.clone());
        })
    }

    #[test]
    fn registry_replay_preserves_order_and_identity() {
        let hub = NotificationHub::simulated();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = recording(&log, "a");
        let b = recording(&log, "b");

        // a registered twice; each registration is independent.
        hub.subscribe(EventKind::DisasterUpdated, a.clone());
        hub.subscribe(EventKind::DisasterUpdated, b.clone());
        hub.subscribe(EventKind::DisasterUpdated, a.clone());
        assert_eq!(hub.listener_count(EventKind::DisasterUpdated), 3);

        // Removing a removes exactly the first occurrence.
        hub.unsubscribe(EventKind::DisasterUpdated, &a);
        assert_eq!(hub.listener_count(EventKind::DisasterUpdated), 2);

        hub.emit(Notification::general(EventKind::DisasterUpdated));
        assert_eq!(*log.lock().unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn unsubscribe_unknown_listener_is_noop() {
        let hub = NotificationHub::simulated();
        let log = Arc::new(Mutex::new(Vec::new()));
        let never_registered = recording(&log, "x");

        hub.unsubscribe(EventKind::ResourcesUpdated, &never_registered);
        assert_eq!(hub.listener_count(EventKind::ResourcesUpdated), 0);
    }

    #[test]
    fn emit_without_listeners_is_noop() {
        let hub = NotificationHub::simulated();
        hub.emit(Notification::general(EventKind::SocialMediaUpdated));
    }

    #[test]
    fn emit_isolates_listener_panics() {
        let hub = NotificationHub::simulated();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &Notification| {
                calls.fetch_add(1, Ordering::SeqCst);
            }) as Listener
        };
        let faulty: Listener = Arc::new(|_: &Notification| panic!("listener exploded"));
        let last = {
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &Notification| {
                calls.fetch_add(1, Ordering::SeqCst);
            }) as Listener
        };

        hub.subscribe(EventKind::DisasterUpdated, first);
        hub.subscribe(EventKind::DisasterUpdated, faulty);
        hub.subscribe(EventKind::DisasterUpdated, last);

        // Must not propagate, and the listener after the fault still runs.
        hub.emit(Notification::general(EventKind::DisasterUpdated));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The faulty listener is not deregistered by its fault.
        assert_eq!(hub.listener_count(EventKind::DisasterUpdated), 3);
    }

    #[test]
    fn fanout_uses_a_snapshot_of_the_registry() {
        let hub = NotificationHub::simulated();
        let log = Arc::new(Mutex::new(Vec::new()));

        let second = recording(&log, "second");
        let first = {
            let hub = hub.clone();
            let log = Arc::clone(&log);
            let second = second.clone();
            Arc::new(move |_: &Notification| {
                log.lock().unwrap().push("first".to_string());
                // Mutations during an in-flight fan-out apply to the next
                // emit only.
                hub.unsubscribe(EventKind::SocialMediaUpdated, &second);
            }) as Listener
        };

        hub.subscribe(EventKind::SocialMediaUpdated, first);
        hub.subscribe(EventKind::SocialMediaUpdated, second);

        hub.emit(Notification::general(EventKind::SocialMediaUpdated));
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);

        log.lock().unwrap().clear();
        hub.emit(Notification::general(EventKind::SocialMediaUpdated));
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn two_subscribers_unsubscribe_first_only_second_fires() {
        let hub = NotificationHub::simulated();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = recording(&log, "a");
        let b = recording(&log, "b");
        hub.subscribe(EventKind::SocialMediaUpdated, a.clone());
        hub.subscribe(EventKind::SocialMediaUpdated, b);

        hub.unsubscribe(EventKind::SocialMediaUpdated, &a);
        hub.emit(Notification::general(EventKind::SocialMediaUpdated));

        assert_eq!(*log.lock().unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn activate_then_shutdown_releases_everything() {
        let hub = NotificationHub::simulated();
        assert!(!hub.is_connected());
        assert_eq!(hub.active_scopes(), 0);

        hub.activate();
        assert!(hub.is_connected());
        assert_eq!(hub.active_scopes(), 1);

        hub.shutdown();
        assert!(!hub.is_connected());
        assert_eq!(hub.active_scopes(), 0);

        // Second shutdown is a no-op.
        hub.shutdown();
        assert!(!hub.is_connected());
        assert_eq!(hub.active_scopes(), 0);
    }

    #[tokio::test]
    async fn duplicate_activate_leaves_a_single_general_feed() {
        let hub = NotificationHub::simulated();
        hub.activate();
        hub.activate();
        assert_eq!(hub.active_scopes(), 1);

        hub.shutdown();
        assert_eq!(hub.active_scopes(), 0);
    }

    #[tokio::test]
    async fn enter_scope_requires_connection() {
        let hub = NotificationHub::simulated();

        hub.enter_scope("d1");
        assert!(!hub.has_scope("d1"));
        assert_eq!(hub.active_scopes(), 0);

        hub.activate();
        hub.enter_scope("d1");
        assert!(hub.has_scope("d1"));
        assert_eq!(hub.active_scopes(), 2);

        // At most one feed per scope.
        hub.enter_scope("d1");
        assert_eq!(hub.active_scopes(), 2);

        // A single leave fully stops the scope.
        hub.leave_scope("d1");
        assert!(!hub.has_scope("d1"));
        assert_eq!(hub.active_scopes(), 1);
    }

    #[tokio::test]
    async fn leave_scope_without_feed_is_noop() {
        let hub = NotificationHub::simulated();
        hub.leave_scope("d1");

        hub.activate();
        hub.leave_scope("d1");
        assert_eq!(hub.active_scopes(), 1);
    }

    #[tokio::test]
    async fn shutdown_clears_every_scope() {
        let hub = NotificationHub::simulated();
        hub.activate();
        hub.enter_scope("d1");
        hub.enter_scope("d2");
        assert_eq!(hub.active_scopes(), 3);

        hub.shutdown();
        assert_eq!(hub.active_scopes(), 0);
        assert!(!hub.has_scope("d1"));
        assert!(!hub.has_scope("d2"));
    }

    #[tokio::test]
    async fn subscription_is_independent_of_scope_lifecycle() {
        let hub = NotificationHub::simulated();
        let seen = Arc::new(Mutex::new(Vec::new()));

        hub.activate();

        let listener = {
            let seen = Arc::clone(&seen);
            Arc::new(move |n: &Notification| {
                seen.lock().unwrap().push(n.clone());
            }) as Listener
        };
        hub.subscribe(EventKind::ResourcesUpdated, listener);

        hub.enter_scope("x");
        hub.leave_scope("x");

        // The subscription outlives the scope; a direct trigger still lands.
        hub.emit(Notification::for_disaster(EventKind::ResourcesUpdated, "x"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].disaster_id.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn listeners_survive_reconnect() {
        let hub = NotificationHub::simulated();
        let log = Arc::new(Mutex::new(Vec::new()));

        hub.subscribe(EventKind::DisasterCreated, recording(&log, "kept"));

        hub.activate();
        hub.shutdown();
        assert_eq!(hub.listener_count(EventKind::DisasterCreated), 1);

        // Registration also works while disconnected.
        hub.emit(Notification::general(EventKind::DisasterCreated));
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
    }
}

//! crisiswire-watch - headless live console for the crisiswire platform.
//!
//! Activates the notification hub on startup and shuts it down on ctrl-c
//! (exactly one activate/shutdown pair per process). Listeners forward every
//! notification to a refetch task that reconciles through the REST client,
//! the same way a view would. Set `CRISISWIRE_WATCH_DISASTER` to also enter
//! one disaster's scope for the duration of the run.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crisiswire_client::ApiClient;
use crisiswire_core::{defaults, DisasterFilter, Error, EventKind, Notification, GENERAL_EVENTS};
use crisiswire_hub::{Listener, NotificationHub, SimulatedSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    let client = Arc::new(ApiClient::from_env());
    let hub = NotificationHub::new(Arc::new(SimulatedSource::from_env()));

    let watched = std::env::var("CRISISWIRE_WATCH_DISASTER")
        .ok()
        .filter(|id| !id.is_empty());

    hub.activate();

    // Listeners must not block the fan-out, so they only forward the
    // notification; the refetch task does the HTTP work.
    let (refetch_tx, mut refetch_rx) = mpsc::unbounded_channel::<Notification>();
    let forward: Listener = {
        let tx = refetch_tx.clone();
        Arc::new(move |n: &Notification| {
            let _ = tx.send(n.clone());
        })
    };

    let mut kinds: Vec<EventKind> = GENERAL_EVENTS.to_vec();
    if let Some(id) = &watched {
        hub.enter_scope(id.clone());
        kinds.push(EventKind::ResourcesUpdated);
        info!(disaster_id = %id, "Watching disaster scope");
    }
    for kind in &kinds {
        hub.subscribe(*kind, forward.clone());
    }

    let refetcher = {
        let client = Arc::clone(&client);
        let watched = watched.clone();
        tokio::spawn(async move {
            while let Some(notification) = refetch_rx.recv().await {
                handle_notification(&client, watched.as_deref(), &notification).await;
            }
        })
    };

    match client.health().await {
        Ok(health) => info!(status = %health.status, "Platform reachable"),
        Err(e) => warn!(error = %e, "Platform health probe failed"),
    }

    info!("crisiswire-watch running; press ctrl-c to stop");
    tokio::signal::ctrl_c().await?;

    // Teardown mirrors a view unmount: leave the scope, unsubscribe the same
    // listener references, then disconnect.
    if let Some(id) = &watched {
        hub.leave_scope(id.clone());
    }
    for kind in &kinds {
        hub.unsubscribe(*kind, &forward);
    }
    hub.shutdown();

    drop(refetch_tx);
    drop(forward);
    let _ = refetcher.await;

    info!("crisiswire-watch stopped");
    Ok(())
}

/// Reconcile after a notification by refetching the affected data.
///
/// Failures are logged and swallowed: notifications are advisory, and a
/// failed refetch must not take the console down.
async fn handle_notification(client: &ApiClient, watched: Option<&str>, n: &Notification) {
    info!(
        kind = %n.kind,
        event_id = %n.event_id,
        disaster_id = n.disaster_id.as_deref().unwrap_or("-"),
        "Notification received"
    );

    let outcome: Result<(), Error> = match n.kind {
        EventKind::DisasterCreated | EventKind::DisasterUpdated => {
            let filter = DisasterFilter::default().with_limit(defaults::REFETCH_PAGE_LIMIT);
            client.list_disasters(&filter).await.map(|disasters| {
                info!(result_count = disasters.len(), "Disaster list refreshed");
            })
        }
        EventKind::SocialMediaUpdated => match n.disaster_id.as_deref().or(watched) {
            Some(id) => client.social_media(id, &[]).await.map(|feed| {
                info!(
                    disaster_id = id,
                    result_count = feed.reports.len(),
                    "Social media feed refreshed"
                );
            }),
            // A platform-wide social media ping with no disaster to scope
            // it to; nothing to refetch.
            None => Ok(()),
        },
        EventKind::ResourcesUpdated => match n.disaster_id.as_deref().or(watched) {
            Some(id) => client.resources(id).await.map(|resources| {
                info!(
                    disaster_id = id,
                    result_count = resources.len(),
                    "Resource list refreshed"
                );
            }),
            None => Ok(()),
        },
    };

    if let Err(e) = outcome {
        warn!(kind = %n.kind, error = %e, "Refetch after notification failed");
    }
}

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT - "json" or "text" (default: "text")
///   RUST_LOG   - standard env filter (default: info for the crisiswire crates)
fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "crisiswire_watch=info,crisiswire_hub=info,crisiswire_client=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

//! Event source strategy: where feed events come from.
//!
//! The hub does not care whether events arrive over a genuine push transport
//! or are synthesized locally; anything implementing [`EventSource`] can
//! drive a feed. The implementation shipped here is [`SimulatedSource`]: the
//! platform backend is stateless and has no push channel, so each feed polls
//! on a fixed interval and probabilistically synthesizes events. Swapping in
//! a real transport later replaces this type only; consumers keep the same
//! subscribe/notify contract.

use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crisiswire_core::{
    defaults, EventKind, Notification, Scope, DISASTER_EVENTS, GENERAL_EVENTS,
};

use crate::hub::EventSink;

/// Produces the event stream for one feed scope.
#[async_trait]
pub trait EventSource: Send + Sync + 'static {
    /// Drive the feed for `scope`, delivering events into `sink`.
    ///
    /// Runs until the surrounding feed task is aborted, or until `sink`
    /// reports the hub gone. Implementations need no cancellation path of
    /// their own.
    async fn run(&self, scope: Scope, sink: EventSink);
}

// ============================================================================
// Simulation configuration
// ============================================================================

/// Tuning for the simulated event source.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Tick period of the general feed.
    pub general_interval: Duration,
    /// Tick period of a disaster-scope feed.
    pub disaster_interval: Duration,
    /// Per-tick synthesis probability on the general feed.
    pub general_probability: f64,
    /// Per-tick synthesis probability on a disaster-scope feed.
    pub disaster_probability: f64,
    /// Fixed RNG seed for deterministic replay; entropy-seeded when `None`.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            general_interval: Duration::from_secs(defaults::GENERAL_FEED_INTERVAL_SECS),
            disaster_interval: Duration::from_secs(defaults::DISASTER_FEED_INTERVAL_SECS),
            general_probability: defaults::GENERAL_FEED_PROBABILITY,
            disaster_probability: defaults::DISASTER_FEED_PROBABILITY,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CRISISWIRE_SIM_GENERAL_INTERVAL_SECS` | `30` | General feed tick period |
    /// | `CRISISWIRE_SIM_DISASTER_INTERVAL_SECS` | `15` | Disaster feed tick period |
    /// | `CRISISWIRE_SIM_GENERAL_PROBABILITY` | `0.10` | General per-tick probability |
    /// | `CRISISWIRE_SIM_DISASTER_PROBABILITY` | `0.05` | Disaster per-tick probability |
    /// | `CRISISWIRE_SIM_SEED` | unset | Fixed RNG seed |
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("CRISISWIRE_SIM_GENERAL_INTERVAL_SECS") {
            config.general_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = env_parse::<u64>("CRISISWIRE_SIM_DISASTER_INTERVAL_SECS") {
            config.disaster_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(p) = env_parse::<f64>("CRISISWIRE_SIM_GENERAL_PROBABILITY") {
            config.general_probability = p.clamp(0.0, 1.0);
        }
        if let Some(p) = env_parse::<f64>("CRISISWIRE_SIM_DISASTER_PROBABILITY") {
            config.disaster_probability = p.clamp(0.0, 1.0);
        }
        config.seed = env_parse::<u64>("CRISISWIRE_SIM_SEED");

        config
    }

    /// Set both synthesis probabilities.
    pub fn with_probabilities(mut self, general: f64, disaster: f64) -> Self {
        self.general_probability = general.clamp(0.0, 1.0);
        self.disaster_probability = disaster.clamp(0.0, 1.0);
        self
    }

    /// Set both tick periods.
    pub fn with_intervals(mut self, general: Duration, disaster: Duration) -> Self {
        self.general_interval = general;
        self.disaster_interval = disaster;
        self
    }

    /// Fix the RNG seed for deterministic replay.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(var = name, value = %raw, "Ignoring unparseable simulation override");
                None
            }
        },
        Err(_) => None,
    }
}

// ============================================================================
// Simulated source
// ============================================================================

/// Probabilistic stand-in for server push.
///
/// On every tick the feed draws one event kind uniformly from its scope's
/// catalog and synthesizes it with the configured probability. Deliberately
/// lossy and best-effort: the interval and probability are tuning constants,
/// not protocol guarantees.
pub struct SimulatedSource {
    config: SimulationConfig,
}

impl SimulatedSource {
    /// Create a simulator with explicit configuration.
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Create a simulator configured from environment variables.
    pub fn from_env() -> Self {
        Self::new(SimulationConfig::from_env())
    }

    /// The active configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[async_trait]
impl EventSource for SimulatedSource {
    async fn run(&self, scope: Scope, sink: EventSink) {
        let (period, probability, catalog): (Duration, f64, &[EventKind]) = match &scope {
            Scope::General => (
                self.config.general_interval,
                self.config.general_probability,
                &GENERAL_EVENTS,
            ),
            Scope::Disaster(_) => (
                self.config.disaster_interval,
                self.config.disaster_probability,
                &DISASTER_EVENTS,
            ),
        };

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut ticker = tokio::time::interval(period);
        // interval's first tick completes immediately; consume it so the
        // first poll lands one full period after the feed opens.
        ticker.tick().await;
        debug!(
            scope = %scope,
            period_secs = period.as_secs(),
            probability,
            "Feed opened"
        );

        loop {
            ticker.tick().await;
            let kind = catalog[rng.gen_range(0..catalog.len())];
            if rng.gen::<f64>() < probability {
                let notification = Notification::for_scope(kind, &scope);
                debug!(
                    scope = %scope,
                    kind = %kind,
                    event_id = %notification.event_id,
                    "Synthesized feed event"
                );
                if !sink.deliver(notification) {
                    // Hub torn down; nothing left to deliver into.
                    return;
                }
            } else {
                trace!(scope = %scope, kind = %kind, "Tick passed without event");
            }
        }
    }
}

//! Invocation metrics
//!
//! The bridge reports one [`Observation`] per terminal call to a
//! [`MetricsSink`]. Sinks are shared between threads, so every update is
//! atomic or guarded.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

/// One terminal invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<'a> {
    pub agent: &'a str,
    pub action: &'a str,
    /// "success", "error" or "skipped"
    pub status: &'a str,
    /// Attempts made (0 when skipped)
    pub attempts: u32,
    /// Wall-clock time across all attempts
    pub latency: Duration,
}

/// Receives invocation observations
pub trait MetricsSink: Send + Sync {
    fn record(&self, observation: &Observation<'_>);
}

/// Counters for one `(agent, action)` pair
#[derive(Debug, Default)]
struct Counters {
    success: AtomicU64,
    error: AtomicU64,
    skipped: AtomicU64,
    attempts: AtomicU64,
    latency_micros: AtomicU64,
}

/// Point-in-time copy of the counters for one `(agent, action)` pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub success: u64,
    pub error: u64,
    pub skipped: u64,
    /// Total attempts across all calls
    pub attempts: u64,
    /// Total latency across all calls
    pub latency: Duration,
}

impl MetricsSnapshot {
    /// Terminal calls recorded
    pub fn calls(&self) -> u64 {
        self.success + self.error + self.skipped
    }
}

/// In-process counters keyed by agent and action
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: RwLock<BTreeMap<(String, String), Arc<Counters>>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, agent: &str, action: &str) -> Option<Arc<Counters>> {
        let key = (agent.to_string(), action.to_string());
        if let Ok(map) = self.counters.read() {
            if let Some(counters) = map.get(&key) {
                return Some(Arc::clone(counters));
            }
        }
        let mut map = self.counters.write().ok()?;
        Some(Arc::clone(map.entry(key).or_default()))
    }

    /// Counters for one agent and action
    pub fn snapshot(&self, agent: &str, action: &str) -> MetricsSnapshot {
        let key = (agent.to_string(), action.to_string());
        self.counters
            .read()
            .ok()
            .and_then(|map| map.get(&key).map(|c| snapshot_of(c)))
            .unwrap_or_default()
    }

    /// Counters summed over every action of `agent`
    pub fn agent_totals(&self, agent: &str) -> MetricsSnapshot {
        let Ok(map) = self.counters.read() else {
            return MetricsSnapshot::default();
        };
        map.iter()
            .filter(|((name, _), _)| name == agent)
            .map(|(_, counters)| snapshot_of(counters))
            .fold(MetricsSnapshot::default(), |acc, s| MetricsSnapshot {
                success: acc.success + s.success,
                error: acc.error + s.error,
                skipped: acc.skipped + s.skipped,
                attempts: acc.attempts + s.attempts,
                latency: acc.latency + s.latency,
            })
    }

    /// Every recorded `(agent, action)` pair with its counters
    pub fn snapshots(&self) -> Vec<((String, String), MetricsSnapshot)> {
        self.counters
            .read()
            .map(|map| {
                map.iter()
                    .map(|(key, counters)| (key.clone(), snapshot_of(counters)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn snapshot_of(counters: &Counters) -> MetricsSnapshot {
    MetricsSnapshot {
        success: counters.success.load(Ordering::Relaxed),
        error: counters.error.load(Ordering::Relaxed),
        skipped: counters.skipped.load(Ordering::Relaxed),
        attempts: counters.attempts.load(Ordering::Relaxed),
        latency: Duration::from_micros(counters.latency_micros.load(Ordering::Relaxed)),
    }
}

impl MetricsSink for InMemoryMetrics {
    fn record(&self, observation: &Observation<'_>) {
        let Some(counters) = self.counters(observation.agent, observation.action) else {
            return;
        };
        let status = match observation.status {
            "success" => &counters.success,
            "skipped" => &counters.skipped,
            _ => &counters.error,
        };
        status.fetch_add(1, Ordering::Relaxed);
        counters
            .attempts
            .fetch_add(u64::from(observation.attempts), Ordering::Relaxed);
        let micros = u64::try_from(observation.latency.as_micros()).unwrap_or(u64::MAX);
        counters.latency_micros.fetch_add(micros, Ordering::Relaxed);
    }
}

/// Prometheus-backed sink with its own registry
///
/// Exposes `superclaude_agent_invocations_total{agent,action,status}`,
/// `superclaude_agent_attempts_total{agent,action}` and
/// `superclaude_agent_latency_seconds{agent,action}`.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    invocations: CounterVec,
    attempts: CounterVec,
    latency: HistogramVec,
}

impl PrometheusMetrics {
    /// Create the metrics and register them with a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let invocations = CounterVec::new(
            Opts::new(
                "superclaude_agent_invocations_total",
                "Terminal agent invocations by outcome",
            ),
            &["agent", "action", "status"],
        )?;
        let attempts = CounterVec::new(
            Opts::new(
                "superclaude_agent_attempts_total",
                "Agent process attempts, including retries",
            ),
            &["agent", "action"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new(
                "superclaude_agent_latency_seconds",
                "Wall-clock time per invocation across all attempts",
            )
            .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["agent", "action"],
        )?;

        registry.register(Box::new(invocations.clone()))?;
        registry.register(Box::new(attempts.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            invocations,
            attempts,
            latency,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl MetricsSink for PrometheusMetrics {
    fn record(&self, observation: &Observation<'_>) {
        self.invocations
            .with_label_values(&[observation.agent, observation.action, observation.status])
            .inc();
        self.attempts
            .with_label_values(&[observation.agent, observation.action])
            .inc_by(f64::from(observation.attempts));
        self.latency
            .with_label_values(&[observation.agent, observation.action])
            .observe(observation.latency.as_secs_f64());
    }
}

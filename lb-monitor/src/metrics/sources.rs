//! Gauge sources read during a refresh.
//!
//! Both collaborators must answer from already-sampled values: they are read
//! on the request path and must not block.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Source of the CPU and memory gauges, as percentages.
pub trait ResourceSampler: Send + Sync {
    fn current_cpu(&self) -> f64;
    fn current_memory(&self) -> f64;
}

/// Source of the node-wide connection gauges.
pub trait ConnectionWatcher: Send + Sync {
    fn current_active_conns(&self) -> i64;
    fn current_total_conns(&self) -> i64;
}

/// Resource sampler backed by `sysinfo`.
///
/// A background task refreshes the values on an interval; readers only load
/// the latest sample.
#[derive(Debug, Default)]
pub struct SystemSampler {
    cpu_bits: AtomicU64,
    memory_bits: AtomicU64,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new sample.
    pub fn store(&self, cpu: f64, memory: f64) {
        self.cpu_bits.store(cpu.to_bits(), Ordering::Relaxed);
        self.memory_bits.store(memory.to_bits(), Ordering::Relaxed);
    }

    /// Start the sampling task.
    ///
    /// The first sample is taken immediately. CPU usage needs two refreshes
    /// to be meaningful, so the first value is usually 0.
    pub fn start(
        self: &Arc<Self>,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        let sampler = Arc::clone(self);

        tokio::spawn(async move {
            let mut system = System::new_with_specifics(
                RefreshKind::nothing()
                    .with_cpu(CpuRefreshKind::everything())
                    .with_memory(MemoryRefreshKind::everything()),
            );
            let mut ticker = tokio::time::interval(interval);

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        debug!("Resource sampler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let (cpu, memory) = sample(&mut system);
                        trace!(cpu, memory, "Sampled resource usage");
                        sampler.store(cpu, memory);
                    }
                }
            }
        })
    }
}

impl ResourceSampler for SystemSampler {
    fn current_cpu(&self) -> f64 {
        f64::from_bits(self.cpu_bits.load(Ordering::Relaxed))
    }

    fn current_memory(&self) -> f64 {
        f64::from_bits(self.memory_bits.load(Ordering::Relaxed))
    }
}

/// Refresh `system` and return (cpu %, memory %).
fn sample(system: &mut System) -> (f64, f64) {
    system.refresh_cpu_all();
    system.refresh_memory();

    let cpu = f64::from(system.global_cpu_usage());
    let total_mem = system.total_memory();
    let used_mem = system.used_memory();
    let memory = if total_mem > 0 {
        used_mem as f64 / total_mem as f64 * 100.0
    } else {
        0.0
    };
    (cpu, memory)
}

/// Atomic client connection counter.
///
/// The host server calls [`connection_opened`](Self::connection_opened) and
/// [`connection_closed`](Self::connection_closed) around each accepted
/// connection.
#[derive(Debug, Default)]
pub struct ConnectionCounter {
    active: AtomicI64,
    total: AtomicI64,
}

impl ConnectionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new client connection.
    #[inline]
    pub fn connection_opened(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a client disconnection. The active count stops at zero.
    #[inline]
    pub fn connection_closed(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                (n > 0).then(|| n - 1)
            });
    }
}

impl ConnectionWatcher for ConnectionCounter {
    fn current_active_conns(&self) -> i64 {
        self.active.load(Ordering::Relaxed)
    }

    fn current_total_conns(&self) -> i64 {
        self.total.load(Ordering::Relaxed)
    }
}

//! The node metrics registry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::aggregate::{ElbStats, aggregate_upstreams};
use super::node::{CounterKind, NodeInfo, now_nanos};
use super::sources::{ConnectionWatcher, ResourceSampler};

/// Metrics registry for the node.
///
/// Owns the root [`NodeInfo`] behind a single reader/writer lock. Upstream
/// records are only reachable through the root, so they share its lock.
/// Build one at startup and share it as `Arc<NodeMetrics>`.
#[derive(Debug)]
pub struct NodeMetrics {
    node: RwLock<NodeInfo>,
}

impl NodeMetrics {
    /// Create a registry whose root record is stamped with the current time.
    pub fn new() -> Self {
        Self {
            node: RwLock::new(NodeInfo::new()),
        }
    }

    // ========== Mutators ==========

    /// Record a completed request and its byte counts.
    pub fn record_request(&self, received_bytes: u64, sent_bytes: u64) {
        let now = now_nanos();
        let mut node = self.node.write();
        node.received_bytes = node.received_bytes.saturating_add(received_bytes);
        node.sent_bytes = node.sent_bytes.saturating_add(sent_bytes);
        node.request_count = node.request_count.saturating_add(1);
        node.touch_at(now);
    }

    /// Overwrite the CPU and memory gauges. Does not touch `updated_at`.
    pub fn update_resource_gauges(&self, cpu: f64, memory: f64) {
        let mut node = self.node.write();
        node.cpu = cpu;
        node.memory = memory;
    }

    /// Overwrite the node-wide connection gauges.
    pub fn update_connection_gauges(&self, active: i64, total: i64) {
        let mut node = self.node.write();
        node.active_conns = active;
        node.total_conns = total;
    }

    /// Mark the root as refreshed now.
    pub fn touch(&self) {
        Self::touch_node(&mut self.node.write());
    }

    fn touch_node(node: &mut NodeInfo) {
        node.touch_at(now_nanos());
    }

    /// Pull current gauges from the collaborators and mark the root refreshed.
    ///
    /// The collaborators are read before the lock is taken.
    pub fn refresh(&self, resources: &dyn ResourceSampler, connections: &dyn ConnectionWatcher) {
        let cpu = resources.current_cpu();
        let memory = resources.current_memory();
        let active = connections.current_active_conns();
        let total = connections.current_total_conns();

        let mut node = self.node.write();
        node.cpu = cpu;
        node.memory = memory;
        node.active_conns = active;
        node.total_conns = total;
        Self::touch_node(&mut node);
    }

    /// Zero the connection counts of the root and of every upstream.
    ///
    /// Request and byte counters and both timestamps are kept. Upstream
    /// entries stay in place.
    pub fn clear_conns(&self) {
        let mut node = self.node.write();
        node.clear_conns();
        debug!(upstreams = node.elbs.len(), "Cleared connection counts");
    }

    /// Apply a connection count change for an upstream remote address.
    ///
    /// The upstream entry is created on first use. Creation and the update
    /// happen under the same write lock.
    pub fn record_upstream_connection_delta(
        &self,
        remote_addr: &str,
        delta: i64,
        kind: CounterKind,
    ) {
        let now = now_nanos();
        let mut node = self.node.write();

        let upstream = node
            .elbs
            .entry(remote_addr.to_string())
            .or_insert_with(|| {
                debug!(remote_addr, "Tracking new upstream");
                NodeInfo::at(now)
            });
        upstream.add_conns(kind, delta);
        upstream.touch_at(now);
    }

    // ========== Readers ==========

    /// Copy the root record, upstreams included.
    ///
    /// The copy is taken under the read lock; serialize it after this returns.
    pub fn snapshot(&self) -> NodeInfo {
        self.node.read().clone()
    }

    /// Copy the upstream map.
    pub fn upstream_snapshot(&self) -> BTreeMap<String, NodeInfo> {
        self.node.read().elbs.clone()
    }

    /// Aggregated per-upstream view for the `/elb-stats` endpoint.
    pub fn elb_stats(&self) -> ElbStats {
        let node = self.node.read();
        ElbStats {
            elbs: aggregate_upstreams(&node.elbs),
        }
    }

    pub fn created_at(&self) -> i64 {
        self.node.read().created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.node.read().updated_at
    }

    pub fn request_count(&self) -> u64 {
        self.node.read().request_count
    }

    pub fn upstream_count(&self) -> usize {
        self.node.read().elbs.len()
    }

    // ========== Background tasks ==========

    /// Start a task that calls [`clear_conns`](Self::clear_conns) every `period`.
    pub fn start_conn_reset(
        self: &Arc<Self>,
        period: Duration,
        cancel_token: CancellationToken,
    ) -> JoinHandle<()> {
        let metrics = Arc::clone(self);

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        debug!("Connection reset task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        metrics.clear_conns();
                        info!(period_secs = period.as_secs(), "Periodic connection count reset");
                    }
                }
            }
        })
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

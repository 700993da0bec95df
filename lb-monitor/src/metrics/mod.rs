//! Metrics store and aggregation.
//!
//! The node keeps one root [`NodeInfo`] record guarded by [`NodeMetrics`].
//! Request and byte counters live on the root; connection counts are kept
//! both on the root (refreshed from a [`ConnectionWatcher`]) and per upstream
//! remote address.
//!
//! # Example
//!
//! ```
//! use lb_monitor::metrics::{CounterKind, NodeMetrics};
//!
//! let metrics = NodeMetrics::new();
//! metrics.record_request(100, 200);
//! metrics.record_upstream_connection_delta("10.0.0.1:443", 1, CounterKind::Total);
//!
//! let stats = metrics.elb_stats();
//! assert_eq!(stats.elbs["10.0.0.1:443"].total_conns, 1);
//! ```

mod aggregate;
mod node;
mod sources;
mod store;

pub use aggregate::{ElbStats, aggregate_shards, aggregate_upstreams, merge_upstreams};
pub use node::{CounterKind, NodeInfo, now_nanos};
pub use sources::{ConnectionCounter, ConnectionWatcher, ResourceSampler, SystemSampler};
pub use store::NodeMetrics;

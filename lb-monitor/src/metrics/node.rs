//! The metrics record shared by the root node and its upstreams.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current wall-clock time in nanoseconds since the Unix epoch.
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Which connection counter a delta applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Currently open connections.
    Active,
    /// Connections seen since the last reset.
    Total,
}

/// Metrics for the node itself, or for one upstream remote address.
///
/// Request and byte counters and the resource gauges are only populated on
/// the root record. Upstream records carry connection counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Creation time, nanoseconds since the epoch.
    pub created_at: i64,
    /// Last update time, nanoseconds since the epoch. Never before `created_at`.
    pub updated_at: i64,

    pub request_count: u64,
    pub sent_bytes: u64,
    pub received_bytes: u64,

    /// CPU usage percentage, last sampled value.
    pub cpu: f64,
    /// Memory usage percentage, last sampled value.
    pub memory: f64,
    pub active_conns: i64,
    pub total_conns: i64,

    /// Upstream records keyed by remote address. Root only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub elbs: BTreeMap<String, NodeInfo>,
}

impl NodeInfo {
    /// Create a record stamped with the current time.
    pub fn new() -> Self {
        Self::at(now_nanos())
    }

    /// Create a record with both timestamps set to `timestamp` and zero counters.
    pub fn at(timestamp: i64) -> Self {
        Self {
            created_at: timestamp,
            updated_at: timestamp,
            ..Self::default()
        }
    }

    /// Advance `updated_at`, never moving it backwards.
    #[inline]
    pub fn touch_at(&mut self, timestamp: i64) {
        self.updated_at = self.updated_at.max(timestamp);
    }

    /// Add `delta` to the selected connection counter.
    pub fn add_conns(&mut self, kind: CounterKind, delta: i64) {
        let counter = match kind {
            CounterKind::Active => &mut self.active_conns,
            CounterKind::Total => &mut self.total_conns,
        };
        *counter = counter.saturating_add(delta);
    }

    /// Zero the connection counts of this record and of every upstream.
    pub fn clear_conns(&mut self) {
        self.active_conns = 0;
        self.total_conns = 0;
        for upstream in self.elbs.values_mut() {
            upstream.active_conns = 0;
            upstream.total_conns = 0;
        }
    }

    /// Fold `other` into this record.
    ///
    /// Keeps the earliest `created_at` and the latest `updated_at`, and sums
    /// the request, byte and connection counters. Gauges are left alone.
    pub fn merge(&mut self, other: &NodeInfo) {
        self.created_at = self.created_at.min(other.created_at);
        self.updated_at = self.updated_at.max(other.updated_at);
        self.request_count = self.request_count.saturating_add(other.request_count);
        self.sent_bytes = self.sent_bytes.saturating_add(other.sent_bytes);
        self.received_bytes = self.received_bytes.saturating_add(other.received_bytes);
        self.active_conns = self.active_conns.saturating_add(other.active_conns);
        self.total_conns = self.total_conns.saturating_add(other.total_conns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_timestamps() {
        let node = NodeInfo::new();
        assert_eq!(node.created_at, node.updated_at);
        assert!(node.created_at > 0);
        assert!(node.elbs.is_empty());
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut node = NodeInfo::at(100);
        node.touch_at(50);
        assert_eq!(node.updated_at, 100);
        node.touch_at(150);
        assert_eq!(node.updated_at, 150);
        assert_eq!(node.created_at, 100);
    }

    #[test]
    fn test_add_conns() {
        let mut node = NodeInfo::at(0);
        node.add_conns(CounterKind::Active, 2);
        node.add_conns(CounterKind::Active, -1);
        node.add_conns(CounterKind::Total, 3);
        assert_eq!(node.active_conns, 1);
        assert_eq!(node.total_conns, 3);
    }

    #[test]
    fn test_merge_connection_records() {
        let mut merged = NodeInfo {
            total_conns: 2,
            ..NodeInfo::at(50)
        };
        let other = NodeInfo {
            total_conns: 3,
            ..NodeInfo::at(100)
        };

        merged.merge(&other);

        assert_eq!(merged.created_at, 50);
        assert_eq!(merged.updated_at, 100);
        assert_eq!(merged.total_conns, 5);
    }

    #[test]
    fn test_wire_field_names() {
        let node = NodeInfo::at(1);
        let json = serde_json::to_value(&node).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "created_at",
                "updated_at",
                "request_count",
                "sent_bytes",
                "received_bytes",
                "cpu",
                "memory",
                "active_conns",
                "total_conns",
            ]
        );
    }

    #[test]
    fn test_upstreams_serialized_when_present() {
        let mut node = NodeInfo::at(1);
        node.elbs.insert("10.0.0.1:443".to_string(), NodeInfo::at(2));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["elbs"]["10.0.0.1:443"]["created_at"], 2);
    }
}

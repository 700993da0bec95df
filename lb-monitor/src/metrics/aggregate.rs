//! Folding upstream records into a per-address view.
//!
//! Entries sharing a remote address are combined with [`NodeInfo::merge`].
//! The fold is associative and commutative per field, so the same result
//! comes out however the entries are grouped or ordered across sources.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::NodeInfo;

/// Body of the `/elb-stats` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElbStats {
    pub elbs: BTreeMap<String, NodeInfo>,
}

/// Merge `entries` into `acc`, combining entries with the same address.
///
/// An address missing from `acc` starts from zero counters and the first
/// entry's own timestamps.
pub fn merge_upstreams<'a, I>(acc: &mut BTreeMap<String, NodeInfo>, entries: I)
where
    I: IntoIterator<Item = (&'a String, &'a NodeInfo)>,
{
    for (addr, entry) in entries {
        acc.entry(addr.clone())
            .or_insert_with(|| NodeInfo {
                created_at: entry.created_at,
                updated_at: entry.updated_at,
                ..NodeInfo::default()
            })
            .merge(entry);
    }
}

/// Build a fresh per-address view of `entries`.
pub fn aggregate_upstreams<'a, I>(entries: I) -> BTreeMap<String, NodeInfo>
where
    I: IntoIterator<Item = (&'a String, &'a NodeInfo)>,
{
    let mut acc = BTreeMap::new();
    merge_upstreams(&mut acc, entries);
    acc
}

/// Combine several upstream maps, such as one per observation shard.
pub fn aggregate_shards<'a, I>(shards: I) -> BTreeMap<String, NodeInfo>
where
    I: IntoIterator<Item = &'a BTreeMap<String, NodeInfo>>,
{
    let mut acc = BTreeMap::new();
    for shard in shards {
        merge_upstreams(&mut acc, shard);
    }
    acc
}

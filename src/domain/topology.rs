// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cluster Topology Selection
//!
//! A cluster is declared with exactly one member group shape:
//!
//! | host flavor           | group shape          | carries                                  |
//! |-----------------------|----------------------|------------------------------------------|
//! | set, not multitenant  | `FixedFlavor`        | flavor, disk, members                    |
//! | `"multitenant"`       | `MultitenantFlavor`  | flavor, disk, memory, cpu, members       |
//! | unset                 | `ClassicSized`       | memory, disk, cpu, members               |
//!
//! Auto-scaling is orthogonal to the group shape and is passed through as is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host flavor value selecting the shared-host group shape
pub const MULTITENANT_FLAVOR: &str = "multitenant";

/// Per-member sizing supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberSizing {
    pub member_count: u32,
    pub memory_mb: u64,
    pub disk_mb: u64,
    pub cpu_count: u32,
}

impl Default for MemberSizing {
    fn default() -> Self {
        Self {
            member_count: 3,
            memory_mb: 4096,
            disk_mb: 5120,
            cpu_count: 0,
        }
    }
}

/// The single member group declared for a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ClusterTopology {
    /// Dedicated host flavor; memory and cpu come from the flavor
    FixedFlavor {
        flavor_id: String,
        disk_mb: u64,
        member_count: u32,
    },

    /// Shared hosts sized explicitly
    MultitenantFlavor {
        flavor_id: String,
        disk_mb: u64,
        memory_mb: u64,
        cpu_count: u32,
        member_count: u32,
    },

    /// Sized group without a host flavor
    ClassicSized {
        memory_mb: u64,
        disk_mb: u64,
        cpu_count: u32,
        member_count: u32,
    },
}

impl ClusterTopology {
    pub fn member_count(&self) -> u32 {
        match self {
            Self::FixedFlavor { member_count, .. }
            | Self::MultitenantFlavor { member_count, .. }
            | Self::ClassicSized { member_count, .. } => *member_count,
        }
    }

    pub fn flavor_id(&self) -> Option<&str> {
        match self {
            Self::FixedFlavor { flavor_id, .. } | Self::MultitenantFlavor { flavor_id, .. } => {
                Some(flavor_id)
            }
            Self::ClassicSized { .. } => None,
        }
    }
}

impl fmt::Display for ClusterTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedFlavor { flavor_id, member_count, .. } => {
                write!(f, "fixed flavor {} x{}", flavor_id, member_count)
            }
            Self::MultitenantFlavor { member_count, .. } => {
                write!(f, "multitenant x{}", member_count)
            }
            Self::ClassicSized { member_count, .. } => write!(f, "classic sized x{}", member_count),
        }
    }
}

/// Select the member group shape
///
/// Total over its inputs: every combination yields exactly one variant.
pub fn select_topology(host_flavor: Option<&str>, sizing: &MemberSizing) -> ClusterTopology {
    match host_flavor {
        Some(MULTITENANT_FLAVOR) => ClusterTopology::MultitenantFlavor {
            flavor_id: MULTITENANT_FLAVOR.to_string(),
            disk_mb: sizing.disk_mb,
            memory_mb: sizing.memory_mb,
            cpu_count: sizing.cpu_count,
            member_count: sizing.member_count,
        },
        Some(flavor) => ClusterTopology::FixedFlavor {
            flavor_id: flavor.to_string(),
            disk_mb: sizing.disk_mb,
            member_count: sizing.member_count,
        },
        None => ClusterTopology::ClassicSized {
            memory_mb: sizing.memory_mb,
            disk_mb: sizing.disk_mb,
            cpu_count: sizing.cpu_count,
            member_count: sizing.member_count,
        },
    }
}

/// Disk auto-scaling sub-policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskAutoScaling {
    pub capacity_enabled: bool,
    pub free_space_less_than_percent: u32,
    pub io_above_percent: u32,
    pub io_enabled: bool,
    pub io_over_period: String,
    pub rate_increase_percent: u32,
    pub rate_limit_mb_per_member: u64,
    pub rate_period_seconds: u32,
    pub rate_units: String,
}

/// Memory auto-scaling sub-policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAutoScaling {
    pub io_above_percent: u32,
    pub io_enabled: bool,
    pub io_over_period: String,
    pub rate_increase_percent: u32,
    pub rate_limit_mb_per_member: u64,
    pub rate_period_seconds: u32,
    pub rate_units: String,
}

/// Auto-scaling policy; declared alongside any group shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoScalingPolicy {
    pub disk: DiskAutoScaling,
    pub memory: MemoryAutoScaling,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sizing() -> MemberSizing {
        MemberSizing {
            member_count: 3,
            memory_mb: 8192,
            disk_mb: 10240,
            cpu_count: 4,
        }
    }

    #[test]
    fn test_fixed_flavor_drops_memory_and_cpu() {
        assert_eq!(
            select_topology(Some("b3c.4x16.encrypted"), &sizing()),
            ClusterTopology::FixedFlavor {
                flavor_id: "b3c.4x16.encrypted".to_string(),
                disk_mb: 10240,
                member_count: 3,
            }
        );
    }

    #[test]
    fn test_multitenant_keeps_full_sizing() {
        assert_eq!(
            select_topology(Some("multitenant"), &sizing()),
            ClusterTopology::MultitenantFlavor {
                flavor_id: "multitenant".to_string(),
                disk_mb: 10240,
                memory_mb: 8192,
                cpu_count: 4,
                member_count: 3,
            }
        );
    }

    #[test]
    fn test_no_flavor_is_classic() {
        let topology = select_topology(None, &sizing());
        assert_eq!(topology.flavor_id(), None);
        assert_eq!(topology.member_count(), 3);
        assert!(matches!(topology, ClusterTopology::ClassicSized { memory_mb: 8192, .. }));
    }

    #[test]
    fn test_flavor_match_is_exact() {
        // Only the exact lowercase value selects the shared-host shape
        assert!(matches!(
            select_topology(Some("Multitenant"), &sizing()),
            ClusterTopology::FixedFlavor { .. }
        ));
    }

    #[test]
    fn test_serialized_shape_tag() {
        let value = serde_json::to_value(select_topology(None, &sizing())).unwrap();
        assert_eq!(value["shape"], "classic_sized");
        assert_eq!(value["disk_mb"], 10240);
    }
}

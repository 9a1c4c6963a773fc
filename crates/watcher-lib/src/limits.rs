//! Always-free quota table for Oracle Cloud Infrastructure
//!
//! The values are fixed by the provider and only change when the free tier
//! offering itself changes, so they live in a constant rather than config.

use serde::{Deserialize, Serialize};

/// Reserved public IPv4 addresses included in the free tier
pub const PUBLIC_IP_LIMIT: f64 = 2.0;

/// Bytes per GB as reported by object storage
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Free tier quota table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTierLimits {
    pub compute: ComputeLimits,
    pub block_storage: BlockStorageLimits,
    pub object_storage: ObjectStorageLimits,
    pub bandwidth: BandwidthLimits,
    pub database: DatabaseLimits,
    pub load_balancer: LoadBalancerLimits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeLimits {
    pub arm: ShapeLimits,
    pub amd: ShapeLimits,
}

/// Per-architecture compute allowance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeLimits {
    pub ocpus: f64,
    #[serde(rename = "memoryGB")]
    pub memory_gb: f64,
    pub max_instances: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStorageLimits {
    #[serde(rename = "totalGB")]
    pub total_gb: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStorageLimits {
    #[serde(rename = "totalGB")]
    pub total_gb: u32,
    pub requests_per_month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthLimits {
    #[serde(rename = "egressTBPerMonth")]
    pub egress_tb_per_month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseLimits {
    #[serde(rename = "autonomousDBs")]
    pub autonomous_dbs: u32,
    #[serde(rename = "totalStorageGB")]
    pub total_storage_gb: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerLimits {
    pub instances: u32,
    pub bandwidth_mbps: u32,
}

/// The OCI always-free allowance
pub const FREE_TIER_LIMITS: FreeTierLimits = FreeTierLimits {
    compute: ComputeLimits {
        arm: ShapeLimits {
            ocpus: 4.0,
            memory_gb: 24.0,
            max_instances: 4,
        },
        amd: ShapeLimits {
            ocpus: 0.25,
            memory_gb: 1.0,
            max_instances: 2,
        },
    },
    block_storage: BlockStorageLimits { total_gb: 200 },
    object_storage: ObjectStorageLimits {
        total_gb: 10,
        requests_per_month: 50_000,
    },
    bandwidth: BandwidthLimits {
        egress_tb_per_month: 10,
    },
    database: DatabaseLimits {
        autonomous_dbs: 2,
        total_storage_gb: 20,
    },
    load_balancer: LoadBalancerLimits {
        instances: 1,
        bandwidth_mbps: 10,
    },
};

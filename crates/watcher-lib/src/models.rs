//! Usage snapshot data models

use serde::{Deserialize, Serialize};

/// A (used, limit, percentage) triple for one resource dimension
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetric {
    pub used: f64,
    pub limit: f64,
    pub percentage: i64,
}

impl UsageMetric {
    /// Build a metric, truncating the percentage toward zero
    pub fn new(used: f64, limit: f64) -> Self {
        let percentage = if limit > 0.0 {
            (used / limit * 100.0) as i64
        } else {
            0
        };

        Self {
            used,
            limit,
            percentage,
        }
    }

    /// Metric with nothing counted against `limit`
    pub fn empty(limit: f64) -> Self {
        Self::new(0.0, limit)
    }
}

/// Compute usage split by architecture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeUsage {
    pub arm: ArmUsage,
    pub amd: AmdUsage,
    pub total_instances: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmUsage {
    pub ocpus: UsageMetric,
    #[serde(rename = "memoryGB")]
    pub memory_gb: UsageMetric,
    pub instances: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmdUsage {
    pub instances: UsageMetric,
}

/// Boot and block volume usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub boot_volumes: VolumeTotals,
    pub block_volumes: VolumeTotals,
    pub total: UsageMetric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeTotals {
    pub count: u32,
    #[serde(rename = "sizeGB")]
    pub size_gb: i64,
}

/// Object storage usage across all buckets in the compartment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectStorageUsage {
    pub buckets: Vec<BucketInfo>,
    pub total: UsageMetric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-bucket size; `size_gb` is -1 when the bucket could not be inspected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,
    #[serde(rename = "sizeGB")]
    pub size_gb: f64,
}

impl BucketInfo {
    pub const UNKNOWN_SIZE: f64 = -1.0;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerUsage {
    pub count: UsageMetric,
    pub load_balancers: Vec<LoadBalancerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadBalancerInfo {
    pub name: String,
    pub shape: String,
    pub state: String,
}

/// Complete usage snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllUsage {
    pub compute: ComputeUsage,
    pub block_storage: StorageUsage,
    #[serde(rename = "publicIPs")]
    pub public_ips: UsageMetric,
    pub object_storage: ObjectStorageUsage,
    pub load_balancer: LoadBalancerUsage,
}

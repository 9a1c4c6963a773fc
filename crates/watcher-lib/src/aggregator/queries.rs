//! Per-resource usage queries
//!
//! Each query turns provider listings into one section of the snapshot.
//! Failures are recorded in the section's `error` field instead of being
//! propagated, so one failing service never hides the others.

use tracing::debug;

use crate::limits::{BYTES_PER_GB, FREE_TIER_LIMITS, PUBLIC_IP_LIMIT};
use crate::models::{
    BucketInfo, ComputeUsage, LoadBalancerInfo, LoadBalancerUsage, ObjectStorageUsage,
    StorageUsage, UsageMetric, VolumeTotals,
};
use crate::provider::{CloudProvider, Instance, LoadBalancer, ProviderResult, Volume};

/// Shapes billed against the Ampere A1 allowance
pub fn is_arm_shape(shape: &str) -> bool {
    shape.contains("A1") || shape.contains("Ampere")
}

/// Shapes billed against the AMD micro allowance
pub fn is_amd_micro_shape(shape: &str) -> bool {
    shape.contains("Micro")
}

pub fn empty_compute() -> ComputeUsage {
    let limits = &FREE_TIER_LIMITS.compute;
    let mut usage = ComputeUsage::default();
    usage.arm.ocpus = UsageMetric::empty(limits.arm.ocpus);
    usage.arm.memory_gb = UsageMetric::empty(limits.arm.memory_gb);
    usage.amd.instances = UsageMetric::empty(f64::from(limits.amd.max_instances));
    usage
}

pub fn empty_block_storage() -> StorageUsage {
    StorageUsage {
        total: UsageMetric::empty(f64::from(FREE_TIER_LIMITS.block_storage.total_gb)),
        ..Default::default()
    }
}

pub fn empty_object_storage() -> ObjectStorageUsage {
    ObjectStorageUsage {
        total: UsageMetric::empty(f64::from(FREE_TIER_LIMITS.object_storage.total_gb)),
        ..Default::default()
    }
}

pub fn empty_load_balancer() -> LoadBalancerUsage {
    LoadBalancerUsage {
        count: UsageMetric::empty(f64::from(FREE_TIER_LIMITS.load_balancer.instances)),
        ..Default::default()
    }
}

/// Reduce running instances to compute usage
pub fn summarize_instances(instances: &[Instance]) -> ComputeUsage {
    let limits = &FREE_TIER_LIMITS.compute;
    let mut arm_ocpus = 0.0;
    let mut arm_memory_gb = 0.0;
    let mut arm_count: u32 = 0;
    let mut amd_count: u32 = 0;

    for instance in instances {
        if is_arm_shape(&instance.shape) {
            if let Some(config) = &instance.shape_config {
                arm_ocpus += config.ocpus.unwrap_or_default();
                arm_memory_gb += config.memory_in_gbs.unwrap_or_default();
            }
            arm_count += 1;
        } else if is_amd_micro_shape(&instance.shape) {
            amd_count += 1;
        }
    }

    let mut usage = ComputeUsage::default();
    usage.arm.ocpus = UsageMetric::new(arm_ocpus, limits.arm.ocpus);
    usage.arm.memory_gb = UsageMetric::new(arm_memory_gb, limits.arm.memory_gb);
    usage.arm.instances = arm_count;
    usage.amd.instances = UsageMetric::new(
        f64::from(amd_count),
        f64::from(limits.amd.max_instances),
    );
    usage.total_instances = instances.len() as u32;
    usage
}

fn volume_totals(volumes: &[Volume]) -> VolumeTotals {
    VolumeTotals {
        count: volumes.len() as u32,
        size_gb: volumes.iter().filter_map(|v| v.size_in_gbs).sum(),
    }
}

fn finish_block_storage(mut usage: StorageUsage) -> StorageUsage {
    let total_gb = usage.boot_volumes.size_gb + usage.block_volumes.size_gb;
    usage.total = UsageMetric::new(
        total_gb as f64,
        f64::from(FREE_TIER_LIMITS.block_storage.total_gb),
    );
    usage
}

fn summarize_load_balancers(load_balancers: &[LoadBalancer]) -> LoadBalancerUsage {
    LoadBalancerUsage {
        count: UsageMetric::new(
            load_balancers.len() as f64,
            f64::from(FREE_TIER_LIMITS.load_balancer.instances),
        ),
        load_balancers: load_balancers
            .iter()
            .map(|lb| LoadBalancerInfo {
                name: lb.display_name.clone(),
                shape: lb.shape_name.clone(),
                state: lb.lifecycle_state.clone(),
            })
            .collect(),
        error: None,
    }
}

pub async fn compute_usage(provider: &dyn CloudProvider, compartment_id: &str) -> ComputeUsage {
    match provider.list_running_instances(compartment_id).await {
        Ok(instances) => summarize_instances(&instances),
        Err(e) => ComputeUsage {
            error: Some(e.to_string()),
            ..empty_compute()
        },
    }
}

/// Boot volumes first, then block volumes; stops at the first failure.
///
/// A failed section keeps the counts listed so far but no total, so it does
/// not take part in classification.
pub async fn block_storage_usage(
    provider: &dyn CloudProvider,
    compartment_id: &str,
) -> StorageUsage {
    let mut usage = empty_block_storage();

    match provider.list_boot_volumes(compartment_id).await {
        Ok(volumes) => usage.boot_volumes = volume_totals(&volumes),
        Err(e) => {
            usage.error = Some(e.to_string());
            return usage;
        }
    }

    match provider.list_block_volumes(compartment_id).await {
        Ok(volumes) => usage.block_volumes = volume_totals(&volumes),
        Err(e) => {
            usage.error = Some(e.to_string());
            return usage;
        }
    }

    finish_block_storage(usage)
}

pub async fn object_storage_usage(
    provider: &dyn CloudProvider,
    compartment_id: &str,
) -> ObjectStorageUsage {
    let mut usage = empty_object_storage();

    let namespace = match provider.get_namespace().await {
        Ok(namespace) => namespace,
        Err(e) => {
            usage.error = Some(e.to_string());
            return usage;
        }
    };

    let buckets = match provider.list_buckets(&namespace, compartment_id).await {
        Ok(buckets) => buckets,
        Err(e) => {
            usage.error = Some(e.to_string());
            return usage;
        }
    };

    let mut total_bytes: i64 = 0;
    for bucket in buckets {
        match provider.get_bucket(&namespace, &bucket.name).await {
            Ok(details) => {
                let bytes = details.approximate_size.unwrap_or_default();
                total_bytes += bytes;
                usage.buckets.push(BucketInfo {
                    name: bucket.name,
                    size_gb: bytes as f64 / BYTES_PER_GB,
                });
            }
            Err(e) => {
                debug!(bucket = %bucket.name, error = %e, "Bucket size unavailable");
                usage.buckets.push(BucketInfo {
                    name: bucket.name,
                    size_gb: BucketInfo::UNKNOWN_SIZE,
                });
            }
        }
    }

    usage.total = UsageMetric::new(
        total_bytes as f64 / BYTES_PER_GB,
        f64::from(FREE_TIER_LIMITS.object_storage.total_gb),
    );
    usage
}

pub async fn load_balancer_usage(
    provider: &dyn CloudProvider,
    compartment_id: &str,
) -> LoadBalancerUsage {
    match provider.list_load_balancers(compartment_id).await {
        Ok(load_balancers) => summarize_load_balancers(&load_balancers),
        Err(e) => LoadBalancerUsage {
            error: Some(e.to_string()),
            ..empty_load_balancer()
        },
    }
}

/// Public IPs have no error slot in the snapshot, so the error is returned
pub async fn public_ip_usage(
    provider: &dyn CloudProvider,
    compartment_id: &str,
) -> ProviderResult<UsageMetric> {
    let ips = provider.list_public_ips(compartment_id).await?;
    Ok(UsageMetric::new(ips.len() as f64, PUBLIC_IP_LIMIT))
}

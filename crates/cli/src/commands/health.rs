//! Health and free tier limit commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use watcher_lib::api::{HealthResponse, LimitsResponse};
use watcher_lib::FreeTierLimits;

use crate::client::ApiClient;
use crate::output::{format_amount, print_json, print_success, print_table, OutputFormat};

/// Row for the limits table
#[derive(Tabled)]
struct LimitRow {
    #[tabled(rename = "Resource")]
    resource: &'static str,
    #[tabled(rename = "Always Free")]
    limit: String,
}

fn limit_rows(limits: &FreeTierLimits) -> Vec<LimitRow> {
    let row = |resource, limit: String| LimitRow { resource, limit };
    let compute = &limits.compute;

    vec![
        row("ARM OCPUs", format_amount(compute.arm.ocpus)),
        row("ARM Memory", format!("{} GB", format_amount(compute.arm.memory_gb))),
        row("ARM Instances", compute.arm.max_instances.to_string()),
        row("AMD Micro Instances", compute.amd.max_instances.to_string()),
        row(
            "AMD Micro Shape",
            format!(
                "{} OCPU / {} GB",
                format_amount(compute.amd.ocpus),
                format_amount(compute.amd.memory_gb)
            ),
        ),
        row("Block Storage", format!("{} GB", limits.block_storage.total_gb)),
        row("Object Storage", format!("{} GB", limits.object_storage.total_gb)),
        row(
            "Object Storage Requests",
            format!("{} / month", limits.object_storage.requests_per_month),
        ),
        row(
            "Outbound Transfer",
            format!("{} TB / month", limits.bandwidth.egress_tb_per_month),
        ),
        row(
            "Autonomous Databases",
            format!(
                "{} ({} GB)",
                limits.database.autonomous_dbs, limits.database.total_storage_gb
            ),
        ),
        row(
            "Load Balancers",
            format!(
                "{} ({} Mbps)",
                limits.load_balancer.instances, limits.load_balancer.bandwidth_mbps
            ),
        ),
    ]
}

/// Check that the watcher is up
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: HealthResponse = client.get("health").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_success(&format!("Watcher is {} ({})", result.status, result.timestamp));
        }
    }

    Ok(())
}

/// Show the always-free allowance
pub async fn show_limits(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let result: LimitsResponse = client.get("limits").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Free Tier Limits".bold());
            print_table(limit_rows(&result.free_tier_limits));
        }
    }

    Ok(())
}

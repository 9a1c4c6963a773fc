//! Usage report commands

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;
use watcher_lib::api::{ReportStatus, StatusResponse, UsageResponse};
use watcher_lib::classifier::Severity;
use watcher_lib::models::{AllUsage, BucketInfo, UsageMetric};

use crate::client::ApiClient;
use crate::output::{
    color_percentage, color_status, format_amount, print_error, print_info, print_json,
    print_table, print_warning, OutputFormat,
};

/// Row for the usage table
#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Resource")]
    resource: &'static str,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Usage")]
    percentage: String,
}

impl UsageRow {
    fn new(resource: &'static str, metric: &UsageMetric, unit: &str) -> Self {
        Self {
            resource,
            used: format!("{}{}", format_amount(metric.used), unit),
            limit: format!("{}{}", format_amount(metric.limit), unit),
            percentage: color_percentage(metric.percentage),
        }
    }
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Bucket")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
}

fn usage_rows(usage: &AllUsage) -> Vec<UsageRow> {
    vec![
        UsageRow::new("ARM OCPUs", &usage.compute.arm.ocpus, ""),
        UsageRow::new("ARM Memory", &usage.compute.arm.memory_gb, " GB"),
        UsageRow::new("AMD Micro Instances", &usage.compute.amd.instances, ""),
        UsageRow::new("Block Storage", &usage.block_storage.total, " GB"),
        UsageRow::new("Object Storage", &usage.object_storage.total, " GB"),
        UsageRow::new("Public IPs", &usage.public_ips, ""),
        UsageRow::new("Load Balancers", &usage.load_balancer.count, ""),
    ]
}

fn bucket_rows(buckets: &[BucketInfo]) -> Vec<BucketRow> {
    buckets
        .iter()
        .map(|bucket| BucketRow {
            name: bucket.name.clone(),
            size: if bucket.size_gb == BucketInfo::UNKNOWN_SIZE {
                "unknown".to_string()
            } else {
                format!("{:.2} GB", bucket.size_gb)
            },
        })
        .collect()
}

/// Sections whose query failed, with the failure
fn section_errors(usage: &AllUsage) -> Vec<(&'static str, &str)> {
    [
        ("Compute", usage.compute.error.as_deref()),
        ("Block storage", usage.block_storage.error.as_deref()),
        ("Object storage", usage.object_storage.error.as_deref()),
        ("Load balancers", usage.load_balancer.error.as_deref()),
    ]
    .into_iter()
    .filter_map(|(section, error)| error.map(|e| (section, e)))
    .collect()
}

/// Whether a report should fail a `--fail-on` check
///
/// Reports without a severity (not configured, errors) always fail it.
pub fn exceeds(status: ReportStatus, threshold: Severity) -> bool {
    status
        .severity()
        .map_or(true, |severity| severity >= threshold)
}

fn print_summary(status: ReportStatus, max_usage_percentage: i64, warnings: &[String]) {
    println!("Status:      {}", color_status(status));
    println!("Max usage:   {}", color_percentage(max_usage_percentage));
    for warning in warnings {
        print_warning(warning);
    }
}

/// Show the full usage report
pub async fn show_usage(client: &ApiClient, format: OutputFormat) -> Result<ReportStatus> {
    let result: UsageResponse = client.get_report("usage").await?;

    if let OutputFormat::Json = format {
        print_json(&result)?;
        return Ok(result.status);
    }

    let Some(usage) = &result.usage else {
        println!("Status:      {}", color_status(result.status));
        if let Some(error) = &result.error {
            print_error(error);
        }
        if let Some(message) = &result.message {
            print_info(message);
        }
        return Ok(result.status);
    };

    println!("{}", "Free Tier Usage".bold());
    print_table(usage_rows(usage));

    if !usage.object_storage.buckets.is_empty() {
        println!();
        print_table(bucket_rows(&usage.object_storage.buckets));
    }

    println!();
    println!(
        "Instances:   {} running ({} ARM)",
        usage.compute.total_instances, usage.compute.arm.instances
    );
    print_summary(result.status, result.max_usage_percentage, &result.warnings);

    for (section, error) in section_errors(usage) {
        print_error(&format!("{} query failed: {}", section, error));
    }
    println!("{}", format!("Checked at {}", result.timestamp).dimmed());

    Ok(result.status)
}

/// Show the condensed status
pub async fn show_status(client: &ApiClient, format: OutputFormat) -> Result<ReportStatus> {
    let result: StatusResponse = client.get_report("status").await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_summary(result.status, result.max_usage_percentage, &result.warnings);
            if let Some(message) = &result.message {
                print_info(message);
            }
        }
    }

    Ok(result.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceeds() {
        assert!(exceeds(ReportStatus::Critical, Severity::Warning));
        assert!(exceeds(ReportStatus::Warning, Severity::Warning));
        assert!(!exceeds(ReportStatus::Attention, Severity::Warning));
        assert!(!exceeds(ReportStatus::Ok, Severity::Attention));
        assert!(exceeds(ReportStatus::Ok, Severity::Ok));
        assert!(exceeds(ReportStatus::Error, Severity::Critical));
        assert!(exceeds(ReportStatus::NotConfigured, Severity::Critical));
    }

    #[test]
    fn test_bucket_rows_mark_unknown_size() {
        let rows = bucket_rows(&[
            BucketInfo {
                name: "backups".to_string(),
                size_gb: 1.5,
            },
            BucketInfo {
                name: "locked".to_string(),
                size_gb: BucketInfo::UNKNOWN_SIZE,
            },
        ]);

        assert_eq!(rows[0].size, "1.50 GB");
        assert_eq!(rows[1].size, "unknown");
    }

    #[test]
    fn test_section_errors() {
        let mut usage = AllUsage::default();
        usage.block_storage.error = Some("timeout".to_string());

        let errors = section_errors(&usage);
        assert_eq!(errors, vec![("Block storage", "timeout")]);
    }

    #[test]
    fn test_usage_rows_cover_classified_resources() {
        let mut usage = AllUsage::default();
        usage.compute.arm.memory_gb = UsageMetric::new(12.0, 24.0);

        let rows = usage_rows(&usage);
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[1].used, "12 GB");
        assert_eq!(rows[1].limit, "24 GB");
    }
}

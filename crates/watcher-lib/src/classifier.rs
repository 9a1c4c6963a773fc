//! Severity classification of a usage snapshot
//!
//! The overall severity is driven by the single most-used resource. Every
//! classified resource at or above [`WARNING_THRESHOLD`] also produces a
//! human-readable warning.

use serde::{Deserialize, Serialize};

use crate::models::AllUsage;

pub const ATTENTION_THRESHOLD: i64 = 60;
pub const WARNING_THRESHOLD: i64 = 80;
pub const CRITICAL_THRESHOLD: i64 = 90;

/// Account-level severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Attention,
    Warning,
    Critical,
}

impl Severity {
    pub fn from_percentage(percentage: i64) -> Self {
        if percentage >= CRITICAL_THRESHOLD {
            Severity::Critical
        } else if percentage >= WARNING_THRESHOLD {
            Severity::Warning
        } else if percentage >= ATTENTION_THRESHOLD {
            Severity::Attention
        } else {
            Severity::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Attention => "ATTENTION",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OK" => Ok(Severity::Ok),
            "ATTENTION" => Ok(Severity::Attention),
            "WARNING" => Ok(Severity::Warning),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Result of classifying a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSummary {
    pub status: Severity,
    pub max_usage_percentage: i64,
    pub warnings: Vec<String>,
}

/// Resources that participate in classification, with their warning labels.
///
/// AMD micro instances and load balancers are reported but not classified.
pub fn classified_percentages(usage: &AllUsage) -> [(&'static str, i64); 5] {
    [
        ("ARM OCPUs", usage.compute.arm.ocpus.percentage),
        ("ARM Memory", usage.compute.arm.memory_gb.percentage),
        ("Block Storage", usage.block_storage.total.percentage),
        ("Public IPs", usage.public_ips.percentage),
        ("Object Storage", usage.object_storage.total.percentage),
    ]
}

/// Classify a snapshot into a severity, its peak percentage and warnings
pub fn classify(usage: &AllUsage) -> UsageSummary {
    let mut max_usage_percentage = 0;
    let mut warnings = Vec::new();

    for (label, percentage) in classified_percentages(usage) {
        if percentage <= 0 {
            continue;
        }
        max_usage_percentage = max_usage_percentage.max(percentage);
        if percentage >= WARNING_THRESHOLD {
            warnings.push(format!("{} at {}%", label, percentage));
        }
    }

    UsageSummary {
        status: Severity::from_percentage(max_usage_percentage),
        max_usage_percentage,
        warnings,
    }
}

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One row of uploaded operational ("visual") or survey data, after column
/// resolution and numeric coercion. `store` + `name` is the merge key but is
/// not unique; duplicate keys are aggregated downstream.
#[derive(Debug, Clone, Default)]
pub struct WorkroomRecord {
    pub id: Uuid,
    pub name: String,
    pub store: String,
    pub sales: f64,
    pub labor_po: f64,
    pub vendor_debit: f64,
    pub cycle_time: Option<f64>,
    pub completed: Option<f64>,
    pub jobs_work_cycle_time: Option<f64>,
    pub reschedule_rate: Option<f64>,
    pub get_it_right: Option<f64>,
    pub details_cycle_time: Option<f64>,
    pub ltr_score: Option<f64>,
    pub craft_score: Option<f64>,
    pub prof_score: Option<f64>,
    pub survey_date: Option<String>,
    pub survey_comment: Option<String>,
    pub labor_category: Option<String>,
}

/// Aggregated totals for one workroom name across all of its rows.
#[derive(Debug, Clone)]
pub struct WorkroomTotals {
    pub name: String,
    pub stores: BTreeSet<String>,
    pub records: usize,
    pub sales: f64,
    pub labor_po: f64,
    pub vendor_debit: f64,
    pub cycle_time: Option<f64>,
    pub jobs_work_cycle_time: Option<f64>,
    pub reschedule_rate: Option<f64>,
    pub survey_ltr_mean: Option<f64>,
}

/// Per-metric scores for one workroom. Each component is 0-100, with 0 also
/// serving as the "insufficient data" sentinel the dashboard expects.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentScoreSet {
    pub ltr_score: f64,
    pub cycle_jobs_score: f64,
    pub work_order_cycle_time_score: f64,
    pub reschedule_rate_score: f64,
    pub vendor_debits_score: f64,
    pub weighted_wpi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Ltr,
    JobCycleTime,
    WorkOrderCycleTime,
    RescheduleRate,
    VendorDebit,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Ltr,
        MetricKind::JobCycleTime,
        MetricKind::WorkOrderCycleTime,
        MetricKind::RescheduleRate,
        MetricKind::VendorDebit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Ltr => "ltr",
            MetricKind::JobCycleTime => "job_cycle_time",
            MetricKind::WorkOrderCycleTime => "work_order_cycle_time",
            MetricKind::RescheduleRate => "reschedule_rate",
            MetricKind::VendorDebit => "vendor_debit",
        }
    }

    pub fn parse(value: &str) -> Option<MetricKind> {
        match value {
            "ltr" => Some(MetricKind::Ltr),
            "job_cycle_time" => Some(MetricKind::JobCycleTime),
            "work_order_cycle_time" => Some(MetricKind::WorkOrderCycleTime),
            "reschedule_rate" => Some(MetricKind::RescheduleRate),
            "vendor_debit" => Some(MetricKind::VendorDebit),
            _ => None,
        }
    }

    /// Corrective-action form the dashboard routes to for this metric.
    pub fn form_route(&self) -> &'static str {
        match self {
            MetricKind::Ltr => "/forms/ltr-improvement",
            MetricKind::JobCycleTime | MetricKind::WorkOrderCycleTime => {
                "/forms/cycle-time-action"
            }
            MetricKind::RescheduleRate => "/forms/reschedule-rate-action",
            MetricKind::VendorDebit => "/forms/vendor-debit-review",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Ltr => "LTR performance",
            MetricKind::JobCycleTime => "Job cycle time",
            MetricKind::WorkOrderCycleTime => "Work order cycle time",
            MetricKind::RescheduleRate => "Reschedule rate",
            MetricKind::VendorDebit => "Vendor debit",
        }
    }
}

/// Qualitative rating used by the store-mix / LTR / labor-volume / debit
/// threshold tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Moderate => "Moderate",
            Rating::Low => "Low",
        }
    }
}

/// Band for the survey-based LTR mean (1-10 scale). Distinct from the
/// percentage-based LTR score and never mixed with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LtrBand {
    Excellent,
    Good,
    Moderate,
    Poor,
    Critical,
}

impl LtrBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            LtrBand::Excellent => "Excellent",
            LtrBand::Good => "Good",
            LtrBand::Moderate => "Moderate",
            LtrBand::Poor => "Poor",
            LtrBand::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub workroom: String,
    pub metric_type: Option<MetricKind>,
    pub message: String,
    pub kind: String,
    pub form_route: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FormSubmission {
    pub id: Uuid,
    pub workroom: String,
    pub metric_type: MetricKind,
    pub submitted_by: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub email: String,
    pub workroom: String,
    pub role: String,
}

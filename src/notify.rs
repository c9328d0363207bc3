use crate::models::{ComponentScoreSet, MetricKind, Notification, WorkroomTotals};

/// Every component metric alerts below the same fixed score.
pub const ALERT_THRESHOLD: f64 = 70.0;

/// An alert the threshold pass wants to create, pending dedup.
#[derive(Debug, Clone)]
pub struct PendingAlert {
    pub workroom: String,
    pub metric: MetricKind,
    pub message: String,
    pub kind: &'static str,
    pub form_route: &'static str,
}

fn metric_score(scores: &ComponentScoreSet, metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Ltr => scores.ltr_score,
        MetricKind::JobCycleTime => scores.cycle_jobs_score,
        MetricKind::WorkOrderCycleTime => scores.work_order_cycle_time_score,
        MetricKind::RescheduleRate => scores.reschedule_rate_score,
        MetricKind::VendorDebit => scores.vendor_debits_score,
    }
}

fn alert_message(workroom: &str, metric: MetricKind, score: f64) -> String {
    match metric {
        MetricKind::Ltr => format!(
            "Low LTR performance in {workroom}: score {score:.1} is below {ALERT_THRESHOLD:.0}"
        ),
        MetricKind::JobCycleTime => format!(
            "Job cycle time in {workroom} needs attention: score {score:.1} is below {ALERT_THRESHOLD:.0}"
        ),
        MetricKind::WorkOrderCycleTime => format!(
            "Work order cycle time in {workroom} needs attention: score {score:.1} is below {ALERT_THRESHOLD:.0}"
        ),
        MetricKind::RescheduleRate => format!(
            "High reschedule rate in {workroom}: score {score:.1} is below {ALERT_THRESHOLD:.0}"
        ),
        MetricKind::VendorDebit => format!(
            "Vendor debit discipline in {workroom} slipping: score {score:.1} is below {ALERT_THRESHOLD:.0}"
        ),
    }
}

/// One threshold pass over a scored dataset. Dedup happens separately so the
/// evaluation itself stays pure.
pub fn evaluate(scored: &[(WorkroomTotals, ComponentScoreSet)]) -> Vec<PendingAlert> {
    let mut pending = Vec::new();
    for (totals, scores) in scored {
        for metric in MetricKind::ALL {
            let score = metric_score(scores, metric);
            if score < ALERT_THRESHOLD {
                pending.push(PendingAlert {
                    workroom: totals.name.clone(),
                    metric,
                    message: alert_message(&totals.name, metric, score),
                    kind: "warn",
                    form_route: metric.form_route(),
                });
            }
        }
    }
    pending
}

/// Legacy keyword rules. Older notifications carry no metric tag, so dedup
/// and routing fall back to matching their message text. The job-cycle rule
/// must not match work-order messages; the two read almost identically.
pub fn message_matches(metric: MetricKind, message: &str) -> bool {
    let text = message.to_lowercase();
    match metric {
        MetricKind::Ltr => text.contains("low ltr") || text.contains("ltr performance"),
        MetricKind::JobCycleTime => {
            (text.contains("job cycle") || text.contains("cycle time"))
                && !text.contains("work order")
        }
        MetricKind::WorkOrderCycleTime => text.contains("work order"),
        MetricKind::RescheduleRate => text.contains("reschedule"),
        MetricKind::VendorDebit => text.contains("vendor debit") || text.contains("debit"),
    }
}

/// Resolve the corrective-action form for a notification. Tagged rows route
/// directly; untagged legacy rows are re-parsed from the message text.
pub fn route_for(notification: &Notification) -> Option<&'static str> {
    if let Some(metric) = notification.metric_type {
        return Some(metric.form_route());
    }
    MetricKind::ALL
        .iter()
        .find(|metric| message_matches(**metric, &notification.message))
        .map(|metric| metric.form_route())
}

fn blocks(existing: &Notification, workroom: &str, metric: MetricKind) -> bool {
    if existing.workroom != workroom {
        return false;
    }
    match existing.metric_type {
        Some(tag) => tag == metric,
        None => message_matches(metric, &existing.message),
    }
}

/// Drop pending alerts that already have an open notification for the same
/// (workroom, metric) pair. Read rows block too; only deletion reopens a pair.
pub fn dedup(pending: Vec<PendingAlert>, existing: &[Notification]) -> Vec<PendingAlert> {
    pending
        .into_iter()
        .filter(|alert| {
            !existing
                .iter()
                .any(|notification| blocks(notification, &alert.workroom, alert.metric))
        })
        .collect()
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

/// Heuristic for the bulk cleanup of pre-tag notifications: untagged rows
/// whose phrasing matches the old alert format.
pub fn is_legacy_format(notification: &Notification) -> bool {
    if notification.metric_type.is_some() {
        return false;
    }
    let text = notification.message.to_lowercase();
    text.starts_with("performance alert:") || text.contains("has fallen below the threshold")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComponentScoreSet;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn scored(name: &str, set: ComponentScoreSet) -> (WorkroomTotals, ComponentScoreSet) {
        (
            WorkroomTotals {
                name: name.to_string(),
                stores: BTreeSet::new(),
                records: 1,
                sales: 0.0,
                labor_po: 0.0,
                vendor_debit: 0.0,
                cycle_time: None,
                jobs_work_cycle_time: None,
                reschedule_rate: None,
                survey_ltr_mean: None,
            },
            set,
        )
    }

    fn all_healthy() -> ComponentScoreSet {
        ComponentScoreSet {
            ltr_score: 90.0,
            cycle_jobs_score: 90.0,
            work_order_cycle_time_score: 90.0,
            reschedule_rate_score: 90.0,
            vendor_debits_score: 90.0,
            weighted_wpi: 90.0,
        }
    }

    fn notification(workroom: &str, metric: Option<MetricKind>, message: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            workroom: workroom.to_string(),
            metric_type: metric,
            message: message.to_string(),
            kind: "warn".to_string(),
            form_route: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn evaluate_flags_only_metrics_below_threshold() {
        let mut set = all_healthy();
        set.ltr_score = 40.0;
        set.vendor_debits_score = 69.9;
        let pending = evaluate(&[scored("Tampa", set)]);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].metric, MetricKind::Ltr);
        assert_eq!(pending[1].metric, MetricKind::VendorDebit);
    }

    #[test]
    fn generated_messages_satisfy_their_own_keyword_rules() {
        let mut set = all_healthy();
        set.ltr_score = 0.0;
        set.cycle_jobs_score = 0.0;
        set.work_order_cycle_time_score = 0.0;
        set.reschedule_rate_score = 0.0;
        set.vendor_debits_score = 0.0;
        for alert in evaluate(&[scored("Tampa", set)]) {
            assert!(
                message_matches(alert.metric, &alert.message),
                "message fails its own rule: {}",
                alert.message
            );
        }
    }

    #[test]
    fn job_cycle_rule_does_not_match_work_order_messages() {
        assert!(!message_matches(
            MetricKind::JobCycleTime,
            "Work order cycle time in Tampa needs attention"
        ));
        assert!(message_matches(
            MetricKind::WorkOrderCycleTime,
            "Work order cycle time in Tampa needs attention"
        ));
        assert!(message_matches(
            MetricKind::JobCycleTime,
            "Job cycle time in Tampa needs attention"
        ));
    }

    #[test]
    fn dedup_blocks_on_tagged_and_legacy_rows() {
        let mut set = all_healthy();
        set.ltr_score = 10.0;
        set.reschedule_rate_score = 10.0;
        let pending = evaluate(&[scored("Tampa", set)]);

        let existing = vec![
            notification("Tampa", Some(MetricKind::Ltr), "tagged row"),
            notification("Tampa", None, "High reschedule rate in Tampa"),
        ];
        let remaining = dedup(pending, &existing);
        assert!(remaining.is_empty());
    }

    #[test]
    fn dedup_is_scoped_to_the_workroom() {
        let mut set = all_healthy();
        set.ltr_score = 10.0;
        let pending = evaluate(&[scored("Tampa", set)]);
        let existing = vec![notification("Ocala", Some(MetricKind::Ltr), "other workroom")];
        assert_eq!(dedup(pending, &existing).len(), 1);
    }

    #[test]
    fn read_rows_still_block_duplicates() {
        let mut set = all_healthy();
        set.ltr_score = 10.0;
        let pending = evaluate(&[scored("Tampa", set)]);
        let mut read = notification("Tampa", Some(MetricKind::Ltr), "seen");
        read.is_read = true;
        assert!(dedup(pending, &[read]).is_empty());
    }

    #[test]
    fn repeated_cycles_keep_at_most_one_alert_per_pair() {
        let mut set = all_healthy();
        set.ltr_score = 10.0;
        let mut existing: Vec<Notification> = Vec::new();

        for _ in 0..5 {
            let pending = evaluate(&[scored("Tampa", set.clone())]);
            for alert in dedup(pending, &existing) {
                existing.push(notification(&alert.workroom, Some(alert.metric), &alert.message));
            }
        }

        let ltr_rows = existing
            .iter()
            .filter(|n| n.workroom == "Tampa" && n.metric_type == Some(MetricKind::Ltr))
            .count();
        assert_eq!(ltr_rows, 1);
    }

    #[test]
    fn routing_prefers_tag_and_falls_back_to_message() {
        let tagged = notification("Tampa", Some(MetricKind::RescheduleRate), "anything");
        assert_eq!(route_for(&tagged), Some("/forms/reschedule-rate-action"));

        let legacy = notification("Tampa", None, "Low LTR performance in Tampa");
        assert_eq!(route_for(&legacy), Some("/forms/ltr-improvement"));

        let unknown = notification("Tampa", None, "hello");
        assert_eq!(route_for(&unknown), None);
    }

    #[test]
    fn unread_count_is_derived() {
        let mut rows = vec![
            notification("Tampa", None, "a"),
            notification("Tampa", None, "b"),
        ];
        assert_eq!(unread_count(&rows), 2);
        rows[0].is_read = true;
        assert_eq!(unread_count(&rows), 1);
    }

    #[test]
    fn legacy_cleanup_only_matches_untagged_old_phrasing() {
        let old = notification(
            "Tampa",
            None,
            "Performance alert: Tampa has fallen below the threshold",
        );
        assert!(is_legacy_format(&old));

        let tagged = notification(
            "Tampa",
            Some(MetricKind::Ltr),
            "Performance alert: Tampa has fallen below the threshold",
        );
        assert!(!is_legacy_format(&tagged));

        let current = notification("Tampa", None, "Low LTR performance in Tampa: score 10.0");
        assert!(!is_legacy_format(&current));
    }
}

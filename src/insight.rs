use crate::models::{ComponentScoreSet, Rating, RiskLevel, WorkroomTotals};
use crate::score;

const LOW_MARGIN_RATE: f64 = 0.10;
const COST_PER_RECORD_CEILING: f64 = 3_000.0;
const CYCLE_TIME_CEILING_DAYS: f64 = 30.0;
const LOW_COMPOSITE_SCORE: f64 = 60.0;

pub fn store_mix_rating(store_count: usize) -> Rating {
    if store_count >= 10 {
        Rating::Excellent
    } else if store_count >= 5 {
        Rating::Good
    } else if store_count >= 3 {
        Rating::Moderate
    } else {
        Rating::Low
    }
}

/// Lower labor-to-revenue is better.
pub fn ltr_performance_rating(ltr_percent: f64) -> Rating {
    if ltr_percent <= 20.0 {
        Rating::Excellent
    } else if ltr_percent <= 30.0 {
        Rating::Good
    } else if ltr_percent <= 40.0 {
        Rating::Moderate
    } else {
        Rating::Low
    }
}

/// Share of the population's total labor PO volume, in percent.
pub fn labor_contribution_rating(contribution_percent: f64) -> Rating {
    if contribution_percent >= 15.0 {
        Rating::Excellent
    } else if contribution_percent >= 8.0 {
        Rating::Good
    } else if contribution_percent >= 3.0 {
        Rating::Moderate
    } else {
        Rating::Low
    }
}

pub fn vendor_debit_rating(ratio: f64) -> Rating {
    if ratio <= 0.10 {
        Rating::Excellent
    } else if ratio <= 0.20 {
        Rating::Good
    } else if ratio <= 0.30 {
        Rating::Moderate
    } else {
        Rating::Low
    }
}

/// Ordered override chain. Rules only escalate; evaluation order matters
/// because the Critical rule at the end overrides everything before it.
pub fn financial_risk(totals: &WorkroomTotals) -> RiskLevel {
    let ratio = score::vendor_debit_ratio(totals.labor_po, totals.vendor_debit);
    let ltr = score::ltr_percent(totals.sales, totals.labor_po);
    let total_cost = totals.labor_po + totals.vendor_debit.abs();

    let mut risk = RiskLevel::Low;
    if ratio > 0.3 {
        risk = RiskLevel::High;
    }
    if ltr > 40.0 {
        risk = risk.max(RiskLevel::Moderate);
    }
    if totals.sales > 0.0 && total_cost > 0.0 {
        let margin_rate = (totals.sales - total_cost) / total_cost;
        if margin_rate < LOW_MARGIN_RATE {
            risk = risk.max(RiskLevel::Moderate);
        }
    }
    if ratio > 0.4 || ltr > 50.0 {
        risk = RiskLevel::Critical;
    }
    risk
}

/// Independently-triggered advisories in a fixed order. Multiple may fire.
pub fn fix_now_bullets(totals: &WorkroomTotals, scores: &ComponentScoreSet) -> Vec<String> {
    let ratio = score::vendor_debit_ratio(totals.labor_po, totals.vendor_debit);
    let ltr = score::ltr_percent(totals.sales, totals.labor_po);
    let mut bullets = Vec::new();

    if ratio > 0.2 {
        bullets.push(format!(
            "Vendor debits are {:.0}% of labor spend; review debit causes with vendors",
            ratio * 100.0
        ));
    }
    if totals.sales > 0.0 && ltr > 30.0 {
        bullets.push(format!(
            "Labor PO is {ltr:.0}% of sales; renegotiate labor rates or re-scope jobs"
        ));
    }
    if totals.stores.len() < 3 {
        bullets.push("Fewer than 3 stores feeding this workroom; broaden the store mix".to_string());
    }
    if totals.records > 0 {
        let total_cost = totals.labor_po + totals.vendor_debit.abs();
        let cost_per_record = total_cost / totals.records as f64;
        if cost_per_record > COST_PER_RECORD_CEILING {
            bullets.push(format!(
                "Cost per job is ${cost_per_record:.0}; audit high-cost jobs"
            ));
        }
    }
    if let Some(cycle_time) = totals.cycle_time {
        if cycle_time > CYCLE_TIME_CEILING_DAYS {
            bullets.push(format!(
                "Average cycle time is {cycle_time:.0} days; clear scheduling backlog"
            ));
        }
    }
    if scores.weighted_wpi < LOW_COMPOSITE_SCORE {
        bullets.push(format!(
            "Composite WPI is {:.1}; submit a corrective-action plan",
            scores.weighted_wpi
        ));
    }

    bullets
}

#[derive(Debug, Clone)]
pub struct WorkroomInsight {
    pub name: String,
    pub store_mix: Rating,
    pub ltr_performance: Rating,
    pub labor_contribution: Rating,
    pub vendor_debit: Rating,
    pub financial_risk: RiskLevel,
    pub fix_now: Vec<String>,
}

pub fn build_insight(
    totals: &WorkroomTotals,
    scores: &ComponentScoreSet,
    population_labor_po: f64,
) -> WorkroomInsight {
    let contribution = if population_labor_po > 0.0 {
        totals.labor_po / population_labor_po * 100.0
    } else {
        0.0
    };

    WorkroomInsight {
        name: totals.name.clone(),
        store_mix: store_mix_rating(totals.stores.len()),
        ltr_performance: ltr_performance_rating(score::ltr_percent(totals.sales, totals.labor_po)),
        labor_contribution: labor_contribution_rating(contribution),
        vendor_debit: vendor_debit_rating(score::vendor_debit_ratio(
            totals.labor_po,
            totals.vendor_debit,
        )),
        financial_risk: financial_risk(totals),
        fix_now: fix_now_bullets(totals, scores),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::component_scores;
    use std::collections::BTreeSet;

    fn totals(sales: f64, labor_po: f64, vendor_debit: f64) -> WorkroomTotals {
        WorkroomTotals {
            name: "Tampa".to_string(),
            stores: BTreeSet::new(),
            records: 1,
            sales,
            labor_po,
            vendor_debit,
            cycle_time: None,
            jobs_work_cycle_time: None,
            reschedule_rate: None,
            survey_ltr_mean: None,
        }
    }

    #[test]
    fn store_mix_cutpoints() {
        assert_eq!(store_mix_rating(10), Rating::Excellent);
        assert_eq!(store_mix_rating(5), Rating::Good);
        assert_eq!(store_mix_rating(3), Rating::Moderate);
        assert_eq!(store_mix_rating(2), Rating::Low);
    }

    #[test]
    fn risk_starts_low_and_only_escalates() {
        // healthy margin, clean debits
        assert_eq!(financial_risk(&totals(10_000.0, 1_500.0, 100.0)), RiskLevel::Low);
        // debit ratio past 0.3
        assert_eq!(financial_risk(&totals(10_000.0, 1_000.0, 600.0)), RiskLevel::High);
        // LTR past 40 escalates to at least Moderate
        assert_eq!(financial_risk(&totals(10_000.0, 4_500.0, 0.0)), RiskLevel::Moderate);
        // LTR past 50 is Critical regardless
        assert_eq!(financial_risk(&totals(10_000.0, 5_500.0, 0.0)), RiskLevel::Critical);
        // debit ratio past 0.4 is Critical even with good LTR
        assert_eq!(financial_risk(&totals(100_000.0, 1_000.0, 800.0)), RiskLevel::Critical);
    }

    #[test]
    fn low_margin_is_at_least_moderate() {
        // sales 10_000, cost 9_600 -> margin ~4%
        let risk = financial_risk(&totals(10_000.0, 9_000.0, 600.0));
        assert!(risk >= RiskLevel::Moderate);
    }

    #[test]
    fn bullets_fire_independently_in_fixed_order() {
        let mut t = totals(10_000.0, 3_500.0, 1_500.0);
        t.cycle_time = Some(45.0);
        let scores = component_scores(&t, 3_500.0);
        let bullets = fix_now_bullets(&t, &scores);

        assert!(bullets[0].contains("Vendor debits"));
        assert!(bullets[1].contains("Labor PO"));
        assert!(bullets[2].contains("stores"));
        assert!(bullets.iter().any(|b| b.contains("cycle time")));
    }

    #[test]
    fn healthy_workroom_gets_no_bullets() {
        let mut t = totals(50_000.0, 5_000.0, 200.0);
        for store in 0..5 {
            t.stores.insert(store.to_string());
        }
        t.records = 20;
        let scores = component_scores(&t, 5_000.0);
        assert!(fix_now_bullets(&t, &scores).is_empty());
    }
}

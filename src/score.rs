use crate::models::{ComponentScoreSet, LtrBand, WorkroomTotals};

/// Labor-to-revenue percentage. Zero sales reads as 0, not an error.
pub fn ltr_percent(sales: f64, labor_po: f64) -> f64 {
    if sales == 0.0 {
        0.0
    } else {
        labor_po / sales * 100.0
    }
}

/// Piecewise-linear LTR score used by the weighted WPI. A workroom with no
/// sales data at all gets the neutral 50; a ratio past 40% is unscored (0).
pub fn simple_ltr_score(sales: f64, labor_po: f64) -> f64 {
    if sales <= 0.0 {
        return 50.0;
    }
    let percent = ltr_percent(sales, labor_po);
    if percent <= 20.0 {
        100.0 - percent / 20.0 * 30.0
    } else if percent <= 40.0 {
        70.0 - (percent - 20.0) / 20.0 * 70.0
    } else {
        0.0
    }
}

/// Bucket the mean of raw survey LTR scores (1-10 scale). This is the
/// satisfaction rating shown next to survey data; it is unrelated to the
/// percentage-based [`simple_ltr_score`].
pub fn survey_ltr_band(mean: f64) -> LtrBand {
    if mean > 9.0 {
        LtrBand::Excellent
    } else if mean >= 8.0 {
        LtrBand::Good
    } else if mean >= 7.0 {
        LtrBand::Moderate
    } else if mean >= 6.0 {
        LtrBand::Poor
    } else {
        LtrBand::Critical
    }
}

/// Relative labor volume against the population max. The max is recomputed by
/// the caller on every pass since the population changes between uploads.
pub fn labor_po_score(labor_po: f64, population_max: f64) -> f64 {
    if population_max <= 0.0 {
        0.0
    } else {
        labor_po / population_max * 100.0
    }
}

pub fn vendor_debit_ratio(labor_po: f64, vendor_debit: f64) -> f64 {
    let debit = vendor_debit.abs();
    let denominator = labor_po + debit;
    if denominator == 0.0 {
        0.0
    } else {
        debit / denominator
    }
}

/// Continuous discipline score: a debit ratio above 50% bottoms out at 0.
pub fn vendor_debit_discipline_score(labor_po: f64, vendor_debit: f64) -> f64 {
    let score = 100.0 - vendor_debit_ratio(labor_po, vendor_debit) * 200.0;
    score.max(0.0)
}

/// Fixed-bucket vendor debit score used by the mandatory-form trigger.
/// Distinct from the continuous discipline score; boundaries are inclusive.
pub fn vendor_debit_bucket_score(ratio: f64) -> f64 {
    if ratio <= 0.10 {
        100.0
    } else if ratio <= 0.20 {
        80.0
    } else if ratio <= 0.30 {
        60.0
    } else if ratio <= 0.40 {
        40.0
    } else {
        20.0
    }
}

const W_LTR: f64 = 0.50;
const W_LABOR_PO: f64 = 0.30;
const W_VENDOR_DEBIT: f64 = 0.20;

/// The weighted Workroom Performance Index. A second, unrelated formula also
/// called "WPI" lives in [`top_performing_index`]; the two encode different
/// business assumptions and are deliberately not unified.
pub fn weighted_performance_index(
    ltr_score: f64,
    labor_po_score: f64,
    vendor_debit_score: f64,
) -> f64 {
    W_LTR * ltr_score + W_LABOR_PO * labor_po_score + W_VENDOR_DEBIT * vendor_debit_score
}

/// "Top performing workroom" index. With sales data: an efficiency/margin
/// formula, optionally damped by cycle time. Without sales data: a blend of
/// five independently capped sub-terms. The branch on `sales > 0` is part of
/// the contract, not an optimization.
pub fn top_performing_index(totals: &WorkroomTotals) -> f64 {
    let total_cost = totals.labor_po + totals.vendor_debit.abs();

    if totals.sales > 0.0 {
        if total_cost <= 0.0 {
            return 100.0;
        }
        let efficiency = totals.sales / total_cost;
        let margin_rate = (totals.sales - total_cost) / total_cost;
        let mut index = (efficiency * 10.0 * (1.0 + margin_rate)).min(100.0);
        if let Some(cycle_time) = totals.cycle_time {
            index *= (1.0 - cycle_time / 30.0).max(0.0);
        }
        return index;
    }

    let cost_per_record = if totals.records == 0 {
        0.0
    } else {
        total_cost / totals.records as f64
    };
    let cost_efficiency = ((1.0 - (cost_per_record / 5000.0).min(1.0)) * 100.0).min(100.0);
    let labor_ratio = if total_cost > 0.0 {
        (totals.labor_po / total_cost * 100.0).min(100.0)
    } else {
        0.0
    };
    let cycle_score = match totals.cycle_time {
        Some(cycle_time) => ((1.0 - cycle_time / 60.0).max(0.0) * 100.0).min(100.0),
        None => 50.0,
    };
    let store_score = ((totals.stores.len() as f64) * 10.0).min(100.0);
    let record_score = ((totals.records as f64) * 2.0).min(100.0);

    0.30 * cost_efficiency
        + 0.25 * labor_ratio
        + 0.20 * cycle_score
        + 0.15 * store_score
        + 0.10 * record_score
}

const CYCLE_TIME_TARGET_DAYS: f64 = 30.0;
const RESCHEDULE_POINTS_PER_PERCENT: f64 = 5.0;

/// Days-based cycle score: on-target or faster is 100, then a linear slide
/// to 0 at twice the target. Missing data keeps the 0 sentinel.
fn cycle_score(days: Option<f64>) -> f64 {
    match days {
        Some(days) if days <= CYCLE_TIME_TARGET_DAYS => 100.0,
        Some(days) => {
            (100.0 - (days - CYCLE_TIME_TARGET_DAYS) * (100.0 / CYCLE_TIME_TARGET_DAYS)).max(0.0)
        }
        None => 0.0,
    }
}

fn reschedule_score(rate_percent: Option<f64>) -> f64 {
    match rate_percent {
        Some(rate) => (100.0 - rate * RESCHEDULE_POINTS_PER_PERCENT).clamp(0.0, 100.0),
        None => 0.0,
    }
}

/// Compute the per-metric component scores for one workroom. `population_max_labor_po`
/// must come from the same pass over the current dataset.
pub fn component_scores(totals: &WorkroomTotals, population_max_labor_po: f64) -> ComponentScoreSet {
    let ltr = simple_ltr_score(totals.sales, totals.labor_po);
    let labor = labor_po_score(totals.labor_po, population_max_labor_po);
    let debit = vendor_debit_discipline_score(totals.labor_po, totals.vendor_debit);

    ComponentScoreSet {
        ltr_score: ltr,
        cycle_jobs_score: cycle_score(totals.jobs_work_cycle_time),
        work_order_cycle_time_score: cycle_score(totals.cycle_time),
        reschedule_rate_score: reschedule_score(totals.reschedule_rate),
        vendor_debits_score: debit,
        weighted_wpi: weighted_performance_index(ltr, labor, debit),
    }
}

/// Score every workroom in the dataset against the current population.
pub fn score_all(totals: &[WorkroomTotals]) -> Vec<(WorkroomTotals, ComponentScoreSet)> {
    let max_labor_po = totals
        .iter()
        .map(|t| t.labor_po)
        .fold(0.0f64, f64::max);

    totals
        .iter()
        .map(|t| (t.clone(), component_scores(t, max_labor_po)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn ltr_score_piecewise_bands() {
        // 15% labor-to-revenue: 100 - 15/20*30
        assert!((simple_ltr_score(10_000.0, 1_500.0) - 77.5).abs() < 1e-9);
        // 30%: 70 - 10/20*70 = 35
        assert!((simple_ltr_score(10_000.0, 3_000.0) - 35.0).abs() < 1e-9);
        // past 40% is unscored
        assert_eq!(simple_ltr_score(10_000.0, 5_000.0), 0.0);
        // no sales data at all is neutral
        assert_eq!(simple_ltr_score(0.0, 1_000.0), 50.0);
    }

    #[test]
    fn vendor_debit_discipline_curve() {
        // ratio 500/2000 = 0.25 -> 100 - 50 = 50
        assert!((vendor_debit_discipline_score(1_500.0, 500.0) - 50.0).abs() < 1e-9);
        // ratio above 50% floors at 0
        assert_eq!(vendor_debit_discipline_score(100.0, 900.0), 0.0);
        // no labor and no debit reads as clean
        assert_eq!(vendor_debit_discipline_score(0.0, 0.0), 100.0);
        // sign of the debit does not matter
        assert_eq!(
            vendor_debit_discipline_score(1_500.0, -500.0),
            vendor_debit_discipline_score(1_500.0, 500.0)
        );
    }

    #[test]
    fn bucket_score_boundaries_inclusive() {
        assert_eq!(vendor_debit_bucket_score(0.10), 100.0);
        assert_eq!(vendor_debit_bucket_score(0.1000001), 80.0);
        assert_eq!(vendor_debit_bucket_score(0.20), 80.0);
        assert_eq!(vendor_debit_bucket_score(0.30), 60.0);
        assert_eq!(vendor_debit_bucket_score(0.40), 40.0);
        assert_eq!(vendor_debit_bucket_score(0.41), 20.0);
    }

    #[test]
    fn bucket_score_never_increases_with_ratio() {
        let mut previous = f64::INFINITY;
        let mut ratio = 0.0;
        while ratio <= 1.0 {
            let score = vendor_debit_bucket_score(ratio);
            assert!(score <= previous, "score rose at ratio {ratio}");
            previous = score;
            ratio += 0.01;
        }
    }

    #[test]
    fn survey_band_cutpoints() {
        assert_eq!(survey_ltr_band(9.5), LtrBand::Excellent);
        assert_eq!(survey_ltr_band(9.0), LtrBand::Good);
        assert_eq!(survey_ltr_band(8.0), LtrBand::Good);
        assert_eq!(survey_ltr_band(7.2), LtrBand::Moderate);
        assert_eq!(survey_ltr_band(6.0), LtrBand::Poor);
        assert_eq!(survey_ltr_band(5.9), LtrBand::Critical);
    }

    #[test]
    fn labor_po_score_is_relative_to_population_max() {
        assert_eq!(labor_po_score(500.0, 1_000.0), 50.0);
        assert_eq!(labor_po_score(1_000.0, 1_000.0), 100.0);
        assert_eq!(labor_po_score(500.0, 0.0), 0.0);
    }

    #[test]
    fn weighted_wpi_matches_spec_scenario() {
        let set = component_scores(&totals(10_000.0, 1_500.0, 500.0), 1_500.0);
        assert!((set.ltr_score - 77.5).abs() < 1e-9);
        assert!((set.vendor_debits_score - 50.0).abs() < 1e-9);
        // 0.5*77.5 + 0.3*100 + 0.2*50 = 78.75
        assert!((set.weighted_wpi - 78.75).abs() < 1e-9);
    }

    #[test]
    fn scoring_is_idempotent() {
        let population = vec![
            totals(10_000.0, 1_500.0, 500.0),
            totals(5_000.0, 800.0, 100.0),
        ];
        let first = score_all(&population);
        let second = score_all(&population);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.1, b.1);
        }
    }

    #[test]
    fn top_performing_branches_on_sales() {
        let with_sales = totals(10_000.0, 1_500.0, 500.0);
        // efficiency 5, margin 4 -> 5*10*5 = 250, capped at 100
        assert_eq!(top_performing_index(&with_sales), 100.0);

        let mut damped = totals(10_000.0, 1_500.0, 500.0);
        damped.cycle_time = Some(15.0);
        assert!((top_performing_index(&damped) - 50.0).abs() < 1e-9);

        let mut no_sales = totals(0.0, 1_000.0, 0.0);
        no_sales.records = 10;
        no_sales.stores.insert("100".to_string());
        let index = top_performing_index(&no_sales);
        assert!(index > 0.0 && index <= 100.0);
    }

    #[test]
    fn top_performing_no_sales_blend_is_capped_per_term() {
        let mut big = totals(0.0, 0.0, 0.0);
        big.records = 1_000;
        for store in 0..50 {
            big.stores.insert(store.to_string());
        }
        big.cycle_time = Some(0.0);
        // every sub-term at its cap except labor ratio (no cost data)
        let index = top_performing_index(&big);
        assert!((index - (0.30 * 100.0 + 0.20 * 100.0 + 0.15 * 100.0 + 0.10 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn cycle_and_reschedule_sentinels() {
        let mut t = totals(0.0, 0.0, 0.0);
        let set = component_scores(&t, 0.0);
        assert_eq!(set.cycle_jobs_score, 0.0);
        assert_eq!(set.work_order_cycle_time_score, 0.0);
        assert_eq!(set.reschedule_rate_score, 0.0);

        t.cycle_time = Some(30.0);
        t.jobs_work_cycle_time = Some(45.0);
        t.reschedule_rate = Some(4.0);
        let set = component_scores(&t, 0.0);
        assert_eq!(set.work_order_cycle_time_score, 100.0);
        assert!((set.cycle_jobs_score - 50.0).abs() < 1e-9);
        assert!((set.reschedule_rate_score - 80.0).abs() < 1e-9);
    }
}

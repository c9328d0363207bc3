use std::fmt::Write;

use crate::insight::{self, WorkroomInsight};
use crate::models::{ComponentScoreSet, RiskLevel, WorkroomTotals};
use crate::score;

pub fn build_report(
    source_label: &str,
    totals: &[WorkroomTotals],
    scored: &[(WorkroomTotals, ComponentScoreSet)],
) -> String {
    let population_labor_po: f64 = totals.iter().map(|t| t.labor_po).sum();
    let total_sales: f64 = totals.iter().map(|t| t.sales).sum();
    let total_records: usize = totals.iter().map(|t| t.records).sum();

    let mut output = String::new();

    let _ = writeln!(output, "# Workroom Performance Report");
    let _ = writeln!(output, "Source: {source_label}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Dataset");
    let _ = writeln!(
        output,
        "- {} workrooms across {} rows",
        totals.len(),
        total_records
    );
    let _ = writeln!(output, "- Total sales ${total_sales:.2}");
    let _ = writeln!(output, "- Total labor PO ${population_labor_po:.2}");
    let _ = writeln!(output);

    let _ = writeln!(output, "## Top Performing Workrooms");
    let mut ranked: Vec<(&WorkroomTotals, f64)> = totals
        .iter()
        .map(|t| (t, score::top_performing_index(t)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if ranked.is_empty() {
        let _ = writeln!(output, "No workrooms in this dataset.");
    } else {
        for (t, index) in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} index {:.1} ({} stores, {} rows)",
                t.name,
                index,
                t.stores.len(),
                t.records
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Weighted WPI");
    let mut by_wpi: Vec<&(WorkroomTotals, ComponentScoreSet)> = scored.iter().collect();
    by_wpi.sort_by(|a, b| {
        b.1.weighted_wpi
            .partial_cmp(&a.1.weighted_wpi)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (t, scores) in by_wpi.iter() {
        let band = t
            .survey_ltr_mean
            .map(|mean| format!(", survey LTR {}", score::survey_ltr_band(mean).as_str()))
            .unwrap_or_default();
        let _ = writeln!(
            output,
            "- {} WPI {:.1} (LTR {:.1}, labor {:.1}, debits {:.1}{})",
            t.name,
            scores.weighted_wpi,
            scores.ltr_score,
            score::labor_po_score(
                t.labor_po,
                totals.iter().map(|x| x.labor_po).fold(0.0f64, f64::max)
            ),
            scores.vendor_debits_score,
            band
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## At Risk");
    let insights: Vec<WorkroomInsight> = scored
        .iter()
        .map(|(t, scores)| insight::build_insight(t, scores, population_labor_po))
        .collect();
    let at_risk: Vec<&WorkroomInsight> = insights
        .iter()
        .filter(|i| i.financial_risk >= RiskLevel::Moderate)
        .collect();

    if at_risk.is_empty() {
        let _ = writeln!(output, "No workrooms above Low financial risk.");
    } else {
        for item in at_risk {
            let _ = writeln!(
                output,
                "- {} risk {} (store mix {}, LTR {}, debits {})",
                item.name,
                item.financial_risk.as_str(),
                item.store_mix.as_str(),
                item.ltr_performance.as_str(),
                item.vendor_debit.as_str()
            );
            for bullet in &item.fix_now {
                let _ = writeln!(output, "  - {bullet}");
            }
        }
    }

    output
}

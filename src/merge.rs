use std::collections::BTreeSet;
use std::collections::HashMap;

use crate::models::{WorkroomRecord, WorkroomTotals};

pub fn merge_key(store: &str, name: &str) -> String {
    format!("{store}|||{name}")
}

/// Combine a visual dataset and a survey dataset into one record set keyed by
/// `store|||name`. Duplicate visual keys sum their financial fields; survey
/// fields are shallow-merged with later-wins semantics; a survey row with no
/// matching visual row synthesizes a record with zeroed financials.
///
/// Pure and caller-optional: visual-only and survey-only uploads may be kept
/// side by side without ever calling this.
pub fn merge_datasets(
    visual: &[WorkroomRecord],
    survey: &[WorkroomRecord],
) -> Vec<WorkroomRecord> {
    let mut merged: Vec<WorkroomRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in visual {
        let key = merge_key(&record.store, &record.name);
        match index.get(&key) {
            Some(&slot) => {
                let existing = &mut merged[slot];
                existing.sales += record.sales;
                existing.labor_po += record.labor_po;
                existing.vendor_debit += record.vendor_debit;
                if record.cycle_time.is_some() {
                    existing.cycle_time = record.cycle_time;
                }
                if record.completed.is_some() {
                    existing.completed = record.completed;
                }
                if record.jobs_work_cycle_time.is_some() {
                    existing.jobs_work_cycle_time = record.jobs_work_cycle_time;
                }
                if record.reschedule_rate.is_some() {
                    existing.reschedule_rate = record.reschedule_rate;
                }
                if record.get_it_right.is_some() {
                    existing.get_it_right = record.get_it_right;
                }
                if record.details_cycle_time.is_some() {
                    existing.details_cycle_time = record.details_cycle_time;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(record.clone());
            }
        }
    }

    for record in survey {
        let key = merge_key(&record.store, &record.name);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key, merged.len());
                merged.push(WorkroomRecord {
                    id: record.id,
                    name: record.name.clone(),
                    store: record.store.clone(),
                    ..WorkroomRecord::default()
                });
                merged.len() - 1
            }
        };

        let existing = &mut merged[slot];
        if record.ltr_score.is_some() {
            existing.ltr_score = record.ltr_score;
        }
        if record.craft_score.is_some() {
            existing.craft_score = record.craft_score;
        }
        if record.prof_score.is_some() {
            existing.prof_score = record.prof_score;
        }
        if record.survey_date.is_some() {
            existing.survey_date = record.survey_date.clone();
        }
        if record.survey_comment.is_some() {
            existing.survey_comment = record.survey_comment.clone();
        }
        if record.labor_category.is_some() {
            existing.labor_category = record.labor_category.clone();
        }
    }

    merged
}

/// Aggregate records into per-workroom totals (grouped by workroom name,
/// stores collected into a set). Output order follows first appearance.
pub fn totals_by_workroom(records: &[WorkroomRecord]) -> Vec<WorkroomTotals> {
    let mut totals: Vec<WorkroomTotals> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut cycle_samples: Vec<Vec<f64>> = Vec::new();
    let mut jobs_cycle_samples: Vec<Vec<f64>> = Vec::new();
    let mut reschedule_samples: Vec<Vec<f64>> = Vec::new();
    let mut ltr_samples: Vec<Vec<f64>> = Vec::new();

    for record in records {
        let slot = match index.get(&record.name) {
            Some(&slot) => slot,
            None => {
                index.insert(record.name.clone(), totals.len());
                totals.push(WorkroomTotals {
                    name: record.name.clone(),
                    stores: BTreeSet::new(),
                    records: 0,
                    sales: 0.0,
                    labor_po: 0.0,
                    vendor_debit: 0.0,
                    cycle_time: None,
                    jobs_work_cycle_time: None,
                    reschedule_rate: None,
                    survey_ltr_mean: None,
                });
                cycle_samples.push(Vec::new());
                jobs_cycle_samples.push(Vec::new());
                reschedule_samples.push(Vec::new());
                ltr_samples.push(Vec::new());
                totals.len() - 1
            }
        };

        let entry = &mut totals[slot];
        entry.records += 1;
        entry.sales += record.sales;
        entry.labor_po += record.labor_po;
        entry.vendor_debit += record.vendor_debit;
        if !record.store.is_empty() {
            entry.stores.insert(record.store.clone());
        }
        if let Some(value) = record.cycle_time {
            cycle_samples[slot].push(value);
        }
        if let Some(value) = record.jobs_work_cycle_time {
            jobs_cycle_samples[slot].push(value);
        }
        if let Some(value) = record.reschedule_rate {
            reschedule_samples[slot].push(value);
        }
        if let Some(value) = record.ltr_score {
            ltr_samples[slot].push(value);
        }
    }

    for (slot, entry) in totals.iter_mut().enumerate() {
        entry.cycle_time = mean(&cycle_samples[slot]);
        entry.jobs_work_cycle_time = mean(&jobs_cycle_samples[slot]);
        entry.reschedule_rate = mean(&reschedule_samples[slot]);
        entry.survey_ltr_mean = mean(&ltr_samples[slot]);
    }

    totals
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

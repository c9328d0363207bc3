use std::path::Path;

use anyhow::{bail, Context};
use calamine::{open_workbook_auto, Data, Reader};
use serde::Deserialize;
use uuid::Uuid;

use crate::columns::{self, normalize_workroom_name, parse_optional, parse_required};
use crate::models::WorkroomRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    Visual,
    Survey,
}

/// Parser output. `total_rows` counts every non-empty data row, including
/// rows that produced no numeric values; downstream denominators need the
/// raw count, not the count of rows with values.
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub records: Vec<WorkroomRecord>,
    pub total_rows: usize,
}

pub fn parse_file(path: &Path, mode: SchemaMode) -> anyhow::Result<ParsedSheet> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => parse_csv(path, mode),
        "xlsx" | "xls" => parse_workbook(path, mode),
        "json" => parse_json(path, mode),
        other => bail!("unsupported file type '.{other}' for {}", path.display()),
    }
}

fn parse_csv(path: &Path, mode: SchemaMode) -> anyhow::Result<ParsedSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    parse_rows(rows, mode)
}

fn parse_workbook(path: &Path, mode: SchemaMode) -> anyhow::Result<ParsedSheet> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("{} has no worksheets", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet '{sheet_name}'"))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    parse_rows(rows, mode)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        other => other.to_string(),
    }
}

/// Core row-oriented parse, shared by the CSV and workbook paths.
pub fn parse_rows(rows: Vec<Vec<String>>, mode: SchemaMode) -> anyhow::Result<ParsedSheet> {
    if rows.len() < 2 {
        bail!("file must contain a header row and at least one data row");
    }

    let headers: Vec<String> = rows[0]
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect();

    let mut records = Vec::new();
    let mut total_rows = 0usize;

    for row in rows.iter().skip(1) {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        total_rows += 1;
        let record = match mode {
            SchemaMode::Visual => visual_record(&headers, row),
            SchemaMode::Survey => survey_record(&headers, row),
        };
        records.push(record);
    }

    if total_rows == 0 {
        bail!("file must contain a header row and at least one data row");
    }

    Ok(ParsedSheet {
        records,
        total_rows,
    })
}

fn cell<'a>(row: &'a [String], index: Option<usize>) -> &'a str {
    index
        .and_then(|idx| row.get(idx))
        .map(|value| value.as_str())
        .unwrap_or("")
}

fn visual_record(headers: &[String], row: &[String]) -> WorkroomRecord {
    WorkroomRecord {
        id: Uuid::new_v4(),
        name: normalize_workroom_name(cell(row, columns::NAME.resolve(headers))),
        store: cell(row, columns::STORE.resolve(headers)).trim().to_string(),
        sales: parse_required(cell(row, columns::SALES.resolve(headers))),
        labor_po: parse_required(cell(row, columns::LABOR_PO.resolve(headers))),
        vendor_debit: parse_required(cell(row, columns::VENDOR_DEBIT.resolve(headers))),
        cycle_time: parse_optional(cell(row, columns::CYCLE_TIME.resolve(headers))),
        completed: parse_optional(cell(row, columns::COMPLETED.resolve(headers))),
        jobs_work_cycle_time: parse_optional(cell(
            row,
            columns::JOBS_WORK_CYCLE_TIME.resolve(headers),
        )),
        reschedule_rate: parse_optional(cell(row, columns::RESCHEDULE_RATE.resolve(headers))),
        get_it_right: parse_optional(cell(row, columns::GET_IT_RIGHT.resolve(headers))),
        details_cycle_time: parse_optional(cell(
            row,
            columns::DETAILS_CYCLE_TIME.resolve(headers),
        )),
        ..WorkroomRecord::default()
    }
}

fn survey_record(headers: &[String], row: &[String]) -> WorkroomRecord {
    let text = |index: Option<usize>| -> Option<String> {
        let value = cell(row, index).trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    };

    WorkroomRecord {
        id: Uuid::new_v4(),
        name: normalize_workroom_name(cell(row, columns::NAME.resolve(headers))),
        store: cell(row, columns::STORE.resolve(headers)).trim().to_string(),
        ltr_score: parse_optional(cell(row, columns::SURVEY_LTR.resolve(headers))),
        craft_score: parse_optional(cell(row, columns::CRAFT_SCORE.resolve(headers))),
        prof_score: parse_optional(cell(row, columns::PROF_SCORE.resolve(headers))),
        survey_date: text(columns::SURVEY_DATE.resolve(headers)),
        survey_comment: text(columns::SURVEY_COMMENT.resolve(headers)),
        labor_category: text(columns::LABOR_CATEGORY.resolve(headers)),
        ..WorkroomRecord::default()
    }
}

/// JSON uploads carry already-named fields; aliases from the legacy export
/// (`professionalScore`, `category`, ...) are accepted here and collapsed to
/// the canonical names.
#[derive(Debug, Deserialize)]
struct RawJsonRecord {
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    store: String,
    #[serde(default)]
    sales: f64,
    #[serde(default, alias = "laborPo", alias = "laborPO")]
    labor_po: f64,
    #[serde(default, alias = "vendorDebit")]
    vendor_debit: f64,
    #[serde(default, alias = "cycleTime")]
    cycle_time: Option<f64>,
    #[serde(default)]
    completed: Option<f64>,
    #[serde(default, alias = "jobsWorkCycleTime")]
    jobs_work_cycle_time: Option<f64>,
    #[serde(default, alias = "rescheduleRate")]
    reschedule_rate: Option<f64>,
    #[serde(default, alias = "getItRight")]
    get_it_right: Option<f64>,
    #[serde(default, alias = "detailsCycleTime")]
    details_cycle_time: Option<f64>,
    #[serde(default, alias = "ltrScore")]
    ltr_score: Option<f64>,
    #[serde(default, alias = "craftScore")]
    craft_score: Option<f64>,
    #[serde(default, alias = "profScore", alias = "professionalScore")]
    prof_score: Option<f64>,
    #[serde(default, alias = "surveyDate")]
    survey_date: Option<String>,
    #[serde(default, alias = "surveyComment")]
    survey_comment: Option<String>,
    #[serde(default, alias = "laborCategory", alias = "category")]
    labor_category: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for store, got {other}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct RawJsonUpload {
    workrooms: Option<Vec<RawJsonRecord>>,
    surveys: Option<Vec<RawJsonRecord>>,
}

fn parse_json(path: &Path, mode: SchemaMode) -> anyhow::Result<ParsedSheet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let upload: RawJsonUpload =
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?;

    let (raw, key) = match mode {
        SchemaMode::Visual => (upload.workrooms, "workrooms"),
        SchemaMode::Survey => (upload.surveys, "surveys"),
    };
    let raw = match raw {
        Some(records) => records,
        None => bail!("JSON upload is missing the top-level '{key}' array"),
    };

    let records: Vec<WorkroomRecord> = raw.into_iter().map(json_record).collect();
    let total_rows = records.len();

    Ok(ParsedSheet {
        records,
        total_rows,
    })
}

fn json_record(raw: RawJsonRecord) -> WorkroomRecord {
    WorkroomRecord {
        id: Uuid::new_v4(),
        name: normalize_workroom_name(&raw.name),
        store: raw.store.trim().to_string(),
        sales: raw.sales,
        labor_po: raw.labor_po,
        vendor_debit: raw.vendor_debit,
        cycle_time: raw.cycle_time,
        completed: raw.completed,
        jobs_work_cycle_time: raw.jobs_work_cycle_time,
        reschedule_rate: raw.reschedule_rate,
        get_it_right: raw.get_it_right,
        details_cycle_time: raw.details_cycle_time,
        ltr_score: raw.ltr_score,
        craft_score: raw.craft_score,
        prof_score: raw.prof_score,
        survey_date: raw.survey_date,
        survey_comment: raw.survey_comment,
        labor_category: raw.labor_category,
    }
}

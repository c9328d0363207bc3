//! Column resolution rules for the fixed spreadsheet templates.
//!
//! Each field resolves by an ordered rule: try a first-match substring search
//! over the lower-cased header row, then fall back to a literal column index
//! where the template guarantees one, then give up. Several columns have no
//! reliable header text in the export and are fixed-index only ("Cycle Time"
//! is always column 28, "Completed" always 19); the survey LTR score is always
//! column 11 regardless of headers because the external report format is fixed.

#[derive(Debug, Clone, Copy)]
pub enum Fallback {
    None,
    Fixed(usize),
    /// Fixed index used only when the sheet is wide enough to contain it.
    FixedIfWide { index: usize, min_cols: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub header_patterns: &'static [&'static str],
    pub fallback: Fallback,
}

impl ColumnRule {
    /// Resolve against an already lower-cased, trimmed header row.
    pub fn resolve(&self, headers: &[String]) -> Option<usize> {
        for (idx, header) in headers.iter().enumerate() {
            if self
                .header_patterns
                .iter()
                .any(|pattern| header.contains(*pattern))
            {
                return Some(idx);
            }
        }
        match self.fallback {
            Fallback::None => None,
            Fallback::Fixed(index) => Some(index),
            Fallback::FixedIfWide { index, min_cols } => {
                if headers.len() >= min_cols {
                    Some(index)
                } else {
                    None
                }
            }
        }
    }
}

pub const NAME: ColumnRule = ColumnRule {
    header_patterns: &["workroom", "name"],
    fallback: Fallback::Fixed(0),
};

// The export sometimes omits a "Store" header; when the sheet has more than
// four columns the store number sits in column 4.
pub const STORE: ColumnRule = ColumnRule {
    header_patterns: &["store"],
    fallback: Fallback::FixedIfWide {
        index: 4,
        min_cols: 5,
    },
};

pub const SALES: ColumnRule = ColumnRule {
    header_patterns: &["sales", "revenue", "amount", "dollar", "$"],
    fallback: Fallback::None,
};

pub const LABOR_PO: ColumnRule = ColumnRule {
    header_patterns: &["labor po", "labor", "po total"],
    fallback: Fallback::None,
};

pub const VENDOR_DEBIT: ColumnRule = ColumnRule {
    header_patterns: &["vendor debit", "debit", "chargeback"],
    fallback: Fallback::None,
};

// Fixed-index only; the template has no usable header for these.
pub const CYCLE_TIME: ColumnRule = ColumnRule {
    header_patterns: &[],
    fallback: Fallback::Fixed(28),
};

pub const COMPLETED: ColumnRule = ColumnRule {
    header_patterns: &[],
    fallback: Fallback::Fixed(19),
};

pub const JOBS_WORK_CYCLE_TIME: ColumnRule = ColumnRule {
    header_patterns: &[],
    fallback: Fallback::Fixed(29),
};

pub const RESCHEDULE_RATE: ColumnRule = ColumnRule {
    header_patterns: &["reschedule"],
    fallback: Fallback::None,
};

pub const GET_IT_RIGHT: ColumnRule = ColumnRule {
    header_patterns: &["get it right", "gir"],
    fallback: Fallback::None,
};

pub const DETAILS_CYCLE_TIME: ColumnRule = ColumnRule {
    header_patterns: &["details cycle"],
    fallback: Fallback::None,
};

// Survey columns. LTR is always column L of the external report.
pub const SURVEY_LTR: ColumnRule = ColumnRule {
    header_patterns: &[],
    fallback: Fallback::Fixed(11),
};

pub const CRAFT_SCORE: ColumnRule = ColumnRule {
    header_patterns: &["craft"],
    fallback: Fallback::None,
};

pub const PROF_SCORE: ColumnRule = ColumnRule {
    header_patterns: &["professional", "prof"],
    fallback: Fallback::None,
};

pub const SURVEY_DATE: ColumnRule = ColumnRule {
    header_patterns: &["date"],
    fallback: Fallback::None,
};

pub const SURVEY_COMMENT: ColumnRule = ColumnRule {
    header_patterns: &["comment", "feedback"],
    fallback: Fallback::None,
};

pub const LABOR_CATEGORY: ColumnRule = ColumnRule {
    header_patterns: &["category"],
    fallback: Fallback::None,
};

/// Strip currency symbols, separators and whitespace, then parse. Required
/// operational fields treat unparseable cells as 0.
pub fn parse_required(cell: &str) -> f64 {
    parse_optional(cell).unwrap_or(0.0)
}

/// Optional fields keep the absent/zero distinction: an empty or non-numeric
/// cell is missing, a literal "0" is an observed zero.
pub fn parse_optional(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '¥' | ',') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Deliberate data-cleaning rule carried over from the source exports.
pub fn normalize_workroom_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed == "Panama Cit" {
        return "Panama City".to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn sales_matches_any_synonym() {
        let hdrs = headers(&["workroom", "x", "y", "sales $"]);
        assert_eq!(SALES.resolve(&hdrs), Some(3));
        let hdrs = headers(&["workroom", "total dollar value"]);
        assert_eq!(SALES.resolve(&hdrs), Some(1));
        let hdrs = headers(&["workroom", "x"]);
        assert_eq!(SALES.resolve(&hdrs), None);
    }

    #[test]
    fn store_falls_back_to_column_four_on_wide_sheets() {
        let hdrs = headers(&["workroom", "sales $", "a", "b", "c"]);
        assert_eq!(STORE.resolve(&hdrs), Some(4));
        let hdrs = headers(&["workroom", "sales $", "a", "b"]);
        assert_eq!(STORE.resolve(&hdrs), None);
    }

    #[test]
    fn store_header_wins_over_fallback() {
        let hdrs = headers(&["workroom", "store #", "a", "b", "c"]);
        assert_eq!(STORE.resolve(&hdrs), Some(1));
    }

    #[test]
    fn fixed_index_fields_ignore_headers() {
        let mut hdrs = vec![String::new(); 32];
        hdrs[3] = "cycle time".to_string();
        assert_eq!(CYCLE_TIME.resolve(&hdrs), Some(28));
        assert_eq!(COMPLETED.resolve(&hdrs), Some(19));
        assert_eq!(SURVEY_LTR.resolve(&hdrs), Some(11));
    }

    #[test]
    fn currency_coercion() {
        assert_eq!(parse_required("$1,234.50"), 1234.5);
        assert_eq!(parse_required("€ 99"), 99.0);
        assert_eq!(parse_required("n/a"), 0.0);
        assert_eq!(parse_required(""), 0.0);
        assert_eq!(parse_required("-450"), -450.0);
    }

    #[test]
    fn optional_keeps_zero_distinct_from_missing() {
        assert_eq!(parse_optional("0"), Some(0.0));
        assert_eq!(parse_optional(""), None);
        assert_eq!(parse_optional("  "), None);
        assert_eq!(parse_optional("abc"), None);
    }

    #[test]
    fn panama_city_typo_is_corrected() {
        assert_eq!(normalize_workroom_name("Panama Cit"), "Panama City");
        assert_eq!(normalize_workroom_name(" Panama Cit "), "Panama City");
        assert_eq!(normalize_workroom_name("Panama City"), "Panama City");
        assert_eq!(normalize_workroom_name("Tampa"), "Tampa");
    }
}

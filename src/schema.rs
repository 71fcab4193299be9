//! Required-field checks for form submissions and uploaded tables.

use tracing::{debug, info};

use crate::{
    Error, Result,
    codec::UploadedTable,
    model::{RawRecord, fields},
};

pub const REQUIRED_COLUMNS: [&str; 7] = [
    fields::AMOUNT,
    fields::MERCHANT_CATEGORY,
    fields::DEVICE_TYPE,
    fields::DISTANCE_FROM_HOME_KM,
    fields::IS_FOREIGN,
    fields::IS_HIGH_RISK_MERCHANT,
    fields::HAS_HISTORY_OF_CHARGEBACK,
];

/// Fields a form submission must carry as finite, non-negative numbers.
pub const NON_NEGATIVE_FIELDS: [&str; 2] = [fields::AMOUNT, fields::DISTANCE_FROM_HOME_KM];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Populated,
    /// Every cell blank; dropped silently.
    Vacuous,
}

/// Table rows that survived the structural checks, keyed by file line.
#[derive(Debug, Clone, Default)]
pub struct ValidatedTable {
    pub rows: Vec<(usize, RawRecord)>,
    pub vacuous_rows: usize,
}

/// Names from `required` absent in `columns`, in `required` order.
pub fn missing_columns(columns: &[String], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !columns.iter().any(|c| c.as_str() == **name))
        .map(|name| name.to_string())
        .collect()
}

pub fn classify_row(row: &RawRecord) -> RowClass {
    if row.values().all(|v| v.trim().is_empty()) {
        RowClass::Vacuous
    } else {
        RowClass::Populated
    }
}

/// Gate for the single-transaction path.
pub fn validate_record(record: &RawRecord) -> Result<()> {
    let present: Vec<String> = record.keys().cloned().collect();
    let missing = missing_columns(&present, &REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(Error::MissingColumns { columns: missing });
    }

    for name in NON_NEGATIVE_FIELDS {
        let raw = record.get(name).map(|v| v.trim()).unwrap_or_default();
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => {}
            _ => return Err(Error::out_of_range(name, raw)),
        }
    }
    Ok(())
}

/// Gate for the batch path: column set first, then vacuous-row removal.
pub fn validate_table(table: &UploadedTable) -> Result<ValidatedTable> {
    let missing = missing_columns(&table.columns, &REQUIRED_COLUMNS);
    if !missing.is_empty() {
        info!("Rejecting table, missing columns: {:?}", missing);
        return Err(Error::MissingColumns { columns: missing });
    }

    let mut validated = ValidatedTable::default();
    for row in &table.rows {
        match classify_row(&row.record) {
            RowClass::Populated => validated.rows.push((row.line, row.record.clone())),
            RowClass::Vacuous => validated.vacuous_rows += 1,
        }
    }

    if validated.rows.is_empty() {
        return Err(Error::EmptyBatch);
    }

    debug!(
        "Table validated: {} rows kept, {} vacuous",
        validated.rows.len(),
        validated.vacuous_rows
    );
    Ok(validated)
}

//! Delimited-text decoding of uploaded tables and encoding of scored results.

use std::collections::HashSet;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::debug;

use crate::{
    Error, Result,
    model::{PredictionResult, RawRecord, fields},
    normalize::{UserIdPolicy, cell, normalize, parse_decimal, parse_flag},
    schema,
};

/// Header of an exported result file, in column order.
pub const EXPORT_COLUMNS: [&str; 12] = [
    fields::USER_ID,
    fields::AMOUNT,
    fields::HOUR,
    fields::DAY_OF_WEEK,
    fields::MERCHANT_CATEGORY,
    fields::DEVICE_TYPE,
    fields::DISTANCE_FROM_HOME_KM,
    fields::IS_FOREIGN,
    fields::IS_HIGH_RISK_MERCHANT,
    fields::HAS_HISTORY_OF_CHARGEBACK,
    fields::FRAUD_PROBABILITY,
    fields::IS_FRAUD,
];

/// One data row of an upload and the file line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub line: usize,
    pub record: RawRecord,
}

/// A parsed upload: the header plus one raw record per data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadedTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

/// Parses delimited text with a header row. Only structure is checked here.
///
/// A record whose width differs from the header is accepted only when every
/// cell in it is blank; it then reads as a row of empty cells.
pub fn decode(bytes: &[u8]) -> Result<UploadedTable> {
    if ends_inside_quotes(bytes) {
        return Err(Error::malformed("unterminated quoted field"));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| Error::malformed(format!("header: {}", e)))?
        .clone();

    let columns: Vec<String> = headers
        .iter()
        .map(|h| h.trim_matches('\u{feff}').trim().to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(String::is_empty) {
        return Err(Error::malformed("no header row"));
    }

    let mut seen = HashSet::new();
    for column in &columns {
        if column.is_empty() {
            return Err(Error::malformed("header contains an empty column name"));
        }
        if !seen.insert(column.as_str()) {
            return Err(Error::malformed(format!("duplicate column '{}'", column)));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::malformed(format!("row {}: {}", index + 1, e)))?;
        let line = record
            .position()
            .and_then(|p| usize::try_from(p.line()).ok())
            .unwrap_or(index + 2);

        let blank = record.iter().all(str::is_empty);
        if record.len() != columns.len() && !blank {
            return Err(Error::malformed(format!(
                "line {}: expected {} fields, found {}",
                line,
                columns.len(),
                record.len()
            )));
        }

        let record: RawRecord = if blank {
            columns.iter().map(|c| (c.clone(), String::new())).collect()
        } else {
            columns
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect()
        };
        rows.push(TableRow { line, record });
    }

    debug!("Decoded table with {} columns and {} rows", columns.len(), rows.len());
    Ok(UploadedTable { columns, rows })
}

/// True when the input stops inside a quoted field, which the reader
/// would otherwise close silently at end of input.
fn ends_inside_quotes(bytes: &[u8]) -> bool {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    let mut in_quotes = false;
    let mut field_start = true;
    let mut iter = bytes.iter().peekable();
    while let Some(&b) = iter.next() {
        if in_quotes {
            if b == b'"' {
                if iter.peek() == Some(&&b'"') {
                    iter.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match b {
            b',' | b'\n' | b'\r' => field_start = true,
            b'"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            _ => field_start = false,
        }
    }
    in_quotes
}

/// Writes results as delimited text under [`EXPORT_COLUMNS`].
pub fn encode(results: &[PredictionResult]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for result in results {
        writer.write_record(result_cells(result))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::internal(format!("flushing export: {}", e)))?;
    debug!("Encoded {} results into {} bytes", results.len(), bytes.len());
    Ok(bytes)
}

/// Reads a file produced by [`encode`] back into results.
pub fn decode_results(bytes: &[u8]) -> Result<Vec<PredictionResult>> {
    let table = decode(bytes)?;
    let missing = schema::missing_columns(&table.columns, &EXPORT_COLUMNS);
    if !missing.is_empty() {
        return Err(Error::MissingColumns { columns: missing });
    }

    table
        .rows
        .iter()
        .map(|TableRow { record: row, .. }| {
            let transaction = normalize(row, &UserIdPolicy::PassThrough)?;
            let probability = cell(row, fields::FRAUD_PROBABILITY).unwrap_or_default();
            let is_fraud = cell(row, fields::IS_FRAUD).unwrap_or_default();
            Ok(PredictionResult {
                transaction,
                fraud_probability: parse_decimal(fields::FRAUD_PROBABILITY, probability)?,
                is_fraud: parse_flag(fields::IS_FRAUD, is_fraud)?,
            })
        })
        .collect()
}

fn result_cells(result: &PredictionResult) -> [String; 12] {
    let tx = &result.transaction;
    [
        tx.user_id.as_ref().map(ToString::to_string).unwrap_or_default(),
        format!("{:.2}", tx.amount),
        tx.hour.to_string(),
        tx.day_of_week.index().to_string(),
        tx.merchant_category.to_string(),
        tx.device_type.to_string(),
        format!("{:.2}", tx.distance_from_home_km),
        flag_cell(tx.is_foreign),
        flag_cell(tx.is_high_risk_merchant),
        flag_cell(tx.has_history_of_chargeback),
        result.fraud_probability.to_string(),
        result.is_fraud.to_string(),
    ]
}

fn flag_cell(value: bool) -> String {
    u8::from(value).to_string()
}

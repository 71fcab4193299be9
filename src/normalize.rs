//! Coercion of raw record text into typed, bounded transaction inputs.

use crate::{
    Error, Result,
    model::{DayOfWeek, DeviceType, MerchantCategory, RawRecord, TransactionInput, UserId, fields},
};
use tracing::{debug, warn};

/// How a record without an identifier is treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdPolicy {
    /// Single-transaction path: fill in a stable placeholder.
    Placeholder(UserId),
    /// Batch path: keep whatever the row carries, including nothing.
    PassThrough,
}

/// A batch row left out of the submission, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedRow {
    /// Line in the uploaded file where the row starts; the header is line 1.
    pub row: usize,
    pub reason: Error,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub inputs: Vec<TransactionInput>,
    pub skipped: Vec<SkippedRow>,
}

pub fn normalize(raw: &RawRecord, policy: &UserIdPolicy) -> Result<TransactionInput> {
    let user_id = match (cell(raw, fields::USER_ID).and_then(UserId::parse), policy) {
        (Some(id), _) => Some(id),
        (None, UserIdPolicy::Placeholder(placeholder)) => Some(placeholder.clone()),
        (None, UserIdPolicy::PassThrough) => None,
    };

    Ok(TransactionInput {
        user_id,
        amount: non_negative(raw, fields::AMOUNT)?,
        hour: hour(raw)?,
        day_of_week: day_of_week(raw)?,
        merchant_category: choice::<MerchantCategory>(raw, fields::MERCHANT_CATEGORY, "a merchant category")?,
        device_type: choice::<DeviceType>(raw, fields::DEVICE_TYPE, "a device type")?,
        distance_from_home_km: non_negative(raw, fields::DISTANCE_FROM_HOME_KM)?,
        is_foreign: flag(raw, fields::IS_FOREIGN)?,
        is_high_risk_merchant: flag(raw, fields::IS_HIGH_RISK_MERCHANT)?,
        has_history_of_chargeback: flag(raw, fields::HAS_HISTORY_OF_CHARGEBACK)?,
    })
}

/// Normalizes every row, keeping the order of the rows that succeed.
/// Failing rows are collected with their row number instead of aborting.
pub fn normalize_batch<I>(rows: I) -> NormalizedBatch
where
    I: IntoIterator<Item = (usize, RawRecord)>,
{
    let mut batch = NormalizedBatch::default();
    for (row, record) in rows {
        match normalize(&record, &UserIdPolicy::PassThrough) {
            Ok(input) => batch.inputs.push(input),
            Err(reason) => {
                warn!("Skipping row {}: {}", row, reason);
                batch.skipped.push(SkippedRow { row, reason });
            }
        }
    }
    debug!(
        "Normalized {} rows, skipped {}",
        batch.inputs.len(),
        batch.skipped.len()
    );
    batch
}

/// Trimmed cell text; blank and absent cells are both `None`.
pub(crate) fn cell<'a>(raw: &'a RawRecord, name: &str) -> Option<&'a str> {
    raw.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub(crate) fn parse_decimal(name: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::coercion(name, text, "a number"))
}

pub(crate) fn parse_flag(name: &str, text: &str) -> Result<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "yes" => Ok(true),
        "0" | "0.0" | "false" | "no" => Ok(false),
        _ => Err(Error::coercion(name, text, "0 or 1")),
    }
}

/// Whole numbers, also accepting an integral decimal such as `14.0`.
fn parse_whole(name: &str, text: &str) -> Result<i64> {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err(Error::coercion(name, text, "a whole number")),
    }
}

fn required<'a>(raw: &'a RawRecord, name: &str) -> Result<&'a str> {
    cell(raw, name).ok_or_else(|| Error::coercion(name, "", "a value"))
}

fn non_negative(raw: &RawRecord, name: &str) -> Result<f64> {
    let value = parse_decimal(name, required(raw, name)?)?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::out_of_range(name, value));
    }
    Ok(value)
}

fn hour(raw: &RawRecord) -> Result<u8> {
    let Some(text) = cell(raw, fields::HOUR) else {
        return Ok(0);
    };
    let value = parse_whole(fields::HOUR, text)?;
    u8::try_from(value)
        .ok()
        .filter(|h| *h <= 23)
        .ok_or_else(|| Error::out_of_range(fields::HOUR, value))
}

fn day_of_week(raw: &RawRecord) -> Result<DayOfWeek> {
    let Some(text) = cell(raw, fields::DAY_OF_WEEK) else {
        return Ok(DayOfWeek::Monday);
    };
    match parse_whole(fields::DAY_OF_WEEK, text) {
        Ok(value) => u8::try_from(value)
            .ok()
            .and_then(|v| DayOfWeek::try_from(v).ok())
            .ok_or_else(|| Error::out_of_range(fields::DAY_OF_WEEK, value)),
        Err(_) => DayOfWeek::from_name(text)
            .ok_or_else(|| Error::coercion(fields::DAY_OF_WEEK, text, "a weekday")),
    }
}

fn choice<T: std::str::FromStr>(raw: &RawRecord, name: &str, expected: &'static str) -> Result<T> {
    let text = required(raw, name)?;
    text.parse::<T>()
        .map_err(|_| Error::coercion(name, text, expected))
}

fn flag(raw: &RawRecord, name: &str) -> Result<bool> {
    parse_flag(name, required(raw, name)?)
}

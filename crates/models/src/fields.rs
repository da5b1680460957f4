//! Input normalisation shared by every entity: trimming, empty-to-null,
//! timestamp parsing, enum parsing and the tri-state [`Patch`] wrapper.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::ActiveEnum;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::errors::ModelError;

/// One field of a partial update.
///
/// A missing JSON key deserialises to `Absent` (via `#[serde(default)]` on the
/// containing struct), an explicit `null` to `Null`, anything else to `Value`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool { matches!(self, Patch::Absent) }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// Trimmed, non-empty text.
pub fn required_text(field: &str, raw: &str) -> Result<String, ModelError> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(ModelError::validation(format!("{field} is required")));
    }
    Ok(t.to_string())
}

/// Trimmed text; blank becomes `None`.
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC). Always returns UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTimeWithTimeZone, ModelError> {
    let t = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Ok(dt.with_timezone(&Utc).fixed_offset());
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    Err(ModelError::validation(format!("{field} must be an RFC 3339 timestamp or YYYY-MM-DD date")))
}

pub fn parse_enum<E>(field: &str, raw: &str) -> Result<E, ModelError>
where
    E: ActiveEnum<Value = String>,
{
    let t = raw.trim();
    E::try_from_value(&t.to_string()).map_err(|_| {
        ModelError::validation(format!(
            "{field} must be one of: {}",
            E::values().join(", ")
        ))
    })
}

/// Blank is treated as "not supplied".
pub fn optional_uuid(field: &str, raw: Option<&str>) -> Result<Option<Uuid>, ModelError> {
    match optional_text(raw) {
        None => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(|_| ModelError::validation(format!("{field} must be a UUID"))),
    }
}

pub fn patch_required_text(field: &str, p: Patch<String>) -> Result<Option<String>, ModelError> {
    match p {
        Patch::Absent => Ok(None),
        Patch::Null => Err(ModelError::validation(format!("{field} cannot be cleared"))),
        Patch::Value(v) => required_text(field, &v).map(Some),
    }
}

/// Outer `None` leaves the column untouched; `Some(None)` clears it.
pub fn patch_optional_text(p: Patch<String>) -> Option<Option<String>> {
    match p {
        Patch::Absent => None,
        Patch::Null => Some(None),
        Patch::Value(v) => Some(optional_text(Some(&v))),
    }
}

pub fn patch_enum<E>(field: &str, p: Patch<String>) -> Result<Option<E>, ModelError>
where
    E: ActiveEnum<Value = String>,
{
    match p {
        Patch::Absent => Ok(None),
        Patch::Null => Err(ModelError::validation(format!("{field} cannot be cleared"))),
        Patch::Value(v) => parse_enum(field, &v).map(Some),
    }
}

pub fn patch_required_timestamp(
    field: &str,
    p: Patch<String>,
) -> Result<Option<DateTimeWithTimeZone>, ModelError> {
    match p {
        Patch::Absent => Ok(None),
        Patch::Null => Err(ModelError::validation(format!("{field} cannot be cleared"))),
        Patch::Value(v) => parse_timestamp(field, &v).map(Some),
    }
}

pub fn patch_optional_timestamp(
    field: &str,
    p: Patch<String>,
) -> Result<Option<Option<DateTimeWithTimeZone>>, ModelError> {
    match p {
        Patch::Absent => Ok(None),
        Patch::Null => Ok(Some(None)),
        Patch::Value(v) if v.trim().is_empty() => Ok(Some(None)),
        Patch::Value(v) => parse_timestamp(field, &v).map(|t| Some(Some(t))),
    }
}

pub fn patch_optional_uuid(field: &str, p: Patch<String>) -> Result<Option<Option<Uuid>>, ModelError> {
    match p {
        Patch::Absent => Ok(None),
        Patch::Null => Ok(Some(None)),
        Patch::Value(v) => optional_uuid(field, Some(&v)).map(Some),
    }
}

/// Current UTC time in the column representation.
pub fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

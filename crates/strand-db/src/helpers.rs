//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing logic.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use strand_core::enums::EntityKind;

use crate::error::DatabaseError;

/// Render a timestamp the way it is stored. Fixed-width, so TEXT ordering is time ordering.
#[must_use]
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00.000000Z"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional `YYYY-MM-DD` column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string is not a date.
pub fn parse_optional_date(s: Option<&str>) -> Result<Option<NaiveDate>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| DatabaseError::Query(format!("Failed to parse date '{s}': {e}"))),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all strand-core enums that use `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Parse a JSON TEXT column into a typed value.
///
/// # Errors
///
/// Returns `DatabaseError::Query` on invalid JSON.
pub fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

/// Parse a `json_group_array(...)` column. SQL NULL reads as an empty list.
///
/// # Errors
///
/// Returns `DatabaseError::Query` on invalid JSON.
pub fn parse_json_list<T: DeserializeOwned>(s: Option<&str>) -> Result<Vec<T>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => parse_json(s),
        _ => Ok(Vec::new()),
    }
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER column holding `0`/`1`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read the single row of an expected-unique query.
///
/// # Errors
///
/// Returns `DatabaseError::NotFound` on zero rows and
/// `DatabaseError::AmbiguousResult` on more than one.
pub async fn fetch_unique(
    mut rows: libsql::Rows,
    kind: &'static str,
    key: &str,
) -> Result<libsql::Row, DatabaseError> {
    let row = rows
        .next()
        .await?
        .ok_or_else(|| DatabaseError::not_found(kind, key))?;
    if rows.next().await?.is_some() {
        return Err(DatabaseError::AmbiguousResult {
            kind,
            key: key.to_string(),
        });
    }
    Ok(row)
}

/// Read the first column of a single-row `COUNT(*)` query.
///
/// # Errors
///
/// Returns `DatabaseError` if the query returned no row or a negative count.
pub async fn fetch_count(mut rows: libsql::Rows) -> Result<u64, DatabaseError> {
    let row = rows
        .next()
        .await?
        .ok_or_else(|| DatabaseError::Query("COUNT returned no row".into()))?;
    u64::try_from(row.get::<i64>(0)?)
        .map_err(|e| DatabaseError::Query(format!("negative count: {e}")))
}

/// Map `EntityKind` to the corresponding SQL table name.
///
/// Uses exhaustive match: adding a new `EntityKind` variant forces updating this.
#[must_use]
pub const fn entity_kind_to_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::TermInstance => "term_instances",
        EntityKind::StatementEdge => "statement_edges",
        EntityKind::Citation => "citations",
        EntityKind::Evidence => "evidences",
        EntityKind::Author => "authors",
        EntityKind::Modification => "modifications",
        EntityKind::Property => "properties",
    }
}

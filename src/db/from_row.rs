//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const LICENSE_COLS: &str = "id, license_key, user_type, expire_at, trial_started_at, max_devices, notes, latest_version, minimum_version, download_url, activation_code_id, created_at, updated_at";

pub const ACTIVATION_COLS: &str =
    "id, license_id, device_id, device_name, activated_at, last_seen_at";

pub const ACTIVATION_CODE_COLS: &str = "id, code, user_type, valid_days, max_devices, usage_limit, used_count, expires_at, notes, created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for License {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(License {
            id: row.get(0)?,
            license_key: row.get(1)?,
            user_type: parse_enum(row, 2, "user_type")?,
            expire_at: row.get(3)?,
            trial_started_at: row.get(4)?,
            max_devices: row.get(5)?,
            notes: row.get(6)?,
            latest_version: row.get(7)?,
            minimum_version: row.get(8)?,
            download_url: row.get(9)?,
            activation_code_id: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

impl FromRow for Activation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Activation {
            id: row.get(0)?,
            license_id: row.get(1)?,
            device_id: row.get(2)?,
            device_name: row.get(3)?,
            activated_at: row.get(4)?,
            last_seen_at: row.get(5)?,
        })
    }
}

impl FromRow for ActivationCode {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ActivationCode {
            id: row.get(0)?,
            code: row.get(1)?,
            user_type: parse_enum(row, 2, "user_type")?,
            valid_days: row.get(3)?,
            max_devices: row.get(4)?,
            usage_limit: row.get(5)?,
            used_count: row.get(6)?,
            expires_at: row.get(7)?,
            notes: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

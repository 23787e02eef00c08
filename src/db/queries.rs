use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior, params, types::Value};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    ACTIVATION_CODE_COLS, ACTIVATION_COLS, LICENSE_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    /// Use this for Option<T> where Some(v) = set to v, None = set to NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        self.fields.push(("updated_at", now().into()));
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Licenses ============

pub fn create_license(conn: &Connection, input: &CreateLicense) -> Result<License> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO licenses (id, license_key, user_type, expire_at, trial_started_at,
                               max_devices, notes, activation_code_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &id,
            &input.license_key,
            input.user_type.as_str(),
            input.expire_at,
            input.trial_started_at,
            input.max_devices,
            &input.notes,
            &input.activation_code_id,
            now,
            now
        ],
    )?;

    Ok(License {
        id,
        license_key: input.license_key.clone(),
        user_type: input.user_type,
        expire_at: input.expire_at,
        trial_started_at: input.trial_started_at,
        max_devices: input.max_devices,
        notes: input.notes.clone(),
        latest_version: None,
        minimum_version: None,
        download_url: None,
        activation_code_id: input.activation_code_id.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_license_by_key(conn: &Connection, license_key: &str) -> Result<Option<License>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM licenses WHERE license_key = ?1",
            LICENSE_COLS
        ),
        &[&license_key],
    )
}

/// Partial update of mutable license fields. `expire_at` is written
/// explicitly (including NULL) so a grant can be made non-expiring.
#[derive(Debug, Default)]
pub struct LicenseUpdate {
    pub user_type: Option<UserType>,
    /// Some(value) overwrites expire_at with value (None clears it);
    /// outer None leaves the column untouched.
    pub expire_at: Option<Option<i64>>,
    pub max_devices: Option<i64>,
    pub notes: Option<String>,
    pub activation_code_id: Option<String>,
}

pub fn update_license(conn: &Connection, id: &str, update: &LicenseUpdate) -> Result<bool> {
    let mut builder = UpdateBuilder::new("licenses", id)
        .set_opt("user_type", update.user_type.map(|t| t.as_str().to_string()))
        .set_opt("max_devices", update.max_devices)
        .set_opt("notes", update.notes.clone())
        .set_opt("activation_code_id", update.activation_code_id.clone());
    if let Some(expire_at) = update.expire_at {
        builder = builder.set_nullable("expire_at", expire_at);
    }
    builder.execute(conn)
}

/// Delete a license and its activations. The activations are removed
/// explicitly inside the same transaction; the FK cascade is a backstop.
pub fn delete_license(conn: &mut Connection, id: &str) -> Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute("DELETE FROM activations WHERE license_id = ?1", params![id])?;
    let deleted = tx.execute("DELETE FROM licenses WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

// ============ Activations ============

pub fn get_activation(
    conn: &Connection,
    license_id: &str,
    device_id: &str,
) -> Result<Option<Activation>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM activations WHERE license_id = ?1 AND device_id = ?2",
            ACTIVATION_COLS
        ),
        &[&license_id, &device_id],
    )
}

pub fn count_activations(conn: &Connection, license_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM activations WHERE license_id = ?1",
        params![license_id],
        |row| row.get(0),
    )
    .map_err(Into::into)
}

pub fn create_activation(
    conn: &Connection,
    license_id: &str,
    device_id: &str,
    device_name: Option<&str>,
) -> Result<Activation> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO activations (id, license_id, device_id, device_name, activated_at, last_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, license_id, device_id, device_name, now, now],
    )?;

    Ok(Activation {
        id,
        license_id: license_id.to_string(),
        device_id: device_id.to_string(),
        device_name: device_name.map(String::from),
        activated_at: now,
        last_seen_at: now,
    })
}

/// Refresh the liveness timestamp of an existing activation.
pub fn touch_activation(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "UPDATE activations SET last_seen_at = ?1 WHERE id = ?2",
        params![now(), id],
    )?;
    Ok(())
}

pub fn list_activations(conn: &Connection, license_id: &str) -> Result<Vec<Activation>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM activations WHERE license_id = ?1 ORDER BY activated_at, device_id",
            ACTIVATION_COLS
        ),
        &[&license_id],
    )
}

/// Idempotent: removing an absent binding is not an error.
pub fn delete_activation(conn: &Connection, license_id: &str, device_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM activations WHERE license_id = ?1 AND device_id = ?2",
        params![license_id, device_id],
    )?;
    Ok(deleted > 0)
}

/// Result of binding a device to a license.
pub enum ActivationOutcome {
    /// The device was already bound; its seen-time was refreshed.
    Existing(Activation),
    /// A new binding was created, consuming one quota slot.
    Created(Activation),
}

/// Atomically bind a device to a license, enforcing the device quota.
///
/// The transaction uses IMMEDIATE mode so the SQLite write lock is taken
/// at BEGIN, serializing the count-then-insert sequence across concurrent
/// requests. Two racing activations for the last free slot cannot both
/// observe `count < max_devices`.
pub fn activate_device(
    conn: &mut Connection,
    license: &License,
    device_id: &str,
    device_name: Option<&str>,
) -> Result<ActivationOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: Option<Activation> = query_one(
        &tx,
        &format!(
            "SELECT {} FROM activations WHERE license_id = ?1 AND device_id = ?2",
            ACTIVATION_COLS
        ),
        &[&license.id.as_str(), &device_id],
    )?;

    if let Some(activation) = existing {
        // Re-activation does not consume quota.
        let now = now();
        tx.execute(
            "UPDATE activations SET last_seen_at = ?1 WHERE id = ?2",
            params![now, activation.id],
        )?;
        tx.commit()?;
        return Ok(ActivationOutcome::Existing(Activation {
            last_seen_at: now,
            ..activation
        }));
    }

    let count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM activations WHERE license_id = ?1",
        params![license.id],
        |row| row.get(0),
    )?;
    if count >= license.max_devices {
        return Err(AppError::DeviceLimitExceeded);
    }

    let id = gen_id();
    let now = now();
    tx.execute(
        "INSERT INTO activations (id, license_id, device_id, device_name, activated_at, last_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, license.id, device_id, device_name, now, now],
    )?;
    tx.commit()?;

    Ok(ActivationOutcome::Created(Activation {
        id,
        license_id: license.id.clone(),
        device_id: device_id.to_string(),
        device_name: device_name.map(String::from),
        activated_at: now,
        last_seen_at: now,
    }))
}

// ============ Activation Codes ============

pub fn create_activation_code(
    conn: &Connection,
    input: &CreateActivationCode,
) -> Result<ActivationCode> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO activation_codes (id, code, user_type, valid_days, max_devices,
                                       usage_limit, used_count, expires_at, notes,
                                       created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?10)",
        params![
            &id,
            &input.code,
            input.user_type.as_str(),
            input.valid_days,
            input.max_devices,
            input.usage_limit,
            input.expires_at,
            &input.notes,
            now,
            now
        ],
    )?;

    Ok(ActivationCode {
        id,
        code: input.code.clone(),
        user_type: input.user_type,
        valid_days: input.valid_days,
        max_devices: input.max_devices,
        usage_limit: input.usage_limit,
        used_count: 0,
        expires_at: input.expires_at,
        notes: input.notes.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_activation_code(conn: &Connection, code: &str) -> Result<Option<ActivationCode>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM activation_codes WHERE code = ?1",
            ACTIVATION_CODE_COLS
        ),
        &[&code],
    )
}

pub fn delete_activation_code(conn: &Connection, code: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM activation_codes WHERE code = ?1",
        params![code],
    )?;
    Ok(deleted > 0)
}

/// Increment `used_count`, guarded so the counter never passes
/// `usage_limit`. Returns false when the code is already depleted.
pub fn increment_activation_code_usage(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE activation_codes
         SET used_count = used_count + 1, updated_at = ?1
         WHERE id = ?2 AND (usage_limit IS NULL OR used_count < usage_limit)",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

/// Atomically redeem an activation code into a license grant or upgrade.
///
/// All steps run inside one IMMEDIATE transaction: code lookup, expiry
/// and depletion checks, license create-or-update, and the guarded usage
/// increment. The guard re-validates `used_count` at increment time, so
/// a concurrent redemption racing past the earlier check aborts here and
/// the whole unit rolls back.
pub fn redeem_activation_code(conn: &mut Connection, code: &str) -> Result<License> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let now_ts = now();

    let code_row: Option<ActivationCode> = query_one(
        &tx,
        &format!(
            "SELECT {} FROM activation_codes WHERE code = ?1",
            ACTIVATION_CODE_COLS
        ),
        &[&code],
    )?;
    let Some(code_row) = code_row else {
        return Err(AppError::ActivationCodeNotFound);
    };

    if let Some(expires_at) = code_row.expires_at
        && expires_at <= now_ts
    {
        return Err(AppError::ActivationCodeExpired);
    }

    if let Some(limit) = code_row.usage_limit
        && code_row.used_count >= limit
    {
        return Err(AppError::ActivationCodeDepleted);
    }

    let expire_at = code_row
        .valid_days
        .map(|days| now_ts + days * crate::clock::SECONDS_PER_DAY);

    let existing: Option<License> = query_one(
        &tx,
        &format!(
            "SELECT {} FROM licenses WHERE license_key = ?1",
            LICENSE_COLS
        ),
        &[&code],
    )?;

    let license_id = match existing {
        None => {
            // First redemption: the code string becomes the license key.
            let created = create_license(
                &tx,
                &CreateLicense {
                    license_key: code_row.code.clone(),
                    user_type: code_row.user_type,
                    expire_at,
                    trial_started_at: None,
                    max_devices: code_row.max_devices,
                    notes: Some("redeemed".to_string()),
                    activation_code_id: Some(code_row.id.clone()),
                },
            )?;
            created.id
        }
        Some(license) => {
            // Renewal/upgrade in place: overwrite the grant fields and
            // recompute (or clear) the expiry from redemption time.
            update_license(
                &tx,
                &license.id,
                &LicenseUpdate {
                    user_type: Some(code_row.user_type),
                    expire_at: Some(expire_at),
                    max_devices: Some(code_row.max_devices),
                    notes: None,
                    activation_code_id: Some(code_row.id.clone()),
                },
            )?;
            license.id
        }
    };

    if !increment_activation_code_usage(&tx, &code_row.id)? {
        return Err(AppError::ActivationCodeDepleted);
    }

    let license: Option<License> = query_one(
        &tx,
        &format!("SELECT {} FROM licenses WHERE id = ?1", LICENSE_COLS),
        &[&license_id.as_str()],
    )?;
    let license =
        license.ok_or_else(|| AppError::Internal("redeemed license vanished".to_string()))?;

    tx.commit()?;
    Ok(license)
}

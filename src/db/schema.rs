use rusqlite::Connection;

/// Initialize the database schema. Idempotent; called once at startup.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Redeemable grant templates. The code string doubles as the key
        -- of the license a redemption creates or upgrades.
        CREATE TABLE IF NOT EXISTS activation_codes (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            user_type TEXT NOT NULL CHECK (user_type IN ('trial', 'pro')),
            valid_days INTEGER,
            max_devices INTEGER NOT NULL DEFAULT 3,
            usage_limit INTEGER,
            used_count INTEGER NOT NULL DEFAULT 0,
            expires_at INTEGER,
            notes TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_activation_codes_code ON activation_codes(code);

        -- Licensing grants. license_key is immutable once created.
        CREATE TABLE IF NOT EXISTS licenses (
            id TEXT PRIMARY KEY,
            license_key TEXT NOT NULL UNIQUE,
            user_type TEXT NOT NULL CHECK (user_type IN ('trial', 'pro')),
            expire_at INTEGER,
            trial_started_at INTEGER,
            max_devices INTEGER NOT NULL DEFAULT 1,
            notes TEXT,
            latest_version TEXT,
            minimum_version TEXT,
            download_url TEXT,
            activation_code_id TEXT REFERENCES activation_codes(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_licenses_key ON licenses(license_key);
        CREATE INDEX IF NOT EXISTS idx_licenses_code ON licenses(activation_code_id);

        -- Device bindings. A device is bound to a given license at most
        -- once; re-activation refreshes last_seen_at.
        CREATE TABLE IF NOT EXISTS activations (
            id TEXT PRIMARY KEY,
            license_id TEXT NOT NULL REFERENCES licenses(id) ON DELETE CASCADE,
            device_id TEXT NOT NULL,
            device_name TEXT,
            activated_at INTEGER NOT NULL,
            last_seen_at INTEGER NOT NULL,
            UNIQUE(license_id, device_id)
        );
        -- Note: UNIQUE(license_id, device_id) creates the implicit index
        -- used for per-device lookups.
        CREATE INDEX IF NOT EXISTS idx_activations_license_time ON activations(license_id, activated_at);
        "#,
    )?;
    Ok(())
}

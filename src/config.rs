use std::env;

/// Process configuration, loaded once at startup and handed to the
/// components that need it. The signing secret and version defaults are
/// injected into the signer/issuer at construction; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub secret_key: String,
    pub trial_days: i64,
    pub latest_version: String,
    pub minimum_version: String,
    pub download_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let trial_days: i64 = env::var("KEYWARDEN_TRIAL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|d| *d >= 1)
            .unwrap_or(15);

        Self {
            host,
            port,
            database_path: env::var("KEYWARDEN_DATABASE_PATH")
                .unwrap_or_else(|_| "keywarden.db".to_string()),
            secret_key: env::var("KEYWARDEN_SECRET_KEY")
                .unwrap_or_else(|_| "change-me".to_string()),
            trial_days,
            latest_version: env::var("KEYWARDEN_LATEST_VERSION")
                .unwrap_or_else(|_| "1.0.0".to_string()),
            minimum_version: env::var("KEYWARDEN_MINIMUM_VERSION")
                .unwrap_or_else(|_| "1.0.0".to_string()),
            download_url: env::var("KEYWARDEN_DOWNLOAD_URL")
                .unwrap_or_else(|_| "https://example.com/downloads/latest".to_string()),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

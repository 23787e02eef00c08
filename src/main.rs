use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keywarden::clock;
use keywarden::config::Config;
use keywarden::db::{AppState, create_pool, init_db, queries};
use keywarden::handlers;
use keywarden::models::{CreateActivationCode, CreateLicense, UserType};
use keywarden::payload::{IssuerDefaults, PayloadIssuer};
use keywarden::signing::Signer;

#[derive(Parser, Debug)]
#[command(name = "keywarden")]
#[command(about = "Machine-bound license and activation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service
    Serve,

    /// Create a license (operator provisioning)
    CreateLicense {
        /// License type: trial or pro
        user_type: String,

        /// Custom license key (defaults to a fresh UUID)
        #[arg(long)]
        key: Option<String>,

        /// Trial duration in days (for trial licenses)
        #[arg(long)]
        trial_days: Option<i64>,

        /// Maximum number of devices allowed
        #[arg(long, default_value_t = 1)]
        max_devices: i64,

        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Create a redeemable activation code
    CreateCode {
        code: String,

        /// Granted license type: trial or pro
        #[arg(long, default_value = "pro")]
        user_type: String,

        /// Lifetime of the granted license in days (omit for non-expiring)
        #[arg(long)]
        valid_days: Option<i64>,

        /// Device quota assigned on redemption
        #[arg(long, default_value_t = 3)]
        max_devices: i64,

        /// Maximum number of redemptions (omit for unlimited)
        #[arg(long)]
        usage_limit: Option<i64>,

        /// Days until the code itself stops being redeemable
        #[arg(long)]
        expires_in_days: Option<i64>,

        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete an activation code
    RevokeCode { code: String },
}

fn parse_user_type(raw: &str) -> UserType {
    raw.parse().unwrap_or_else(|e: String| {
        eprintln!("{}", e);
        std::process::exit(1);
    })
}

fn open_database(config: &Config) -> keywarden::db::DbPool {
    let pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    pool
}

fn format_expiry(expire_at: Option<i64>) -> String {
    match expire_at {
        Some(ts) => clock::datetime(ts).to_rfc3339(),
        None => "never".to_string(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateLicense {
            user_type,
            key,
            trial_days,
            max_devices,
            notes,
        } => {
            let user_type = parse_user_type(&user_type);
            let pool = open_database(&config);
            let conn = pool.get().expect("Failed to get connection");

            let now = clock::now_ts();
            let (expire_at, trial_started_at) = if user_type == UserType::Trial {
                let days = trial_days.unwrap_or(config.trial_days);
                (Some(clock::days_from_now(days)), Some(now))
            } else {
                (None, None)
            };

            let input = CreateLicense {
                license_key: key.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                user_type,
                expire_at,
                trial_started_at,
                max_devices,
                notes,
                activation_code_id: None,
            };
            let license =
                queries::create_license(&conn, &input).expect("Failed to create license");

            println!("License created:");
            println!("  Key: {}", license.license_key);
            println!("  Type: {}", license.user_type);
            println!("  Expire at: {}", format_expiry(license.expire_at));
            println!("  Max devices: {}", license.max_devices);
        }
        Command::CreateCode {
            code,
            user_type,
            valid_days,
            max_devices,
            usage_limit,
            expires_in_days,
            notes,
        } => {
            let user_type = parse_user_type(&user_type);
            let pool = open_database(&config);
            let conn = pool.get().expect("Failed to get connection");

            let input = CreateActivationCode {
                code,
                user_type,
                valid_days,
                max_devices,
                usage_limit,
                expires_at: expires_in_days.map(clock::days_from_now),
                notes,
            };
            let code = queries::create_activation_code(&conn, &input)
                .expect("Failed to create activation code");

            println!("Activation code created:");
            println!("  Code: {}", code.code);
            println!("  Grants: {}", code.user_type);
            println!(
                "  Valid days: {}",
                code.valid_days
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unlimited".to_string())
            );
            println!("  Max devices: {}", code.max_devices);
            println!(
                "  Usage limit: {}",
                code.usage_limit
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "unlimited".to_string())
            );
            println!("  Redeemable until: {}", format_expiry(code.expires_at));
        }
        Command::RevokeCode { code } => {
            let pool = open_database(&config);
            let conn = pool.get().expect("Failed to get connection");
            if queries::delete_activation_code(&conn, &code).expect("Failed to delete code") {
                println!("Activation code revoked: {}", code);
            } else {
                eprintln!("Activation code not found: {}", code);
                std::process::exit(1);
            }
        }
    }
}

async fn serve(config: Config) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keywarden=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = open_database(&config);

    let signer = Signer::new(&config.secret_key);
    let issuer = PayloadIssuer::new(
        signer,
        IssuerDefaults {
            latest_version: config.latest_version.clone(),
            minimum_version: config.minimum_version.clone(),
            download_url: config.download_url.clone(),
        },
    );

    let state = AppState {
        db: pool,
        issuer,
        trial_days: config.trial_days,
    };

    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Keywarden server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

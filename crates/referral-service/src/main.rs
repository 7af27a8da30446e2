//! Referral Service
//!
//! Command-line front end for generator registration, contributor redemption,
//! login and referral link rotation.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use referral_core::config::{ConfigOverlay, default_database_path, load_config};
use referral_core::db::unix_timestamp;
use referral_core::tracing_init::init_tracing;
use referral_service::auth::{Claims, JwtManager};
use referral_service::engine::{
    EngineConfig, ErrorKind, GeneratorRegistration, ReferralEngine, ReferralError,
};
use referral_service::storage::{ReferralDatabase, ReferralLink, User};

#[derive(Parser, Debug)]
#[command(name = "referral-service")]
#[command(version, about = "Referral service - generators, contributors and referral codes")]
struct Args {
    /// Path to SQLite database file.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Explicit JSON config file, layered over the global one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JWT secret key.
    #[arg(long, global = true, env = "REFERRAL_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a generator and print its first referral code and token.
    RegisterGenerator {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Redeem a referral code as a contributor.
    RegisterContributor {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Log in as a generator and print a session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Retire the active referral link and issue a new one.
    RotateLink {
        #[arg(long)]
        token: String,
    },
    /// Print the active referral link.
    ShowLink {
        #[arg(long)]
        token: String,
    },
    /// Validate a session token and print its claims.
    VerifyToken {
        #[arg(long)]
        token: String,
    },
}

/// Successful command result, printed as JSON.
#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Registration(GeneratorRegistration),
    User(User),
    Token { token: String },
    Link(ReferralLink),
    Claims(Claims),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    init_tracing("referral_service=info", args.log_json);

    let mut config = load_config(args.config.as_deref())?;
    config.merge(ConfigOverlay {
        jwt_secret: args.jwt_secret.clone(),
        database_path: args.db_path.clone(),
        ..ConfigOverlay::default()
    });
    config.validate()?;

    let db_path = match config.database_path.clone() {
        Some(path) => path,
        None => default_database_path()
            .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?,
    };
    info!(
        version = env!("CARGO_PKG_VERSION"),
        path = %db_path.display(),
        "Opening referral database"
    );
    let db = ReferralDatabase::open(&db_path).await?;

    let jwt = Arc::new(JwtManager::new(
        config.jwt_secret.as_bytes(),
        config.token_ttl_secs(),
    ));
    let engine_config = EngineConfig {
        referral_link_expires_at: config.referral_link_expires_at(unix_timestamp()),
    };
    let engine = ReferralEngine::new(db, jwt, engine_config);

    match run(&engine, args.command).await {
        Ok(output) => {
            print_json(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(report(&err)),
    }
}

async fn run(engine: &ReferralEngine, command: Command) -> Result<Output, ReferralError> {
    let output = match command {
        Command::RegisterGenerator { email, password } => {
            Output::Registration(engine.register_generator(&email, &password).await?)
        }
        Command::RegisterContributor { email, code } => {
            Output::User(engine.register_contributor(&email, &code).await?)
        }
        Command::Login { email, password } => Output::Token {
            token: engine.login(&email, &password).await?,
        },
        Command::RotateLink { token } => Output::Link(engine.rotate_referral_link(&token).await?),
        Command::ShowLink { token } => Output::Link(engine.active_referral_link(&token).await?),
        Command::VerifyToken { token } => Output::Claims(engine.authenticate(&token)?),
    };
    Ok(output)
}

#[allow(clippy::print_stdout)]
fn print_json(value: &Output) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Log a classified failure and pick the process exit code.
#[allow(clippy::print_stderr)]
fn report(err: &ReferralError) -> ExitCode {
    let kind = err.kind();
    if kind == ErrorKind::Infrastructure {
        error!(error = %err, "Command failed");
    } else {
        warn!(error = %err, status = err.http_status(), "Command rejected");
    }
    eprintln!("error: {}", err.public_message());
    ExitCode::from(kind.exit_code())
}

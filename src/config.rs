//! Process configuration, read from CLI flags with environment fallbacks.
//! `.env` is loaded by `main` before parsing so its values count as
//! environment variables.

use clap::{Parser, builder::NonEmptyStringValueParser};
use std::{num::NonZeroU32, path::PathBuf};

const DATABASE_FILE: &str = "database.json";
const DEBUG_DATABASE_FILE: &str = "database.debug.json";

#[derive(Debug, Clone, Parser)]
#[command(name = "chirpy", version, about = "Chirpy HTTP server")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Use a throwaway database that is deleted on shutdown
    #[arg(long)]
    pub debug: bool,

    /// Database file; defaults to `database.json` (`database.debug.json` with --debug)
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// HMAC secret for signing session tokens
    #[arg(
        long,
        env = "JWT_SECRET",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub jwt_secret: String,

    /// Key the payment provider presents on webhook calls
    #[arg(
        long,
        env = "POLKA_API_KEY",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub polka_api_key: String,

    /// Directory served under /app
    #[arg(long, env = "ASSETS_DIR", default_value = ".")]
    pub assets_dir: PathBuf,

    /// Bcrypt work factor for new password hashes
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST,
          value_parser = clap::value_parser!(u32).range(4..=31))]
    pub bcrypt_cost: u32,

    /// Requests per second accepted by the /api routes
    #[arg(long = "rate-limit", env = "RATE_LIMIT_PER_SECOND", default_value = "50")]
    pub rate_limit: NonZeroU32,
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        match &self.database_path {
            Some(path) => path.clone(),
            None if self.debug => PathBuf::from(DEBUG_DATABASE_FILE),
            None => PathBuf::from(DATABASE_FILE),
        }
    }

    /// Database file to delete on shutdown. Only the default debug database
    /// qualifies; an explicit `--database-path` is never removed.
    pub fn disposable_database(&self) -> Option<PathBuf> {
        (self.debug && self.database_path.is_none()).then(|| PathBuf::from(DEBUG_DATABASE_FILE))
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

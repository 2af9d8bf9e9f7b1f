use clap::Parser;
use database::Database;
use std::sync::Arc;

pub mod auth;
pub mod clock;
pub mod period;
pub mod response;

pub use clock::{Clock, FixedClock, SystemClock};
pub use period::{MonthQuery, MonthYear};
pub use response::{ApiFailure, ApiResponse};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:budgetbuddy.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "APP_PASSWORD")]
    pub app_password: Option<String>,

    /// User every request acts as while authentication is disabled.
    #[arg(long, env = "DEFAULT_USER_ID", default_value = "1")]
    pub default_user_id: i64,
}

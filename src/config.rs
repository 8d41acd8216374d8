use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::city::Resources;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server settings, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "city-builder", version, about = "City builder websocket server")]
pub struct Config {
    /// Address the websocket listener binds to.
    #[arg(long, env = "CITY_LISTEN_ADDR", default_value = "127.0.0.1:9100")]
    pub listen: String,

    /// Base URL of the buildings backend; buildings stay in memory when unset.
    #[arg(long, env = "CITY_API_URL")]
    pub api_url: Option<String>,

    #[arg(long, env = "CITY_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "CITY_START_BUDGET", default_value_t = 10_000)]
    pub budget: u64,

    #[arg(long, env = "CITY_START_MATERIALS", default_value_t = 1_000)]
    pub materials: u64,

    #[arg(long, env = "CITY_START_WORKERS", default_value_t = 20)]
    pub workers: u64,

    #[arg(long, env = "CITY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn starting_resources(&self) -> Resources {
        Resources::new(self.budget, self.materials, self.workers)
    }
}

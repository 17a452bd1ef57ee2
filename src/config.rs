//! Process configuration, extracted from the environment.

use serde::Deserialize;

/// Runtime configuration. Every field has a default so a bare `admitboard
/// pipeline` run works without any environment at all; `DATABASE_URL` is
/// the only thing that changes behavior (persistence on/off).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection string; when unset the corpus stays in memory.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Address the web service binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Path of the crawled post batch.
    #[serde(default = "default_posts_path")]
    pub posts_path: String,
    /// Base log level for the crate's own targets.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_posts_path() -> String {
    "data/studyabroad.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::providers::Env;
use figment::Figment;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::ConnectOptions;
use tracing::{info, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::extract::pipeline::{build_records, extract_batch};
use crate::extract::tables::ReferenceTables;
use crate::ingest::load_articles;
use crate::state::AppState;
use crate::{storage, web};

/// Main application struct containing all long-lived components.
pub struct App {
    config: Config,
    db_pool: Option<sqlx::PgPool>,
    state: AppState,
}

impl App {
    /// Load configuration, the reference tables, and (when configured) the
    /// database pool.
    pub async fn new() -> Result<Self> {
        let config = Self::load_config()?;

        // A broken vocabulary table is a build bug; refuse to start.
        let tables =
            Arc::new(ReferenceTables::load().context("reference table validation failed")?);

        let db_pool = match &config.database_url {
            Some(url) => {
                let connect_options = PgConnectOptions::from_str(url)
                    .context("failed to parse database URL")?
                    .log_statements(tracing::log::LevelFilter::Debug)
                    .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));
                let pool = PgPoolOptions::new()
                    .max_connections(4)
                    .acquire_timeout(Duration::from_secs(4))
                    .connect_with(connect_options)
                    .await
                    .context("failed to create database pool")?;
                info!(max_connections = 4, "database pool established");
                Some(pool)
            }
            None => {
                info!("no DATABASE_URL configured, corpus will stay in memory");
                None
            }
        };

        Ok(App {
            state: AppState::new(tables),
            config,
            db_pool,
        })
    }

    /// Extract configuration from the environment.
    pub fn load_config() -> Result<Config> {
        Figment::new()
            .merge(Env::raw())
            .extract()
            .context("failed to load config")
    }

    /// Dispatch a CLI command.
    pub async fn run(&self, command: &Command) -> Result<()> {
        match command {
            Command::Pipeline {
                input,
                skip_persist,
            } => {
                self.run_pipeline(input.as_deref(), *skip_persist).await?;
                Ok(())
            }
            Command::Serve { rebuild } => self.serve(*rebuild).await,
        }
    }

    /// Run classification and extraction over the configured post batch,
    /// persist the record streams, and refresh the in-memory snapshot.
    async fn run_pipeline(&self, input: Option<&str>, skip_persist: bool) -> Result<usize> {
        let path = input.unwrap_or(&self.config.posts_path);
        let articles = load_articles(Path::new(path))?;
        let extracted = extract_batch(self.state.tables.clone(), articles).await?;
        let records = build_records(&self.state.tables, &extracted);

        match (&self.db_pool, skip_persist) {
            (Some(pool), false) => storage::replace_corpus(pool, &records).await?,
            (Some(_), true) => info!("skipping persistence as requested"),
            (None, _) => {}
        }

        let count = records.len();
        self.state.replace_corpus(records).await;
        info!(articles = count, "pipeline complete");
        Ok(count)
    }

    /// Serve the ranking API. The corpus comes from Postgres when available,
    /// otherwise from a fresh pipeline run.
    async fn serve(&self, rebuild: bool) -> Result<()> {
        match (&self.db_pool, rebuild) {
            (Some(pool), false) => {
                let records = storage::load_corpus(pool).await?;
                if records.is_empty() {
                    warn!("persisted corpus is empty, did the pipeline run?");
                }
                self.state.replace_corpus(records).await;
            }
            _ => {
                self.run_pipeline(None, false).await?;
            }
        }

        let router = web::create_router(self.state.clone());
        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.config.bind_addr))?;
        info!(addr = %self.config.bind_addr, "serving ranking API");
        axum::serve(listener, router)
            .await
            .context("web server failed")?;
        Ok(())
    }
}

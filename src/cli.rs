//! Command-line interface.

use clap::{Parser, Subcommand, ValueEnum};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "admitboard", about = "Admission-post extraction and ranking")]
pub struct Args {
    /// Log output format.
    #[arg(long, value_enum, default_value = "pretty")]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the extraction pipeline over a post batch and persist the corpus.
    Pipeline {
        /// Post batch path, overriding POSTS_PATH.
        #[arg(long)]
        input: Option<String>,
        /// Skip writing to Postgres even when DATABASE_URL is set.
        #[arg(long)]
        skip_persist: bool,
    },
    /// Serve the ranking API over the persisted (or freshly built) corpus.
    Serve {
        /// Re-run the pipeline at startup instead of loading from Postgres.
        #[arg(long)]
        rebuild: bool,
    },
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use formcraft::config::Config;

mod cli;

#[derive(Parser)]
#[command(name = "fcraft")]
#[command(author, version, about = "formcraft - build, check, and validate form schemas")]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty schema
    Init {
        /// Form title (the file is named after it)
        title: String,

        /// Directory to create the schema in
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Print a schema's fields and conditions
    Show {
        /// Schema file (JSON or YAML)
        schema: PathBuf,
    },

    /// Add a field with default settings
    Add {
        /// Schema file (JSON or YAML)
        schema: PathBuf,

        /// Field type (text, email, multiSelect, repeatable, ...)
        #[arg(long, short = 't')]
        r#type: String,

        /// Label to use instead of the default
        #[arg(long)]
        label: Option<String>,

        /// Mark the field required
        #[arg(long)]
        required: bool,

        /// Add as a sub-field of this repeatable section
        #[arg(long)]
        parent: Option<String>,
    },

    /// Remove a top-level field
    Remove {
        /// Schema file (JSON or YAML)
        schema: PathBuf,

        /// Field id
        id: String,
    },

    /// Check a schema (bad patterns, self references, dangling conditions)
    Check {
        /// Schema file (JSON or YAML)
        schema: PathBuf,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// List the fields visible under a set of values
    Visible {
        /// Schema file (JSON or YAML)
        schema: PathBuf,

        /// Values file (JSON object keyed by field id)
        values: PathBuf,
    },

    /// Validate a set of values against a schema
    Validate {
        /// Schema file (JSON or YAML)
        schema: PathBuf,

        /// Values file (JSON object keyed by field id)
        values: PathBuf,

        /// Validate hidden fields too
        #[arg(long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_deref().unwrap_or("warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { title, dir } => cli::commands::init(&config, &title, dir),
        Commands::Show { schema } => cli::commands::show(&schema),
        Commands::Add { schema, r#type, label, required, parent } => {
            cli::commands::add(&config, &schema, &r#type, label, required, parent)
        }
        Commands::Remove { schema, id } => cli::commands::remove(&config, &schema, &id),
        Commands::Check { schema, strict } => cli::commands::check(&schema, strict),
        Commands::Visible { schema, values } => cli::commands::visible(&schema, &values),
        Commands::Validate { schema, values, all } => cli::commands::validate(&schema, &values, all),
    }
}

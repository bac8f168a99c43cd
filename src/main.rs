use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use parent_localizer::backend::{MemoryBackend, MemoryDataset, RecordStore};
use parent_localizer::config;
use parent_localizer::relation_schema::RelationRegistryConfig;
use parent_localizer::RelationResolver;

/// Parent Localizer - resolve the ancestor records a localization depends on
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a relation registry file
    CheckRegistry {
        /// Relation registry (YAML)
        #[arg(long)]
        registry: PathBuf,
    },
    /// Resolve one record against a dataset and print the resulting commands
    Resolve {
        /// Relation registry (YAML)
        #[arg(long)]
        registry: PathBuf,

        /// Dataset with tables and rows (YAML or JSON)
        #[arg(long)]
        dataset: PathBuf,

        /// Table of the record to resolve
        #[arg(long)]
        table: String,

        /// Identifier of the record to resolve
        #[arg(long)]
        id: i64,

        /// Target language
        #[arg(long)]
        language: u32,

        /// Ceiling on recursive walk steps
        #[arg(long, default_value_t = 100)]
        max_depth: u32,

        /// Identifier column
        #[arg(long, default_value = "uid")]
        id_field: String,
    },
}

fn main() {
    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    std::process::exit(exit_code(run(cli.command)));
}

/// Process exit status for a command outcome; errors are reported on stderr.
fn exit_code(result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::CheckRegistry { registry } => {
            let registry = RelationRegistryConfig::from_yaml_file(&registry)?.to_registry()?;
            log::info!("Relation registry is valid");
            println!("content table: {}", registry.content_table());
            println!("default relations: {}", registry.default_relation_count());
            println!("additional relations: {}", registry.additional_relation_count());
            for table in registry.child_tables() {
                println!("  {}", table);
            }
            Ok(())
        }
        Commands::Resolve {
            registry,
            dataset,
            table,
            id,
            language,
            max_depth,
            id_field,
        } => {
            let config = config::ResolverConfig::from_cli(config::CliConfig {
                max_depth,
                id_field,
            })?;
            let registry = RelationRegistryConfig::from_yaml_file(&registry)?.to_registry()?;
            let backend = MemoryBackend::from_dataset(
                MemoryDataset::from_file(&dataset)
                    .with_context(|| format!("loading dataset {}", dataset.display()))?,
            )
            .with_id_field(&config.id_field);

            let record = backend
                .fetch(&table, id)?
                .ok_or_else(|| anyhow!("record {}#{} not found", table, id))?;

            let resolver =
                RelationResolver::new(&registry, &backend, &backend, &backend).with_config(config);
            let resolution = resolver.resolve(&record, language, &table)?;
            log::info!(
                "Resolved {}#{}: {} pending command(s), {} implicit record(s), {} flushed",
                table,
                id,
                resolution.batch.len(),
                resolution.implicit.len(),
                resolution.flushed.len()
            );

            println!("{}", serde_json::to_string_pretty(&resolution)?);
            Ok(())
        }
    }
}

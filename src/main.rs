//! Command-line interface for metaobject-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # List every metaobject type, or describe one
//! metaobject-sync describe
//! metaobject-sync describe region --json
//!
//! # Validate a CSV file against the remote schema
//! metaobject-sync validate region --file regions.csv
//!
//! # Upsert rows, skipping those that fail validation
//! metaobject-sync upsert region --file regions.csv --validate
//!
//! # Export and summarize
//! metaobject-sync export region --output regions.csv
//! metaobject-sync stats region
//!
//! # Delete one record
//! metaobject-sync delete gid://shopify/Metaobject/123
//! ```
//!
//! Connection options can also come from `SHOPIFY_SHOP_DOMAIN`,
//! `SHOPIFY_ACCESS_TOKEN` and friends, including via a `.env` file.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use metaobject_loader::{
    coerce_to_schema, record_from_row, validate, LoaderConfig, MetaobjectLoader,
};
use metaobject_sync::config::parse_delimiter;
use metaobject_sync::{csv, ShopifyOpts};
use tracing::info;

#[derive(Parser)]
#[command(name = "metaobject-sync")]
#[command(about = "Synchronize CSV data with Shopify metaobjects")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe a metaobject type, or list all types when none is given
    Describe {
        /// Metaobject type
        type_name: Option<String>,

        /// Print the full descriptor as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        shopify: ShopifyOpts,
    },

    /// Validate CSV rows against a type's schema without writing
    Validate {
        /// Metaobject type
        type_name: String,

        /// CSV file whose first column is the handle
        #[arg(long)]
        file: PathBuf,

        /// CSV delimiter
        #[arg(long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,

        #[command(flatten)]
        shopify: ShopifyOpts,
    },

    /// Create or update one metaobject per CSV row
    Upsert {
        /// Metaobject type
        type_name: String,

        /// CSV file whose first column is the handle
        #[arg(long)]
        file: PathBuf,

        /// CSV delimiter
        #[arg(long, default_value = ",", value_parser = parse_delimiter)]
        delimiter: u8,

        /// Records per batch
        #[arg(long, default_value_t = metaobject_loader::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Skip rows that fail schema validation
        #[arg(long)]
        validate: bool,

        /// Read the file without writing anything
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        shopify: ShopifyOpts,
    },

    /// Write every metaobject of a type to CSV
    Export {
        /// Metaobject type
        type_name: String,

        /// Output CSV file
        #[arg(long)]
        output: PathBuf,

        /// Add metafield.<namespace>.<key> columns
        #[arg(long)]
        include_metafields: bool,

        /// Records per page
        #[arg(long, default_value_t = metaobject_loader::queries::MAX_PAGE_SIZE)]
        page_size: usize,

        #[command(flatten)]
        shopify: ShopifyOpts,
    },

    /// Print field and metafield statistics for a type as JSON
    Stats {
        /// Metaobject type
        type_name: String,

        #[command(flatten)]
        shopify: ShopifyOpts,
    },

    /// Delete a metaobject by id
    Delete {
        /// Metaobject id, e.g. gid://shopify/Metaobject/123
        id: String,

        #[command(flatten)]
        shopify: ShopifyOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Describe {
            type_name,
            json,
            shopify,
        } => {
            let loader = MetaobjectLoader::new(shopify.build_client()?);
            match type_name {
                Some(type_name) => {
                    let descriptor = loader.describe(&type_name).await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&descriptor)?);
                    } else {
                        let summary = descriptor.summary();
                        println!("{} ({})", descriptor.display_name, descriptor.type_name);
                        println!(
                            "  {} fields: {} required, {} optional",
                            summary.total_fields, summary.required_count, summary.optional_count
                        );
                        for field in &descriptor.fields {
                            let marker = if field.required { "*" } else { " " };
                            println!("  {marker} {:<24} {}", field.key, field.declared_type);
                            for rule in &field.validations {
                                println!("      {} = {}", rule.name, rule.value);
                            }
                        }
                    }
                }
                None => {
                    let types = loader.list_types().await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&types)?);
                    } else {
                        for summary in types {
                            println!("{:<32} {}", summary.type_name, summary.display_name);
                        }
                    }
                }
            }
        }
        Commands::Validate {
            type_name,
            file,
            delimiter,
            shopify,
        } => {
            let loader = MetaobjectLoader::new(shopify.build_client()?);
            let descriptor = loader.describe(&type_name).await?;
            let rows = csv::read_rows(&file, delimiter)?;

            let mut invalid = 0;
            for (index, row) in rows.iter().enumerate() {
                let Some(record) = record_from_row(row, &type_name) else {
                    continue;
                };
                let violations = validate(&coerce_to_schema(&record, &descriptor), &descriptor);
                if !violations.is_empty() {
                    invalid += 1;
                    println!("row {} ({}):", index + 1, record.handle());
                    for violation in violations {
                        println!("  {violation}");
                    }
                }
            }

            info!("{} of {} rows are valid", rows.len() - invalid, rows.len());
            if invalid > 0 {
                anyhow::bail!("{invalid} of {} rows failed validation", rows.len());
            }
        }
        Commands::Upsert {
            type_name,
            file,
            delimiter,
            batch_size,
            validate,
            dry_run,
            shopify,
        } => {
            let loader = MetaobjectLoader::with_config(
                shopify.build_client()?,
                LoaderConfig {
                    batch_size,
                    validate_before_upsert: validate,
                    ..LoaderConfig::default()
                },
            );
            let config = csv::Config {
                file,
                type_name,
                delimiter,
                dry_run,
            };
            let tally = csv::sync(&loader, &config).await?;

            println!("{} upserted, {} failed", tally.upserted, tally.failed);
            for failure in &tally.failures {
                println!("  {}: {}", failure.handle, failure.message);
            }
        }
        Commands::Export {
            type_name,
            output,
            include_metafields,
            page_size,
            shopify,
        } => {
            let loader = MetaobjectLoader::with_config(
                shopify.build_client()?,
                LoaderConfig {
                    page_size,
                    ..LoaderConfig::default()
                },
            );
            let written = csv::export(&loader, &type_name, &output, include_metafields).await?;
            println!("Exported {written} {type_name} records to {}", output.display());
        }
        Commands::Stats { type_name, shopify } => {
            let loader = MetaobjectLoader::new(shopify.build_client()?);
            let stats = loader.stats(&type_name).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("Failed to encode statistics")?
            );
        }
        Commands::Delete { id, shopify } => {
            let loader = MetaobjectLoader::new(shopify.build_client()?);
            let deleted = loader.delete(&id).await?;
            println!("Deleted {deleted}");
        }
    }

    Ok(())
}

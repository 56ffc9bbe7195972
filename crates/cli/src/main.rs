//! Siraj CLI - Product upload and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Create a product from a YAML draft and its images
//! siraj-cli product create -f draft.yaml -i front.jpg -i side.jpg
//!
//! # List the second page of bundles
//! siraj-cli catalog list --bundles --page 2
//! ```
//!
//! # Commands
//!
//! - `product create` - Upload a product to the backend
//! - `catalog list` - Print one page of the public catalog

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "siraj-cli")]
#[command(author, version, about = "Siraj CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect the public catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Create a product from a YAML draft
    Create {
        /// Path to the YAML draft
        #[arg(short, long)]
        file: PathBuf,

        /// Image file (repeat for up to 5 images)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,

        /// Validate and print the payload without uploading
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List one page of products or bundles
    List {
        /// List bundles instead of products
        #[arg(long)]
        bundles: bool,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Product { action } => match action {
            ProductAction::Create {
                file,
                images,
                dry_run,
            } => {
                commands::product::create(&file, &images, dry_run).await?;
            }
        },
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                bundles,
                page,
                category,
            } => {
                let count = commands::catalog::list(bundles, page.max(1), category).await?;
                if count == 0 {
                    tracing::info!("No items found");
                }
            }
        },
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_product_create_args() {
        let cli = Cli::try_parse_from([
            "siraj-cli", "product", "create", "-f", "trio.yaml", "-i", "a.jpg", "-i", "b.jpg",
        ])
        .unwrap();
        let Commands::Product {
            action: ProductAction::Create { file, images, dry_run },
        } = cli.command
        else {
            panic!("expected product create");
        };
        assert_eq!(file, PathBuf::from("trio.yaml"));
        assert_eq!(images.len(), 2);
        assert!(!dry_run);
    }

    #[test]
    fn test_catalog_list_defaults() {
        let cli = Cli::try_parse_from(["siraj-cli", "catalog", "list", "--bundles"]).unwrap();
        let Commands::Catalog {
            action: CatalogAction::List { bundles, page, category },
        } = cli.command
        else {
            panic!("expected catalog list");
        };
        assert!(bundles);
        assert_eq!(page, 1);
        assert!(category.is_none());
    }
}

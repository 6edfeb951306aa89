//! Kirana CLI - the cart widget in a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally for one category
//! kirana catalog --category Snacks
//!
//! # Change the cart
//! kirana cart add 3
//! kirana cart update 3 -1
//! kirana cart remove 3
//! kirana cart show
//!
//! # Check out and write the PDF receipt into ./receipts
//! kirana checkout --out-dir receipts
//! ```
//!
//! The cart is shared with the storefront server when both use the same
//! `KIRANA_DATA_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kirana_core::ProductId;
use kirana_storefront::config::StorefrontConfig;
use url::Url;

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "kirana")]
#[command(author, version, about = "Kirana cart in the terminal")]
struct Cli {
    /// Directory holding the persisted cart (overrides `KIRANA_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Product catalog endpoint (overrides `KIRANA_CATALOG_URL`)
    #[arg(long, global = true)]
    catalog_url: Option<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Catalog {
        /// Only show products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Check out and write the PDF receipt
    Checkout {
        /// Directory the receipt is written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart lines and subtotal
    Show,
    /// Add a product, or add one more of it
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Change a line's quantity by a signed amount
    Update {
        /// Product ID
        id: ProductId,

        /// Quantity change, e.g. 1 or -1
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Remove a line
    Remove {
        /// Product ID
        id: ProductId,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = StorefrontConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(url) = cli.catalog_url {
        config.catalog_url = url;
    }

    let ctx = Context::new(config);
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Catalog { category } => {
            commands::catalog::list(&ctx, category.as_deref(), &mut out).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx, &mut out)?,
            CartAction::Add { id } => commands::cart::add(&ctx, id, &mut out).await?,
            CartAction::Update { id, delta } => commands::cart::update(&ctx, id, delta, &mut out)?,
            CartAction::Remove { id } => commands::cart::remove(&ctx, id, &mut out)?,
        },
        Commands::Checkout { out_dir } => {
            let mut prompt = commands::checkout::TerminalPrompt::new(io::stderr());
            commands::checkout::run(&ctx, &mut prompt, out_dir, &mut out)?;
        }
    }
    Ok(())
}

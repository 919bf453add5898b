mod catalog;
mod config;
mod observer;
mod service;
mod storage;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalogsync_core::observer::{parse_platform_datetime, ProductChange};
use catalogsync_core::product::Product;
use catalogsync_core::snapshot::SnapshotBuilder;
use catalogsync_core::storage::IndexRepository;

use crate::catalog::CatalogSnapshotBuilder;
use crate::config::Config;
use crate::observer::ProductObserver;
use crate::service::{CachingProductService, IndexService};
use crate::storage::InMemoryIndexRepository;

/// CatalogSync - Indexed product cache for personalization feeds
#[derive(Parser, Debug)]
#[command(name = "catalogsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite index database
    #[arg(long, global = true, env = "SQLITE_PATH")]
    sqlite_path: Option<String>,

    /// Path to the JSON catalog products are built from
    #[arg(long, global = true, env = "CATALOG_PATH")]
    catalog: Option<String>,

    /// Keep the index in memory for this run only
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a product, building its index entry if needed
    Get {
        #[arg(long)]
        product_id: u64,
        #[arg(long)]
        store_id: u64,
    },
    /// Flag an index entry for rebuild
    MarkDirty {
        #[arg(long)]
        product_id: u64,
        #[arg(long)]
        store_id: u64,
    },
    /// Rebuild the dirty entries of a store
    Reindex {
        #[arg(long)]
        store_id: u64,
        /// Maximum entries to rebuild (default: REINDEX_BATCH_SIZE)
        #[arg(long)]
        limit: Option<usize>,
        /// Flag every entry of the store dirty first
        #[arg(long)]
        full: bool,
    },
    /// Print the raw index entry
    Show {
        #[arg(long)]
        product_id: u64,
        #[arg(long)]
        store_id: u64,
    },
    /// Report a product save and invalidate the affected entries
    Notify {
        #[arg(long)]
        product_id: u64,
        /// Store the product is assigned to (repeatable)
        #[arg(long = "store-id", required = true)]
        store_ids: Vec<u64>,
        /// Configurable parent of the product
        #[arg(long)]
        parent_id: Option<u64>,
        /// Scheduled update start (YYYY-MM-DD HH:MM:SS)
        #[arg(long)]
        news_from: Option<String>,
        /// Scheduled update end (YYYY-MM-DD HH:MM:SS)
        #[arg(long)]
        news_to: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let mut config = Config::from_env();
    if let Some(path) = cli.sqlite_path {
        config.sqlite_path = path;
    }
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }

    let repository = open_repository(&config, cli.in_memory).await?;
    let builder: Arc<dyn SnapshotBuilder> =
        Arc::new(CatalogSnapshotBuilder::new(&config.catalog_path));
    let index = Arc::new(IndexService::new(repository.clone(), builder));

    match cli.command {
        Command::Get {
            product_id,
            store_id,
        } => {
            let products = CachingProductService::new(repository, index);
            let Some(product) = products.get_product(product_id, store_id).await else {
                bail!("product {product_id} is not available in store {store_id}");
            };
            println!("{}", serde_json::to_string_pretty(&ProductView::new(&product))?);
        }
        Command::MarkDirty {
            product_id,
            store_id,
        } => {
            let products = CachingProductService::new(repository, index);
            if products.mark_dirty(product_id, store_id).await {
                println!("marked product {product_id} in store {store_id} dirty");
            } else {
                println!("no index entry for product {product_id} in store {store_id}");
            }
        }
        Command::Reindex {
            store_id,
            limit,
            full,
        } => {
            if full {
                let marked = repository.mark_store_dirty(store_id).await?;
                tracing::info!(store_id, marked, "Store entries flagged for rebuild");
            }
            let limit = limit.unwrap_or(config.reindex_batch_size);
            let report = index.rebuild_dirty(store_id, limit).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Show {
            product_id,
            store_id,
        } => match repository.find_one(product_id, store_id).await? {
            Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
            None => bail!("no index entry for product {product_id} in store {store_id}"),
        },
        Command::Notify {
            product_id,
            store_ids,
            parent_id,
            news_from,
            news_to,
        } => {
            let mut change = ProductChange::new(product_id, store_ids);
            if let Some(parent_id) = parent_id {
                change = change.with_parent(parent_id);
            }
            if let Some(value) = news_from {
                change = change.with_news_from_date(parse_datetime_arg(&value)?);
            }
            if let Some(value) = news_to {
                change = change.with_news_to_date(parse_datetime_arg(&value)?);
            }

            let observer = ProductObserver::new(index, config.managed_stores().cloned());
            let keys = observer.on_product_saved(&change).await;
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
    }

    Ok(())
}

/// `get` output: the product with its derived flags.
#[derive(Serialize)]
struct ProductView<'a> {
    #[serde(flatten)]
    product: &'a Product,
    in_stock: bool,
    discounted: bool,
}

impl<'a> ProductView<'a> {
    fn new(product: &'a Product) -> Self {
        Self {
            product,
            in_stock: product.availability.is_in_stock(),
            discounted: product.is_discounted(),
        }
    }
}

/// Initialize the tracing subscriber. Logs go to stderr; `LOG_FORMAT=json`
/// switches to one JSON object per line.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "catalogsync=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_datetime_arg(value: &str) -> Result<chrono::NaiveDateTime> {
    parse_platform_datetime(value)
        .with_context(|| format!("invalid datetime {value:?}, expected YYYY-MM-DD HH:MM:SS"))
}

/// Opens the index store selected by the configuration.
#[cfg(feature = "sqlite")]
async fn open_repository(config: &Config, in_memory: bool) -> Result<Arc<dyn IndexRepository>> {
    if in_memory {
        return Ok(Arc::new(InMemoryIndexRepository::new()));
    }

    tracing::debug!(path = %config.sqlite_path, "Opening SQLite index");
    let repository = crate::storage::SqliteIndexRepository::new(&config.sqlite_path)
        .await
        .with_context(|| format!("failed to open index at {}", config.sqlite_path))?;
    Ok(Arc::new(repository))
}

/// Opens the index store selected by the configuration.
#[cfg(not(feature = "sqlite"))]
async fn open_repository(_config: &Config, in_memory: bool) -> Result<Arc<dyn IndexRepository>> {
    if !in_memory {
        tracing::warn!("Built without the `sqlite` feature, using the in-memory index");
    }
    Ok(Arc::new(InMemoryIndexRepository::new()))
}

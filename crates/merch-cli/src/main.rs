// ============================================================================
// merch — command line front end for the on-chain merch store
// ============================================================================
// Usage:
//   merch products [--sort ORDER] [--json]   List live products
//   merch receipts <OWNER> [--json]          List receipts owned by an address
//   merch store [--account ADDR]             Show the store and its admin
//   merch watch                              Poll the catalog until Ctrl-C
//   merch build <CALL> ...                   Print a Move call for a wallet to sign
//   merch convert --sui X | --mist N         SUI <-> MIST conversion
// ============================================================================

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use merch_core::money::{format_sui, parse_sui};
use merch_core::{
    sort_products, CatalogSource, DeliveryInfo, MoveCall, Network, Product, ProductDraft,
    ProductSort, Receipt, StoreConfig, Storefront, SuiRpcClient,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// On-chain merch store tool
#[derive(Parser)]
#[command(name = "merch", version, about = "Browse and build transactions for the Sui merch store")]
struct Cli {
    /// Sui network: testnet, mainnet, devnet (default: MERCH_NETWORK or testnet)
    #[arg(long, global = true)]
    network: Option<Network>,

    /// Full-node JSON-RPC URL (default: the network's public full node)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Deployed package id (default: MERCH_PACKAGE_ID)
    #[arg(long, global = true)]
    package_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products reconstructed from ProductAdded events
    Products {
        /// Order: newest, price-asc, price-desc, name-asc
        #[arg(long, default_value_t = ProductSort::Newest)]
        sort: ProductSort,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List receipts owned by an address
    Receipts {
        owner: String,

        #[arg(long)]
        json: bool,
    },

    /// Show the store object and its admin
    Store {
        /// Report whether this address administers the store
        #[arg(long)]
        account: Option<String>,
    },

    /// Refresh the catalog on the poll interval and print each result
    Watch,

    /// Build a Move call and print it as JSON
    Build {
        #[command(subcommand)]
        call: BuildCommand,
    },

    /// Convert between SUI and MIST
    Convert {
        /// Amount in SUI, e.g. 0.5
        #[arg(long, conflicts_with = "mist", required_unless_present = "mist")]
        sui: Option<String>,

        /// Amount in MIST
        #[arg(long)]
        mist: Option<u64>,
    },
}

#[derive(Subcommand)]
enum BuildCommand {
    /// Create the store (admin)
    CreateStore,

    /// Add a product to the store (admin)
    AddProduct {
        #[command(flatten)]
        store: StoreArg,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Price in SUI
        #[arg(long)]
        price: String,

        #[arg(long)]
        stock: String,

        #[arg(long)]
        image_url: String,
    },

    /// Set a product's stock (admin)
    UpdateStock {
        #[command(flatten)]
        store: StoreArg,

        /// Product object id
        product: String,

        stock: String,
    },

    /// Delete a product (admin)
    DeleteProduct {
        #[command(flatten)]
        store: StoreArg,

        /// Product object id
        product: String,
    },

    /// Pay the listed price for a product
    Purchase {
        /// Product object id
        product: String,
    },

    /// Pay for a product with delivery details
    Checkout {
        /// Product object id
        product: String,

        #[command(flatten)]
        delivery: DeliveryArgs,
    },
}

#[derive(Args)]
struct StoreArg {
    /// Store object id (default: MERCH_STORE_ID, then the latest StoreCreated event)
    #[arg(long)]
    store: Option<String>,
}

#[derive(Args)]
struct DeliveryArgs {
    #[arg(long)]
    recipient_name: String,
    #[arg(long)]
    address_line1: String,
    #[arg(long, default_value = "")]
    address_line2: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    postal_code: String,
    #[arg(long)]
    country: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
}

impl From<DeliveryArgs> for DeliveryInfo {
    fn from(args: DeliveryArgs) -> Self {
        DeliveryInfo {
            recipient_name: args.recipient_name,
            address_line1: args.address_line1,
            address_line2: args.address_line2,
            city: args.city,
            postal_code: args.postal_code,
            country: args.country,
            email: args.email,
            phone: args.phone,
        }
    }
}

type Shop = Storefront<SuiRpcClient>;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    // Pure conversion needs no configuration or network
    if let Commands::Convert { sui, mist } = &cli.command {
        return cmd_convert(sui.as_deref(), *mist);
    }

    let config = apply_overrides(
        StoreConfig::from_env().context("Failed to load configuration")?,
        &cli,
    )?;
    let gateway = Arc::new(SuiRpcClient::new(&config.rpc_url));
    let shop = Storefront::new(config, gateway);

    match cli.command {
        Commands::Products { sort, json } => cmd_products(&shop, sort, json).await,
        Commands::Receipts { owner, json } => cmd_receipts(&shop, &owner, json).await,
        Commands::Store { account } => cmd_store(&shop, account.as_deref()).await,
        Commands::Watch => cmd_watch(&shop).await,
        Commands::Build { call } => cmd_build(&shop, call).await,
        Commands::Convert { .. } => Ok(()),
    }
}

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("merch_core=info".parse()?)
                .add_directive("merch_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Command line flags win over the environment
fn apply_overrides(mut config: StoreConfig, cli: &Cli) -> Result<StoreConfig> {
    if let Some(network) = cli.network {
        config.network = network;
        config.rpc_url = network.default_rpc_url().to_string();
    }
    if let Some(rpc_url) = &cli.rpc_url {
        config.set_rpc_url(rpc_url).context("Invalid --rpc-url")?;
    }
    if let Some(package_id) = &cli.package_id {
        config.package_id = package_id.clone();
    }
    Ok(config)
}

fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("(invalid: {})", ms))
}

fn require_configured(shop: &Shop) -> Result<()> {
    if !shop.config().is_configured() {
        anyhow::bail!("Package id is not configured. Set MERCH_PACKAGE_ID or pass --package-id.");
    }
    Ok(())
}

async fn cmd_products(shop: &Shop, sort: ProductSort, json: bool) -> Result<()> {
    require_configured(shop)?;
    let mut products = shop
        .catalog()
        .list_products()
        .await
        .context("Failed to load products")?;
    sort_products(&mut products, sort);

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    let aggregator = &shop.config().aggregator_url;
    println!(
        "{:<68}  {:<24}  {:>12}  {:>6}  {}",
        "OBJECT ID", "NAME", "PRICE (SUI)", "STOCK", "IMAGE"
    );
    println!("{}", "-".repeat(130));
    for product in &products {
        println!(
            "{:<68}  {:<24}  {:>12}  {:>6}  {}",
            product.object_id,
            product.name.chars().take(24).collect::<String>(),
            format_sui(product.price),
            if product.in_stock() {
                product.stock.to_string()
            } else {
                "sold out".into()
            },
            product.image(aggregator).url()
        );
    }

    println!("\nTotal: {} products ({})", products.len(), sort);
    Ok(())
}

async fn cmd_receipts(shop: &Shop, owner: &str, json: bool) -> Result<()> {
    require_configured(shop)?;
    let receipts = shop
        .catalog()
        .list_receipts(Some(owner))
        .await
        .context("Failed to load receipts")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipts)?);
        return Ok(());
    }

    if receipts.is_empty() {
        println!("No receipts found for {}.", owner);
        return Ok(());
    }

    for receipt in &receipts {
        print_receipt(receipt);
    }
    println!("\nTotal: {} receipts", receipts.len());
    Ok(())
}

fn print_receipt(receipt: &Receipt) {
    println!(
        "{}  {}  {} SUI  {}",
        receipt.object_id,
        receipt.product_name,
        format_sui(receipt.price_paid),
        format_timestamp(receipt.checkout_timestamp)
    );
    if let Some(delivery) = &receipt.delivery_info {
        println!(
            "    ship to {}, {}, {} {}, {}",
            delivery.recipient_name,
            delivery.address_line1,
            delivery.postal_code,
            delivery.city,
            delivery.country
        );
    }
}

async fn cmd_store(shop: &Shop, account: Option<&str>) -> Result<()> {
    require_configured(shop)?;
    let catalog = shop.catalog();
    let Some(store) = catalog.find_store().await.context("Failed to look up the store")? else {
        println!("No store created yet.");
        return Ok(());
    };

    println!("Store: {}", store.object_id);
    println!("Admin: {}", store.admin);
    if !shop.config().expects_admin(&store) {
        warn!(
            "On-chain admin {} differs from MERCH_ADMIN_ADDRESS {}",
            store.admin,
            shop.config().admin_address
        );
    }
    if let Some(account) = account {
        let is_admin = store.is_admin(account);
        println!("{} is {}the admin", account, if is_admin { "" } else { "not " });
    }
    Ok(())
}

async fn cmd_watch(shop: &Shop) -> Result<()> {
    require_configured(shop)?;
    let interval = shop.config().poll_interval();
    let poller = merch_core::CatalogPoller::spawn(shop.catalog(), interval);
    let mut updates = poller.subscribe();

    println!(
        "Watching catalog every {}s (Ctrl-C to stop)",
        interval.as_secs()
    );

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let at = snapshot
                    .refreshed_at
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default();
                match &snapshot.last_error {
                    None => println!("[{}] #{} {} products", at, snapshot.generation, snapshot.products.len()),
                    Some(e) => println!(
                        "[{}] #{} refresh failed, showing {} cached products: {}",
                        at, snapshot.generation, snapshot.products.len(), e
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Ctrl-C received");
                break;
            }
        }
    }

    poller.stop();
    Ok(())
}

async fn cmd_build(shop: &Shop, call: BuildCommand) -> Result<()> {
    let call: MoveCall = match call {
        BuildCommand::CreateStore => shop.builder().create_store(),
        BuildCommand::AddProduct {
            store,
            name,
            description,
            price,
            stock,
            image_url,
        } => {
            let draft = ProductDraft {
                name,
                description,
                price,
                stock,
                image_url,
            };
            build_admin(shop, store, |b, s| b.add_product(s, &draft)).await?
        }
        BuildCommand::UpdateStock {
            store,
            product,
            stock,
        } => build_admin(shop, store, |b, s| b.update_stock(s, &product, &stock)).await?,
        BuildCommand::DeleteProduct { store, product } => {
            build_admin(shop, store, |b, s| b.delete_product(s, &product)).await?
        }
        BuildCommand::Purchase { product } => {
            let product = find_product(shop, &product).await?;
            shop.builder().purchase(&product)?
        }
        BuildCommand::Checkout { product, delivery } => {
            let product = find_product(shop, &product).await?;
            shop.builder().checkout(&product, &delivery.into())?
        }
    };

    if call.payment() > 0 {
        eprintln!("Payment: {} SUI", format_sui(call.payment()));
    }
    println!("{}", serde_json::to_string_pretty(&call)?);
    Ok(())
}

/// An explicit --store wins; otherwise the storefront resolves it
async fn build_admin<F>(shop: &Shop, store: StoreArg, build: F) -> Result<MoveCall>
where
    F: Fn(&merch_core::TransactionBuilder, Option<&str>) -> merch_core::Result<MoveCall>,
{
    let call = match store.store.as_deref() {
        Some(store_id) => build(shop.builder(), Some(store_id))?,
        None => shop.build_admin(build).await?,
    };
    Ok(call)
}

async fn find_product(shop: &Shop, object_id: &str) -> Result<Product> {
    require_configured(shop)?;
    let products = shop
        .catalog()
        .list_products()
        .await
        .context("Failed to load products")?;

    products
        .into_iter()
        .find(|p| p.object_id.eq_ignore_ascii_case(object_id))
        .with_context(|| format!("Product {} not found in the catalog", object_id))
}

fn cmd_convert(sui: Option<&str>, mist: Option<u64>) -> Result<()> {
    match (sui, mist) {
        (Some(sui), _) => {
            let mist = parse_sui(sui)?;
            println!("{} MIST", mist);
        }
        (None, Some(mist)) => println!("{} SUI", format_sui(mist)),
        (None, None) => anyhow::bail!("Pass --sui or --mist"),
    }
    Ok(())
}

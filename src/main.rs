//! Storefront Admin CLI

use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use storefront::{
    context::AppContext,
    domain::products::{
        ProductsService,
        models::{CategoryUuid, NewCategory, NewProduct, ProductUuid},
    },
};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront admin CLI", long_about = None)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage catalog products
    Product(ProductCommand),
    /// Manage catalog categories
    Category(CategoryCommand),
    /// Load the demo catalog
    Seed,
}

#[derive(Debug, Args)]
struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    List(ListProductsArgs),
    Create(CreateProductArgs),
    SetStock(SetStockArgs),
}

#[derive(Debug, Args)]
struct ListProductsArgs {
    /// Emit JSON instead of one line per product
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CreateProductArgs {
    /// Product display name
    #[arg(long)]
    name: String,

    /// Optional description
    #[arg(long)]
    description: Option<String>,

    /// Unit price in minor currency units (15.99 is 1599)
    #[arg(long)]
    price: u64,

    /// Initial stock count
    #[arg(long, default_value_t = 0)]
    stock: u64,

    /// Optional category UUID
    #[arg(long)]
    category_uuid: Option<Uuid>,

    /// Optional product UUID; generated when omitted
    #[arg(long)]
    product_uuid: Option<Uuid>,
}

#[derive(Debug, Args)]
struct SetStockArgs {
    /// Product UUID
    #[arg(long)]
    product_uuid: Uuid,

    /// New stock count
    #[arg(long)]
    stock: u64,
}

#[derive(Debug, Args)]
struct CategoryCommand {
    #[command(subcommand)]
    command: CategorySubcommand,
}

#[derive(Debug, Subcommand)]
enum CategorySubcommand {
    Create(CreateCategoryArgs),
}

#[derive(Debug, Args)]
struct CreateCategoryArgs {
    /// Category display name
    #[arg(long)]
    name: String,

    /// URL slug, unique across categories
    #[arg(long)]
    slug: String,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let database_url = cli
        .database_url
        .ok_or_else(|| "DATABASE_URL is not set".to_string())?;

    let ctx = AppContext::from_database_url(&database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    match cli.command {
        Commands::Product(ProductCommand { command }) => match command {
            ProductSubcommand::List(args) => list_products(&ctx, args).await,
            ProductSubcommand::Create(args) => create_product(&ctx, args).await,
            ProductSubcommand::SetStock(args) => set_stock(&ctx, args).await,
        },
        Commands::Category(CategoryCommand { command }) => match command {
            CategorySubcommand::Create(args) => create_category(&ctx, args).await,
        },
        Commands::Seed => seed(&ctx).await,
    }
}

async fn list_products(ctx: &AppContext, args: ListProductsArgs) -> Result<(), String> {
    let products = ctx
        .products
        .list_products()
        .await
        .map_err(|error| format!("failed to list products: {error}"))?;

    if args.json {
        let json = serde_json::to_string_pretty(&products)
            .map_err(|error| format!("failed to serialise products: {error}"))?;
        println!("{json}");
    } else {
        for product in products {
            println!(
                "{}  {}  price: {}  stock: {}",
                product.uuid, product.name, product.price, product.stock
            );
        }
    }

    Ok(())
}

async fn create_product(ctx: &AppContext, args: CreateProductArgs) -> Result<(), String> {
    let product = ctx
        .products
        .create_product(NewProduct {
            uuid: args.product_uuid.map_or_else(ProductUuid::new, ProductUuid::from_uuid),
            name: args.name,
            description: args.description,
            price: args.price,
            stock: args.stock,
            category_uuid: args.category_uuid.map(CategoryUuid::from_uuid),
        })
        .await
        .map_err(|error| format!("failed to create product: {error}"))?;

    println!("product_uuid: {}", product.uuid);

    Ok(())
}

async fn set_stock(ctx: &AppContext, args: SetStockArgs) -> Result<(), String> {
    let product = ctx
        .products
        .set_stock(ProductUuid::from_uuid(args.product_uuid), args.stock)
        .await
        .map_err(|error| format!("failed to set stock: {error}"))?;

    println!("{}  stock: {}", product.uuid, product.stock);

    Ok(())
}

async fn create_category(ctx: &AppContext, args: CreateCategoryArgs) -> Result<(), String> {
    let category = ctx
        .products
        .create_category(NewCategory {
            uuid: CategoryUuid::new(),
            name: args.name,
            slug: args.slug,
        })
        .await
        .map_err(|error| format!("failed to create category: {error}"))?;

    println!("category_uuid: {}", category.uuid);

    Ok(())
}

/// The demo catalog: three categorised products with a default stock.
async fn seed(ctx: &AppContext) -> Result<(), String> {
    let demo = [
        (
            "Clothing",
            "clothing",
            "Classic T-Shirt",
            "A comfortable 100% cotton t-shirt.",
            15_99_u64,
        ),
        (
            "Accessories",
            "accessories",
            "Leather Wallet",
            "A stylish and durable leather wallet.",
            29_99,
        ),
        (
            "Footwear",
            "footwear",
            "Running Shoes",
            "Lightweight shoes for your daily run.",
            79_99,
        ),
    ];

    for (category_name, slug, product_name, description, price) in demo {
        let category = ctx
            .products
            .create_category(NewCategory {
                uuid: CategoryUuid::new(),
                name: category_name.to_string(),
                slug: slug.to_string(),
            })
            .await
            .map_err(|error| format!("failed to create category {slug}: {error}"))?;

        let product = ctx
            .products
            .create_product(NewProduct {
                uuid: ProductUuid::new(),
                name: product_name.to_string(),
                description: Some(description.to_string()),
                price,
                stock: 10,
                category_uuid: Some(category.uuid),
            })
            .await
            .map_err(|error| format!("failed to create product {product_name}: {error}"))?;

        println!("{}  {}", product.uuid, product.name);
    }

    Ok(())
}

use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use stockroom::{
    auth::Permission,
    context::AppContext,
    domain::products::data::{NewProduct, ProductUpdate},
};

use super::{output, session::authorize};

#[derive(Debug, Args)]
pub(crate) struct ProductCommand {
    #[command(subcommand)]
    command: ProductSubcommand,
}

#[derive(Debug, Subcommand)]
enum ProductSubcommand {
    /// List the products you can see
    List,
    Get { id: String },
    Add(AddProductArgs),
    Update(UpdateProductArgs),
    Delete { id: String },
    /// List known categories
    Categories,
}

#[derive(Debug, Args)]
struct AddProductArgs {
    #[arg(long)]
    name: String,

    #[arg(long)]
    price: Decimal,

    #[arg(long)]
    description: Option<String>,

    /// Category name; created on first use
    #[arg(long)]
    category: Option<String>,

    #[arg(long, default_value_t = 0)]
    inventory: u64,
}

#[derive(Debug, Args)]
struct UpdateProductArgs {
    id: String,

    /// Field assignment, e.g. --set price=4.50
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment, required = true)]
    fields: Vec<(String, String)>,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(field, value)| (field.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected FIELD=VALUE, got {raw:?}"))
}

pub(crate) async fn run(ctx: &AppContext, command: ProductCommand) -> Result<(), String> {
    match command.command {
        ProductSubcommand::List => {
            let caller = authorize(ctx, Permission::ProductView).await?;
            let products = ctx
                .products
                .list_products(caller)
                .await
                .map_err(|error| format!("failed to list products: {error}"))?;

            output::json(&products)
        }
        ProductSubcommand::Get { id } => {
            let caller = authorize(ctx, Permission::ProductView).await?;
            let product = ctx
                .products
                .get_product(caller, id)
                .await
                .map_err(|error| format!("failed to get product: {error}"))?;

            output::json(&product)
        }
        ProductSubcommand::Add(args) => {
            let caller = authorize(ctx, Permission::ProductCreate).await?;
            let product = ctx
                .products
                .create_product(
                    caller,
                    NewProduct {
                        name: args.name,
                        price: args.price,
                        description: args.description,
                        category: args.category,
                        inventory: args.inventory,
                    },
                )
                .await
                .map_err(|error| format!("failed to create product: {error}"))?;

            output::json(&product)
        }
        ProductSubcommand::Update(args) => {
            let caller = authorize(ctx, Permission::ProductUpdate).await?;
            let fields: Map<String, Value> = args
                .fields
                .into_iter()
                .map(|(field, value)| (field, Value::String(value)))
                .collect();

            let update = ProductUpdate::from_fields(fields)
                .map_err(|error| format!("invalid update: {error}"))?;

            let product = ctx
                .products
                .update_product(caller, args.id, update)
                .await
                .map_err(|error| format!("failed to update product: {error}"))?;

            output::json(&product)
        }
        ProductSubcommand::Delete { id } => {
            let caller = authorize(ctx, Permission::ProductDelete).await?;
            let product = ctx
                .products
                .delete_product(caller, id)
                .await
                .map_err(|error| format!("failed to delete product: {error}"))?;

            output::line(&format!("deleted product {}", product.id));

            Ok(())
        }
        ProductSubcommand::Categories => {
            authorize(ctx, Permission::ProductView).await?;

            let categories = ctx
                .products
                .list_categories()
                .await
                .map_err(|error| format!("failed to list categories: {error}"))?;

            output::json(&categories)
        }
    }
}

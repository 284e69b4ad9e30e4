use clap::{Args, Subcommand};
use stockroom::{
    auth::Permission,
    context::AppContext,
    domain::orders::{data::UpdateOrder, models::OrderStatus},
};

use super::{
    cart::TargetArgs,
    output,
    session::{authorize, resolve_target},
};

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    List(TargetArgs),
    /// Move cart lines into the order
    Create {
        #[command(flatten)]
        items: ItemsArgs,

        #[arg(long)]
        status: OrderStatus,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Set the status of order lines
    Update {
        #[command(flatten)]
        items: ItemsArgs,

        #[arg(long)]
        status: OrderStatus,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Drop order lines that are not Done
    Delete {
        #[command(flatten)]
        items: ItemsArgs,

        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Debug, Args)]
struct ItemsArgs {
    /// Comma separated product ids
    #[arg(long, value_delimiter = ',', required = true)]
    items: Vec<String>,
}

pub(crate) async fn run(ctx: &AppContext, command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::List(target) => {
            let caller = authorize(ctx, Permission::OrderView).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let orders = ctx
                .orders
                .get_orders(caller, target)
                .await
                .map_err(|error| format!("failed to get orders: {error}"))?;

            output::json(&orders)
        }
        OrderSubcommand::Create {
            items,
            status,
            target,
        } => {
            let caller = authorize(ctx, Permission::OrderCreate).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let order = ctx
                .checkout
                .place_order(caller, items.items, status, target)
                .await
                .map_err(|error| format!("failed to create order: {error}"))?;

            output::json(&order)
        }
        OrderSubcommand::Update {
            items,
            status,
            target,
        } => {
            let caller = authorize(ctx, Permission::OrderUpdate).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let order = ctx
                .orders
                .update_order(
                    caller,
                    UpdateOrder {
                        product_ids: items.items,
                        status,
                    },
                    target,
                )
                .await
                .map_err(|error| format!("failed to update order: {error}"))?;

            output::json(&order)
        }
        OrderSubcommand::Delete { items, target } => {
            let caller = authorize(ctx, Permission::OrderDelete).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let outcome = ctx
                .orders
                .delete_order(caller, items.items, target)
                .await
                .map_err(|error| format!("failed to delete from order: {error}"))?;

            if !outcome.removed.is_empty() {
                output::line(&format!("removed: {}", outcome.removed.join(", ")));
            }

            if !outcome.skipped_final.is_empty() {
                output::line(&format!(
                    "kept (status Done): {}",
                    outcome.skipped_final.join(", ")
                ));
            }

            if outcome.removed.is_empty() && outcome.skipped_final.is_empty() {
                output::line("no matching products found in the order");
            }

            output::json(&outcome.order)
        }
    }
}

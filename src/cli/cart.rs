use clap::{Args, Subcommand};
use stockroom::{auth::Permission, context::AppContext};

use super::{
    output,
    session::{authorize, resolve_target},
};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    View(TargetArgs),
    Add {
        product_id: String,

        #[arg(long)]
        quantity: u64,
    },
    Remove {
        product_id: String,

        #[command(flatten)]
        target: TargetArgs,
    },
    Update {
        product_id: String,

        #[arg(long)]
        quantity: u64,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Sum of the cart's line totals
    Total(TargetArgs),
}

#[derive(Debug, Args)]
pub(crate) struct TargetArgs {
    /// Act on another user's cart (admins only)
    #[arg(long)]
    pub(crate) target_user: Option<String>,
}

pub(crate) async fn run(ctx: &AppContext, command: CartCommand) -> Result<(), String> {
    match command.command {
        CartSubcommand::View(target) => {
            let caller = authorize(ctx, Permission::CartView).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let cart = ctx
                .carts
                .get_cart(caller, target)
                .await
                .map_err(|error| format!("failed to get cart: {error}"))?;

            output::json(&cart)
        }
        CartSubcommand::Add {
            product_id,
            quantity,
        } => {
            let caller = authorize(ctx, Permission::CartAdd).await?;
            let lines = ctx
                .carts
                .add_item(caller.user_id, product_id, quantity)
                .await
                .map_err(|error| format!("failed to add to cart: {error}"))?;

            output::json(&lines)
        }
        CartSubcommand::Remove { product_id, target } => {
            let caller = authorize(ctx, Permission::CartRemove).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let removed = ctx
                .carts
                .remove_item(caller, product_id.clone(), target)
                .await
                .map_err(|error| format!("failed to remove from cart: {error}"))?;

            match removed {
                Some(line) => output::line(&format!("removed product {}", line.product_id)),
                None => output::line(&format!("product {product_id} was not in the cart")),
            }

            Ok(())
        }
        CartSubcommand::Update {
            product_id,
            quantity,
            target,
        } => {
            let caller = authorize(ctx, Permission::CartUpdate).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let line = ctx
                .carts
                .update_quantity(caller, product_id, quantity, target)
                .await
                .map_err(|error| format!("failed to update cart: {error}"))?;

            output::json(&line)
        }
        CartSubcommand::Total(target) => {
            let caller = authorize(ctx, Permission::CartView).await?;
            let target = resolve_target(ctx, target.target_user).await?;
            let total = ctx
                .carts
                .total(caller, target)
                .await
                .map_err(|error| format!("failed to total cart: {error}"))?;

            output::line(&format!("cart total: {total:.3}"));

            Ok(())
        }
    }
}

//! Carts service.
//!
//! Cart lines hold stock taken out of the product catalog: adding or growing
//! a line reserves inventory, shrinking or removing one releases it. Lines
//! consumed by an order keep their stock.

use std::{cmp::Ordering, fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::{
    auth::Caller,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{CartLine, CartTable, CartView, subtotal},
            repository::FileCartsRepository,
        },
        products::{ProductsService, models::InventoryDirection},
    },
    sequence::{SequenceGenerator, SequenceKind},
    store::RecordStore,
};

#[derive(Clone)]
pub struct FileCartsService {
    repository: FileCartsRepository,
    products: Arc<dyn ProductsService>,
    sequence: SequenceGenerator,
}

impl fmt::Debug for FileCartsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCartsService")
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl FileCartsService {
    #[must_use]
    pub fn new(
        store: RecordStore<CartTable>,
        products: Arc<dyn ProductsService>,
        sequence: SequenceGenerator,
    ) -> Self {
        Self {
            repository: FileCartsRepository::new(store),
            products,
            sequence,
        }
    }

    /// Undoes an inventory adjustment after the cart write failed.
    async fn compensate(&self, product_id: &str, quantity: u64, applied: InventoryDirection) {
        if let Err(source) = self
            .products
            .adjust_inventory(product_id.to_string(), quantity, applied.reverse())
            .await
        {
            error!(%product_id, quantity, %source, "failed to undo inventory adjustment");
        }
    }
}

fn overflow() -> CartsServiceError {
    CartsServiceError::InvalidData("cart amount overflows".to_string())
}

#[async_trait]
impl CartsService for FileCartsService {
    #[tracing::instrument(name = "carts.service.add_item", skip(self), err)]
    async fn add_item(
        &self,
        user_id: String,
        product_id: String,
        quantity: u64,
    ) -> Result<Vec<CartLine>, CartsServiceError> {
        if user_id.trim().is_empty() {
            return Err(CartsServiceError::InvalidData("user id is required".to_string()));
        }

        if product_id.trim().is_empty() {
            return Err(CartsServiceError::InvalidData("product id is required".to_string()));
        }

        if quantity == 0 {
            return Err(CartsServiceError::InvalidData(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let product = self.products.reserve_for_cart(product_id.clone(), quantity).await?;
        let added = subtotal(product.price, quantity).ok_or_else(overflow)?;

        let mut tx = self.repository.begin().await?;

        let existing = tx
            .get_mut(user_id.as_str())
            .and_then(|lines| lines.iter_mut().find(|line| line.product_id == product_id));

        if let Some(line) = existing {
            let merged_quantity = line.quantity.checked_add(quantity).ok_or_else(overflow)?;
            let merged_price = line.price.checked_add(added).ok_or_else(overflow)?;
            let merged_total = line.total.checked_add(added).ok_or_else(overflow)?;

            line.quantity = merged_quantity;
            line.price = merged_price;
            line.total = merged_total;
        } else {
            let line = CartLine {
                cart_id: self.sequence.next_id(SequenceKind::CartItem).await?,
                product_id: product_id.clone(),
                quantity,
                price: added,
                total: added,
                status: None,
            };

            match tx.get_mut(user_id.as_str()) {
                Some(lines) => lines.push(line),
                None => {
                    tx.upsert(user_id.clone(), vec![line]);
                }
            }
        }

        self.products
            .adjust_inventory(product_id.clone(), quantity, InventoryDirection::Reserve)
            .await?;

        let lines = tx.get(user_id.as_str()).cloned().unwrap_or_default();

        if let Err(source) = tx.commit().await {
            self.compensate(&product_id, quantity, InventoryDirection::Reserve)
                .await;

            return Err(source.into());
        }

        info!(lines = lines.len(), "added item to cart");

        Ok(lines)
    }

    #[tracing::instrument(
        name = "carts.service.remove_item",
        skip(self, caller),
        fields(caller = %caller.user_id),
        err
    )]
    async fn remove_item(
        &self,
        caller: Caller,
        product_id: String,
        target: Option<String>,
    ) -> Result<Option<CartLine>, CartsServiceError> {
        let user_id = caller.target(target.as_deref());
        let mut tx = self.repository.begin().await?;

        if tx.get(user_id.as_str()).is_none_or(Vec::is_empty) {
            return Err(CartsServiceError::NotFound);
        }

        let removed = tx
            .remove_lines(&user_id, |line| line.product_id == product_id)
            .into_iter()
            .next();

        tx.commit().await?;

        if let Some(line) = &removed {
            self.products
                .adjust_inventory(
                    line.product_id.clone(),
                    line.quantity,
                    InventoryDirection::Release,
                )
                .await?;

            info!(%user_id, cart_id = %line.cart_id, "removed item from cart");
        }

        Ok(removed)
    }

    #[tracing::instrument(
        name = "carts.service.update_quantity",
        skip(self, caller),
        fields(caller = %caller.user_id),
        err
    )]
    async fn update_quantity(
        &self,
        caller: Caller,
        product_id: String,
        quantity: u64,
        target: Option<String>,
    ) -> Result<CartLine, CartsServiceError> {
        if quantity == 0 {
            return Err(CartsServiceError::InvalidData(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let user_id = caller.target(target.as_deref());
        let mut tx = self.repository.begin().await?;

        let lines = tx
            .get_mut(user_id.as_str())
            .ok_or(CartsServiceError::NotFound)?;

        let line = lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or_else(|| CartsServiceError::LineNotFound(product_id.clone()))?;

        let previous = line.quantity;
        let product = self
            .products
            .reserve_for_cart(product_id.clone(), quantity.saturating_sub(previous))
            .await?;
        let updated_total = subtotal(product.price, quantity).ok_or_else(overflow)?;

        let adjustment = match quantity.cmp(&previous) {
            Ordering::Greater => Some((InventoryDirection::Reserve, quantity - previous)),
            Ordering::Less => Some((InventoryDirection::Release, previous - quantity)),
            Ordering::Equal => None,
        };

        if let Some((direction, delta)) = adjustment {
            self.products
                .adjust_inventory(product_id.clone(), delta, direction)
                .await?;
        }

        line.quantity = quantity;
        line.price = updated_total;
        line.total = updated_total;

        let updated = line.clone();

        if let Err(source) = tx.commit().await {
            if let Some((direction, delta)) = adjustment {
                self.compensate(&product_id, delta, direction).await;
            }

            return Err(source.into());
        }

        info!(%user_id, cart_id = %updated.cart_id, quantity, "updated cart quantity");

        Ok(updated)
    }

    async fn get_cart(
        &self,
        caller: Caller,
        target: Option<String>,
    ) -> Result<CartView, CartsServiceError> {
        if caller.is_admin && target.is_none() {
            return Ok(CartView::All(self.repository.all_carts().await?));
        }

        let user_id = caller.target(target.as_deref());

        self.repository
            .find_cart(&user_id)
            .await?
            .map(CartView::User)
            .ok_or(CartsServiceError::NotFound)
    }

    async fn total(&self, caller: Caller, target: Option<String>) -> Result<Decimal, CartsServiceError> {
        let user_id = caller.target(target.as_deref());

        let lines = self
            .repository
            .find_cart(&user_id)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        CartView::User(lines).total().ok_or_else(overflow)
    }

    #[tracing::instrument(
        name = "carts.service.consume_lines",
        skip(self, caller, lines),
        fields(caller = %caller.user_id, lines = lines.len()),
        err
    )]
    async fn consume_lines(
        &self,
        caller: Caller,
        lines: Vec<CartLine>,
        target: Option<String>,
    ) -> Result<Vec<CartLine>, CartsServiceError> {
        let user_id = caller.target(target.as_deref());
        let mut tx = self.repository.begin().await?;

        if !tx.contains(user_id.as_str()) {
            return Err(CartsServiceError::NotFound);
        }

        let consumed = tx.remove_lines(&user_id, |line| {
            lines.iter().any(|requested| line.matches(requested))
        });

        tx.commit().await?;

        info!(%user_id, consumed = consumed.len(), "consumed cart lines");

        Ok(consumed)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Adds `quantity` of a product to a user's cart, reserving the stock.
    /// Returns the user's lines afterwards.
    async fn add_item(
        &self,
        user_id: String,
        product_id: String,
        quantity: u64,
    ) -> Result<Vec<CartLine>, CartsServiceError>;

    /// Removes a product's line and releases its stock.
    async fn remove_item(
        &self,
        caller: Caller,
        product_id: String,
        target: Option<String>,
    ) -> Result<Option<CartLine>, CartsServiceError>;

    /// Sets a line's quantity, reserving or releasing the difference.
    async fn update_quantity(
        &self,
        caller: Caller,
        product_id: String,
        quantity: u64,
        target: Option<String>,
    ) -> Result<CartLine, CartsServiceError>;

    async fn get_cart(
        &self,
        caller: Caller,
        target: Option<String>,
    ) -> Result<CartView, CartsServiceError>;

    /// Sum of the line totals in a user's cart.
    async fn total(&self, caller: Caller, target: Option<String>) -> Result<Decimal, CartsServiceError>;

    /// Removes exactly the given lines without releasing their stock.
    async fn consume_lines(
        &self,
        caller: Caller,
        lines: Vec<CartLine>,
        target: Option<String>,
    ) -> Result<Vec<CartLine>, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        domain::products::{
            MockProductsService, ProductsServiceError, data::NewProduct, models::Product,
        },
        test::TestContext,
    };

    use super::*;

    async fn stocked(ctx: &TestContext, inventory: u64, price: i64) -> TestResult<Product> {
        Ok(ctx
            .products
            .create_product(
                Caller::new("100", false),
                NewProduct {
                    name: "Mug".to_string(),
                    price: Decimal::from(price),
                    description: None,
                    category: None,
                    inventory,
                },
            )
            .await?)
    }

    async fn inventory(ctx: &TestContext, product: &Product) -> TestResult<u64> {
        Ok(ctx
            .products
            .reserve_for_cart(product.id.clone(), 0)
            .await?
            .inventory)
    }

    #[tokio::test]
    async fn add_item_reserves_inventory() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 10, 5).await?;

        let lines = ctx.carts.add_item("1".to_string(), product.id.clone(), 3).await?;

        assert_eq!(lines.len(), 1);

        let line = lines.first().ok_or("one line")?;

        assert_eq!(line.quantity, 3);
        assert_eq!(line.price, Decimal::from(15));
        assert_eq!(line.total, Decimal::from(15));
        assert_eq!(inventory(&ctx, &product).await?, 7);

        Ok(())
    }

    #[tokio::test]
    async fn adding_same_product_merges_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 10, 4).await?;

        ctx.carts.add_item("1".to_string(), product.id.clone(), 2).await?;
        let lines = ctx.carts.add_item("1".to_string(), product.id.clone(), 3).await?;

        assert_eq!(lines.len(), 1, "one line per product");

        let line = lines.first().ok_or("one line")?;

        assert_eq!(line.quantity, 5);
        assert_eq!(line.total, Decimal::from(20));
        assert_eq!(line.price, line.total);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_beyond_stock_writes_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 2, 4).await?;

        let result = ctx.carts.add_item("1".to_string(), product.id.clone(), 3).await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Products(ProductsServiceError::InventoryExhausted { .. }))
            ),
            "expected InventoryExhausted, got {result:?}"
        );
        assert_eq!(inventory(&ctx, &product).await?, 2);

        let cart = ctx.carts.get_cart(Caller::new("1", false), None).await;

        assert!(
            matches!(cart, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {cart:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_item_with_zero_quantity_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx.carts.add_item("1".to_string(), "1".to_string(), 0).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidData(_))),
            "expected InvalidData, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn failed_reservation_leaves_cart_untouched() -> TestResult {
        let ctx = TestContext::new().await;
        let mut products = MockProductsService::new();

        products
            .expect_reserve_for_cart()
            .with(eq("7".to_string()), eq(1))
            .returning(|id, _| {
                Ok(Product {
                    id,
                    user_id: "100".to_string(),
                    name: "Mug".to_string(),
                    price: Decimal::from(2),
                    description: None,
                    category: None,
                    inventory: 1,
                })
            });

        products
            .expect_adjust_inventory()
            .returning(|_, requested, _| {
                Err(ProductsServiceError::InventoryExhausted {
                    requested,
                    available: 0,
                })
            });

        let carts = FileCartsService::new(ctx.config.carts(), Arc::new(products), ctx.sequence.clone());

        let result = carts.add_item("1".to_string(), "7".to_string(), 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::Products(_))),
            "expected Products error, got {result:?}"
        );

        let cart = carts.get_cart(Caller::new("1", false), None).await;

        assert!(
            matches!(cart, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {cart:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn removing_only_line_drops_user_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 5, 1).await?;
        let caller = Caller::new("1", false);

        ctx.carts.add_item("1".to_string(), product.id.clone(), 2).await?;

        let removed = ctx
            .carts
            .remove_item(caller.clone(), product.id.clone(), None)
            .await?;

        assert_eq!(removed.map(|line| line.quantity), Some(2));
        assert_eq!(inventory(&ctx, &product).await?, 5);

        let view = ctx.carts.get_cart(Caller::new("9", true), None).await?;

        assert!(
            matches!(&view, CartView::All(carts) if carts.iter().count() == 0),
            "expected no carts, got {view:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_without_cart_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx
            .carts
            .remove_item(Caller::new("1", false), "1".to_string(), None)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_adjusts_inventory_by_delta() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 10, 3).await?;
        let caller = Caller::new("1", false);

        ctx.carts.add_item("1".to_string(), product.id.clone(), 2).await?;

        let grown = ctx
            .carts
            .update_quantity(caller.clone(), product.id.clone(), 6, None)
            .await?;

        assert_eq!(grown.total, Decimal::from(18));
        assert_eq!(grown.price, grown.total);
        assert_eq!(inventory(&ctx, &product).await?, 4);

        let shrunk = ctx
            .carts
            .update_quantity(caller, product.id.clone(), 1, None)
            .await?;

        assert_eq!(shrunk.total, Decimal::from(3));
        assert_eq!(inventory(&ctx, &product).await?, 9);

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_beyond_stock_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 3, 3).await?;

        ctx.carts.add_item("1".to_string(), product.id.clone(), 2).await?;

        let result = ctx
            .carts
            .update_quantity(Caller::new("1", false), product.id.clone(), 5, None)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::Products(_))),
            "expected Products error, got {result:?}"
        );
        assert_eq!(inventory(&ctx, &product).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn update_quantity_of_missing_line_is_line_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 3, 3).await?;

        ctx.carts.add_item("1".to_string(), product.id.clone(), 1).await?;

        let result = ctx
            .carts
            .update_quantity(Caller::new("1", false), "404".to_string(), 1, None)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::LineNotFound(_))),
            "expected LineNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn total_sums_line_totals() -> TestResult {
        let ctx = TestContext::new().await;
        let mug = stocked(&ctx, 10, 3).await?;
        let jug = stocked(&ctx, 10, 7).await?;

        ctx.carts.add_item("1".to_string(), mug.id.clone(), 2).await?;
        ctx.carts.add_item("1".to_string(), jug.id.clone(), 1).await?;

        assert_eq!(ctx.carts.total(Caller::new("1", false), None).await?, Decimal::from(13));

        let admin_view = ctx.carts.total(Caller::new("9", true), Some("1".to_string())).await?;

        assert_eq!(admin_view, Decimal::from(13));

        Ok(())
    }

    #[tokio::test]
    async fn consume_lines_removes_only_exact_matches() -> TestResult {
        let ctx = TestContext::new().await;
        let mug = stocked(&ctx, 10, 3).await?;
        let jug = stocked(&ctx, 10, 7).await?;
        let caller = Caller::new("1", false);

        ctx.carts.add_item("1".to_string(), mug.id.clone(), 2).await?;
        let lines = ctx.carts.add_item("1".to_string(), jug.id.clone(), 1).await?;

        let mug_line = lines
            .iter()
            .find(|line| line.product_id == mug.id)
            .cloned()
            .ok_or("mug line")?;

        let stale = CartLine {
            quantity: 9,
            ..mug_line.clone()
        };

        let consumed = ctx
            .carts
            .consume_lines(caller.clone(), vec![stale], None)
            .await?;

        assert!(consumed.is_empty(), "stale quantity matches nothing");

        let consumed = ctx
            .carts
            .consume_lines(caller.clone(), vec![mug_line], None)
            .await?;

        assert_eq!(consumed.len(), 1);
        assert_eq!(inventory(&ctx, &mug).await?, 8, "consumed stock stays reserved");

        let view = ctx.carts.get_cart(caller, None).await?;

        assert!(
            matches!(&view, CartView::User(lines) if lines.len() == 1),
            "expected the jug line only, got {view:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn overflowing_subtotal_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 10_000_000_000_000_000_000, 10_000_000_000).await?;

        let result = ctx
            .carts
            .add_item("1".to_string(), product.id.clone(), 10_000_000_000_000_000_000)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidData(_))),
            "expected InvalidData, got {result:?}"
        );
        assert_eq!(inventory(&ctx, &product).await?, 10_000_000_000_000_000_000);

        let cart = ctx.carts.get_cart(Caller::new("1", false), None).await;

        assert!(
            matches!(cart, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {cart:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn admin_removes_from_the_target_users_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 10, 2).await?;

        ctx.carts.add_item("1".to_string(), product.id.clone(), 4).await?;

        let removed = ctx
            .carts
            .remove_item(Caller::new("9", true), product.id.clone(), Some("1".to_string()))
            .await?;

        assert_eq!(removed.map(|line| line.quantity), Some(4));
        assert_eq!(inventory(&ctx, &product).await?, 10);

        let cart = ctx.carts.get_cart(Caller::new("1", false), None).await;

        assert!(
            matches!(cart, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {cart:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn admin_updates_the_target_users_line() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 10, 2).await?;

        ctx.carts.add_item("1".to_string(), product.id.clone(), 1).await?;

        let updated = ctx
            .carts
            .update_quantity(Caller::new("9", true), product.id.clone(), 5, Some("1".to_string()))
            .await?;

        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.total, Decimal::from(10));
        assert_eq!(inventory(&ctx, &product).await?, 5);

        let cart = ctx.carts.get_cart(Caller::new("1", false), None).await?;

        assert!(
            matches!(&cart, CartView::User(lines) if lines.iter().all(|line| line.quantity == 5)),
            "expected the updated line in user 1's cart, got {cart:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn non_admin_target_acts_on_own_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let product = stocked(&ctx, 10, 2).await?;
        let caller = Caller::new("2", false);

        ctx.carts.add_item("1".to_string(), product.id.clone(), 3).await?;
        ctx.carts.add_item("2".to_string(), product.id.clone(), 1).await?;

        let updated = ctx
            .carts
            .update_quantity(caller.clone(), product.id.clone(), 2, Some("1".to_string()))
            .await?;

        assert_eq!(updated.quantity, 2);
        assert_eq!(inventory(&ctx, &product).await?, 5);

        let removed = ctx
            .carts
            .remove_item(caller.clone(), product.id.clone(), Some("1".to_string()))
            .await?;

        assert_eq!(removed.map(|line| line.quantity), Some(2));
        assert_eq!(inventory(&ctx, &product).await?, 7);

        let own = ctx.carts.get_cart(caller, None).await;

        assert!(
            matches!(own, Err(CartsServiceError::NotFound)),
            "expected the caller's cart emptied, got {own:?}"
        );

        let other = ctx.carts.get_cart(Caller::new("1", false), None).await?;

        assert!(
            matches!(&other, CartView::User(lines) if lines.len() == 1 && lines.iter().all(|line| line.quantity == 3)),
            "expected user 1's cart untouched, got {other:?}"
        );

        Ok(())
    }
}

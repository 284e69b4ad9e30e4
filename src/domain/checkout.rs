//! Checkout.
//!
//! Turns cart lines into order lines. The order write always lands before the
//! cart lines are consumed, so a failed order leaves the cart as it was.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use thiserror::Error;
use tracing::info;

use crate::{
    auth::Caller,
    domain::{
        carts::{CartsService, CartsServiceError, models::CartView},
        orders::{
            OrdersService, OrdersServiceError,
            data::{NewOrder, PlacedOrder},
            models::{Order, OrderStatus},
        },
    },
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("none of the requested products are in the cart")]
    NoMatchingItems,

    #[error(transparent)]
    Carts(#[from] CartsServiceError),

    #[error(transparent)]
    Orders(#[from] OrdersServiceError),
}

#[derive(Clone)]
pub struct LedgerCheckoutService {
    carts: Arc<dyn CartsService>,
    orders: Arc<dyn OrdersService>,
}

impl std::fmt::Debug for LedgerCheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerCheckoutService").finish_non_exhaustive()
    }
}

impl LedgerCheckoutService {
    #[must_use]
    pub fn new(carts: Arc<dyn CartsService>, orders: Arc<dyn OrdersService>) -> Self {
        Self { carts, orders }
    }
}

#[async_trait]
impl CheckoutService for LedgerCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.place_order",
        skip(self, caller),
        fields(caller = %caller.user_id),
        err
    )]
    async fn place_order(
        &self,
        caller: Caller,
        product_ids: Vec<String>,
        status: OrderStatus,
        target: Option<String>,
    ) -> Result<Order, CheckoutError> {
        let user_id = caller.target(target.as_deref());

        let lines = match self.carts.get_cart(caller.clone(), Some(user_id.clone())).await {
            Ok(CartView::User(lines)) => lines,
            Ok(CartView::All(_)) | Err(CartsServiceError::NotFound) => {
                return Err(CheckoutError::EmptyCart);
            }
            Err(error) => return Err(error.into()),
        };

        let selected: Vec<_> = lines
            .into_iter()
            .filter(|line| product_ids.contains(&line.product_id))
            .map(|mut line| {
                line.status = Some(status);
                line
            })
            .collect();

        if selected.is_empty() {
            return Err(CheckoutError::NoMatchingItems);
        }

        let placed = self
            .orders
            .create_order(NewOrder {
                user_id: user_id.clone(),
                items: selected.iter().map(|line| line.to_order_line(status)).collect(),
                timestamp: Timestamp::now().as_millisecond(),
            })
            .await?;

        // Lines for products the order already held stay in the cart.
        let converted: Vec<_> = selected
            .into_iter()
            .filter(|line| placed.accepted.contains(&line.product_id))
            .collect();

        if !converted.is_empty() {
            self.carts
                .consume_lines(caller, converted, Some(user_id))
                .await?;
        }

        info!(
            order_id = %placed.order.id,
            accepted = placed.accepted.len(),
            "placed order"
        );

        Ok(placed.order)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Moves the listed products from the user's cart into their order.
    async fn place_order(
        &self,
        caller: Caller,
        product_ids: Vec<String>,
        status: OrderStatus,
        target: Option<String>,
    ) -> Result<Order, CheckoutError>;
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::domain::{
        carts::{MockCartsService, models::CartLine},
        orders::MockOrdersService,
    };

    use super::*;

    fn cart_line(product_id: &str) -> CartLine {
        CartLine {
            cart_id: format!("c{product_id}"),
            product_id: product_id.to_string(),
            quantity: 1,
            price: Decimal::from(2),
            total: Decimal::from(2),
            status: None,
        }
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn failed_order_write_keeps_cart_lines() -> TestResult {
        let mut carts = MockCartsService::new();
        let mut orders = MockOrdersService::new();

        carts
            .expect_get_cart()
            .returning(|_, _| Ok(CartView::User(vec![cart_line("a")])));
        carts.expect_consume_lines().never();

        orders
            .expect_create_order()
            .returning(|_| Err(OrdersServiceError::InvalidData("disk full".to_string())));

        let checkout = LedgerCheckoutService::new(Arc::new(carts), Arc::new(orders));

        let result = checkout
            .place_order(Caller::new("1", false), ids(&["a"]), OrderStatus::Pending, None)
            .await;

        assert!(
            matches!(result, Err(CheckoutError::Orders(_))),
            "expected Orders error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unmatched_products_are_rejected() -> TestResult {
        let mut carts = MockCartsService::new();
        let mut orders = MockOrdersService::new();

        carts
            .expect_get_cart()
            .returning(|_, _| Ok(CartView::User(vec![cart_line("a")])));
        orders.expect_create_order().never();

        let checkout = LedgerCheckoutService::new(Arc::new(carts), Arc::new(orders));

        let result = checkout
            .place_order(Caller::new("1", false), ids(&["b"]), OrderStatus::Pending, None)
            .await;

        assert!(
            matches!(result, Err(CheckoutError::NoMatchingItems)),
            "expected NoMatchingItems, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_cart_is_empty_cart() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_get_cart()
            .returning(|_, _| Err(CartsServiceError::NotFound));

        let checkout = LedgerCheckoutService::new(Arc::new(carts), Arc::new(MockOrdersService::new()));

        let result = checkout
            .place_order(Caller::new("1", false), ids(&["a"]), OrderStatus::Pending, None)
            .await;

        assert!(
            matches!(result, Err(CheckoutError::EmptyCart)),
            "expected EmptyCart, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn admin_checkout_consumes_the_target_users_cart() -> TestResult {
        let mut carts = MockCartsService::new();
        let mut orders = MockOrdersService::new();

        carts
            .expect_get_cart()
            .withf(|_, target| target.as_deref() == Some("5"))
            .returning(|_, _| Ok(CartView::User(vec![cart_line("a"), cart_line("b")])));
        carts
            .expect_consume_lines()
            .withf(|_, lines, target| lines.len() == 1 && target.as_deref() == Some("5"))
            .times(1)
            .returning(|_, lines, _| Ok(lines));

        orders.expect_create_order().returning(|order| {
            Ok(PlacedOrder {
                accepted: order.items.iter().map(|line| line.product_id.clone()).collect(),
                order: Order {
                    id: "1".to_string(),
                    user_id: order.user_id,
                    total: order.items.iter().map(|line| line.total).sum(),
                    items: order.items,
                    timestamp: order.timestamp,
                },
            })
        });

        let checkout = LedgerCheckoutService::new(Arc::new(carts), Arc::new(orders));

        let order = checkout
            .place_order(
                Caller::new("9", true),
                ids(&["b"]),
                OrderStatus::Done,
                Some("5".to_string()),
            )
            .await?;

        assert_eq!(order.user_id, "5");
        assert_eq!(order.items.first().map(|line| line.status), Some(OrderStatus::Done));

        Ok(())
    }

    #[tokio::test]
    async fn lines_the_order_already_held_are_not_consumed() -> TestResult {
        let mut carts = MockCartsService::new();
        let mut orders = MockOrdersService::new();

        carts
            .expect_get_cart()
            .returning(|_, _| Ok(CartView::User(vec![cart_line("a"), cart_line("b")])));
        carts
            .expect_consume_lines()
            .withf(|_, lines, _| {
                lines.len() == 1 && lines.iter().all(|line| line.product_id == "b")
            })
            .times(1)
            .returning(|_, lines, _| Ok(lines));

        orders.expect_create_order().returning(|order| {
            Ok(PlacedOrder {
                accepted: vec!["b".to_string()],
                order: Order {
                    id: "1".to_string(),
                    user_id: order.user_id,
                    total: Decimal::from(4),
                    items: order.items,
                    timestamp: order.timestamp,
                },
            })
        });

        let checkout = LedgerCheckoutService::new(Arc::new(carts), Arc::new(orders));

        checkout
            .place_order(Caller::new("1", false), ids(&["a", "b"]), OrderStatus::Pending, None)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn nothing_accepted_leaves_the_cart_alone() -> TestResult {
        let mut carts = MockCartsService::new();
        let mut orders = MockOrdersService::new();

        carts
            .expect_get_cart()
            .returning(|_, _| Ok(CartView::User(vec![cart_line("a")])));
        carts.expect_consume_lines().never();

        orders.expect_create_order().returning(|order| {
            Ok(PlacedOrder {
                accepted: Vec::new(),
                order: Order {
                    id: "1".to_string(),
                    user_id: order.user_id,
                    total: Decimal::from(2),
                    items: order.items,
                    timestamp: order.timestamp,
                },
            })
        });

        let checkout = LedgerCheckoutService::new(Arc::new(carts), Arc::new(orders));

        checkout
            .place_order(Caller::new("1", false), ids(&["a"]), OrderStatus::Pending, None)
            .await?;

        Ok(())
    }
}

//! Cart Models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    domain::orders::models::{OrderLine, OrderStatus},
    store::{Table, UserMap},
};

/// Cart Line Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub cart_id: String,
    pub product_id: String,
    pub quantity: u64,
    /// Line subtotal: quantity times the unit price.
    pub price: Decimal,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl CartLine {
    /// Whether `self` is the same line as `other`, by line id, product and quantity.
    pub fn matches(&self, other: &CartLine) -> bool {
        self.cart_id == other.cart_id
            && self.product_id == other.product_id
            && self.quantity == other.quantity
    }

    /// Converts the line into an order line with `status`.
    pub fn to_order_line(&self, status: OrderStatus) -> OrderLine {
        OrderLine {
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            price: self.price,
            total: self.total,
            status,
        }
    }
}

/// Cart file document.
pub type CartTable = Table<UserMap<Vec<CartLine>>>;

/// What a caller is allowed to see of the cart file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CartView {
    /// Every user's cart, for an admin.
    All(UserMap<Vec<CartLine>>),
    User(Vec<CartLine>),
}

impl CartView {
    /// Sum of line totals across the view, or `None` if it overflows.
    pub fn total(&self) -> Option<Decimal> {
        match self {
            Self::All(carts) => sum_totals(carts.iter().flat_map(|(_, lines)| lines)),
            Self::User(lines) => sum_totals(lines),
        }
    }
}

fn sum_totals<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> Option<Decimal> {
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.total))
}

/// Line subtotal for `quantity` units at `unit_price`, or `None` if it overflows.
pub fn subtotal(unit_price: Decimal, quantity: u64) -> Option<Decimal> {
    unit_price.checked_mul(Decimal::from(quantity))
}

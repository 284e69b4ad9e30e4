//! Order Models

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    domain::orders::errors::OrdersServiceError,
    store::{Table, UserMap},
};

/// Order line status. `Done` lines can no longer be deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Done,
}

impl FromStr for OrderStatus {
    type Err = OrdersServiceError;

    fn from_str(status: &str) -> Result<Self, Self::Err> {
        match status {
            "Pending" => Ok(Self::Pending),
            "Done" => Ok(Self::Done),
            other => Err(OrdersServiceError::InvalidStatus(other.to_string())),
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Pending => "Pending",
            Self::Done => "Done",
        })
    }
}

/// Order Line Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u64,
    pub price: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
}

/// Order Model
///
/// One per user. Holds at most one line per product id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total: Decimal,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

impl Order {
    /// Appends the lines whose product is not already ordered and returns
    /// the product ids that were taken.
    ///
    /// Existing lines win over new ones, and the first of any duplicates in
    /// `lines` wins over the rest. A line is never overwritten.
    ///
    /// # Errors
    ///
    /// [`OrdersServiceError::InvalidData`] when the new total overflows; the
    /// order is left unchanged.
    pub fn merge(&mut self, lines: Vec<OrderLine>) -> Result<Vec<String>, OrdersServiceError> {
        let mut seen: FxHashSet<String> = self
            .items
            .iter()
            .map(|line| line.product_id.clone())
            .collect();

        let accepted: Vec<OrderLine> = lines
            .into_iter()
            .filter(|line| seen.insert(line.product_id.clone()))
            .collect();

        let total = line_total(self.items.iter().chain(&accepted))?;
        let product_ids = accepted.iter().map(|line| line.product_id.clone()).collect();

        self.items.extend(accepted);
        self.total = total;

        Ok(product_ids)
    }

    /// Sets `total` to the sum of the line totals.
    ///
    /// # Errors
    ///
    /// [`OrdersServiceError::InvalidData`] when the sum overflows.
    pub fn recompute_total(&mut self) -> Result<(), OrdersServiceError> {
        self.total = line_total(&self.items)?;

        Ok(())
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|line| line.product_id == product_id)
    }
}

fn line_total<'a>(
    lines: impl IntoIterator<Item = &'a OrderLine>,
) -> Result<Decimal, OrdersServiceError> {
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.total))
        .ok_or_else(|| OrdersServiceError::InvalidData("order total overflows".to_string()))
}

/// Orders file document.
pub type OrderTable = Table<UserMap<Order>>;

/// What a caller is allowed to see of the orders file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderView {
    /// Every user's order, for an admin.
    All(UserMap<Order>),
    User(Order),
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn line(product_id: &str, quantity: u64, total: i64) -> OrderLine {
        OrderLine {
            product_id: product_id.to_string(),
            quantity,
            price: Decimal::from(total),
            total: Decimal::from(total),
            status: OrderStatus::Pending,
        }
    }

    #[test]
    fn merge_keeps_first_occurrence() -> TestResult {
        let mut order = Order {
            id: "1".to_string(),
            user_id: "7".to_string(),
            items: vec![line("a", 1, 10)],
            total: Decimal::ZERO,
            timestamp: 0,
        };

        let accepted = order.merge(vec![line("a", 5, 50), line("b", 2, 4), line("b", 9, 90)])?;

        assert_eq!(accepted, vec!["b".to_string()]);
        assert_eq!(order.items, vec![line("a", 1, 10), line("b", 2, 4)]);
        assert_eq!(order.total, Decimal::from(14));

        Ok(())
    }

    #[test]
    fn overflowing_merge_leaves_order_unchanged() {
        let huge = OrderLine {
            total: Decimal::MAX,
            ..line("a", 1, 0)
        };

        let mut order = Order {
            id: "1".to_string(),
            user_id: "7".to_string(),
            items: vec![huge.clone()],
            total: Decimal::MAX,
            timestamp: 0,
        };

        let result = order.merge(vec![OrderLine {
            product_id: "b".to_string(),
            ..huge
        }]);

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidData(_))),
            "expected InvalidData, got {result:?}"
        );
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total, Decimal::MAX);
    }

    #[test]
    fn status_parsing_is_exact() {
        assert!(matches!("Done".parse(), Ok(OrderStatus::Done)), "Done parses");
        assert!(matches!("Pending".parse(), Ok(OrderStatus::Pending)), "Pending parses");

        let result = "done".parse::<OrderStatus>();

        assert!(
            matches!(&result, Err(OrdersServiceError::InvalidStatus(status)) if status == "done"),
            "expected InvalidStatus, got {result:?}"
        );
    }

    #[test]
    fn orders_file_shape() -> TestResult {
        let raw = r#"[{"7":{"id":"1","userId":"7","items":[{"productId":"3","quantity":2,"price":10.0,"total":10.0,"status":"Done"}],"total":10.0,"timestamp":1700000000000}}]"#;

        let table: OrderTable = serde_json::from_str(raw)?;
        let order = table.get("7").ok_or("order for user 7")?;

        assert_eq!(order.items.first().map(|line| line.status), Some(OrderStatus::Done));
        assert_eq!(order.timestamp, 1_700_000_000_000);

        let encoded: serde_json::Value = serde_json::to_value(&table)?;
        let original: serde_json::Value = serde_json::from_str(raw)?;

        assert_eq!(encoded, original);

        Ok(())
    }
}

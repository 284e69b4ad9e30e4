//! Orders service.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    auth::Caller,
    domain::orders::{
        data::{DeletionOutcome, NewOrder, PlacedOrder, UpdateOrder},
        errors::OrdersServiceError,
        models::{Order, OrderStatus, OrderTable, OrderView},
        repository::FileOrdersRepository,
    },
    sequence::{SequenceGenerator, SequenceKind},
    store::RecordStore,
};

#[derive(Debug, Clone)]
pub struct FileOrdersService {
    repository: FileOrdersRepository,
    sequence: SequenceGenerator,
}

impl FileOrdersService {
    #[must_use]
    pub fn new(store: RecordStore<OrderTable>, sequence: SequenceGenerator) -> Self {
        Self {
            repository: FileOrdersRepository::new(store),
            sequence,
        }
    }
}

fn validate(order: &NewOrder) -> Result<(), OrdersServiceError> {
    if order.user_id.trim().is_empty() {
        return Err(OrdersServiceError::InvalidData("user id is required".to_string()));
    }

    if order.items.is_empty() {
        return Err(OrdersServiceError::InvalidData(
            "an order needs at least one item".to_string(),
        ));
    }

    if let Some(line) = order
        .items
        .iter()
        .find(|line| line.product_id.is_empty() || line.quantity == 0)
    {
        return Err(OrdersServiceError::InvalidData(format!(
            "item {:?} needs a product id and a positive quantity",
            line.product_id
        )));
    }

    Ok(())
}

#[async_trait]
impl OrdersService for FileOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(user_id = %order.user_id, items = order.items.len()),
        err
    )]
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, OrdersServiceError> {
        validate(&order)?;

        let mut tx = self.repository.begin().await?;

        let (stored, accepted) = if let Some(existing) = tx.get_mut(order.user_id.as_str()) {
            let accepted = existing.merge(order.items)?;

            (existing.clone(), accepted)
        } else {
            let mut created = Order {
                id: self.sequence.next_id(SequenceKind::Order).await?,
                user_id: order.user_id.clone(),
                items: Vec::with_capacity(order.items.len()),
                total: Decimal::ZERO,
                timestamp: order.timestamp,
            };

            let accepted = created.merge(order.items)?;

            tx.upsert(order.user_id, created.clone());

            (created, accepted)
        };

        tx.commit().await?;

        info!(order_id = %stored.id, total = %stored.total, accepted = accepted.len(), "stored order");

        Ok(PlacedOrder {
            order: stored,
            accepted,
        })
    }

    #[tracing::instrument(
        name = "orders.service.update_order",
        skip(self, caller, update),
        fields(caller = %caller.user_id, status = %update.status),
        err
    )]
    async fn update_order(
        &self,
        caller: Caller,
        update: UpdateOrder,
        target: Option<String>,
    ) -> Result<Order, OrdersServiceError> {
        let user_id = caller.target(target.as_deref());
        let mut tx = self.repository.begin().await?;

        let order = tx.get_mut(user_id.as_str()).ok_or(OrdersServiceError::NotFound)?;

        for line in &mut order.items {
            if update.product_ids.contains(&line.product_id) {
                line.status = update.status;
            }
        }

        let updated = order.clone();

        tx.commit().await?;

        info!(%user_id, order_id = %updated.id, "updated order status");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "orders.service.delete_order",
        skip(self, caller),
        fields(caller = %caller.user_id),
        err
    )]
    async fn delete_order(
        &self,
        caller: Caller,
        product_ids: Vec<String>,
        target: Option<String>,
    ) -> Result<DeletionOutcome, OrdersServiceError> {
        let user_id = caller.target(target.as_deref());
        let mut tx = self.repository.begin().await?;

        let order = tx.get_mut(user_id.as_str()).ok_or(OrdersServiceError::NotFound)?;

        let mut removed = Vec::new();
        let mut skipped_final = Vec::new();

        order.items.retain(|line| {
            if !product_ids.contains(&line.product_id) {
                return true;
            }

            if line.status == OrderStatus::Done {
                skipped_final.push(line.product_id.clone());
                return true;
            }

            removed.push(line.product_id.clone());
            false
        });

        order.recompute_total()?;

        let order = order.clone();

        tx.commit().await?;

        if !skipped_final.is_empty() {
            warn!(%user_id, skipped = ?skipped_final, "done lines cannot be removed");
        }

        info!(%user_id, removed = ?removed, "deleted order lines");

        Ok(DeletionOutcome {
            removed,
            skipped_final,
            order,
        })
    }

    async fn get_orders(
        &self,
        caller: Caller,
        target: Option<String>,
    ) -> Result<OrderView, OrdersServiceError> {
        if caller.is_admin && target.is_none() {
            return Ok(OrderView::All(self.repository.all_orders().await?));
        }

        let user_id = caller.target(target.as_deref());

        self.repository
            .find_order(&user_id)
            .await?
            .map(OrderView::User)
            .ok_or(OrdersServiceError::NotFound)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Stores a user's first order, or merges new lines into the existing one.
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, OrdersServiceError>;

    /// Sets the status of every listed product's line.
    async fn update_order(
        &self,
        caller: Caller,
        update: UpdateOrder,
        target: Option<String>,
    ) -> Result<Order, OrdersServiceError>;

    /// Drops the listed lines, keeping any that are already `Done`.
    async fn delete_order(
        &self,
        caller: Caller,
        product_ids: Vec<String>,
        target: Option<String>,
    ) -> Result<DeletionOutcome, OrdersServiceError>;

    /// Every order for an admin without a target, otherwise one user's.
    async fn get_orders(
        &self,
        caller: Caller,
        target: Option<String>,
    ) -> Result<OrderView, OrdersServiceError>;
}

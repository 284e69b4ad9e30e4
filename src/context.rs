//! App Context

use std::sync::Arc;

use crate::{
    auth::{AuthService, FileAuthService},
    config::StoreConfig,
    domain::{
        carts::{CartsService, FileCartsService},
        checkout::{CheckoutService, LedgerCheckoutService},
        orders::{FileOrdersService, OrdersService},
        products::{FileProductsService, ProductsService},
    },
    sequence::SequenceGenerator,
};

#[derive(Clone)]
pub struct AppContext {
    pub auth: Arc<dyn AuthService>,
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub checkout: Arc<dyn CheckoutService>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wires every service to the collection files under `config`.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        let sequence = SequenceGenerator::new(config.counters());

        let products: Arc<dyn ProductsService> = Arc::new(FileProductsService::new(
            config.products(),
            config.categories(),
            sequence.clone(),
        ));

        let carts: Arc<dyn CartsService> = Arc::new(FileCartsService::new(
            config.carts(),
            products.clone(),
            sequence.clone(),
        ));

        let orders: Arc<dyn OrdersService> =
            Arc::new(FileOrdersService::new(config.orders(), sequence.clone()));

        Self {
            auth: Arc::new(FileAuthService::new(config.users(), config.session(), sequence)),
            checkout: Arc::new(LedgerCheckoutService::new(carts.clone(), orders.clone())),
            products,
            carts,
            orders,
        }
    }
}

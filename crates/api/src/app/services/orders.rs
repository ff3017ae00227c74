use std::sync::Arc;

use menuhub_catalog::{NewOrder, Order};
use menuhub_core::CustomerId;
use menuhub_infra::OrderStore;

use crate::app::errors::ServiceError;

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    span: tracing::Span,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, span: tracing::Span) -> Self {
        Self { store, span }
    }

    /// `customer` is recorded when the request carried a customer token.
    pub async fn place(&self, mut input: NewOrder, customer: Option<CustomerId>) -> Result<Order, ServiceError> {
        input.customer_id = customer;
        let order = self.store.insert_order(input.validate()?).await?;
        tracing::info!(
            parent: &self.span,
            order_id = %order.id,
            delivery_method = order.delivery_method.as_str(),
            anonymous = order.customer_id.is_none(),
            "order placed"
        );
        Ok(order)
    }

    pub async fn list(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.store.list_orders().await?)
    }
}

use async_trait::async_trait;
use tracing::{debug, error, info, instrument};
use crate::actor_framework::{FrameworkError, ResourceClient};
use crate::domain::{LineItem, NewOrder, Order, OrderCode, OrderStatus, StatusChange, StatusSnapshot};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
use crate::stores::{ChangeFeed, OrderPage, OrderQuery, OrderStore, StatusSubscription};

/// Client for interacting with the Order actor.
///
/// Orders are addressed by row id inside the actor and by order code
/// everywhere else; this client translates between the two.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl_basic_client!(OrderClient, Order, OrderError, order);

impl OrderClient {
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &OrderCode) -> Result<Option<Order>, OrderError> {
        debug!("Sending request");
        let wanted = code.clone();
        let mut found = self.inner.find(move |order: &Order| order.code == wanted).await?;
        if found.len() > 1 {
            error!(rows = found.len(), "Order code matches several rows");
            return Err(OrderError::DuplicateCode(code.to_string()));
        }
        Ok(found.pop())
    }

    async fn status_action(&self, code: &OrderCode, action: OrderAction) -> Result<StatusChange, OrderError> {
        let order = self.find_by_code(code).await?.ok_or_else(|| OrderError::not_found(code))?;
        match self.inner.perform_action(order.row_id, action).await? {
            OrderActionResult::SetStatus(change) | OrderActionResult::AdvanceIf(change) => Ok(change),
            OrderActionResult::AttachItems(_) => {
                Err(OrderError::ActorCommunicationError("Unexpected result".to_string()))
            }
        }
    }
}

#[async_trait]
impl OrderStore for OrderClient {
    #[instrument(skip(self, order), fields(order_code = %order.code, user_id = %order.user_id))]
    async fn create_order(&self, order: NewOrder) -> Result<String, OrderError> {
        debug!("Sending request");
        let code = order.code.clone();
        let row_id = self.inner.create(order).await.map_err(|e| match e {
            FrameworkError::Conflict(_) => OrderError::DuplicateCode(code.to_string()),
            other => other.into(),
        })?;
        info!(row_id = %row_id, "Order row created");
        Ok(row_id)
    }

    #[instrument(skip(self, items), fields(item_count = items.len()))]
    async fn create_line_items(&self, row_id: &str, items: Vec<LineItem>) -> Result<(), OrderError> {
        debug!("Sending request");
        match self.inner.perform_action(row_id.to_string(), OrderAction::AttachItems(items)).await? {
            OrderActionResult::AttachItems(_) => Ok(()),
            _ => Err(OrderError::ActorCommunicationError("Unexpected result".to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn get_status(&self, code: &OrderCode) -> Result<Option<StatusSnapshot>, OrderError> {
        Ok(self.find_by_code(code).await?.map(|order| order.snapshot()))
    }

    #[instrument(skip(self))]
    async fn set_status(&self, code: &OrderCode, status: OrderStatus) -> Result<StatusChange, OrderError> {
        self.status_action(code, OrderAction::SetStatus(status)).await
    }

    #[instrument(skip(self))]
    async fn advance_status_if(
        &self,
        code: &OrderCode,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusChange, OrderError> {
        self.status_action(code, OrderAction::AdvanceIf { expected, to }).await
    }

    #[instrument(skip(self))]
    async fn list_orders(&self, query: &OrderQuery) -> Result<OrderPage, OrderError> {
        debug!("Sending request");
        let filter = query.clone();
        let matching = self.inner.find(move |order: &Order| filter.matches(order)).await?;
        Ok(query.paginate(matching))
    }
}

#[async_trait]
impl ChangeFeed for OrderClient {
    #[instrument(skip(self))]
    async fn subscribe(&self, code: &OrderCode) -> Result<StatusSubscription, OrderError> {
        debug!("Subscribing to order changes");
        Ok(StatusSubscription::new(code.clone(), self.inner.subscribe()))
    }
}

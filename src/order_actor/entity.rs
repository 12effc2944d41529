use chrono::Utc;
use tracing::debug;
use crate::actor_framework::Entity;
use crate::domain::{NewOrder, Order, OrderStatus, StatusChange};
use super::actions::{OrderAction, OrderActionResult};

impl Entity for Order {
    type Id = String;
    type CreatePayload = NewOrder;
    type Patch = (); // Orders only change through status actions
    type Action = OrderAction;
    type ActionResult = OrderActionResult;

    fn id(&self) -> &String { &self.row_id }

    /// Creates the order row in `Placed` status with no line items yet.
    fn from_create(row_id: String, params: NewOrder) -> Result<Self, String> {
        if params.address.trim().is_empty() {
            return Err("delivery address is required".to_string());
        }
        if params.total > params.subtotal {
            return Err(format!("total {} exceeds subtotal {}", params.total, params.subtotal));
        }
        if params.subtotal - params.total != params.points_redeemed {
            return Err("total must equal subtotal minus redeemed points".to_string());
        }
        Ok(Self {
            row_id,
            code: params.code,
            user_id: params.user_id,
            items: Vec::new(),
            subtotal: params.subtotal,
            total: params.total,
            address: params.address,
            notes: params.notes,
            status: OrderStatus::Placed,
            placed_at: params.placed_at,
            updated_at: params.placed_at,
            points_earned: params.points_earned,
            points_redeemed: params.points_redeemed,
        })
    }

    /// Order codes are how customers and staff address an order, so they must be unique.
    fn conflicts_with(&self, other: &Self) -> bool {
        self.code == other.code
    }

    fn on_update(&mut self, _patch: ()) -> Result<(), String> {
        Ok(())
    }

    /// # Actions
    /// - `AttachItems`: stores the line items once
    /// - `SetStatus`: forward-only status write
    /// - `AdvanceIf`: conditional status write
    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, String> {
        match action {
            OrderAction::AttachItems(items) => {
                if items.is_empty() {
                    return Err("an order needs at least one item".to_string());
                }
                if !self.items.is_empty() {
                    return Err(format!("order {} already has items", self.code));
                }
                self.items = items;
                Ok(OrderActionResult::AttachItems(self.items.len()))
            }
            OrderAction::SetStatus(to) => Ok(OrderActionResult::SetStatus(self.advance(to))),
            OrderAction::AdvanceIf { expected, to } => {
                if self.status != expected {
                    debug!(order_code = %self.code, current = %self.status, %expected, "Conditional status write skipped");
                    return Ok(OrderActionResult::AdvanceIf(StatusChange::Unchanged(self.snapshot())));
                }
                Ok(OrderActionResult::AdvanceIf(self.advance(to)))
            }
        }
    }
}

impl Order {
    fn advance(&mut self, to: OrderStatus) -> StatusChange {
        match self.status.validate_transition(to) {
            Ok(()) => {
                self.status = to;
                self.updated_at = Utc::now();
                StatusChange::Applied(self.snapshot())
            }
            Err(reason) => {
                debug!(order_code = %self.code, %reason, "Status write ignored");
                StatusChange::Unchanged(self.snapshot())
            }
        }
    }
}

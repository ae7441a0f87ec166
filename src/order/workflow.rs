//! Order lifecycle rules that do not touch the database.
//!
//! Placing an order turns the caller's cart lines into an order plus one
//! item per line. Items are snapshots: quantity, unit price and line price
//! are copied from the cart and never recomputed from the live menu.
//! Afterwards only the delivery assignment and the status flag change.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use super::models::{NewOrder, NewOrderItem, OrderChangeset, OrderPatch};
use crate::access::OrderPatchGrant;
use crate::cart::models::CartLine;
use crate::utils::error::{AppError, NON_FIELD_ERRORS};
use crate::utils::money;

/// One cart line frozen at order time.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSnapshot {
    pub menuitem_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub price: BigDecimal,
}

impl ItemSnapshot {
    pub fn into_row(self, order_id: i32) -> NewOrderItem {
        NewOrderItem {
            order_id,
            menuitem_id: self.menuitem_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            price: self.price,
        }
    }
}

impl From<&CartLine> for ItemSnapshot {
    fn from(line: &CartLine) -> Self {
        Self {
            menuitem_id: line.menuitem_id,
            quantity: line.quantity,
            unit_price: line.unit_price.clone(),
            price: line.price.clone(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct OrderDraft {
    pub order: NewOrder,
    pub items: Vec<ItemSnapshot>,
    /// Cart lines consumed by this order.
    pub cart_line_ids: Vec<i32>,
}

/// Builds the order for `user_id` from their cart, or fails on an empty cart.
pub fn draft_order(
    user_id: i32,
    lines: &[CartLine],
    today: NaiveDate,
) -> Result<OrderDraft, AppError> {
    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let total = money::total(lines.iter().map(|line| &line.price));
    if !money::fits_amount_column(&total) {
        return Err(AppError::field(
            NON_FIELD_ERRORS,
            "Order total is too large; remove some items from the cart.",
        ));
    }

    Ok(OrderDraft {
        order: NewOrder {
            user_id,
            status: false,
            total,
            date: today,
        },
        items: lines.iter().map(ItemSnapshot::from).collect(),
        cart_line_ids: lines.iter().map(|line| line.id).collect(),
    })
}

/// Parses a PATCH body. An empty body reads as `{}`.
pub fn parse_patch(body: &[u8]) -> Result<OrderPatch, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(OrderPatch::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::field(NON_FIELD_ERRORS, e.to_string()))
}

/// Turns a PATCH body into the columns to write, within what `grant` allows.
pub fn plan_patch(grant: OrderPatchGrant, patch: OrderPatch) -> Result<OrderChangeset, AppError> {
    match grant {
        OrderPatchGrant::Full => {
            if patch.delivery_crew_id.is_none() && patch.status.is_none() {
                return Err(AppError::no_data());
            }
            Ok(OrderChangeset {
                delivery_crew_id: patch.delivery_crew_id,
                status: patch.status,
            })
        }
        OrderPatchGrant::StatusOnly => {
            if patch.delivery_crew_id.is_some() {
                return Err(AppError::Forbidden(
                    "Delivery crew may only update the order status.".to_owned(),
                ));
            }
            let status = patch.status.ok_or_else(AppError::no_data)?;
            Ok(OrderChangeset {
                delivery_crew_id: None,
                status: Some(status),
            })
        }
    }
}

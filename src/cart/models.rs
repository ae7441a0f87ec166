use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::menu_item::models::MenuItem;
use crate::schema::cart_lines;
use crate::utils::{AppError, money};

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Identifiable)]
#[diesel(table_name = cart_lines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartLine {
    pub id: i32,
    pub user_id: i32,
    pub menuitem_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub price: BigDecimal,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = cart_lines)]
pub struct NewCartLine {
    pub user_id: i32,
    pub menuitem_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub price: BigDecimal,
}

impl NewCartLine {
    /// Captures the menu item's current price for `user_id`.
    ///
    /// Fails on `quantity` when the line price would not fit the price column.
    pub fn snapshot(user_id: i32, item: &MenuItem, quantity: i32) -> Result<Self, AppError> {
        let price = money::line_price(&item.price, quantity);
        if !money::fits_amount_column(&price) {
            return Err(AppError::field(
                "quantity",
                "Ensure the line price stays below 10000000000.",
            ));
        }
        Ok(Self {
            user_id,
            menuitem_id: item.id,
            quantity,
            unit_price: item.price.clone(),
            price,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCart {
    pub menuitem_id: i32,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub menuitem: MenuItem,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub price: BigDecimal,
}

impl From<(CartLine, MenuItem)> for CartLineView {
    fn from((line, menuitem): (CartLine, MenuItem)) -> Self {
        Self {
            price: money::line_price(&line.unit_price, line.quantity),
            menuitem,
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::category::models::Category;
use crate::schema::menu_items;
use crate::utils::money::{deserialize_decimal, deserialize_optional_decimal, validate_price};
use crate::utils::query::SortField;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Identifiable, Serialize)]
#[diesel(table_name = menu_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MenuItem {
    pub id: i32,
    pub title: String,
    pub price: BigDecimal,
    pub featured: bool,
    pub category_id: i32,
}

/// A menu item with its category nested, as returned by the catalog endpoints.
#[derive(Debug, Serialize)]
pub struct MenuItemView {
    pub id: i32,
    pub title: String,
    pub price: BigDecimal,
    pub featured: bool,
    pub category: Category,
}

impl From<(MenuItem, Category)> for MenuItemView {
    fn from((item, category): (MenuItem, Category)) -> Self {
        Self {
            id: item.id,
            title: item.title,
            price: item.price,
            featured: item.featured,
            category,
        }
    }
}

/// Body of `POST` and `PUT`: every field is required.
#[derive(Insertable, AsChangeset, Deserialize, Validate, Debug)]
#[diesel(table_name = menu_items)]
pub struct NewMenuItem {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub title: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    #[validate(custom(function = "validate_price"))]
    pub price: BigDecimal,
    pub featured: bool,
    pub category_id: i32,
}

/// Body of `PATCH`.
#[derive(AsChangeset, Deserialize, Validate, Debug, Default)]
#[diesel(table_name = menu_items)]
pub struct UpdateMenuItem {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    #[validate(custom(function = "validate_price"))]
    pub price: Option<BigDecimal>,
    pub featured: Option<bool>,
    pub category_id: Option<i32>,
}

impl UpdateMenuItem {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.price.is_none()
            && self.featured.is_none()
            && self.category_id.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuItemFilters {
    /// Exact category title.
    pub category: Option<String>,
    /// Inclusive upper bound on price.
    pub to_price: Option<BigDecimal>,
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuItemSort {
    Id,
    Title,
    Price,
    Featured,
    Category,
}

impl SortField for MenuItemSort {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(MenuItemSort::Id),
            "title" => Some(MenuItemSort::Title),
            "price" => Some(MenuItemSort::Price),
            "featured" => Some(MenuItemSort::Featured),
            "category" => Some(MenuItemSort::Category),
            _ => None,
        }
    }
}

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::schema::categories;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Identifiable, Serialize)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: i32,
    pub slug: String,
    pub title: String,
}

#[derive(Insertable, Deserialize, Validate, Debug)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    #[validate(custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub title: String,
}

#[derive(AsChangeset, Deserialize, Validate, Debug, Default)]
#[diesel(table_name = categories)]
pub struct UpdateCategory {
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub title: Option<String>,
}

impl UpdateCategory {
    pub fn is_empty(&self) -> bool {
        self.slug.is_none() && self.title.is_none()
    }
}

/// Lowercase letters, digits and hyphens, 1 to 255 characters.
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let well_formed = !slug.is_empty()
        && slug.len() <= 255
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(
            "Enter a valid slug consisting of lowercase letters, numbers or hyphens.".into(),
        ))
    }
}

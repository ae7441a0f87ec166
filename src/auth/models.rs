use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::access::Role;
use crate::schema::users;

#[derive(Queryable, Selectable, Debug, PartialEq)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_superuser: bool,
}

/// A user without credentials, safe to put on the wire.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SafeUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(
        length(min = 1, max = 150, message = "Ensure this field has no more than 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

#[derive(Debug, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: SafeUser,
    pub roles: Vec<Role>,
}

/// Claims carried by a bearer token; `sub` is the user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: u64,
}

fn validate_username(username: &str) -> Result<(), validator::ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("username").with_message(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ))
    }
}

fn validate_optional_email(email: &str) -> Result<(), validator::ValidationError> {
    use validator::ValidateEmail;

    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("email")
            .with_message("Enter a valid email address.".into()))
    }
}

use diesel::prelude::*;
use serde::Deserialize;
use validator::Validate;

use crate::schema::user_groups;

#[derive(Insertable, Debug)]
#[diesel(table_name = user_groups)]
pub struct NewMembership {
    pub user_id: i32,
    pub group_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberPayload {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_required() {
        let payload: AddMemberPayload = serde_json::from_str("{}").unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
    }

    #[test]
    fn blank_username_is_rejected() {
        let payload: AddMemberPayload = serde_json::from_str(r#"{"username": ""}"#).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn present_username_passes() {
        let payload: AddMemberPayload = serde_json::from_str(r#"{"username": "luigi"}"#).unwrap();
        assert!(payload.validate().is_ok());
    }
}

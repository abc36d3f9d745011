// User entity schema - the default target of AUTH_USER_MODEL
// Only the columns pages need are declared here.

use crate::ent_schema::{
    EntSchema, FieldDefault, FieldDefinition, FieldType, ModelOptions,
};

pub const USERNAME_MAX_LENGTH: usize = 150;

pub struct UserSchema;

impl EntSchema for UserSchema {
    fn app_label() -> &'static str {
        "auth"
    }

    fn model_name() -> &'static str {
        "User"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::BigAuto)
                .primary_key()
                .verbose_name("ID"),
            FieldDefinition::new("username", FieldType::Char { max_length: USERNAME_MAX_LENGTH })
                .unique(),
            FieldDefinition::new("date_joined", FieldType::DateTime)
                .immutable()
                .default_value(FieldDefault::Now),
        ]
    }

    fn options() -> ModelOptions {
        ModelOptions::new()
            .verbose_name("user")
            .verbose_name_plural("users")
    }
}

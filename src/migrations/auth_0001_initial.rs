// auth 0001_initial - the default user model

use super::{Migration, Operation};
use crate::ent_schema::{FieldDefault, FieldDefinition, FieldType, ModelDefinition, ModelOptions};

pub fn migration() -> Migration {
    Migration::new("auth", "0001_initial")
        .initial()
        .operation(Operation::CreateModel(
            ModelDefinition::new(
                "auth",
                "User",
                vec![
                    FieldDefinition::new("id", FieldType::BigAuto)
                        .primary_key()
                        .verbose_name("ID"),
                    FieldDefinition::new("username", FieldType::Char { max_length: 150 }).unique(),
                    FieldDefinition::new("date_joined", FieldType::DateTime)
                        .immutable()
                        .default_value(FieldDefault::Now),
                ],
            )
            .with_options(
                ModelOptions::new()
                    .verbose_name("user")
                    .verbose_name_plural("users"),
            ),
        ))
}

// Page entity schema

use crate::ent_schema::{
    EntSchema, FieldDefault, FieldDefinition, FieldType, ForeignKey, ModelOptions, ModelRef,
    OnDelete, SwappableSetting,
};

pub const TITLE_MAX_LENGTH: usize = 1000;

/// User-authored content, owned by the configured user model
pub struct PageSchema;

impl EntSchema for PageSchema {
    fn app_label() -> &'static str {
        "website"
    }

    fn model_name() -> &'static str {
        "Page"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::BigAuto)
                .primary_key()
                .verbose_name("ID"),
            FieldDefinition::new("title", FieldType::Char { max_length: TITLE_MAX_LENGTH }),
            FieldDefinition::new("body", FieldType::Text),
            FieldDefinition::new("created", FieldType::DateTime)
                .immutable()
                .default_value(FieldDefault::Now),
            FieldDefinition::new("updated", FieldType::DateTime).optional(),
            FieldDefinition::new("modified", FieldType::DateTime).optional(),
            // Deleting the user deletes every page they created
            FieldDefinition::new(
                "creator",
                FieldType::ForeignKey(
                    ForeignKey::new(
                        ModelRef::Swappable(SwappableSetting::AuthUserModel),
                        OnDelete::Cascade,
                    )
                    .related_name("pages"),
                ),
            ),
        ]
    }

    fn options() -> ModelOptions {
        ModelOptions::new()
            .verbose_name("Page")
            .verbose_name_plural("Pages")
            .ordering(&["created"])
    }
}

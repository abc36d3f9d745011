// website 0001_initial - creates the page table
// Model state is frozen here; later changes to PageSchema need a new migration.

use super::{Dependency, Migration, Operation};
use crate::ent_schema::{
    FieldDefault, FieldDefinition, FieldType, ForeignKey, ModelDefinition, ModelOptions, ModelRef,
    OnDelete, SwappableSetting,
};

pub fn migration() -> Migration {
    Migration::new("website", "0001_initial")
        .initial()
        .depends_on(Dependency::Swappable(SwappableSetting::AuthUserModel))
        .operation(Operation::CreateModel(
            ModelDefinition::new(
                "website",
                "Page",
                vec![
                    FieldDefinition::new("id", FieldType::BigAuto)
                        .primary_key()
                        .verbose_name("ID"),
                    FieldDefinition::new("title", FieldType::Char { max_length: 1000 }),
                    FieldDefinition::new("body", FieldType::Text),
                    FieldDefinition::new("created", FieldType::DateTime)
                        .immutable()
                        .default_value(FieldDefault::Now),
                    FieldDefinition::new("updated", FieldType::DateTime).optional(),
                    FieldDefinition::new("modified", FieldType::DateTime).optional(),
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
                ],
            )
            .with_options(
                ModelOptions::new()
                    .verbose_name("Page")
                    .verbose_name_plural("Pages")
                    .ordering(&["created"]),
            ),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ent_schema::EntSchema;
    use crate::migrations::auth_0001_initial;
    use crate::schemas::{PageSchema, UserSchema};

    #[test]
    fn test_frozen_models_match_live_schemas() {
        assert_eq!(
            migration().operations,
            vec![Operation::CreateModel(PageSchema::definition())]
        );
        assert_eq!(
            auth_0001_initial::migration().operations,
            vec![Operation::CreateModel(UserSchema::definition())]
        );
    }

    #[test]
    fn test_depends_on_user_model() {
        let migration = migration();
        assert!(migration.initial);
        assert_eq!(
            migration.dependencies,
            vec![Dependency::Swappable(SwappableSetting::AuthUserModel)]
        );
        assert_eq!(migration.operations[0].describe(), "Create model Page");
    }
}

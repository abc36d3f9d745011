// Schema definitions module - centralized schema registry

pub mod page_schema;
pub mod user_schema;

use crate::config::AuthConfig;
use crate::ent_schema::SchemaRegistry;

pub use page_schema::PageSchema;
pub use user_schema::UserSchema;

/// Initialize and register all schemas
pub fn create_schema_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    registry.register::<UserSchema>();
    registry.register::<PageSchema>();

    registry
}

/// Validate all registered schemas
pub fn validate_schemas(auth: &AuthConfig) -> Result<(), Vec<String>> {
    let registry = create_schema_registry();
    registry.validate(auth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ent_schema::{EntSchema, FieldDefault, FieldType, OnDelete};

    #[test]
    fn test_bundled_schemas_validate() {
        assert!(validate_schemas(&Config::default().auth).is_ok());
    }

    #[test]
    fn test_page_schema_shape() {
        let page = PageSchema::definition();
        assert_eq!(page.label(), "website.Page");
        assert_eq!(page.db_table(), "website_page");
        assert_eq!(page.verbose_name_plural(), "Pages");

        let columns: Vec<String> = page.fields.iter().map(|f| f.column()).collect();
        assert_eq!(
            columns,
            vec!["id", "title", "body", "created", "updated", "modified", "creator_id"]
        );

        let nullable: Vec<&str> = page
            .fields
            .iter()
            .filter(|f| f.null)
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(nullable, vec!["updated", "modified"]);

        let created = page.field("created").unwrap();
        assert!(created.immutable);
        assert_eq!(created.default, Some(FieldDefault::Now));
        assert_eq!(
            page.field("title").unwrap().field_type,
            FieldType::Char { max_length: 1000 }
        );

        let (_, fk) = page.foreign_keys().next().unwrap();
        assert_eq!(fk.on_delete, OnDelete::Cascade);
        assert_eq!(fk.related_name.as_deref(), Some("pages"));
    }

    #[test]
    fn test_user_exposes_pages_collection() {
        let registry = create_schema_registry();
        let collections = registry.related_collections("auth.User", &Config::default().auth);
        let names: Vec<&str> = collections.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["pages"]);
    }

    #[test]
    fn test_unknown_user_model_fails_validation() {
        let auth = AuthConfig {
            user_model: "accounts.Member".to_string(),
        };
        let errors = validate_schemas(&auth).unwrap_err();
        assert!(errors[0].contains("accounts.member"));
    }
}

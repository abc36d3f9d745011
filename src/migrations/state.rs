// Project state - models as the migration history describes them

use crate::ent_schema::{ModelDefinition, SchemaRegistry};

use super::Migration;

#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    registry: SchemaRegistry,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the operations of `migrations`, in order
    pub fn from_migrations<'m>(migrations: impl IntoIterator<Item = &'m Migration>) -> Self {
        let mut state = Self::new();
        for migration in migrations {
            state.apply(migration);
        }
        state
    }

    pub fn apply(&mut self, migration: &Migration) {
        for operation in &migration.operations {
            operation.state_forwards(self);
        }
    }

    pub fn add_model(&mut self, model: ModelDefinition) {
        self.registry.register_definition(model);
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::all_migrations;

    #[test]
    fn test_state_from_all_migrations() {
        let migrations = all_migrations();
        let state = ProjectState::from_migrations(&migrations);

        let registry = state.registry();
        assert_eq!(registry.get("auth.User").unwrap().db_table(), "auth_user");
        assert_eq!(registry.get("website.page").unwrap().db_table(), "website_page");
        assert!(registry.get("website.Post").is_none());
    }
}

// Migrations - versioned schema changes and the runner that applies them

pub mod auth_0001_initial;
pub mod executor;
pub mod graph;
pub mod state;
pub mod website_0001_initial;

use serde::Serialize;
use std::fmt;

use crate::codegen::DdlGenerator;
use crate::ent_schema::{ModelDefinition, SwappableSetting};
use crate::error::AppResult;

pub use executor::{MigrationExecutor, MigrationStatus};
pub use graph::MigrationGraph;
pub use state::ProjectState;

/// `(app_label, name)` identifying one migration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MigrationKey {
    pub app_label: String,
    pub name: String,
}

impl MigrationKey {
    pub fn new(app_label: &str, name: &str) -> Self {
        Self {
            app_label: app_label.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Dependency {
    On(MigrationKey),
    /// First migration of whichever app owns the swapped-in model
    Swappable(SwappableSetting),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operation {
    CreateModel(ModelDefinition),
}

impl Operation {
    pub fn describe(&self) -> String {
        match self {
            Operation::CreateModel(model) => format!("Create model {}", model.name),
        }
    }

    pub fn state_forwards(&self, state: &mut ProjectState) {
        match self {
            Operation::CreateModel(model) => state.add_model(model.clone()),
        }
    }

    pub fn database_forwards(&self, generator: &DdlGenerator<'_>) -> AppResult<Vec<String>> {
        match self {
            Operation::CreateModel(model) => generator.create_table(model),
        }
    }

    pub fn database_backwards(&self, generator: &DdlGenerator<'_>) -> Vec<String> {
        match self {
            Operation::CreateModel(model) => generator.drop_table(model),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Migration {
    pub app_label: String,
    pub name: String,
    /// First migration of its app
    pub initial: bool,
    pub dependencies: Vec<Dependency>,
    pub operations: Vec<Operation>,
}

impl Migration {
    pub fn new(app_label: &str, name: &str) -> Self {
        Self {
            app_label: app_label.to_string(),
            name: name.to_string(),
            initial: false,
            dependencies: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn key(&self) -> MigrationKey {
        MigrationKey::new(&self.app_label, &self.name)
    }
}

/// Every migration shipped with the crate
pub fn all_migrations() -> Vec<Migration> {
    vec![
        auth_0001_initial::migration(),
        website_0001_initial::migration(),
    ]
}

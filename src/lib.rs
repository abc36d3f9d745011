// Website content model - Page schema, migrations and storage

// Declarative model definitions
pub mod ent_schema;

// Model declarations registered with the schema registry
pub mod schemas;

// SQL generation from model definitions
pub mod codegen;

// Versioned schema changes and their runner
pub mod migrations;

// Persistence
pub mod database;
pub mod models;
pub mod repositories;

// Core types and primitives
pub mod core;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};

// SQL generation from model definitions

pub mod ddl_generator;
pub mod utils;

pub use ddl_generator::{order_by_clause, DdlGenerator, Dialect};

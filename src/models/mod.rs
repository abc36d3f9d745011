// Row types for the persisted models

pub mod page;
pub mod user;

pub use page::{NewPage, Page, PageChanges};
pub use user::{NewUser, User};

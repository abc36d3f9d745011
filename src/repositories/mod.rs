// Repositories - persistence for pages and users

pub mod page_repository;
pub mod user_repository;

use async_trait::async_trait;

use crate::core::{PageId, UserId};
use crate::error::AppResult;
use crate::models::{NewPage, NewUser, Page, PageChanges, User};

pub use page_repository::SqlitePageRepository;
pub use user_repository::SqliteUserRepository;

#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Insert a page; `created` is stamped now and never changes afterwards
    async fn create(&self, page: NewPage) -> AppResult<Page>;
    async fn get(&self, id: PageId) -> AppResult<Page>;
    /// Every page, in the model's default ordering
    async fn list(&self) -> AppResult<Vec<Page>>;
    /// The `pages` collection of one user, in the default ordering
    async fn list_for_creator(&self, creator: UserId) -> AppResult<Vec<Page>>;
    async fn update(&self, id: PageId, changes: PageChanges) -> AppResult<Page>;
    /// Returns whether a row was deleted
    async fn delete(&self, id: PageId) -> AppResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> AppResult<User>;
    async fn get(&self, id: UserId) -> AppResult<User>;
    /// Deleting a user cascades to their pages
    async fn delete(&self, id: UserId) -> AppResult<bool>;
}

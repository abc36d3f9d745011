use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{PageId, UserId};

/// A row of `website_page`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    #[sqlx(rename = "creator_id")]
    pub creator: UserId,
}

/// Values supplied when inserting a page; `id` and `created` are assigned on insert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPage {
    pub title: String,
    pub body: String,
    pub creator: UserId,
    pub updated: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl NewPage {
    pub fn new(title: impl Into<String>, body: impl Into<String>, creator: UserId) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            creator,
            updated: None,
            modified: None,
        }
    }
}

/// Partial update; `None` leaves the column untouched.
/// `created` and `creator` are not editable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    /// `Some(None)` clears the timestamp
    pub updated: Option<Option<DateTime<Utc>>>,
    pub modified: Option<Option<DateTime<Utc>>>,
}

impl PageChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn updated(mut self, updated: Option<DateTime<Utc>>) -> Self {
        self.updated = Some(updated);
        self
    }

    pub fn modified(mut self, modified: Option<DateTime<Utc>>) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.updated.is_none() && self.modified.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_page_leaves_timestamps_absent() {
        let page = NewPage::new("Hello", "World", UserId::new(1));
        assert!(page.updated.is_none());
        assert!(page.modified.is_none());
    }

    #[test]
    fn test_page_changes_builder() {
        assert!(PageChanges::new().is_empty());

        let changes = PageChanges::new().title("New").modified(None);
        assert!(!changes.is_empty());
        assert_eq!(changes.title.as_deref(), Some("New"));
        assert_eq!(changes.modified, Some(None));
        assert!(changes.updated.is_none());
    }
}

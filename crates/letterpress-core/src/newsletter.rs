/// Persisted records: newsletters, notices, subscribers, and send history.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::Block;

/// Owner assigned to records until multi-user ownership exists.
pub const DEFAULT_OWNER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Thumbnail used when a newsletter has no image block.
pub const DEFAULT_THUMBNAIL: &str = "/default-thumbnail.jpg";

/// Body of a newsletter: its ordered blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewsletterContent {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Newsletter {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub content: NewsletterContent,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_owner")]
    pub owner_id: String,
}

fn default_owner() -> String {
    DEFAULT_OWNER_ID.to_string()
}

impl Newsletter {
    /// Applies a partial update and stamps `updated_at`.
    pub fn apply(&mut self, patch: NewsletterPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(summary) = patch.summary {
            self.summary = summary;
        }
        if let Some(thumbnail_url) = patch.thumbnail_url {
            self.thumbnail_url = thumbnail_url;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        self.updated_at = Some(now);
    }
}

/// Payload for creating a newsletter. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewNewsletter {
    pub title: String,
    pub summary: String,
    pub thumbnail_url: String,
    pub content: NewsletterContent,
}

impl NewNewsletter {
    /// Turns the payload into a full record.
    pub fn into_newsletter(self, id: String, now: DateTime<Utc>) -> Newsletter {
        Newsletter {
            id,
            title: self.title,
            summary: self.summary,
            thumbnail_url: self.thumbnail_url,
            content: self.content,
            created_at: now,
            updated_at: None,
            owner_id: default_owner(),
        }
    }
}

/// Partial update of a newsletter. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewsletterPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub thumbnail_url: Option<String>,
    pub content: Option<NewsletterContent>,
}

/// A short site announcement. The body is markdown.
///
/// Only published notices are shown publicly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Notice {
    /// Applies a partial update and stamps `updated_at`.
    pub fn apply(&mut self, patch: NoticePatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(published) = patch.published {
            self.published = published;
        }
        self.updated_at = Some(now);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewNotice {
    pub title: String,
    pub content: String,
    pub published: bool,
}

impl NewNotice {
    pub fn into_notice(self, id: String, now: DateTime<Utc>) -> Notice {
        Notice {
            id,
            title: self.title,
            content: self.content,
            published: self.published,
            created_at: now,
            updated_at: None,
        }
    }
}

/// Partial update of a notice. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoticePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// An email list member.
///
/// A subscriber is pending until the confirmation token is redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirm_token: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Subscriber {
    /// A new subscriber awaiting confirmation.
    pub fn pending(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            confirmed: false,
            confirmed_at: None,
            confirm_token: Some(uuid::Uuid::new_v4().simple().to_string()),
            added_at: now,
        }
    }

    /// A subscriber added already confirmed (admin import).
    pub fn confirmed(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.into(),
            confirmed: true,
            confirmed_at: Some(now),
            confirm_token: None,
            added_at: now,
        }
    }

    /// Marks the subscriber confirmed and consumes the token.
    pub fn confirm(&mut self, now: DateTime<Utc>) {
        self.confirmed = true;
        self.confirmed_at = Some(now);
        self.confirm_token = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendStatus {
    Success,
    Failed,
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendStatus::Success => f.write_str("success"),
            SendStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Outcome of one newsletter broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRecord {
    pub id: String,
    pub newsletter_id: String,
    pub newsletter_title: String,
    pub sent_at: DateTime<Utc>,
    pub status: SendStatus,
    pub error_message: Option<String>,
    pub recipient_count: usize,
    pub success_count: usize,
    pub fail_count: usize,
}

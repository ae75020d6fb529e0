/// Services the editor and mailing flows depend on.
///
/// Storage, media hosting, and delivery are collaborators behind these
/// traits. `letterpress-store` provides local implementations.
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::newsletter::{
    NewNewsletter, NewNotice, Newsletter, NewsletterPatch, Notice, NoticePatch, SendRecord,
    SortOrder, Subscriber,
};

/// Create/read/update/delete of newsletter records.
pub trait NewsletterStore {
    fn create(&self, draft: NewNewsletter) -> Result<Newsletter>;

    /// Errors if no newsletter has this id.
    fn update(&self, id: &str, patch: NewsletterPatch) -> Result<()>;

    /// Deleting a missing id is not an error.
    fn delete(&self, id: &str) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<Newsletter>>;

    fn list_by_created(&self, order: SortOrder) -> Result<Vec<Newsletter>>;
}

/// Site notices.
pub trait NoticeStore {
    fn create_notice(&self, draft: NewNotice) -> Result<Notice>;

    /// Errors if no notice has this id.
    fn update_notice(&self, id: &str, patch: NoticePatch) -> Result<()>;

    /// Deleting a missing id is not an error.
    fn delete_notice(&self, id: &str) -> Result<()>;

    fn get_notice(&self, id: &str) -> Result<Option<Notice>>;

    /// All notices, newest first.
    fn list_notices(&self) -> Result<Vec<Notice>>;

    /// Errors if no notice has this id.
    fn set_published(&self, id: &str, published: bool) -> Result<()> {
        self.update_notice(
            id,
            NoticePatch {
                published: Some(published),
                ..Default::default()
            },
        )
    }
}

/// Subscriber list storage. Emails are unique.
pub trait SubscriberStore {
    /// Errors if the email is already present.
    fn add(&self, subscriber: Subscriber) -> Result<()>;

    fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>>;

    fn find_by_token(&self, token: &str) -> Result<Option<Subscriber>>;

    /// Overwrites the record with the same id.
    fn save(&self, subscriber: &Subscriber) -> Result<()>;

    /// Returns whether a record was removed.
    fn remove(&self, id: &str) -> Result<bool>;

    /// All subscribers, oldest first.
    fn list_subscribers(&self) -> Result<Vec<Subscriber>>;
}

/// Append-only log of broadcasts.
pub trait SendLog {
    fn record(&self, send: &SendRecord) -> Result<()>;

    /// All sends, newest first.
    fn list_sends(&self) -> Result<Vec<SendRecord>>;
}

/// Binary asset hosting.
pub trait MediaStore {
    /// Stores `bytes` under a path derived from `path_hint` and returns its public URL.
    fn upload(&self, bytes: &[u8], path_hint: &str) -> Result<String>;
}

/// A rendered message addressed to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// What the mail provider accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    pub accepted: usize,
    /// Recipients the provider refused outright.
    pub rejected: Vec<String>,
}

impl DeliveryReport {
    pub fn all_accepted(count: usize) -> Self {
        Self {
            accepted: count,
            rejected: Vec::new(),
        }
    }
}

/// Outbound email transport.
pub trait Mailer {
    fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReport>;
}

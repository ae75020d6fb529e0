/// Site notices: short markdown announcements with a publish switch.
use anyhow::{bail, Context, Result};

use crate::gateway::NoticeStore;
use crate::newsletter::{NewNotice, Notice, NoticePatch};

/// Trims both fields and rejects a blank title or body.
fn validate(title: &str, content: &str) -> Result<(String, String)> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() {
        bail!("A notice needs a title");
    }
    if content.is_empty() {
        bail!("A notice needs content");
    }
    Ok((title.to_string(), content.to_string()))
}

pub struct Notices<'a> {
    store: &'a dyn NoticeStore,
}

impl<'a> Notices<'a> {
    pub fn new(store: &'a dyn NoticeStore) -> Self {
        Self { store }
    }

    /// Creates a notice. Drafts stay hidden until published.
    ///
    /// # Errors
    ///
    /// Returns an error if the title or content is blank, or the store fails.
    pub fn post(&self, title: &str, content: &str, published: bool) -> Result<Notice> {
        let (title, content) = validate(title, content)?;
        let notice = self
            .store
            .create_notice(NewNotice {
                title,
                content,
                published,
            })
            .context("Failed to create notice")?;
        tracing::info!("Created notice {} ({})", notice.id, visibility(notice.published));
        Ok(notice)
    }

    /// Replaces title and content. The publish state is kept.
    pub fn edit(&self, id: &str, title: &str, content: &str) -> Result<Notice> {
        let (title, content) = validate(title, content)?;
        self.store.update_notice(
            id,
            NoticePatch {
                title: Some(title),
                content: Some(content),
                published: None,
            },
        )?;
        self.require(id)
    }

    pub fn publish(&self, id: &str, published: bool) -> Result<Notice> {
        self.require(id)?;
        self.store.set_published(id, published)?;
        tracing::info!("Notice {id} is now {}", visibility(published));
        self.require(id)
    }

    /// Returns whether a notice was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        if self.store.get_notice(id)?.is_none() {
            return Ok(false);
        }
        self.store.delete_notice(id)?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Result<Option<Notice>> {
        self.store.get_notice(id)
    }

    /// Notices newest first, optionally only the published ones.
    pub fn list(&self, published_only: bool) -> Result<Vec<Notice>> {
        let mut notices = self.store.list_notices()?;
        if published_only {
            notices.retain(|n| n.published);
        }
        Ok(notices)
    }

    fn require(&self, id: &str) -> Result<Notice> {
        self.store
            .get_notice(id)?
            .with_context(|| format!("Notice {id} not found"))
    }
}

pub fn visibility(published: bool) -> &'static str {
    if published {
        "published"
    } else {
        "draft"
    }
}

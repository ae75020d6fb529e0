/// Embedded database for newsletters, notices, subscribers and sends, backed by redb.
///
/// Newsletters and notices are stored as JSON (the same shape the block editor exchanges),
/// subscribers and send records as bincode. A separate index table maps
/// lower-cased email addresses to subscriber ids to keep emails unique.
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};

use letterpress_core::gateway::{NewsletterStore, NoticeStore, SendLog, SubscriberStore};
use letterpress_core::newsletter::{
    NewNewsletter, NewNotice, Newsletter, NewsletterPatch, Notice, NoticePatch, SendRecord,
    SortOrder, Subscriber,
};

/// Newsletter table: id → JSON.
const NEWSLETTERS: TableDefinition<&str, &str> = TableDefinition::new("newsletters");

/// Notice table: id → JSON.
const NOTICES: TableDefinition<&str, &str> = TableDefinition::new("notices");

/// Subscriber table: id → bincode(`Subscriber`).
const SUBSCRIBERS: TableDefinition<&str, &[u8]> = TableDefinition::new("subscribers");

/// Unique email index: lower-cased email → subscriber id.
const SUBSCRIBER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("subscriber_emails");

/// Send log table: id → bincode(`SendRecord`).
const SENDS: TableDefinition<&str, &[u8]> = TableDefinition::new("sends");

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn decode_subscriber(bytes: &[u8]) -> Result<Subscriber> {
    bincode::deserialize(bytes).context("Failed to deserialize subscriber")
}

/// Persistence for all letterpress records.
pub struct Database {
    db: redb::Database,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

impl Database {
    /// Opens or creates the database file at `path`, creating parent
    /// directories and tables as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }

        let db = redb::Database::create(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // Ensure tables exist
        let write_txn = db
            .begin_write()
            .context("Failed to begin initial write transaction")?;
        {
            let _ = write_txn
                .open_table(NEWSLETTERS)
                .context("Failed to create newsletters table")?;
            let _ = write_txn
                .open_table(NOTICES)
                .context("Failed to create notices table")?;
            let _ = write_txn
                .open_table(SUBSCRIBERS)
                .context("Failed to create subscribers table")?;
            let _ = write_txn
                .open_table(SUBSCRIBER_EMAILS)
                .context("Failed to create subscriber_emails table")?;
            let _ = write_txn
                .open_table(SENDS)
                .context("Failed to create sends table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial transaction")?;

        tracing::debug!("Opened database at {}", path.display());
        Ok(Self { db })
    }

    fn put_newsletter(&self, newsletter: &Newsletter) -> Result<()> {
        let json = serde_json::to_string(newsletter).context("Failed to serialize newsletter")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(NEWSLETTERS)
                .context("Failed to open newsletters table")?;
            table
                .insert(newsletter.id.as_str(), json.as_str())
                .context("Failed to insert newsletter")?;
        }
        write_txn
            .commit()
            .context("Failed to commit newsletter")?;
        Ok(())
    }

    fn put_notice(&self, notice: &Notice) -> Result<()> {
        let json = serde_json::to_string(notice).context("Failed to serialize notice")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(NOTICES)
                .context("Failed to open notices table")?;
            table
                .insert(notice.id.as_str(), json.as_str())
                .context("Failed to insert notice")?;
        }
        write_txn.commit().context("Failed to commit notice")?;
        Ok(())
    }
}

impl NewsletterStore for Database {
    fn create(&self, draft: NewNewsletter) -> Result<Newsletter> {
        let newsletter = draft.into_newsletter(uuid::Uuid::new_v4().to_string(), Utc::now());
        self.put_newsletter(&newsletter)?;
        tracing::debug!("Created newsletter {}", newsletter.id);
        Ok(newsletter)
    }

    fn update(&self, id: &str, patch: NewsletterPatch) -> Result<()> {
        let Some(mut newsletter) = self.get(id)? else {
            bail!("Newsletter {id} not found");
        };
        newsletter.apply(patch, Utc::now());
        self.put_newsletter(&newsletter)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(NEWSLETTERS)
                .context("Failed to open newsletters table")?;
            table.remove(id).context("Failed to delete newsletter")?;
        }
        write_txn
            .commit()
            .context("Failed to commit newsletter deletion")?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Newsletter>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(NEWSLETTERS)
            .context("Failed to open newsletters table")?;

        match table.get(id).context("Failed to read newsletter")? {
            Some(guard) => {
                let newsletter = serde_json::from_str(guard.value())
                    .with_context(|| format!("Failed to deserialize newsletter {id}"))?;
                Ok(Some(newsletter))
            }
            None => Ok(None),
        }
    }

    fn list_by_created(&self, order: SortOrder) -> Result<Vec<Newsletter>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(NEWSLETTERS)
            .context("Failed to open newsletters table")?;

        let mut all = Vec::new();
        for entry in table.iter().context("Failed to iterate newsletters")? {
            let (key, value) = entry.context("Failed to read newsletter entry")?;
            let newsletter: Newsletter = serde_json::from_str(value.value())
                .with_context(|| format!("Failed to deserialize newsletter {}", key.value()))?;
            all.push(newsletter);
        }

        all.sort_by_key(|n| n.created_at);
        if order == SortOrder::Descending {
            all.reverse();
        }
        Ok(all)
    }
}

impl NoticeStore for Database {
    fn create_notice(&self, draft: NewNotice) -> Result<Notice> {
        let notice = draft.into_notice(uuid::Uuid::new_v4().to_string(), Utc::now());
        self.put_notice(&notice)?;
        Ok(notice)
    }

    fn update_notice(&self, id: &str, patch: NoticePatch) -> Result<()> {
        let Some(mut notice) = self.get_notice(id)? else {
            bail!("Notice {id} not found");
        };
        notice.apply(patch, Utc::now());
        self.put_notice(&notice)
    }

    fn delete_notice(&self, id: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(NOTICES)
                .context("Failed to open notices table")?;
            table.remove(id).context("Failed to delete notice")?;
        }
        write_txn
            .commit()
            .context("Failed to commit notice deletion")?;
        Ok(())
    }

    fn get_notice(&self, id: &str) -> Result<Option<Notice>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(NOTICES)
            .context("Failed to open notices table")?;

        match table.get(id).context("Failed to read notice")? {
            Some(guard) => Ok(Some(
                serde_json::from_str(guard.value())
                    .with_context(|| format!("Failed to deserialize notice {id}"))?,
            )),
            None => Ok(None),
        }
    }

    fn list_notices(&self) -> Result<Vec<Notice>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(NOTICES)
            .context("Failed to open notices table")?;

        let mut all: Vec<Notice> = Vec::new();
        for entry in table.iter().context("Failed to iterate notices")? {
            let (key, value) = entry.context("Failed to read notice entry")?;
            all.push(
                serde_json::from_str(value.value())
                    .with_context(|| format!("Failed to deserialize notice {}", key.value()))?,
            );
        }
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

impl SubscriberStore for Database {
    fn add(&self, subscriber: Subscriber) -> Result<()> {
        let bytes = bincode::serialize(&subscriber).context("Failed to serialize subscriber")?;
        let key = email_key(&subscriber.email);

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut emails = write_txn
                .open_table(SUBSCRIBER_EMAILS)
                .context("Failed to open subscriber_emails table")?;
            if emails
                .get(key.as_str())
                .context("Failed to read email index")?
                .is_some()
            {
                bail!("Subscriber {} already exists", subscriber.email);
            }
            emails
                .insert(key.as_str(), subscriber.id.as_str())
                .context("Failed to index subscriber email")?;

            let mut table = write_txn
                .open_table(SUBSCRIBERS)
                .context("Failed to open subscribers table")?;
            table
                .insert(subscriber.id.as_str(), bytes.as_slice())
                .context("Failed to insert subscriber")?;
        }
        write_txn
            .commit()
            .context("Failed to commit subscriber")?;
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let emails = read_txn
            .open_table(SUBSCRIBER_EMAILS)
            .context("Failed to open subscriber_emails table")?;
        let table = read_txn
            .open_table(SUBSCRIBERS)
            .context("Failed to open subscribers table")?;

        let Some(id) = emails
            .get(email_key(email).as_str())
            .context("Failed to read email index")?
            .map(|guard| guard.value().to_string())
        else {
            return Ok(None);
        };

        match table.get(id.as_str()).context("Failed to read subscriber")? {
            Some(guard) => Ok(Some(decode_subscriber(guard.value())?)),
            None => Ok(None),
        }
    }

    fn find_by_token(&self, token: &str) -> Result<Option<Subscriber>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self
            .list_subscribers()?
            .into_iter()
            .find(|s| s.confirm_token.as_deref() == Some(token)))
    }

    fn save(&self, subscriber: &Subscriber) -> Result<()> {
        let bytes = bincode::serialize(subscriber).context("Failed to serialize subscriber")?;
        let new_key = email_key(&subscriber.email);

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(SUBSCRIBERS)
                .context("Failed to open subscribers table")?;
            let previous = match table
                .get(subscriber.id.as_str())
                .context("Failed to read subscriber")?
            {
                Some(guard) => decode_subscriber(guard.value())?,
                None => bail!("Subscriber {} not found", subscriber.id),
            };

            let old_key = email_key(&previous.email);
            if old_key != new_key {
                let mut emails = write_txn
                    .open_table(SUBSCRIBER_EMAILS)
                    .context("Failed to open subscriber_emails table")?;
                if emails
                    .get(new_key.as_str())
                    .context("Failed to read email index")?
                    .is_some()
                {
                    bail!("Subscriber {} already exists", subscriber.email);
                }
                emails
                    .remove(old_key.as_str())
                    .context("Failed to update email index")?;
                emails
                    .insert(new_key.as_str(), subscriber.id.as_str())
                    .context("Failed to update email index")?;
            }

            table
                .insert(subscriber.id.as_str(), bytes.as_slice())
                .context("Failed to update subscriber")?;
        }
        write_txn
            .commit()
            .context("Failed to commit subscriber update")?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = {
            let mut table = write_txn
                .open_table(SUBSCRIBERS)
                .context("Failed to open subscribers table")?;
            let removed = match table.remove(id).context("Failed to delete subscriber")? {
                Some(guard) => Some(decode_subscriber(guard.value())?),
                None => None,
            };

            if let Some(subscriber) = &removed {
                let mut emails = write_txn
                    .open_table(SUBSCRIBER_EMAILS)
                    .context("Failed to open subscriber_emails table")?;
                emails
                    .remove(email_key(&subscriber.email).as_str())
                    .context("Failed to update email index")?;
            }
            removed.is_some()
        };
        write_txn
            .commit()
            .context("Failed to commit subscriber deletion")?;
        Ok(removed)
    }

    fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(SUBSCRIBERS)
            .context("Failed to open subscribers table")?;

        let mut all = Vec::new();
        for entry in table.iter().context("Failed to iterate subscribers")? {
            let (_, value) = entry.context("Failed to read subscriber entry")?;
            all.push(decode_subscriber(value.value())?);
        }
        all.sort_by_key(|s| s.added_at);
        Ok(all)
    }
}

impl SendLog for Database {
    fn record(&self, send: &SendRecord) -> Result<()> {
        let bytes = bincode::serialize(send).context("Failed to serialize send record")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(SENDS)
                .context("Failed to open sends table")?;
            table
                .insert(send.id.as_str(), bytes.as_slice())
                .context("Failed to insert send record")?;
        }
        write_txn
            .commit()
            .context("Failed to commit send record")?;
        Ok(())
    }

    fn list_sends(&self) -> Result<Vec<SendRecord>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(SENDS)
            .context("Failed to open sends table")?;

        let mut all: Vec<SendRecord> = Vec::new();
        for entry in table.iter().context("Failed to iterate sends")? {
            let (_, value) = entry.context("Failed to read send entry")?;
            all.push(bincode::deserialize(value.value()).context("Failed to deserialize send record")?);
        }
        all.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use letterpress_core::block::Block;
    use letterpress_core::newsletter::{NewsletterContent, SendStatus};
    use tempfile::TempDir;

    fn open_test_db() -> (Database, TempDir) {
        let dir = TempDir::new().expect("create temp dir");
        let db = Database::open(&dir.path().join("test.redb")).expect("open database");
        (db, dir)
    }

    fn draft(title: &str) -> NewNewsletter {
        NewNewsletter {
            title: title.to_string(),
            content: NewsletterContent {
                blocks: vec![Block::text("Hello"), Block::button("Read", "https://x.test")],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("nested").join("deeper").join("db.redb");
        Database::open(&path).expect("open");
        assert!(path.exists());
    }

    #[test]
    fn test_create_get_newsletter() {
        let (db, _dir) = open_test_db();
        let created = db.create(draft("First")).unwrap();
        let loaded = db.get(&created.id).unwrap().expect("stored");
        assert_eq!(loaded, created);
        assert_eq!(loaded.content.blocks.len(), 2);
        assert!(db.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_newsletter_fails() {
        let (db, _dir) = open_test_db();
        assert!(db.update("missing", NewsletterPatch::default()).is_err());
    }

    #[test]
    fn test_delete_newsletter() {
        let (db, _dir) = open_test_db();
        let created = db.create(draft("Gone")).unwrap();
        db.delete(&created.id).unwrap();
        assert!(db.get(&created.id).unwrap().is_none());
        // deleting again is fine
        db.delete(&created.id).unwrap();
    }

    #[test]
    fn test_notice_crud_and_publish() {
        let (db, _dir) = open_test_db();
        let notice = db
            .create_notice(NewNotice {
                title: "Downtime".to_string(),
                content: "Saturday *morning*".to_string(),
                published: false,
            })
            .unwrap();
        assert_eq!(db.get_notice(&notice.id).unwrap(), Some(notice.clone()));

        db.set_published(&notice.id, true).unwrap();
        let stored = db.get_notice(&notice.id).unwrap().unwrap();
        assert!(stored.published);
        assert!(stored.updated_at.is_some());
        assert_eq!(stored.content, "Saturday *morning*");

        assert!(db.set_published("missing", true).is_err());
        assert!(db.update_notice("missing", NoticePatch::default()).is_err());

        db.delete_notice(&notice.id).unwrap();
        assert!(db.get_notice(&notice.id).unwrap().is_none());
        db.delete_notice(&notice.id).unwrap();
    }

    #[test]
    fn test_notices_newest_first() {
        let (db, _dir) = open_test_db();
        let now = Utc::now();
        for (title, offset) in [("old", 0), ("new", 2), ("mid", 1)] {
            db.put_notice(&Notice {
                id: format!("notice-{title}"),
                title: title.to_string(),
                content: String::new(),
                published: true,
                created_at: now + Duration::seconds(offset),
                updated_at: None,
            })
            .unwrap();
        }
        let titles: Vec<String> = db
            .list_notices()
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_duplicate_email_rejected_case_insensitively() {
        let (db, _dir) = open_test_db();
        db.add(Subscriber::confirmed("Reader@Example.com", Utc::now()))
            .unwrap();
        assert!(db
            .add(Subscriber::pending("reader@example.com", Utc::now()))
            .is_err());
        assert_eq!(db.list_subscribers().unwrap().len(), 1);

        let found = db.find_by_email("READER@example.com").unwrap().unwrap();
        assert_eq!(found.email, "Reader@Example.com");
    }

    #[test]
    fn test_remove_frees_email() {
        let (db, _dir) = open_test_db();
        let subscriber = Subscriber::confirmed("a@example.com", Utc::now());
        let id = subscriber.id.clone();
        db.add(subscriber).unwrap();

        assert!(db.remove(&id).unwrap());
        assert!(!db.remove(&id).unwrap());
        assert!(db.find_by_email("a@example.com").unwrap().is_none());
        db.add(Subscriber::confirmed("a@example.com", Utc::now()))
            .unwrap();
    }

    #[test]
    fn test_save_reindexes_changed_email() {
        let (db, _dir) = open_test_db();
        let mut subscriber = Subscriber::pending("old@example.com", Utc::now());
        db.add(subscriber.clone()).unwrap();
        db.add(Subscriber::confirmed("taken@example.com", Utc::now()))
            .unwrap();

        subscriber.email = "taken@example.com".to_string();
        assert!(db.save(&subscriber).is_err());

        subscriber.email = "new@example.com".to_string();
        db.save(&subscriber).unwrap();
        assert!(db.find_by_email("old@example.com").unwrap().is_none());
        assert_eq!(
            db.find_by_email("new@example.com").unwrap().unwrap().id,
            subscriber.id
        );
    }

    #[test]
    fn test_save_unknown_subscriber_fails() {
        let (db, _dir) = open_test_db();
        let stray = Subscriber::pending("stray@example.com", Utc::now());
        assert!(db.save(&stray).is_err());
    }

    #[test]
    fn test_find_by_token() {
        let (db, _dir) = open_test_db();
        let pending = Subscriber::pending("p@example.com", Utc::now());
        let token = pending.confirm_token.clone().unwrap();
        db.add(pending).unwrap();

        assert_eq!(
            db.find_by_token(&token).unwrap().unwrap().email,
            "p@example.com"
        );
        assert!(db.find_by_token("nope").unwrap().is_none());
        assert!(db.find_by_token("").unwrap().is_none());
    }

    #[test]
    fn test_sends_newest_first() {
        let (db, _dir) = open_test_db();
        let now = Utc::now();
        for (i, title) in ["old", "mid", "new"].iter().enumerate() {
            db.record(&SendRecord {
                id: format!("send-{title}"),
                newsletter_id: "n".to_string(),
                newsletter_title: title.to_string(),
                sent_at: now + Duration::seconds(i as i64),
                status: SendStatus::Success,
                error_message: None,
                recipient_count: 1,
                success_count: 1,
                fail_count: 0,
            })
            .unwrap();
        }
        let titles: Vec<String> = db
            .list_sends()
            .unwrap()
            .into_iter()
            .map(|s| s.newsletter_title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }
}

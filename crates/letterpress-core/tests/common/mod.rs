// Shared in-memory fakes for the gateway traits.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use letterpress_core::gateway::{
    DeliveryReport, Mailer, MediaStore, NewsletterStore, NoticeStore, OutgoingEmail, SendLog,
    SubscriberStore,
};
use letterpress_core::newsletter::{
    NewNewsletter, NewNotice, Newsletter, NewsletterPatch, Notice, NoticePatch, SendRecord,
    SortOrder, Subscriber,
};

#[derive(Default)]
pub struct MemoryStore {
    newsletters: RefCell<BTreeMap<String, Newsletter>>,
    notices: RefCell<Vec<Notice>>,
    subscribers: RefCell<Vec<Subscriber>>,
    sends: RefCell<Vec<SendRecord>>,
    next_id: Cell<u64>,
}

impl MemoryStore {
    pub fn newsletter_count(&self) -> usize {
        self.newsletters.borrow().len()
    }
}

impl NewsletterStore for MemoryStore {
    fn create(&self, draft: NewNewsletter) -> Result<Newsletter> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let newsletter = draft.into_newsletter(format!("nl-{id}"), Utc::now());
        self.newsletters
            .borrow_mut()
            .insert(newsletter.id.clone(), newsletter.clone());
        Ok(newsletter)
    }

    fn update(&self, id: &str, patch: NewsletterPatch) -> Result<()> {
        let mut map = self.newsletters.borrow_mut();
        let newsletter = map.get_mut(id).context("not found")?;
        newsletter.apply(patch, Utc::now());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.newsletters.borrow_mut().remove(id);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Newsletter>> {
        Ok(self.newsletters.borrow().get(id).cloned())
    }

    fn list_by_created(&self, order: SortOrder) -> Result<Vec<Newsletter>> {
        let mut all: Vec<Newsletter> = self.newsletters.borrow().values().cloned().collect();
        all.sort_by_key(|n| n.created_at);
        if order == SortOrder::Descending {
            all.reverse();
        }
        Ok(all)
    }
}

impl NoticeStore for MemoryStore {
    fn create_notice(&self, draft: NewNotice) -> Result<Notice> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let notice = draft.into_notice(format!("nt-{id}"), Utc::now());
        self.notices.borrow_mut().push(notice.clone());
        Ok(notice)
    }

    fn update_notice(&self, id: &str, patch: NoticePatch) -> Result<()> {
        let mut all = self.notices.borrow_mut();
        let notice = all.iter_mut().find(|n| n.id == id).context("not found")?;
        notice.apply(patch, Utc::now());
        Ok(())
    }

    fn delete_notice(&self, id: &str) -> Result<()> {
        self.notices.borrow_mut().retain(|n| n.id != id);
        Ok(())
    }

    fn get_notice(&self, id: &str) -> Result<Option<Notice>> {
        Ok(self.notices.borrow().iter().find(|n| n.id == id).cloned())
    }

    fn list_notices(&self) -> Result<Vec<Notice>> {
        Ok(self.notices.borrow().iter().rev().cloned().collect())
    }
}

impl SubscriberStore for MemoryStore {
    fn add(&self, subscriber: Subscriber) -> Result<()> {
        if self.find_by_email(&subscriber.email)?.is_some() {
            bail!("duplicate email {}", subscriber.email);
        }
        self.subscribers.borrow_mut().push(subscriber);
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        Ok(self
            .subscribers
            .borrow()
            .iter()
            .find(|s| s.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn find_by_token(&self, token: &str) -> Result<Option<Subscriber>> {
        Ok(self
            .subscribers
            .borrow()
            .iter()
            .find(|s| s.confirm_token.as_deref() == Some(token))
            .cloned())
    }

    fn save(&self, subscriber: &Subscriber) -> Result<()> {
        let mut all = self.subscribers.borrow_mut();
        let slot = all
            .iter_mut()
            .find(|s| s.id == subscriber.id)
            .context("not found")?;
        *slot = subscriber.clone();
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let mut all = self.subscribers.borrow_mut();
        let before = all.len();
        all.retain(|s| s.id != id);
        Ok(all.len() != before)
    }

    fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.borrow().clone())
    }
}

impl SendLog for MemoryStore {
    fn record(&self, send: &SendRecord) -> Result<()> {
        self.sends.borrow_mut().push(send.clone());
        Ok(())
    }

    fn list_sends(&self) -> Result<Vec<SendRecord>> {
        Ok(self.sends.borrow().iter().rev().cloned().collect())
    }
}

impl MediaStore for MemoryStore {
    fn upload(&self, _bytes: &[u8], path_hint: &str) -> Result<String> {
        Ok(format!("https://media.test/{path_hint}"))
    }
}

/// Records every message; optionally fails the n-th send (0-based).
#[derive(Default)]
pub struct FakeMailer {
    pub sent: RefCell<Vec<OutgoingEmail>>,
    pub fail_on: Option<usize>,
    /// Caps `accepted` per message without naming the refused recipients.
    pub accept_limit: Option<usize>,
    calls: Cell<usize>,
}

impl FakeMailer {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Default::default()
        }
    }

    pub fn accepting_at_most(limit: usize) -> Self {
        Self {
            accept_limit: Some(limit),
            ..Default::default()
        }
    }
}

impl Mailer for FakeMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReport> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.fail_on == Some(call) {
            bail!("provider unavailable");
        }
        self.sent.borrow_mut().push(email.clone());
        let accepted = self.accept_limit.map_or(email.to.len(), |n| n.min(email.to.len()));
        Ok(DeliveryReport::all_accepted(accepted))
    }
}

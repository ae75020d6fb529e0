/// Subscriber list management with double opt-in.
///
/// Self-service subscriptions stay pending until the emailed confirmation
/// link is followed. Bulk imports are trusted and added confirmed.
use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use regex::Regex;

use crate::gateway::{Mailer, OutgoingEmail, SubscriberStore};
use crate::newsletter::Subscriber;
use crate::render::render_confirmation_html;

/// Maximum number of addresses accepted by one bulk import.
pub const BULK_IMPORT_LIMIT: usize = 100;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Extracts candidate addresses from an uploaded list: one per line,
/// trimmed, keeping only lines that contain `@`.
pub fn parse_email_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains('@'))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A confirmation email was sent; the subscriber is pending.
    Pending(Subscriber),
    /// The address is already confirmed.
    AlreadySubscribed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed(Subscriber),
    /// No pending subscriber holds this token (already used or never issued).
    UnknownToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub skipped_invalid: usize,
}

/// Subscription workflows over a subscriber store and a mailer.
pub struct Subscriptions<'a> {
    store: &'a dyn SubscriberStore,
    mailer: &'a dyn Mailer,
    /// Public site root used to build confirmation links.
    site_url: String,
}

impl<'a> Subscriptions<'a> {
    pub fn new(
        store: &'a dyn SubscriberStore,
        mailer: &'a dyn Mailer,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            mailer,
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn confirm_url(&self, token: &str) -> String {
        format!("{}/confirm-subscription?token={token}", self.site_url)
    }

    /// Starts a double opt-in subscription.
    ///
    /// A pending address gets its confirmation email again with the same token.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid, or the store or mailer fails.
    pub fn subscribe(&self, email: &str) -> Result<SubscribeOutcome> {
        let email = email.trim();
        if !is_valid_email(email) {
            bail!("Invalid email address: '{email}'");
        }

        let subscriber = match self.store.find_by_email(email)? {
            Some(existing) if existing.confirmed => {
                tracing::debug!("{email} is already subscribed");
                return Ok(SubscribeOutcome::AlreadySubscribed);
            }
            Some(existing) => existing,
            None => {
                let subscriber = Subscriber::pending(email, Utc::now());
                self.store
                    .add(subscriber.clone())
                    .with_context(|| format!("Failed to add subscriber {email}"))?;
                subscriber
            }
        };

        let token = subscriber
            .confirm_token
            .as_deref()
            .context("Pending subscriber has no confirmation token")?;
        self.mailer
            .send(&OutgoingEmail {
                to: vec![subscriber.email.clone()],
                subject: "Please confirm your subscription".to_string(),
                html: render_confirmation_html(&self.confirm_url(token)),
            })
            .with_context(|| format!("Failed to send confirmation email to {email}"))?;

        tracing::info!("Confirmation sent to {email}");
        Ok(SubscribeOutcome::Pending(subscriber))
    }

    /// Redeems a confirmation token.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn confirm(&self, token: &str) -> Result<ConfirmOutcome> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(ConfirmOutcome::UnknownToken);
        }
        let Some(mut subscriber) = self.store.find_by_token(token)? else {
            return Ok(ConfirmOutcome::UnknownToken);
        };
        subscriber.confirm(Utc::now());
        self.store
            .save(&subscriber)
            .with_context(|| format!("Failed to confirm subscriber {}", subscriber.email))?;
        tracing::info!("Subscriber {} confirmed", subscriber.email);
        Ok(ConfirmOutcome::Confirmed(subscriber))
    }

    /// Removes an address from the list. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn unsubscribe(&self, email: &str) -> Result<bool> {
        match self.store.find_by_email(email.trim())? {
            Some(subscriber) => {
                let removed = self.store.remove(&subscriber.id)?;
                tracing::info!("Subscriber {} removed", subscriber.email);
                Ok(removed)
            }
            None => Ok(false),
        }
    }

    /// Adds a batch of already-consented addresses.
    ///
    /// Invalid and already-present addresses are skipped, as are repeats
    /// within the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch is empty or larger than
    /// [`BULK_IMPORT_LIMIT`], or if the store fails.
    pub fn import_bulk(&self, emails: &[String]) -> Result<ImportReport> {
        if emails.is_empty() {
            bail!("No email addresses to import");
        }
        if emails.len() > BULK_IMPORT_LIMIT {
            bail!(
                "At most {BULK_IMPORT_LIMIT} addresses can be imported at once (got {})",
                emails.len()
            );
        }

        let mut report = ImportReport::default();
        let mut seen = HashSet::new();
        let now = Utc::now();
        for email in emails {
            let email = email.trim();
            if !is_valid_email(email) {
                report.skipped_invalid += 1;
                continue;
            }
            if !seen.insert(email.to_string()) || self.store.find_by_email(email)?.is_some() {
                report.skipped_duplicates += 1;
                continue;
            }
            self.store
                .add(Subscriber::confirmed(email, now))
                .with_context(|| format!("Failed to import {email}"))?;
            report.imported += 1;
        }

        tracing::info!(
            "Imported {} subscriber(s), skipped {} duplicate(s) and {} invalid",
            report.imported,
            report.skipped_duplicates,
            report.skipped_invalid
        );
        Ok(report)
    }
}

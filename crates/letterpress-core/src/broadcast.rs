/// Sending a newsletter to every confirmed subscriber.
use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::gateway::{Mailer, NewsletterStore, OutgoingEmail, SendLog, SubscriberStore};
use crate::newsletter::{SendRecord, SendStatus};
use crate::render::{render_newsletter_html, RenderOptions};

/// Default number of recipients per outgoing message.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct BroadcastOptions {
    /// Recipients per message. Values below 1 are treated as 1.
    pub batch_size: usize,
    /// Public site root. Mail links to its `/unsubscribe` landing page.
    ///
    /// One message goes to a whole batch, so the link carries no
    /// per-recipient email or token. The page asks for the address and
    /// removal goes through `Subscriptions::unsubscribe`.
    pub site_url: String,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            site_url: String::new(),
        }
    }
}

pub struct Broadcaster<'a> {
    pub newsletters: &'a dyn NewsletterStore,
    pub subscribers: &'a dyn SubscriberStore,
    pub sends: &'a dyn SendLog,
    pub mailer: &'a dyn Mailer,
    pub options: BroadcastOptions,
}

impl Broadcaster<'_> {
    /// Renders a newsletter and mails it to all confirmed subscribers.
    ///
    /// Recipients are sent in batches. A batch that fails counts all of its
    /// recipients as failed, and the remaining batches are still attempted.
    /// The outcome is written to the send log and returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the newsletter does not exist, there are no
    /// confirmed subscribers, or the stores fail. Delivery failures are
    /// reported in the returned record instead.
    pub fn send(&self, newsletter_id: &str) -> Result<SendRecord> {
        let newsletter = self
            .newsletters
            .get(newsletter_id)?
            .with_context(|| format!("Newsletter {newsletter_id} not found"))?;

        let recipients: Vec<String> = self
            .subscribers
            .list_subscribers()?
            .into_iter()
            .filter(|s| s.confirmed)
            .map(|s| s.email)
            .collect();
        if recipients.is_empty() {
            bail!("There are no confirmed subscribers to send to");
        }

        let unsubscribe_url = (!self.options.site_url.is_empty()).then(|| {
            format!("{}/unsubscribe", self.options.site_url.trim_end_matches('/'))
        });
        let html = render_newsletter_html(&newsletter, &RenderOptions { unsubscribe_url });

        let mut success_count = 0;
        let mut first_error = None;
        for batch in recipients.chunks(self.options.batch_size.max(1)) {
            let email = OutgoingEmail {
                to: batch.to_vec(),
                subject: newsletter.title.clone(),
                html: html.clone(),
            };
            match self.mailer.send(&email) {
                Ok(report) => {
                    let accepted = report.accepted.min(batch.len());
                    success_count += accepted;
                    if accepted < batch.len() && first_error.is_none() {
                        first_error = Some(if report.rejected.is_empty() {
                            format!(
                                "{} of {} recipients not accepted",
                                batch.len() - accepted,
                                batch.len()
                            )
                        } else {
                            format!("Rejected: {}", report.rejected.join(", "))
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to send batch of {}: {e:#}", batch.len());
                    first_error.get_or_insert_with(|| format!("{e:#}"));
                }
            }
        }

        let recipient_count = recipients.len();
        let fail_count = recipient_count - success_count;
        let record = SendRecord {
            id: uuid::Uuid::new_v4().to_string(),
            newsletter_id: newsletter.id.clone(),
            newsletter_title: newsletter.title.clone(),
            sent_at: Utc::now(),
            status: if fail_count == 0 {
                SendStatus::Success
            } else {
                SendStatus::Failed
            },
            error_message: if fail_count == 0 { None } else { first_error },
            recipient_count,
            success_count,
            fail_count,
        };
        self.sends
            .record(&record)
            .context("Failed to record newsletter send")?;

        tracing::info!(
            "Sent '{}' to {success_count}/{recipient_count} subscriber(s)",
            newsletter.title
        );
        Ok(record)
    }
}

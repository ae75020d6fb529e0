/// A mailer that drops each message into an outbox directory as JSON.
///
/// A relay (or a human) picks the files up and hands them to the real
/// provider. Every recipient is reported as accepted once the file is written.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use letterpress_core::gateway::{DeliveryReport, Mailer, OutgoingEmail};

/// On-disk shape of one outbox file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OutboxMailer {
    dir: PathBuf,
    sender: String,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>, sender: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            sender: sender.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads every queued message, oldest first.
    pub fn queued(&self) -> Result<Vec<OutboxMessage>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read outbox: {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        paths
            .iter()
            .map(|path| {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("Failed to parse {}", path.display()))
            })
            .collect()
    }
}

impl Mailer for OutboxMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReport> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create outbox: {}", self.dir.display()))?;

        let queued_at = Utc::now();
        let message = OutboxMessage {
            from: self.sender.clone(),
            to: email.to.clone(),
            subject: email.subject.clone(),
            html: email.html.clone(),
            queued_at,
        };
        let json = serde_json::to_string_pretty(&message).context("Failed to serialize email")?;

        let file_name = format!(
            "{}-{}.json",
            queued_at.format("%Y%m%dT%H%M%S%.6f"),
            uuid::Uuid::new_v4().simple()
        );
        let path = self.dir.join(file_name);
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write outbox file: {}", path.display()))?;

        tracing::debug!(
            "Queued \"{}\" for {} recipient(s) at {}",
            email.subject,
            email.to.len(),
            path.display()
        );
        Ok(DeliveryReport::all_accepted(email.to.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn email(to: &[&str], subject: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.iter().map(|s| s.to_string()).collect(),
            subject: subject.to_string(),
            html: "<p>hi</p>".to_string(),
        }
    }

    #[test]
    fn test_send_writes_json_file() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path().join("outbox"), "noreply@example.com");

        let report = mailer
            .send(&email(&["a@example.com", "b@example.com"], "Issue 1"))
            .unwrap();
        assert_eq!(report, DeliveryReport::all_accepted(2));

        let queued = mailer.queued().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].from, "noreply@example.com");
        assert_eq!(queued[0].to, vec!["a@example.com", "b@example.com"]);
        assert_eq!(queued[0].subject, "Issue 1");
        assert_eq!(queued[0].html, "<p>hi</p>");
    }

    #[test]
    fn test_queued_keeps_send_order() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path(), "s@example.com");
        for subject in ["one", "two", "three"] {
            mailer.send(&email(&["a@example.com"], subject)).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let subjects: Vec<String> = mailer
            .queued()
            .unwrap()
            .into_iter()
            .map(|m| m.subject)
            .collect();
        assert_eq!(subjects, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_empty_outbox() {
        let dir = TempDir::new().unwrap();
        let mailer = OutboxMailer::new(dir.path().join("missing"), "s@example.com");
        assert!(mailer.queued().unwrap().is_empty());
    }
}

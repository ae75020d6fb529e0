/// Command dispatch over the local gateways.
use std::io::{BufRead, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use letterpress_config::AppConfig;
use letterpress_core::broadcast::{BroadcastOptions, Broadcaster};
use letterpress_core::gateway::{MediaStore, NewsletterStore, SendLog, SubscriberStore};
use letterpress_core::history::HistoryConfig;
use letterpress_core::newsletter::{Notice, SendStatus, SortOrder};
use letterpress_core::notice::{visibility, Notices};
use letterpress_core::render::{render_newsletter_html, RenderOptions};
use letterpress_core::subscription::{
    parse_email_lines, ConfirmOutcome, SubscribeOutcome, Subscriptions,
};
use letterpress_core::templates::{builtin_templates, find_template};
use letterpress_core::EditorSession;
use letterpress_store::{Database, LocalMediaStore, OutboxMailer};

use crate::cli::Command;
use crate::commands::EditShell;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "aac", "flac"];

pub struct App {
    config: AppConfig,
    db: Database,
    media: LocalMediaStore,
    mailer: OutboxMailer,
}

impl App {
    /// Opens the database, media directory and outbox under the configured data dir.
    pub fn open(config: AppConfig) -> Result<Self> {
        let db = Database::open(&config.database_path())?;
        let media = LocalMediaStore::new(config.media_dir(), config.media_base_url.clone());
        let mailer = OutboxMailer::new(config.outbox_dir(), config.sender_email.clone());
        tracing::debug!("Data directory: {}", config.resolve_data_dir().display());
        Ok(Self {
            config,
            db,
            media,
            mailer,
        })
    }

    fn history_config(&self) -> HistoryConfig {
        self.config
            .history_max_depth
            .map(HistoryConfig::bounded)
            .unwrap_or_default()
    }

    fn subscriptions(&self) -> Subscriptions<'_> {
        Subscriptions::new(&self.db, &self.mailer, self.config.site_url.clone())
    }

    fn broadcaster(&self) -> Broadcaster<'_> {
        Broadcaster {
            newsletters: &self.db,
            subscribers: &self.db,
            sends: &self.db,
            mailer: &self.mailer,
            options: BroadcastOptions {
                batch_size: self.config.send_batch_size,
                site_url: self.config.site_url.clone(),
            },
        }
    }

    /// Previews link the same unsubscribe landing page a broadcast does.
    fn render_options(&self) -> RenderOptions {
        RenderOptions {
            unsubscribe_url: Some(format!(
                "{}/unsubscribe",
                self.config.site_url.trim_end_matches('/')
            )),
        }
    }

    pub fn run(&self, command: Command, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Templates => {
                for template in builtin_templates() {
                    writeln!(
                        out,
                        "{:<14} {} ({} blocks): {}",
                        template.id,
                        template.name,
                        template.blocks.len(),
                        template.description
                    )?;
                }
            }
            Command::New { title, template } => {
                let mut session = match template.as_deref() {
                    Some(id) => {
                        let Some(template) = find_template(id) else {
                            let known: Vec<&str> =
                                builtin_templates().iter().map(|t| t.id).collect();
                            bail!("Unknown template '{id}' (available: {})", known.join(", "));
                        };
                        EditorSession::from_template(&template, self.history_config())
                    }
                    None => EditorSession::new(self.history_config()),
                };
                session.set_title(title);
                let saved = session.save(&self.db, &self.media)?;
                tracing::info!("Created newsletter {}", saved.id);
                writeln!(out, "{}", saved.id)?;
            }
            Command::List => {
                for newsletter in self.db.list_by_created(SortOrder::Descending)? {
                    writeln!(
                        out,
                        "{}  {}  {}",
                        newsletter.id,
                        newsletter.created_at.format("%Y-%m-%d %H:%M"),
                        newsletter.title
                    )?;
                }
            }
            Command::Show { id } => {
                let newsletter = self.db.get(&id)?.with_context(|| format!("Newsletter {id} not found"))?;
                writeln!(out, "{}", newsletter.title)?;
                writeln!(out, "id:        {}", newsletter.id)?;
                writeln!(out, "created:   {}", newsletter.created_at.to_rfc3339())?;
                if let Some(updated) = newsletter.updated_at {
                    writeln!(out, "updated:   {}", updated.to_rfc3339())?;
                }
                writeln!(out, "thumbnail: {}", newsletter.thumbnail_url)?;
                writeln!(out, "summary:   {}", newsletter.summary.replace('\n', " "))?;
                for (i, block) in newsletter.content.blocks.iter().enumerate() {
                    writeln!(out, "{:>3}. {}", i + 1, block.describe())?;
                }
            }
            Command::Edit { id, script } => {
                let newsletter = self.db.get(&id)?.with_context(|| format!("Newsletter {id} not found"))?;
                let session = EditorSession::from_newsletter(&newsletter, self.history_config());
                let mut shell = EditShell::new(session, &self.db, &self.media);
                match script {
                    Some(path) => {
                        let file = std::fs::File::open(&path)
                            .with_context(|| format!("Failed to open script: {}", path.display()))?;
                        shell.run(&mut std::io::BufReader::new(file), out)?;
                    }
                    None => shell.run(input, out)?,
                }
            }
            Command::Render { id, out: target } => {
                let newsletter = self.db.get(&id)?.with_context(|| format!("Newsletter {id} not found"))?;
                let html = render_newsletter_html(&newsletter, &self.render_options());
                match target {
                    Some(path) => {
                        std::fs::write(&path, html)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        writeln!(out, "wrote {}", path.display())?;
                    }
                    None => out.write_all(html.as_bytes())?,
                }
            }
            Command::Delete { id } => {
                if self.db.get(&id)?.is_none() {
                    bail!("Newsletter {id} not found");
                }
                self.db.delete(&id)?;
                tracing::info!("Deleted newsletter {id}");
                writeln!(out, "deleted {id}")?;
            }
            Command::Send { id } => {
                let record = self.broadcaster().send(&id)?;
                writeln!(
                    out,
                    "{}: {}/{} delivered",
                    record.status, record.success_count, record.recipient_count
                )?;
                if record.status == SendStatus::Failed {
                    if let Some(message) = &record.error_message {
                        writeln!(out, "first error: {message}")?;
                    }
                }
            }
            Command::Subscribe { email } => match self.subscriptions().subscribe(&email)? {
                SubscribeOutcome::Pending(subscriber) => {
                    writeln!(out, "confirmation sent to {}", subscriber.email)?
                }
                SubscribeOutcome::AlreadySubscribed => writeln!(out, "already subscribed")?,
            },
            Command::Confirm { token } => match self.subscriptions().confirm(&token)? {
                ConfirmOutcome::Confirmed(subscriber) => {
                    writeln!(out, "confirmed {}", subscriber.email)?
                }
                ConfirmOutcome::UnknownToken => bail!("Invalid or already used confirmation token"),
            },
            Command::Unsubscribe { email } => {
                if self.subscriptions().unsubscribe(&email)? {
                    writeln!(out, "removed {}", email.trim())?;
                } else {
                    bail!("{} is not subscribed", email.trim());
                }
            }
            Command::Import { file } => {
                let text = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let report = self.subscriptions().import_bulk(&parse_email_lines(&text))?;
                writeln!(
                    out,
                    "imported {}, skipped {} duplicate(s) and {} invalid",
                    report.imported, report.skipped_duplicates, report.skipped_invalid
                )?;
            }
            Command::Subscribers => {
                for subscriber in self.db.list_subscribers()? {
                    let status = if subscriber.confirmed { "confirmed" } else { "pending" };
                    writeln!(
                        out,
                        "{:<9}  {}  {}",
                        status,
                        subscriber.added_at.format("%Y-%m-%d"),
                        subscriber.email
                    )?;
                }
            }
            Command::Sends => {
                for send in self.db.list_sends()? {
                    writeln!(
                        out,
                        "{}  {:<7}  {}/{}  {}",
                        send.sent_at.format("%Y-%m-%d %H:%M"),
                        send.status,
                        send.success_count,
                        send.recipient_count,
                        send.newsletter_title
                    )?;
                }
            }
            Command::Upload { file } => {
                let url = self.upload(&file)?;
                writeln!(out, "{url}")?;
            }
            Command::NoticeNew {
                title,
                content,
                file,
                publish,
            } => {
                let body = match read_body(content, file.as_deref())? {
                    Some(body) => body,
                    None => {
                        let mut body = String::new();
                        input
                            .read_to_string(&mut body)
                            .context("Failed to read notice body")?;
                        body
                    }
                };
                let notice = Notices::new(&self.db).post(&title, &body, publish)?;
                writeln!(out, "{}", notice.id)?;
            }
            Command::NoticeEdit {
                id,
                title,
                content,
                file,
            } => {
                let notices = Notices::new(&self.db);
                let current = notices
                    .get(&id)?
                    .with_context(|| format!("Notice {id} not found"))?;
                let body = read_body(content, file.as_deref())?.unwrap_or(current.content);
                let title = title.unwrap_or(current.title);
                let notice = notices.edit(&id, &title, &body)?;
                writeln!(out, "updated {}", notice.id)?;
            }
            Command::Notices { published } => {
                for notice in Notices::new(&self.db).list(published)? {
                    writeln!(
                        out,
                        "{}  {}  {:<9}  {}",
                        notice.id,
                        notice.created_at.format("%Y-%m-%d %H:%M"),
                        visibility(notice.published),
                        notice.title
                    )?;
                }
            }
            Command::NoticeShow { id } => {
                let notice = Notices::new(&self.db)
                    .get(&id)?
                    .with_context(|| format!("Notice {id} not found"))?;
                write_notice(&notice, out)?;
            }
            Command::NoticeDelete { id } => {
                if !Notices::new(&self.db).delete(&id)? {
                    bail!("Notice {id} not found");
                }
                writeln!(out, "deleted {id}")?;
            }
            Command::Publish { id } => {
                let notice = Notices::new(&self.db).publish(&id, true)?;
                writeln!(out, "published {}", notice.id)?;
            }
            Command::Unpublish { id } => {
                let notice = Notices::new(&self.db).publish(&id, false)?;
                writeln!(out, "unpublished {}", notice.id)?;
            }
        }
        Ok(())
    }

    fn upload(&self, file: &Path) -> Result<String> {
        let bytes =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            bail!("Not a file: {}", file.display());
        };
        let is_audio = file
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()));
        let folder = if is_audio { "audios" } else { "images" };
        self.media.upload(&bytes, &format!("{folder}/{name}"))
    }
}

/// Body from `--content` or `--file`; `None` when neither was given.
fn read_body(content: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match (content, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => Ok(None),
    }
}

fn write_notice(notice: &Notice, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", notice.title)?;
    writeln!(out, "id:        {}", notice.id)?;
    writeln!(out, "status:    {}", visibility(notice.published))?;
    writeln!(out, "created:   {}", notice.created_at.to_rfc3339())?;
    if let Some(updated) = notice.updated_at {
        writeln!(out, "updated:   {}", updated.to_rfc3339())?;
    }
    writeln!(out)?;
    writeln!(out, "{}", notice.content)?;
    Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Block-based newsletter editor with double opt-in mailing.
#[derive(Parser, Debug)]
#[command(name = "letterpress", version, about)]
pub struct Cli {
    /// Path to the config file (defaults to letterpress.json next to the executable).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in templates.
    Templates,
    /// Create a newsletter, optionally from a template.
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        template: Option<String>,
    },
    /// List newsletters, newest first.
    List,
    /// Show a newsletter and its blocks.
    Show { id: String },
    /// Edit a newsletter's blocks with line commands (stdin or a script file).
    Edit {
        id: String,
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Render a newsletter as HTML.
    Render {
        id: String,
        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete a newsletter.
    Delete { id: String },
    /// Send a newsletter to all confirmed subscribers.
    Send { id: String },
    /// Subscribe an address (sends a confirmation email).
    Subscribe { email: String },
    /// Redeem a confirmation token.
    Confirm { token: String },
    /// Remove an address from the list.
    Unsubscribe { email: String },
    /// Import confirmed subscribers from a file with one address per line.
    Import { file: PathBuf },
    /// List subscribers.
    Subscribers,
    /// List past sends, newest first.
    Sends,
    /// Upload a media file and print its public URL.
    Upload { file: PathBuf },
    /// Post a notice. The markdown body comes from --content, --file, or stdin.
    NoticeNew {
        #[arg(long)]
        title: String,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// Publish immediately instead of saving a draft.
        #[arg(long)]
        publish: bool,
    },
    /// Change a notice's title or body.
    NoticeEdit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List notices, newest first.
    Notices {
        /// Only show published notices.
        #[arg(long)]
        published: bool,
    },
    /// Show a notice with its body.
    NoticeShow { id: String },
    /// Delete a notice.
    NoticeDelete { id: String },
    /// Make a notice public.
    Publish { id: String },
    /// Hide a notice again.
    Unpublish { id: String },
}

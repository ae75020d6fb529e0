/// Line-oriented editing commands for an `EditorSession`.
///
/// Positions are 1-based, matching the numbering printed by `blocks`.
use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use letterpress_core::block::{BlockContent, BlockType};
use letterpress_core::gateway::{MediaStore, NewsletterStore};
use letterpress_core::EditorSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Add(BlockType),
    Text { index: usize, text: String },
    Image { index: usize, url: String },
    Audio { index: usize, url: String },
    Button { index: usize, label: String, url: String },
    Remove(usize),
    Move { from: usize, to: usize },
    Undo,
    Redo,
    Title(String),
    Save,
    Blocks,
    Quit,
}

/// Splits off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Parses a 1-based position into a 0-based index.
fn parse_index(word: &str) -> Result<usize> {
    let position: usize = word
        .parse()
        .with_context(|| format!("Expected a block number, got '{word}'"))?;
    if position == 0 {
        bail!("Block numbers start at 1");
    }
    Ok(position - 1)
}

fn require<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    if value.is_empty() {
        bail!("Missing {what}");
    }
    Ok(value)
}

impl EditCommand {
    /// Parses one line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, rest) = split_word(line);
        let command = match verb.to_ascii_lowercase().as_str() {
            "add" => EditCommand::Add(require(rest, "block type")?.parse()?),
            "text" => {
                let (index, text) = split_word(rest);
                EditCommand::Text {
                    index: parse_index(index)?,
                    text: text.replace("\\n", "\n"),
                }
            }
            "image" | "audio" => {
                let (index, url) = split_word(rest);
                let index = parse_index(index)?;
                let url = require(url, "URL")?.to_string();
                if verb.eq_ignore_ascii_case("image") {
                    EditCommand::Image { index, url }
                } else {
                    EditCommand::Audio { index, url }
                }
            }
            "button" => {
                let (index, rest) = split_word(rest);
                let index = parse_index(index)?;
                let Some((label, url)) = rest.rsplit_once(char::is_whitespace) else {
                    bail!("Usage: button <n> <label> <url>");
                };
                EditCommand::Button {
                    index,
                    label: require(label.trim(), "button label")?.to_string(),
                    url: url.to_string(),
                }
            }
            "remove" => EditCommand::Remove(parse_index(require(rest, "block number")?)?),
            "move" => {
                let (from, to) = split_word(rest);
                EditCommand::Move {
                    from: parse_index(from)?,
                    to: parse_index(require(to, "target block number")?)?,
                }
            }
            "undo" => EditCommand::Undo,
            "redo" => EditCommand::Redo,
            "title" => EditCommand::Title(require(rest, "title")?.to_string()),
            "save" => EditCommand::Save,
            "blocks" => EditCommand::Blocks,
            "quit" | "exit" => EditCommand::Quit,
            other => bail!("Unknown command '{other}'"),
        };
        Ok(Some(command))
    }
}

/// Whether the edit loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies edit commands to a session, saving through the given gateways.
pub struct EditShell<'a> {
    pub session: EditorSession,
    store: &'a dyn NewsletterStore,
    media: &'a dyn MediaStore,
}

impl<'a> EditShell<'a> {
    pub fn new(
        session: EditorSession,
        store: &'a dyn NewsletterStore,
        media: &'a dyn MediaStore,
    ) -> Self {
        Self {
            session,
            store,
            media,
        }
    }

    /// Id of the block at `index`, checking it has the expected type.
    fn block_id(&self, index: usize, expected: BlockType) -> Result<String> {
        let block = self
            .session
            .blocks()
            .get(index)
            .with_context(|| format!("No block {}", index + 1))?;
        if block.block_type() != expected {
            bail!(
                "Block {} is a {} block, not {expected}",
                index + 1,
                block.block_type()
            );
        }
        Ok(block.id.clone())
    }

    pub fn execute(&mut self, command: EditCommand, out: &mut dyn Write) -> Result<Flow> {
        match command {
            EditCommand::Add(block_type) => {
                self.session.add_block(block_type);
                writeln!(out, "added {block_type} block {}", self.session.blocks().len())?;
            }
            EditCommand::Text { index, text } => {
                let id = self.block_id(index, BlockType::Text)?;
                self.session.edit_block(&id, |block| {
                    if let BlockContent::Text(content) = &mut block.content {
                        content.text = text;
                    }
                })?;
            }
            EditCommand::Image { index, url } => {
                let id = self.block_id(index, BlockType::Image)?;
                self.session.edit_block(&id, |block| {
                    block.set_media_url(url);
                })?;
            }
            EditCommand::Audio { index, url } => {
                let id = self.block_id(index, BlockType::Audio)?;
                self.session.edit_block(&id, |block| {
                    block.set_media_url(url);
                })?;
            }
            EditCommand::Button { index, label, url } => {
                let id = self.block_id(index, BlockType::Button)?;
                self.session.edit_block(&id, |block| {
                    if let BlockContent::Button(content) = &mut block.content {
                        content.button_text = label;
                        content.button_url = url;
                    }
                })?;
            }
            EditCommand::Remove(index) => {
                let id = self
                    .session
                    .blocks()
                    .get(index)
                    .map(|b| b.id.clone())
                    .with_context(|| format!("No block {}", index + 1))?;
                self.session.remove_block(&id);
            }
            EditCommand::Move { from, to } => {
                if !self.session.move_index(from, to) {
                    bail!("Cannot move block {} to {}", from + 1, to + 1);
                }
            }
            EditCommand::Undo => {
                if !self.session.undo() {
                    writeln!(out, "nothing to undo")?;
                }
            }
            EditCommand::Redo => {
                if !self.session.redo() {
                    writeln!(out, "nothing to redo")?;
                }
            }
            EditCommand::Title(title) => self.session.set_title(title),
            EditCommand::Save => {
                let saved = self.session.save(self.store, self.media)?;
                writeln!(out, "saved {}", saved.id)?;
            }
            EditCommand::Blocks => {
                writeln!(out, "{}", self.session.title())?;
                for (i, block) in self.session.blocks().iter().enumerate() {
                    writeln!(out, "{:>3}. {}", i + 1, block.describe())?;
                }
            }
            EditCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Reads commands until `quit` or end of input.
    ///
    /// A line that fails to parse or apply is reported and skipped.
    pub fn run(&mut self, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line).context("Failed to read command")? == 0 {
                break;
            }
            let result = EditCommand::parse(&line)
                .and_then(|command| match command {
                    Some(command) => self.execute(command, &mut *out),
                    None => Ok(Flow::Continue),
                });
            match result {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    tracing::debug!("Rejected edit command {:?}: {e:#}", line.trim());
                    writeln!(out, "error: {e:#}")?;
                }
            }
        }

        if self.session.is_dirty() {
            tracing::warn!("Discarding unsaved changes to \"{}\"", self.session.title());
            writeln!(out, "unsaved changes discarded")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letterpress_core::history::HistoryConfig;
    use letterpress_store::{Database, LocalMediaStore};
    use tempfile::TempDir;

    fn parse(line: &str) -> EditCommand {
        EditCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("add image"), EditCommand::Add(BlockType::Image));
        assert_eq!(
            parse("text 2  Hello   world\\nSecond line"),
            EditCommand::Text {
                index: 1,
                text: "Hello   world\nSecond line".to_string()
            }
        );
        assert_eq!(
            parse("button 1 Read the full story https://x.test/story"),
            EditCommand::Button {
                index: 0,
                label: "Read the full story".to_string(),
                url: "https://x.test/story".to_string()
            }
        );
        assert_eq!(parse("MOVE 3 1"), EditCommand::Move { from: 2, to: 0 });
        assert_eq!(parse("title  Issue 4 "), EditCommand::Title("Issue 4".to_string()));
        assert_eq!(parse("exit"), EditCommand::Quit);
    }

    #[test]
    fn test_parse_skips_blank_and_comments() {
        assert_eq!(EditCommand::parse("   ").unwrap(), None);
        assert_eq!(EditCommand::parse("# a comment").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(EditCommand::parse("add video").is_err());
        assert!(EditCommand::parse("add").is_err());
        assert!(EditCommand::parse("remove 0").is_err());
        assert!(EditCommand::parse("remove x").is_err());
        assert!(EditCommand::parse("image 1").is_err());
        assert!(EditCommand::parse("button 1 https://only-url").is_err());
        assert!(EditCommand::parse("move 1").is_err());
        assert!(EditCommand::parse("frobnicate").is_err());
    }

    struct Fixture {
        db: Database,
        media: LocalMediaStore,
        _dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            Self {
                db: Database::open(&dir.path().join("t.redb")).unwrap(),
                media: LocalMediaStore::new(dir.path().join("media"), "https://cdn.test"),
                _dir: dir,
            }
        }

        fn run(&self, script: &str) -> (EditorSession, String) {
            let session = EditorSession::new(HistoryConfig::default());
            let mut shell = EditShell::new(session, &self.db, &self.media);
            let mut out = Vec::new();
            shell.run(&mut script.as_bytes(), &mut out).unwrap();
            (shell.session, String::from_utf8(out).unwrap())
        }
    }

    #[test]
    fn test_script_builds_blocks() {
        let (session, out) = Fixture::new().run(
            "add text\n\
             text 1 Welcome\n\
             add button\n\
             button 2 Play now https://game.test\n\
             move 2 1\n\
             blocks\n\
             quit\n\
             add text\n",
        );
        let described: Vec<String> = session.blocks().iter().map(|b| b.describe()).collect();
        assert_eq!(described, vec!["button: Play now -> https://game.test", "text: Welcome"]);
        assert!(out.contains("  1. button: Play now -> https://game.test"));
        assert!(out.contains("unsaved changes discarded"));
    }

    #[test]
    fn test_script_undo_redo() {
        let (session, out) = Fixture::new().run(
            "undo\n\
             add text\n\
             add image\n\
             undo\n\
             undo\n\
             redo\n\
             redo\n\
             redo\n",
        );
        assert_eq!(session.blocks().len(), 2);
        assert_eq!(out.matches("nothing to undo").count(), 1);
        assert_eq!(out.matches("nothing to redo").count(), 1);
    }

    #[test]
    fn test_errors_are_reported_and_skipped() {
        let (session, out) = Fixture::new().run(
            "add text\n\
             image 1 https://x.test/a.png\n\
             remove 5\n\
             add image\n",
        );
        assert_eq!(session.blocks().len(), 2);
        assert!(out.contains("error: Block 1 is a text block, not image"));
        assert!(out.contains("error: No block 5"));
    }

    #[test]
    fn test_save_without_title_then_with_title() {
        let (session, out) = Fixture::new().run(
            "add text\n\
             save\n\
             title Launch day\n\
             save\n",
        );
        assert!(out.contains("error: A title is required"));
        assert!(out.contains("saved "));
        assert!(session.newsletter_id().is_some());
        assert!(!session.is_dirty());
        assert!(!out.contains("unsaved changes discarded"));
    }
}

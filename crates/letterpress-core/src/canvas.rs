/// The editing surface: a live block sequence backed by undo/redo history.
///
/// Every accepted edit commits the full resulting sequence to the session's
/// `BlockHistory`. Edits that change nothing (unknown ids, moving a block onto
/// itself) are not committed.
use anyhow::{bail, Context, Result};

use crate::block::{regenerate_ids, Block, BlockType};
use crate::gateway::{MediaStore, NewsletterStore};
use crate::history::{BlockHistory, HistoryConfig};
use crate::newsletter::{NewNewsletter, Newsletter, NewsletterContent, NewsletterPatch};
use crate::publish::{derive_summary, derive_thumbnail, resolve_local_media};
use crate::templates::Template;

/// Moves the element at `from` to `to`, shifting the elements in between.
///
/// Out-of-range indices leave `items` untouched and return `false`.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() || from == to {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

/// One editing session over one newsletter.
///
/// Owns exactly one history. Sessions never share history with each other.
#[derive(Debug)]
pub struct EditorSession {
    /// Id of the persisted newsletter, once saved.
    newsletter_id: Option<String>,
    title: String,
    /// The sequence currently shown. Always a copy, never an alias into history.
    blocks: Vec<Block>,
    history: BlockHistory,
    /// Whether anything changed since the last save or load.
    dirty: bool,
}

impl EditorSession {
    /// Starts an empty, unsaved session.
    pub fn new(config: HistoryConfig) -> Self {
        Self::seeded(None, String::new(), Vec::new(), config)
    }

    /// Starts a session over a stored newsletter.
    ///
    /// Block ids are regenerated so drafts opened side by side never collide.
    pub fn from_newsletter(newsletter: &Newsletter, config: HistoryConfig) -> Self {
        let mut blocks = newsletter.content.blocks.clone();
        regenerate_ids(&mut blocks);
        Self::seeded(
            Some(newsletter.id.clone()),
            newsletter.title.clone(),
            blocks,
            config,
        )
    }

    /// Starts an unsaved session prefilled from a template.
    pub fn from_template(template: &Template, config: HistoryConfig) -> Self {
        let mut blocks = template.blocks.clone();
        regenerate_ids(&mut blocks);
        let mut session = Self::seeded(None, String::new(), blocks, config);
        session.dirty = true;
        session
    }

    fn seeded(
        newsletter_id: Option<String>,
        title: String,
        blocks: Vec<Block>,
        config: HistoryConfig,
    ) -> Self {
        let mut history = BlockHistory::new(config);
        history.push(&blocks);
        Self {
            newsletter_id,
            title,
            blocks,
            history,
            dirty: false,
        }
    }

    pub fn newsletter_id(&self) -> Option<&str> {
        self.newsletter_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sets the title. Titles are not part of block history.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if title != self.title {
            self.title = title;
            self.dirty = true;
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    pub fn history(&self) -> &BlockHistory {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Appends an empty block of the given type.
    pub fn add_block(&mut self, block_type: BlockType) -> &Block {
        let index = self.blocks.len();
        self.insert_block(index, Block::new(block_type));
        &self.blocks[index]
    }

    /// Inserts a block at `index`, clamped to the end of the sequence.
    pub fn insert_block(&mut self, index: usize, block: Block) {
        let index = index.min(self.blocks.len());
        self.blocks.insert(index, block);
        self.commit();
    }

    /// Replaces the block with the same id.
    ///
    /// # Errors
    ///
    /// Returns an error if no block has that id.
    pub fn update_block(&mut self, block: Block) -> Result<()> {
        let Some(slot) = self.blocks.iter_mut().find(|b| b.id == block.id) else {
            bail!("No block with id '{}'", block.id);
        };
        if *slot == block {
            return Ok(());
        }
        *slot = block;
        self.commit();
        Ok(())
    }

    /// Edits the block with the given id in place through `edit`.
    ///
    /// # Errors
    ///
    /// Returns an error if no block has that id.
    pub fn edit_block(&mut self, id: &str, edit: impl FnOnce(&mut Block)) -> Result<()> {
        let mut block = self
            .block(id)
            .cloned()
            .with_context(|| format!("No block with id '{id}'"))?;
        edit(&mut block);
        block.id = id.to_string();
        self.update_block(block)
    }

    /// Removes the block with the given id.
    pub fn remove_block(&mut self, id: &str) -> Option<Block> {
        let index = self.position(id)?;
        let removed = self.blocks.remove(index);
        self.commit();
        Some(removed)
    }

    /// Drag-end handler: moves `active_id` to the position of `over_id`.
    ///
    /// Returns `false` (and commits nothing) when the ids are equal or unknown.
    pub fn move_block(&mut self, active_id: &str, over_id: &str) -> bool {
        if active_id == over_id {
            return false;
        }
        match (self.position(active_id), self.position(over_id)) {
            (Some(from), Some(to)) => self.move_index(from, to),
            _ => false,
        }
    }

    /// Moves the block at `from` to `to`.
    pub fn move_index(&mut self, from: usize, to: usize) -> bool {
        if !array_move(&mut self.blocks, from, to) {
            return false;
        }
        self.commit();
        true
    }

    /// Restores the previous state. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(blocks) => {
                self.blocks = blocks;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Restores the next state. Returns `false` when there is none.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(blocks) => {
                self.blocks = blocks;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Persists the session's newsletter.
    ///
    /// Uploads local media first, then creates the record (first save) or
    /// updates it. Stored blocks get fresh ids.
    ///
    /// Saving adds no history step. Uploaded references are swapped for
    /// their public URLs in the live blocks and in every stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank, a media upload fails, or the
    /// store fails.
    pub fn save(
        &mut self,
        store: &dyn NewsletterStore,
        media: &dyn MediaStore,
    ) -> Result<Newsletter> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            bail!("A title is required before saving");
        }

        let mut resolved = self.blocks.clone();
        if resolve_local_media(&mut resolved, media)? > 0 {
            let uploaded: Vec<(String, String)> = self
                .blocks
                .iter()
                .zip(&resolved)
                .filter_map(|(live, done)| match (live.media_url(), done.media_url()) {
                    (Some(local), Some(url)) if local != url => {
                        Some((local.to_string(), url.to_string()))
                    }
                    _ => None,
                })
                .collect();
            // Stored snapshots must never point back at a local file.
            self.history.rewrite(|block| relink(block, &uploaded));
            self.blocks.iter_mut().for_each(|block| relink(block, &uploaded));
        }

        regenerate_ids(&mut resolved);
        let summary = derive_summary(&resolved, &title);
        let thumbnail_url = derive_thumbnail(&resolved);
        let content = NewsletterContent { blocks: resolved };

        let saved = match &self.newsletter_id {
            Some(id) => {
                store
                    .update(
                        id,
                        NewsletterPatch {
                            title: Some(title),
                            summary: Some(summary),
                            thumbnail_url: Some(thumbnail_url),
                            content: Some(content),
                        },
                    )
                    .with_context(|| format!("Failed to update newsletter {id}"))?;
                store
                    .get(id)?
                    .with_context(|| format!("Newsletter {id} vanished after update"))?
            }
            None => store
                .create(NewNewsletter {
                    title,
                    summary,
                    thumbnail_url,
                    content,
                })
                .context("Failed to create newsletter")?,
        };

        tracing::info!("Saved newsletter {} ({} blocks)", saved.id, self.blocks.len());
        self.newsletter_id = Some(saved.id.clone());
        self.dirty = false;
        Ok(saved)
    }

    fn commit(&mut self) {
        self.history.push(&self.blocks);
        self.dirty = true;
    }
}

/// Points a media block at its uploaded URL if its reference was uploaded.
fn relink(block: &mut Block, uploaded: &[(String, String)]) {
    let url = block
        .media_url()
        .and_then(|current| uploaded.iter().find(|(local, _)| local == current))
        .map(|(_, url)| url.clone());
    if let Some(url) = url {
        block.set_media_url(url);
    }
}

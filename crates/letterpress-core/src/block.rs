/// Newsletter content blocks: the typed unit the editor arranges.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Closed set of block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Image,
    Button,
    Audio,
}

impl BlockType {
    pub const ALL: [BlockType; 4] = [
        BlockType::Text,
        BlockType::Image,
        BlockType::Button,
        BlockType::Audio,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Button => "button",
            BlockType::Audio => "audio",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(BlockType::Text),
            "image" => Ok(BlockType::Image),
            "button" => Ok(BlockType::Button),
            "audio" => Ok(BlockType::Audio),
            other => bail!("Unknown block type '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
}

impl From<&str> for TextContent {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl From<String> for TextContent {
    fn from(text: String) -> Self {
        Self { text }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageContent {
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonContent {
    pub button_text: String,
    pub button_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioContent {
    pub audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Type-specific payload of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    Text(TextContent),
    Image(ImageContent),
    Button(ButtonContent),
    Audio(AudioContent),
}

impl BlockContent {
    /// Empty payload for a block type.
    pub fn empty(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text => BlockContent::Text(TextContent::default()),
            BlockType::Image => BlockContent::Image(ImageContent::default()),
            BlockType::Button => BlockContent::Button(ButtonContent::default()),
            BlockType::Audio => BlockContent::Audio(AudioContent::default()),
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockContent::Text(_) => BlockType::Text,
            BlockContent::Image(_) => BlockType::Image,
            BlockContent::Button(_) => BlockType::Button,
            BlockContent::Audio(_) => BlockType::Audio,
        }
    }
}

/// Presentation metadata. Opaque to history.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
}

impl BlockSettings {
    /// Builds settings from `(property, value)` style pairs.
    pub fn with_style(pairs: &[(&str, &str)]) -> Self {
        Self {
            layout: None,
            style: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Renders the style map as an inline CSS declaration list.
    pub fn inline_css(&self) -> String {
        self.style
            .iter()
            .map(|(k, v)| format!("{}: {v};", css_property(k)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Converts a camelCase style key (`fontSize`) into a CSS property (`font-size`).
fn css_property(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// One content unit within a newsletter.
///
/// Serialized in the stored newsletter shape:
/// `{"id": "..", "type": "image", "content": {"imageUrl": ".."}, "settings": {..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BlockRecord", into = "BlockRecord")]
pub struct Block {
    pub id: String,
    pub content: BlockContent,
    pub settings: BlockSettings,
}

impl Block {
    /// Creates an empty block of the given type with a fresh id.
    pub fn new(block_type: BlockType) -> Self {
        Self::with_content(BlockContent::empty(block_type))
    }

    /// Creates a block with the given payload and a fresh id.
    pub fn with_content(content: BlockContent) -> Self {
        Self {
            id: generate_block_id(),
            content,
            settings: BlockSettings::default(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(BlockContent::Text(TextContent { text: text.into() }))
    }

    pub fn image(image_url: impl Into<String>) -> Self {
        Self::with_content(BlockContent::Image(ImageContent {
            image_url: image_url.into(),
            caption: None,
        }))
    }

    pub fn button(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self::with_content(BlockContent::Button(ButtonContent {
            button_text: label.into(),
            button_url: url.into(),
        }))
    }

    pub fn audio(audio_url: impl Into<String>) -> Self {
        Self::with_content(BlockContent::Audio(AudioContent {
            audio_url: audio_url.into(),
            title: None,
        }))
    }

    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    /// The media reference of image and audio blocks.
    pub fn media_url(&self) -> Option<&str> {
        match &self.content {
            BlockContent::Image(c) => Some(&c.image_url),
            BlockContent::Audio(c) => Some(&c.audio_url),
            _ => None,
        }
    }

    /// Replaces the media reference. Returns `false` for blocks without media.
    pub fn set_media_url(&mut self, url: impl Into<String>) -> bool {
        match &mut self.content {
            BlockContent::Image(c) => c.image_url = url.into(),
            BlockContent::Audio(c) => c.audio_url = url.into(),
            _ => return false,
        }
        true
    }

    /// One-line human readable description, used by listings.
    pub fn describe(&self) -> String {
        match &self.content {
            BlockContent::Text(c) => {
                let first = c.text.lines().next().unwrap_or_default();
                format!("text: {first}")
            }
            BlockContent::Image(c) => format!("image: {}", c.image_url),
            BlockContent::Button(c) => format!("button: {} -> {}", c.button_text, c.button_url),
            BlockContent::Audio(c) => format!("audio: {}", c.audio_url),
        }
    }
}

/// Generates an opaque, session-unique block id.
pub fn generate_block_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Assigns fresh ids to every block.
pub fn regenerate_ids(blocks: &mut [Block]) {
    for block in blocks {
        block.id = generate_block_id();
    }
}

/// Storage shape of a block. The payload is parsed according to `type`.
#[derive(Serialize, Deserialize)]
struct BlockRecord {
    #[serde(default)]
    id: String,
    #[serde(rename = "type")]
    block_type: BlockType,
    #[serde(default)]
    content: serde_json::Value,
    #[serde(default)]
    settings: BlockSettings,
}

impl TryFrom<BlockRecord> for Block {
    type Error = anyhow::Error;

    fn try_from(record: BlockRecord) -> Result<Self> {
        let payload = if record.content.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            record.content
        };
        let content = match record.block_type {
            BlockType::Text => BlockContent::Text(
                serde_json::from_value(payload).context("Invalid text block content")?,
            ),
            BlockType::Image => BlockContent::Image(
                serde_json::from_value(payload).context("Invalid image block content")?,
            ),
            BlockType::Button => BlockContent::Button(
                serde_json::from_value(payload).context("Invalid button block content")?,
            ),
            BlockType::Audio => BlockContent::Audio(
                serde_json::from_value(payload).context("Invalid audio block content")?,
            ),
        };
        let id = if record.id.is_empty() {
            generate_block_id()
        } else {
            record.id
        };
        Ok(Block {
            id,
            content,
            settings: record.settings,
        })
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        let block_type = block.block_type();
        let content = match block.content {
            BlockContent::Text(c) => serde_json::to_value(c),
            BlockContent::Image(c) => serde_json::to_value(c),
            BlockContent::Button(c) => serde_json::to_value(c),
            BlockContent::Audio(c) => serde_json::to_value(c),
        }
        .unwrap_or(serde_json::Value::Null);
        BlockRecord {
            id: block.id,
            block_type,
            content,
            settings: block.settings,
        }
    }
}

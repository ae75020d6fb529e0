/// Preparing an edited block sequence for persistence.
use std::path::Path;

use anyhow::{Context, Result};

use crate::block::{Block, BlockContent};
use crate::gateway::MediaStore;
use crate::newsletter::DEFAULT_THUMBNAIL;

/// Maximum length of a derived summary, in characters.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Whether a media reference points at a local file rather than a hosted URL.
pub fn is_local_reference(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://")
}

/// Uploads every local image/audio file referenced by `blocks` and rewrites
/// the references to the returned public URLs.
///
/// Returns the number of uploads performed.
///
/// # Errors
///
/// Returns an error if a referenced file cannot be read or the upload fails.
/// Blocks processed before the failure keep their new URLs.
pub fn resolve_local_media(blocks: &mut [Block], media: &dyn MediaStore) -> Result<usize> {
    let mut uploads = 0;
    for block in blocks.iter_mut() {
        let folder = match &block.content {
            BlockContent::Image(_) => "images",
            BlockContent::Audio(_) => "audios",
            _ => continue,
        };
        let Some(reference) = block.media_url().filter(|u| is_local_reference(u)) else {
            continue;
        };

        let path = Path::new(reference.trim().trim_start_matches("file://")).to_path_buf();
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read media file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let url = media
            .upload(&bytes, &format!("{folder}/{file_name}"))
            .with_context(|| format!("Failed to upload {}", path.display()))?;
        tracing::debug!("Uploaded {} -> {url}", path.display());
        block.set_media_url(url);
        uploads += 1;
    }
    Ok(uploads)
}

/// Summary shown in listings: the first text block, shortened.
///
/// Falls back to the title when there is no text.
pub fn derive_summary(blocks: &[Block], title: &str) -> String {
    blocks
        .iter()
        .find_map(|b| match &b.content {
            BlockContent::Text(c) if !c.text.trim().is_empty() => Some(c.text.trim()),
            _ => None,
        })
        .map(|text| text.chars().take(SUMMARY_MAX_CHARS).collect())
        .unwrap_or_else(|| title.to_string())
}

/// Thumbnail shown in listings: the first image with a URL.
pub fn derive_thumbnail(blocks: &[Block]) -> String {
    blocks
        .iter()
        .find_map(|b| match &b.content {
            BlockContent::Image(c) if !c.image_url.is_empty() => Some(c.image_url.clone()),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string())
}

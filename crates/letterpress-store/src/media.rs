/// Media hosting on the local filesystem.
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

use letterpress_core::gateway::MediaStore;

/// Writes uploads under `root` and serves them from `public_base_url`.
///
/// A hint of `images/cover.png` lands at `root/images/<uuid>-cover.png`
/// and is published as `{public_base_url}/images/<uuid>-cover.png`.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url: String = public_base_url.into();
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Splits a hint into its directory parts and a file name, rejecting
/// anything that would escape the media root.
fn split_hint(path_hint: &str) -> Result<(Vec<String>, String)> {
    let mut parts = Vec::new();
    for component in Path::new(path_hint.trim()).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => bail!("Invalid media path: {path_hint}"),
        }
    }
    let Some(file_name) = parts.pop() else {
        bail!("Media path has no file name: {path_hint:?}");
    };
    Ok((parts, file_name))
}

impl MediaStore for LocalMediaStore {
    fn upload(&self, bytes: &[u8], path_hint: &str) -> Result<String> {
        let (dirs, file_name) = split_hint(path_hint)?;
        let stored_name = format!("{}-{file_name}", uuid::Uuid::new_v4().simple());

        let mut target = self.root.clone();
        target.extend(&dirs);
        std::fs::create_dir_all(&target)
            .with_context(|| format!("Failed to create media directory: {}", target.display()))?;
        target.push(&stored_name);
        std::fs::write(&target, bytes)
            .with_context(|| format!("Failed to write media file: {}", target.display()))?;

        let mut relative = dirs;
        relative.push(stored_name);
        let url = format!("{}/{}", self.public_base_url, relative.join("/"));
        tracing::debug!("Stored {} bytes at {} ({url})", bytes.len(), target.display());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_upload_writes_file_and_returns_url() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path(), "https://cdn.example.com/media/");

        let url = store.upload(b"png-bytes", "images/cover.png").unwrap();
        let prefix = "https://cdn.example.com/media/images/";
        assert!(url.starts_with(prefix), "{url}");
        assert!(url.ends_with("-cover.png"));

        let stored = dir.path().join("images").join(&url[prefix.len()..]);
        assert_eq!(std::fs::read(stored).unwrap(), b"png-bytes");
    }

    #[test]
    fn test_same_name_does_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path(), "https://cdn");
        let a = store.upload(b"a", "audios/track.mp3").unwrap();
        let b = store.upload(b"b", "audios/track.mp3").unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read_dir(dir.path().join("audios")).unwrap().count(), 2);
    }

    #[test]
    fn test_rejects_escaping_hints() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path(), "https://cdn");
        assert!(store.upload(b"x", "../outside.png").is_err());
        assert!(store.upload(b"x", "/etc/passwd").is_err());
        assert!(store.upload(b"x", "").is_err());
    }

    #[test]
    fn test_bare_file_name_goes_to_root() {
        let dir = TempDir::new().unwrap();
        let store = LocalMediaStore::new(dir.path(), "https://cdn");
        let url = store.upload(b"x", "logo.svg").unwrap();
        assert!(url.starts_with("https://cdn/"));
        assert_eq!(url.matches('/').count(), 3);
    }
}

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use object_store::{ObjectStore, PutPayload, local::LocalFileSystem, path::Path};
use uuid::Uuid;

/// Files written under a local directory and served from `{public_url}/storage`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    store: Arc<LocalFileSystem>,
    root: PathBuf,
    public_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the storage root, always with `/` separators.
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }

    /// Detects JPEG/PNG from the content, ignoring the claimed name.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match infer::get(bytes)?.mime_type() {
            "image/jpeg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = FsPath::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            _ => None,
        }
    }
}

impl LocalStorage {
    /// Opens `root` as the storage prefix, creating it when missing.
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating {}", root.display()))?;
        let store = LocalFileSystem::new_with_prefix(&root)
            .with_context(|| format!("opening storage at {}", root.display()))?
            .with_automatic_cleanup(true);

        Ok(Self {
            store: Arc::new(store),
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &FsPath {
        &self.root
    }

    pub fn public_url(&self, path: &str) -> String {
        format!("{}/storage/{}", self.public_url, path.trim_start_matches('/'))
    }

    pub async fn store(&self, dir: &str, ext: &str, bytes: &[u8]) -> anyhow::Result<StoredFile> {
        let file_name = format!("{}.{ext}", Uuid::new_v4().simple());
        let path = format!("{}/{file_name}", dir.trim_matches('/'));

        self.store
            .put(&Path::from(path.as_str()), PutPayload::from(bytes.to_vec()))
            .await
            .with_context(|| format!("writing {path}"))?;

        Ok(StoredFile {
            url: self.public_url(&path),
            path,
        })
    }

    /// Removes a stored file; a file that is already gone is not an error.
    pub async fn delete(&self, path: &str) -> anyhow::Result<()> {
        match self.store.delete(&Path::from(path)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(err) => Err(err).with_context(|| format!("deleting {path}")),
        }
    }
}

/// Rebases stored media references onto `public_url`.
///
/// Empty values become `None`, localhost URLs and `/storage/...` paths are
/// rewritten, bare relative paths are treated as storage paths and any other
/// absolute URL is returned untouched.
pub fn normalize_media_url(url: Option<&str>, public_url: &str) -> Option<String> {
    let trimmed = url?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let base = public_url.trim_end_matches('/');
    let rebase = |path: &str| format!("{base}/storage/{}", path.trim_start_matches('/'));

    let lower = trimmed.to_ascii_lowercase();
    let local_prefixes = [
        "http://localhost",
        "https://localhost",
        "http://127.0.0.1",
        "http://0.0.0.0",
    ];
    if local_prefixes.iter().any(|prefix| lower.starts_with(prefix)) {
        let after_scheme = &trimmed[trimmed.find("://").map_or(0, |i| i + 3)..];
        let path = after_scheme.find('/').map_or("", |i| &after_scheme[i..]);
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.find("/storage/") {
            Some(i) => &path[i + "/storage/".len()..],
            None => path,
        };
        return Some(rebase(path));
    }

    if let Some(path) = trimmed.strip_prefix("/storage/") {
        return Some(rebase(path));
    }

    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Some(rebase(trimmed));
    }

    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://shop.example.com";

    #[test]
    fn media_urls_are_rebased_on_public_url() {
        assert_eq!(normalize_media_url(None, BASE), None);
        assert_eq!(normalize_media_url(Some("  "), BASE), None);
        assert_eq!(
            normalize_media_url(Some("http://localhost:8000/storage/settings/qris.png"), BASE),
            Some("https://shop.example.com/storage/settings/qris.png".into())
        );
        assert_eq!(
            normalize_media_url(Some("/storage/product-images/a.jpg"), BASE),
            Some("https://shop.example.com/storage/product-images/a.jpg".into())
        );
        assert_eq!(
            normalize_media_url(Some("product-images/a.jpg"), BASE),
            Some("https://shop.example.com/storage/product-images/a.jpg".into())
        );
        assert_eq!(
            normalize_media_url(Some("https://cdn.example.com/a.jpg"), BASE),
            Some("https://cdn.example.com/a.jpg".into())
        );
    }

    #[test]
    fn sniffing_accepts_jpeg_and_png_only() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(
            ImageKind::sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            Some(ImageKind::Png)
        );
        assert_eq!(ImageKind::sniff(b"GIF89a"), None);
        assert_eq!(ImageKind::sniff(b"%PDF-1.7 not an image"), None);
        assert_eq!(ImageKind::from_file_name("Bukti.JPEG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_file_name("proof.pdf"), None);
    }

    #[tokio::test]
    async fn store_then_delete_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://127.0.0.1:3000/").unwrap();

        let stored = storage.store("payment-proofs", "png", b"data").await.unwrap();
        assert!(stored.path.starts_with("payment-proofs/"));
        assert!(stored.url.starts_with("http://127.0.0.1:3000/storage/payment-proofs/"));
        assert!(dir.path().join(&stored.path).exists());

        storage.delete(&stored.path).await.unwrap();
        assert!(!dir.path().join(&stored.path).exists());
        storage.delete(&stored.path).await.unwrap();
    }
}

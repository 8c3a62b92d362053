use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::fs;

pub const TMP_PREFIX: &str = ".tmp-";

#[derive(Debug)]
pub struct StoredFile {
    pub file: fs::File,
    pub len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub name: String,
    pub modified: SystemTime,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes `bytes` under a fresh `<uuid>.pdf` name and returns that name.
    async fn save_pdf(&self, bytes: &[u8]) -> anyhow::Result<String>;
    async fn open(&self, name: &str) -> anyhow::Result<Option<StoredFile>>;
    async fn remove(&self, name: &str) -> anyhow::Result<()>;
    /// Every regular file in the store, including unfinished temporary writes,
    /// sorted by name.
    async fn list(&self) -> anyhow::Result<Vec<ListedFile>>;
}

#[derive(Debug, Clone)]
pub struct LocalFsFileStore {
    dir: PathBuf,
}

impl LocalFsFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create upload dir: {}", self.dir.display()))
    }

    /// Maps a URL-supplied name to a path inside the store. Anything other
    /// than a single plain file name is treated as absent.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        is_plain_file_name(name).then(|| self.dir.join(name))
    }
}

pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\', '\0'])
}

#[async_trait]
impl FileStore for LocalFsFileStore {
    async fn save_pdf(&self, bytes: &[u8]) -> anyhow::Result<String> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create upload dir: {}", self.dir.display()))?;

        let name = format!("{}.pdf", uuid::Uuid::new_v4());
        let path = self.dir.join(&name);
        let tmp_path = self
            .dir
            .join(format!("{TMP_PREFIX}{}", uuid::Uuid::new_v4().simple()));

        if let Err(err) = fs::write(&tmp_path, bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err).with_context(|| format!("write tmp: {}", tmp_path.display()));
        }
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("rename tmp to final: {}", path.display()))?;

        Ok(name)
    }

    async fn open(&self, name: &str) -> anyhow::Result<Option<StoredFile>> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("open: {}", path.display())),
        };
        let metadata = file
            .metadata()
            .await
            .with_context(|| format!("stat: {}", path.display()))?;
        if !metadata.is_file() {
            return Ok(None);
        }
        Ok(Some(StoredFile {
            file,
            len: metadata.len(),
        }))
    }

    async fn remove(&self, name: &str) -> anyhow::Result<()> {
        // Temporary files are removable even though they are never served.
        if name.is_empty() || name.contains(['/', '\\', '\0']) || name == "." || name == ".." {
            anyhow::bail!("refusing to remove {name:?}");
        }
        let path = self.dir.join(name);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove: {}", path.display())),
        }
    }

    async fn list(&self) -> anyhow::Result<Vec<ListedFile>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            files.push(ListedFile {
                name,
                modified: metadata.modified()?,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt as _;

    use super::*;

    async fn names(store: &LocalFsFileStore) -> anyhow::Result<Vec<String>> {
        Ok(store.list().await?.into_iter().map(|f| f.name).collect())
    }

    #[tokio::test]
    async fn save_then_open_returns_same_bytes() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let store = LocalFsFileStore::new(temp.path().join("uploads"));
        let bytes = b"%PDF-1.4 hello".to_vec();

        let name = store.save_pdf(&bytes).await?;
        assert!(name.ends_with(".pdf"));
        assert_eq!(names(&store).await?, [name.clone()]);

        let mut stored = store.open(&name).await?.expect("file exists");
        assert_eq!(stored.len, bytes.len() as u64);
        let mut read = Vec::new();
        stored.file.read_to_end(&mut read).await?;
        assert_eq!(read, bytes);
        Ok(())
    }

    #[tokio::test]
    async fn names_outside_the_store_are_not_found() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        std::fs::write(temp.path().join("secret.txt"), b"secret")?;
        let store = LocalFsFileStore::new(temp.path().join("uploads"));
        store.ensure_dir()?;

        for name in ["../secret.txt", "..", ".", "", "a/b.pdf", "..\\secret.txt"] {
            assert!(store.open(name).await?.is_none(), "{name:?}");
        }
        assert!(store.open("missing.pdf").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn temporary_files_are_listed_but_not_served() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let store = LocalFsFileStore::new(temp.path());
        let tmp_name = format!("{TMP_PREFIX}leftover");
        std::fs::write(temp.path().join(&tmp_name), b"partial")?;

        assert_eq!(names(&store).await?, [tmp_name.clone()]);
        assert!(store.open(&tmp_name).await?.is_none());

        store.remove(&tmp_name).await?;
        assert!(names(&store).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn remove_rejects_traversal() {
        let store = LocalFsFileStore::new("uploads");
        assert!(store.remove("../venbaah.db").await.is_err());
        assert!(store.remove("..").await.is_err());
    }
}

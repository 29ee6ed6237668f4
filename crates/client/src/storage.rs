use std::io;
use std::path::PathBuf;

/// Durable key/value slots on the local filesystem, one file per slot.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slot))
    }

    /// Contents of `slot`, or `None` if it was never written.
    pub async fn read(&self, slot: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.slot_path(slot)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrite `slot` with `contents`.
    pub async fn write(&self, slot: &str, contents: &str) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.slot_path(slot);
        let tmp_path = self.dir.join(format!(".{}.json.tmp", slot));
        tokio::fs::write(&tmp_path, contents).await?;
        tokio::fs::rename(&tmp_path, &path).await
    }

    /// Delete `slot`; removing a missing slot is not an error.
    pub async fn remove(&self, slot: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.slot_path(slot)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

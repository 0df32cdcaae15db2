use std::path::PathBuf;

use anyhow::Result;

/// A key-value store of raw JSON payloads, one file per key. This is how
/// layer geometry and the route list survive restarts; there's no TTL and no
/// invalidation, just `clear`.
#[derive(Clone)]
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new<I: Into<PathBuf>>(dir: I) -> Cache {
        Cache { dir: dir.into() }
    }

    /// Returns the cached payload, or None if the key was never written. An
    /// unreadable entry is logged and treated as missing.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.path(key);
        if !path.exists() {
            return None;
        }
        match fs_err::read(&path) {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!("Ignoring unreadable cache entry for {}: {}", key, err);
                None
            }
        }
    }

    pub fn put(&self, key: &str, raw: &[u8]) -> Result<()> {
        fs_err::create_dir_all(&self.dir)?;
        fs_err::write(self.path(key), raw)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs_err::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use fs4::fs_std::FileExt;
use tracing::{debug, trace};

use super::KeyValueStore;

/// The main realization of [KeyValueStore]. Every key maps to a file inside `store_dir`, so the
/// CLI and the daemon can share the same directory. Files are locked while being read or
/// written.
#[derive(Debug, Clone)]
pub struct FileStore {
    store_dir: PathBuf,
}

impl FileStore {
    pub fn new(store_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&store_dir)?;

        Ok(Self { store_dir })
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\']);
        if !valid {
            bail!("Illegal store key {key:?}");
        }
        Ok(self.store_dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        fn extract(path: &Path) -> std::result::Result<String, std::io::Error> {
            let mut file = File::open(path)?;
            FileExt::lock_shared(&file)?;
            let mut value = String::new();
            let result = file.read_to_string(&mut value);
            FileExt::unlock(&file)?;
            result.map(|_| value)
        }

        let path = self.slot_path(key)?;
        trace!("Reading slot {path:?}");
        match extract(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Slot {key} is not present yet");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read slot {key} at {path:?}")),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fn write(path: &Path, value: &str) -> std::result::Result<(), std::io::Error> {
            let mut file = File::options()
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)?;
            // Truncate only after the lock is held, readers must never see a half written slot.
            FileExt::lock_exclusive(&file)?;
            let result = (|| {
                file.set_len(0)?;
                file.seek(SeekFrom::Start(0))?;
                file.write_all(value.as_bytes())?;
                file.sync_data()
            })();
            FileExt::unlock(&file)?;
            result
        }

        let path = self.slot_path(key)?;
        trace!("Writing slot {path:?}");
        write(&path, value).with_context(|| format!("Failed to write slot {key} at {path:?}"))
    }
}

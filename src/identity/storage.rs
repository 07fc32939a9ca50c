//! Durable key-value slots backing the session store.
//! Keep this module focused and small; the pairing of slots is the session store's concern.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Slot holding the opaque bearer token as a raw string.
pub const TOKEN_SLOT: &str = "ghcs-token";
/// Slot holding the serialized `User` record as JSON.
pub const USER_SLOT: &str = "ghcs-user";

pub trait SlotStorage: Send + Sync {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    /// Removing a slot that does not exist is not an error.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// One file per slot under a state directory.
pub struct FileSlotStorage {
    dir: PathBuf,
}

impl FileSlotStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn slot_path(&self, key: &str) -> PathBuf { self.dir.join(key) }
}

impl SlotStorage for FileSlotStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        // write-then-rename so a crash never leaves a truncated slot behind
        let tmp = self.dir.join(format!(".{}.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.slot_path(key))
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-process slots. Counts mutating calls that actually changed something.
#[derive(Default)]
pub struct MemorySlotStorage {
    slots: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemorySlotStorage {
    pub fn new() -> Self { Self::default() }

    pub fn writes(&self) -> usize { self.writes.load(Ordering::SeqCst) }

    pub fn contains(&self, key: &str) -> bool { self.slots.lock().contains_key(key) }
}

impl SlotStorage for MemorySlotStorage {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.slots.lock().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        if self.slots.lock().remove(key).is_some() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_slots_set_get_remove() {
        let tmp = tempdir().unwrap();
        let st = FileSlotStorage::new(tmp.path().join("state")).unwrap();
        assert_eq!(st.get(TOKEN_SLOT).unwrap(), None);
        st.set(TOKEN_SLOT, "abc").unwrap();
        assert_eq!(st.get(TOKEN_SLOT).unwrap().as_deref(), Some("abc"));
        st.set(TOKEN_SLOT, "def").unwrap();
        assert_eq!(st.get(TOKEN_SLOT).unwrap().as_deref(), Some("def"));
        st.remove(TOKEN_SLOT).unwrap();
        st.remove(TOKEN_SLOT).unwrap();
        assert_eq!(st.get(TOKEN_SLOT).unwrap(), None);
        // no temp files left behind
        assert_eq!(fs::read_dir(st.dir()).unwrap().count(), 0);
    }

    #[test]
    fn memory_slots_count_only_real_changes() {
        let st = MemorySlotStorage::new();
        st.remove(USER_SLOT).unwrap();
        assert_eq!(st.writes(), 0);
        st.set(USER_SLOT, "{}").unwrap();
        st.remove(USER_SLOT).unwrap();
        assert_eq!(st.writes(), 2);
        assert!(!st.contains(USER_SLOT));
    }
}

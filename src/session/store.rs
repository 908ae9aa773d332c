//! Durable session storage. Tokens live under the `access` and `refresh` keys
//! of a string key-value store and are always written or removed as a pair.

use super::{error::StoreError, types::SessionTokens};
use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, instrument, warn};

pub const ACCESS_KEY: &str = "access";
pub const REFRESH_KEY: &str = "refresh";

/// Keyed string storage. Implementations serialize their own operations but
/// give no guarantee across several calls.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Writes several keys. Backends that can apply them in one step should
    /// override this; the default writes them one by one and stops at the
    /// first failure.
    ///
    /// # Errors
    /// Returns the first backend error.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Removes several keys. The default attempts every key.
    ///
    /// # Errors
    /// Returns the first backend error.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        keys.iter()
            .map(|key| self.remove(key))
            .fold(Ok(()), Result::and)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Poisoned)
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }
}

/// JSON object file. Every write replaces the file through a rename so a crash
/// never leaves a half-written document; on Unix the file is owner-only.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// `<data_local_dir>/ziply/session.json`, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("ziply").join("session.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                StoreError::Corrupt(format!("{}: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_vec_pretty(entries)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = create_private(&tmp_path)?;
        file.write_all(&data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        debug!("session file written: {}", self.path.display());

        Ok(())
    }

    /// Read-modify-write under the file lock. A corrupt document is replaced.
    fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = lock(&self.guard)?;
        let mut entries = match self.load() {
            Err(StoreError::Corrupt(reason)) => {
                warn!("overwriting unreadable session file: {reason}");
                HashMap::new()
            }
            other => other?,
        };
        f(&mut entries);
        self.save(&entries)
    }
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = lock(&self.guard)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

/// Owner of the persisted token pair. Callers only get copies through `read`.
#[derive(Debug)]
pub struct SessionStore<S> {
    backend: S,
    pair_lock: Mutex<()>,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            pair_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Writes both tokens. If the write fails part way the previous access
    /// token is put back; if that fails too both keys are removed, so a mixed
    /// pair is never left behind.
    ///
    /// # Errors
    /// Returns [`StoreError::IncompleteTokens`] for empty tokens, or the backend
    /// error that aborted the write.
    #[instrument(skip_all)]
    pub fn persist(&self, tokens: &SessionTokens) -> Result<(), StoreError> {
        if !tokens.is_complete() {
            return Err(StoreError::IncompleteTokens);
        }

        let _guard = lock(&self.pair_lock)?;
        let previous_access = match self.backend.get(ACCESS_KEY) {
            Err(StoreError::Corrupt(reason)) => {
                warn!("replacing unreadable session: {reason}");
                None
            }
            other => other?,
        };

        let written = self.backend.set_many(&[
            (ACCESS_KEY, tokens.access()),
            (REFRESH_KEY, tokens.refresh()),
        ]);
        if let Err(err) = written {
            self.roll_back(previous_access.as_deref());
            return Err(err);
        }

        debug!("session persisted");
        Ok(())
    }

    fn roll_back(&self, previous_access: Option<&str>) {
        let restored = match previous_access {
            Some(value) => self.backend.set(ACCESS_KEY, value),
            None => self.backend.remove(ACCESS_KEY),
        };
        let Err(err) = restored else {
            return;
        };

        warn!("failed to restore the previous session, discarding it: {err}");
        if let Err(err) = self.backend.remove_many(&[ACCESS_KEY, REFRESH_KEY]) {
            warn!("failed to discard the session: {err}");
        }
    }

    /// Returns the stored pair; a missing or empty half means no session. An
    /// unreadable document also reads as no session.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    pub fn read(&self) -> Result<Option<SessionTokens>, StoreError> {
        let _guard = lock(&self.pair_lock)?;
        match self.read_pair() {
            Err(StoreError::Corrupt(reason)) => {
                warn!("ignoring unreadable session: {reason}");
                Ok(None)
            }
            other => other,
        }
    }

    fn read_pair(&self) -> Result<Option<SessionTokens>, StoreError> {
        let access = self.backend.get(ACCESS_KEY)?;
        let refresh = self.backend.get(REFRESH_KEY)?;

        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => {
                Some(SessionTokens::new(access, refresh)).filter(SessionTokens::is_complete)
            }
            _ => None,
        })
    }

    /// Removes both tokens.
    ///
    /// # Errors
    /// Returns the backend error.
    #[instrument(skip_all)]
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = lock(&self.pair_lock)?;
        self.backend.remove_many(&[ACCESS_KEY, REFRESH_KEY])?;

        debug!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Fails every write of a rejected value.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        rejected: Mutex<Vec<String>>,
    }

    impl FlakyStore {
        fn reject(&self, value: &str) {
            self.rejected.lock().unwrap().push(value.to_string());
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.rejected.lock().unwrap().iter().any(|v| v == value) {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn persist_then_read_returns_same_pair() {
        let store = SessionStore::new(MemoryStore::new());
        let tokens = SessionTokens::new("AAA", "BBB");

        store.persist(&tokens).unwrap();

        assert_eq!(store.read().unwrap(), Some(tokens));
    }

    #[test]
    fn persist_overwrites_previous_pair() {
        let store = SessionStore::new(MemoryStore::new());
        store.persist(&SessionTokens::new("old-a", "old-r")).unwrap();
        store.persist(&SessionTokens::new("new-a", "new-r")).unwrap();

        assert_eq!(store.read().unwrap(), Some(SessionTokens::new("new-a", "new-r")));
    }

    #[test]
    fn read_after_clear_is_empty() {
        let store = SessionStore::new(MemoryStore::new());
        store.persist(&SessionTokens::new("AAA", "BBB")).unwrap();

        store.clear().unwrap();

        assert_eq!(store.read().unwrap(), None);
        assert_eq!(store.backend().get(ACCESS_KEY).unwrap(), None);
        assert_eq!(store.backend().get(REFRESH_KEY).unwrap(), None);
    }

    #[test]
    fn partial_pair_reads_as_absent() {
        let backend = MemoryStore::new();
        backend.set(ACCESS_KEY, "AAA").unwrap();
        let store = SessionStore::new(backend);
        assert_eq!(store.read().unwrap(), None);

        store.backend().set(REFRESH_KEY, "").unwrap();
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn empty_tokens_are_rejected() {
        let store = SessionStore::new(MemoryStore::new());
        let result = store.persist(&SessionTokens::new("AAA", ""));
        assert!(matches!(result, Err(StoreError::IncompleteTokens)));
        assert_eq!(store.backend().get(ACCESS_KEY).unwrap(), None);
    }

    #[test]
    fn failed_second_write_restores_first_key() {
        let store = SessionStore::new(FlakyStore::default());
        store.persist(&SessionTokens::new("old-a", "old-r")).unwrap();

        store.backend().reject("new-r");
        let result = store.persist(&SessionTokens::new("new-a", "new-r"));

        assert!(result.is_err());
        assert_eq!(store.read().unwrap(), Some(SessionTokens::new("old-a", "old-r")));
    }

    #[test]
    fn failed_restore_discards_the_session() {
        let store = SessionStore::new(FlakyStore::default());
        store.persist(&SessionTokens::new("old-a", "old-r")).unwrap();

        store.backend().reject("new-r");
        store.backend().reject("old-a");
        let result = store.persist(&SessionTokens::new("new-a", "new-r"));

        assert!(result.is_err());
        assert_eq!(store.read().unwrap(), None);
        assert_eq!(store.backend().get(ACCESS_KEY).unwrap(), None);
        assert_eq!(store.backend().get(REFRESH_KEY).unwrap(), None);
    }

    #[test]
    fn failed_first_persist_leaves_nothing_behind() {
        let backend = FlakyStore::default();
        backend.reject("BBB");
        let store = SessionStore::new(backend);

        assert!(store.persist(&SessionTokens::new("AAA", "BBB")).is_err());
        assert_eq!(store.backend().get(ACCESS_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::new(FileStore::new(&path));
        store.persist(&SessionTokens::new("AAA", "BBB")).unwrap();
        drop(store);

        let reopened = SessionStore::new(FileStore::new(&path));
        assert_eq!(reopened.read().unwrap(), Some(SessionTokens::new("AAA", "BBB")));

        reopened.clear().unwrap();
        let again = SessionStore::new(FileStore::new(&path));
        assert_eq!(again.read().unwrap(), None);
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let store = SessionStore::new(FileStore::new(&path));
        store.persist(&SessionTokens::new("AAA", "BBB")).unwrap();
        store.clear().unwrap();

        assert_eq!(store.backend().get("theme").unwrap(), Some("dark".to_string()));
    }

    #[test]
    fn missing_or_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileStore::new(&path);
        assert_eq!(store.get(ACCESS_KEY).unwrap(), None);

        fs::write(&path, "\n").unwrap();
        assert_eq!(store.get(ACCESS_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_file_reads_as_no_session_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"access": "AA"#).unwrap();

        assert!(matches!(
            FileStore::new(&path).get(ACCESS_KEY),
            Err(StoreError::Corrupt(_))
        ));

        let store = SessionStore::new(FileStore::new(&path));
        assert_eq!(store.read().unwrap(), None);

        store.persist(&SessionTokens::new("AAA", "BBB")).unwrap();
        assert_eq!(store.read().unwrap(), Some(SessionTokens::new("AAA", "BBB")));

        fs::write(&path, "garbage").unwrap();
        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
        assert_eq!(store.backend().get(ACCESS_KEY).unwrap(), None);
    }

    #[test]
    fn file_store_writes_pair_in_one_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileStore::new(&path);

        store
            .set_many(&[(ACCESS_KEY, "AAA"), (REFRESH_KEY, "BBB")])
            .unwrap();
        let document: HashMap<String, String> =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(document.get(ACCESS_KEY).map(String::as_str), Some("AAA"));
        assert_eq!(document.get(REFRESH_KEY).map(String::as_str), Some("BBB"));

        store.remove_many(&[ACCESS_KEY, REFRESH_KEY]).unwrap();
        assert_eq!(store.get(REFRESH_KEY).unwrap(), None);
    }

    proptest! {
        #[test]
        fn persisted_pair_reads_back(
            access in "[A-Za-z0-9._-]{1,64}",
            refresh in "[A-Za-z0-9._-]{1,64}",
        ) {
            let store = SessionStore::new(MemoryStore::new());
            let tokens = SessionTokens::new(access, refresh);

            store.persist(&tokens).unwrap();

            prop_assert_eq!(store.read().unwrap(), Some(tokens));
        }
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(FileStore::new(&path));
        store.persist(&SessionTokens::new("AAA", "BBB")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

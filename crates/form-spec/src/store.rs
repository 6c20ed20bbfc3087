use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::answers::{AnswerMap, AnswerValue, DraftRecord};

/// Errors raised while writing the draft record.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode draft record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("draft storage I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opaque persistent key-value storage, the role browser local storage plays for a web client.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Process-local storage; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: BTreeMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "draft".into()
    } else {
        cleaned
    }
}

/// Single source of truth for answers and the current section index.
///
/// Every mutation writes the full [`DraftRecord`] through to the backing store before returning.
#[derive(Debug)]
pub struct AnswerStore<S> {
    backend: S,
    key: String,
    answers: AnswerMap,
    section_index: usize,
}

impl<S: KeyValueStore> AnswerStore<S> {
    /// Empty store that has not read anything from `backend`.
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            answers: AnswerMap::new(),
            section_index: 0,
        }
    }

    /// Loads the persisted record. Never fails: missing or corrupt records yield an empty store.
    pub fn restore(backend: S, key: impl Into<String>) -> Self {
        let mut store = Self::new(backend, key);
        match store.backend.get(&store.key) {
            Ok(Some(raw)) => match DraftRecord::parse(&raw) {
                Ok(record) => {
                    debug!(
                        answers = record.answers.len(),
                        section = record.current_section_index,
                        "restored draft"
                    );
                    store.answers = record.answers;
                    store.section_index = record.current_section_index;
                }
                Err(err) => warn!(key = %store.key, error = %err, "discarding unreadable draft"),
            },
            Ok(None) => {}
            Err(err) => warn!(key = %store.key, error = %err, "draft storage unavailable"),
        }
        store
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, id: &str) -> Option<&AnswerValue> {
        self.answers.get(id)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(AnswerValue::as_text)
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn section_index(&self) -> usize {
        self.section_index
    }

    pub fn set(&mut self, id: &str, value: impl Into<AnswerValue>) -> Result<(), StoreError> {
        let mut record = self.snapshot();
        record.answers.insert(id.to_string(), value.into());
        self.commit(record)
    }

    /// Deletes one answer; persists only when something was removed.
    pub fn remove(&mut self, id: &str) -> Result<Option<AnswerValue>, StoreError> {
        if !self.answers.contains_key(id) {
            return Ok(None);
        }
        let mut record = self.snapshot();
        let removed = record.answers.remove(id);
        self.commit(record)?;
        Ok(removed)
    }

    pub fn set_section_index(&mut self, index: usize) -> Result<(), StoreError> {
        let mut record = self.snapshot();
        record.current_section_index = index;
        self.commit(record)
    }

    pub fn snapshot(&self) -> DraftRecord {
        DraftRecord {
            answers: self.answers.clone(),
            current_section_index: self.section_index,
        }
    }

    /// Writes the whole record, never a delta.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let record = self.snapshot();
        self.write(&record)
    }

    /// Memory only takes `record` once the backend accepted it.
    fn commit(&mut self, record: DraftRecord) -> Result<(), StoreError> {
        self.write(&record)?;
        self.answers = record.answers;
        self.section_index = record.current_section_index;
        Ok(())
    }

    fn write(&mut self, record: &DraftRecord) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(record).map_err(StoreError::Encode)?;
        self.backend.set(&self.key, &encoded)
    }

    /// Removes the persisted record entirely; in-memory answers are kept.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        debug!(key = %self.key, "clearing persisted draft");
        self.backend.remove(&self.key)
    }

    /// Drops in-memory state after [`clear`](Self::clear), matching a fresh restore.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.section_index = 0;
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn into_backend(self) -> S {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "project_requirements_v1";

    /// Reads from a seeded memory store and rejects every write.
    struct ReadOnlyStore(MemoryKeyValueStore);

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from(key),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.set(key, "")
        }
    }

    fn persisted(store: &AnswerStore<ReadOnlyStore>) -> DraftRecord {
        let raw = store.backend().0.raw(KEY).expect("seeded");
        DraftRecord::parse(raw).expect("decode")
    }

    #[test]
    fn failed_writes_leave_memory_matching_the_draft() {
        let mut seed = MemoryKeyValueStore::new();
        seed.set(KEY, r#"{"answers":{"name":"Acme"},"currentSectionIndex":1}"#)
            .expect("seed");
        let mut store = AnswerStore::restore(ReadOnlyStore(seed), KEY);
        assert_eq!(store.key(), KEY);

        assert!(matches!(
            store.set("name", "Changed"),
            Err(StoreError::Io { .. })
        ));
        assert!(store.set_section_index(2).is_err());
        assert!(store.remove("name").is_err());

        assert_eq!(store.text("name"), Some("Acme"));
        assert_eq!(store.section_index(), 1);
        assert_eq!(store.snapshot(), persisted(&store));
    }

    #[test]
    fn restore_keeps_answers_when_index_is_malformed() {
        let mut backend = MemoryKeyValueStore::new();
        backend
            .set(
                KEY,
                r#"{"answers":{"company_name":"Acme"},"currentSectionIndex":null}"#,
            )
            .expect("seed");
        let store = AnswerStore::restore(backend, KEY);
        assert_eq!(store.text("company_name"), Some("Acme"));
        assert_eq!(store.section_index(), 0);
    }

    #[test]
    fn every_set_writes_the_full_record() {
        let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
        store.set("name", "Acme").expect("set");
        store.set("email", "hi@acme.test").expect("set");
        let raw = store.backend().raw(KEY).expect("persisted");
        let record: DraftRecord = serde_json::from_str(raw).expect("decode");
        assert_eq!(record, store.snapshot());
        assert_eq!(record.answers.len(), 2);
    }

    #[test]
    fn restore_defaults_on_corrupt_record() {
        let mut backend = MemoryKeyValueStore::new();
        backend.set(KEY, "{not json").expect("seed");
        let store = AnswerStore::restore(backend, KEY);
        assert!(store.answers().is_empty());
        assert_eq!(store.section_index(), 0);
    }

    #[test]
    fn restore_defaults_when_absent() {
        let store = AnswerStore::restore(MemoryKeyValueStore::new(), KEY);
        assert!(store.answers().is_empty());
        assert_eq!(store.section_index(), 0);
    }

    #[test]
    fn clear_removes_record_but_keeps_memory() {
        let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
        store.set("name", "Acme").expect("set");
        store.clear().expect("clear");
        assert!(!store.backend().contains(KEY));
        assert_eq!(store.text("name"), Some("Acme"));
    }

    #[test]
    fn removing_missing_answer_does_not_write() {
        let mut store = AnswerStore::new(MemoryKeyValueStore::new(), KEY);
        assert!(store.remove("nothing").expect("remove").is_none());
        assert!(!store.backend().contains(KEY));
    }

    #[test]
    fn file_store_round_trips_and_tolerates_missing_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut backend = FileKeyValueStore::new(dir.path().join("drafts"));
        assert_eq!(backend.get(KEY).expect("get"), None);
        backend.set(KEY, "{}").expect("set");
        assert_eq!(backend.get(KEY).expect("get").as_deref(), Some("{}"));
        backend.remove(KEY).expect("remove");
        backend.remove(KEY).expect("second remove is fine");
        assert_eq!(backend.get(KEY).expect("get"), None);
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let backend = FileKeyValueStore::new("/tmp/drafts");
        assert_eq!(
            backend.path_for("a/b c"),
            PathBuf::from("/tmp/drafts/a_b_c.json")
        );
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::record::StoredRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid option name '{0}'")]
    InvalidName(String),
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode option record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("stored option at {} is not an object", .0.display())]
    NotAnObject(PathBuf),
}

/// Key-value storage holding one record per option name.
pub trait OptionStore {
    /// Load the record, or `None` when nothing has been saved yet.
    fn read(&self, option_name: &str) -> Result<Option<StoredRecord>, StoreError>;

    /// Replace the record wholesale.
    fn write(&mut self, option_name: &str, record: &StoredRecord) -> Result<(), StoreError>;
}

impl<T: OptionStore + ?Sized> OptionStore for &mut T {
    fn read(&self, option_name: &str) -> Result<Option<StoredRecord>, StoreError> {
        (**self).read(option_name)
    }

    fn write(&mut self, option_name: &str, record: &StoredRecord) -> Result<(), StoreError> {
        (**self).write(option_name, record)
    }
}

/// In-process store; useful for hosts that persist records themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, StoredRecord>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(option_name: impl Into<String>, record: StoredRecord) -> Self {
        let mut store = Self::default();
        store.records.insert(option_name.into(), record);
        store
    }

    pub fn record(&self, option_name: &str) -> Option<&StoredRecord> {
        self.records.get(option_name)
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl OptionStore for MemoryStore {
    fn read(&self, option_name: &str) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.records.get(option_name).cloned())
    }

    fn write(&mut self, option_name: &str, record: &StoredRecord) -> Result<(), StoreError> {
        self.records.insert(option_name.to_string(), record.clone());
        self.writes += 1;
        Ok(())
    }
}

/// Stores each record as `<root>/<option_name>.json`. Writes go through a
/// temporary file in the same directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, option_name: &str) -> Result<PathBuf, StoreError> {
        let valid = !option_name.is_empty()
            && !option_name.starts_with('.')
            && option_name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
        if !valid {
            return Err(StoreError::InvalidName(option_name.to_string()));
        }
        Ok(self.root.join(format!("{option_name}.json")))
    }
}

impl OptionStore for JsonFileStore {
    fn read(&self, option_name: &str) -> Result<Option<StoredRecord>, StoreError> {
        let path = self.path_for(option_name)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(option = option_name, path = %path.display(), "no stored record");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let value: Value = serde_json::from_str(&contents).map_err(|source| StoreError::Decode {
            path: path.clone(),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(Some(StoredRecord::from_map(map))),
            _ => Err(StoreError::NotAnObject(path)),
        }
    }

    fn write(&mut self, option_name: &str, record: &StoredRecord) -> Result<(), StoreError> {
        let path = self.path_for(option_name)?;
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let encoded = serde_json::to_vec_pretty(record).map_err(StoreError::Encode)?;
        let mut staged = tempfile::NamedTempFile::new_in(&self.root).map_err(|source| {
            StoreError::Io {
                path: self.root.clone(),
                source,
            }
        })?;
        let staged_path = staged.path().to_path_buf();
        staged
            .write_all(&encoded)
            .and_then(|_| staged.flush())
            .map_err(|source| StoreError::Io {
                path: staged_path,
                source,
            })?;
        staged.persist(&path).map_err(|err| StoreError::Io {
            path: path.clone(),
            source: err.error,
        })?;

        debug!(option = option_name, path = %path.display(), "stored record");
        Ok(())
    }
}

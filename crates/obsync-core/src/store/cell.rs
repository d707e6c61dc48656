// ── State cell ──
//
// A named, schema-validated value with subscribe-on-change semantics,
// optionally mirrored to a JSON file on every change.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::schema::Schema;
use crate::error::CoreError;
use crate::stream::CellStream;

/// Bound shared by every cell value type.
pub trait CellValue: Clone + PartialEq + Send + Sync + Schema + 'static {}

impl<T: Clone + PartialEq + Send + Sync + Schema + 'static> CellValue for T {}

/// A single named state cell.
///
/// Writes are validated against the value's [`Schema`]; rejected writes
/// log a warning and leave the cell untouched. Subscribers are only woken
/// when the value actually changes.
pub struct StateCell<T: CellValue> {
    name: String,
    tx: watch::Sender<T>,
    persister: Option<Persister<T>>,
}

struct Persister<T> {
    path: PathBuf,
    encode: fn(&T) -> serde_json::Result<String>,
}

impl<T: CellValue> StateCell<T> {
    /// An in-memory cell.
    pub fn new(name: impl Into<String>, initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            name: name.into(),
            tx,
            persister: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Replace the value.
    pub fn set(&self, value: T) -> Result<(), CoreError> {
        self.update(|current| *current = value)
    }

    /// Edit the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<(), CoreError> {
        self.try_update(|current| {
            f(current);
            Ok(())
        })
    }

    /// Edit the value in place, unless `f` refuses.
    ///
    /// Check and write happen under the cell's lock, so no other writer
    /// can interleave between them. `f`'s error is returned untouched and
    /// nothing is written.
    pub fn try_update(
        &self,
        f: impl FnOnce(&mut T) -> Result<(), CoreError>,
    ) -> Result<(), CoreError> {
        let mut outcome = Ok(());
        let mut persisted = None;

        self.tx.send_if_modified(|current| {
            let mut next = current.clone();
            if let Err(e) = f(&mut next) {
                outcome = Err(e);
                return false;
            }
            if let Err(reason) = next.validate() {
                warn!(cell = %self.name, %reason, "rejected invalid write");
                outcome = Err(CoreError::Validation {
                    cell: self.name.clone(),
                    reason,
                });
                return false;
            }
            if next == *current {
                return false;
            }
            if self.persister.is_some() {
                persisted = Some(next.clone());
            }
            *current = next;
            debug!(cell = %self.name, "cell updated");
            true
        });

        if let Some(value) = persisted {
            if let Err(e) = self.persist(&value) {
                warn!(error = %e, "cell change kept in memory only");
            }
        }
        outcome
    }

    /// Subscribe to changes.
    pub fn subscribe(&self) -> CellStream<T> {
        CellStream::new(self.tx.subscribe())
    }

    fn persist(&self, value: &T) -> Result<(), CoreError> {
        let Some(persister) = &self.persister else {
            return Ok(());
        };
        let failed = |reason: String| CoreError::Persistence {
            cell: self.name.clone(),
            reason,
        };
        let body = (persister.encode)(value).map_err(|e| failed(e.to_string()))?;
        if let Some(parent) = persister.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }
        std::fs::write(&persister.path, body).map_err(|e| failed(e.to_string()))
    }
}

impl<T: CellValue + Serialize + DeserializeOwned> StateCell<T> {
    /// A cell mirrored to `path` as pretty JSON.
    ///
    /// The stored value is loaded if it exists and passes validation;
    /// otherwise the cell starts from `default`.
    pub fn persistent(name: impl Into<String>, path: impl Into<PathBuf>, default: T) -> Self {
        let name = name.into();
        let path = path.into();
        let initial = load(&name, &path).unwrap_or(default);
        let (tx, _) = watch::channel(initial);
        Self {
            name,
            tx,
            persister: Some(Persister {
                path,
                encode: serde_json::to_string_pretty::<T>,
            }),
        }
    }

    /// Location of the backing file, for persistent cells.
    pub fn path(&self) -> Option<&Path> {
        self.persister.as_ref().map(|p| p.path.as_path())
    }
}

fn load<T: DeserializeOwned + Schema>(name: &str, path: &Path) -> Option<T> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(cell = name, path = %path.display(), error = %e, "cannot read stored value");
            return None;
        }
    };
    let value: T = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(cell = name, path = %path.display(), error = %e, "stored value is not valid JSON");
            return None;
        }
    };
    if let Err(reason) = value.validate() {
        warn!(cell = name, %reason, "stored value fails validation");
        return None;
    }
    debug!(cell = name, path = %path.display(), "loaded stored value");
    Some(value)
}

impl<T: CellValue + fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("name", &self.name)
            .field("value", &*self.tx.borrow())
            .field("persistent", &self.persister.is_some())
            .finish()
    }
}

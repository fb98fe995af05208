use crate::model::DataSet;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("data file {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Durable home of the notebooks and notes. `save` only returns once the
/// document has been written.
pub trait Storage {
    fn load(&mut self) -> Result<DataSet, StorageError>;
    fn save(&mut self, data: &DataSet) -> Result<(), StorageError>;
    fn describe(&self) -> String;
}

pub struct JsonStorage {
    path: PathBuf,
    preserve_corrupt: bool,
}

impl JsonStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStorage {
            path: path.into(),
            preserve_corrupt: false,
        }
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn corrupt_copy_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "notes.json".into());
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "notes.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonStorage {
    fn load(&mut self) -> Result<DataSet, StorageError> {
        if !self.path.exists() {
            info!("no data file at {}, starting empty", self.path.display());
            return Ok(DataSet::default());
        }
        // Any failure past this point leaves a file we could not read. It is
        // copied aside before the first save replaces it.
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                self.preserve_corrupt = true;
                return Err(self.io_error(err));
            }
        };
        match serde_json::from_slice::<DataSet>(&raw) {
            Ok(data) => {
                debug!(
                    "loaded {} notebooks and {} notes from {}",
                    data.notebooks.len(),
                    data.notes.len(),
                    self.path.display()
                );
                Ok(data)
            }
            Err(err) => {
                self.preserve_corrupt = true;
                Err(StorageError::Corrupt {
                    path: self.path.display().to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    fn save(&mut self, data: &DataSet) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        if self.preserve_corrupt {
            let backup = self.corrupt_copy_path();
            fs::copy(&self.path, &backup).map_err(|e| self.io_error(e))?;
            warn!("kept unreadable data file as {}", backup.display());
            self.preserve_corrupt = false;
        }
        let serialized = serde_json::to_string_pretty(data).map_err(|e| StorageError::Io {
            path: self.path.display().to_string(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        let tmp = self.temp_path();
        fs::write(&tmp, serialized).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        debug!(
            "saved {} notebooks and {} notes",
            data.notebooks.len(),
            data.notes.len()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "notes-tui").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Note, Notebook};
    use tempfile::TempDir;

    fn sample() -> DataSet {
        let nb = Notebook::default_notebook();
        let work = Notebook::new("nb_work0001".into(), "Work".into());
        let a = Note::new(
            "note_a".into(),
            nb.id.clone(),
            "Shopping".into(),
            "buy milk\nand eggs".into(),
        );
        let b = Note::new("note_b".into(), work.id.clone(), "Standup".into(), "".into());
        DataSet {
            notebooks: vec![nb, work],
            notes: vec![a, b],
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let mut storage = JsonStorage::new(temp.path().join("notes.json"));
        assert_eq!(storage.load().unwrap(), DataSet::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/notes.json");
        let mut storage = JsonStorage::new(&path);
        let data = sample();
        storage.save(&data).unwrap();
        assert!(path.exists());
        assert!(!temp.path().join("nested/dir/notes.json.tmp").exists());

        let mut reopened = JsonStorage::new(&path);
        assert_eq!(reopened.load().unwrap(), data);
    }

    #[test]
    fn document_has_two_arrays_and_iso_timestamps() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.json");
        let mut storage = JsonStorage::new(&path);
        storage.save(&sample()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["notebooks"].as_array().unwrap().len(), 2);
        assert_eq!(value["notes"].as_array().unwrap().len(), 2);
        let stamp = value["notes"][0]["created_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn corrupt_file_is_reported_and_preserved_on_next_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.json");
        fs::write(&path, "{ not json").unwrap();

        let mut storage = JsonStorage::new(&path);
        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));

        let data = sample();
        storage.save(&data).unwrap();
        let backup = temp.path().join("notes.json.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ not json");
        assert_eq!(JsonStorage::new(&path).load().unwrap(), data);
    }

    #[test]
    fn invalid_utf8_counts_as_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.json");
        let bytes = b"{\"notes\":[{\"title\":\"caf\xe9\"}]}".to_vec();
        fs::write(&path, &bytes).unwrap();

        let mut storage = JsonStorage::new(&path);
        let err = storage.load().unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }), "{:?}", err);

        storage.save(&sample()).unwrap();
        let backup = temp.path().join("notes.json.corrupt");
        assert_eq!(fs::read(backup).unwrap(), bytes);
    }
}

use crate::storage::StorageError;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

pub type NoteId = String;
pub type NotebookId = String;

pub const DEFAULT_NOTEBOOK_ID: &str = "default";
pub const DEFAULT_NOTEBOOK_NAME: &str = "Default";
pub const UNTITLED: &str = "Untitled";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub notebook_id: NotebookId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Notebook {
    pub id: NotebookId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything that gets persisted, in insertion order.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct DataSet {
    #[serde(default)]
    pub notebooks: Vec<Notebook>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),
    #[error("notebook not found: {0}")]
    NotebookNotFound(NotebookId),
    #[error("a notebook named \"{0}\" already exists")]
    DuplicateName(String),
    #[error("notebook \"{name}\" still contains {count} note(s)")]
    NotEmpty { name: String, count: usize },
    #[error("notebook name cannot be empty")]
    EmptyName,
    #[error("could not save: {0}")]
    Storage(#[from] StorageError),
}

impl Note {
    pub fn new(id: NoteId, notebook_id: NotebookId, title: String, content: String) -> Self {
        let now = Utc::now();
        Note {
            id,
            notebook_id,
            title,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = next_timestamp(self.updated_at);
    }

    /// First line of content with newlines flattened, cut to `max` chars.
    pub fn preview(&self, max: usize) -> String {
        let flat = self.content.replace('\n', " ");
        let flat = flat.trim();
        if flat.chars().count() <= max {
            return flat.to_string();
        }
        let keep = max.saturating_sub(3);
        let mut out: String = flat.chars().take(keep).collect();
        out.push_str("...");
        out
    }
}

impl Notebook {
    pub fn new(id: NotebookId, name: String) -> Self {
        let now = Utc::now();
        Notebook {
            id,
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn default_notebook() -> Self {
        Notebook::new(DEFAULT_NOTEBOOK_ID.into(), DEFAULT_NOTEBOOK_NAME.into())
    }

    pub fn touch(&mut self) {
        self.updated_at = next_timestamp(self.updated_at);
    }
}

/// Current time, but never at or before `previous`.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

pub fn generate_id(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("{}_{}", prefix, suffix)
}

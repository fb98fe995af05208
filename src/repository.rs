use crate::model::{
    generate_id, DataSet, Note, NoteId, Notebook, NotebookId, RepoError, DEFAULT_NOTEBOOK_ID,
};
use crate::search;
use crate::storage::{Storage, StorageError};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// In-memory index over notebooks and notes. Every mutation is written
/// through to the storage before it is reported as successful; a failed
/// write rolls the in-memory state back.
pub struct Repository {
    storage: Box<dyn Storage>,
    notebooks: Vec<Notebook>,
    notes: Vec<Note>,
    by_notebook: HashMap<NotebookId, BTreeSet<NoteId>>,
    note_pos: HashMap<NoteId, usize>,
}

/// Most recently modified first, ties broken by id.
pub fn recency_order(a: &Note, b: &Note) -> Ordering {
    b.updated_at
        .cmp(&a.updated_at)
        .then_with(|| a.id.cmp(&b.id))
}

impl Repository {
    /// Loads whatever the storage holds. An unreadable document is not
    /// fatal: the repository starts with a default notebook and the load
    /// error is handed back for the caller to report.
    pub fn open(mut storage: Box<dyn Storage>) -> (Self, Option<StorageError>) {
        let (data, problem) = match storage.load() {
            Ok(data) => (data, None),
            Err(err) => {
                warn!("could not load {}: {}", storage.describe(), err);
                (DataSet::default(), Some(err))
            }
        };
        let mut repo = Repository {
            storage,
            notebooks: Vec::new(),
            notes: Vec::new(),
            by_notebook: HashMap::new(),
            note_pos: HashMap::new(),
        };
        repo.install(repair(data));
        info!(
            "repository ready: {} notebooks, {} notes",
            repo.notebooks.len(),
            repo.notes.len()
        );
        (repo, problem)
    }

    pub fn location(&self) -> String {
        self.storage.describe()
    }

    pub fn list_notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    pub fn notebook(&self, id: &str) -> Option<&Notebook> {
        self.notebooks.iter().find(|nb| nb.id == id)
    }

    #[cfg(test)]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.note_pos.get(id).map(|&pos| &self.notes[pos])
    }

    pub fn note_count(&self, notebook_id: &str) -> usize {
        self.by_notebook.get(notebook_id).map_or(0, |ids| ids.len())
    }

    pub fn list_notes(&self, notebook_id: &str) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self
            .by_notebook
            .get(notebook_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.note(id))
            .collect();
        notes.sort_by(|a, b| recency_order(a, b));
        notes
    }

    pub fn search(&self, query: &str, scope: Option<&str>) -> Vec<&Note> {
        search::search(&self.notes, query, scope)
    }

    pub fn snapshot(&self) -> DataSet {
        DataSet {
            notebooks: self.notebooks.clone(),
            notes: self.notes.clone(),
        }
    }

    pub fn create_note(
        &mut self,
        notebook_id: &str,
        title: &str,
        content: &str,
    ) -> Result<Note, RepoError> {
        self.commit(|repo| {
            repo.require_notebook(notebook_id)?;
            let id = repo.fresh_id("note");
            let note = Note::new(id, notebook_id.to_string(), title.into(), content.into());
            repo.notes.push(note.clone());
            debug!("created note {} in {}", note.id, notebook_id);
            Ok(note)
        })
    }

    pub fn update_note(&mut self, id: &str, title: &str, content: &str) -> Result<Note, RepoError> {
        self.commit(|repo| {
            let note = repo.note_mut(id)?;
            note.title = title.to_string();
            note.content = content.to_string();
            note.touch();
            debug!("updated note {}", id);
            Ok(note.clone())
        })
    }

    pub fn move_note(&mut self, id: &str, notebook_id: &str) -> Result<Note, RepoError> {
        self.commit(|repo| {
            repo.require_notebook(notebook_id)?;
            let note = repo.note_mut(id)?;
            note.notebook_id = notebook_id.to_string();
            note.touch();
            debug!("moved note {} to {}", id, notebook_id);
            Ok(note.clone())
        })
    }

    pub fn delete_note(&mut self, id: &str) -> Result<Note, RepoError> {
        self.commit(|repo| {
            let pos = *repo
                .note_pos
                .get(id)
                .ok_or_else(|| RepoError::NoteNotFound(id.to_string()))?;
            let note = repo.notes.remove(pos);
            debug!("deleted note {}", id);
            Ok(note)
        })
    }

    pub fn create_notebook(&mut self, name: &str) -> Result<Notebook, RepoError> {
        self.commit(|repo| {
            let name = repo.validate_name(name, None)?;
            let notebook = Notebook::new(repo.fresh_id("nb"), name);
            repo.notebooks.push(notebook.clone());
            debug!("created notebook {} ({})", notebook.id, notebook.name);
            Ok(notebook)
        })
    }

    pub fn rename_notebook(&mut self, id: &str, new_name: &str) -> Result<Notebook, RepoError> {
        self.commit(|repo| {
            let name = repo.validate_name(new_name, Some(id))?;
            let notebook = repo
                .notebooks
                .iter_mut()
                .find(|nb| nb.id == id)
                .ok_or_else(|| RepoError::NotebookNotFound(id.to_string()))?;
            notebook.name = name;
            notebook.touch();
            Ok(notebook.clone())
        })
    }

    /// Refuses to delete a notebook that still owns notes.
    pub fn delete_notebook(&mut self, id: &str) -> Result<Notebook, RepoError> {
        self.commit(|repo| {
            let pos = repo.notebook_pos(id)?;
            let count = repo.note_count(id);
            if count > 0 {
                return Err(RepoError::NotEmpty {
                    name: repo.notebooks[pos].name.clone(),
                    count,
                });
            }
            Ok(repo.remove_notebook_at(pos))
        })
    }

    /// Deletes the notebook together with every note it owns. Returns the
    /// removed notebook and the number of notes deleted with it.
    pub fn delete_notebook_cascade(&mut self, id: &str) -> Result<(Notebook, usize), RepoError> {
        self.commit(|repo| {
            let pos = repo.notebook_pos(id)?;
            let before = repo.notes.len();
            repo.notes.retain(|note| note.notebook_id != id);
            let removed = before - repo.notes.len();
            let notebook = repo.remove_notebook_at(pos);
            info!("deleted notebook {} with {} note(s)", id, removed);
            Ok((notebook, removed))
        })
    }

    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut Self) -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let before = self.snapshot();
        let outcome = match change(self) {
            Ok(value) => {
                self.reindex();
                match self.storage.save(&self.snapshot()) {
                    Ok(()) => Ok(value),
                    Err(err) => {
                        warn!("save failed, rolling back: {}", err);
                        Err(RepoError::Storage(err))
                    }
                }
            }
            Err(err) => Err(err),
        };
        if outcome.is_err() {
            self.install(before);
        }
        outcome
    }

    fn install(&mut self, data: DataSet) {
        self.notebooks = data.notebooks;
        self.notes = data.notes;
        self.reindex();
    }

    fn reindex(&mut self) {
        self.by_notebook.clear();
        self.note_pos.clear();
        for nb in &self.notebooks {
            self.by_notebook.insert(nb.id.clone(), BTreeSet::new());
        }
        for (pos, note) in self.notes.iter().enumerate() {
            self.note_pos.insert(note.id.clone(), pos);
            self.by_notebook
                .entry(note.notebook_id.clone())
                .or_default()
                .insert(note.id.clone());
        }
    }

    fn remove_notebook_at(&mut self, pos: usize) -> Notebook {
        let notebook = self.notebooks.remove(pos);
        if self.notebooks.is_empty() {
            self.notebooks.push(Notebook::default_notebook());
            info!("last notebook removed, recreated default notebook");
        }
        notebook
    }

    fn require_notebook(&self, id: &str) -> Result<(), RepoError> {
        self.notebook_pos(id).map(|_| ())
    }

    fn notebook_pos(&self, id: &str) -> Result<usize, RepoError> {
        self.notebooks
            .iter()
            .position(|nb| nb.id == id)
            .ok_or_else(|| RepoError::NotebookNotFound(id.to_string()))
    }

    fn note_mut(&mut self, id: &str) -> Result<&mut Note, RepoError> {
        let pos = *self
            .note_pos
            .get(id)
            .ok_or_else(|| RepoError::NoteNotFound(id.to_string()))?;
        Ok(&mut self.notes[pos])
    }

    fn validate_name(&self, name: &str, renaming: Option<&str>) -> Result<String, RepoError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepoError::EmptyName);
        }
        let taken = self
            .notebooks
            .iter()
            .any(|nb| nb.name == name && Some(nb.id.as_str()) != renaming);
        if taken {
            return Err(RepoError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        loop {
            let id = generate_id(prefix);
            let clash = self.note_pos.contains_key(&id) || self.notebooks.iter().any(|nb| nb.id == id);
            if !clash {
                return id;
            }
        }
    }
}

/// Makes a loaded document satisfy the invariants: unique ids, at least one
/// notebook, and no note pointing at a missing notebook.
const UNNAMED_NOTEBOOK: &str = "Untitled notebook";

fn repair(data: DataSet) -> DataSet {
    let mut seen = HashSet::new();
    let mut notebooks: Vec<Notebook> = Vec::with_capacity(data.notebooks.len());
    for nb in data.notebooks {
        if seen.insert(nb.id.clone()) {
            notebooks.push(nb);
        } else {
            warn!("dropping duplicate notebook id {}", nb.id);
        }
    }
    if notebooks.is_empty() {
        notebooks.push(Notebook::default_notebook());
    }

    let known: HashSet<String> = notebooks.iter().map(|nb| nb.id.clone()).collect();
    let mut seen_notes = HashSet::new();
    let mut notes = Vec::with_capacity(data.notes.len());
    let mut orphans = 0;
    for mut note in data.notes {
        if !seen_notes.insert(note.id.clone()) {
            warn!("dropping duplicate note id {}", note.id);
            continue;
        }
        if !known.contains(&note.notebook_id) {
            orphans += 1;
            note.notebook_id = DEFAULT_NOTEBOOK_ID.to_string();
        }
        notes.push(note);
    }
    if orphans > 0 {
        warn!("reassigned {} orphaned note(s) to the default notebook", orphans);
        if !notebooks.iter().any(|nb| nb.id == DEFAULT_NOTEBOOK_ID) {
            notebooks.insert(0, Notebook::default_notebook());
        }
    }
    repair_names(&mut notebooks);
    DataSet { notebooks, notes }
}

/// Names must be non-empty and unique. Blank names get a placeholder and
/// later duplicates get a numeric suffix; the first holder keeps its name.
fn repair_names(notebooks: &mut [Notebook]) {
    let mut taken = HashSet::new();
    for nb in notebooks.iter_mut() {
        let base = match nb.name.trim() {
            "" => UNNAMED_NOTEBOOK.to_string(),
            trimmed => trimmed.to_string(),
        };
        let mut name = base.clone();
        let mut n = 2;
        while !taken.insert(name.clone()) {
            name = format!("{} ({})", base, n);
            n += 1;
        }
        if name != nb.name {
            warn!("renamed notebook {} from {:?} to {:?}", nb.id, nb.name, name);
            nb.name = name;
        }
    }
}

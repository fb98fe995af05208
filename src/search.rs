use crate::model::Note;
use crate::repository::recency_order;

/// Case-insensitive substring search over title and content.
///
/// Title hits rank above content-only hits; each group is ordered most
/// recently modified first with ties broken by id. An empty query matches
/// nothing.
pub fn search<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    query: &str,
    scope: Option<&str>,
) -> Vec<&'a Note> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let mut title_hits = Vec::new();
    let mut content_hits = Vec::new();
    for note in notes {
        if let Some(notebook_id) = scope {
            if note.notebook_id != notebook_id {
                continue;
            }
        }
        if note.title.to_lowercase().contains(&needle) {
            title_hits.push(note);
        } else if note.content.to_lowercase().contains(&needle) {
            content_hits.push(note);
        }
    }
    title_hits.sort_by(|a, b| recency_order(a, b));
    content_hits.sort_by(|a, b| recency_order(a, b));
    title_hits.extend(content_hits);
    title_hits
}

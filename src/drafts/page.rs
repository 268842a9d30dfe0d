use crate::storage::{
    load_json_from_storage, remove_from_storage, save_json_to_storage, DRAFT_KEY_PREFIX,
};
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PageDraft {
    pub path: String,
    pub value: String,
    pub updated_ms: i64,
}

/// Local persistence of unsaved page content.
pub(crate) trait DraftStore: Send + Sync {
    fn find_draft(&self, path: &str) -> Option<String>;
    fn save_draft(&self, path: &str, body: &str);
    fn clear_draft(&self, path: &str);
}

fn key(path: &str) -> String {
    format!("{DRAFT_KEY_PREFIX}{path}")
}

/// Drafts kept in `localStorage`, one key per page path.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct LocalDrafts;

impl DraftStore for LocalDrafts {
    fn find_draft(&self, path: &str) -> Option<String> {
        if path.trim().is_empty() {
            return None;
        }
        load_json_from_storage::<PageDraft>(&key(path)).map(|d| d.value)
    }

    fn save_draft(&self, path: &str, body: &str) {
        if path.trim().is_empty() {
            return;
        }
        let d = PageDraft {
            path: path.to_string(),
            value: body.to_string(),
            updated_ms: now_ms(),
        };
        save_json_to_storage(&key(path), &d);
    }

    fn clear_draft(&self, path: &str) {
        if path.trim().is_empty() {
            return;
        }
        remove_from_storage(&key(path));
    }
}

/// Markdown to seed the editors with.
///
/// A draft only wins on the first edit of a page, i.e. while it has no revision yet.
pub(crate) fn initial_markdown(
    server_markdown: String,
    has_revision: bool,
    draft: Option<String>,
) -> String {
    match draft {
        Some(d) if !has_revision => d,
        _ => server_markdown,
    }
}

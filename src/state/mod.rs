mod save_controls;
mod save_coordinator;

pub(crate) use save_controls::SaveControls;
pub(crate) use save_coordinator::{SaveCoordinator, SaveOutcome};

use crate::models::{EditorMode, Page, PageIdentity, RevisionRef, SyncedRevisionRef};

/// Identity and revision of the open page as this tab knows it.
///
/// Only a successful save moves it forward; realtime events never do, so the
/// server still sees the revision the local edits were based on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SaveCoordinatorState {
    identity: PageIdentity,
    revision: SyncedRevisionRef,
    editor_mode: Option<EditorMode>,
    socket_client_id: String,
}

impl SaveCoordinatorState {
    pub fn new(
        identity: PageIdentity,
        revision: Option<RevisionRef>,
        revision_id_hackmd_synced: Option<String>,
        socket_client_id: String,
    ) -> Self {
        Self {
            identity,
            revision: SyncedRevisionRef {
                revision,
                revision_id_hackmd_synced,
            },
            editor_mode: None,
            socket_client_id,
        }
    }

    #[cfg(test)]
    pub fn identity(&self) -> &PageIdentity {
        &self.identity
    }

    pub fn path(&self) -> &str {
        &self.identity.path
    }

    pub fn page_id(&self) -> Option<&str> {
        self.identity.page_id.as_deref()
    }

    pub fn revision_id(&self) -> Option<&str> {
        self.revision
            .revision
            .as_ref()
            .map(|r| r.revision_id.as_str())
    }

    #[cfg(test)]
    pub fn revision(&self) -> Option<&RevisionRef> {
        self.revision.revision.as_ref()
    }

    pub fn revision_id_hackmd_synced(&self) -> Option<&str> {
        self.revision.revision_id_hackmd_synced.as_deref()
    }

    pub fn editor_mode(&self) -> Option<EditorMode> {
        self.editor_mode
    }

    pub fn set_editor_mode(&mut self, mode: Option<EditorMode>) {
        self.editor_mode = mode;
    }

    pub fn socket_client_id(&self) -> &str {
        &self.socket_client_id
    }

    /// True for events this tab caused itself.
    pub fn is_self_origin(&self, origin: Option<&str>) -> bool {
        origin.is_some_and(|o| o == self.socket_client_id)
    }

    pub fn is_current_page(&self, path: &str) -> bool {
        self.identity.path == path
    }

    /// Take over identity and revision from a save response.
    pub fn apply_saved_page(&mut self, page: &Page) {
        if !page.id.is_empty() {
            self.identity.page_id = Some(page.id.clone());
        }

        let created_at = match &self.revision.revision {
            Some(r) if r.revision_id == page.revision.id => r.created_at.clone(),
            _ => page.revision.created_at.clone(),
        };
        self.revision.revision = Some(RevisionRef {
            revision_id: page.revision.id.clone(),
            created_at,
        });
        self.revision.revision_id_hackmd_synced = page.revision_hackmd_synced.clone();
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub SaveCoordinator);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Revision;

    fn state(page_id: Option<&str>, revision_id: Option<&str>) -> SaveCoordinatorState {
        SaveCoordinatorState::new(
            PageIdentity {
                page_id: page_id.map(str::to_string),
                path: "/Sandbox".to_string(),
            },
            revision_id.map(|r| RevisionRef {
                revision_id: r.to_string(),
                created_at: Some("1700000000".to_string()),
            }),
            None,
            "me".to_string(),
        )
    }

    fn saved(id: &str, rev: &str) -> Page {
        Page {
            id: id.to_string(),
            path: "/Sandbox".to_string(),
            revision: Revision {
                id: rev.to_string(),
                body: "# Hello".to_string(),
                created_at: Some("2024-01-01T00:00:00.000Z".to_string()),
            },
            revision_hackmd_synced: Some("r0".to_string()),
            has_draft_on_hackmd: false,
        }
    }

    #[test]
    fn test_apply_saved_page_sets_identity_and_revision() {
        let mut s = state(None, None);
        assert!(!s.identity().is_created());

        s.apply_saved_page(&saved("p1", "r1"));
        assert_eq!(s.page_id(), Some("p1"));
        assert_eq!(s.revision_id(), Some("r1"));
        assert_eq!(s.revision_id_hackmd_synced(), Some("r0"));
        assert_eq!(
            s.revision().and_then(|r| r.created_at.as_deref()),
            Some("2024-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_apply_saved_page_twice_is_noop() {
        let mut s = state(Some("p1"), Some("r1"));
        let page = saved("p1", "r2");
        s.apply_saved_page(&page);
        let once = s.clone();
        s.apply_saved_page(&page);
        assert_eq!(s, once);
    }

    #[test]
    fn test_apply_saved_page_keeps_known_created_at_for_same_revision() {
        let mut s = state(Some("p1"), Some("r1"));
        let mut page = saved("p1", "r1");
        page.revision.created_at = None;
        s.apply_saved_page(&page);
        assert_eq!(
            s.revision().and_then(|r| r.created_at.as_deref()),
            Some("1700000000")
        );
    }

    #[test]
    fn test_self_origin_requires_matching_id() {
        let s = state(None, None);
        assert!(s.is_self_origin(Some("me")));
        assert!(!s.is_self_origin(Some("other")));
        assert!(!s.is_self_origin(None));
    }

    #[test]
    fn test_current_page_match_is_exact() {
        let s = state(None, None);
        assert!(s.is_current_page("/Sandbox"));
        assert!(!s.is_current_page("/Sandbox/child"));
        assert!(!s.is_current_page("/sandbox"));
    }
}

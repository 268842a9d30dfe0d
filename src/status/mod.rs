use leptos::prelude::*;

/// What the page status banner should currently say.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum StatusAlert {
    /// Someone saved a newer revision than the one this tab loaded.
    PageUpdatedElsewhere { by: Option<String> },
    /// A collaborator is editing in the external editor without a saved revision yet.
    DraftOnExternal,
    /// The external editor holds a revision other than the latest one.
    ExternalOutOfSync,
}

/// Revision status shown to the user, fed by saves and realtime events.
#[derive(Clone, Copy)]
pub(crate) struct StatusNotifier {
    initial_revision_id: RwSignal<Option<String>>,
    revision_id: RwSignal<Option<String>>,
    revision_id_synced: RwSignal<Option<String>>,
    has_draft_on_external: RwSignal<bool>,
    last_update_username: RwSignal<Option<String>>,
}

impl StatusNotifier {
    pub fn new(
        revision_id: Option<String>,
        revision_id_synced: Option<String>,
        has_draft_on_external: bool,
    ) -> Self {
        Self {
            initial_revision_id: RwSignal::new(revision_id.clone()),
            revision_id: RwSignal::new(revision_id),
            revision_id_synced: RwSignal::new(revision_id_synced),
            has_draft_on_external: RwSignal::new(has_draft_on_external),
            last_update_username: RwSignal::new(None),
        }
    }

    pub fn set_revision_id(&self, revision_id: String, revision_id_synced: Option<String>) {
        self.revision_id.set(Some(revision_id));
        self.revision_id_synced.set(revision_id_synced);
    }

    pub fn set_last_update_username(&self, name: Option<String>) {
        self.last_update_username.set(name);
    }

    pub fn set_has_draft_on_external(&self, has_draft: bool) {
        self.has_draft_on_external.set(has_draft);
    }

    /// Forget pending changes after this tab saved `revision_id` itself.
    pub fn clear_revision_status(&self, revision_id: String, revision_id_synced: Option<String>) {
        self.initial_revision_id.set(Some(revision_id.clone()));
        self.revision_id.set(Some(revision_id));
        self.revision_id_synced.set(revision_id_synced);
        self.has_draft_on_external.set(false);
        self.last_update_username.set(None);
    }

    #[cfg(test)]
    pub fn revision_id_untracked(&self) -> Option<String> {
        self.revision_id.get_untracked()
    }

    #[cfg(test)]
    pub fn has_draft_on_external_untracked(&self) -> bool {
        self.has_draft_on_external.get_untracked()
    }

    /// Reactive; use inside views.
    pub fn alert(&self) -> Option<StatusAlert> {
        compute_alert(
            self.initial_revision_id.get(),
            self.revision_id.get(),
            self.revision_id_synced.get(),
            self.has_draft_on_external.get(),
            self.last_update_username.get(),
        )
    }

    #[cfg(test)]
    pub fn alert_untracked(&self) -> Option<StatusAlert> {
        compute_alert(
            self.initial_revision_id.get_untracked(),
            self.revision_id.get_untracked(),
            self.revision_id_synced.get_untracked(),
            self.has_draft_on_external.get_untracked(),
            self.last_update_username.get_untracked(),
        )
    }
}

fn compute_alert(
    initial: Option<String>,
    latest: Option<String>,
    synced: Option<String>,
    has_draft_on_external: bool,
    last_update_username: Option<String>,
) -> Option<StatusAlert> {
    if latest.is_some() && initial != latest {
        return Some(StatusAlert::PageUpdatedElsewhere {
            by: last_update_username,
        });
    }
    if has_draft_on_external {
        return Some(StatusAlert::DraftOnExternal);
    }
    match (synced, latest) {
        (Some(s), Some(l)) if s != l => Some(StatusAlert::ExternalOutOfSync),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_page_has_no_alert() {
        let s = StatusNotifier::new(Some("r1".to_string()), Some("r1".to_string()), false);
        assert_eq!(s.alert_untracked(), None);
    }

    #[test]
    fn test_new_page_without_revision_has_no_alert() {
        let s = StatusNotifier::new(None, None, false);
        assert_eq!(s.alert_untracked(), None);
    }

    #[test]
    fn test_remote_revision_reports_update_with_username() {
        let s = StatusNotifier::new(Some("r1".to_string()), None, false);
        s.set_revision_id("r2".to_string(), None);
        s.set_last_update_username(Some("alice".to_string()));
        assert_eq!(
            s.alert_untracked(),
            Some(StatusAlert::PageUpdatedElsewhere {
                by: Some("alice".to_string())
            })
        );
    }

    #[test]
    fn test_update_takes_priority_over_external_draft() {
        let s = StatusNotifier::new(Some("r1".to_string()), None, true);
        assert_eq!(s.alert_untracked(), Some(StatusAlert::DraftOnExternal));
        s.set_revision_id("r2".to_string(), None);
        assert!(matches!(
            s.alert_untracked(),
            Some(StatusAlert::PageUpdatedElsewhere { .. })
        ));
    }

    #[test]
    fn test_stale_external_revision_is_reported() {
        let s = StatusNotifier::new(Some("r2".to_string()), Some("r1".to_string()), false);
        assert_eq!(s.alert_untracked(), Some(StatusAlert::ExternalOutOfSync));
    }

    #[test]
    fn test_clear_revision_status_resets_everything() {
        let s = StatusNotifier::new(Some("r1".to_string()), Some("r0".to_string()), true);
        s.set_revision_id("r2".to_string(), Some("r0".to_string()));
        s.clear_revision_status("r3".to_string(), Some("r3".to_string()));
        assert_eq!(s.alert_untracked(), None);
        assert_eq!(s.revision_id_untracked().as_deref(), Some("r3"));
        assert!(!s.has_draft_on_external_untracked());
    }
}

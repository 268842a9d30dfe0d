use super::{SaveControls, SaveCoordinatorState};
use crate::api::{ApiError, PageService};
use crate::drafts::DraftStore;
use crate::editor::{EditorError, EditorSurface, EditorSurfaces};
use crate::effects::{Notifier, PageLocation};
use crate::models::{EditorMode, Page, SaveOptions, SubmitOptions};
use crate::realtime::{PageChannel, RealtimeEvent};
use crate::status::StatusNotifier;
use crate::util::canonical_page_url;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SaveOutcome {
    /// Saved in place; the page stays open.
    Saved { page_id: String, revision_id: String },
    /// Saved from the submit button; the browser is leaving for `url`.
    Navigated { url: String },
    Skipped(SkipReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SkipReason {
    NoEditorMode,
    NoContentSource,
    SaveInFlight,
}

#[derive(Clone, Debug, thiserror::Error)]
pub(crate) enum SaveError {
    #[error(transparent)]
    Remote(#[from] ApiError),
    #[error(transparent)]
    Editor(#[from] EditorError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RemoteEventDisposition {
    Applied,
    SelfOrigin,
    OtherPage,
}

/// Held for the duration of one save; a second save cannot start meanwhile.
struct SaveGuard(Arc<AtomicBool>);

impl SaveGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag.clone()))
        }
    }
}

impl Drop for SaveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Decides which editor is authoritative on save, talks to the page service,
/// and keeps every mounted widget in step with the result and with realtime
/// notifications.
///
/// Overlapping saves are rejected rather than queued: while one is in flight,
/// another returns [`SkipReason::SaveInFlight`] without touching the network.
#[derive(Clone)]
pub(crate) struct SaveCoordinator {
    state: Arc<Mutex<SaveCoordinatorState>>,
    pages: Arc<dyn PageService>,
    drafts: Arc<dyn DraftStore>,
    notifier: Arc<dyn Notifier>,
    location: Arc<dyn PageLocation>,

    editors: EditorSurfaces,
    status: Option<StatusNotifier>,
    save_controls: Option<SaveControls>,

    save_in_flight: Arc<AtomicBool>,
}

impl SaveCoordinator {
    pub fn new(
        state: SaveCoordinatorState,
        pages: Arc<dyn PageService>,
        drafts: Arc<dyn DraftStore>,
        notifier: Arc<dyn Notifier>,
        location: Arc<dyn PageLocation>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            pages,
            drafts,
            notifier,
            location,
            editors: EditorSurfaces::default(),
            status: None,
            save_controls: None,
            save_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_editors(mut self, editors: EditorSurfaces) -> Self {
        self.editors = editors;
        self
    }

    pub fn with_status(mut self, status: StatusNotifier) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_save_controls(mut self, controls: SaveControls) -> Self {
        self.save_controls = Some(controls);
        self
    }

    fn state(&self) -> MutexGuard<'_, SaveCoordinatorState> {
        // Single-threaded runtime; a poisoned lock only means a panic elsewhere.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> SaveCoordinatorState {
        self.state().clone()
    }

    pub fn editor_mode(&self) -> Option<EditorMode> {
        self.state().editor_mode()
    }

    pub fn set_editor_mode(&self, mode: Option<EditorMode>) {
        tracing::debug!(?mode, "editor mode changed");
        self.state().set_editor_mode(mode);
    }

    /// Remember unsaved primary-editor content for the open page.
    ///
    /// Drafts are only restored for a page's first revision, so pages that
    /// already have one are never written.
    pub fn store_draft(&self, content: &str) {
        let path = {
            let s = self.state();
            if s.revision_id().is_some() {
                return;
            }
            s.path().to_string()
        };
        self.drafts.save_draft(&path, content);
    }

    /// Options from the save controls plus what the coordinator owns.
    fn build_options(&self, mode: EditorMode) -> SaveOptions {
        let mut options = self
            .save_controls
            .map(|c| c.current_options())
            .unwrap_or_default();
        options.socket_client_id = Some(self.state().socket_client_id().to_string());
        if mode == EditorMode::External {
            options.is_sync_revision_to_hackmd = true;
        }
        options
    }

    /// Revision the save is based on. `None` when the authoritative surface is missing.
    fn base_revision_id(&self, mode: EditorMode) -> Option<Option<String>> {
        match mode {
            EditorMode::Primary => Some(self.state().revision_id().map(str::to_string)),
            EditorMode::External => self
                .editors
                .external
                .as_ref()
                .map(|e| e.synced_revision_id()),
        }
    }

    async fn create_or_update(
        &self,
        content: &str,
        revision_id: Option<String>,
        options: &SaveOptions,
    ) -> Result<Page, ApiError> {
        let (page_id, path) = {
            let s = self.state();
            (s.page_id().map(str::to_string), s.path().to_string())
        };

        match page_id {
            None => {
                tracing::info!(%path, "creating page");
                self.pages.create_page(&path, content, options).await
            }
            Some(id) => {
                tracing::info!(page_id = %id, revision_id = ?revision_id, "updating page");
                self.pages
                    .update_page(&id, revision_id.as_deref(), content, options)
                    .await
            }
        }
    }

    fn report_failure(&self, err: &SaveError) {
        tracing::warn!(error = %err, "save failed");
        self.notifier.error("Error occurred", &err.to_string());
    }

    /// Save `content` and stay on the page.
    pub async fn save_with_shortcut(&self, content: String) -> Result<SaveOutcome, SaveError> {
        let Some(_guard) = SaveGuard::acquire(&self.save_in_flight) else {
            tracing::debug!("save already in flight; ignoring shortcut");
            return Ok(SaveOutcome::Skipped(SkipReason::SaveInFlight));
        };

        // Viewing (no mode) saves as the primary editor would.
        let mode = self.editor_mode().unwrap_or(EditorMode::Primary);
        let Some(revision_id) = self.base_revision_id(mode) else {
            tracing::debug!(%mode, "no editor surface for mode; nothing to save");
            return Ok(SaveOutcome::Skipped(SkipReason::NoContentSource));
        };
        let options = self.build_options(mode);

        match self.create_or_update(&content, revision_id, &options).await {
            Ok(page) => {
                self.apply_saved_in_place(&page, mode);
                Ok(SaveOutcome::Saved {
                    page_id: page.id,
                    revision_id: page.revision.id,
                })
            }
            Err(e) => {
                let err = SaveError::from(e);
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    fn apply_saved_in_place(&self, page: &Page, saved_from: EditorMode) {
        let (revision_id, synced) = {
            let mut s = self.state();
            s.apply_saved_page(page);
            self.drafts.clear_draft(s.path());
            (
                s.revision_id().unwrap_or_default().to_string(),
                s.revision_id_hackmd_synced().map(str::to_string),
            )
        };
        tracing::info!(page_id = %page.id, %revision_id, "page saved");

        let body = &page.revision.body;
        if let Some(primary) = &self.editors.primary {
            if saved_from != EditorMode::Primary {
                primary.set_content(body);
            }
        }
        if let Some(external) = &self.editors.external {
            external.clear_revision_status(revision_id.clone(), synced.clone());
            if saved_from != EditorMode::External {
                external.set_content(body);
                external.reset();
            }
        }
        if let Some(status) = &self.status {
            status.clear_revision_status(revision_id.clone(), synced);
        }

        self.location.set_revision_field(&revision_id);
        self.notifier.success("Saved successfully");
    }

    /// Save from the submit button and leave for the page on success.
    pub async fn save_with_submit_button(
        &self,
        submit: SubmitOptions,
    ) -> Result<SaveOutcome, SaveError> {
        let Some(mode) = self.editor_mode() else {
            tracing::debug!("no editor mode; submit ignored");
            return Ok(SaveOutcome::Skipped(SkipReason::NoEditorMode));
        };
        let Some(_guard) = SaveGuard::acquire(&self.save_in_flight) else {
            tracing::debug!("save already in flight; ignoring submit");
            return Ok(SaveOutcome::Skipped(SkipReason::SaveInFlight));
        };

        let (Some(surface), Some(revision_id)) =
            (self.editors.get(mode), self.base_revision_id(mode))
        else {
            tracing::debug!(%mode, "no editor surface for mode; submit ignored");
            return Ok(SaveOutcome::Skipped(SkipReason::NoContentSource));
        };

        let mut options = self.build_options(mode);
        options.overwrite_scopes_of_descendants = submit.overwrite_scopes_of_descendants;

        let result = match surface.fetch_content().await {
            Ok(content) => self
                .create_or_update(&content, revision_id, &options)
                .await
                .map_err(SaveError::from),
            Err(e) => Err(SaveError::from(e)),
        };

        match result {
            Ok(page) => {
                let path = self.state().path().to_string();
                self.drafts.clear_draft(&path);
                let url = canonical_page_url(&path);
                tracing::info!(page_id = %page.id, %url, "page saved; navigating");
                self.location.navigate_to(&url);
                Ok(SaveOutcome::Navigated { url })
            }
            Err(err) => {
                self.report_failure(&err);
                Err(err)
            }
        }
    }

    /// Apply a realtime notification about some page.
    pub fn on_remote_event(&self, event: &RealtimeEvent) -> RemoteEventDisposition {
        {
            let s = self.state();
            if s.is_self_origin(event.socket_client_id.as_deref()) {
                return RemoteEventDisposition::SelfOrigin;
            }
            if !s.is_current_page(&event.page.path) {
                return RemoteEventDisposition::OtherPage;
            }
        }
        tracing::debug!(channel = %event.channel, path = %event.page.path, "applying remote event");

        let page = &event.page;
        let username = event.user.as_ref().map(|u| u.name.clone());

        match event.channel {
            PageChannel::Create | PageChannel::Delete => {
                self.update_status_revision(page, username);
            }
            PageChannel::Update => {
                self.update_status_revision(page, username);
                if let Some(external) = &self.editors.external {
                    external.set_revision_id(
                        page.revision.id.clone(),
                        page.revision_hackmd_synced.clone(),
                    );
                    external.set_has_draft_on_external(page.has_draft_on_hackmd);
                }
            }
            PageChannel::EditingWithExternal => {
                if let Some(status) = &self.status {
                    status.set_has_draft_on_external(page.has_draft_on_hackmd);
                }
                if let Some(external) = &self.editors.external {
                    external.set_has_draft_on_external(page.has_draft_on_hackmd);
                }
            }
        }

        RemoteEventDisposition::Applied
    }

    fn update_status_revision(&self, page: &Page, username: Option<String>) {
        if let Some(status) = &self.status {
            status.set_revision_id(page.revision.id.clone(), page.revision_hackmd_synced.clone());
            status.set_last_update_username(username);
        }
    }
}

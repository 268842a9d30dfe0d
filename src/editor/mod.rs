use crate::models::EditorMode;
use async_trait::async_trait;
use leptos::prelude::*;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum EditorError {
    #[error("collaborative editor is not available")]
    Unavailable,
    #[error("failed to fetch collaborative document: {0}")]
    Fetch(String),
}

/// One place the page body can be edited in.
#[async_trait(?Send)]
pub(crate) trait EditorSurface {
    /// Current content. The collaborative editor may need a round-trip for this.
    async fn fetch_content(&self) -> Result<String, EditorError>;

    fn set_content(&self, body: &str);

    /// Revision the surface's content is based on, when it tracks one.
    fn synced_revision_id(&self) -> Option<String>;
}

/// The built-in markdown textarea.
#[derive(Clone, Copy)]
pub(crate) struct PrimaryEditor {
    markdown: RwSignal<String>,
}

impl PrimaryEditor {
    pub fn new(markdown: String) -> Self {
        Self {
            markdown: RwSignal::new(markdown),
        }
    }

    pub fn markdown(&self) -> String {
        self.markdown.get()
    }

    pub fn content_untracked(&self) -> String {
        self.markdown.get_untracked()
    }

    pub fn on_input(&self, value: String) {
        self.markdown.set(value);
    }
}

#[async_trait(?Send)]
impl EditorSurface for PrimaryEditor {
    async fn fetch_content(&self) -> Result<String, EditorError> {
        Ok(self.content_untracked())
    }

    fn set_content(&self, body: &str) {
        self.markdown.set(body.to_string());
    }

    fn synced_revision_id(&self) -> Option<String> {
        None
    }
}

/// Where the collaborative editor's live document can be read from.
#[async_trait(?Send)]
pub(crate) trait CollaborativeSource: Send + Sync {
    async fn fetch_markdown(&self, page_id_on_external: &str) -> Result<String, EditorError>;
}

/// HackMD/CodiMD expose the raw note at `/{note_id}/download`.
#[derive(Clone, Debug)]
pub(crate) struct HttpCollaborativeSource {
    base_uri: String,
}

impl HttpCollaborativeSource {
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn download_url(&self, page_id_on_external: &str) -> String {
        format!(
            "{}/{}/download",
            self.base_uri,
            urlencoding::encode(page_id_on_external)
        )
    }
}

#[async_trait(?Send)]
impl CollaborativeSource for HttpCollaborativeSource {
    async fn fetch_markdown(&self, page_id_on_external: &str) -> Result<String, EditorError> {
        let res = reqwest::Client::new()
            .get(self.download_url(page_id_on_external))
            .send()
            .await
            .map_err(|e| EditorError::Fetch(e.to_string()))?;

        if !res.status().is_success() {
            return Err(EditorError::Fetch(format!("status {}", res.status())));
        }
        res.text().await.map_err(|e| EditorError::Fetch(e.to_string()))
    }
}

/// The external collaborative editor integration and the revision state it knows about.
#[derive(Clone)]
pub(crate) struct ExternalEditor {
    markdown: RwSignal<String>,
    revision_id: RwSignal<Option<String>>,
    revision_id_synced: RwSignal<Option<String>>,
    has_draft_on_external: RwSignal<bool>,
    page_id_on_external: RwSignal<Option<String>>,
    /// False until the user opens the collaborative session for this page.
    is_initialized: RwSignal<bool>,
    source: Option<Arc<dyn CollaborativeSource>>,
}

impl ExternalEditor {
    pub fn new(
        markdown: String,
        revision_id: Option<String>,
        revision_id_synced: Option<String>,
        page_id_on_external: Option<String>,
        has_draft_on_external: bool,
        source: Option<Arc<dyn CollaborativeSource>>,
    ) -> Self {
        Self {
            markdown: RwSignal::new(markdown),
            revision_id: RwSignal::new(revision_id),
            revision_id_synced: RwSignal::new(revision_id_synced),
            has_draft_on_external: RwSignal::new(has_draft_on_external),
            is_initialized: RwSignal::new(false),
            page_id_on_external: RwSignal::new(page_id_on_external),
            source,
        }
    }

    pub fn set_revision_id(&self, revision_id: String, revision_id_synced: Option<String>) {
        self.revision_id.set(Some(revision_id));
        self.revision_id_synced.set(revision_id_synced);
    }

    pub fn set_has_draft_on_external(&self, has_draft: bool) {
        self.has_draft_on_external.set(has_draft);
    }

    pub fn clear_revision_status(&self, revision_id: String, revision_id_synced: Option<String>) {
        self.revision_id.set(Some(revision_id));
        self.revision_id_synced.set(revision_id_synced);
        self.has_draft_on_external.set(false);
    }

    /// Drop back to the "start collaborative editing" state.
    pub fn reset(&self) {
        self.is_initialized.set(false);
    }

    pub fn start(&self, page_id_on_external: String) {
        self.page_id_on_external.set(Some(page_id_on_external));
        self.is_initialized.set(true);
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized.get()
    }

    pub fn page_id_on_external(&self) -> Option<String> {
        self.page_id_on_external.get()
    }

    pub fn has_draft_on_external(&self) -> bool {
        self.has_draft_on_external.get()
    }

    #[cfg(test)]
    pub fn revision_id_untracked(&self) -> Option<String> {
        self.revision_id.get_untracked()
    }

    #[cfg(test)]
    pub fn has_draft_on_external_untracked(&self) -> bool {
        self.has_draft_on_external.get_untracked()
    }

    #[cfg(test)]
    pub fn is_initialized_untracked(&self) -> bool {
        self.is_initialized.get_untracked()
    }

    /// The collaborative editor is out of date when it last synced an older revision.
    pub fn is_outdated(&self) -> bool {
        match (self.revision_id.get(), self.revision_id_synced.get()) {
            (Some(rev), Some(synced)) => rev != synced,
            _ => false,
        }
    }
}

#[async_trait(?Send)]
impl EditorSurface for ExternalEditor {
    async fn fetch_content(&self) -> Result<String, EditorError> {
        let page_id = self.page_id_on_external.get_untracked();
        match (&self.source, page_id) {
            (Some(source), Some(id)) => source.fetch_markdown(&id).await,
            // Nothing started on the collaborative side yet; local copy is current.
            (_, None) => Ok(self.markdown.get_untracked()),
            (None, Some(_)) => Err(EditorError::Unavailable),
        }
    }

    fn set_content(&self, body: &str) {
        self.markdown.set(body.to_string());
    }

    fn synced_revision_id(&self) -> Option<String> {
        self.revision_id_synced.get_untracked()
    }
}

/// Editor surfaces mounted on this page.
#[derive(Clone, Default)]
pub(crate) struct EditorSurfaces {
    pub primary: Option<PrimaryEditor>,
    pub external: Option<ExternalEditor>,
}

impl EditorSurfaces {
    pub fn get(&self, mode: EditorMode) -> Option<&dyn EditorSurface> {
        match mode {
            EditorMode::Primary => self.primary.as_ref().map(|e| e as &dyn EditorSurface),
            EditorMode::External => self.external.as_ref().map(|e| e as &dyn EditorSurface),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    struct FixedSource(Result<String, EditorError>);

    #[async_trait(?Send)]
    impl CollaborativeSource for FixedSource {
        async fn fetch_markdown(&self, _id: &str) -> Result<String, EditorError> {
            self.0.clone()
        }
    }

    fn external(page_id: Option<&str>, source: Option<FixedSource>) -> ExternalEditor {
        ExternalEditor::new(
            "local".to_string(),
            Some("r1".to_string()),
            Some("r1".to_string()),
            page_id.map(str::to_string),
            false,
            source.map(|s| Arc::new(s) as Arc<dyn CollaborativeSource>),
        )
    }

    #[test]
    fn test_primary_editor_content() {
        let e = PrimaryEditor::new("# a".to_string());
        e.on_input("# b".to_string());
        assert_eq!(block_on(e.fetch_content()), Ok("# b".to_string()));
        e.set_content("# c");
        assert_eq!(e.content_untracked(), "# c");
        assert!(e.synced_revision_id().is_none());
    }

    #[test]
    fn test_external_fetches_from_collaborative_source() {
        let e = external(Some("abc"), Some(FixedSource(Ok("remote".to_string()))));
        assert_eq!(block_on(e.fetch_content()), Ok("remote".to_string()));
    }

    #[test]
    fn test_external_without_session_uses_local_copy() {
        let e = external(None, None);
        assert_eq!(block_on(e.fetch_content()), Ok("local".to_string()));
    }

    #[test]
    fn test_external_session_without_source_is_unavailable() {
        let e = external(Some("abc"), None);
        assert_eq!(block_on(e.fetch_content()), Err(EditorError::Unavailable));
    }

    #[test]
    fn test_external_revision_status() {
        let e = external(None, None);
        e.set_revision_id("r2".to_string(), Some("r1".to_string()));
        assert_eq!(e.synced_revision_id().as_deref(), Some("r1"));
        assert!(e.is_outdated());

        e.set_has_draft_on_external(true);
        e.clear_revision_status("r3".to_string(), Some("r3".to_string()));
        assert!(!e.is_outdated());
        assert!(!e.has_draft_on_external_untracked());
    }

    #[test]
    fn test_external_reset_clears_initialized() {
        let e = external(None, None);
        e.start("abc".to_string());
        assert!(e.is_initialized_untracked());
        e.reset();
        assert!(!e.is_initialized_untracked());
    }

    #[test]
    fn test_download_url() {
        let s = HttpCollaborativeSource::new("https://hackmd.example.com/".to_string());
        assert_eq!(s.download_url("a b"), "https://hackmd.example.com/a%20b/download");
    }

    #[test]
    fn test_surfaces_lookup_by_mode() {
        let surfaces = EditorSurfaces {
            primary: Some(PrimaryEditor::new(String::new())),
            external: None,
        };
        assert!(surfaces.get(EditorMode::Primary).is_some());
        assert!(surfaces.get(EditorMode::External).is_none());
    }
}

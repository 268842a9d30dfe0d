use crate::api::{ApiClient, EnvConfig, PageService};
use crate::components::{
    ExternalEditorPane, PageEditor, SaveControlsBar, StatusAlertBanner, ToastStack, Toasts,
};
use crate::drafts::{initial_markdown, DraftStore, LocalDrafts};
use crate::editor::{
    CollaborativeSource, EditorSurfaces, ExternalEditor, HttpCollaborativeSource, PrimaryEditor,
};
use crate::effects::{BrowserLocation, Notifier, PageLocation};
use crate::models::{EditorMode, Grant, PageIdentity, RevisionRef};
use crate::realtime::{self, RealtimeEvent};
use crate::state::{AppContext, SaveControls, SaveCoordinator, SaveCoordinatorState};
use crate::status::StatusNotifier;
use crate::util::new_socket_client_id;
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use std::rc::Rc;
use std::sync::Arc;
use strum::IntoStaticStr;
use wasm_bindgen::JsCast;

/// What the server rendered into `#content-main`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PageMetadata {
    pub page_id: Option<String>,
    pub revision_id: Option<String>,
    pub revision_created_at: Option<String>,
    pub revision_id_hackmd_synced: Option<String>,
    pub page_id_on_hackmd: Option<String>,
    pub has_draft_on_hackmd: bool,
    pub path: String,
    pub slack_channels: String,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl PageMetadata {
    /// `None` when the element carries no `data-path`.
    pub fn from_attributes(attr: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let path = attr("data-path")?;
        Some(Self {
            page_id: non_empty(attr("data-page-id")),
            revision_id: non_empty(attr("data-page-revision-id")),
            revision_created_at: non_empty(attr("data-page-revision-created")),
            revision_id_hackmd_synced: non_empty(attr("data-page-revision-id-hackmd-synced")),
            page_id_on_hackmd: non_empty(attr("data-page-id-on-hackmd")),
            // Present and non-empty means true.
            has_draft_on_hackmd: non_empty(attr("data-page-has-draft-on-hackmd")).is_some(),
            path,
            slack_channels: attr("data-slack-channels").unwrap_or_default(),
        })
    }

    pub fn identity(&self) -> PageIdentity {
        PageIdentity {
            page_id: self.page_id.clone(),
            path: self.path.clone(),
        }
    }

    pub fn revision(&self) -> Option<RevisionRef> {
        self.revision_id.clone().map(|revision_id| RevisionRef {
            revision_id,
            created_at: self.revision_created_at.clone(),
        })
    }
}

/// Initial selections of the save controls, from `#save-page-controls`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ControlsMetadata {
    pub grant: Grant,
    pub grant_group_id: Option<String>,
    pub grant_group_name: Option<String>,
}

impl ControlsMetadata {
    pub fn from_attributes(attr: impl Fn(&str) -> Option<String>) -> Self {
        let grant = attr("data-grant")
            .and_then(|g| g.trim().parse::<u8>().ok())
            .and_then(|g| Grant::try_from(g).ok())
            .unwrap_or_default();
        Self {
            grant,
            grant_group_id: non_empty(attr("data-grant-group")),
            grant_group_name: non_empty(attr("data-grant-group-name")),
        }
    }
}

/// DOM slots widgets can be mounted into. The string form is the element id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoStaticStr)]
pub(crate) enum Slot {
    #[strum(serialize = "page-editor")]
    PageEditor,
    #[strum(serialize = "page-editor-with-hackmd")]
    ExternalEditor,
    #[strum(serialize = "save-page-controls")]
    SaveControls,
    #[strum(serialize = "page-status-alert")]
    StatusAlert,
}

impl Slot {
    pub fn element_id(self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Requirement {
    /// Mounted whenever the element exists.
    Always,
    /// Needs a page path from `#content-main`.
    PagePath,
    /// Needs a page path and a configured collaborative editor.
    Collaborative,
}

pub(crate) static MOUNT_TABLE: [(Slot, Requirement); 4] = [
    (Slot::PageEditor, Requirement::PagePath),
    (Slot::ExternalEditor, Requirement::Collaborative),
    (Slot::SaveControls, Requirement::PagePath),
    (Slot::StatusAlert, Requirement::Always),
];

/// Slots to mount, in table order.
pub(crate) fn plan_mounts(
    has_element: impl Fn(&str) -> bool,
    has_path: bool,
    has_collaborative: bool,
) -> Vec<Slot> {
    MOUNT_TABLE
        .iter()
        .filter(|(_, req)| match req {
            Requirement::Always => true,
            Requirement::PagePath => has_path,
            Requirement::Collaborative => has_path && has_collaborative,
        })
        .map(|(slot, _)| *slot)
        .filter(|slot| has_element(slot.element_id()))
        .collect()
}

fn element_attr(doc: &web_sys::Document, id: &str, name: &str) -> Option<String> {
    doc.get_element_by_id(id)?.get_attribute(name)
}

fn mount_into<F, N>(doc: &web_sys::Document, slot: Slot, coordinator: &SaveCoordinator, f: F)
where
    F: FnOnce() -> N + 'static,
    N: IntoView + 'static,
{
    let Some(el) = doc
        .get_element_by_id(slot.element_id())
        .and_then(|e| e.dyn_into::<web_sys::HtmlElement>().ok())
    else {
        tracing::warn!(slot = slot.element_id(), "mount target disappeared");
        return;
    };
    let ctx = AppContext(coordinator.clone());
    leptos::mount::mount_to(el, move || {
        provide_context(ctx);
        f()
    })
    .forget();
    tracing::debug!(slot = slot.element_id(), "mounted");
}

fn current_hash() -> String {
    web_sys::window()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

/// Read the page, build the coordinator and mount every widget the page has a slot for.
pub(crate) fn start() {
    let config = EnvConfig::new();
    crate::logging::init(&config.log_level);

    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        tracing::error!("no document; nothing to mount");
        return;
    };

    let metadata = doc
        .get_element_by_id("content-main")
        .and_then(|el| PageMetadata::from_attributes(|name| el.get_attribute(name)));
    let has_path = metadata.is_some();
    let metadata = metadata.unwrap_or_default();

    let slots = plan_mounts(
        |id| doc.get_element_by_id(id).is_some(),
        has_path,
        config.hackmd_uri.is_some(),
    );
    tracing::info!(path = %metadata.path, ?slots, "bootstrapping page");

    let toasts = Toasts::new();
    mount_to_body(move || view! { <ToastStack toasts=toasts /> });

    let drafts = LocalDrafts;
    let raw = doc
        .get_element_by_id("raw-text-original")
        .and_then(|e| e.text_content())
        .unwrap_or_default();
    let markdown = initial_markdown(
        raw,
        metadata.revision_id.is_some(),
        drafts.find_draft(&metadata.path),
    );

    let primary = slots
        .contains(&Slot::PageEditor)
        .then(|| PrimaryEditor::new(markdown.clone()));
    let external = slots.contains(&Slot::ExternalEditor).then(|| {
        let source = config.hackmd_uri.clone().map(|uri| {
            Arc::new(HttpCollaborativeSource::new(uri)) as Arc<dyn CollaborativeSource>
        });
        ExternalEditor::new(
            markdown.clone(),
            metadata.revision_id.clone(),
            metadata.revision_id_hackmd_synced.clone(),
            metadata.page_id_on_hackmd.clone(),
            metadata.has_draft_on_hackmd,
            source,
        )
    });
    let status = slots.contains(&Slot::StatusAlert).then(|| {
        StatusNotifier::new(
            metadata.revision_id.clone(),
            metadata.revision_id_hackmd_synced.clone(),
            metadata.has_draft_on_hackmd,
        )
    });
    let controls = slots.contains(&Slot::SaveControls).then(|| {
        let c = ControlsMetadata::from_attributes(|name| {
            element_attr(&doc, Slot::SaveControls.element_id(), name)
        });
        SaveControls::new(
            c.grant,
            c.grant_group_id,
            c.grant_group_name,
            metadata.slack_channels.clone(),
        )
    });

    let mut api = ApiClient::new(config.api_url.clone());
    if let Some(token) = doc.body().and_then(|b| b.get_attribute("data-csrftoken")) {
        api.set_csrf_token(token);
    }

    let state = SaveCoordinatorState::new(
        metadata.identity(),
        metadata.revision(),
        metadata.revision_id_hackmd_synced.clone(),
        new_socket_client_id(),
    );
    let mut coordinator = SaveCoordinator::new(
        state,
        Arc::new(api) as Arc<dyn PageService>,
        Arc::new(drafts) as Arc<dyn DraftStore>,
        Arc::new(toasts) as Arc<dyn Notifier>,
        Arc::new(BrowserLocation) as Arc<dyn PageLocation>,
    )
    .with_editors(EditorSurfaces {
        primary,
        external: external.clone(),
    });
    if let Some(status) = status {
        coordinator = coordinator.with_status(status);
    }
    if let Some(controls) = controls {
        coordinator = coordinator.with_save_controls(controls);
    }

    coordinator.set_editor_mode(EditorMode::from_location_hash(&current_hash()));
    let on_hash = coordinator.clone();
    let _hash_listener = window_event_listener(ev::hashchange, move |_ev: web_sys::HashChangeEvent| {
        on_hash.set_editor_mode(EditorMode::from_location_hash(&current_hash()));
    });

    for slot in &slots {
        match slot {
            Slot::PageEditor => {
                if let Some(editor) = primary {
                    mount_into(&doc, *slot, &coordinator, move || {
                        view! { <PageEditor editor=editor /> }
                    });
                }
            }
            Slot::ExternalEditor => {
                if let (Some(editor), Some(uri)) = (external.clone(), config.hackmd_uri.clone()) {
                    mount_into(&doc, *slot, &coordinator, move || {
                        view! { <ExternalEditorPane editor=editor hackmd_uri=uri /> }
                    });
                }
            }
            Slot::SaveControls => {
                if let Some(controls) = controls {
                    mount_into(&doc, *slot, &coordinator, move || {
                        view! { <SaveControlsBar controls=controls /> }
                    });
                }
            }
            Slot::StatusAlert => {
                if let Some(status) = status {
                    mount_into(&doc, *slot, &coordinator, move || {
                        view! { <StatusAlertBanner status=status /> }
                    });
                }
            }
        }
    }

    if has_path {
        let on_event = coordinator.clone();
        realtime::connect(
            config.socket_url.clone(),
            Rc::new(move |event: RealtimeEvent| {
                let disposition = on_event.on_remote_event(&event);
                tracing::trace!(channel = %event.channel, ?disposition, "realtime event");
            }),
        );
    }
}

use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize, ButtonVariant};
use crate::editor::ExternalEditor;
use crate::state::AppContext;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::window_event_listener;
use serde::Deserialize;

#[derive(Deserialize)]
struct EditorMessage {
    operation: String,
    #[serde(default)]
    markdown: Option<String>,
}

/// Markdown carried by a `saveWithShortcut` message from the editor frame.
pub(crate) fn parse_external_message(data: &str) -> Option<String> {
    let msg: EditorMessage = serde_json::from_str(data).ok()?;
    if msg.operation != "saveWithShortcut" {
        return None;
    }
    msg.markdown
}

/// `scheme://host[:port]` of `uri`, the form `MessageEvent.origin` uses.
pub(crate) fn origin_of(uri: &str) -> &str {
    let Some(scheme_end) = uri.find("://") else {
        return uri.trim_end_matches('/');
    };
    let rest = &uri[scheme_end + 3..];
    match rest.find('/') {
        Some(i) => &uri[..scheme_end + 3 + i],
        None => uri,
    }
}

fn message_text(data: &wasm_bindgen::JsValue) -> Option<String> {
    data.as_string()
        .or_else(|| js_sys::JSON::stringify(data).ok().and_then(|s| s.as_string()))
}

/// What the pane shows.
///
/// The collaborative document is created server-side; a page without one
/// cannot be opened from here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PaneState {
    NotPrepared,
    Ready,
    Open { frame_url: String },
}

pub(crate) fn pane_state(base: &str, page_id_on_external: Option<&str>, started: bool) -> PaneState {
    match (page_id_on_external, started) {
        (None, _) => PaneState::NotPrepared,
        (Some(_), false) => PaneState::Ready,
        (Some(id), true) => PaneState::Open {
            frame_url: format!("{}/{}", base.trim_end_matches('/'), urlencoding::encode(id)),
        },
    }
}

#[component]
pub(crate) fn ExternalEditorPane(editor: ExternalEditor, hackmd_uri: String) -> impl IntoView {
    let AppContext(coordinator) = expect_context::<AppContext>();

    let expected_origin = origin_of(&hackmd_uri).to_string();
    let _listener = window_event_listener(ev::message, move |ev: web_sys::MessageEvent| {
        if ev.origin() != expected_origin {
            return;
        }
        let Some(markdown) = message_text(&ev.data()).and_then(|d| parse_external_message(&d))
        else {
            return;
        };
        let coordinator = coordinator.clone();
        spawn_local(async move {
            if let Err(e) = coordinator.save_with_shortcut(markdown).await {
                tracing::debug!(error = %e, "collaborative editor save failed");
            }
        });
    });

    let base = hackmd_uri.trim_end_matches('/').to_string();
    let start_editor = editor.clone();
    let on_start = move |_: web_sys::MouseEvent| {
        if let Some(id) = start_editor.page_id_on_external() {
            start_editor.start(id);
        }
    };

    let outdated = editor.clone();
    let draft = editor.clone();

    view! {
        <div data-name="ExternalEditorPane" class="flex flex-col gap-3">
            <Show when=move || outdated.is_outdated()>
                <Alert class="border-warning/40">
                    <AlertDescription>
                        "The collaborative document is based on an older revision."
                    </AlertDescription>
                </Alert>
            </Show>
            <Show when=move || draft.has_draft_on_external()>
                <div class="text-xs text-muted-foreground">
                    "Someone has unsaved changes in the collaborative editor."
                </div>
            </Show>
            {move || {
                let state = pane_state(
                    &base,
                    editor.page_id_on_external().as_deref(),
                    editor.is_initialized(),
                );
                match state {
                    PaneState::NotPrepared => {
                        view! {
                            <div class="rounded-md border border-dashed p-8 text-center text-sm text-muted-foreground">
                                "This page has no collaborative document yet."
                            </div>
                        }
                            .into_any()
                    }
                    PaneState::Ready => {
                        let on_start = on_start.clone();
                        view! {
                            <div class="flex items-center justify-center rounded-md border border-dashed p-8">
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    on:click=on_start
                                >
                                    "Start collaborative editing"
                                </Button>
                            </div>
                        }
                            .into_any()
                    }
                    PaneState::Open { frame_url } => {
                        view! {
                            <iframe class="h-[70vh] w-full rounded-md border" src=frame_url></iframe>
                        }
                            .into_any()
                    }
                }
            }}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_save_message() {
        let data = r##"{"operation":"saveWithShortcut","markdown":"# Hi"}"##;
        assert_eq!(parse_external_message(data).as_deref(), Some("# Hi"));
    }

    #[test]
    fn test_ignores_other_messages() {
        assert!(parse_external_message(r#"{"operation":"notifyBodyChanges","body":"x"}"#).is_none());
        assert!(parse_external_message(r#"{"operation":"saveWithShortcut"}"#).is_none());
        assert!(parse_external_message("not json").is_none());
    }

    #[test]
    fn test_pane_state() {
        let base = "https://hackmd.example.com/";
        assert_eq!(pane_state(base, None, false), PaneState::NotPrepared);
        assert_eq!(pane_state(base, None, true), PaneState::NotPrepared);
        assert_eq!(pane_state(base, Some("abc"), false), PaneState::Ready);
        assert_eq!(
            pane_state(base, Some("abc"), true),
            PaneState::Open {
                frame_url: "https://hackmd.example.com/abc".to_string()
            }
        );
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(origin_of("https://hackmd.example.com/"), "https://hackmd.example.com");
        assert_eq!(origin_of("http://localhost:3010/sub/path"), "http://localhost:3010");
        assert_eq!(origin_of("https://hackmd.example.com"), "https://hackmd.example.com");
    }
}

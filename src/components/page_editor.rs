use crate::editor::PrimaryEditor;
use crate::state::{AppContext, SaveCoordinator};
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

const DRAFT_DEBOUNCE_MS: i32 = 800;

/// Ctrl+S, or Cmd+S on macOS.
pub(crate) fn is_save_shortcut(key: &str, ctrl: bool, meta: bool) -> bool {
    (ctrl || meta) && key.eq_ignore_ascii_case("s")
}

/// Write the draft once typing pauses; a newer keystroke replaces the pending write.
fn schedule_draft(coordinator: SaveCoordinator, timer: StoredValue<Option<i32>>, content: String) {
    let Some(win) = web_sys::window() else {
        return;
    };
    if let Some(tid) = timer.get_value() {
        win.clear_timeout_with_handle(tid);
    }

    let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
        timer.set_value(None);
        coordinator.store_draft(&content);
    });
    let tid = win
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.unchecked_ref(),
            DRAFT_DEBOUNCE_MS,
        )
        .ok();
    timer.set_value(tid);
}

#[component]
pub(crate) fn PageEditor(editor: PrimaryEditor) -> impl IntoView {
    let AppContext(coordinator) = expect_context::<AppContext>();

    let draft_timer = StoredValue::new(None::<i32>);

    let on_input = {
        let coordinator = coordinator.clone();
        move |ev: web_sys::Event| {
            let Some(area) = ev
                .target()
                .and_then(|t| t.dyn_into::<web_sys::HtmlTextAreaElement>().ok())
            else {
                return;
            };
            let value = area.value();
            schedule_draft(coordinator.clone(), draft_timer, value.clone());
            editor.on_input(value);
        }
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if !is_save_shortcut(&ev.key(), ev.ctrl_key(), ev.meta_key()) {
            return;
        }
        // Keep the browser's "save page as" dialog away.
        ev.prevent_default();

        let coordinator = coordinator.clone();
        let content = editor.content_untracked();
        spawn_local(async move {
            if let Err(e) = coordinator.save_with_shortcut(content).await {
                tracing::debug!(error = %e, "shortcut save failed");
            }
        });
    };

    view! {
        <textarea
            data-name="PageEditor"
            class="min-h-[60vh] w-full resize-y rounded-md border border-input bg-background p-3 font-mono text-sm focus-visible:outline-none focus-visible:ring-2 focus-visible:ring-ring"
            spellcheck="false"
            prop:value=move || editor.markdown()
            on:input=on_input
            on:keydown=on_keydown
        ></textarea>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_shortcut_detection() {
        assert!(is_save_shortcut("s", true, false));
        assert!(is_save_shortcut("S", false, true));
        assert!(!is_save_shortcut("s", false, false));
        assert!(!is_save_shortcut("a", true, false));
    }
}

use crate::components::ui::{ToastCard, ToastViewport};
use crate::effects::{Notifier, ToastKind};
use leptos::prelude::*;
use wasm_bindgen::JsCast;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub message: Option<String>,
}

/// Queue of on-screen toasts. Each one removes itself after its kind's timeout.
#[derive(Clone, Copy)]
pub(crate) struct Toasts {
    items: RwSignal<Vec<Toast>>,
    next_id: RwSignal<u64>,
}

impl Toasts {
    pub fn new() -> Self {
        Self {
            items: RwSignal::new(vec![]),
            next_id: RwSignal::new(1),
        }
    }

    pub fn push(&self, kind: ToastKind, title: &str, message: Option<&str>) -> u64 {
        let id = self.next_id.get_untracked();
        self.next_id.set(id + 1);
        self.items.update(|items| {
            // Oldest on top.
            items.push(Toast {
                id,
                kind,
                title: title.to_string(),
                message: message.map(str::to_string),
            })
        });
        id
    }

    pub fn dismiss(&self, id: u64) {
        self.items.update(|items| items.retain(|t| t.id != id));
    }

    #[cfg(test)]
    pub fn items_untracked(&self) -> Vec<Toast> {
        self.items.get_untracked()
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for Toasts {
    fn notify(&self, kind: ToastKind, title: &str, message: Option<&str>) {
        let id = self.push(kind, title, message);

        let Some(win) = web_sys::window() else {
            return;
        };
        let toasts = *self;
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || toasts.dismiss(id));
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.unchecked_ref(),
            kind.timeout_ms(),
        );
    }
}

#[component]
pub(crate) fn ToastStack(toasts: Toasts) -> impl IntoView {
    view! {
        <ToastViewport>
            <For
                each=move || toasts.items.get()
                key=|t| t.id
                children=move |t: Toast| {
                    let tone = match t.kind {
                        ToastKind::Success => "border-success/40",
                        ToastKind::Error => "border-destructive/40 text-destructive",
                    };
                    let id = t.id;
                    view! {
                        <ToastCard class=tone>
                            <div class="flex items-start justify-between gap-2">
                                <div class="font-medium">{t.title}</div>
                                <button
                                    class="text-xs text-muted-foreground hover:text-foreground"
                                    on:click=move |_| toasts.dismiss(id)
                                >
                                    "×"
                                </button>
                            </div>
                            {t.message.map(|m| view! { <div class="mt-1 text-xs">{m}</div> })}
                        </ToastCard>
                    }
                }
            />
        </ToastViewport>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order_and_unique_ids() {
        let t = Toasts::new();
        let a = t.push(ToastKind::Success, "Saved successfully", None);
        let b = t.push(ToastKind::Error, "Error occurred", Some("boom"));
        assert_ne!(a, b);

        let items = t.items_untracked();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Saved successfully");
        assert_eq!(items[1].message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_dismiss_removes_only_that_toast() {
        let t = Toasts::new();
        let a = t.push(ToastKind::Success, "one", None);
        let b = t.push(ToastKind::Success, "two", None);
        t.dismiss(a);
        let items = t.items_untracked();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, b);
    }

    #[test]
    fn test_error_toasts_linger_longer() {
        assert!(ToastKind::Error.timeout_ms() > ToastKind::Success.timeout_ms());
    }
}

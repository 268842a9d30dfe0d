use wasm_bindgen::JsCast;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn timeout_ms(self) -> i32 {
        match self {
            Self::Success => 1_200,
            Self::Error => 3_000,
        }
    }
}

/// Transient user-facing notifications.
pub(crate) trait Notifier: Send + Sync {
    fn notify(&self, kind: ToastKind, title: &str, message: Option<&str>);

    fn success(&self, title: &str) {
        self.notify(ToastKind::Success, title, None);
    }

    fn error(&self, title: &str, message: &str) {
        self.notify(ToastKind::Error, title, Some(message));
    }
}

/// Page-level side effects outside the mounted widgets.
pub(crate) trait PageLocation: Send + Sync {
    /// Keep the fallback form's hidden `revision_id` in step with the last save.
    fn set_revision_field(&self, revision_id: &str);

    /// Full navigation; nothing on this page runs afterwards.
    fn navigate_to(&self, url: &str);
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserLocation;

impl PageLocation for BrowserLocation {
    fn set_revision_field(&self, revision_id: &str) {
        let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Ok(inputs) = doc.query_selector_all(r#"input[name="revision_id"]"#) else {
            return;
        };
        for i in 0..inputs.length() {
            if let Some(input) = inputs
                .item(i)
                .and_then(|n| n.dyn_into::<web_sys::HtmlInputElement>().ok())
            {
                input.set_value(revision_id);
            }
        }
    }

    fn navigate_to(&self, url: &str) {
        if let Some(win) = web_sys::window() {
            if let Err(e) = win.location().set_href(url) {
                tracing::error!(url, ?e, "navigation failed");
            }
        }
    }
}

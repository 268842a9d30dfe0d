pub mod ui;

mod external_editor;
mod page_editor;
mod save_controls;
mod status_alert;
mod toast;

pub(crate) use external_editor::ExternalEditorPane;
pub(crate) use page_editor::PageEditor;
pub(crate) use save_controls::SaveControlsBar;
pub(crate) use status_alert::StatusAlertBanner;
pub(crate) use toast::{ToastStack, Toasts};

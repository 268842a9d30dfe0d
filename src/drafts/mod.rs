mod page;

pub(crate) use page::{initial_markdown, DraftStore, LocalDrafts};

use crate::models::{Grant, SaveOptions};
use leptos::prelude::*;

/// Selections made in the save controls bar; the source of save options.
#[derive(Clone, Copy)]
pub(crate) struct SaveControls {
    pub grant: RwSignal<Grant>,
    pub grant_group_id: RwSignal<Option<String>>,
    pub grant_group_name: RwSignal<Option<String>>,
    pub slack_enabled: RwSignal<bool>,
    pub slack_channels: RwSignal<String>,
    pub overwrite_scopes_of_descendants: RwSignal<bool>,
}

impl SaveControls {
    pub fn new(
        grant: Grant,
        grant_group_id: Option<String>,
        grant_group_name: Option<String>,
        slack_channels: String,
    ) -> Self {
        Self {
            grant: RwSignal::new(grant),
            grant_group_id: RwSignal::new(grant_group_id),
            grant_group_name: RwSignal::new(grant_group_name),
            slack_enabled: RwSignal::new(false),
            slack_channels: RwSignal::new(slack_channels),
            overwrite_scopes_of_descendants: RwSignal::new(false),
        }
    }

    /// Options as currently selected. Session and sync flags are filled in by the coordinator.
    pub fn current_options(&self) -> SaveOptions {
        let grant = self.grant.get_untracked();
        let (grant_user_group_id, grant_user_group_name) = if grant == Grant::UserGroup {
            (
                self.grant_group_id.get_untracked(),
                self.grant_group_name.get_untracked(),
            )
        } else {
            (None, None)
        };

        SaveOptions {
            grant,
            grant_user_group_id,
            grant_user_group_name,
            is_slack_enabled: self.slack_enabled.get_untracked(),
            slack_channels: self.slack_channels.get_untracked(),
            ..Default::default()
        }
    }
}

use crate::components::ui::{Button, ButtonSize, Spinner};
use crate::models::{Grant, SubmitOptions};
use crate::state::{AppContext, SaveControls, SaveOutcome};
use leptos::prelude::*;
use leptos::task::spawn_local;

pub(crate) fn grant_label(grant: Grant) -> &'static str {
    match grant {
        Grant::Public => "Public",
        Grant::Restricted => "Anyone with the link",
        Grant::Specified => "Specified users",
        Grant::Owner => "Only me",
        Grant::UserGroup => "Only inside the group",
    }
}

const GRANTS: [Grant; 5] = [
    Grant::Public,
    Grant::Restricted,
    Grant::Specified,
    Grant::Owner,
    Grant::UserGroup,
];

#[component]
pub(crate) fn SaveControlsBar(controls: SaveControls) -> impl IntoView {
    let AppContext(coordinator) = expect_context::<AppContext>();
    let saving = RwSignal::new(false);

    let on_grant_change = move |ev: web_sys::Event| {
        let value = event_target_value(&ev);
        match value.parse::<u8>().map_err(|e| e.to_string()).and_then(Grant::try_from) {
            Ok(grant) => controls.grant.set(grant),
            Err(e) => tracing::warn!(%value, error = %e, "ignoring grant selection"),
        }
    };

    let on_submit = move |_: web_sys::MouseEvent| {
        if saving.get_untracked() {
            return;
        }
        saving.set(true);

        let coordinator = coordinator.clone();
        let submit = SubmitOptions {
            overwrite_scopes_of_descendants: controls.overwrite_scopes_of_descendants.get_untracked(),
        };
        spawn_local(async move {
            let result = coordinator.save_with_submit_button(submit).await;
            // On success the page is being replaced; keep the spinner.
            if !matches!(result, Ok(SaveOutcome::Navigated { .. })) {
                saving.set(false);
            }
        });
    };

    view! {
        <div data-name="SaveControlsBar" class="flex flex-wrap items-center gap-3">
            <label class="flex items-center gap-2 text-sm">
                <input
                    type="checkbox"
                    prop:checked=move || controls.slack_enabled.get()
                    on:change=move |ev| controls.slack_enabled.set(event_target_checked(&ev))
                />
                "Slack"
            </label>
            <input
                type="text"
                class="h-8 w-40 rounded-md border border-input bg-background px-2 text-sm"
                placeholder="#channel"
                prop:value=move || controls.slack_channels.get()
                on:input=move |ev| controls.slack_channels.set(event_target_value(&ev))
            />

            <select
                class="h-8 rounded-md border border-input bg-background px-2 text-sm"
                on:change=on_grant_change
            >
                {GRANTS
                    .into_iter()
                    .map(|g| {
                        let value = u8::from(g).to_string();
                        view! {
                            <option value=value selected=move || controls.grant.get() == g>
                                {grant_label(g)}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
            <Show when=move || controls.grant.get() == Grant::UserGroup>
                <span class="text-xs text-muted-foreground">
                    {move || controls.grant_group_name.get().unwrap_or_default()}
                </span>
            </Show>

            <label class="flex items-center gap-2 text-sm">
                <input
                    type="checkbox"
                    prop:checked=move || controls.overwrite_scopes_of_descendants.get()
                    on:change=move |ev| {
                        controls.overwrite_scopes_of_descendants.set(event_target_checked(&ev))
                    }
                />
                "Apply scope to descendants"
            </label>

            <Button size=ButtonSize::Sm attr:disabled=move || saving.get() on:click=on_submit>
                <Show when=move || saving.get()>
                    <Spinner />
                </Show>
                "Update"
            </Button>
        </div>
    }
}

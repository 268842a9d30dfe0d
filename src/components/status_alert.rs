use crate::components::ui::{Alert, AlertDescription, AlertTitle};
use crate::status::{StatusAlert, StatusNotifier};
use leptos::prelude::*;

pub(crate) fn alert_message(alert: &StatusAlert) -> String {
    match alert {
        StatusAlert::PageUpdatedElsewhere { by: Some(name) } => {
            format!("{name} has updated this page.")
        }
        StatusAlert::PageUpdatedElsewhere { by: None } => "This page has been updated.".to_string(),
        StatusAlert::DraftOnExternal => {
            "There are unsaved changes in the collaborative editor.".to_string()
        }
        StatusAlert::ExternalOutOfSync => {
            "The collaborative editor holds an older revision.".to_string()
        }
    }
}

#[component]
pub(crate) fn StatusAlertBanner(status: StatusNotifier) -> impl IntoView {
    view! {
        {move || {
            status
                .alert()
                .map(|alert| {
                    let updated = matches!(alert, StatusAlert::PageUpdatedElsewhere { .. });
                    view! {
                        <Alert class="border-warning/40">
                            <AlertTitle>{alert_message(&alert)}</AlertTitle>
                            <Show when=move || updated>
                                <AlertDescription>
                                    <a
                                        class="underline underline-offset-4"
                                        href="javascript:location.reload();"
                                    >
                                        "Load latest"
                                    </a>
                                </AlertDescription>
                            </Show>
                        </Alert>
                    }
                })
        }}
    }
}

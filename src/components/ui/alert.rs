use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm flex items-start justify-between gap-3"}
    clx! {AlertTitle, h4, "mb-1 font-medium tracking-tight leading-none"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
    clx! {ToastCard, div, "pointer-events-auto w-80 rounded-md border bg-card px-4 py-3 text-sm shadow-md"}
    clx! {ToastViewport, div, "pointer-events-none fixed right-4 top-4 z-50 flex flex-col gap-2"}
}

pub use components::*;

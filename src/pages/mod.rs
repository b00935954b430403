use crate::api::DOCX_MIME;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, Label, Separator, Spinner,
};
use crate::editor::RichTextEditor;
use crate::outline::{alert_on_err, SectionTree};
use crate::state::{AppContext, EditorState};
use crate::tree::find_node;
use crate::util::{
    download_bytes, export_file_name, read_file_bytes, report_number_from_location,
    REPORT_NUMBER_PARAM,
};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;
use wasm_bindgen::JsCast;

fn load_report(state: EditorState, report_number: String) {
    state.report_number.set(Some(report_number.clone()));
    let req = state.begin_load(format!("Loading report {report_number}…"));
    let api_client = state.api_client.get_untracked();

    spawn_local(async move {
        let result = api_client
            .fetch_report(&report_number)
            .await
            .map_err(|e| format!("Failed to load report {report_number}: {e}"));
        state.finish_load(req, result);
    });
}

fn upload_file(state: EditorState, file: web_sys::File) {
    let name = file.name();
    let req = state.begin_load(format!("Uploading {name}…"));
    let api_client = state.api_client.get_untracked();

    spawn_local(async move {
        let result = match read_file_bytes(&file).await {
            Ok(bytes) => api_client
                .upload_document(&name, bytes)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        let ok = result.is_ok();
        if state.finish_load(req, result) && ok {
            // An uploaded document is no longer the report the session started from.
            state.report_number.set(None);
        }
    });
}

fn export_tree(state: EditorState) {
    if state.exporting.get_untracked() {
        return;
    }
    state.exporting.set(true);
    state.error.set(None);

    let sections = state.sections.get_untracked();
    let file_name = export_file_name(state.report_number.get_untracked().as_deref());
    let api_client = state.api_client.get_untracked();

    spawn_local(async move {
        let result = api_client
            .export_document(&sections)
            .await
            .map_err(|e| e.to_string())
            .and_then(|bytes| download_bytes(&bytes, &file_name, DOCX_MIME));
        if let Err(e) = result {
            log::error!("export failed: {e}");
            state.error.set(Some(e));
        }
        state.exporting.set(false);
    });
}

#[component]
fn Toolbar() -> impl IntoView {
    let state = expect_context::<AppContext>().0;

    let on_file = move |ev: ev::Event| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let file = input.files().and_then(|list| list.get(0));
        // Allow picking the same file again.
        input.set_value("");
        if let Some(file) = file {
            upload_file(state, file);
        }
    };

    let clipboard_label = move || {
        state.clipboard.get().map(|c| {
            let title = state
                .sections
                .with(|xs| find_node(xs, &c.id).map(|n| n.title.clone()))
                .unwrap_or_default();
            format!("{}: {}", c.mode, title)
        })
    };

    let op = move |label: &'static str, f: fn(&EditorState) -> crate::state::EditorResult<()>| {
        view! {
            <Button
                variant=ButtonVariant::Outline
                size=ButtonSize::Sm
                class="px-2 text-xs"
                on:click=move |_| alert_on_err(f(&state))
            >
                {label}
            </Button>
        }
    };

    view! {
        <div class="flex flex-col gap-2">
            <input
                type="file"
                accept=".docx"
                class="text-xs file:mr-2 file:rounded-md file:border file:bg-transparent file:px-2 file:py-1"
                on:change=on_file
                disabled=move || state.loading.get()
            />

            <div class="flex flex-wrap items-center gap-2">
                <Button size=ButtonSize::Sm on:click=move |_| {
                    state.add_section();
                }>
                    "+ Section"
                </Button>
                <Button
                    variant=ButtonVariant::Secondary
                    size=ButtonSize::Sm
                    on:click=move |_| alert_on_err(state.add_sub_section())
                >
                    "+ Sub"
                </Button>
                <Button
                    variant=ButtonVariant::Outline
                    size=ButtonSize::Sm
                    attr:disabled=move || state.exporting.get()
                    on:click=move |_| export_tree(state)
                >
                    <Show when=move || state.exporting.get()>
                        <Spinner />
                    </Show>
                    "Export"
                </Button>
            </div>

            <Separator />

            <div class="flex flex-wrap items-center gap-1">
                {op("Cut", EditorState::cut)}
                {op("Copy", EditorState::copy)}
                {op("Paste", EditorState::paste)}
                {op("Rename", EditorState::begin_rename)}
                {op("Delete", EditorState::delete_selected)}
            </div>

            {move || clipboard_label().map(|l| view! {
                <div class="text-xs text-muted-foreground truncate">{l}</div>
            })}
        </div>
    }
}

#[component]
fn RenameBar() -> impl IntoView {
    let state = expect_context::<AppContext>().0;

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        alert_on_err(state.apply_rename());
    };

    view! {
        <Show when=move || state.rename_open.get()>
            <form class="mt-2 flex flex-col gap-2" on:submit=on_submit>
                <Label html_for="rename-section" class="text-xs">"Title"</Label>
                <div class="flex items-center gap-2">
                    <Input id="rename-section" bind_value=state.rename_text autofocus=true />
                    <Button size=ButtonSize::Sm>"Save"</Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        on:click=move |ev: web_sys::MouseEvent| {
                            // Buttons default to submit inside a form.
                            ev.prevent_default();
                            state.cancel_rename();
                        }
                    >
                        "Cancel"
                    </Button>
                </div>
            </form>
        </Show>
    }
}

#[component]
fn EditorPane() -> impl IntoView {
    let state = expect_context::<AppContext>().0;

    view! {
        <div class="flex-1 overflow-auto p-5">
            {move || match state.selected_id.get() {
                Some(id) => {
                    // Commits are bound to the tree the pane was opened on.
                    let generation = state.tree_generation.get_untracked();
                    let on_commit = Callback::new(move |(id, html): (String, String)| {
                        state.update_content(generation, &id, html);
                    });
                    // Read untracked: the editor owns the content until it commits.
                    let initial = state
                        .sections
                        .with_untracked(|xs| find_node(xs, &id).map(|n| n.content_html.clone()))
                        .unwrap_or_default();
                    view! {
                        <h2 class="text-lg font-semibold">
                            {move || state.selected().map(|n| n.title).unwrap_or_default()}
                        </h2>
                        <div class="mt-3 rounded-md border bg-background p-2">
                            <RichTextEditor section_id=id initial_html=initial on_commit=on_commit />
                        </div>
                    }
                    .into_any()
                }
                None => view! {
                    <h3 class="text-sm text-muted-foreground">"Select a section"</h3>
                }
                .into_any(),
            }}
        </div>
    }
}

#[component]
pub fn EditorPage() -> impl IntoView {
    let state = expect_context::<AppContext>().0;
    let query = use_query_map();

    // Auto-load once per session from `?reportNumber=` or `#reportNumber=`.
    let report_number = query
        .get_untracked()
        .get(REPORT_NUMBER_PARAM)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(report_number_from_location);
    if let Some(n) = report_number {
        load_report(state, n);
    }

    view! {
        <div class="flex h-[92vh]">
            <aside class="w-[28%] min-w-[260px] overflow-auto border-r p-3">
                <Toolbar />
                <RenameBar />

                <Show when=move || state.loading.get()>
                    <div class="mt-2 flex items-center gap-2 text-xs text-muted-foreground">
                        <Spinner />
                        {move || state.loading_label.get()}
                    </div>
                </Show>

                {move || state.error.get().map(|e| view! {
                    <Alert class="mt-2 border-destructive/30">
                        <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                    </Alert>
                })}

                <SectionTree />
            </aside>

            <EditorPane />
        </div>
    }
}

use crate::models::{ClipboardMode, DropPosition};
use crate::state::{AppContext, ContextMenu, EditorResult, EditorState};
use crate::tree::find_node;
use crate::util::alert;
use icons::{ChevronDown, ChevronRight};
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use wasm_bindgen::JsCast;

const DRAG_MIME: &str = "text/plain";

/// Surface a toolbar precondition failure as a blocking alert.
pub(crate) fn alert_on_err<T>(result: EditorResult<T>) {
    if let Err(e) = result {
        log::debug!("action rejected: {e}");
        alert(&e.to_string());
    }
}

fn drop_position_for(ev: &web_sys::DragEvent) -> DropPosition {
    ev.current_target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(|el| el.get_bounding_client_rect())
        .map(|rect| DropPosition::from_offset(ev.client_y() as f64 - rect.top(), rect.height()))
        .unwrap_or(DropPosition::Inside)
}

pub(crate) fn row_class(selected: bool, cut: bool, hint: Option<DropPosition>) -> String {
    let mut class = String::from(
        "flex items-center gap-1 rounded-md px-1 py-1 text-sm cursor-pointer select-none border-y-2 border-transparent",
    );
    if selected {
        class.push_str(" bg-accent text-accent-foreground");
    } else {
        class.push_str(" hover:bg-accent/50");
    }
    if cut {
        class.push_str(" opacity-50");
    }
    match hint {
        Some(DropPosition::Before) => class.push_str(" border-t-primary"),
        Some(DropPosition::After) => class.push_str(" border-b-primary"),
        Some(DropPosition::Inside) => class.push_str(" ring-1 ring-primary bg-primary/10"),
        None => {}
    }
    class
}

#[component]
pub fn SectionTree() -> impl IntoView {
    let state = expect_context::<AppContext>().0;

    let root_ids = Memo::new(move |_| {
        state
            .sections
            .with(|xs| xs.iter().map(|n| n.id.clone()).collect::<Vec<_>>())
    });

    view! {
        <div class="mt-2">
            {move || {
                if root_ids.get().is_empty() {
                    view! {
                        <div class="text-xs text-muted-foreground">
                            "No sections. Upload a document or add a section."
                        </div>
                    }
                    .into_any()
                } else {
                    view! {
                        <ul role="tree" class="space-y-0.5">
                            <For
                                each=move || root_ids.get()
                                key=|id| id.clone()
                                children=move |id| view! { <SectionNode section_id=id depth=0 /> }
                            />
                        </ul>
                    }
                    .into_any()
                }
            }}
            <SectionContextMenu />
        </div>
    }
}

#[component]
pub fn SectionNode(section_id: String, depth: usize) -> impl IntoView {
    let state = expect_context::<AppContext>().0;
    let id_sv = StoredValue::new(section_id);

    let summary = Memo::new(move |_| {
        let id = id_sv.get_value();
        state.sections.with(|xs| {
            find_node(xs, &id).map(|n| {
                (
                    n.title.clone(),
                    n.children.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
                )
            })
        })
    });

    let title = move || summary.get().map(|(t, _)| t).unwrap_or_default();
    let child_ids = move || summary.get().map(|(_, c)| c).unwrap_or_default();
    let has_children = move || summary.with(|s| s.as_ref().is_some_and(|(_, c)| !c.is_empty()));
    let expanded = move || state.is_expanded(&id_sv.get_value());

    let is_selected = move || state.selected_id.get().as_deref() == Some(id_sv.get_value().as_str());
    let is_cut = move || {
        state.clipboard.with(|c| {
            c.as_ref()
                .is_some_and(|c| c.mode == ClipboardMode::Cut && c.id == id_sv.get_value())
        })
    };
    let hint = move || {
        state.drop_hint.with(|h| {
            h.as_ref()
                .filter(|(id, _)| *id == id_sv.get_value())
                .map(|(_, p)| *p)
        })
    };

    let indent_px = depth * 16;

    view! {
        <li role="treeitem" aria-expanded=move || has_children().then(|| expanded().to_string())>
            <div
                class=move || row_class(is_selected(), is_cut(), hint())
                style=format!("padding-left: {}px", indent_px + 4)
                draggable="true"
                on:click=move |_| state.select(&id_sv.get_value())
                on:contextmenu=move |ev: web_sys::MouseEvent| {
                    ev.prevent_default();
                    let id = id_sv.get_value();
                    state.select(&id);
                    state.context_menu.set(Some(ContextMenu {
                        section_id: id,
                        x: ev.client_x(),
                        y: ev.client_y(),
                    }));
                }
                on:dragstart=move |ev: web_sys::DragEvent| {
                    if let Some(dt) = ev.data_transfer() {
                        let _ = dt.set_data(DRAG_MIME, &id_sv.get_value());
                        dt.set_effect_allowed("move");
                    }
                    state.context_menu.set(None);
                }
                on:dragover=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    if let Some(dt) = ev.data_transfer() {
                        dt.set_drop_effect("move");
                    }
                    let next = Some((id_sv.get_value(), drop_position_for(&ev)));
                    if state.drop_hint.get_untracked() != next {
                        state.drop_hint.set(next);
                    }
                }
                on:dragleave=move |_ev: web_sys::DragEvent| {
                    let id = id_sv.get_value();
                    if state.drop_hint.with_untracked(|h| h.as_ref().is_some_and(|(h, _)| *h == id)) {
                        state.drop_hint.set(None);
                    }
                }
                on:dragend=move |_ev: web_sys::DragEvent| state.drop_hint.set(None)
                on:drop=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    state.drop_hint.set(None);

                    let dragged_id = ev
                        .data_transfer()
                        .and_then(|dt| dt.get_data(DRAG_MIME).ok())
                        .unwrap_or_default();
                    if dragged_id.trim().is_empty() {
                        return;
                    }

                    let target_id = id_sv.get_value();
                    if let Err(e) = state.drop_section(&dragged_id, &target_id, drop_position_for(&ev)) {
                        log::warn!("drop of {dragged_id} onto {target_id} ignored: {e}");
                    }
                }
            >
                <button
                    class="flex h-5 w-5 shrink-0 items-center justify-center text-muted-foreground hover:text-foreground disabled:opacity-0"
                    disabled=move || !has_children()
                    title=move || if expanded() { "Collapse" } else { "Expand" }
                    on:click=move |ev| {
                        ev.stop_propagation();
                        state.toggle_expanded(&id_sv.get_value());
                    }
                >
                    {move || {
                        if expanded() {
                            view! { <ChevronDown class="size-4" /> }.into_any()
                        } else {
                            view! { <ChevronRight class="size-4" /> }.into_any()
                        }
                    }}
                </button>
                <span class="min-w-0 flex-1 truncate">{title}</span>
            </div>

            {move || {
                if !(expanded() && has_children()) {
                    return ().into_any();
                }
                view! {
                    <ul role="group" class="space-y-0.5">
                        <For
                            each=child_ids
                            key=|id| id.clone()
                            children=move |id| view! { <SectionNode section_id=id depth=depth + 1 /> }
                        />
                    </ul>
                }
                .into_any()
            }}
        </li>
    }
}

/// Run a toolbar action and close the context menu.
fn menu_action(state: EditorState, f: impl Fn(&EditorState) -> EditorResult<()>) {
    state.context_menu.set(None);
    alert_on_err(f(&state));
}

#[component]
pub fn SectionContextMenu() -> impl IntoView {
    let state = expect_context::<AppContext>().0;

    let click_handle = window_event_listener(ev::click, move |_| {
        if state.context_menu.get_untracked().is_some() {
            state.context_menu.set(None);
        }
    });
    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" && state.context_menu.get_untracked().is_some() {
            state.context_menu.set(None);
        }
    });
    on_cleanup(move || {
        click_handle.remove();
        key_handle.remove();
    });

    let item_class = "flex w-full items-center rounded-sm px-2 py-1.5 text-left text-sm hover:bg-accent hover:text-accent-foreground";

    view! {
        {move || {
            let Some(menu) = state.context_menu.get() else {
                return ().into_any();
            };
            let can_paste = state.clipboard.with(|c| c.is_some());

            view! {
                <div
                    role="menu"
                    data-section-id=menu.section_id
                    class="fixed z-50 min-w-[180px] rounded-md border bg-card p-1 shadow-lg"
                    style=format!("left: {}px; top: {}px", menu.x, menu.y)
                    on:click=move |ev| ev.stop_propagation()
                    on:contextmenu=move |ev| ev.prevent_default()
                >
                    <button role="menuitem" class=item_class
                        on:click=move |_| menu_action(state, |s| s.add_sub_section().map(|_| ()))
                    >"Add Sub Section"</button>
                    <div class="my-1 h-px bg-border" role="separator"></div>
                    <button role="menuitem" class=item_class
                        on:click=move |_| menu_action(state, EditorState::cut)
                    >"Cut"</button>
                    <button role="menuitem" class=item_class
                        on:click=move |_| menu_action(state, EditorState::copy)
                    >"Copy"</button>
                    <button role="menuitem" class=item_class
                        class:opacity-50=!can_paste
                        on:click=move |_| menu_action(state, EditorState::paste)
                    >"Paste"</button>
                    <div class="my-1 h-px bg-border" role="separator"></div>
                    <button role="menuitem" class=item_class
                        on:click=move |_| menu_action(state, EditorState::begin_rename)
                    >"Rename"</button>
                    <button role="menuitem" class=format!("{item_class} text-destructive")
                        on:click=move |_| menu_action(state, EditorState::delete_selected)
                    >"Delete"</button>
                </div>
            }
            .into_any()
        }}
    }
}

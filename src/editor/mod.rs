use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// Jodit is loaded by index.html; the editor widget itself stays in JS.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Jodit)]
    #[derive(Clone)]
    type Jodit;

    #[wasm_bindgen(static_method_of = Jodit, js_name = make, catch)]
    fn make(element: &web_sys::HtmlElement, options: &JsValue) -> Result<Jodit, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn value(this: &Jodit) -> String;

    #[wasm_bindgen(method, setter = value)]
    fn set_value(this: &Jodit, value: &str);

    #[wasm_bindgen(method, getter)]
    fn events(this: &Jodit) -> JoditEvents;

    #[wasm_bindgen(method, catch)]
    fn destruct(this: &Jodit) -> Result<(), JsValue>;

    type JoditEvents;

    #[wasm_bindgen(method)]
    fn on(this: &JoditEvents, name: &str, handler: &js_sys::Function);
}

pub(crate) fn jodit_options() -> serde_json::Value {
    serde_json::json!({
        "readonly": false,
        "height": 600,
        "uploader": { "insertImageAsBase64URI": true },
    })
}

fn jodit_available() -> bool {
    web_sys::window()
        .map(|w| js_sys::Reflect::has(&w, &"Jodit".into()).unwrap_or(false))
        .unwrap_or(false)
}

struct Mounted {
    editor: Jodit,
    _on_blur: Closure<dyn FnMut()>,
}

/// WYSIWYG pane for one section.
///
/// `on_commit` receives `(section_id, html)` on blur and when the pane is torn down.
/// Without the Jodit script the pane degrades to a plain `contenteditable` block.
#[component]
pub fn RichTextEditor(
    section_id: String,
    initial_html: String,
    #[prop(into)] on_commit: Callback<(String, String)>,
) -> impl IntoView {
    let host_ref: NodeRef<html::Div> = NodeRef::new();
    let mounted: StoredValue<Option<Mounted>, LocalStorage> = StoredValue::new_local(None);
    let fallback: RwSignal<bool> = RwSignal::new(false);

    let id_sv = StoredValue::new(section_id);
    let initial_sv = StoredValue::new(initial_html);

    Effect::new(move |_| {
        let Some(host) = host_ref.get() else {
            return;
        };
        if mounted.with_value(|m| m.is_some()) || fallback.get_untracked() {
            return;
        }

        let initial = initial_sv.get_value();
        host.set_inner_html(&initial);

        if !jodit_available() {
            log::warn!("Jodit is not loaded, using plain contenteditable");
            fallback.set(true);
            return;
        }

        let options = js_sys::JSON::parse(&jodit_options().to_string()).unwrap_or(JsValue::NULL);
        let host_el: &web_sys::HtmlElement = host.unchecked_ref();
        match Jodit::make(host_el, &options) {
            Ok(editor) => {
                editor.set_value(&initial);

                let editor_for_blur = editor.clone();
                let on_blur = Closure::<dyn FnMut()>::new(move || {
                    // Jodit may still fire blur while being torn down.
                    if let Some(id) = id_sv.try_get_value() {
                        on_commit.run((id, editor_for_blur.value()));
                    }
                });
                editor.events().on("blur", on_blur.as_ref().unchecked_ref());

                mounted.set_value(Some(Mounted {
                    editor,
                    _on_blur: on_blur,
                }));
            }
            Err(e) => {
                log::error!("failed to start Jodit: {e:?}");
                fallback.set(true);
            }
        }
    });

    on_cleanup(move || {
        let id = id_sv.try_get_value();
        let initial = initial_sv.try_get_value().unwrap_or_default();
        let _ = mounted.try_update_value(|m| {
            if let Some(m) = m.take() {
                // Skip untouched content.
                let html = m.editor.value();
                if let Some(id) = id.filter(|_| html != initial) {
                    on_commit.run((id, html));
                }
                if let Err(e) = m.editor.destruct() {
                    log::warn!("Jodit destruct failed: {e:?}");
                }
            }
        });
    });

    // Jodit inserts its own container next to the host, keep both inside one wrapper.
    view! {
        <div class="rich-text-editor">
            <div
                node_ref=host_ref
                class=move || {
                    if fallback.get() {
                        "prose min-h-[60vh] rounded-md border border-input bg-background p-3 text-sm outline-none"
                    } else {
                        "min-h-[60vh]"
                    }
                }
                contenteditable=move || fallback.get().then_some("true")
                on:blur=move |_| {
                    if !fallback.get_untracked() {
                        return;
                    }
                    if let Some(host) = host_ref.get_untracked() {
                        on_commit.run((id_sv.get_value(), host.inner_html()));
                    }
                }
            ></div>
        </div>
    }
}

use crate::api::ApiClient;
use crate::pages::EditorPage;
use crate::state::{AppContext, EditorState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(EditorState::new(ApiClient::from_env())));

    // `reportNumber` may arrive in the query or the fragment; both land on the editor.
    view! {
        <Router>
            <Routes fallback=|| view! { <EditorPage /> }>
                <Route path=path!("") view=EditorPage />
            </Routes>
        </Router>
    }
}

use crate::api::ApiClient;
use crate::models::{Clipboard, ClipboardMode, DropPosition, Section};
use crate::tree::{
    append_child, collect_ids, contains_node, find_node, move_node, reassign_ids, remove_node,
    update_node, TreeError,
};
use crate::util::new_section_id;
use leptos::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Precondition failures of the editing toolbar. The message is shown as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum EditorError {
    #[error("Select a node")]
    NoSelection,
    #[error("Select a parent")]
    NoParent,
    #[error("Select a destination")]
    NoDestination,
    #[error("Nothing to paste")]
    EmptyClipboard,
    #[error("Cannot paste a section into itself")]
    PasteIntoSelf,
}

pub(crate) type EditorResult<T> = Result<T, EditorError>;

/// Right-click menu anchored at client coordinates.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ContextMenu {
    pub section_id: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy)]
pub(crate) struct EditorState {
    pub api_client: RwSignal<ApiClient>,

    pub sections: RwSignal<Vec<Section>>,
    pub selected_id: RwSignal<Option<String>>,

    /// Rename bar.
    pub rename_open: RwSignal<bool>,
    pub rename_text: RwSignal<String>,

    pub clipboard: RwSignal<Option<Clipboard>>,

    /// Every node starts expanded; this only records the collapsed ones.
    pub collapsed: RwSignal<HashSet<String>>,

    pub context_menu: RwSignal<Option<ContextMenu>>,

    /// Drag-and-drop feedback: row currently hovered and where the drop would land.
    pub drop_hint: RwSignal<Option<(String, DropPosition)>>,

    /// Report the session was loaded from (drives the export file name).
    pub report_number: RwSignal<Option<String>>,

    pub loading: RwSignal<bool>,
    pub loading_label: RwSignal<String>,
    pub exporting: RwSignal<bool>,
    pub error: RwSignal<Option<String>>,

    /// Load guard: responses for an older request id are dropped.
    pub load_request_id: RwSignal<u64>,

    /// Bumped on every tree replacement; content commits from an older tree are dropped.
    pub tree_generation: RwSignal<u64>,
}

impl EditorState {
    pub fn new(api_client: ApiClient) -> Self {
        Self {
            api_client: RwSignal::new(api_client),
            sections: RwSignal::new(vec![]),
            selected_id: RwSignal::new(None),
            rename_open: RwSignal::new(false),
            rename_text: RwSignal::new(String::new()),
            clipboard: RwSignal::new(None),
            collapsed: RwSignal::new(HashSet::new()),
            context_menu: RwSignal::new(None),
            drop_hint: RwSignal::new(None),
            report_number: RwSignal::new(None),
            loading: RwSignal::new(false),
            loading_label: RwSignal::new(String::new()),
            exporting: RwSignal::new(false),
            error: RwSignal::new(None),
            load_request_id: RwSignal::new(0),
            tree_generation: RwSignal::new(0),
        }
    }

    /// Apply `f` to a working copy of the tree; the signal is written only on success.
    fn edit<T>(&self, f: impl FnOnce(&mut Vec<Section>) -> EditorResult<T>) -> EditorResult<T> {
        let mut next = self.sections.get_untracked();
        let out = f(&mut next)?;
        self.sections.set(next);
        Ok(out)
    }

    /// Selected id, only if it still exists in the tree.
    fn selected_untracked(&self) -> Option<String> {
        let id = self.selected_id.get_untracked()?;
        self.sections
            .with_untracked(|xs| find_node(xs, &id).is_some())
            .then_some(id)
    }

    /// Section shown in the editor pane.
    pub fn selected(&self) -> Option<Section> {
        let id = self.selected_id.get()?;
        self.sections.with(|xs| find_node(xs, &id).cloned())
    }

    pub fn select(&self, id: &str) {
        if self.selected_id.get_untracked().as_deref() == Some(id) {
            return;
        }
        log::debug!("select {id}");
        self.selected_id.set(Some(id.to_string()));
        self.rename_open.set(false);
    }

    pub fn replace_tree(&self, tree: Vec<Section>) {
        let mut ids = vec![];
        collect_ids(&tree, &mut ids);
        let unique = ids.iter().collect::<HashSet<_>>().len();
        if unique != ids.len() {
            log::warn!("loaded tree has {} duplicate section ids", ids.len() - unique);
        }
        log::debug!("tree replaced ({} sections)", ids.len());
        // Close the editor pane before the old tree goes away.
        self.selected_id.set(None);
        self.rename_open.set(false);
        self.tree_generation.update(|g| *g = g.wrapping_add(1));
        self.sections.set(tree);
        self.clipboard.set(None);
        self.collapsed.set(HashSet::new());
        self.context_menu.set(None);
        self.drop_hint.set(None);
    }

    /// Start a network load; returns the id the response must present to be applied.
    pub fn begin_load(&self, label: String) -> u64 {
        let id = self.load_request_id.get_untracked().wrapping_add(1);
        self.load_request_id.set(id);
        self.loading_label.set(label);
        self.loading.set(true);
        self.error.set(None);
        id
    }

    /// Apply a load result unless a newer load has started since.
    pub fn finish_load(&self, request_id: u64, result: Result<Vec<Section>, String>) -> bool {
        if self.load_request_id.get_untracked() != request_id {
            log::debug!("dropping stale load response {request_id}");
            return false;
        }
        match result {
            Ok(tree) => self.replace_tree(tree),
            Err(e) => {
                log::warn!("load failed: {e}");
                self.error.set(Some(e));
            }
        }
        self.loading.set(false);
        true
    }

    pub fn add_section(&self) -> String {
        let node = Section::new(new_section_id(), "New Section", 1);
        let id = node.id.clone();
        self.sections.update(|xs| xs.push(node));
        log::debug!("added section {id}");
        id
    }

    pub fn add_sub_section(&self) -> EditorResult<String> {
        let parent_id = self.selected_untracked().ok_or(EditorError::NoParent)?;
        let node = Section::new(new_section_id(), "New Sub Section", 1);
        let id = node.id.clone();

        self.edit(|xs| {
            if append_child(xs, &parent_id, node) {
                Ok(())
            } else {
                Err(EditorError::NoParent)
            }
        })?;
        self.set_expanded(&parent_id, true);
        log::debug!("added sub section {id} under {parent_id}");
        Ok(id)
    }

    pub fn begin_rename(&self) -> EditorResult<()> {
        let id = self.selected_untracked().ok_or(EditorError::NoSelection)?;
        let title = self
            .sections
            .with_untracked(|xs| find_node(xs, &id).map(|n| n.title.clone()))
            .unwrap_or_default();
        self.rename_text.set(title);
        self.rename_open.set(true);
        Ok(())
    }

    pub fn apply_rename(&self) -> EditorResult<()> {
        let id = self.selected_untracked().ok_or(EditorError::NoSelection)?;
        let title = self.rename_text.get_untracked();
        self.edit(|xs| {
            update_node(xs, &id, |n| n.title = title);
            Ok(())
        })?;
        self.rename_open.set(false);
        Ok(())
    }

    pub fn cancel_rename(&self) {
        self.rename_open.set(false);
    }

    /// Store editor HTML on the section it was opened for.
    ///
    /// `generation` is the tree generation the editor was opened against.
    pub fn update_content(&self, generation: u64, id: &str, html: String) {
        if self.tree_generation.get_untracked() != generation {
            log::debug!("dropping content for {id} from replaced tree {generation}");
            return;
        }
        let unchanged = self
            .sections
            .with_untracked(|xs| find_node(xs, id).map(|n| n.content_html == html))
            .unwrap_or(true);
        if unchanged {
            return;
        }
        self.sections.update(|xs| {
            update_node(xs, id, |n| n.content_html = html);
        });
    }

    fn stash(&self, mode: ClipboardMode) -> EditorResult<()> {
        let id = self.selected_untracked().ok_or(EditorError::NoSelection)?;
        log::debug!("{mode} {id}");
        self.clipboard.set(Some(Clipboard { mode, id }));
        Ok(())
    }

    pub fn cut(&self) -> EditorResult<()> {
        self.stash(ClipboardMode::Cut)
    }

    pub fn copy(&self) -> EditorResult<()> {
        self.stash(ClipboardMode::Copy)
    }

    /// Append the clipboard section as the last child of the selected one.
    ///
    /// Cut moves the subtree and keeps its ids. Copy clones it with fresh ids.
    pub fn paste(&self) -> EditorResult<()> {
        let dest = self.selected_untracked().ok_or(EditorError::NoDestination)?;
        let clip = self.clipboard.get_untracked().ok_or(EditorError::EmptyClipboard)?;

        self.edit(|xs| {
            let source = find_node(xs, &clip.id)
                .cloned()
                .ok_or(EditorError::EmptyClipboard)?;

            let node = match clip.mode {
                ClipboardMode::Cut => {
                    if contains_node(&source, &dest) {
                        return Err(EditorError::PasteIntoSelf);
                    }
                    remove_node(xs, &clip.id).ok_or(EditorError::EmptyClipboard)?
                }
                ClipboardMode::Copy => {
                    let mut node = source;
                    reassign_ids(&mut node, &mut new_section_id);
                    node
                }
            };

            if append_child(xs, &dest, node) {
                Ok(())
            } else {
                Err(EditorError::NoDestination)
            }
        })?;

        log::debug!("pasted ({}) {} into {dest}", clip.mode, clip.id);
        self.clipboard.set(None);
        self.set_expanded(&dest, true);
        Ok(())
    }

    pub fn delete_selected(&self) -> EditorResult<()> {
        let id = self.selected_untracked().ok_or(EditorError::NoSelection)?;
        let removed = self.edit(|xs| remove_node(xs, &id).ok_or(EditorError::NoSelection))?;

        if let Some(clip) = self.clipboard.get_untracked() {
            if contains_node(&removed, &clip.id) {
                self.clipboard.set(None);
            }
        }
        let mut gone = vec![];
        collect_ids(std::slice::from_ref(&removed), &mut gone);
        if self.collapsed.with_untracked(|c| gone.iter().any(|id| c.contains(id))) {
            self.collapsed.update(|c| {
                for id in &gone {
                    c.remove(id);
                }
            });
        }
        self.selected_id.set(None);
        self.rename_open.set(false);
        log::debug!("deleted {id}");
        Ok(())
    }

    pub fn drop_section(
        &self,
        dragged_id: &str,
        target_id: &str,
        position: DropPosition,
    ) -> Result<(), TreeError> {
        let mut next = self.sections.get_untracked();
        move_node(&mut next, dragged_id, target_id, position)?;
        self.sections.set(next);
        if position == DropPosition::Inside {
            self.set_expanded(target_id, true);
        }
        log::debug!("moved {dragged_id} {position:?} {target_id}");
        Ok(())
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.collapsed.with(|c| !c.contains(id))
    }

    pub fn set_expanded(&self, id: &str, expanded: bool) {
        let is_collapsed = self.collapsed.with_untracked(|c| c.contains(id));
        if expanded == !is_collapsed {
            return;
        }
        self.collapsed.update(|c| {
            if expanded {
                c.remove(id);
            } else {
                c.insert(id.to_string());
            }
        });
    }

    pub fn toggle_expanded(&self, id: &str) {
        let expanded = self.collapsed.with_untracked(|c| !c.contains(id));
        self.set_expanded(id, !expanded);
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub EditorState);

#[cfg(test)]
mod tests {
    use super::*;
    use leptos::reactive::owner::Owner;

    fn sec(id: &str, level: u32, children: Vec<Section>) -> Section {
        Section {
            id: id.to_string(),
            title: format!("Title {id}"),
            level,
            content_html: "<p></p>".to_string(),
            children,
        }
    }

    fn with_state(f: impl FnOnce(EditorState)) {
        let owner = Owner::new();
        owner.with(|| {
            let state = EditorState::new(ApiClient::new("http://localhost:8080".to_string()));
            state.replace_tree(vec![
                sec("a", 1, vec![sec("a1", 2, vec![]), sec("a2", 2, vec![])]),
                sec("b", 1, vec![]),
            ]);
            f(state);
        });
    }

    fn ids(state: &EditorState) -> Vec<String> {
        let mut out = vec![];
        state.sections.with_untracked(|xs| collect_ids(xs, &mut out));
        out
    }

    fn node(state: &EditorState, id: &str) -> Option<Section> {
        state.sections.with_untracked(|xs| find_node(xs, id).cloned())
    }

    #[test]
    fn test_actions_without_selection_fail_with_alert_messages() {
        with_state(|s| {
            assert_eq!(s.add_sub_section(), Err(EditorError::NoParent));
            assert_eq!(s.begin_rename(), Err(EditorError::NoSelection));
            assert_eq!(s.cut(), Err(EditorError::NoSelection));
            assert_eq!(s.copy(), Err(EditorError::NoSelection));
            assert_eq!(s.paste(), Err(EditorError::NoDestination));
            assert_eq!(s.delete_selected(), Err(EditorError::NoSelection));
            assert_eq!(EditorError::NoParent.to_string(), "Select a parent");
            assert_eq!(EditorError::EmptyClipboard.to_string(), "Nothing to paste");
        });
    }

    #[test]
    fn test_add_section_appends_root() {
        with_state(|s| {
            let id = s.add_section();
            let n = node(&s, &id).expect("new section exists");
            assert_eq!(n.title, "New Section");
            assert_eq!(n.level, 1);
            assert_eq!(n.content_html, "<p></p>");
            assert_eq!(s.sections.get_untracked().last().map(|n| n.id.clone()), Some(id));
        });
    }

    #[test]
    fn test_add_sub_section_under_selected() {
        with_state(|s| {
            s.select("a1");
            s.toggle_expanded("a1");
            assert!(!s.is_expanded("a1"));

            let id = s.add_sub_section().expect("selected parent exists");
            let parent = node(&s, "a1").expect("a1 exists");
            assert_eq!(parent.children.len(), 1);
            assert_eq!(parent.children[0].id, id);
            assert_eq!(parent.children[0].title, "New Sub Section");
            assert_eq!(parent.children[0].level, 3);
            assert!(s.is_expanded("a1"));
        });
    }

    #[test]
    fn test_rename_updates_title_and_leaves_siblings() {
        with_state(|s| {
            s.select("a1");
            s.begin_rename().expect("selection exists");
            assert!(s.rename_open.get_untracked());
            assert_eq!(s.rename_text.get_untracked(), "Title a1");

            s.rename_text.set("Scope".to_string());
            s.apply_rename().expect("selection exists");

            assert_eq!(node(&s, "a1").map(|n| n.title), Some("Scope".to_string()));
            assert_eq!(node(&s, "a2").map(|n| n.title), Some("Title a2".to_string()));
            assert!(!s.rename_open.get_untracked());
            assert_eq!(s.selected().map(|n| n.title), Some("Scope".to_string()));
        });
    }

    #[test]
    fn test_update_content_targets_given_section() {
        with_state(|s| {
            s.select("b");
            let generation = s.tree_generation.get_untracked();
            s.update_content(generation, "a2", "<p>body</p>".to_string());
            assert_eq!(node(&s, "a2").map(|n| n.content_html), Some("<p>body</p>".to_string()));
            assert_eq!(node(&s, "b").map(|n| n.content_html), Some("<p></p>".to_string()));

            // Unknown id is a no-op.
            s.update_content(generation, "ghost", "<p>x</p>".to_string());
            assert_eq!(ids(&s), vec!["a", "a1", "a2", "b"]);
        });
    }

    #[test]
    fn test_cut_then_paste_moves_node() {
        with_state(|s| {
            s.select("a1");
            s.cut().expect("selection exists");
            s.select("b");
            s.paste().expect("paste should succeed");

            let a = node(&s, "a").expect("a exists");
            assert_eq!(a.children.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(), vec!["a2"]);
            let b = node(&s, "b").expect("b exists");
            assert_eq!(b.children.len(), 1);
            assert_eq!(b.children[0].id, "a1");
            assert_eq!(b.children[0].level, 2);
            assert!(s.clipboard.get_untracked().is_none());
            assert_eq!(s.paste(), Err(EditorError::EmptyClipboard));
        });
    }

    #[test]
    fn test_copy_then_paste_duplicates_with_fresh_ids() {
        with_state(|s| {
            s.select("a");
            s.copy().expect("selection exists");
            s.select("b");
            s.paste().expect("paste should succeed");

            let all = ids(&s);
            let unique: HashSet<&String> = all.iter().collect();
            assert_eq!(all.len(), 7);
            assert_eq!(unique.len(), all.len());

            let a = node(&s, "a").expect("source stays in place");
            assert_eq!(a.children.len(), 2);

            let b = node(&s, "b").expect("b exists");
            let clone = &b.children[0];
            assert_eq!(clone.title, "Title a");
            assert_eq!(clone.level, 2);
            assert_eq!(clone.children.len(), 2);
            assert_eq!(clone.children[0].level, 3);
            assert!(clone.id.starts_with("n_"));
        });
    }

    #[test]
    fn test_cut_paste_into_own_subtree_is_rejected() {
        with_state(|s| {
            s.select("a");
            s.cut().expect("selection exists");
            s.select("a2");
            assert_eq!(s.paste(), Err(EditorError::PasteIntoSelf));
            assert_eq!(ids(&s), vec!["a", "a1", "a2", "b"]);
            assert!(s.clipboard.get_untracked().is_some());
        });
    }

    #[test]
    fn test_cut_replaces_copy() {
        with_state(|s| {
            s.select("a1");
            s.copy().expect("selection exists");
            s.select("a2");
            s.cut().expect("selection exists");
            assert_eq!(
                s.clipboard.get_untracked(),
                Some(Clipboard {
                    mode: ClipboardMode::Cut,
                    id: "a2".to_string()
                })
            );
        });
    }

    #[test]
    fn test_delete_clears_selection_and_stale_clipboard() {
        with_state(|s| {
            s.select("a1");
            s.copy().expect("selection exists");
            s.select("a");
            s.delete_selected().expect("selection exists");

            assert_eq!(ids(&s), vec!["b"]);
            assert!(s.selected_id.get_untracked().is_none());
            assert!(s.clipboard.get_untracked().is_none());
        });
    }

    #[test]
    fn test_drop_section_moves_and_expands_target() {
        with_state(|s| {
            s.toggle_expanded("b");
            s.drop_section("a2", "b", DropPosition::Inside)
                .expect("drop should succeed");
            assert_eq!(node(&s, "b").map(|n| n.children.len()), Some(1));
            assert!(s.is_expanded("b"));

            assert_eq!(
                s.drop_section("a", "a1", DropPosition::After),
                Err(TreeError::IntoOwnSubtree)
            );
            assert_eq!(ids(&s), vec!["a", "a1", "b", "a2"]);
        });
    }

    #[test]
    fn test_stale_load_response_is_dropped() {
        with_state(|s| {
            let first = s.begin_load("Loading…".to_string());
            let second = s.begin_load("Loading…".to_string());

            assert!(!s.finish_load(first, Ok(vec![sec("old", 1, vec![])])));
            assert!(s.loading.get_untracked());

            assert!(s.finish_load(second, Err("Failed to load report (500): boom".to_string())));
            assert!(!s.loading.get_untracked());
            assert_eq!(ids(&s), vec!["a", "a1", "a2", "b"]);
            assert!(s.error.get_untracked().is_some());
        });
    }

    #[test]
    fn test_load_replaces_tree_and_resets_selection() {
        with_state(|s| {
            s.select("a");
            s.copy().expect("selection exists");
            let req = s.begin_load("Loading…".to_string());
            assert!(s.finish_load(req, Ok(vec![sec("x", 1, vec![])])));
            assert_eq!(ids(&s), vec!["x"]);
            assert!(s.selected_id.get_untracked().is_none());
            assert!(s.clipboard.get_untracked().is_none());
            assert!(s.error.get_untracked().is_none());
        });
    }

    #[test]
    fn test_commit_from_replaced_tree_is_dropped() {
        with_state(|s| {
            let req = s.begin_load("Loading report 7…".to_string());
            assert!(s.finish_load(
                req,
                Ok(vec![Section {
                    content_html: "<p>old report</p>".to_string(),
                    ..sec("s1", 1, vec![])
                }])
            ));
            s.select("s1");
            let opened_on = s.tree_generation.get_untracked();

            let req = s.begin_load("Uploading new.docx…".to_string());
            assert!(s.finish_load(
                req,
                Ok(vec![Section {
                    content_html: "<p>fresh upload</p>".to_string(),
                    ..sec("s1", 1, vec![])
                }])
            ));

            // Teardown commit of the pane opened on the previous tree.
            s.update_content(opened_on, "s1", "<p>old report edited</p>".to_string());
            assert_eq!(
                node(&s, "s1").map(|n| n.content_html),
                Some("<p>fresh upload</p>".to_string())
            );

            let current = s.tree_generation.get_untracked();
            assert_ne!(current, opened_on);
            s.update_content(current, "s1", "<p>edited</p>".to_string());
            assert_eq!(node(&s, "s1").map(|n| n.content_html), Some("<p>edited</p>".to_string()));
        });
    }

    #[test]
    fn test_delete_prunes_collapsed_ids() {
        with_state(|s| {
            s.toggle_expanded("a");
            s.toggle_expanded("a1");
            s.toggle_expanded("b");
            s.select("a");
            s.delete_selected().expect("selection exists");

            let collapsed = s.collapsed.get_untracked();
            assert_eq!(collapsed.len(), 1);
            assert!(collapsed.contains("b"));
        });
    }

    #[test]
    fn test_begin_load_records_label() {
        with_state(|s| {
            s.begin_load("Uploading new.docx…".to_string());
            assert_eq!(s.loading_label.get_untracked(), "Uploading new.docx…");
            assert!(s.loading.get_untracked());
        });
    }
}

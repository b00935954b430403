use crate::models::{DropPosition, Section};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub(crate) enum TreeError {
    #[error("section {0} not found")]
    NotFound(String),
    #[error("a section cannot be moved into itself")]
    IntoOwnSubtree,
}

pub(crate) fn find_node<'a>(nodes: &'a [Section], id: &str) -> Option<&'a Section> {
    for n in nodes {
        if n.id == id {
            return Some(n);
        }
        if let Some(found) = find_node(&n.children, id) {
            return Some(found);
        }
    }
    None
}

/// Apply `f` to the section with `id`. Returns false when no such section exists.
pub(crate) fn update_node(nodes: &mut [Section], id: &str, f: impl FnOnce(&mut Section)) -> bool {
    fn walk(nodes: &mut [Section], id: &str, f: &mut Option<impl FnOnce(&mut Section)>) -> bool {
        for n in nodes.iter_mut() {
            if n.id == id {
                if let Some(f) = f.take() {
                    f(n);
                }
                return true;
            }
            if walk(&mut n.children, id, f) {
                return true;
            }
        }
        false
    }

    walk(nodes, id, &mut Some(f))
}

/// Detach the section with `id` (and its subtree) from wherever it lives.
pub(crate) fn remove_node(nodes: &mut Vec<Section>, id: &str) -> Option<Section> {
    if let Some(idx) = nodes.iter().position(|n| n.id == id) {
        return Some(nodes.remove(idx));
    }
    nodes
        .iter_mut()
        .find_map(|n| remove_node(&mut n.children, id))
}

/// True when `node` is `id` or one of its ancestors.
pub(crate) fn contains_node(node: &Section, id: &str) -> bool {
    node.id == id || node.children.iter().any(|c| contains_node(c, id))
}

pub(crate) fn relevel(node: &mut Section, level: u32) {
    node.level = level;
    for c in node.children.iter_mut() {
        relevel(c, level + 1);
    }
}

pub(crate) fn reassign_ids(node: &mut Section, next_id: &mut impl FnMut() -> String) {
    node.id = next_id();
    for c in node.children.iter_mut() {
        reassign_ids(c, next_id);
    }
}

/// Push `child` as the last child of `parent_id`, re-levelled below the parent.
pub(crate) fn append_child(nodes: &mut [Section], parent_id: &str, mut child: Section) -> bool {
    update_node(nodes, parent_id, move |p| {
        relevel(&mut child, p.level + 1);
        p.children.push(child);
    })
}

/// Insert `node` next to `target_id` in the target's own sibling list.
pub(crate) fn insert_sibling(
    nodes: &mut Vec<Section>,
    target_id: &str,
    node: Section,
    after: bool,
) -> bool {
    fn walk(nodes: &mut Vec<Section>, target_id: &str, node: &mut Option<Section>, after: bool) -> bool {
        if let Some(idx) = nodes.iter().position(|n| n.id == target_id) {
            let level = nodes[idx].level;
            if let Some(mut n) = node.take() {
                relevel(&mut n, level);
                let at = if after { idx + 1 } else { idx };
                nodes.insert(at, n);
            }
            return true;
        }
        nodes
            .iter_mut()
            .any(|n| walk(&mut n.children, target_id, node, after))
    }

    walk(nodes, target_id, &mut Some(node), after)
}

/// Drag-and-drop move. The tree is left untouched on error.
pub(crate) fn move_node(
    nodes: &mut Vec<Section>,
    dragged_id: &str,
    target_id: &str,
    position: DropPosition,
) -> Result<(), TreeError> {
    let dragged = find_node(nodes, dragged_id)
        .ok_or_else(|| TreeError::NotFound(dragged_id.to_string()))?;
    if find_node(nodes, target_id).is_none() {
        return Err(TreeError::NotFound(target_id.to_string()));
    }
    if contains_node(dragged, target_id) {
        return Err(TreeError::IntoOwnSubtree);
    }

    let node = remove_node(nodes, dragged_id)
        .ok_or_else(|| TreeError::NotFound(dragged_id.to_string()))?;

    // Target cannot vanish here: it is not inside the removed subtree.
    let placed = match position {
        DropPosition::Before => insert_sibling(nodes, target_id, node, false),
        DropPosition::After => insert_sibling(nodes, target_id, node, true),
        DropPosition::Inside => append_child(nodes, target_id, node),
    };

    if placed {
        Ok(())
    } else {
        Err(TreeError::NotFound(target_id.to_string()))
    }
}

/// Every id in pre-order. Used to check uniqueness and to prune collapsed state.
pub(crate) fn collect_ids(nodes: &[Section], out: &mut Vec<String>) {
    for n in nodes {
        out.push(n.id.clone());
        collect_ids(&n.children, out);
    }
}

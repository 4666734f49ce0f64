//! Path-indexed catalog tree with selection that survives refreshes.
//!
//! The tree owns a bidirectional index: `handle → node` for the view and
//! `path → handle` for restoring the selection after a new document
//! arrives. Both maps are rebuilt from scratch on every sync; nothing is
//! patched incrementally.
//!
//! Handles are never reused across unrelated nodes. `populate` hands out
//! fresh handles for the whole document, while `refresh` carries over the
//! handle of every path that still exists, so the view's selection and
//! expansion state stay attached to the same logical node.

use std::collections::HashMap;

use serde_json::Value;

use super::CatalogNode;
use crate::error::{CatalogError, CatalogResult};

/// Opaque, stable identifier of a displayed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Identity tokens from the root down to a node.
pub type NodePath = Vec<String>;

/// How a sync touched the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Every row was replaced.
    Rebuilt,
    /// Row identities were kept; only the selected node's panels need a redraw.
    InPlace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub mode: SyncMode,
    pub selected: NodeHandle,
    /// Whether the previous selection was found again.
    pub restored: bool,
}

/// A node as stored in the index. `node.children` is always empty; the
/// structure lives in `children`.
#[derive(Debug, Clone)]
struct IndexedNode {
    node: CatalogNode,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
    path: NodePath,
}

#[derive(Debug, Default)]
pub struct CatalogTree {
    nodes: HashMap<NodeHandle, IndexedNode>,
    /// Handles in pre-order, which is also display and search order.
    order: Vec<NodeHandle>,
    paths: HashMap<NodePath, NodeHandle>,
    root: Option<NodeHandle>,
    selected: Option<NodeHandle>,
    selected_path: Option<NodePath>,
    next_handle: u64,
}

impl CatalogTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole population with `document`.
    ///
    /// The previous selection is restored when its path still resolves;
    /// otherwise the root is selected. On a malformed document the current
    /// population is left untouched.
    pub fn populate(&mut self, document: &Value) -> CatalogResult<SyncOutcome> {
        let root = CatalogNode::from_document(document)?;
        self.rebuild(root, &HashMap::new(), SyncMode::Rebuilt)
    }

    /// Sync with `document`, keeping row identities when the selection
    /// survives.
    ///
    /// When the selected path resolves in the new document, every surviving
    /// path keeps its handle and the outcome is [`SyncMode::InPlace`].
    /// Otherwise this behaves like [`CatalogTree::populate`].
    pub fn refresh(&mut self, document: &Value) -> CatalogResult<SyncOutcome> {
        let root = CatalogNode::from_document(document)?;
        let keeps_selection = self
            .selected_path
            .as_deref()
            .map_or(false, |path| find_by_path(&root, path).is_some());
        if !keeps_selection {
            log::debug!("Selected path gone after refresh; rebuilding catalog tree");
            return self.rebuild(root, &HashMap::new(), SyncMode::Rebuilt);
        }
        let previous = std::mem::take(&mut self.paths);
        self.rebuild(root, &previous, SyncMode::InPlace)
    }

    /// Drop every node and the selection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
        self.paths.clear();
        self.root = None;
        self.selected = None;
        self.selected_path = None;
    }

    fn rebuild(
        &mut self,
        root: CatalogNode,
        reuse: &HashMap<NodePath, NodeHandle>,
        mode: SyncMode,
    ) -> CatalogResult<SyncOutcome> {
        self.nodes.clear();
        self.order.clear();
        self.paths.clear();

        let mut stack: Vec<(CatalogNode, Option<NodeHandle>, NodePath)> =
            vec![(root, None, Vec::new())];
        while let Some((mut node, parent, parent_path)) = stack.pop() {
            let mut path = parent_path;
            path.push(node.token());

            // Duplicate sibling tokens: the first one in document order owns
            // the path slot; later ones get handles but no path entry.
            let owns_path = !self.paths.contains_key(&path);
            let handle = match reuse.get(&path) {
                Some(&h) if owns_path => h,
                _ => self.fresh_handle(),
            };
            if owns_path {
                self.paths.insert(path.clone(), handle);
            } else {
                log::warn!("Duplicate catalog path {}", path.join(" / "));
            }

            let children = std::mem::take(&mut node.children);
            for child in children.into_iter().rev() {
                stack.push((child, Some(handle), path.clone()));
            }

            if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
                p.children.push(handle);
            }
            self.order.push(handle);
            self.nodes.insert(
                handle,
                IndexedNode {
                    node,
                    parent,
                    children: Vec::new(),
                    path,
                },
            );
        }
        self.root = self.order.first().copied();

        let restored = self
            .selected_path
            .as_ref()
            .and_then(|path| self.paths.get(path).copied());
        let selected = restored
            .or(self.root)
            .ok_or_else(|| CatalogError::MalformedDocument("empty catalog".into()))?;
        self.select(selected);
        log::debug!(
            "Catalog tree synced ({:?}): {} nodes, selection {}",
            mode,
            self.order.len(),
            if restored.is_some() { "restored" } else { "reset to root" }
        );

        Ok(SyncOutcome {
            mode: if restored.is_some() { mode } else { SyncMode::Rebuilt },
            selected,
            restored: restored.is_some(),
        })
    }

    fn fresh_handle(&mut self) -> NodeHandle {
        let h = NodeHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    /// Select `handle`, returning its node. Unknown handles are ignored.
    pub fn select(&mut self, handle: NodeHandle) -> Option<&CatalogNode> {
        let entry = self.nodes.get(&handle)?;
        self.selected = Some(handle);
        self.selected_path = Some(entry.path.clone());
        Some(&entry.node)
    }

    pub fn selected(&self) -> Option<NodeHandle> {
        self.selected
    }

    pub fn selected_node(&self) -> Option<&CatalogNode> {
        self.selected.and_then(|h| self.node(h))
    }

    pub fn selected_path(&self) -> Option<&[String]> {
        self.selected_path.as_deref()
    }

    pub fn root(&self) -> Option<NodeHandle> {
        self.root
    }

    /// The node behind `handle`, without its children.
    pub fn node(&self, handle: NodeHandle) -> Option<&CatalogNode> {
        self.nodes.get(&handle).map(|e| &e.node)
    }

    pub fn children(&self, handle: NodeHandle) -> &[NodeHandle] {
        self.nodes
            .get(&handle)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(&handle).and_then(|e| e.parent)
    }

    pub fn path(&self, handle: NodeHandle) -> Option<&[String]> {
        self.nodes.get(&handle).map(|e| e.path.as_slice())
    }

    pub fn handle_for_path(&self, path: &[String]) -> Option<NodeHandle> {
        self.paths.get(path).copied()
    }

    /// Handles in index (pre-order) order.
    pub fn handles(&self) -> &[NodeHandle] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// First node, in index order, whose name or summary contains `query`
    /// case-insensitively.
    pub fn find_by_query(&self, query: &str) -> Option<NodeHandle> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.order.iter().copied().find(|h| {
            self.nodes.get(h).map_or(false, |e| {
                e.node.name.to_lowercase().contains(&needle)
                    || e.node.summary.to_lowercase().contains(&needle)
            })
        })
    }
}

/// Walk `document` along `path`, matching identity tokens.
///
/// An empty path resolves to the root. When siblings share a token, each
/// candidate is tried in document order before giving up.
pub fn find_by_path<'a>(document: &'a CatalogNode, path: &[String]) -> Option<&'a CatalogNode> {
    if path.is_empty() {
        return Some(document);
    }
    let mut stack: Vec<(&CatalogNode, usize)> = vec![(document, 0)];
    while let Some((node, depth)) = stack.pop() {
        if node.token() != path[depth] {
            continue;
        }
        if depth + 1 == path.len() {
            return Some(node);
        }
        for child in node.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(tokens: &[&str]) -> NodePath {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn universe(summary: &str) -> Value {
        json!({
            "category": "universe", "name": "Alpha", "summary": "root",
            "children": [
                {"category": "galaxy", "name": "Milky", "summary": summary, "children": [
                    {"category": "system", "name": "Sol", "summary": "home system"},
                    {"category": "system", "name": "Kepler", "summary": "far away"}
                ]},
                {"category": "galaxy", "name": "Andromeda", "summary": "neighbour"}
            ]
        })
    }

    #[test]
    fn populate_selects_root_first_time() {
        let mut tree = CatalogTree::new();
        let outcome = tree.populate(&universe("spiral")).unwrap();
        assert_eq!(outcome.mode, SyncMode::Rebuilt);
        assert!(!outcome.restored);
        assert_eq!(Some(outcome.selected), tree.root());
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.selected_path(), Some(path(&["universe:Alpha"]).as_slice()));
    }

    #[test]
    fn index_order_is_preorder() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let names: Vec<_> = tree
            .handles()
            .iter()
            .map(|h| tree.node(*h).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["Alpha", "Milky", "Sol", "Kepler", "Andromeda"]);
    }

    #[test]
    fn refresh_keeps_selected_handle() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let sol = tree
            .handle_for_path(&path(&["universe:Alpha", "galaxy:Milky", "system:Sol"]))
            .unwrap();
        tree.select(sol);

        let outcome = tree.refresh(&universe("barred spiral")).unwrap();
        assert_eq!(outcome.mode, SyncMode::InPlace);
        assert!(outcome.restored);
        assert_eq!(outcome.selected, sol);
        assert_eq!(tree.selected(), Some(sol));

        let milky = tree.handle_for_path(&path(&["universe:Alpha", "galaxy:Milky"])).unwrap();
        assert_eq!(tree.node(milky).unwrap().summary, "barred spiral");
    }

    #[test]
    fn refresh_with_new_structure_keeps_surviving_handles() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let sol_path = path(&["universe:Alpha", "galaxy:Milky", "system:Sol"]);
        let andromeda_path = path(&["universe:Alpha", "galaxy:Andromeda"]);
        let sol = tree.handle_for_path(&sol_path).unwrap();
        let andromeda = tree.handle_for_path(&andromeda_path).unwrap();
        let old_handles = tree.handles().to_vec();
        tree.select(sol);

        let grown = json!({
            "category": "universe", "name": "Alpha", "summary": "root",
            "children": [
                {"category": "galaxy", "name": "Milky", "summary": "spiral", "children": [
                    {"category": "system", "name": "Sol", "summary": "home system"},
                    {"category": "system", "name": "Vega", "summary": "new arrival"}
                ]},
                {"category": "galaxy", "name": "Andromeda", "summary": "neighbour"}
            ]
        });
        let outcome = tree.refresh(&grown).unwrap();
        assert_eq!(outcome.mode, SyncMode::InPlace);
        assert!(outcome.restored);
        assert_eq!(tree.selected(), Some(sol));
        assert_eq!(tree.handle_for_path(&sol_path), Some(sol));
        assert_eq!(tree.handle_for_path(&andromeda_path), Some(andromeda));

        let vega = tree
            .handle_for_path(&path(&["universe:Alpha", "galaxy:Milky", "system:Vega"]))
            .unwrap();
        assert!(!old_handles.contains(&vega));
        assert!(tree
            .handle_for_path(&path(&["universe:Alpha", "galaxy:Milky", "system:Kepler"]))
            .is_none());
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn populate_restores_selection_with_new_handle() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let kepler_path = path(&["universe:Alpha", "galaxy:Milky", "system:Kepler"]);
        let old = tree.handle_for_path(&kepler_path).unwrap();
        tree.select(old);

        let outcome = tree.populate(&universe("spiral")).unwrap();
        assert!(outcome.restored);
        assert_eq!(tree.selected_node().unwrap().name, "Kepler");
        assert_eq!(tree.handle_for_path(&kepler_path), Some(outcome.selected));
        assert_ne!(outcome.selected, old);
    }

    #[test]
    fn refresh_falls_back_to_root_when_selection_vanishes() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let andromeda = tree
            .handle_for_path(&path(&["universe:Alpha", "galaxy:Andromeda"]))
            .unwrap();
        tree.select(andromeda);

        let shrunk = json!({"category": "universe", "name": "Alpha"});
        let outcome = tree.refresh(&shrunk).unwrap();
        assert_eq!(outcome.mode, SyncMode::Rebuilt);
        assert!(!outcome.restored);
        assert_eq!(tree.selected(), tree.root());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn malformed_document_leaves_tree_untouched() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let before = tree.selected();

        assert!(tree.populate(&json!("just a string")).is_err());
        assert!(tree.refresh(&json!({"name": "no category"})).is_err());
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.selected(), before);
    }

    #[test]
    fn structure_links_are_consistent() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let root = tree.root().unwrap();
        let kids = tree.children(root).to_vec();
        assert_eq!(kids.len(), 2);
        for kid in kids {
            assert_eq!(tree.parent(kid), Some(root));
        }
        assert!(tree.node(root).unwrap().children.is_empty());
    }

    #[test]
    fn query_matches_name_or_summary() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        let hit = tree.find_by_query("KEPLER").unwrap();
        assert_eq!(tree.node(hit).unwrap().name, "Kepler");
        let by_summary = tree.find_by_query("home").unwrap();
        assert_eq!(tree.node(by_summary).unwrap().name, "Sol");
        assert!(tree.find_by_query("nothing like it").is_none());
        assert!(tree.find_by_query("   ").is_none());
    }

    #[test]
    fn query_returns_first_in_index_order() {
        let mut tree = CatalogTree::new();
        tree.populate(&universe("spiral")).unwrap();
        // "a" appears in Alpha, Milky's summary, and more; root comes first.
        assert_eq!(tree.find_by_query("a"), tree.root());
    }

    #[test]
    fn find_by_path_walks_tokens() {
        let doc = CatalogNode::from_document(&universe("spiral")).unwrap();
        let hit = find_by_path(&doc, &path(&["universe:Alpha", "galaxy:Milky"])).unwrap();
        assert_eq!(hit.name, "Milky");
        assert!(find_by_path(&doc, &path(&["universe:Alpha", "galaxy:Nope"])).is_none());
        assert!(find_by_path(&doc, &path(&["universe:Beta"])).is_none());
        assert_eq!(find_by_path(&doc, &[]).unwrap().name, "Alpha");
    }

    #[test]
    fn duplicate_siblings_keep_first_path() {
        let doc = json!({
            "category": "city", "name": "Ur",
            "children": [
                {"category": "person", "name": "Ana", "summary": "first"},
                {"category": "person", "name": "Ana", "summary": "second"}
            ]
        });
        let mut tree = CatalogTree::new();
        tree.populate(&doc).unwrap();
        assert_eq!(tree.len(), 3);
        let h = tree.handle_for_path(&path(&["city:Ur", "person:Ana"])).unwrap();
        assert_eq!(tree.node(h).unwrap().summary, "first");
        assert_eq!(tree.children(tree.root().unwrap()).len(), 2);
    }

    #[test]
    fn find_by_path_backtracks_over_duplicates() {
        let doc = CatalogNode::new("city", "Ur")
            .with_child(CatalogNode::new("house", "A"))
            .with_child(CatalogNode::new("house", "A").with_child(CatalogNode::new("person", "Bo")));
        let hit = find_by_path(&doc, &path(&["city:Ur", "house:A", "person:Bo"]));
        assert_eq!(hit.map(|n| n.name.as_str()), Some("Bo"));
    }
}

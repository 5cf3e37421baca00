// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, NodeId};

/// The id of the tree root. The root is always a group and has no parent.
pub const ROOT_NODE_ID: &str = "root";

/// A node in the diagram tree.
///
/// The presence of `children` — even empty — marks the node as a *group*;
/// absence marks it a leaf. Edges may be attached at any level; they reference
/// endpoints by id only and are not scoped by parentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    id: NodeId,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<GraphNode>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    edges: Vec<Edge>,
}

impl GraphNode {
    pub fn new_leaf(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            icon: None,
            data: None,
            children: None,
            edges: Vec::new(),
        }
    }

    pub fn new_group(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            icon: None,
            data: None,
            children: Some(Vec::new()),
            edges: Vec::new(),
        }
    }

    pub fn with_icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_data(mut self, data: Option<serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn is_group(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> Option<&[GraphNode]> {
        self.children.as_deref()
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<GraphNode>> {
        self.children.as_mut()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Vec<Edge> {
        &mut self.edges
    }

    fn find(&self, id: &str) -> Option<&GraphNode> {
        if self.id.as_str() == id {
            return Some(self);
        }
        self.children
            .as_deref()
            .into_iter()
            .flatten()
            .find_map(|child| child.find(id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        if self.id.as_str() == id {
            return Some(self);
        }
        self.children
            .as_deref_mut()
            .into_iter()
            .flatten()
            .find_map(|child| child.find_mut(id))
    }

    fn walk_inner(
        &self,
        parent: Option<&NodeId>,
        depth: usize,
        f: &mut impl FnMut(&GraphNode, Option<&NodeId>, usize),
    ) {
        f(self, parent, depth);
        for child in self.children.as_deref().into_iter().flatten() {
            child.walk_inner(Some(&self.id), depth + 1, f);
        }
    }
}

/// A directed edge between two nodes, stored at some level of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    id: EdgeId,
    source_id: NodeId,
    target_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl Edge {
    pub fn new(id: EdgeId, source_id: NodeId, target_id: NodeId) -> Self {
        Self {
            id,
            source_id,
            target_id,
            label: None,
        }
    }

    pub fn new_with(
        id: EdgeId,
        source_id: NodeId,
        target_id: NodeId,
        label: Option<String>,
    ) -> Self {
        Self {
            id,
            source_id,
            target_id,
            label,
        }
    }

    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    pub fn source_id(&self) -> &NodeId {
        &self.source_id
    }

    pub fn target_id(&self) -> &NodeId {
        &self.target_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label<T: Into<String>>(&mut self, label: Option<T>) {
        self.label = label.map(Into::into);
    }
}

/// The canonical tree of nodes, groups, and edges for one diagram session.
///
/// The graph owns structural truth; geometry lives in the `ViewState` overlay.
/// Mutations go through `ops::apply_op`/`ops::apply_batch`, which treat the
/// graph as an immutable input and return a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramGraph {
    root: GraphNode,
    #[serde(default)]
    rev: u64,
}

impl DiagramGraph {
    pub fn new() -> Self {
        let root_id = NodeId::new(ROOT_NODE_ID).expect("hard-coded root id is valid");
        Self {
            root: GraphNode::new_group(root_id, "root"),
            rev: 0,
        }
    }

    pub fn root(&self) -> &GraphNode {
        &self.root
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root.id
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub(crate) fn bump_rev(&mut self) {
        self.rev = self.rev.saturating_add(1);
    }

    /// True when the graph holds nothing but the bare root group.
    pub fn is_empty(&self) -> bool {
        self.root
            .children()
            .map_or(true, |children| children.is_empty())
            && self.root.edges.is_empty()
    }

    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.root.find(id)
    }

    pub(crate) fn find_node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.root.find_mut(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.find_node(id).is_some()
    }

    /// Returns the id of `id`'s parent; `None` for the root or an unknown id.
    pub fn parent_id_of(&self, id: &str) -> Option<&NodeId> {
        let mut parent = None;
        self.walk(|node, node_parent, _| {
            if node.id.as_str() == id {
                parent = node_parent;
            }
        });
        parent
    }

    /// Preorder traversal over every node with its parent id and depth.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(&'a GraphNode, Option<&'a NodeId>, usize)) {
        fn inner<'a>(
            node: &'a GraphNode,
            parent: Option<&'a NodeId>,
            depth: usize,
            f: &mut impl FnMut(&'a GraphNode, Option<&'a NodeId>, usize),
        ) {
            f(node, parent, depth);
            for child in node.children.as_deref().into_iter().flatten() {
                inner(child, Some(&node.id), depth + 1, f);
            }
        }
        inner(&self.root, None, 0, &mut f);
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::new();
        self.walk(|node, _, _| ids.push(node.id.clone()));
        ids
    }

    /// Ids of the subtree rooted at `id`, including `id` itself.
    pub fn subtree_node_ids(&self, id: &str) -> Vec<NodeId> {
        let Some(node) = self.find_node(id) else {
            return Vec::new();
        };
        let mut ids = Vec::new();
        node.walk_inner(None, 0, &mut |n, _, _| ids.push(n.id.clone()));
        ids
    }

    /// All edges in the tree regardless of the level they are stored at.
    pub fn edges(&self) -> Vec<&Edge> {
        let mut edges = Vec::new();
        self.walk(|node, _, _| edges.extend(node.edges.iter()));
        edges
    }

    pub fn find_edge(&self, id: &str) -> Option<&Edge> {
        self.edges().into_iter().find(|edge| edge.id.as_str() == id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.find_edge(id).is_some()
    }

    /// Detaches the node from its parent's child list and returns it.
    ///
    /// The root cannot be detached.
    pub(crate) fn detach_node(&mut self, id: &str) -> Option<GraphNode> {
        fn detach_from(node: &mut GraphNode, id: &str) -> Option<GraphNode> {
            let children = node.children.as_mut()?;
            if let Some(index) = children.iter().position(|child| child.id.as_str() == id) {
                return Some(children.remove(index));
            }
            children
                .iter_mut()
                .find_map(|child| detach_from(child, id))
        }
        if id == self.root.id.as_str() {
            return None;
        }
        detach_from(&mut self.root, id)
    }

    /// Removes every edge (at any level) whose source or target is in `ids`.
    /// Returns the removed edge ids.
    pub(crate) fn remove_edges_referencing(&mut self, ids: &BTreeSet<NodeId>) -> Vec<EdgeId> {
        fn prune(node: &mut GraphNode, ids: &BTreeSet<NodeId>, removed: &mut Vec<EdgeId>) {
            node.edges.retain(|edge| {
                let hit = ids.contains(&edge.source_id) || ids.contains(&edge.target_id);
                if hit {
                    removed.push(edge.id.clone());
                }
                !hit
            });
            for child in node.children.as_deref_mut().into_iter().flatten() {
                prune(child, ids, removed);
            }
        }
        let mut removed = Vec::new();
        prune(&mut self.root, ids, &mut removed);
        removed
    }

    /// Attaches an edge at the document (root) level.
    pub(crate) fn attach_edge(&mut self, edge: Edge) {
        self.root.edges.push(edge);
    }

    /// Removes an edge by id, wherever it is stored. `None` if not found.
    pub(crate) fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        fn remove_from(node: &mut GraphNode, id: &str) -> Option<Edge> {
            if let Some(index) = node.edges.iter().position(|edge| edge.id.as_str() == id) {
                return Some(node.edges.remove(index));
            }
            node.children
                .as_deref_mut()
                .into_iter()
                .flatten()
                .find_map(|child| remove_from(child, id))
        }
        remove_from(&mut self.root, id)
    }
}

impl Default for DiagramGraph {
    fn default() -> Self {
        Self::new()
    }
}

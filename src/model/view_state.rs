// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Geometry/mode overlay for the domain graph.
//!
//! The overlay is independent of the graph and may be rebuilt from it, but it
//! is the sole source of truth for geometry. An entry whose id no longer
//! resolves in the graph is a *ghost* and a defect; structural deletions must
//! purge the matching entries in the same logical step.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::graph::DiagramGraph;
use super::ids::{EdgeId, NodeId};
use crate::ops::{Delta, GraphRef};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }
}

/// Structural mode of a group.
///
/// `Free` groups render structural edits immediately; `Lock` groups require
/// the external layout engine to recompute geometry before rendering. Groups
/// without an explicit entry behave as `Lock` so that geometry stays
/// engine-managed until a user frees the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupMode {
    Free,
    #[default]
    Lock,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeView {
    pub position: Point,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupView {
    pub frame: Rect,
    pub mode: GroupMode,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeView {
    pub route: Vec<Point>,
}

/// Cached layout-engine output for one scope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeLayout {
    pub node_frames: BTreeMap<NodeId, Rect>,
    pub edge_routes: BTreeMap<EdgeId, Vec<Point>>,
}

/// Keyed-by-id geometry stores, one per entity category plus a layout cache.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    nodes: BTreeMap<NodeId, NodeView>,
    groups: BTreeMap<NodeId, GroupView>,
    edges: BTreeMap<EdgeId, EdgeView>,
    layouts: BTreeMap<NodeId, ScopeLayout>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, NodeView> {
        &self.nodes
    }

    pub fn groups(&self) -> &BTreeMap<NodeId, GroupView> {
        &self.groups
    }

    pub fn edges(&self) -> &BTreeMap<EdgeId, EdgeView> {
        &self.edges
    }

    pub fn layouts(&self) -> &BTreeMap<NodeId, ScopeLayout> {
        &self.layouts
    }

    pub fn node_view(&self, node_id: &NodeId) -> Option<&NodeView> {
        self.nodes.get(node_id)
    }

    pub fn group_view(&self, group_id: &NodeId) -> Option<&GroupView> {
        self.groups.get(group_id)
    }

    pub fn edge_view(&self, edge_id: &EdgeId) -> Option<&EdgeView> {
        self.edges.get(edge_id)
    }

    pub fn set_node_position(&mut self, node_id: NodeId, position: Point) {
        self.nodes.entry(node_id).or_default().position = position;
    }

    pub fn set_node_size(&mut self, node_id: NodeId, size: Size) {
        self.nodes.entry(node_id).or_default().size = size;
    }

    pub fn set_node_view(&mut self, node_id: NodeId, view: NodeView) {
        self.nodes.insert(node_id, view);
    }

    pub fn set_group_frame(&mut self, group_id: NodeId, frame: Rect) {
        self.groups.entry(group_id).or_default().frame = frame;
    }

    pub fn set_edge_route(&mut self, edge_id: EdgeId, route: Vec<Point>) {
        self.edges.insert(edge_id, EdgeView { route });
    }

    pub fn set_layout(&mut self, scope_id: NodeId, layout: ScopeLayout) {
        self.layouts.insert(scope_id, layout);
    }

    pub fn invalidate_layout(&mut self, scope_id: &NodeId) {
        self.layouts.remove(scope_id);
    }

    /// Mode of a group; defaults to `Lock` when no entry exists.
    pub fn mode_of(&self, group_id: &NodeId) -> GroupMode {
        self.groups
            .get(group_id)
            .map(|group| group.mode)
            .unwrap_or_default()
    }

    pub fn set_mode(&mut self, group_id: NodeId, mode: GroupMode) {
        self.groups.entry(group_id).or_default().mode = mode;
    }

    /// Drops the entries for every id a mutation removed.
    ///
    /// Called in the same logical step as the domain mutation so that no
    /// ghost entry survives past the edit.
    pub fn purge_removed(&mut self, delta: &Delta) {
        for removed in &delta.removed {
            match removed {
                GraphRef::Node(node_id) => {
                    self.nodes.remove(node_id);
                    self.groups.remove(node_id);
                    self.layouts.remove(node_id);
                }
                GraphRef::Edge(edge_id) => {
                    self.edges.remove(edge_id);
                }
            }
        }
    }

    /// Drops every entry whose id no longer resolves in `graph`.
    ///
    /// Used when restoring a persisted snapshot, where both stores are
    /// replaced atomically and stale in-memory entries must not leak in.
    pub fn retain_existing(&mut self, graph: &DiagramGraph) {
        self.nodes.retain(|node_id, _| graph.contains_node(node_id.as_str()));
        self.groups.retain(|group_id, _| {
            graph
                .find_node(group_id.as_str())
                .is_some_and(|node| node.is_group())
        });
        self.layouts
            .retain(|scope_id, _| graph.contains_node(scope_id.as_str()));
        self.edges
            .retain(|edge_id, _| graph.contains_edge(edge_id.as_str()));
    }

    /// Ids present in any store, for ghost checks in tests and debugging.
    pub fn ghost_ids(&self, graph: &DiagramGraph) -> Vec<String> {
        let mut ghosts = Vec::new();
        for node_id in self.nodes.keys().chain(self.groups.keys()).chain(self.layouts.keys()) {
            if !graph.contains_node(node_id.as_str()) {
                ghosts.push(node_id.as_str().to_owned());
            }
        }
        for edge_id in self.edges.keys() {
            if !graph.contains_edge(edge_id.as_str()) {
                ghosts.push(edge_id.as_str().to_owned());
            }
        }
        ghosts.sort();
        ghosts.dedup();
        ghosts
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupMode, Point, Rect, Size, ViewState};
    use crate::model::fixtures;
    use crate::model::NodeId;

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    #[test]
    fn mode_defaults_to_lock_without_an_entry() {
        let view = ViewState::new();
        assert_eq!(view.mode_of(&nid("aws")), GroupMode::Lock);
    }

    #[test]
    fn set_mode_keeps_existing_frame() {
        let mut view = ViewState::new();
        let frame = Rect::new(Point::new(10.0, 20.0), Size::new(300.0, 200.0));
        view.set_group_frame(nid("aws"), frame);
        view.set_mode(nid("aws"), GroupMode::Free);

        let group = view.group_view(&nid("aws")).expect("group view");
        assert_eq!(group.frame, frame);
        assert_eq!(group.mode, GroupMode::Free);
    }

    #[test]
    fn retain_existing_drops_entries_for_unknown_ids() {
        let graph = fixtures::demo_graph();
        let mut view = ViewState::new();
        view.set_node_position(nid("webapp"), Point::new(1.0, 2.0));
        view.set_node_position(nid("gone"), Point::new(3.0, 4.0));
        view.set_mode(nid("aws"), GroupMode::Free);
        view.set_mode(nid("webapp"), GroupMode::Free);

        view.retain_existing(&graph);

        assert!(view.node_view(&nid("webapp")).is_some());
        assert!(view.node_view(&nid("gone")).is_none());
        assert!(view.group_view(&nid("aws")).is_some());
        // webapp is a leaf, not a group; its stray group entry is a ghost.
        assert!(view.group_view(&nid("webapp")).is_none());
        assert!(view.ghost_ids(&graph).is_empty());
    }
}

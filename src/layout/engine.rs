// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{DiagramGraph, Edge, GraphNode, NodeId, ScopeLayout, ViewState};

/// Named spacing parameters handed to the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpacing {
    pub edge_node: f64,
    pub node_node: f64,
    pub edge_edge: f64,
    pub edge_node_between_layers: f64,
    pub node_node_between_layers: f64,
    pub edge_edge_between_layers: f64,
    pub port_port: f64,
    pub component_component: f64,
    pub node_label: f64,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            edge_node: 40.0,
            node_node: 60.0,
            edge_edge: 25.0,
            edge_node_between_layers: 40.0,
            node_node_between_layers: 70.0,
            edge_edge_between_layers: 25.0,
            port_port: 10.0,
            component_component: 80.0,
            node_label: 8.0,
        }
    }
}

/// The slice of the tree one layout run operates on: the scope's node
/// (cloned, with its whole subtree) plus the edges internal to that subtree.
/// Edges crossing the scope boundary belong to the edge router instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSubtree {
    scope_id: NodeId,
    root: GraphNode,
    edges: Vec<Edge>,
}

impl ScopeSubtree {
    pub fn scope_id(&self) -> &NodeId {
        &self.scope_id
    }

    pub fn root(&self) -> &GraphNode {
        &self.root
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEngineError {
    reason: String,
}

impl LayoutEngineError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for LayoutEngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layout engine failed: {}", self.reason)
    }
}

impl std::error::Error for LayoutEngineError {}

/// External hierarchical layout engine.
///
/// Input is a scope subtree plus spacing options; output is absolute frames
/// per node/group and routed point sequences for the scope-internal edges.
pub trait LayoutEngine {
    fn layout(
        &self,
        scope: &ScopeSubtree,
        spacing: &LayoutSpacing,
    ) -> impl std::future::Future<Output = Result<ScopeLayout, LayoutEngineError>>;
}

/// Builds the engine input for `scope_id`. `None` when the id does not
/// resolve to a group.
pub fn extract_scope(graph: &DiagramGraph, scope_id: &NodeId) -> Option<ScopeSubtree> {
    let node = graph.find_node(scope_id.as_str())?;
    if !node.is_group() {
        return None;
    }
    let subtree_ids = graph.subtree_node_ids(scope_id.as_str());
    let edges = graph
        .edges()
        .into_iter()
        .filter(|edge| {
            subtree_ids.iter().any(|id| id == edge.source_id())
                && subtree_ids.iter().any(|id| id == edge.target_id())
        })
        .cloned()
        .collect();
    Some(ScopeSubtree {
        scope_id: scope_id.clone(),
        root: node.clone(),
        edges,
    })
}

/// Folds one engine run into the geometry overlay and the per-scope cache.
pub fn merge_layout(
    view: &mut ViewState,
    graph: &DiagramGraph,
    scope_id: &NodeId,
    layout: &ScopeLayout,
) {
    for (node_id, frame) in &layout.node_frames {
        let Some(node) = graph.find_node(node_id.as_str()) else {
            continue;
        };
        if node.is_group() {
            view.set_group_frame(node_id.clone(), *frame);
        } else {
            view.set_node_view(
                node_id.clone(),
                crate::model::NodeView {
                    position: frame.origin,
                    size: frame.size,
                },
            );
        }
    }
    for (edge_id, route) in &layout.edge_routes {
        if graph.contains_edge(edge_id.as_str()) {
            view.set_edge_route(edge_id.clone(), route.clone());
        }
    }
    view.set_layout(scope_id.clone(), layout.clone());
}

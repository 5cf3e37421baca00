// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural mutation operations for the diagram tree.
//!
//! Every operation is a pure function of `(graph, op) -> new graph`: the input
//! graph is never touched, and a failed operation leaves the caller's value
//! exactly as it was. Batches apply against a progressively-updated working
//! copy and either succeed as a whole or report the first failure with its
//! index.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{DiagramGraph, Edge, EdgeId, GraphNode, NodeId, ROOT_NODE_ID};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    AddNode {
        node_id: NodeId,
        parent_id: NodeId,
        label: String,
        icon: Option<String>,
        data: Option<serde_json::Value>,
        group: bool,
    },
    DeleteNode {
        node_id: NodeId,
    },
    MoveNode {
        node_id: NodeId,
        new_parent_id: NodeId,
    },
    AddEdge {
        edge_id: EdgeId,
        source_id: NodeId,
        target_id: NodeId,
        label: Option<String>,
    },
    DeleteEdge {
        edge_id: EdgeId,
    },
    GroupNodes {
        group_id: NodeId,
        parent_id: NodeId,
        node_ids: Vec<NodeId>,
        label: String,
        icon: Option<String>,
    },
    RemoveGroup {
        group_id: NodeId,
    },
}

/// Reference to a changed entity, for deltas and overlay cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphRef {
    Node(NodeId),
    Edge(EdgeId),
}

/// Minimal delta describing which entities changed as the result of applying
/// operations. Intentionally coarse: added/removed/updated refs only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<GraphRef>,
    pub removed: Vec<GraphRef>,
    pub updated: Vec<GraphRef>,
}

impl Delta {
    pub fn added_edge_ids(&self) -> Vec<&EdgeId> {
        self.added
            .iter()
            .filter_map(|r| match r {
                GraphRef::Edge(edge_id) => Some(edge_id),
                GraphRef::Node(_) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: BTreeSet<GraphRef>,
    removed: BTreeSet<GraphRef>,
    updated: BTreeSet<GraphRef>,
}

impl DeltaBuilder {
    fn record_added(&mut self, graph_ref: GraphRef) {
        self.removed.remove(&graph_ref);
        self.updated.remove(&graph_ref);
        self.added.insert(graph_ref);
    }

    fn record_removed(&mut self, graph_ref: GraphRef) {
        self.added.remove(&graph_ref);
        self.updated.remove(&graph_ref);
        self.removed.insert(graph_ref);
    }

    fn record_updated(&mut self, graph_ref: GraphRef) {
        if self.added.contains(&graph_ref) || self.removed.contains(&graph_ref) {
            return;
        }
        self.updated.insert(graph_ref);
    }

    fn finish(self) -> Delta {
        Delta {
            added: self.added.into_iter().collect(),
            removed: self.removed.into_iter().collect(),
            updated: self.updated.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NodeIdInUse { node_id: NodeId },
    EdgeIdInUse { edge_id: EdgeId },
    NodeNotFound { node_id: NodeId },
    NotAGroup { node_id: NodeId },
    EdgeEndpointNotFound { edge_id: EdgeId, node_id: NodeId },
    RootDetach,
    CycleAttempt { node_id: NodeId, new_parent_id: NodeId },
    EmptyGroup { group_id: NodeId },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeIdInUse { node_id } => write!(f, "node id already in use ({node_id})"),
            Self::EdgeIdInUse { edge_id } => write!(f, "edge id already in use ({edge_id})"),
            Self::NodeNotFound { node_id } => write!(f, "node not found ({node_id})"),
            Self::NotAGroup { node_id } => write!(f, "node is not a group ({node_id})"),
            Self::EdgeEndpointNotFound { edge_id, node_id } => {
                write!(f, "edge {edge_id} endpoint does not resolve ({node_id})")
            }
            Self::RootDetach => f.write_str("the root node cannot be moved or removed"),
            Self::CycleAttempt {
                node_id,
                new_parent_id,
            } => write!(
                f,
                "cannot place {node_id} under {new_parent_id}: target is within its own subtree"
            ),
            Self::EmptyGroup { group_id } => {
                write!(f, "group {group_id} would be empty")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// First failure inside a batch, with the index of the failing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    pub index: usize,
    pub source: ValidationError,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation {} failed: {}", self.index, self.source)
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Applies one operation, returning the updated graph and a delta.
pub fn apply_op(
    graph: &DiagramGraph,
    op: &GraphOp,
) -> Result<(DiagramGraph, Delta), ValidationError> {
    let mut next = graph.clone();
    let mut delta = DeltaBuilder::default();
    apply_in_place(&mut next, op, &mut delta)?;
    next.bump_rev();
    Ok((next, delta.finish()))
}

/// Applies an ordered sequence of operations atomically.
///
/// Operations see the progressively-updated working copy; on the first
/// failure the caller's graph is untouched and the failing index is reported.
pub fn apply_batch(
    graph: &DiagramGraph,
    ops: &[GraphOp],
) -> Result<(DiagramGraph, Delta), BatchError> {
    let mut next = graph.clone();
    let mut delta = DeltaBuilder::default();
    for (index, op) in ops.iter().enumerate() {
        apply_in_place(&mut next, op, &mut delta)
            .map_err(|source| BatchError { index, source })?;
    }
    if !ops.is_empty() {
        next.bump_rev();
    }
    Ok((next, delta.finish()))
}

// Extracted op-application implementation for tree mutations.
include!("ops_impl.rs");

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use proteus::model::{DiagramGraph, EdgeId, NodeId};
use proteus::ops::{apply_batch, GraphOp};

pub fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub fn eid(value: &str) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

fn add_group(node_id: &str, parent_id: &str) -> GraphOp {
    GraphOp::AddNode {
        node_id: nid(node_id),
        parent_id: nid(parent_id),
        label: node_id.to_owned(),
        icon: None,
        data: None,
        group: true,
    }
}

fn add_leaf(node_id: &str, parent_id: &str) -> GraphOp {
    GraphOp::AddNode {
        node_id: nid(node_id),
        parent_id: nid(parent_id),
        label: node_id.to_owned(),
        icon: None,
        data: None,
        group: false,
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Case {
    /// 8 groups x 12 leaves, chained edges.
    Medium,
    /// 16-level nesting chain, 4 leaves per level.
    Deep,
}

/// Builds the fixture through the public mutation API so the bench input is
/// exactly what the engine itself would produce.
pub fn graph(case: Case) -> DiagramGraph {
    let mut ops = Vec::new();
    match case {
        Case::Medium => {
            for group in 0..8 {
                let group_id = format!("g{group:02}");
                ops.push(add_group(&group_id, "root"));
                for leaf in 0..12 {
                    ops.push(add_leaf(&format!("n{group:02}_{leaf:02}"), &group_id));
                }
            }
            for index in 0..40 {
                let from_group = index % 8;
                let to_group = (index + 3) % 8;
                ops.push(GraphOp::AddEdge {
                    edge_id: eid(&format!("e{index:03}")),
                    source_id: nid(&format!("n{from_group:02}_{:02}", index % 12)),
                    target_id: nid(&format!("n{to_group:02}_{:02}", (index + 5) % 12)),
                    label: None,
                });
            }
        }
        Case::Deep => {
            let mut parent = "root".to_owned();
            for depth in 0..16 {
                let group_id = format!("d{depth:02}");
                ops.push(add_group(&group_id, &parent));
                for leaf in 0..4 {
                    ops.push(add_leaf(&format!("l{depth:02}_{leaf}"), &group_id));
                }
                parent = group_id;
            }
        }
    }

    let (graph, _delta) = apply_batch(&DiagramGraph::new(), &ops).expect("fixture batch");
    graph
}

/// Deterministic add-edge ops against the `Medium` fixture's leaves.
pub fn add_edge_ops(count: usize) -> Vec<GraphOp> {
    let mut ops = Vec::with_capacity(count);
    for index in 0..count {
        let from_group = (index * 7) % 8;
        let to_group = (index * 7 + 3) % 8;
        ops.push(GraphOp::AddEdge {
            edge_id: eid(&format!("bench_edge_{index:06}")),
            source_id: nid(&format!("n{from_group:02}_{:02}", index % 12)),
            target_id: nid(&format!("n{to_group:02}_{:02}", (index + 1) % 12)),
            label: None,
        });
    }
    ops
}

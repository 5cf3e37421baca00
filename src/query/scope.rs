// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::model::{DiagramGraph, NodeId, ROOT_NODE_ID};

/// Ancestor chains are short in practice; eight inline slots cover any
/// realistic nesting depth without allocating.
pub type AncestorChain = SmallVec<[NodeId; 8]>;

fn parent_map(graph: &DiagramGraph) -> BTreeMap<&str, &NodeId> {
    let mut parents = BTreeMap::new();
    graph.walk(|node, parent, _| {
        if let Some(parent_id) = parent {
            parents.insert(node.id().as_str(), parent_id);
        }
    });
    parents
}

/// Chain from the node itself up to the root: `[id, parent, …, root]`.
/// `None` when the id does not resolve.
pub fn ancestor_chain(graph: &DiagramGraph, id: &str) -> Option<AncestorChain> {
    if !graph.contains_node(id) {
        return None;
    }
    let parents = parent_map(graph);
    let mut chain = AncestorChain::new();
    let node = graph.find_node(id)?;
    chain.push(node.id().clone());
    let mut current = id;
    while let Some(parent_id) = parents.get(current) {
        chain.push((*parent_id).clone());
        current = parent_id.as_str();
    }
    Some(chain)
}

/// First node present in both ids' ancestor chains (each chain includes the
/// node itself). `None` when either id does not resolve.
pub fn common_ancestor(graph: &DiagramGraph, a: &str, b: &str) -> Option<NodeId> {
    let chain_a = ancestor_chain(graph, a)?;
    let chain_b = ancestor_chain(graph, b)?;
    chain_a
        .into_iter()
        .find(|candidate| chain_b.iter().any(|other| other == candidate))
}

/// Lowest common group: the deepest node that qualifies as a shared
/// containing scope for the whole selection.
///
/// A selected node is never its own scope, so each chain holds strict
/// ancestors only; selecting a group together with one of its own
/// descendants therefore lands on the group's parent, not the group.
///
/// Resolution is all-or-nothing: any id that does not resolve (including
/// empty or whitespace-only strings) makes the whole call return `None`.
pub fn lowest_common_group<S: AsRef<str>>(graph: &DiagramGraph, ids: &[S]) -> Option<NodeId> {
    let mut selection: Vec<&str> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.as_ref();
        if !selection.contains(&id) {
            selection.push(id);
        }
    }
    if selection.is_empty() {
        return None;
    }
    for id in &selection {
        if !graph.contains_node(id) {
            return None;
        }
    }
    if selection.iter().any(|id| *id == ROOT_NODE_ID) {
        return Some(graph.root_id().clone());
    }

    let mut chains: Vec<AncestorChain> = Vec::with_capacity(selection.len());
    for id in &selection {
        let mut chain = ancestor_chain(graph, id)?;
        chain.remove(0); // strict ancestors only
        chains.push(chain);
    }

    let (first, rest) = chains.split_first()?;
    first
        .iter()
        .find(|candidate| {
            rest.iter()
                .all(|chain| chain.iter().any(|other| other == *candidate))
        })
        .cloned()
}

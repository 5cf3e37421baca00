// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Classification of edit intents into routing tiers.
//!
//! Geometry-only edits never touch structure or the layout engine. User
//! structural edits inside a `Free` group mutate and render directly; agent
//! structural edits, and any structural edit inside a `Lock` group, go
//! through the layout engine.

use crate::model::{DiagramGraph, GroupMode, NodeId, ViewState};
use crate::query;

use super::intent::{EditKind, EditPayload, EditSource};

/// Decides the routing tier for an edit before it is dispatched.
pub fn classify_edit(
    source: EditSource,
    payload: &EditPayload,
    scope_id: &NodeId,
    view: &ViewState,
) -> EditKind {
    if !payload.is_structural() {
        return EditKind::GeoOnly;
    }
    if source == EditSource::Ai {
        return EditKind::AiLockStructural;
    }
    match view.mode_of(scope_id) {
        GroupMode::Free => EditKind::FreeStructural,
        GroupMode::Lock => EditKind::AiLockStructural,
    }
}

/// Derives the scope a payload affects: the group that safely contains every
/// node the action touches. `None` when a referenced id does not resolve.
pub fn resolve_scope(graph: &DiagramGraph, payload: &EditPayload) -> Option<NodeId> {
    let parent_or_root = |id: &str| -> Option<NodeId> {
        if !graph.contains_node(id) {
            return None;
        }
        Some(
            graph
                .parent_id_of(id)
                .cloned()
                .unwrap_or_else(|| graph.root_id().clone()),
        )
    };

    match payload {
        EditPayload::MoveShape { node_id, .. }
        | EditPayload::ResizeShape { node_id, .. }
        | EditPayload::DeleteNode { node_id } => parent_or_root(node_id),
        EditPayload::AddNode { parent_id, .. } => graph
            .find_node(parent_id)
            .filter(|node| node.is_group())
            .map(|node| node.id().clone()),
        EditPayload::ReparentNode {
            node_id,
            new_parent_id,
        } => {
            let old_parent = parent_or_root(node_id)?;
            query::common_ancestor(graph, old_parent.as_str(), new_parent_id)
        }
        EditPayload::AddEdge {
            source_id,
            target_id,
            ..
        } => query::lowest_common_group(graph, &[source_id.as_str(), target_id.as_str()]),
        EditPayload::DeleteEdge { edge_id } => {
            let edge = graph.find_edge(edge_id)?;
            query::lowest_common_group(
                graph,
                &[edge.source_id().as_str(), edge.target_id().as_str()],
            )
        }
        EditPayload::GroupSelection { node_ids, .. } => {
            query::lowest_common_group(graph, node_ids)
        }
        EditPayload::DissolveGroup { group_id } => parent_or_root(group_id),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_edit, resolve_scope};
    use crate::edit::intent::{EditKind, EditPayload, EditSource};
    use crate::model::{fixtures, GroupMode, NodeId, ViewState};

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    fn delete_payload(node_id: &str) -> EditPayload {
        EditPayload::DeleteNode {
            node_id: node_id.to_owned(),
        }
    }

    #[test]
    fn geometry_edits_classify_geo_only_regardless_of_source_and_mode() {
        let view = ViewState::new();
        let payload = EditPayload::MoveShape {
            node_id: "webapp".to_owned(),
            x: 0.0,
            y: 0.0,
        };
        assert_eq!(
            classify_edit(EditSource::User, &payload, &nid("ui"), &view),
            EditKind::GeoOnly
        );
        assert_eq!(
            classify_edit(EditSource::Ai, &payload, &nid("ui"), &view),
            EditKind::GeoOnly
        );
    }

    #[test]
    fn agent_structural_edits_always_route_through_layout() {
        let mut view = ViewState::new();
        view.set_mode(nid("aws"), GroupMode::Free);
        assert_eq!(
            classify_edit(EditSource::Ai, &delete_payload("api"), &nid("aws"), &view),
            EditKind::AiLockStructural
        );
    }

    #[test]
    fn user_structural_edits_follow_the_scope_mode() {
        let mut view = ViewState::new();
        assert_eq!(
            classify_edit(EditSource::User, &delete_payload("api"), &nid("aws"), &view),
            EditKind::AiLockStructural
        );

        view.set_mode(nid("aws"), GroupMode::Free);
        assert_eq!(
            classify_edit(EditSource::User, &delete_payload("api"), &nid("aws"), &view),
            EditKind::FreeStructural
        );
    }

    #[test]
    fn scopes_derive_from_the_touched_nodes() {
        let graph = fixtures::demo_graph();

        assert_eq!(
            resolve_scope(&graph, &delete_payload("chat")),
            Some(nid("lambda"))
        );
        assert_eq!(
            resolve_scope(
                &graph,
                &EditPayload::AddEdge {
                    edge_id: "e:x".to_owned(),
                    source_id: "query".to_owned(),
                    target_id: "pdf".to_owned(),
                    label: None,
                }
            ),
            Some(nid("lambda"))
        );
        assert_eq!(
            resolve_scope(
                &graph,
                &EditPayload::GroupSelection {
                    group_id: "g".to_owned(),
                    node_ids: vec!["webapp".to_owned(), "api".to_owned()],
                    label: "G".to_owned(),
                    icon: None,
                }
            ),
            Some(nid("root"))
        );
        assert_eq!(resolve_scope(&graph, &delete_payload("nope")), None);
    }

    #[test]
    fn reparent_scope_spans_old_and_new_parent() {
        let graph = fixtures::demo_graph();
        let payload = EditPayload::ReparentNode {
            node_id: "query".to_owned(),
            new_parent_id: "openai".to_owned(),
        };
        // Old parent lambda, new parent openai: their common ancestor.
        assert_eq!(resolve_scope(&graph, &payload), Some(nid("root")));
    }
}

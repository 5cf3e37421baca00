// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{
    DiagramGraph, EdgeId, GroupMode, NodeId, Point, Rect, ViewState, ROOT_NODE_ID,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub label: String,
    pub icon: Option<String>,
    pub frame: Rect,
    pub depth: usize,
    /// `None` for nodes sitting directly under the root.
    pub parent_id: Option<NodeId>,
    /// `Some` for groups, carrying the group's structural mode.
    pub mode: Option<GroupMode>,
}

impl SceneNode {
    pub fn is_group(&self) -> bool {
        self.mode.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEdge {
    pub id: EdgeId,
    pub source_id: NodeId,
    pub target_id: NodeId,
    pub label: Option<String>,
    pub route: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
}

/// Flattens `(graph, view)` into painter's order: parents precede children,
/// so a renderer can draw the list front to back.
pub fn build_scene(graph: &DiagramGraph, view: &ViewState) -> Scene {
    let mut scene = Scene::default();

    graph.walk(|node, parent, depth| {
        if node.id().as_str() == ROOT_NODE_ID {
            return;
        }
        let (frame, mode) = if node.is_group() {
            let group_view = view.group_view(node.id());
            (
                group_view.map(|g| g.frame).unwrap_or_default(),
                Some(
                    group_view
                        .map(|g| g.mode)
                        .unwrap_or_default(),
                ),
            )
        } else {
            let node_view = view.node_view(node.id());
            (
                node_view
                    .map(|n| Rect::new(n.position, n.size))
                    .unwrap_or_default(),
                None,
            )
        };
        scene.nodes.push(SceneNode {
            id: node.id().clone(),
            label: node.label().to_owned(),
            icon: node.icon().map(str::to_owned),
            frame,
            // Root sits at depth 0; scene depths start at its children.
            depth: depth.saturating_sub(1),
            parent_id: parent
                .filter(|p| p.as_str() != ROOT_NODE_ID)
                .cloned(),
            mode,
        });
    });

    for edge in graph.edges() {
        scene.edges.push(SceneEdge {
            id: edge.id().clone(),
            source_id: edge.source_id().clone(),
            target_id: edge.target_id().clone(),
            label: edge.label().map(str::to_owned),
            route: view
                .edge_view(edge.id())
                .map(|e| e.route.clone())
                .unwrap_or_default(),
        });
    }

    scene
}

#[cfg(test)]
mod tests {
    use super::build_scene;
    use crate::model::{fixtures, GroupMode, NodeId, Point, ViewState};

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    #[test]
    fn scene_lists_parents_before_children_and_skips_the_root() {
        let graph = fixtures::demo_graph();
        let scene = build_scene(&graph, &ViewState::new());

        let ids: Vec<&str> = scene.nodes.iter().map(|n| n.id.as_str()).collect();
        assert!(!ids.contains(&"root"));
        let aws = ids.iter().position(|id| *id == "aws").expect("aws");
        let lambda = ids.iter().position(|id| *id == "lambda").expect("lambda");
        let chat = ids.iter().position(|id| *id == "chat").expect("chat");
        assert!(aws < lambda && lambda < chat);

        let chat_node = &scene.nodes[chat];
        assert_eq!(chat_node.depth, 2);
        assert_eq!(chat_node.parent_id, Some(nid("lambda")));
        assert_eq!(chat_node.mode, None);

        let lambda_node = &scene.nodes[lambda];
        assert_eq!(lambda_node.mode, Some(GroupMode::Lock));
    }

    #[test]
    fn edge_routes_come_from_the_overlay() {
        let graph = fixtures::demo_graph();
        let mut view = ViewState::new();
        view.set_edge_route(
            crate::model::EdgeId::new("e:webapp-api").expect("edge id"),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
        );

        let scene = build_scene(&graph, &view);
        let routed = scene
            .edges
            .iter()
            .find(|e| e.id.as_str() == "e:webapp-api")
            .expect("edge");
        assert_eq!(routed.route.len(), 2);

        let unrouted = scene
            .edges
            .iter()
            .find(|e| e.id.as_str() == "e:api-query")
            .expect("edge");
        assert!(unrouted.route.is_empty());
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::{GraphNode, Point, Rect, ScopeLayout, Size};

use super::engine::{LayoutEngine, LayoutEngineError, LayoutSpacing, ScopeSubtree};

const LEAF_SIZE: Size = Size {
    width: 160.0,
    height: 60.0,
};

/// Minimal built-in engine: stacks each group's children vertically.
///
/// No layering, no crossing reduction. Scope-internal edges route as a
/// straight segment between the endpoint centers. Good enough for the CLI
/// and for exercising the merge path with real geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackedLayoutEngine;

impl StackedLayoutEngine {
    pub fn new() -> Self {
        Self
    }
}

impl LayoutEngine for StackedLayoutEngine {
    async fn layout(
        &self,
        scope: &ScopeSubtree,
        spacing: &LayoutSpacing,
    ) -> Result<ScopeLayout, LayoutEngineError> {
        let mut layout = ScopeLayout::default();
        place(scope.root(), Point::new(0.0, 0.0), spacing, &mut layout);

        for edge in scope.edges() {
            let (Some(source), Some(target)) = (
                layout.node_frames.get(edge.source_id()),
                layout.node_frames.get(edge.target_id()),
            ) else {
                return Err(LayoutEngineError::new(format!(
                    "edge {} references a node outside the scope",
                    edge.id()
                )));
            };
            layout
                .edge_routes
                .insert(edge.id().clone(), vec![source.center(), target.center()]);
        }

        Ok(layout)
    }
}

fn measure(node: &GraphNode, spacing: &LayoutSpacing) -> Size {
    let Some(children) = node.children() else {
        return LEAF_SIZE;
    };
    let header = spacing.node_label + 20.0;
    let pad = spacing.component_component / 2.0;
    let mut width: f64 = 0.0;
    let mut height = 0.0;
    for (index, child) in children.iter().enumerate() {
        let child_size = measure(child, spacing);
        width = width.max(child_size.width);
        if index > 0 {
            height += spacing.node_node;
        }
        height += child_size.height;
    }
    Size::new(
        width + 2.0 * pad,
        height + header + 2.0 * pad,
    )
}

fn place(node: &GraphNode, origin: Point, spacing: &LayoutSpacing, layout: &mut ScopeLayout) {
    let size = measure(node, spacing);
    layout
        .node_frames
        .insert(node.id().clone(), Rect::new(origin, size));

    let Some(children) = node.children() else {
        return;
    };
    let header = spacing.node_label + 20.0;
    let pad = spacing.component_component / 2.0;
    let mut cursor = Point::new(origin.x + pad, origin.y + header + pad);
    for child in children {
        place(child, cursor, spacing, layout);
        let child_size = measure(child, spacing);
        cursor.y += child_size.height + spacing.node_node;
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutEngine, StackedLayoutEngine, LEAF_SIZE};
    use crate::layout::engine::{extract_scope, LayoutSpacing};
    use crate::model::{fixtures, NodeId};

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    #[tokio::test]
    async fn children_stack_without_overlapping() {
        let graph = fixtures::demo_graph();
        let scope = extract_scope(&graph, &nid("lambda")).expect("scope");
        let layout = StackedLayoutEngine::new()
            .layout(&scope, &LayoutSpacing::default())
            .await
            .expect("layout");

        let frames: Vec<_> = ["query", "pdf", "fetch", "chat"]
            .iter()
            .map(|id| *layout.node_frames.get(&nid(id)).expect("frame"))
            .collect();

        for pair in frames.windows(2) {
            let above = pair[0];
            let below = pair[1];
            assert!(
                above.origin.y + above.size.height <= below.origin.y,
                "frames overlap vertically"
            );
        }

        let group = layout.node_frames.get(&nid("lambda")).expect("group frame");
        for frame in &frames {
            assert!(frame.origin.y + frame.size.height <= group.origin.y + group.size.height);
            assert!(frame.origin.x + frame.size.width <= group.origin.x + group.size.width);
            assert_eq!(frame.size, LEAF_SIZE);
        }
    }

    #[tokio::test]
    async fn scope_internal_edges_get_straight_routes() {
        let graph = fixtures::demo_graph();
        let scope = extract_scope(&graph, &nid("aws")).expect("scope");
        let layout = StackedLayoutEngine::new()
            .layout(&scope, &LayoutSpacing::default())
            .await
            .expect("layout");

        let route = layout
            .edge_routes
            .get(&crate::model::EdgeId::new("e:api-query").expect("edge id"))
            .expect("route");
        assert_eq!(route.len(), 2);
    }
}

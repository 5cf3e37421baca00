// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use crate::model::GroupMode;

use super::scene::Scene;

/// Deterministic text listing of a scene, for the CLI and for snapshots in
/// tests. One line per node (indented by depth), then one line per edge.
pub fn render_scene_listing(scene: &Scene) -> String {
    let mut out = String::new();

    for node in &scene.nodes {
        let indent = "  ".repeat(node.depth);
        let marker = match node.mode {
            Some(GroupMode::Free) => " [group:free]",
            Some(GroupMode::Lock) => " [group:lock]",
            None => "",
        };
        let _ = writeln!(
            out,
            "{indent}{id}{marker} \"{label}\" @ ({x:.0},{y:.0}) {w:.0}x{h:.0}",
            id = node.id,
            label = node.label,
            x = node.frame.origin.x,
            y = node.frame.origin.y,
            w = node.frame.size.width,
            h = node.frame.size.height,
        );
    }

    for edge in &scene.edges {
        let label = edge
            .label
            .as_deref()
            .map(|text| format!(" \"{text}\""))
            .unwrap_or_default();
        let route = if edge.route.is_empty() {
            String::from("unrouted")
        } else {
            format!("{} pts", edge.route.len())
        };
        let _ = writeln!(
            out,
            "{id}: {source} -> {target}{label} ({route})",
            id = edge.id,
            source = edge.source_id,
            target = edge.target_id,
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::render_scene_listing;
    use crate::model::{fixtures, ViewState};
    use crate::render::build_scene;

    #[test]
    fn listing_indents_by_depth_and_appends_edges() {
        let graph = fixtures::demo_graph();
        let scene = build_scene(&graph, &ViewState::new());
        let listing = render_scene_listing(&scene);

        assert!(listing.contains("ui [group:lock]"));
        assert!(listing.contains("\n    query"));
        assert!(listing.contains("e:webapp-api: webapp -> api \"REST\" (unrouted)"));
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use tracing::warn;

use crate::layout::{extract_scope, merge_layout, LayoutEngine, LayoutEngineError, LayoutSpacing};
use crate::model::{
    DiagramGraph, EdgeId, GroupMode, IdError, NodeId, Point, Size, ViewState,
};
use crate::ops::{apply_batch, BatchError, Delta, GraphOp};
use crate::query;
use crate::render::{build_scene, Renderer};

use super::intent::{EditIntent, EditKind, EditPayload};

/// Shared state handed to the handlers for one intent. Constructed per
/// diagram session and passed in explicitly; nothing here is global.
pub struct EditContext<'a, L> {
    pub graph: &'a mut DiagramGraph,
    pub view: &'a mut ViewState,
    pub engine: &'a L,
    pub spacing: &'a LayoutSpacing,
    pub renderer: &'a mut dyn Renderer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    UnknownKind {
        kind: String,
    },
    PayloadMismatch {
        kind: EditKind,
        action: &'static str,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
    TargetNotFound {
        id: String,
    },
    NoSelectionScope,
    Validation(BatchError),
    Layout(LayoutEngineError),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind { kind } => write!(f, "unknown edit kind '{kind}'"),
            Self::PayloadMismatch { kind, action } => {
                write!(f, "payload action '{action}' cannot run as '{kind}'")
            }
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::TargetNotFound { id } => write!(f, "edit target not found ({id})"),
            Self::NoSelectionScope => {
                f.write_str("selection has no resolvable containing scope")
            }
            Self::Validation(source) => write!(f, "{source}"),
            Self::Layout(source) => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidId { source, .. } => Some(source),
            Self::Validation(source) => Some(source),
            Self::Layout(source) => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub kind: EditKind,
    pub delta: Delta,
    pub layout_ran: bool,
}

/// Stateless router: resolves the intent's kind label to a handler and
/// dispatches. All mutation happens inside the handlers.
pub struct Orchestrator;

impl Orchestrator {
    pub async fn apply<L: LayoutEngine>(
        ctx: &mut EditContext<'_, L>,
        intent: &EditIntent,
    ) -> Result<EditOutcome, EditError> {
        let Some(kind) = EditKind::from_label(&intent.kind) else {
            return Err(EditError::UnknownKind {
                kind: intent.kind.clone(),
            });
        };
        match kind {
            EditKind::GeoOnly => handle_geo_only(ctx, intent),
            EditKind::FreeStructural => handle_free_structural(ctx, intent),
            EditKind::AiLockStructural => handle_lock_structural(ctx, intent).await,
        }
    }
}

/// `unlock-scope-to-free`: affects only the named scope.
pub fn unlock_scope_to_free(graph: &DiagramGraph, view: &mut ViewState, scope_id: &NodeId) {
    if graph
        .find_node(scope_id.as_str())
        .is_some_and(|node| node.is_group())
    {
        view.set_mode(scope_id.clone(), GroupMode::Free);
    }
}

/// `lock-scope-and-descendants`: recursively locks every group in the
/// subtree.
pub fn lock_scope_and_descendants(graph: &DiagramGraph, view: &mut ViewState, scope_id: &NodeId) {
    for id in graph.subtree_node_ids(scope_id.as_str()) {
        if graph
            .find_node(id.as_str())
            .is_some_and(|node| node.is_group())
        {
            view.set_mode(id, GroupMode::Lock);
        }
    }
}

fn parse_node_id(field: &'static str, value: &str) -> Result<NodeId, EditError> {
    NodeId::new(value).map_err(|source| EditError::InvalidId {
        field,
        value: value.to_owned(),
        source,
    })
}

fn parse_edge_id(field: &'static str, value: &str) -> Result<EdgeId, EditError> {
    EdgeId::new(value).map_err(|source| EditError::InvalidId {
        field,
        value: value.to_owned(),
        source,
    })
}

fn render_scene<L>(ctx: &mut EditContext<'_, L>) {
    let scene = build_scene(ctx.graph, ctx.view);
    ctx.renderer.render(&scene);
}

/// Pure drag/resize within an unchanged parent. Never touches the domain
/// graph or the layout engine.
fn handle_geo_only<L>(
    ctx: &mut EditContext<'_, L>,
    intent: &EditIntent,
) -> Result<EditOutcome, EditError> {
    match &intent.payload {
        EditPayload::MoveShape { node_id, x, y } => {
            let id = parse_node_id("node_id", node_id)?;
            let Some(node) = ctx.graph.find_node(id.as_str()) else {
                return Err(EditError::TargetNotFound {
                    id: node_id.clone(),
                });
            };
            if node.is_group() {
                let mut frame = ctx
                    .view
                    .group_view(&id)
                    .map(|group| group.frame)
                    .unwrap_or_default();
                frame.origin = Point::new(*x, *y);
                ctx.view.set_group_frame(id, frame);
            } else {
                ctx.view.set_node_position(id, Point::new(*x, *y));
            }
        }
        EditPayload::ResizeShape {
            node_id,
            width,
            height,
        } => {
            let id = parse_node_id("node_id", node_id)?;
            let Some(node) = ctx.graph.find_node(id.as_str()) else {
                return Err(EditError::TargetNotFound {
                    id: node_id.clone(),
                });
            };
            if node.is_group() {
                let mut frame = ctx
                    .view
                    .group_view(&id)
                    .map(|group| group.frame)
                    .unwrap_or_default();
                frame.size = Size::new(*width, *height);
                ctx.view.set_group_frame(id, frame);
            } else {
                ctx.view.set_node_size(id, Size::new(*width, *height));
            }
        }
        other => {
            return Err(EditError::PayloadMismatch {
                kind: EditKind::GeoOnly,
                action: other.action_label(),
            })
        }
    }

    render_scene(ctx);
    Ok(EditOutcome {
        kind: EditKind::GeoOnly,
        delta: Delta::default(),
        layout_ran: false,
    })
}

/// Structural edit inside a `Free` scope: mutate, sync the overlay, render.
/// The layout engine is never invoked on this path.
fn handle_free_structural<L>(
    ctx: &mut EditContext<'_, L>,
    intent: &EditIntent,
) -> Result<EditOutcome, EditError> {
    let delta = mutate_structure(ctx, intent, EditKind::FreeStructural)?;
    render_scene(ctx);
    Ok(EditOutcome {
        kind: EditKind::FreeStructural,
        delta,
        layout_ran: false,
    })
}

/// Structural edit that must be laid out: mutate, sync the overlay, run the
/// engine over the affected scope, merge, render.
async fn handle_lock_structural<L: LayoutEngine>(
    ctx: &mut EditContext<'_, L>,
    intent: &EditIntent,
) -> Result<EditOutcome, EditError> {
    let scope_id = parse_node_id("scope_id", &intent.scope_id)?;
    let delta = mutate_structure(ctx, intent, EditKind::AiLockStructural)?;
    let subtree = match extract_scope(ctx.graph, &scope_id) {
        Some(subtree) => subtree,
        None => {
            // The intent's scope vanished with the mutation (or never was a
            // group); lay out the whole document instead of failing the edit.
            warn!(scope = %scope_id, "scope not laid out; falling back to root");
            let root_id = ctx.graph.root_id().clone();
            let Some(subtree) = extract_scope(ctx.graph, &root_id) else {
                return Err(EditError::TargetNotFound {
                    id: root_id.into_string(),
                });
            };
            subtree
        }
    };

    let layout = ctx
        .engine
        .layout(&subtree, ctx.spacing)
        .await
        .map_err(EditError::Layout)?;
    let scope_id = subtree.scope_id().clone();
    merge_layout(ctx.view, ctx.graph, &scope_id, &layout);

    render_scene(ctx);
    Ok(EditOutcome {
        kind: EditKind::AiLockStructural,
        delta,
        layout_ran: true,
    })
}

/// Domain mutation shared by both structural tiers: translate the payload
/// into graph ops, apply them atomically, purge overlay entries for removed
/// ids in the same step, and invalidate the affected scope's layout cache.
fn mutate_structure<L>(
    ctx: &mut EditContext<'_, L>,
    intent: &EditIntent,
    kind: EditKind,
) -> Result<Delta, EditError> {
    let ops = structural_ops(ctx.graph, &intent.payload, kind)?;
    let (next, delta) = apply_batch(ctx.graph, &ops).map_err(EditError::Validation)?;
    *ctx.graph = next;
    ctx.view.purge_removed(&delta);
    if let Ok(scope_id) = NodeId::new(intent.scope_id.clone()) {
        ctx.view.invalidate_layout(&scope_id);
    }
    Ok(delta)
}

fn structural_ops(
    graph: &DiagramGraph,
    payload: &EditPayload,
    kind: EditKind,
) -> Result<Vec<GraphOp>, EditError> {
    let ops = match payload {
        EditPayload::AddNode {
            node_id,
            parent_id,
            label,
            icon,
            data,
            group,
        } => vec![GraphOp::AddNode {
            node_id: parse_node_id("node_id", node_id)?,
            parent_id: parse_node_id("parent_id", parent_id)?,
            label: label.clone(),
            icon: icon.clone(),
            data: data.clone(),
            group: *group,
        }],
        EditPayload::DeleteNode { node_id } => vec![GraphOp::DeleteNode {
            node_id: parse_node_id("node_id", node_id)?,
        }],
        EditPayload::ReparentNode {
            node_id,
            new_parent_id,
        } => vec![GraphOp::MoveNode {
            node_id: parse_node_id("node_id", node_id)?,
            new_parent_id: parse_node_id("new_parent_id", new_parent_id)?,
        }],
        EditPayload::AddEdge {
            edge_id,
            source_id,
            target_id,
            label,
        } => vec![GraphOp::AddEdge {
            edge_id: parse_edge_id("edge_id", edge_id)?,
            source_id: parse_node_id("source_id", source_id)?,
            target_id: parse_node_id("target_id", target_id)?,
            label: label.clone(),
        }],
        EditPayload::DeleteEdge { edge_id } => vec![GraphOp::DeleteEdge {
            edge_id: parse_edge_id("edge_id", edge_id)?,
        }],
        EditPayload::GroupSelection {
            group_id,
            node_ids,
            label,
            icon,
        } => {
            let parent_id = query::lowest_common_group(graph, node_ids)
                .ok_or(EditError::NoSelectionScope)?;
            let mut members = Vec::with_capacity(node_ids.len());
            for node_id in node_ids {
                members.push(parse_node_id("node_ids", node_id)?);
            }
            vec![GraphOp::GroupNodes {
                group_id: parse_node_id("group_id", group_id)?,
                parent_id,
                node_ids: members,
                label: label.clone(),
                icon: icon.clone(),
            }]
        }
        EditPayload::DissolveGroup { group_id } => vec![GraphOp::RemoveGroup {
            group_id: parse_node_id("group_id", group_id)?,
        }],
        EditPayload::MoveShape { .. } | EditPayload::ResizeShape { .. } => {
            return Err(EditError::PayloadMismatch {
                kind,
                action: payload.action_label(),
            })
        }
    };
    Ok(ops)
}

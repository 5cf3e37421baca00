// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Domain model: the canonical diagram tree and its geometry overlay.

pub mod fixtures;
pub mod graph;
pub mod ids;
pub mod view_state;

pub use graph::{DiagramGraph, Edge, GraphNode, ROOT_NODE_ID};
pub use ids::{EdgeId, Id, IdError, NodeId, SessionId};
pub use view_state::{
    EdgeView, GroupMode, GroupView, NodeView, Point, Rect, ScopeLayout, Size, ViewState,
};

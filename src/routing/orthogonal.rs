// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::model::{NodeId, Point};

use super::{
    ConnectionHandle, RouteExtractionError, RouterCommitError, TransactionRouter,
};

/// Minimal built-in router: L-shaped routes between node anchors.
///
/// No obstacle avoidance. Anchors are pushed in from outside (typically the
/// centers of laid-out node frames); connections without both anchors fail
/// extraction individually, like any router-side miss would.
#[derive(Debug, Default)]
pub struct OrthogonalRouter {
    next_raw: u64,
    connections: BTreeMap<ConnectionHandle, (NodeId, NodeId)>,
    anchors: BTreeMap<NodeId, Point>,
    committed: BTreeMap<ConnectionHandle, Vec<Point>>,
}

impl OrthogonalRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_anchor(&mut self, node_id: NodeId, anchor: Point) {
        self.anchors.insert(node_id, anchor);
    }

    pub fn clear_anchors(&mut self) {
        self.anchors.clear();
    }
}

fn l_route(from: Point, to: Point) -> Vec<Point> {
    if from.x == to.x || from.y == to.y {
        return vec![from, to];
    }
    vec![from, Point::new(from.x, to.y), to]
}

impl TransactionRouter for OrthogonalRouter {
    fn connect(&mut self, source_id: &NodeId, target_id: &NodeId) -> ConnectionHandle {
        self.next_raw += 1;
        let handle = ConnectionHandle::from_raw(self.next_raw);
        self.connections
            .insert(handle, (source_id.clone(), target_id.clone()));
        handle
    }

    fn commit_transaction(&mut self) -> Result<(), RouterCommitError> {
        self.committed.clear();
        for (handle, (source_id, target_id)) in &self.connections {
            let (Some(source), Some(target)) =
                (self.anchors.get(source_id), self.anchors.get(target_id))
            else {
                continue;
            };
            self.committed.insert(*handle, l_route(*source, *target));
        }
        Ok(())
    }

    fn route_points(&self, handle: &ConnectionHandle) -> Result<Vec<Point>, RouteExtractionError> {
        if !self.connections.contains_key(handle) {
            return Err(RouteExtractionError::new("unknown connection"));
        }
        self.committed
            .get(handle)
            .cloned()
            .ok_or_else(|| RouteExtractionError::new("no route for connection; anchors missing"))
    }
}

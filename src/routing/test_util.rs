// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Router fake shared by the routing tests.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{NodeId, Point};

use super::{
    ConnectionHandle, RouteExtractionError, RouterCommitError, TransactionRouter,
};

/// Counts transaction commits and mints sequential handles. Routes are
/// synthetic two-point sequences derived from the handle value.
pub(crate) struct CountingRouter {
    next_raw: u64,
    connected: BTreeMap<ConnectionHandle, (NodeId, NodeId)>,
    pub(crate) commits: usize,
    pub(crate) fail_next_commit: bool,
    pub(crate) failing_handles: BTreeSet<ConnectionHandle>,
}

impl CountingRouter {
    pub(crate) fn new() -> Self {
        Self {
            next_raw: 0,
            connected: BTreeMap::new(),
            commits: 0,
            fail_next_commit: false,
            failing_handles: BTreeSet::new(),
        }
    }
}

impl TransactionRouter for CountingRouter {
    fn connect(&mut self, source_id: &NodeId, target_id: &NodeId) -> ConnectionHandle {
        self.next_raw += 1;
        let handle = ConnectionHandle::from_raw(self.next_raw);
        self.connected
            .insert(handle, (source_id.clone(), target_id.clone()));
        handle
    }

    fn commit_transaction(&mut self) -> Result<(), RouterCommitError> {
        if self.fail_next_commit {
            self.fail_next_commit = false;
            return Err(RouterCommitError::new("synthetic commit failure"));
        }
        self.commits += 1;
        Ok(())
    }

    fn route_points(&self, handle: &ConnectionHandle) -> Result<Vec<Point>, RouteExtractionError> {
        if self.failing_handles.contains(handle) {
            return Err(RouteExtractionError::new("synthetic extraction failure"));
        }
        if !self.connected.contains_key(handle) {
            return Err(RouteExtractionError::new("unknown connection"));
        }
        let raw = handle.into_raw() as f64;
        Ok(vec![Point::new(0.0, raw), Point::new(raw, raw)])
    }
}

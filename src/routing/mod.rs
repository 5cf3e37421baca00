// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Boundary to the obstacle-avoiding edge router, plus the coordinator that
//! amortizes many independently-created edges into one router transaction.
//!
//! The router recomputes all pending connections together in a single
//! transaction commit; calling it per edge would defeat it. The coordinator
//! collects registrations inside a batch window and guarantees at most one
//! commit per window.

use std::fmt;

use crate::model::{EdgeId, NodeId, Point};

pub mod coordinator;
pub mod driver;
pub mod orthogonal;
#[cfg(test)]
pub(crate) mod test_util;

pub use coordinator::{BatchCoordinator, BatchOutcome, BatchState, CoordinatorEffect};
pub use driver::{RoutingDriver, RoutingDriverConfig};
pub use orthogonal::OrthogonalRouter;

/// Opaque capability minted by a router for one edge's connection.
///
/// Only the router that minted a handle can interpret it; everything else
/// carries it around without looking inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle {
    raw: u64,
}

impl ConnectionHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self { raw }
    }

    pub fn into_raw(self) -> u64 {
        self.raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterCommitError {
    reason: String,
}

impl RouterCommitError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for RouterCommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "router transaction failed: {}", self.reason)
    }
}

impl std::error::Error for RouterCommitError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteExtractionError {
    reason: String,
}

impl RouteExtractionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for RouteExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route extraction failed: {}", self.reason)
    }
}

impl std::error::Error for RouteExtractionError {}

/// External obstacle-avoiding edge router.
///
/// One connection handle per edge, one transaction commit that recomputes all
/// pending connections together, one display-route query per connection.
pub trait TransactionRouter {
    fn connect(&mut self, source_id: &NodeId, target_id: &NodeId) -> ConnectionHandle;

    fn commit_transaction(&mut self) -> Result<(), RouterCommitError>;

    fn route_points(&self, handle: &ConnectionHandle) -> Result<Vec<Point>, RouteExtractionError>;
}

/// One edge's entry in the coordinator, alive from registration until its
/// batch completes, then kept as the owner of the cached route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRegistration {
    edge_id: EdgeId,
    handle: ConnectionHandle,
    source_id: NodeId,
    target_id: NodeId,
}

impl EdgeRegistration {
    pub fn new(
        edge_id: EdgeId,
        handle: ConnectionHandle,
        source_id: NodeId,
        target_id: NodeId,
    ) -> Self {
        Self {
            edge_id,
            handle,
            source_id,
            target_id,
        }
    }

    pub fn edge_id(&self) -> &EdgeId {
        &self.edge_id
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn source_id(&self) -> &NodeId {
        &self.source_id
    }

    pub fn target_id(&self) -> &NodeId {
        &self.target_id
    }

    pub fn endpoints_match(&self, other: &EdgeRegistration) -> bool {
        self.source_id == other.source_id && self.target_id == other.target_id
    }
}

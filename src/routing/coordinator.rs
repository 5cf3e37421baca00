// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::model::{EdgeId, Point};

use super::{EdgeRegistration, RouterCommitError, TransactionRouter};

/// Invoked once an edge's route has been computed.
pub type RouteReadyCallback = Box<dyn FnMut(&EdgeId, &[Point]) + Send>;

/// Lifecycle of one batch window.
///
/// `Collecting` accumulates registrations, `Scheduled` means the debounce
/// timer is armed, `Committing` is the monotonic in-flight guard: once
/// entered, later registrations park for the next window and stale timer
/// events are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Collecting,
    Scheduled,
    Committing,
}

/// Instruction to the timer-owning driver. The state machine itself never
/// touches a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorEffect {
    #[default]
    None,
    ArmMaxWait,
    ArmDebounce,
    CancelTimers,
    Commit,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub routed: usize,
    pub extraction_failures: Vec<EdgeId>,
    pub followup: CoordinatorEffect,
}

/// Collects edge registrations and serializes them into single router
/// transactions, one per batch window.
#[derive(Default)]
pub struct BatchCoordinator {
    state: BatchState,
    expected: Option<usize>,
    registrations: BTreeMap<EdgeId, EdgeRegistration>,
    window: BTreeSet<EdgeId>,
    parked: Vec<EdgeId>,
    routes: BTreeMap<EdgeId, Vec<Point>>,
    callbacks: BTreeMap<EdgeId, Vec<RouteReadyCallback>>,
    obstacle_signature: Option<String>,
}

impl std::fmt::Debug for BatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchCoordinator")
            .field("state", &self.state)
            .field("expected", &self.expected)
            .field("registrations", &self.registrations.len())
            .field("window", &self.window.len())
            .field("parked", &self.parked.len())
            .field("routes", &self.routes.len())
            .finish_non_exhaustive()
    }
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn registered_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn pending_count(&self) -> usize {
        self.window.len() + self.parked.len()
    }

    pub fn route(&self, edge_id: &EdgeId) -> Option<&[Point]> {
        self.routes.get(edge_id).map(Vec::as_slice)
    }

    pub fn obstacle_signature(&self) -> Option<&str> {
        self.obstacle_signature.as_deref()
    }

    /// Records how many edges the current batch expects. Scheduling proceeds
    /// immediately when that many are already registered and no batch is in
    /// flight.
    pub fn set_expected_edge_count(&mut self, count: usize) -> CoordinatorEffect {
        self.expected = Some(count);
        if matches!(self.state, BatchState::Collecting)
            && !self.window.is_empty()
            && self.registrations.len() >= count
        {
            self.state = BatchState::Scheduled;
            return CoordinatorEffect::ArmDebounce;
        }
        CoordinatorEffect::None
    }

    /// Registers an edge for routing.
    ///
    /// A registration whose route is already cached (same endpoints) is
    /// answered from the cache without opening a window; a genuinely new
    /// edge after a completed batch reopens a fresh window instead of
    /// re-routing everything already computed.
    pub fn register_edge(
        &mut self,
        registration: EdgeRegistration,
        callback: Option<RouteReadyCallback>,
    ) -> CoordinatorEffect {
        let edge_id = registration.edge_id().clone();

        let unchanged = self
            .registrations
            .get(&edge_id)
            .is_some_and(|known| known.endpoints_match(&registration));
        if unchanged {
            if let Some(mut callback) = callback {
                if let Some(route) = self.routes.get(&edge_id) {
                    callback(&edge_id, route);
                }
                self.callbacks.entry(edge_id).or_default().push(callback);
            }
            return CoordinatorEffect::None;
        }

        self.routes.remove(&edge_id);
        self.registrations.insert(edge_id.clone(), registration);
        if let Some(callback) = callback {
            self.callbacks
                .entry(edge_id.clone())
                .or_default()
                .push(callback);
        }

        match self.state {
            BatchState::Committing => {
                self.parked.push(edge_id);
                CoordinatorEffect::None
            }
            BatchState::Idle => {
                self.state = BatchState::Collecting;
                self.window.insert(edge_id);
                if self.expected_reached() {
                    self.state = BatchState::Scheduled;
                    CoordinatorEffect::ArmDebounce
                } else {
                    CoordinatorEffect::ArmMaxWait
                }
            }
            BatchState::Collecting => {
                self.window.insert(edge_id);
                if self.expected_reached() {
                    self.state = BatchState::Scheduled;
                    CoordinatorEffect::ArmDebounce
                } else {
                    CoordinatorEffect::None
                }
            }
            // Joins the in-flight window; the armed timer covers it.
            BatchState::Scheduled => {
                self.window.insert(edge_id);
                CoordinatorEffect::None
            }
        }
    }

    fn expected_reached(&self) -> bool {
        self.expected
            .is_some_and(|count| self.registrations.len() >= count)
    }

    /// Debounce timer fired. A stale event (window already committed or
    /// cleared) is ignored.
    pub fn debounce_elapsed(&mut self) -> CoordinatorEffect {
        match self.state {
            BatchState::Scheduled => {
                self.state = BatchState::Committing;
                CoordinatorEffect::Commit
            }
            _ => CoordinatorEffect::None,
        }
    }

    /// Maximum-wait timer fired: commit whatever has accumulated, bounding
    /// worst-case latency when the expected count is unknown or
    /// under-reported.
    pub fn max_wait_elapsed(&mut self) -> CoordinatorEffect {
        match self.state {
            BatchState::Collecting | BatchState::Scheduled if !self.window.is_empty() => {
                self.state = BatchState::Committing;
                CoordinatorEffect::Commit
            }
            _ => CoordinatorEffect::None,
        }
    }

    /// Runs the router transaction for the current window: exactly one
    /// commit, then one route extraction per registered edge.
    ///
    /// A commit failure leaves the window intact (no edge is marked
    /// processed) so the batch can be retried. An extraction failure is
    /// isolated to its edge and logged; the rest of the batch proceeds.
    pub fn process_batch<R: TransactionRouter>(
        &mut self,
        router: &mut R,
    ) -> Result<BatchOutcome, RouterCommitError> {
        if self.state != BatchState::Committing {
            debug!(state = ?self.state, "ignoring spurious process_batch");
            return Ok(BatchOutcome::default());
        }

        if let Err(err) = router.commit_transaction() {
            self.state = BatchState::Collecting;
            return Err(err);
        }

        let batch: Vec<EdgeId> = self.window.iter().cloned().collect();
        let mut outcome = BatchOutcome::default();
        for edge_id in batch {
            self.window.remove(&edge_id);
            let Some(registration) = self.registrations.get(&edge_id) else {
                continue;
            };
            match router.route_points(registration.handle()) {
                Ok(points) => {
                    for callback in self.callbacks.entry(edge_id.clone()).or_default() {
                        callback(&edge_id, &points);
                    }
                    self.routes.insert(edge_id, points);
                    outcome.routed += 1;
                }
                Err(err) => {
                    warn!(edge = %edge_id, error = %err, "route extraction failed");
                    outcome.extraction_failures.push(edge_id);
                }
            }
        }

        if self.parked.is_empty() {
            self.state = BatchState::Idle;
        } else {
            self.window.extend(self.parked.drain(..));
            self.state = BatchState::Collecting;
            outcome.followup = CoordinatorEffect::ArmMaxWait;
        }
        debug!(
            routed = outcome.routed,
            failed = outcome.extraction_failures.len(),
            state = ?self.state,
            "batch window committed"
        );
        Ok(outcome)
    }

    /// Invalidates all cached routes and registrations because obstacle
    /// geometry changed materially. The router identity is untouched;
    /// subsequent registrations need no re-initialization.
    pub fn force_reprocess(&mut self, new_obstacle_signature: Option<String>) -> CoordinatorEffect {
        self.routes.clear();
        self.registrations.clear();
        self.window.clear();
        self.parked.clear();
        self.callbacks.clear();
        if let Some(signature) = new_obstacle_signature {
            self.obstacle_signature = Some(signature);
        }
        self.state = BatchState::Idle;
        CoordinatorEffect::CancelTimers
    }

    /// Full teardown, used on router replacement.
    pub fn reset(&mut self) -> CoordinatorEffect {
        self.force_reprocess(None);
        self.expected = None;
        self.obstacle_signature = None;
        CoordinatorEffect::CancelTimers
    }
}

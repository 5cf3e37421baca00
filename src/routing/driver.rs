// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::model::{EdgeId, NodeId, Point};

use super::coordinator::{BatchCoordinator, BatchState, CoordinatorEffect, RouteReadyCallback};
use super::{EdgeRegistration, TransactionRouter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDriverConfig {
    /// Settle time after the expected count is reached.
    pub debounce: Duration,
    /// Upper bound on how long an underfilled window may wait.
    pub max_wait: Duration,
}

impl Default for RoutingDriverConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(40),
            max_wait: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Debounce,
    MaxWait,
}

#[derive(Default)]
struct Timers {
    debounce: Option<JoinHandle<()>>,
    max_wait: Option<JoinHandle<()>>,
}

impl Timers {
    fn cancel_all(&mut self) {
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
        if let Some(handle) = self.max_wait.take() {
            handle.abort();
        }
    }
}

struct DriverInner<R> {
    coordinator: Mutex<BatchCoordinator>,
    router: Mutex<R>,
    config: RoutingDriverConfig,
    timers: std::sync::Mutex<Timers>,
}

/// Owns the batch timers and drives the coordinator state machine against
/// one exclusively-held router instance.
///
/// Lock order is coordinator before router, everywhere. Route-ready
/// callbacks run while the coordinator lock is held and must not call back
/// into the driver.
pub struct RoutingDriver<R> {
    inner: Arc<DriverInner<R>>,
}

impl<R> Clone for RoutingDriver<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: TransactionRouter + Send + 'static> RoutingDriver<R> {
    pub fn new(router: R, config: RoutingDriverConfig) -> Self {
        Self {
            inner: Arc::new(DriverInner {
                coordinator: Mutex::new(BatchCoordinator::new()),
                router: Mutex::new(router),
                config,
                timers: std::sync::Mutex::new(Timers::default()),
            }),
        }
    }

    pub async fn set_expected_edge_count(&self, count: usize) {
        let effect = self
            .inner
            .coordinator
            .lock()
            .await
            .set_expected_edge_count(count);
        self.apply_effect(effect);
    }

    /// Mints a connection for the edge and registers it for the next batch.
    pub async fn register_edge(
        &self,
        edge_id: EdgeId,
        source_id: NodeId,
        target_id: NodeId,
        callback: Option<RouteReadyCallback>,
    ) {
        let handle = self
            .inner
            .router
            .lock()
            .await
            .connect(&source_id, &target_id);
        let registration = EdgeRegistration::new(edge_id, handle, source_id, target_id);
        let effect = self
            .inner
            .coordinator
            .lock()
            .await
            .register_edge(registration, callback);
        self.apply_effect(effect);
    }

    pub async fn force_reprocess(&self, new_obstacle_signature: Option<String>) {
        let effect = self
            .inner
            .coordinator
            .lock()
            .await
            .force_reprocess(new_obstacle_signature);
        self.apply_effect(effect);
    }

    pub async fn reset(&self) {
        let effect = self.inner.coordinator.lock().await.reset();
        self.apply_effect(effect);
    }

    /// Swaps in a new router identity. The coordinator is fully reset before
    /// any registration against the new instance is accepted.
    pub async fn replace_router(&self, router: R) {
        self.reset().await;
        *self.inner.router.lock().await = router;
    }

    /// Grants brief mutable access to the router, for pushing obstacle
    /// geometry updates to it.
    pub async fn with_router<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        let mut router = self.inner.router.lock().await;
        f(&mut router)
    }

    pub async fn route(&self, edge_id: &EdgeId) -> Option<Vec<Point>> {
        self.inner
            .coordinator
            .lock()
            .await
            .route(edge_id)
            .map(<[Point]>::to_vec)
    }

    pub async fn batch_state(&self) -> BatchState {
        self.inner.coordinator.lock().await.state()
    }

    fn apply_effect(&self, effect: CoordinatorEffect) {
        match effect {
            CoordinatorEffect::None => {}
            CoordinatorEffect::ArmDebounce => self.arm(TimerKind::Debounce),
            CoordinatorEffect::ArmMaxWait => self.arm(TimerKind::MaxWait),
            CoordinatorEffect::CancelTimers => {
                self.inner.timers.lock().expect("timer lock").cancel_all();
            }
            CoordinatorEffect::Commit => {
                let inner = self.inner.clone();
                tokio::spawn(async move {
                    run_commit(inner, None).await;
                });
            }
        }
    }

    fn arm(&self, kind: TimerKind) {
        let mut timers = self.inner.timers.lock().expect("timer lock");
        match kind {
            TimerKind::Debounce => {
                if let Some(handle) = timers.debounce.take() {
                    handle.abort();
                }
                timers.debounce = Some(spawn_timer(
                    self.inner.clone(),
                    self.inner.config.debounce,
                    kind,
                ));
            }
            TimerKind::MaxWait => {
                // The max-wait bound runs from the window opening; an armed
                // timer is never restarted by later registrations.
                if timers.max_wait.is_none() {
                    timers.max_wait = Some(spawn_timer(
                        self.inner.clone(),
                        self.inner.config.max_wait,
                        kind,
                    ));
                }
            }
        }
    }
}

fn spawn_timer<R: TransactionRouter + Send + 'static>(
    inner: Arc<DriverInner<R>>,
    delay: Duration,
    kind: TimerKind,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let effect = {
            let mut coordinator = inner.coordinator.lock().await;
            match kind {
                TimerKind::Debounce => coordinator.debounce_elapsed(),
                TimerKind::MaxWait => coordinator.max_wait_elapsed(),
            }
        };
        if effect == CoordinatorEffect::Commit {
            run_commit(inner, Some(kind)).await;
        }
    })
}

async fn run_commit<R: TransactionRouter + Send + 'static>(
    inner: Arc<DriverInner<R>>,
    fired: Option<TimerKind>,
) {
    {
        // Drop the fired timer's own handle without aborting it; abort the
        // sibling so it cannot fire into the committed window.
        let mut timers = inner.timers.lock().expect("timer lock");
        match fired {
            Some(TimerKind::Debounce) => {
                timers.debounce.take();
                if let Some(handle) = timers.max_wait.take() {
                    handle.abort();
                }
            }
            Some(TimerKind::MaxWait) => {
                timers.max_wait.take();
                if let Some(handle) = timers.debounce.take() {
                    handle.abort();
                }
            }
            None => timers.cancel_all(),
        }
    }

    let mut coordinator = inner.coordinator.lock().await;
    let mut router = inner.router.lock().await;
    match coordinator.process_batch(&mut *router) {
        Ok(outcome) => {
            if outcome.followup == CoordinatorEffect::ArmMaxWait {
                drop(router);
                drop(coordinator);
                let mut timers = inner.timers.lock().expect("timer lock");
                if timers.max_wait.is_none() {
                    timers.max_wait = Some(spawn_timer(
                        inner.clone(),
                        inner.config.max_wait,
                        TimerKind::MaxWait,
                    ));
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "batch commit failed; window kept for retry");
            drop(router);
            drop(coordinator);
            let mut timers = inner.timers.lock().expect("timer lock");
            if timers.max_wait.is_none() {
                timers.max_wait = Some(spawn_timer(
                    inner.clone(),
                    inner.config.max_wait,
                    TimerKind::MaxWait,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time;

    use super::{RoutingDriver, RoutingDriverConfig};
    use crate::model::{EdgeId, NodeId};
    use crate::routing::coordinator::BatchState;
    use crate::routing::test_util::CountingRouter;

    fn eid(value: &str) -> EdgeId {
        EdgeId::new(value).expect("edge id")
    }

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    fn driver() -> RoutingDriver<CountingRouter> {
        RoutingDriver::new(
            CountingRouter::new(),
            RoutingDriverConfig {
                debounce: Duration::from_millis(40),
                max_wait: Duration::from_millis(500),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn expected_count_triggers_one_commit_for_all_edges() {
        let driver = driver();
        let fired = Arc::new(AtomicUsize::new(0));

        driver.set_expected_edge_count(3).await;
        for (edge, source, target) in [("e:1", "a", "b"), ("e:2", "b", "c"), ("e:3", "c", "a")] {
            let fired = fired.clone();
            driver
                .register_edge(
                    eid(edge),
                    nid(source),
                    nid(target),
                    Some(Box::new(move |_, _| {
                        fired.fetch_add(1, Ordering::SeqCst);
                    })),
                )
                .await;
        }

        time::sleep(Duration::from_millis(60)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert_eq!(driver.with_router(|router| router.commits).await, 1);
        assert_eq!(driver.batch_state().await, BatchState::Idle);
        assert!(driver.route(&eid("e:2")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn max_wait_bounds_latency_when_expectation_is_under_reported() {
        let driver = driver();

        driver.set_expected_edge_count(10).await;
        driver.register_edge(eid("e:1"), nid("a"), nid("b"), None).await;

        // Debounce never arms; the window commits at the max-wait bound.
        time::sleep(Duration::from_millis(400)).await;
        assert_eq!(driver.with_router(|router| router.commits).await, 0);

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(driver.with_router(|router| router.commits).await, 1);
        assert!(driver.route(&eid("e:1")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn incremental_edge_reopens_a_window_without_rerouting_the_rest() {
        let driver = driver();

        driver.set_expected_edge_count(2).await;
        driver.register_edge(eid("e:1"), nid("a"), nid("b"), None).await;
        driver.register_edge(eid("e:2"), nid("b"), nid("c"), None).await;
        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(driver.with_router(|router| router.commits).await, 1);

        driver.register_edge(eid("e:3"), nid("c"), nid("a"), None).await;
        time::sleep(Duration::from_millis(60)).await;

        assert_eq!(driver.with_router(|router| router.commits).await, 2);
        assert!(driver.route(&eid("e:3")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn commit_failure_retries_at_the_next_max_wait_bound() {
        let driver = driver();

        driver.with_router(|router| router.fail_next_commit = true).await;
        driver.set_expected_edge_count(1).await;
        driver.register_edge(eid("e:1"), nid("a"), nid("b"), None).await;

        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(driver.with_router(|router| router.commits).await, 0);
        assert_eq!(driver.batch_state().await, BatchState::Collecting);

        time::sleep(Duration::from_millis(600)).await;
        assert_eq!(driver.with_router(|router| router.commits).await, 1);
        assert!(driver.route(&eid("e:1")).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_a_pending_window() {
        let driver = driver();

        driver.set_expected_edge_count(1).await;
        driver.register_edge(eid("e:1"), nid("a"), nid("b"), None).await;
        driver.reset().await;

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(driver.with_router(|router| router.commits).await, 0);
        assert_eq!(driver.batch_state().await, BatchState::Idle);
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One active diagram session: the dependency-injected context object that
//! owns the graph, the geometry overlay, and the collaborator boundaries.
//!
//! Constructed per session, passed explicitly, never a process-wide
//! singleton; two sessions (or two test runs) share nothing.

use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::edit::{
    classify_edit, resolve_scope, EditContext, EditError, EditIntent, EditOutcome, EditPayload,
    EditSource, Orchestrator,
};
use crate::layout::{extract_scope, merge_layout, LayoutEngine, LayoutSpacing};
use crate::model::{DiagramGraph, EdgeId, NodeId, Point, ViewState};
use crate::ops::Delta;
use crate::render::{build_scene, Renderer, Scene};
use crate::routing::{RoutingDriver, RoutingDriverConfig, TransactionRouter};
use crate::store::{SessionFile, SessionSnapshot};

/// Notified whenever the domain graph changed shape (edits, restore, reset).
pub trait SessionListener {
    fn graph_changed(&mut self, graph: &DiagramGraph);
}

pub struct DiagramSession<L, R: TransactionRouter + Send + 'static> {
    graph: DiagramGraph,
    view: ViewState,
    engine: L,
    spacing: LayoutSpacing,
    routing: RoutingDriver<R>,
    store: Option<SessionFile>,
    renderer: Box<dyn Renderer>,
    listeners: Vec<Box<dyn SessionListener>>,
    route_updates: Arc<Mutex<Vec<(EdgeId, Vec<Point>)>>>,
    persistence_degraded: bool,
}

impl<L, R> DiagramSession<L, R>
where
    L: LayoutEngine,
    R: TransactionRouter + Send + 'static,
{
    pub fn new(engine: L, router: R, renderer: Box<dyn Renderer>) -> Self {
        Self::new_with(engine, router, renderer, RoutingDriverConfig::default())
    }

    pub fn new_with(
        engine: L,
        router: R,
        renderer: Box<dyn Renderer>,
        routing_config: RoutingDriverConfig,
    ) -> Self {
        Self {
            graph: DiagramGraph::new(),
            view: ViewState::new(),
            engine,
            spacing: LayoutSpacing::default(),
            routing: RoutingDriver::new(router, routing_config),
            store: None,
            renderer,
            listeners: Vec::new(),
            route_updates: Arc::new(Mutex::new(Vec::new())),
            persistence_degraded: false,
        }
    }

    pub fn with_spacing(mut self, spacing: LayoutSpacing) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn graph(&self) -> &DiagramGraph {
        &self.graph
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn routing(&self) -> &RoutingDriver<R> {
        &self.routing
    }

    pub fn persistence_degraded(&self) -> bool {
        self.persistence_degraded
    }

    pub fn add_listener(&mut self, listener: Box<dyn SessionListener>) {
        self.listeners.push(listener);
    }

    /// Attaches persistence and restores the stored snapshot. A missing file
    /// falls back to `default`; a stored snapshot — even an empty one —
    /// always wins over the default. Storage failure degrades the session to
    /// in-memory-only operation.
    pub async fn attach_store(
        &mut self,
        store: SessionFile,
        default: impl FnOnce() -> SessionSnapshot,
    ) {
        match store.load_or_default(default) {
            Ok(snapshot) => {
                self.store = Some(store);
                self.restore(snapshot).await;
            }
            Err(err) => {
                warn!(error = %err, "cannot read session store; running in-memory only");
                self.persistence_degraded = true;
            }
        }
    }

    /// Replaces graph and overlay atomically from a snapshot and re-registers
    /// every edge for routing.
    pub async fn restore(&mut self, snapshot: SessionSnapshot) {
        self.graph = snapshot.graph;
        self.view = snapshot.view;
        // Entries for ids the snapshot's graph does not know are ghosts.
        self.view.retain_existing(&self.graph);

        self.routing.reset().await;
        self.register_all_edges().await;

        self.notify_listeners();
        self.render();
    }

    /// Invalidates every cached route — obstacle geometry changed materially
    /// — and re-registers all current edges for one fresh batch. The router
    /// instance keeps its identity.
    pub async fn reroute_all(&mut self, obstacle_signature: Option<String>) {
        self.routing.force_reprocess(obstacle_signature).await;
        self.register_all_edges().await;
    }

    async fn register_all_edges(&mut self) {
        let edges: Vec<(EdgeId, NodeId, NodeId)> = self
            .graph
            .edges()
            .into_iter()
            .map(|edge| {
                (
                    edge.id().clone(),
                    edge.source_id().clone(),
                    edge.target_id().clone(),
                )
            })
            .collect();
        self.routing.set_expected_edge_count(edges.len()).await;
        for (edge_id, source_id, target_id) in edges {
            let callback = self.route_update_callback();
            self.routing
                .register_edge(edge_id, source_id, target_id, Some(callback))
                .await;
        }
    }

    /// Builds a classified intent for a raw action, stamping the routing
    /// tier the policy derives from source, payload, and scope mode.
    pub fn intent_for(&self, source: EditSource, payload: EditPayload) -> EditIntent {
        let scope_id = resolve_scope(&self.graph, &payload)
            .unwrap_or_else(|| self.graph.root_id().clone());
        let kind = classify_edit(source, &payload, &scope_id, &self.view);
        EditIntent {
            source,
            kind: kind.label().to_owned(),
            scope_id: scope_id.into_string(),
            payload,
        }
    }

    /// Routes one intent through the orchestrator, then wires new edges into
    /// the batch routing coordinator and persists the session.
    pub async fn apply(&mut self, intent: &EditIntent) -> Result<EditOutcome, EditError> {
        let outcome = {
            let mut ctx = EditContext {
                graph: &mut self.graph,
                view: &mut self.view,
                engine: &self.engine,
                spacing: &self.spacing,
                renderer: self.renderer.as_mut(),
            };
            Orchestrator::apply(&mut ctx, intent).await?
        };

        self.register_added_edges(&outcome.delta).await;
        self.drain_route_updates();
        self.persist();
        if !outcome.delta.is_empty() {
            self.notify_listeners();
        }
        Ok(outcome)
    }

    /// Runs the layout engine over one scope outside of any edit, e.g. for a
    /// freshly loaded session without geometry.
    pub async fn relayout_scope(&mut self, scope_id: &NodeId) -> Result<(), EditError> {
        let Some(subtree) = extract_scope(&self.graph, scope_id) else {
            return Err(EditError::TargetNotFound {
                id: scope_id.as_str().to_owned(),
            });
        };
        let layout = self
            .engine
            .layout(&subtree, &self.spacing)
            .await
            .map_err(EditError::Layout)?;
        merge_layout(&mut self.view, &self.graph, scope_id, &layout);
        self.persist();
        self.render();
        Ok(())
    }

    /// `unlock-scope-to-free` on one group.
    pub fn unlock_scope_to_free(&mut self, scope_id: &NodeId) {
        crate::edit::unlock_scope_to_free(&self.graph, &mut self.view, scope_id);
        self.persist();
    }

    /// `lock-scope-and-descendants` on a group and every group below it.
    pub fn lock_scope_and_descendants(&mut self, scope_id: &NodeId) {
        crate::edit::lock_scope_and_descendants(&self.graph, &mut self.view, scope_id);
        self.persist();
    }

    /// Clears the domain graph, the overlay, the routing state, and the
    /// persisted snapshot in one step, then notifies listeners.
    ///
    /// The cleared state is *saved* (as an explicitly empty snapshot) rather
    /// than deleted, so the next load never resurrects default content.
    pub async fn reset(&mut self) {
        self.graph = DiagramGraph::new();
        self.view = ViewState::new();
        self.routing.reset().await;
        self.route_updates.lock().expect("route updates lock").clear();
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&SessionSnapshot::empty()) {
                warn!(error = %err, "cannot persist cleared session");
                self.persistence_degraded = true;
            }
        }
        self.notify_listeners();
        self.render();
    }

    /// Moves completed batch routes from the coordinator callbacks into the
    /// overlay. Called after edits; callers driving timers manually (tests,
    /// the CLI) call it again once batches have committed.
    pub fn drain_route_updates(&mut self) {
        let updates: Vec<(EdgeId, Vec<Point>)> = {
            let mut queue = self.route_updates.lock().expect("route updates lock");
            queue.drain(..).collect()
        };
        for (edge_id, route) in updates {
            if self.graph.contains_edge(edge_id.as_str()) {
                self.view.set_edge_route(edge_id, route);
            }
        }
    }

    pub fn scene(&self) -> Scene {
        build_scene(&self.graph, &self.view)
    }

    pub fn render(&mut self) {
        let scene = build_scene(&self.graph, &self.view);
        self.renderer.render(&scene);
    }

    fn route_update_callback(&self) -> crate::routing::coordinator::RouteReadyCallback {
        let updates = self.route_updates.clone();
        Box::new(move |edge_id: &EdgeId, points: &[Point]| {
            updates
                .lock()
                .expect("route updates lock")
                .push((edge_id.clone(), points.to_vec()));
        })
    }

    async fn register_added_edges(&mut self, delta: &Delta) {
        for edge_id in delta.added_edge_ids() {
            let Some(edge) = self.graph.find_edge(edge_id.as_str()) else {
                continue;
            };
            let callback = self.route_update_callback();
            let (edge_id, source_id, target_id) = (
                edge.id().clone(),
                edge.source_id().clone(),
                edge.target_id().clone(),
            );
            self.routing
                .register_edge(edge_id, source_id, target_id, Some(callback))
                .await;
        }
    }

    fn persist(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        let snapshot = SessionSnapshot {
            graph: self.graph.clone(),
            view: self.view.clone(),
        };
        match store.save(&snapshot) {
            Ok(()) => {
                self.persistence_degraded = false;
            }
            Err(err) => {
                if !self.persistence_degraded {
                    warn!(error = %err, "cannot persist session; degrading to in-memory only");
                }
                self.persistence_degraded = true;
            }
        }
    }

    fn notify_listeners(&mut self) {
        for listener in &mut self.listeners {
            listener.graph_changed(&self.graph);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use super::{DiagramSession, SessionListener};
    use crate::edit::{EditPayload, EditSource};
    use crate::layout::StackedLayoutEngine;
    use crate::model::{fixtures, DiagramGraph, EdgeId, GroupMode, NodeId};
    use crate::render::NullRenderer;
    use crate::routing::test_util::CountingRouter;
    use crate::store::{SessionFile, SessionSnapshot};

    static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: std::path::PathBuf,
    }

    impl TempDir {
        fn new(prefix: &str) -> Self {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos();
            let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut path = env::temp_dir();
            path.push(format!(
                "proteus-{prefix}-{}-{nanos}-{counter}",
                std::process::id()
            ));
            std::fs::create_dir_all(&path).unwrap();
            Self { path }
        }

        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn nid(value: &str) -> NodeId {
        NodeId::new(value).expect("node id")
    }

    fn session() -> DiagramSession<StackedLayoutEngine, CountingRouter> {
        DiagramSession::new(
            StackedLayoutEngine::new(),
            CountingRouter::new(),
            Box::new(NullRenderer),
        )
    }

    fn demo_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            graph: fixtures::demo_graph(),
            view: crate::model::ViewState::new(),
        }
    }

    struct CountingListener {
        notifications: std::sync::Arc<AtomicUsize>,
    }

    impl SessionListener for CountingListener {
        fn graph_changed(&mut self, _graph: &DiagramGraph) {
            self.notifications.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn intent_for_stamps_the_policy_tier() {
        let mut session = session();
        session.restore(demo_snapshot()).await;

        let delete = session.intent_for(
            EditSource::User,
            EditPayload::DeleteNode {
                node_id: "chat".to_owned(),
            },
        );
        assert_eq!(delete.kind, "ai-lock-structural");
        assert_eq!(delete.scope_id, "lambda");

        session.unlock_scope_to_free(&nid("lambda"));
        let delete = session.intent_for(
            EditSource::User,
            EditPayload::DeleteNode {
                node_id: "chat".to_owned(),
            },
        );
        assert_eq!(delete.kind, "free-structural");

        let drag = session.intent_for(
            EditSource::Ai,
            EditPayload::MoveShape {
                node_id: "chat".to_owned(),
                x: 0.0,
                y: 0.0,
            },
        );
        assert_eq!(drag.kind, "geo-only");
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_persist_and_reload_across_sessions() {
        let tmp = TempDir::new("session");
        let store = SessionFile::new(tmp.path().join("session.json"));

        let mut first = session();
        first.attach_store(store.clone(), demo_snapshot).await;
        let add = first.intent_for(
            EditSource::Ai,
            EditPayload::AddNode {
                node_id: "sqs".to_owned(),
                parent_id: "aws".to_owned(),
                label: "Queue".to_owned(),
                icon: None,
                data: None,
                group: false,
            },
        );
        first.apply(&add).await.expect("apply");
        assert!(!first.persistence_degraded());

        let mut second = session();
        second.attach_store(store, demo_snapshot).await;
        assert!(second.graph().contains_node("sqs"));
        // The lock-tier edit laid the scope out; geometry came back too.
        assert!(second.view().node_view(&nid("sqs")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_persists_emptiness_over_default_content() {
        let tmp = TempDir::new("session-reset");
        let store = SessionFile::new(tmp.path().join("session.json"));
        let notifications = std::sync::Arc::new(AtomicUsize::new(0));

        let mut session1 = session();
        session1.add_listener(Box::new(CountingListener {
            notifications: notifications.clone(),
        }));
        session1.attach_store(store.clone(), demo_snapshot).await;
        assert!(!session1.graph().is_empty());
        let before = notifications.load(Ordering::SeqCst);

        session1.reset().await;
        assert!(session1.graph().is_empty());
        assert!(notifications.load(Ordering::SeqCst) > before);

        // A new session over the same store must come up empty, not demo.
        let mut session2 = session();
        session2.attach_store(store, demo_snapshot).await;
        assert!(session2.graph().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn added_edges_get_routes_once_the_batch_commits() {
        let mut session = session();
        session.restore(demo_snapshot()).await;
        session.unlock_scope_to_free(&nid("root"));

        let add = session.intent_for(
            EditSource::User,
            EditPayload::AddEdge {
                edge_id: "e:webapp-storage".to_owned(),
                source_id: "webapp".to_owned(),
                target_id: "storage".to_owned(),
                label: None,
            },
        );
        session.apply(&add).await.expect("apply");

        // Let the batch window commit, then fold routes into the overlay.
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.drain_route_updates();

        let route = session
            .view()
            .edge_view(&EdgeId::new("e:webapp-storage").expect("edge id"))
            .expect("edge view");
        assert!(!route.route.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn ghost_free_after_a_mixed_mutation_sequence() {
        let mut session = session();
        session.restore(demo_snapshot()).await;
        session.unlock_scope_to_free(&nid("root"));
        session.unlock_scope_to_free(&nid("aws"));

        let steps = [
            session.intent_for(
                EditSource::Ai,
                EditPayload::AddNode {
                    node_id: "sqs".to_owned(),
                    parent_id: "aws".to_owned(),
                    label: "Queue".to_owned(),
                    icon: None,
                    data: None,
                    group: false,
                },
            ),
            session.intent_for(
                EditSource::User,
                EditPayload::GroupSelection {
                    group_id: "frontend".to_owned(),
                    node_ids: vec!["ui".to_owned(), "openai".to_owned()],
                    label: "Frontend".to_owned(),
                    icon: None,
                },
            ),
        ];
        for intent in &steps {
            session.apply(intent).await.expect("apply");
        }

        let dissolve = session.intent_for(
            EditSource::User,
            EditPayload::DissolveGroup {
                group_id: "frontend".to_owned(),
            },
        );
        session.apply(&dissolve).await.expect("apply");

        let delete = session.intent_for(
            EditSource::Ai,
            EditPayload::DeleteNode {
                node_id: "lambda".to_owned(),
            },
        );
        session.apply(&delete).await.expect("apply");

        tokio::time::sleep(Duration::from_secs(1)).await;
        session.drain_route_updates();

        assert!(session.view().ghost_ids(session.graph()).is_empty());
        assert_eq!(session.view().mode_of(&nid("aws")), GroupMode::Free);
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Scene assembly for renderers.
//!
//! A `Scene` is a flat snapshot of `(graph, view state)` with resolved
//! geometry; renderers consume it and perform no structural logic.

pub mod scene;
pub mod text;

pub use scene::{build_scene, Scene, SceneEdge, SceneNode};
pub use text::render_scene_listing;

/// Sink for assembled scenes. Implementations draw; they never mutate.
pub trait Renderer {
    fn render(&mut self, scene: &Scene);
}

/// Discards every scene. Useful when no visual surface is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _scene: &Scene) {}
}

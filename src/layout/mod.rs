// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Boundary to the hierarchical layout engine.
//!
//! The engine itself is an external collaborator: this module defines its
//! contract, extracts the scope subtree it consumes, and merges its output
//! back into the geometry overlay. A simple built-in stacking engine ships
//! for the CLI and as a test double with real semantics.

pub mod engine;
pub mod stacked;

pub use engine::{
    extract_scope, merge_layout, LayoutEngine, LayoutEngineError, LayoutSpacing, ScopeSubtree,
};
pub use stacked::StackedLayoutEngine;

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Proteus — hierarchical diagram graph engine (tree model + edit
//! orchestration + batched edge routing).
//!
//! The crate is a library with a thin CLI on top; rendering surfaces, agent
//! loops, and the numerical layout/routing engines plug in at the trait
//! boundaries in `layout`, `routing`, and `render`.

pub mod edit;
pub mod layout;
pub mod model;
pub mod ops;
pub mod query;
pub mod render;
pub mod routing;
pub mod session;
pub mod store;

pub use session::{DiagramSession, SessionListener};

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Read-only queries over the diagram tree.
//!
//! Scope resolution answers "which group safely contains this selection" and
//! backs every operation that needs a containing scope for a set of nodes.

pub mod scope;

pub use scope::{ancestor_chain, common_ancestor, lowest_common_group, AncestorChain};

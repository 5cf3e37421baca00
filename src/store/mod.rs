// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for diagram sessions on disk.
//!
//! One session is one JSON file holding the domain graph and its geometry
//! overlay. Writes are atomic (temp file plus rename); durability beyond
//! that is opt-in.

pub mod session_file;

pub use session_file::{SessionFile, SessionSnapshot, StoreError, WriteDurability};

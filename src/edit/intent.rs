// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wire-facing edit intent types.
//!
//! Intents arrive from the UI or from an agent integration as JSON; ids stay
//! plain strings here and convert to typed ids at the orchestrator boundary.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EditSource {
    User,
    Ai,
}

/// Routing tier of an edit. The label form is what travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    GeoOnly,
    FreeStructural,
    AiLockStructural,
}

impl EditKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::GeoOnly => "geo-only",
            Self::FreeStructural => "free-structural",
            Self::AiLockStructural => "ai-lock-structural",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "geo-only" => Some(Self::GeoOnly),
            "free-structural" => Some(Self::FreeStructural),
            "ai-lock-structural" => Some(Self::AiLockStructural),
            _ => None,
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Action-specific payload; each variant carries exactly the fields its
/// action needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum EditPayload {
    MoveShape {
        node_id: String,
        x: f64,
        y: f64,
    },
    ResizeShape {
        node_id: String,
        width: f64,
        height: f64,
    },
    AddNode {
        node_id: String,
        parent_id: String,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
        #[serde(default)]
        group: bool,
    },
    DeleteNode {
        node_id: String,
    },
    ReparentNode {
        node_id: String,
        new_parent_id: String,
    },
    AddEdge {
        edge_id: String,
        source_id: String,
        target_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    DeleteEdge {
        edge_id: String,
    },
    GroupSelection {
        group_id: String,
        node_ids: Vec<String>,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
    },
    DissolveGroup {
        group_id: String,
    },
}

impl EditPayload {
    /// Geometry-only payloads never touch domain structure.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::MoveShape { .. } | Self::ResizeShape { .. })
    }

    pub fn action_label(&self) -> &'static str {
        match self {
            Self::MoveShape { .. } => "move-shape",
            Self::ResizeShape { .. } => "resize-shape",
            Self::AddNode { .. } => "add-node",
            Self::DeleteNode { .. } => "delete-node",
            Self::ReparentNode { .. } => "reparent-node",
            Self::AddEdge { .. } => "add-edge",
            Self::DeleteEdge { .. } => "delete-edge",
            Self::GroupSelection { .. } => "group-selection",
            Self::DissolveGroup { .. } => "dissolve-group",
        }
    }
}

/// One edit, created per user/agent action and consumed synchronously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EditIntent {
    pub source: EditSource,
    /// Routing tier label; unrecognized labels fail the intent.
    pub kind: String,
    pub scope_id: String,
    pub payload: EditPayload,
}

#[cfg(test)]
mod tests {
    use super::{EditIntent, EditKind, EditPayload, EditSource};

    #[test]
    fn kind_labels_roundtrip() {
        for kind in [
            EditKind::GeoOnly,
            EditKind::FreeStructural,
            EditKind::AiLockStructural,
        ] {
            assert_eq!(EditKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(EditKind::from_label("teleport"), None);
    }

    #[test]
    fn payloads_deserialize_from_tagged_json() {
        let intent: EditIntent = serde_json::from_str(
            r#"{
                "source": "ai",
                "kind": "ai-lock-structural",
                "scope_id": "aws",
                "payload": {
                    "action": "add-node",
                    "node_id": "sqs",
                    "parent_id": "aws",
                    "label": "Queue"
                }
            }"#,
        )
        .expect("intent");

        assert_eq!(intent.source, EditSource::Ai);
        assert!(matches!(
            intent.payload,
            EditPayload::AddNode { ref node_id, group: false, .. } if node_id == "sqs"
        ));
    }

    #[test]
    fn geometry_payloads_are_not_structural() {
        let payload = EditPayload::MoveShape {
            node_id: "webapp".to_owned(),
            x: 10.0,
            y: 20.0,
        };
        assert!(!payload.is_structural());

        let payload = EditPayload::DeleteEdge {
            edge_id: "e:1".to_owned(),
        };
        assert!(payload.is_structural());
    }
}

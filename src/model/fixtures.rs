// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::graph::{DiagramGraph, Edge, GraphNode};
use super::ids::{EdgeId, NodeId};

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn eid(value: &str) -> EdgeId {
    EdgeId::new(value).expect("edge id")
}

fn leaf(id: &str, label: &str) -> GraphNode {
    GraphNode::new_leaf(nid(id), label)
}

fn group(id: &str, label: &str, children: Vec<GraphNode>) -> GraphNode {
    let mut node = GraphNode::new_group(nid(id), label);
    *node.children_mut().expect("group children") = children;
    node
}

/// Demo document tree used by tests, benches, and `--demo`:
///
/// ```text
/// root
/// ├── ui { webapp }
/// ├── aws { api, lambda { query, pdf, fetch, chat }, vector, storage }
/// └── openai { embed, chat_api }
/// ```
pub fn demo_graph() -> DiagramGraph {
    let mut graph = DiagramGraph::new();

    let ui = group("ui", "UI", vec![leaf("webapp", "Web App")]);
    let aws = group(
        "aws",
        "AWS",
        vec![
            leaf("api", "API Gateway"),
            group(
                "lambda",
                "Lambda",
                vec![
                    leaf("query", "Query Fn"),
                    leaf("pdf", "PDF Fn"),
                    leaf("fetch", "Fetch Fn"),
                    leaf("chat", "Chat Fn"),
                ],
            ),
            leaf("vector", "Vector DB"),
            leaf("storage", "Object Storage"),
        ],
    );
    let openai = group(
        "openai",
        "OpenAI",
        vec![leaf("embed", "Embeddings"), leaf("chat_api", "Chat API")],
    );

    let root = graph
        .find_node_mut(super::graph::ROOT_NODE_ID)
        .expect("root exists");
    let children = root.children_mut().expect("root children");
    children.push(ui);
    children.push(aws);
    children.push(openai);

    let edges = root.edges_mut();
    edges.push(Edge::new_with(
        eid("e:webapp-api"),
        nid("webapp"),
        nid("api"),
        Some("REST".to_owned()),
    ));
    edges.push(Edge::new(eid("e:api-query"), nid("api"), nid("query")));
    edges.push(Edge::new(eid("e:query-vector"), nid("query"), nid("vector")));
    edges.push(Edge::new(eid("e:pdf-storage"), nid("pdf"), nid("storage")));
    edges.push(Edge::new(eid("e:chat-chat_api"), nid("chat"), nid("chat_api")));
    edges.push(Edge::new(eid("e:query-embed"), nid("query"), nid("embed")));

    graph
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Proteus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Proteus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Tree mutation implementation helpers used by `apply_op`/`apply_batch`.
/// Keeps `ops::mod` focused on public op types and orchestration.
fn apply_in_place(
    graph: &mut DiagramGraph,
    op: &GraphOp,
    delta: &mut DeltaBuilder,
) -> Result<(), ValidationError> {
    match op {
        GraphOp::AddNode {
            node_id,
            parent_id,
            label,
            icon,
            data,
            group,
        } => {
            if graph.contains_node(node_id.as_str()) {
                return Err(ValidationError::NodeIdInUse {
                    node_id: node_id.clone(),
                });
            }

            let node = if *group {
                GraphNode::new_group(node_id.clone(), label.clone())
            } else {
                GraphNode::new_leaf(node_id.clone(), label.clone())
            }
            .with_icon(icon.clone())
            .with_data(data.clone());

            let Some(parent) = graph.find_node_mut(parent_id.as_str()) else {
                return Err(ValidationError::NodeNotFound {
                    node_id: parent_id.clone(),
                });
            };
            let Some(children) = parent.children_mut() else {
                return Err(ValidationError::NotAGroup {
                    node_id: parent_id.clone(),
                });
            };
            children.push(node);
            delta.record_added(GraphRef::Node(node_id.clone()));
            Ok(())
        }
        GraphOp::DeleteNode { node_id } => {
            if node_id.as_str() == ROOT_NODE_ID {
                return Err(ValidationError::RootDetach);
            }
            if !graph.contains_node(node_id.as_str()) {
                return Err(ValidationError::NodeNotFound {
                    node_id: node_id.clone(),
                });
            }

            let removed_ids: BTreeSet<NodeId> = graph
                .subtree_node_ids(node_id.as_str())
                .into_iter()
                .collect();
            let Some(removed) = graph.detach_node(node_id.as_str()) else {
                return Err(ValidationError::NodeNotFound {
                    node_id: node_id.clone(),
                });
            };

            // Edges stored inside the removed subtree disappear physically
            // with it; only those whose endpoints both survive are kept, and
            // those re-attach at the document level. Deletion is endpoint-
            // based, not storage-based.
            let mut carried = Vec::new();
            collect_owned_edges(removed, &mut carried);
            for edge in carried {
                if removed_ids.contains(edge.source_id()) || removed_ids.contains(edge.target_id())
                {
                    delta.record_removed(GraphRef::Edge(edge.id().clone()));
                } else {
                    graph.attach_edge(edge);
                }
            }

            for edge_id in graph.remove_edges_referencing(&removed_ids) {
                delta.record_removed(GraphRef::Edge(edge_id));
            }
            for removed_id in removed_ids {
                delta.record_removed(GraphRef::Node(removed_id));
            }
            Ok(())
        }
        GraphOp::MoveNode {
            node_id,
            new_parent_id,
        } => {
            if node_id.as_str() == ROOT_NODE_ID {
                return Err(ValidationError::RootDetach);
            }
            if !graph.contains_node(node_id.as_str()) {
                return Err(ValidationError::NodeNotFound {
                    node_id: node_id.clone(),
                });
            }
            if graph
                .subtree_node_ids(node_id.as_str())
                .iter()
                .any(|id| id == new_parent_id)
            {
                return Err(ValidationError::CycleAttempt {
                    node_id: node_id.clone(),
                    new_parent_id: new_parent_id.clone(),
                });
            }
            match graph.find_node(new_parent_id.as_str()) {
                None => {
                    return Err(ValidationError::NodeNotFound {
                        node_id: new_parent_id.clone(),
                    })
                }
                Some(parent) if !parent.is_group() => {
                    return Err(ValidationError::NotAGroup {
                        node_id: new_parent_id.clone(),
                    })
                }
                Some(_) => {}
            }

            let Some(node) = graph.detach_node(node_id.as_str()) else {
                return Err(ValidationError::NodeNotFound {
                    node_id: node_id.clone(),
                });
            };
            let Some(parent) = graph.find_node_mut(new_parent_id.as_str()) else {
                return Err(ValidationError::NodeNotFound {
                    node_id: new_parent_id.clone(),
                });
            };
            let Some(children) = parent.children_mut() else {
                return Err(ValidationError::NotAGroup {
                    node_id: new_parent_id.clone(),
                });
            };
            children.push(node);
            delta.record_updated(GraphRef::Node(node_id.clone()));
            Ok(())
        }
        GraphOp::AddEdge {
            edge_id,
            source_id,
            target_id,
            label,
        } => {
            if graph.contains_edge(edge_id.as_str()) {
                return Err(ValidationError::EdgeIdInUse {
                    edge_id: edge_id.clone(),
                });
            }
            for endpoint in [source_id, target_id] {
                if !graph.contains_node(endpoint.as_str()) {
                    return Err(ValidationError::EdgeEndpointNotFound {
                        edge_id: edge_id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
            graph.attach_edge(Edge::new_with(
                edge_id.clone(),
                source_id.clone(),
                target_id.clone(),
                label.clone(),
            ));
            delta.record_added(GraphRef::Edge(edge_id.clone()));
            Ok(())
        }
        GraphOp::DeleteEdge { edge_id } => {
            // Idempotent: deleting an unknown edge id is a no-op.
            if graph.remove_edge(edge_id.as_str()).is_some() {
                delta.record_removed(GraphRef::Edge(edge_id.clone()));
            }
            Ok(())
        }
        GraphOp::GroupNodes {
            group_id,
            parent_id,
            node_ids,
            label,
            icon,
        } => {
            if graph.contains_node(group_id.as_str()) {
                return Err(ValidationError::NodeIdInUse {
                    node_id: group_id.clone(),
                });
            }

            let mut members: Vec<NodeId> = Vec::with_capacity(node_ids.len());
            for node_id in node_ids {
                if !members.contains(node_id) {
                    members.push(node_id.clone());
                }
            }
            if members.is_empty() {
                return Err(ValidationError::EmptyGroup {
                    group_id: group_id.clone(),
                });
            }
            for member in &members {
                if member.as_str() == ROOT_NODE_ID {
                    return Err(ValidationError::RootDetach);
                }
                if !graph.contains_node(member.as_str()) {
                    return Err(ValidationError::NodeNotFound {
                        node_id: member.clone(),
                    });
                }
                if graph
                    .subtree_node_ids(member.as_str())
                    .iter()
                    .any(|id| id == parent_id)
                {
                    return Err(ValidationError::CycleAttempt {
                        node_id: member.clone(),
                        new_parent_id: parent_id.clone(),
                    });
                }
            }
            match graph.find_node(parent_id.as_str()) {
                None => {
                    return Err(ValidationError::NodeNotFound {
                        node_id: parent_id.clone(),
                    })
                }
                Some(parent) if !parent.is_group() => {
                    return Err(ValidationError::NotAGroup {
                        node_id: parent_id.clone(),
                    })
                }
                Some(_) => {}
            }

            let mut group = GraphNode::new_group(group_id.clone(), label.clone())
                .with_icon(icon.clone());
            for member in &members {
                // A member nested inside another selected member moves with
                // its ancestor and is not detached separately.
                let Some(node) = graph.detach_node(member.as_str()) else {
                    continue;
                };
                delta.record_updated(GraphRef::Node(member.clone()));
                if let Some(children) = group.children_mut() {
                    children.push(node);
                }
            }

            let Some(parent) = graph.find_node_mut(parent_id.as_str()) else {
                return Err(ValidationError::NodeNotFound {
                    node_id: parent_id.clone(),
                });
            };
            let Some(children) = parent.children_mut() else {
                return Err(ValidationError::NotAGroup {
                    node_id: parent_id.clone(),
                });
            };
            children.push(group);
            delta.record_added(GraphRef::Node(group_id.clone()));
            Ok(())
        }
        GraphOp::RemoveGroup { group_id } => {
            if group_id.as_str() == ROOT_NODE_ID {
                return Err(ValidationError::RootDetach);
            }
            match graph.find_node(group_id.as_str()) {
                None => {
                    return Err(ValidationError::NodeNotFound {
                        node_id: group_id.clone(),
                    })
                }
                Some(node) if !node.is_group() => {
                    return Err(ValidationError::NotAGroup {
                        node_id: group_id.clone(),
                    })
                }
                Some(_) => {}
            }
            let Some(parent_id) = graph.parent_id_of(group_id.as_str()).cloned() else {
                return Err(ValidationError::NodeNotFound {
                    node_id: group_id.clone(),
                });
            };

            let Some(parent) = graph.find_node_mut(parent_id.as_str()) else {
                return Err(ValidationError::NodeNotFound { node_id: parent_id });
            };
            let Some(children) = parent.children_mut() else {
                return Err(ValidationError::NotAGroup { node_id: parent_id });
            };
            let Some(index) = children
                .iter()
                .position(|child| child.id() == group_id)
            else {
                return Err(ValidationError::NodeNotFound {
                    node_id: group_id.clone(),
                });
            };

            let mut group = children.remove(index);
            let moved = group
                .children_mut()
                .map(std::mem::take)
                .unwrap_or_default();
            let carried = std::mem::take(group.edges_mut());
            for child in &moved {
                delta.record_updated(GraphRef::Node(child.id().clone()));
            }
            // Direct children re-parent at the group's former position,
            // keeping their relative order.
            children.splice(index..index, moved);
            parent.edges_mut().extend(carried);

            // Edges that referenced the dissolved group itself now dangle.
            let gone: BTreeSet<NodeId> = [group_id.clone()].into_iter().collect();
            for edge_id in graph.remove_edges_referencing(&gone) {
                delta.record_removed(GraphRef::Edge(edge_id));
            }
            delta.record_removed(GraphRef::Node(group_id.clone()));
            Ok(())
        }
    }
}

fn collect_owned_edges(mut node: GraphNode, out: &mut Vec<Edge>) {
    out.append(node.edges_mut());
    if let Some(children) = node.children_mut() {
        for child in children.drain(..) {
            collect_owned_edges(child, out);
        }
    }
}

//! Deep subtree cloning.
//!
//! Copy-paste needs a duplicate of a node and everything it owns, with
//! identities fresh enough that the copy and the original can be edited
//! independently. Ownership follows placement edges only: link edges mark
//! shared lines, so a clone never duplicates a linked-to node.
//!
//! Link edges inside the copied subtree are remapped to the corresponding
//! clones; link edges pointing outside the subtree keep their original
//! targets, so the copy converges on the same shared lines the original
//! does. Cached target types are refreshed against the live pools while
//! rewriting, so a snapshot taken before a coercion still clones clean.

use std::collections::{HashMap, HashSet};

use crate::dialog::graph::Dialog;
use crate::dialog::node::{DialogNode, NodeId, NodeType};

/// Clones `source` and its owned subtree into `dialog`.
///
/// Every descendant reached through placement edges is duplicated with a
/// fresh node id, and every pointer in the copy gets a fresh pointer id.
/// The descendant clones are inserted into the pools and registered; the
/// cloned top node is returned without being inserted, so the caller
/// decides where (and whether) it lands.
///
/// `source` does not have to be pooled in `dialog`; clipboard snapshots of
/// cut nodes clone the same way as live nodes. Traversal is a worklist with
/// a visited set, so malformed placement cycles terminate instead of
/// recursing forever.
pub fn clone_subtree(dialog: &mut Dialog, source: &DialogNode) -> DialogNode {
    // Pass 1: snapshot every node the source owns, without touching the graph.
    let mut snapshots: Vec<DialogNode> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(source.id());
    let mut stack: Vec<NodeId> = owned_targets(source);
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        match dialog.node(id) {
            Some(node) => {
                stack.extend(owned_targets(node));
                snapshots.push(node.clone());
            }
            None => {
                tracing::warn!(
                    "owned descendant {} of cloned node {} is missing from the pools; skipping it",
                    id,
                    source.id()
                );
            }
        }
    }

    // Pass 2: allocate the new identities up front so link edges between
    // subtree members can be remapped no matter the rewrite order. The
    // node type rides along to keep the remapped target caches truthful.
    let mut id_map: HashMap<NodeId, (NodeId, NodeType)> = HashMap::new();
    id_map.insert(source.id(), (dialog.allocate_node_id(), source.node_type()));
    for snapshot in &snapshots {
        id_map.insert(
            snapshot.id(),
            (dialog.allocate_node_id(), snapshot.node_type()),
        );
    }

    // Pass 3: rewrite each copy and insert the descendants.
    for mut snapshot in snapshots {
        rewrite_identities(dialog, &mut snapshot, &id_map);
        dialog.insert_node(snapshot);
    }
    let mut top = source.clone();
    rewrite_identities(dialog, &mut top, &id_map);
    top
}

fn owned_targets(node: &DialogNode) -> Vec<NodeId> {
    node.pointers()
        .iter()
        .filter(|p| !p.is_link())
        .map(|p| p.target())
        .collect()
}

fn rewrite_identities(
    dialog: &mut Dialog,
    node: &mut DialogNode,
    id_map: &HashMap<NodeId, (NodeId, NodeType)>,
) {
    let (new_id, _) = id_map[&node.id()];
    node.set_id(new_id);
    for ptr in node.pointers_mut() {
        ptr.set_id(dialog.allocate_pointer_id());
        match id_map.get(&ptr.target()) {
            Some(&(mapped, target_type)) => {
                ptr.set_target(mapped);
                ptr.set_target_type(target_type);
            }
            // Links out of the subtree keep pointing at the shared original;
            // the cache is re-read because the original may have been coerced
            // since this snapshot was taken.
            None if ptr.is_link() => {
                if let Some((actual, _)) = dialog.position_of(ptr.target()) {
                    ptr.set_target_type(actual);
                }
            }
            None => {
                tracing::warn!(
                    "placement pointer {} of cloned node {} kept its original target {}",
                    ptr.id(),
                    new_id,
                    ptr.target()
                );
            }
        }
    }
}

//! Editing workflows layered over the graph primitives.
//!
//! These are the operations an editor frontend calls directly: adding link
//! edges, deleting pointers and subtrees, reordering siblings, retargeting
//! links, and pruning unreachable lines. Each one validates up front,
//! mutates through the [`Dialog`] primitives, and finishes with a full
//! pointer index recalculation so callers always observe fresh indices.

use std::collections::HashSet;

use anyhow::{anyhow, bail, Result};

use crate::dialog::graph::Dialog;
use crate::dialog::node::{NodeId, NodeType};
use crate::dialog::pointer::{ParentRef, Pointer, PointerId};
use crate::dialog::reindex::recalculate_pointer_indices;

/// What a cascading removal took out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Nodes removed from the pools.
    pub nodes_removed: usize,
    /// Pointers detached, counting edges inside the removed subtree.
    pub pointers_removed: usize,
}

/// Adds a link edge so an existing line is spoken again from another
/// branch, without duplicating the node.
///
/// Links from the root must target NPC entries; links from a parent node
/// must alternate with it.
pub fn add_link(dialog: &mut Dialog, parent: ParentRef, target: NodeId) -> Result<PointerId> {
    let target_type = dialog
        .node(target)
        .map(|n| n.node_type())
        .ok_or_else(|| anyhow!("link target node {} is not part of this dialog", target))?;
    match parent {
        ParentRef::Root => {
            if target_type != NodeType::Entry {
                bail!(
                    "only NPC entries can start a conversation; node {} is a {}",
                    target,
                    target_type
                );
            }
        }
        ParentRef::Node(parent_id) => {
            let parent_type = dialog
                .node(parent_id)
                .map(|n| n.node_type())
                .ok_or_else(|| {
                    anyhow!("link parent node {} is not part of this dialog", parent_id)
                })?;
            if parent_type == target_type {
                bail!(
                    "cannot link a {} under a {}: NPC and player lines must alternate",
                    target_type,
                    parent_type
                );
            }
        }
    }
    let id = dialog.allocate_pointer_id();
    let is_start = matches!(parent, ParentRef::Root);
    let ptr = Pointer::new(id, target, target_type, true, is_start);
    match parent {
        ParentRef::Root => dialog.attach_start(ptr),
        ParentRef::Node(parent_id) => dialog.attach_child(parent_id, ptr)?,
    }
    recalculate_pointer_indices(dialog);
    Ok(id)
}

/// Detaches a single pointer and returns it.
///
/// This only severs the edge; the target node stays pooled even if nothing
/// references it afterwards. Use [`delete_node`] or [`prune_unreachable`]
/// to take nodes out.
pub fn delete_pointer(dialog: &mut Dialog, pointer: PointerId) -> Result<Pointer> {
    let removed = dialog
        .remove_pointer(pointer)
        .ok_or_else(|| anyhow!("pointer {} is not part of this dialog", pointer))?;
    recalculate_pointer_indices(dialog);
    Ok(removed)
}

/// Deletes a node together with its owned subtree.
///
/// Ownership follows placement edges, so linked-to lines outside the
/// subtree survive; every pointer into the removed region (placements,
/// starts, and links from anywhere in the graph) is detached.
pub fn delete_node(dialog: &mut Dialog, node: NodeId) -> Result<DeleteOutcome> {
    if !dialog.contains(node) {
        bail!("node {} is not part of this dialog", node);
    }
    let doomed = owned_subtree(dialog, node);
    let outcome = remove_nodes_cascade(dialog, &doomed)?;
    recalculate_pointer_indices(dialog);
    Ok(outcome)
}

/// Points an existing link edge at a different node.
///
/// Placement edges cannot be retargeted; they are the node's identity in
/// the tree. The new target must satisfy the same type rules as creating
/// the link fresh.
pub fn retarget_link(dialog: &mut Dialog, pointer: PointerId, new_target: NodeId) -> Result<()> {
    let new_type = dialog
        .node(new_target)
        .map(|n| n.node_type())
        .ok_or_else(|| anyhow!("node {} is not part of this dialog", new_target))?;
    let (old_target, is_link) = dialog
        .pointer(pointer)
        .map(|p| (p.target(), p.is_link()))
        .ok_or_else(|| anyhow!("pointer {} is not part of this dialog", pointer))?;
    if !is_link {
        bail!(
            "pointer {} is a placement edge; only link edges can be retargeted",
            pointer
        );
    }
    match dialog.parent_of(pointer) {
        Some(ParentRef::Root) => {
            if new_type != NodeType::Entry {
                bail!(
                    "only NPC entries can start a conversation; node {} is a {}",
                    new_target,
                    new_type
                );
            }
        }
        Some(ParentRef::Node(parent_id)) => {
            let parent_type = dialog
                .node(parent_id)
                .map(|n| n.node_type())
                .ok_or_else(|| {
                    anyhow!("parent node {} is not part of this dialog", parent_id)
                })?;
            if parent_type == new_type {
                bail!(
                    "cannot link a {} under a {}: NPC and player lines must alternate",
                    new_type,
                    parent_type
                );
            }
        }
        None => bail!("pointer {} is not attached anywhere", pointer),
    }
    if let Some(ptr) = dialog.pointer_mut(pointer) {
        ptr.set_target(new_target);
        ptr.set_target_type(new_type);
    }
    dialog
        .links_mut()
        .retarget(pointer, old_target, new_target);
    recalculate_pointer_indices(dialog);
    Ok(())
}

/// Moves a pointer up or down among its siblings.
///
/// The offset clamps at the ends of the sibling list. Sibling order is
/// presentation order and does not touch pool positions, so no index
/// recalculation is needed.
pub fn move_pointer(dialog: &mut Dialog, pointer: PointerId, offset: isize) -> Result<()> {
    let parent = dialog
        .parent_of(pointer)
        .ok_or_else(|| anyhow!("pointer {} is not part of this dialog", pointer))?;
    match parent {
        ParentRef::Root => shift_pointer(dialog.starts_mut(), pointer, offset),
        ParentRef::Node(parent_id) => {
            let Some(node) = dialog.node_mut(parent_id) else {
                bail!("parent node {} is not part of this dialog", parent_id);
            };
            shift_pointer(node.pointers_mut(), pointer, offset)
        }
    }
}

fn shift_pointer(list: &mut Vec<Pointer>, pointer: PointerId, offset: isize) -> Result<()> {
    let Some(pos) = list.iter().position(|p| p.id() == pointer) else {
        bail!("pointer {} is not in its parent's list", pointer);
    };
    let last = list.len() as isize - 1;
    let new_pos = (pos as isize + offset).clamp(0, last) as usize;
    if new_pos != pos {
        let ptr = list.remove(pos);
        list.insert(new_pos, ptr);
    }
    Ok(())
}

/// Removes every node unreachable from the conversation starts, cascading
/// through whatever the removed nodes owned.
pub fn prune_unreachable(dialog: &mut Dialog) -> Result<DeleteOutcome> {
    let reachable = dialog.reachable_nodes();
    let doomed: Vec<NodeId> = dialog
        .entries()
        .iter()
        .chain(dialog.replies().iter())
        .map(|n| n.id())
        .filter(|id| !reachable.contains(id))
        .collect();
    if doomed.is_empty() {
        return Ok(DeleteOutcome {
            nodes_removed: 0,
            pointers_removed: 0,
        });
    }
    let outcome = remove_nodes_cascade(dialog, &doomed)?;
    recalculate_pointer_indices(dialog);
    Ok(outcome)
}

/// Collects `root` and every node reachable from it over placement edges.
///
/// Worklist with a visited set; placement cycles (which only corrupted
/// files can contain) terminate instead of recursing.
fn owned_subtree(dialog: &Dialog, root: NodeId) -> Vec<NodeId> {
    let mut doomed: Vec<NodeId> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<NodeId> = vec![root];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        doomed.push(id);
        if let Some(node) = dialog.node(id) {
            for ptr in node.pointers() {
                if !ptr.is_link() {
                    stack.push(ptr.target());
                }
            }
        }
    }
    doomed
}

/// Detaches every pointer into the doomed set, then removes the nodes.
fn remove_nodes_cascade(dialog: &mut Dialog, doomed: &[NodeId]) -> Result<DeleteOutcome> {
    let mut pointer_ids: Vec<PointerId> = Vec::new();
    for id in doomed {
        pointer_ids.extend(dialog.links().referrers(*id).iter().copied());
    }
    let mut pointers_removed = 0;
    for pointer_id in pointer_ids {
        if dialog.remove_pointer(pointer_id).is_some() {
            pointers_removed += 1;
        }
    }
    let mut nodes_removed = 0;
    for id in doomed {
        // Pointers the doomed node still carries (links out of the region)
        // leave the graph with it and count as removed.
        let node = dialog.remove_node(*id)?;
        pointers_removed += node.pointers().len();
        nodes_removed += 1;
    }
    Ok(DeleteOutcome {
        nodes_removed,
        pointers_removed,
    })
}

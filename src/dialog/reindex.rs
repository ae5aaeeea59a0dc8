//! Pointer index recomputation.
//!
//! Every pointer caches its target's position in the target pool. Any edit
//! that reorders a pool (removal, coercion, re-insert) makes some of those
//! caches stale, so the editing workflows finish by calling
//! [`recalculate_pointer_indices`] over the whole dialog.
//!
//! The pass is a flat sweep, not a traversal: it builds one id-to-position
//! map per pool, then touches the start list and every pooled node's
//! pointers exactly once. Cycles through link edges cannot affect it, and
//! running it twice in a row changes nothing.

use std::collections::HashMap;

use crate::dialog::graph::Dialog;
use crate::dialog::node::{NodeId, NodeType};
use crate::dialog::pointer::Pointer;

/// Recomputes the cached pool position on every pointer in the dialog.
///
/// A pointer whose target is missing from its pool indicates an editing bug
/// upstream; it is reported loudly in debug builds and logged in release
/// builds, and its stale index is left in place.
pub fn recalculate_pointer_indices(dialog: &mut Dialog) {
    let entry_positions: HashMap<NodeId, usize> = dialog
        .entries()
        .iter()
        .enumerate()
        .map(|(pos, node)| (node.id(), pos))
        .collect();
    let reply_positions: HashMap<NodeId, usize> = dialog
        .replies()
        .iter()
        .enumerate()
        .map(|(pos, node)| (node.id(), pos))
        .collect();

    for ptr in dialog.starts_mut() {
        refresh_index(ptr, &entry_positions, &reply_positions);
    }
    for node in dialog.entries_mut() {
        for ptr in node.pointers_mut() {
            refresh_index(ptr, &entry_positions, &reply_positions);
        }
    }
    for node in dialog.replies_mut() {
        for ptr in node.pointers_mut() {
            refresh_index(ptr, &entry_positions, &reply_positions);
        }
    }
}

fn refresh_index(
    ptr: &mut Pointer,
    entry_positions: &HashMap<NodeId, usize>,
    reply_positions: &HashMap<NodeId, usize>,
) {
    let position = match ptr.target_type() {
        NodeType::Entry => entry_positions.get(&ptr.target()),
        NodeType::Reply => reply_positions.get(&ptr.target()),
    };
    match position {
        Some(&pos) => ptr.set_index(pos),
        None => {
            debug_assert!(
                false,
                "pointer {} targets node {} missing from the {} pool",
                ptr.id(),
                ptr.target(),
                ptr.target_type()
            );
            tracing::warn!(
                "pointer {} targets node {} missing from the {} pool; index left at {}",
                ptr.id(),
                ptr.target(),
                ptr.target_type(),
                ptr.index()
            );
        }
    }
}

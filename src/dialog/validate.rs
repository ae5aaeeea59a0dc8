//! Graph consistency checking.
//!
//! [`validate`] sweeps a dialog and reports everything a well-formed file
//! should not contain: dangling pointers, stale caches, registry drift,
//! alternation breaks, lines without a placement, and unreachable lines.
//! It never mutates; the loader runs it after restoring internal state and
//! logs what it finds, and the CLI exposes it as a check command.
//!
//! Issues are ordered by where they were found (starts first, then the
//! entry pool, then the reply pool, then registry and reachability
//! sweeps), so output is stable for diffing between runs.

use std::collections::{HashMap, HashSet};

use crate::dialog::graph::Dialog;
use crate::dialog::node::{NodeId, NodeType};
use crate::dialog::pointer::{Pointer, PointerId};

/// One consistency problem found in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A pointer targets a node id that is in neither pool.
    DanglingPointer { pointer: PointerId, target: NodeId },
    /// A pointer's cached pool position does not match the target's actual
    /// position.
    StaleIndex {
        pointer: PointerId,
        cached: usize,
        actual: usize,
    },
    /// A pointer's cached target type does not match the target's actual
    /// type.
    TypeCacheMismatch {
        pointer: PointerId,
        cached: NodeType,
        actual: NodeType,
    },
    /// A conversation start leads to a player reply.
    StartTargetsReply { pointer: PointerId, target: NodeId },
    /// A parent and its child are on the same side of the conversation.
    AlternationBreak {
        pointer: PointerId,
        parent: NodeId,
        node_type: NodeType,
    },
    /// A pointer exists in the graph but is missing from the registry.
    MissingRegistration { pointer: PointerId, target: NodeId },
    /// The registry holds a pointer id that no longer exists in the graph,
    /// or one whose target moved.
    StaleRegistration { pointer: PointerId, target: NodeId },
    /// A node has no placement edge; only links (or nothing) reference it.
    MissingPlacement { node: NodeId },
    /// A node cannot be reached from any conversation start.
    Unreachable { node: NodeId },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationIssue::DanglingPointer { pointer, target } => {
                write!(f, "pointer {} targets missing node {}", pointer, target)
            }
            ValidationIssue::StaleIndex {
                pointer,
                cached,
                actual,
            } => write!(
                f,
                "pointer {} caches pool position {} but the target sits at {}",
                pointer, cached, actual
            ),
            ValidationIssue::TypeCacheMismatch {
                pointer,
                cached,
                actual,
            } => write!(
                f,
                "pointer {} caches target type {} but the target is a {}",
                pointer, cached, actual
            ),
            ValidationIssue::StartTargetsReply { pointer, target } => write!(
                f,
                "conversation start {} leads to player reply {}; starts must be NPC entries",
                pointer, target
            ),
            ValidationIssue::AlternationBreak {
                pointer,
                parent,
                node_type,
            } => write!(
                f,
                "pointer {} puts a {} under node {} of the same type",
                pointer, node_type, parent
            ),
            ValidationIssue::MissingRegistration { pointer, target } => write!(
                f,
                "pointer {} targeting node {} is missing from the link registry",
                pointer, target
            ),
            ValidationIssue::StaleRegistration { pointer, target } => write!(
                f,
                "link registry entry for pointer {} on node {} matches nothing in the graph",
                pointer, target
            ),
            ValidationIssue::MissingPlacement { node } => {
                write!(f, "node {} has no placement edge, only links", node)
            }
            ValidationIssue::Unreachable { node } => {
                write!(f, "node {} cannot be reached from any conversation start", node)
            }
        }
    }
}

/// Sweeps the dialog and returns every consistency issue found.
///
/// An empty result means the graph is sound: all pointers resolve, caches
/// are fresh, the registry mirrors the edges, every node is placed exactly
/// once, and every node is reachable.
pub fn validate(dialog: &Dialog) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut positions: HashMap<NodeId, (NodeType, usize)> = HashMap::new();
    for (pos, node) in dialog.entries().iter().enumerate() {
        positions.insert(node.id(), (NodeType::Entry, pos));
    }
    for (pos, node) in dialog.replies().iter().enumerate() {
        positions.insert(node.id(), (NodeType::Reply, pos));
    }

    for ptr in dialog.starts() {
        check_pointer(dialog, ptr, &positions, &mut issues);
        if positions.get(&ptr.target()).map(|(t, _)| *t) == Some(NodeType::Reply) {
            issues.push(ValidationIssue::StartTargetsReply {
                pointer: ptr.id(),
                target: ptr.target(),
            });
        }
    }
    for node in dialog.entries().iter().chain(dialog.replies().iter()) {
        for ptr in node.pointers() {
            check_pointer(dialog, ptr, &positions, &mut issues);
            if positions.get(&ptr.target()).map(|(t, _)| *t) == Some(node.node_type()) {
                issues.push(ValidationIssue::AlternationBreak {
                    pointer: ptr.id(),
                    parent: node.id(),
                    node_type: node.node_type(),
                });
            }
        }
    }

    check_registry(dialog, &mut issues);
    check_placement_and_reach(dialog, &mut issues);
    issues
}

fn check_pointer(
    dialog: &Dialog,
    ptr: &Pointer,
    positions: &HashMap<NodeId, (NodeType, usize)>,
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(&(actual_type, actual_pos)) = positions.get(&ptr.target()) else {
        issues.push(ValidationIssue::DanglingPointer {
            pointer: ptr.id(),
            target: ptr.target(),
        });
        return;
    };
    if ptr.target_type() != actual_type {
        issues.push(ValidationIssue::TypeCacheMismatch {
            pointer: ptr.id(),
            cached: ptr.target_type(),
            actual: actual_type,
        });
    }
    if ptr.index() != actual_pos {
        issues.push(ValidationIssue::StaleIndex {
            pointer: ptr.id(),
            cached: ptr.index(),
            actual: actual_pos,
        });
    }
    if !dialog.links().referrers(ptr.target()).contains(&ptr.id()) {
        issues.push(ValidationIssue::MissingRegistration {
            pointer: ptr.id(),
            target: ptr.target(),
        });
    }
}

fn check_registry(dialog: &Dialog, issues: &mut Vec<ValidationIssue>) {
    for (target, referrers) in dialog.links().iter() {
        for pointer_id in referrers {
            let live = dialog
                .pointer(*pointer_id)
                .map_or(false, |p| p.target() == target);
            if !live {
                issues.push(ValidationIssue::StaleRegistration {
                    pointer: *pointer_id,
                    target,
                });
            }
        }
    }
}

fn check_placement_and_reach(dialog: &Dialog, issues: &mut Vec<ValidationIssue>) {
    let mut placed: HashSet<NodeId> = HashSet::new();
    for ptr in dialog.starts() {
        if !ptr.is_link() {
            placed.insert(ptr.target());
        }
    }
    for node in dialog.entries().iter().chain(dialog.replies().iter()) {
        for ptr in node.pointers() {
            if !ptr.is_link() {
                placed.insert(ptr.target());
            }
        }
    }
    let reachable = dialog.reachable_nodes();
    for node in dialog.entries().iter().chain(dialog.replies().iter()) {
        if !placed.contains(&node.id()) {
            issues.push(ValidationIssue::MissingPlacement { node: node.id() });
        }
        if !reachable.contains(&node.id()) {
            issues.push(ValidationIssue::Unreachable { node: node.id() });
        }
    }
}

use dlgquill::dialog::graph::Dialog;
use dlgquill::dialog::node::{DialogNode, NodeId, NodeType};
use dlgquill::dialog::ops::{
    add_link, delete_node, delete_pointer, move_pointer, prune_unreachable, retarget_link,
};
use dlgquill::dialog::pointer::ParentRef;
use dlgquill::dialog::reindex::recalculate_pointer_indices;
use dlgquill::dialog::validate::validate;

/// Builds a small quest conversation with two starts.
///
/// offer -> accept -> detail, plus a separate farewell entry.
fn quest_dialog() -> (Dialog, NodeId, NodeId, NodeId, NodeId) {
    let mut dialog = Dialog::new();
    let offer = dialog.add_node(DialogNode::new(NodeType::Entry, "I have work for you."));
    let accept = dialog.add_node(DialogNode::new(NodeType::Reply, "Tell me more."));
    let detail = dialog.add_node(DialogNode::new(NodeType::Entry, "Clear the old mill."));
    let farewell = dialog.add_node(DialogNode::new(NodeType::Entry, "Safe travels."));
    dialog.add_start(offer).expect("start should attach");
    dialog.add_child(offer, accept).expect("reply should attach");
    dialog.add_child(accept, detail).expect("entry should attach");
    dialog.add_start(farewell).expect("second start should attach");
    recalculate_pointer_indices(&mut dialog);
    (dialog, offer, accept, detail, farewell)
}

#[test]
fn test_editing_sequence_keeps_the_graph_consistent() {
    let (mut dialog, offer, accept, detail, farewell) = quest_dialog();

    // Link, reorder, retarget, delete, prune; the graph must hold at
    // every step
    let link = add_link(&mut dialog, ParentRef::Node(detail), accept)
        .expect("Failed to add link");
    assert!(validate(&dialog).is_empty());

    let start = dialog.starts()[0].id();
    move_pointer(&mut dialog, start, 1).expect("Failed to move pointer");
    assert!(validate(&dialog).is_empty());
    assert_eq!(dialog.starts()[1].target(), offer);

    let decline = dialog.add_node(DialogNode::new(NodeType::Reply, "Not interested."));
    dialog.add_child(offer, decline).expect("reply should attach");
    retarget_link(&mut dialog, link, decline).expect("Failed to retarget link");
    assert!(validate(&dialog).is_empty());

    delete_node(&mut dialog, farewell).expect("Failed to delete node");
    assert!(validate(&dialog).is_empty());

    let outcome = prune_unreachable(&mut dialog).expect("Failed to prune");
    assert_eq!(outcome.nodes_removed, 0);
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_deleting_one_start_branch_spares_the_other() {
    let (mut dialog, offer, _accept, _detail, farewell) = quest_dialog();

    let outcome = delete_node(&mut dialog, offer).expect("Failed to delete node");

    // The whole quest branch cascades away; the farewell start remains
    assert_eq!(outcome.nodes_removed, 3);
    assert_eq!(dialog.starts().len(), 1);
    assert_eq!(dialog.starts()[0].target(), farewell);
    assert_eq!(dialog.starts()[0].index(), 0);
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_root_links_retarget_between_entries() {
    let (mut dialog, offer, accept, _detail, farewell) = quest_dialog();
    let root_link = add_link(&mut dialog, ParentRef::Root, farewell)
        .expect("Failed to add link");

    retarget_link(&mut dialog, root_link, offer).expect("Failed to retarget link");
    let ptr = dialog.pointer(root_link).expect("link should exist");
    assert_eq!(ptr.target(), offer);
    assert!(ptr.is_start());

    // A reply can never be swapped in at the root
    let err = retarget_link(&mut dialog, root_link, accept).unwrap_err();
    assert!(err.to_string().contains("only NPC entries"));
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_starts_reorder_like_any_sibling_list() {
    let (mut dialog, offer, _accept, _detail, farewell) = quest_dialog();

    let second = dialog.starts()[1].id();
    move_pointer(&mut dialog, second, -1).expect("Failed to move pointer");

    let order: Vec<NodeId> = dialog.starts().iter().map(|p| p.target()).collect();
    assert_eq!(order, vec![farewell, offer]);
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_detached_branch_falls_to_the_pruner() {
    let (mut dialog, offer, accept, detail, _farewell) = quest_dialog();
    let placement = dialog
        .node(offer)
        .expect("offer should exist")
        .pointers()[0]
        .id();

    // Severing the edge orphans accept and detail but removes nothing
    delete_pointer(&mut dialog, placement).expect("Failed to delete pointer");
    assert!(dialog.contains(accept));
    assert!(dialog.contains(detail));

    let outcome = prune_unreachable(&mut dialog).expect("Failed to prune");
    assert_eq!(outcome.nodes_removed, 2);
    assert!(!dialog.contains(accept));
    assert!(!dialog.contains(detail));
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_link_only_line_goes_once_its_link_drops() {
    let (mut dialog, offer, _accept, _detail, farewell) = quest_dialog();

    // A line owned by an unreachable annex but linked from a live branch
    let annex = dialog.add_node(DialogNode::new(NodeType::Entry, "Annex."));
    let shared = dialog.add_node(DialogNode::new(NodeType::Reply, "As you say."));
    dialog.add_child(annex, shared).expect("reply should attach");
    let link = add_link(&mut dialog, ParentRef::Node(farewell), shared)
        .expect("Failed to add link");

    // First prune takes the annex and leaves the shared line link-fed
    prune_unreachable(&mut dialog).expect("Failed to prune");
    assert!(dialog.contains(shared));

    // Dropping the link strands it; the next prune sweeps it up
    delete_pointer(&mut dialog, link).expect("Failed to delete pointer");
    let outcome = prune_unreachable(&mut dialog).expect("Failed to prune");
    assert_eq!(outcome.nodes_removed, 1);
    assert!(!dialog.contains(shared));
    assert!(dialog.contains(offer));
    assert!(validate(&dialog).is_empty());
}

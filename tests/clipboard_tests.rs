use dlgquill::dialog::graph::Dialog;
use dlgquill::dialog::node::{DialogNode, NodeId, NodeType};
use dlgquill::dialog::ops::add_link;
use dlgquill::dialog::pointer::{ParentRef, PointerId};
use dlgquill::dialog::validate::validate;
use dlgquill::editor::clipboard::{ClipMode, Clipboard};

/// Builds a clipboard that never touches the system clipboard.
fn quiet_clipboard() -> Clipboard {
    let mut clipboard = Clipboard::new();
    clipboard.set_sync_system(false);
    clipboard
}

/// Builds a toll-gate conversation: one start, one reply, and the pointer
/// id of the reply's placement edge.
fn toll_dialog() -> (Dialog, NodeId, NodeId, PointerId) {
    let mut dialog = Dialog::new();
    let demand = dialog.add_node(DialogNode::new(NodeType::Entry, "Ten gold to pass."));
    let pay = dialog.add_node(DialogNode::new(NodeType::Reply, "Here, take it."));
    dialog.add_start(demand).expect("start should attach");
    let placement = dialog.add_child(demand, pay).expect("reply should attach");
    (dialog, demand, pay, placement)
}

#[test]
fn test_copy_node_leaves_dialog_untouched() {
    let (dialog, _demand, pay, _placement) = toll_dialog();
    let mut clipboard = quiet_clipboard();

    clipboard.copy_node(&dialog, pay).expect("Failed to copy node");

    let slot = clipboard.contents().expect("slot should be filled");
    assert_eq!(slot.mode(), ClipMode::Copy);
    assert_eq!(slot.source_id(), pay);
    assert_eq!(slot.node().text, "Here, take it.");
    assert_eq!(slot.active_script(), "");

    assert_eq!(dialog.entry_count(), 1);
    assert_eq!(dialog.reply_count(), 1);
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_copy_pointer_carries_edge_metadata() {
    let (mut dialog, _demand, pay, placement) = toll_dialog();
    dialog.pointer_mut(placement).unwrap().active_script = "gc_gold_10".to_string();
    dialog.pointer_mut(placement).unwrap().comment = "only when solvent".to_string();

    let mut clipboard = quiet_clipboard();
    clipboard
        .copy_pointer(&dialog, placement)
        .expect("Failed to copy pointer");

    let slot = clipboard.contents().expect("slot should be filled");
    assert_eq!(slot.source_id(), pay);
    assert_eq!(slot.active_script(), "gc_gold_10");
    assert_eq!(slot.comment(), "only when solvent");
}

#[test]
fn test_copy_through_link_edge_uses_the_link_metadata() {
    let (mut dialog, _demand, pay, placement) = toll_dialog();
    dialog.pointer_mut(placement).unwrap().active_script = "gc_gold_10".to_string();

    let waved = dialog.add_node(DialogNode::new(NodeType::Entry, "Go on through."));
    dialog.add_start(waved).expect("start should attach");
    let link = add_link(&mut dialog, ParentRef::Node(waved), pay).expect("Failed to add link");
    dialog.pointer_mut(link).unwrap().comment = "shared answer".to_string();

    let mut clipboard = quiet_clipboard();
    clipboard
        .copy_pointer(&dialog, link)
        .expect("Failed to copy pointer");

    // The capture carries the traversed edge's data, not the placement's
    let slot = clipboard.contents().expect("slot should be filled");
    assert_eq!(slot.source_id(), pay);
    assert_eq!(slot.active_script(), "");
    assert_eq!(slot.comment(), "shared answer");
}

#[test]
fn test_cut_removes_unreferenced_node_from_pool() {
    let (mut dialog, demand, pay, placement) = toll_dialog();
    let mut clipboard = quiet_clipboard();

    clipboard
        .cut_pointer(&mut dialog, placement)
        .expect("Failed to cut pointer");

    assert!(!dialog.contains(pay));
    assert_eq!(dialog.reply_count(), 0);
    assert!(dialog.node(demand).unwrap().pointers().is_empty());

    let slot = clipboard.contents().expect("slot should be filled");
    assert_eq!(slot.mode(), ClipMode::Cut);
    assert_eq!(slot.source_id(), pay);
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_cut_keeps_link_followed_node_in_pool() {
    let (mut dialog, _demand, pay, placement) = toll_dialog();
    let waved = dialog.add_node(DialogNode::new(NodeType::Entry, "Go on through."));
    dialog.add_start(waved).expect("start should attach");
    let link = add_link(&mut dialog, ParentRef::Node(waved), pay).expect("Failed to add link");

    let mut clipboard = quiet_clipboard();
    clipboard
        .cut_pointer(&mut dialog, placement)
        .expect("Failed to cut pointer");

    // The link keeps following the node, so it stays pooled
    assert!(dialog.contains(pay));
    assert_eq!(dialog.links().referrers(pay), &[link]);
    assert_eq!(dialog.pointer(link).unwrap().target(), pay);
    assert_eq!(clipboard.contents().unwrap().mode(), ClipMode::Cut);
}

#[test]
fn test_cut_rejects_link_edges() {
    let (mut dialog, _demand, pay, _placement) = toll_dialog();
    let waved = dialog.add_node(DialogNode::new(NodeType::Entry, "Go on through."));
    dialog.add_start(waved).expect("start should attach");
    let link = add_link(&mut dialog, ParentRef::Node(waved), pay).expect("Failed to add link");

    let mut clipboard = quiet_clipboard();
    let err = clipboard
        .cut_pointer(&mut dialog, link)
        .expect_err("cutting a link edge should fail");

    assert!(err.to_string().contains("link edge"));
    assert!(clipboard.is_empty());
    assert!(dialog.pointer(link).is_some());
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_recapture_discards_a_pending_cut() {
    let (mut dialog, demand, pay, placement) = toll_dialog();
    let mut clipboard = quiet_clipboard();
    clipboard
        .cut_pointer(&mut dialog, placement)
        .expect("Failed to cut pointer");

    // Capturing something else abandons the cut; the node stays gone and
    // the graph stays consistent.
    clipboard.copy_node(&dialog, demand).expect("Failed to copy node");

    let slot = clipboard.contents().expect("slot should be filled");
    assert_eq!(slot.mode(), ClipMode::Copy);
    assert_eq!(slot.source_id(), demand);
    assert!(!dialog.contains(pay));
    assert!(validate(&dialog).is_empty());
}

#[test]
fn test_clear_empties_the_slot() {
    let (dialog, demand, _pay, _placement) = toll_dialog();
    let mut clipboard = quiet_clipboard();
    clipboard.copy_node(&dialog, demand).expect("Failed to copy node");
    assert!(!clipboard.is_empty());

    clipboard.clear();

    assert!(clipboard.is_empty());
    assert!(clipboard.contents().is_none());
}

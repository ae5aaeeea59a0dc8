use std::path::PathBuf;

use tempfile::TempDir;

use dlgquill::config::Config;
use dlgquill::dialog::graph::Dialog;
use dlgquill::dialog::node::{DialogNode, NodeId, NodeType};
use dlgquill::dialog::pointer::ParentRef;
use dlgquill::dialog::validate::validate;
use dlgquill::editor::session::EditorSession;

/// Builds a config that leaves the system clipboard alone.
fn quiet_config() -> Config {
    let mut config = Config::default();
    config.sync_clipboard = false;
    config
}

/// Builds a session around a two-line toll conversation.
fn toll_session() -> (EditorSession, NodeId, NodeId) {
    let mut dialog = Dialog::new();
    let demand = dialog.add_node(DialogNode::new(NodeType::Entry, "Ten gold to cross."));
    let pay = dialog.add_node(DialogNode::new(NodeType::Reply, "Here. Take it."));
    dialog.add_start(demand).expect("start should attach");
    dialog.add_child(demand, pay).expect("reply should attach");
    (EditorSession::new(dialog, quiet_config()), demand, pay)
}

/// Returns a path for a test file inside the temporary directory.
fn temp_file_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

#[test]
fn test_fresh_session_is_clean() {
    let (session, _demand, _pay) = toll_session();

    assert!(!session.is_dirty());
    assert!(session.filename().is_none());
    assert!(session.selected().is_none());
}

#[test]
fn test_mutations_mark_the_session_dirty() {
    let (mut session, demand, _pay) = toll_session();

    session
        .set_node_text(demand, "Twenty gold to cross.")
        .expect("Failed to set text");
    assert!(session.is_dirty());

    session.clear_dirty();
    session
        .set_node_speaker(demand, "Toll Keeper")
        .expect("Failed to set speaker");
    assert!(session.is_dirty());
}

#[test]
fn test_save_as_round_trip() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&dir, "toll.dlg");

    let (mut session, demand, pay) = toll_session();
    session
        .set_node_speaker(demand, "Toll Keeper")
        .expect("Failed to set speaker");
    session
        .add_link(ParentRef::Node(pay), demand)
        .expect("Failed to add link");

    session.save_as(&path).expect("Failed to save dialog");
    assert!(!session.is_dirty());
    assert_eq!(session.filename(), Some(path.display().to_string().as_str()));

    let reopened = EditorSession::open(&path, quiet_config()).expect("Failed to open dialog");
    let dialog = reopened.dialog();
    assert_eq!(dialog.entry_count(), 1);
    assert_eq!(dialog.reply_count(), 1);
    assert_eq!(dialog.entries()[0].text, "Ten gold to cross.");
    assert_eq!(dialog.entries()[0].speaker, "Toll Keeper");
    assert_eq!(dialog.starts().len(), 1);

    // The back-link survived with its link flag intact
    let back = &dialog.replies()[0].pointers()[0];
    assert!(back.is_link());
    assert!(validate(dialog).is_empty());
}

#[test]
fn test_save_without_filename_fails() {
    let (mut session, _demand, _pay) = toll_session();
    let err = session.save().unwrap_err();
    assert!(err.to_string().contains("save_as"));
}

#[test]
fn test_save_reuses_the_last_filename() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&dir, "toll.dlg");

    let (mut session, demand, _pay) = toll_session();
    session.save_as(&path).expect("Failed to save dialog");

    session
        .set_node_text(demand, "Fifty gold, actually.")
        .expect("Failed to set text");
    assert!(session.is_dirty());
    session.save().expect("Failed to save dialog");
    assert!(!session.is_dirty());

    let reopened = EditorSession::open(&path, quiet_config()).expect("Failed to open dialog");
    assert_eq!(reopened.dialog().entries()[0].text, "Fifty gold, actually.");
}

#[test]
fn test_open_missing_file_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&dir, "nope.dlg");
    assert!(EditorSession::open(&path, quiet_config()).is_err());
}

#[test]
fn test_deleting_the_selected_node_clears_selection() {
    let (mut session, _demand, pay) = toll_session();
    assert!(session.select(pay));

    session.delete_node(pay).expect("Failed to delete node");
    assert!(session.selected().is_none());
}

#[test]
fn test_rejected_add_leaves_the_session_clean() {
    let (mut session, _demand, _pay) = toll_session();

    let err = session
        .add_node(
            ParentRef::Root,
            DialogNode::new(NodeType::Reply, "Player lines cannot open."),
        )
        .unwrap_err();
    assert!(err.to_string().contains("only NPC entries"));

    assert!(!session.is_dirty());
    assert_eq!(session.dialog().reply_count(), 1);
    assert!(!session.undo());
}

#[test]
fn test_saved_file_reloads_through_a_fresh_session_undo() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_file_path(&dir, "toll.dlg");

    let (mut session, _demand, _pay) = toll_session();
    session.save_as(&path).expect("Failed to save dialog");

    // A reopened session starts a fresh history
    let mut reopened = EditorSession::open(&path, quiet_config()).expect("Failed to open dialog");
    assert!(!reopened.undo());

    let demand = reopened.dialog().entries()[0].id();
    reopened
        .set_node_text(demand, "The toll has doubled.")
        .expect("Failed to set text");
    assert!(reopened.undo());
    assert_eq!(reopened.dialog().entries()[0].text, "Ten gold to cross.");
}

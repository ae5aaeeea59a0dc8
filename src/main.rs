use anyhow::Result;
use clap::Parser;
use std::collections::HashSet;
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

use dlgquill::config::Config;
use dlgquill::dialog::graph::Dialog;
use dlgquill::dialog::node::{DialogNode, NodeId, NodeType};
use dlgquill::dialog::ops::add_link;
use dlgquill::dialog::pointer::{ParentRef, Pointer};
use dlgquill::dialog::reindex::recalculate_pointer_indices;
use dlgquill::dialog::validate::validate;
use dlgquill::file::loader::{load_dialog_file, load_dialog_from_stdin};
use dlgquill::structure::export_structure;

/// DlgQuill - a structural editor core for branching RPG dialogue graphs
#[derive(Parser)]
#[command(name = "dlgquill")]
#[command(version)]
#[command(about = "Inspect and check branching RPG dialogue files", long_about = None)]
struct Cli {
    /// Dialog file to inspect (omit to read from stdin if piped, or show a sample dialog if interactive)
    file: Option<String>,

    /// Run the consistency checks and exit nonzero when issues are found
    #[arg(long)]
    check: bool,

    /// Print node and pointer counts
    #[arg(long)]
    stats: bool,

    /// Print the flowchart structure as JSON
    #[arg(long)]
    export: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let dialog = if let Some(file_path) = &cli.file {
        let dialog = load_dialog_file(file_path)?;

        // Remember the file; config trouble must not block inspection
        let mut config = Config::load();
        config.touch_recent(file_path);
        if let Err(err) = config.save() {
            tracing::warn!("could not update the recent files list: {:#}", err);
        }

        dialog
    } else if !io::stdin().is_terminal() {
        // Stdin is piped - read the dialog from it
        load_dialog_from_stdin()?
    } else {
        // Interactive mode with no file - show a sample dialog
        sample_dialog()?
    };

    if cli.check {
        return run_check(&dialog);
    }

    if cli.export {
        let structure = export_structure(&dialog);
        println!("{}", serde_json::to_string_pretty(&structure)?);
        return Ok(());
    }

    if cli.stats {
        print_stats(&dialog);
        return Ok(());
    }

    print_outline(&dialog);
    Ok(())
}

/// Runs the consistency checks and reports every issue found.
///
/// Exits with status 1 when the dialog is inconsistent, so the command can
/// gate scripted pipelines.
fn run_check(dialog: &Dialog) -> Result<()> {
    let issues = validate(dialog);
    if issues.is_empty() {
        println!("OK");
        return Ok(());
    }

    for issue in &issues {
        println!("{}", issue);
    }
    println!("{} issue(s) found", issues.len());
    std::process::exit(1);
}

fn print_stats(dialog: &Dialog) {
    let all_pointers = dialog.starts().iter().chain(
        dialog
            .entries()
            .iter()
            .chain(dialog.replies().iter())
            .flat_map(|n| n.pointers().iter()),
    );
    let mut pointer_count = 0;
    let mut link_count = 0;
    for ptr in all_pointers {
        pointer_count += 1;
        if ptr.is_link() {
            link_count += 1;
        }
    }

    println!("entries:  {}", dialog.entry_count());
    println!("replies:  {}", dialog.reply_count());
    println!("starts:   {}", dialog.starts().len());
    println!("pointers: {}", pointer_count);
    println!("links:    {}", link_count);
}

/// Prints the conversation as an indented outline.
///
/// Owning edges are followed depth-first. Link edges, and any line that has
/// already been printed, appear as one-line `->` stubs so shared lines and
/// cycles show up exactly once in full.
fn print_outline(dialog: &Dialog) {
    if dialog.starts().is_empty() {
        println!("(empty dialog)");
        return;
    }

    let mut visited: HashSet<NodeId> = HashSet::new();
    for start in dialog.starts() {
        print_branch(dialog, start, 0, &mut visited);
    }
}

fn print_branch(dialog: &Dialog, ptr: &Pointer, depth: usize, visited: &mut HashSet<NodeId>) {
    let indent = "  ".repeat(depth);
    let Some(node) = dialog.node(ptr.target()) else {
        println!("{}?? dangling pointer to node {}", indent, ptr.target());
        return;
    };

    let tag = match node.node_type() {
        NodeType::Entry => "NPC",
        NodeType::Reply => "PC",
    };
    let speaker = if node.speaker.is_empty() {
        String::new()
    } else {
        format!(" ({})", node.speaker)
    };
    let condition = if ptr.has_condition() { " [?]" } else { "" };
    let text = if node.text.is_empty() {
        "(no text)".to_string()
    } else {
        node.snippet(60)
    };

    if ptr.is_link() || !visited.insert(node.id()) {
        println!("{}-> {}{}: {}{}", indent, tag, speaker, text, condition);
        return;
    }

    println!("{}{}{}: {}{}", indent, tag, speaker, text, condition);
    for child in node.pointers() {
        print_branch(dialog, child, depth + 1, visited);
    }
}

/// Builds the guard-post sample dialog shown when run interactively with no
/// file: three player choices, a quest branch, a gated reply, and a link
/// back into the quest line.
fn sample_dialog() -> Result<Dialog> {
    let mut dialog = Dialog::new();

    let mut hello = DialogNode::new(NodeType::Entry, "Hello, traveler!");
    hello.speaker = "Guard".to_string();
    let hello = dialog.add_node(hello);

    let greet = dialog.add_node(DialogNode::new(NodeType::Reply, "Greetings."));
    let rude = dialog.add_node(DialogNode::new(NodeType::Reply, "What do you want?"));

    let mut leave = DialogNode::new(NodeType::Reply, "[Leave]");
    leave.action_script = "nw_walk_wp".to_string();
    let leave = dialog.add_node(leave);

    let mut quest = DialogNode::new(NodeType::Entry, "I have a quest for you.");
    quest.speaker = "Guard".to_string();
    quest.action_script = "sc_start_quest".to_string();
    let quest = dialog.add_node(quest);

    let mut rebuke = DialogNode::new(NodeType::Entry, "No need to be rude!");
    rebuke.speaker = "Guard".to_string();
    let rebuke = dialog.add_node(rebuke);

    let more = dialog.add_node(DialogNode::new(NodeType::Reply, "Tell me more."));
    let refuse = dialog.add_node(DialogNode::new(NodeType::Reply, "Not interested."));

    let mut cave = DialogNode::new(NodeType::Entry, "There's a cave nearby...");
    cave.speaker = "Merchant".to_string();
    let cave = dialog.add_node(cave);

    dialog.add_start(hello)?;
    dialog.add_child(hello, greet)?;
    dialog.add_child(hello, rude)?;
    dialog.add_child(hello, leave)?;
    dialog.add_child(greet, quest)?;
    dialog.add_child(rude, rebuke)?;
    let gated = dialog.add_child(quest, more)?;
    dialog.add_child(quest, refuse)?;
    dialog.add_child(more, cave)?;

    if let Some(ptr) = dialog.pointer_mut(gated) {
        ptr.active_script = "gc_check_skill".to_string();
    }

    // After the rebuke the player can still ask about the quest
    add_link(&mut dialog, ParentRef::Node(rebuke), more)?;

    recalculate_pointer_indices(&mut dialog);
    Ok(dialog)
}

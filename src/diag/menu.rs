//! Hierarchical diagnostic menu engine.
//!
//! A menu is a tree of [`MenuNode`]s. Each node carries a selection label,
//! an optional title printed when the node is displayed, optional entry and
//! exit callbacks, an optional hide predicate, and its children. Parents
//! own their children outright; navigation state lives in the run loop's
//! stack, not in the nodes, so the tree itself is plain owned data.
//!
//! The run loop:
//! - invokes the entry callback when a node is entered; a failure pops back
//!   to the parent without displaying anything;
//! - treats childless nodes as actions: entry runs, then control returns to
//!   the parent (which re-enters and redisplays);
//! - re-evaluates every child's hide predicate on each display and numbers
//!   only the visible ones, so selection positions always match the printed
//!   list;
//! - accepts [`EXIT_MENU`] at every level, running the node's exit callback
//!   (its result is recorded but never blocks the pop);
//! - re-prompts on invalid selections without re-running the entry callback;
//! - resets its status on every navigation step, so a leaf failure that was
//!   already reported to the console does not linger;
//! - terminates when the root is exited, returning the status of that final
//!   step so the caller can surface it as a process exit status.

use smallvec::SmallVec;

use super::console::Console;
use super::input::{self, MenuInput};
use crate::cprintln;

pub use super::input::EXIT_MENU;

type Callback<C, E> = Box<dyn Fn(&mut C, &mut Console<'_>) -> Result<(), E>>;
type HidePredicate<C> = Box<dyn Fn(&C) -> bool>;

pub struct MenuNode<C, E> {
    label: String,
    title: String,
    entry: Option<Callback<C, E>>,
    exit: Option<Callback<C, E>>,
    hide: Option<HidePredicate<C>>,
    children: Vec<MenuNode<C, E>>,
}

impl<C, E> MenuNode<C, E> {
    /// Creates a node with the label shown in its parent's option list.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            title: String::new(),
            entry: None,
            exit: None,
            hide: None,
            children: Vec::new(),
        }
    }

    /// Sets the title printed (with an underline) whenever this node's own
    /// menu is displayed.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Callback invoked when the node is entered, before anything is
    /// displayed. Returning `Err` pops straight back to the parent.
    pub fn on_entry(mut self, cb: impl Fn(&mut C, &mut Console<'_>) -> Result<(), E> + 'static) -> Self {
        self.entry = Some(Box::new(cb));
        self
    }

    /// Callback invoked when the node is exited via [`EXIT_MENU`]. Its
    /// result is recorded as the loop status but never blocks the exit.
    pub fn on_exit(mut self, cb: impl Fn(&mut C, &mut Console<'_>) -> Result<(), E> + 'static) -> Self {
        self.exit = Some(Box::new(cb));
        self
    }

    /// Hides the node from its parent's option list whenever the predicate
    /// returns true. Re-evaluated on every display.
    pub fn hide_when(mut self, pred: impl Fn(&C) -> bool + 'static) -> Self {
        self.hide = Some(Box::new(pred));
        self
    }

    /// Appends a child, transferring ownership to this node.
    pub fn add_child(&mut self, child: MenuNode<C, E>) {
        self.children.push(child);
    }

    /// Appends children in display order, transferring ownership.
    pub fn add_children(&mut self, children: Vec<MenuNode<C, E>>) {
        self.children.extend(children);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn is_hidden(&self, ctx: &C) -> bool {
        self.hide.as_ref().is_some_and(|pred| pred(ctx))
    }
}

fn node_at<'n, C, E>(root: &'n MenuNode<C, E>, path: &[usize]) -> &'n MenuNode<C, E> {
    let mut node = root;
    for &index in path {
        node = &node.children[index];
    }
    node
}

/// Runs the menu loop rooted at `root` until the root level is exited.
///
/// Returns the status of the step that unwound the root: the root's exit
/// callback result, or the error of a failing root entry callback. Deeper
/// failures pop one level and the loop carries on with a clean status;
/// they are reported where they happen, not at exit.
pub fn run<C, E>(root: &MenuNode<C, E>, ctx: &mut C, con: &mut Console<'_>) -> Result<(), E> {
    let mut path: Vec<usize> = Vec::new();

    loop {
        let node = node_at(root, &path);
        let mut status: Result<(), E> = Ok(());

        if let Some(entry) = &node.entry {
            status = entry(ctx, con);
            if status.is_err() {
                if path.pop().is_none() {
                    return status;
                }
                continue;
            }
        }

        if node.is_leaf() {
            if path.pop().is_none() {
                return status;
            }
            continue;
        }

        // Display loop: redisplay on invalid input without re-entering.
        loop {
            if !node.title.is_empty() {
                cprintln!(con, "\n{}", node.title);
                cprintln!(con, "{}", "-".repeat(node.title.len()));
            }
            let visible: SmallVec<[usize; 16]> = node
                .children
                .iter()
                .enumerate()
                .filter(|(_, child)| !child.is_hidden(ctx))
                .map(|(index, _)| index)
                .collect();
            for (position, &index) in visible.iter().enumerate() {
                cprintln!(con, "{}. {}", position + 1, node.children[index].label);
            }
            cprintln!(con, "{EXIT_MENU}. Exit Menu\n");

            match input::read_menu_option(con, visible.len() as u64) {
                MenuInput::Choice(position) => {
                    path.push(visible[position as usize - 1]);
                    break;
                }
                MenuInput::Exit => {
                    if let Some(exit) = &node.exit {
                        status = exit(ctx, con);
                    }
                    if path.pop().is_none() {
                        return status;
                    }
                    break;
                }
                MenuInput::Invalid => {}
            }
        }
    }
}

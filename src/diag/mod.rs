//! Console plumbing shared by every interactive flow: the line/byte console
//! seam, the numeric input validator, the hex buffer codec, and the
//! hierarchical menu engine. Nothing in here knows about devices.

pub mod console;
pub mod hex;
pub mod input;
pub mod menu;

pub use console::Console;
pub use input::{MenuInput, NumInput};
pub use menu::MenuNode;

//! PCI-specific pieces: the configuration-space register catalogs and the
//! menu builders that wire the diagnostic tree together.

pub mod menus;
pub mod regs;

pub use menus::{DiagCtx, build_main_menu};

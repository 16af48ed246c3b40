//! Interactive diagnostic console for memory-mapped devices: a hierarchical
//! menu engine driving a width-dispatched register access abstraction over
//! pluggable device-access backends.
//!
//! The `diag` module holds the bus-neutral console plumbing (menu tree,
//! numeric input validation, hex buffer codec). The `wdc` module holds the
//! register access layer and the capability traits a hardware backend must
//! provide. `pci` supplies the PCI register catalogs and menu wiring, and
//! `sim` an in-process simulated backend so the binary and the integration
//! tests have a device to talk to.

pub mod diag;
pub mod pci;
pub mod sim;
pub mod wdc;

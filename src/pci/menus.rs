//! Menu builders for the PCI diagnostic tree. Each `attach_*` function
//! hangs a conforming subtree off the parent node; every subtree shares the
//! [`DiagCtx`] threaded through the engine, so there is no global device
//! handle. Device-dependent subtrees hide themselves while no device is
//! open.

use std::cell::RefCell;
use std::rc::Rc;

use crate::diag::console::Console;
use crate::diag::input::{self, NumInput};
use crate::diag::menu::MenuNode;
use crate::wdc::access;
use crate::wdc::catalog::Catalog;
use crate::wdc::device::{AddrSpace, DeviceHandle, DeviceScan, Direction, EventAction, TransferWidth};
use crate::wdc::error::{AccessError, AccessResult};
use crate::cprintln;

use super::regs;

pub type DiagMenu = MenuNode<DiagCtx, AccessError>;

/// State threaded through the menu tree: the bus scanner, the currently
/// open device, the register catalogs, and the read/write sub-menu's
/// sticky settings.
pub struct DiagCtx {
    pub bus: Box<dyn DeviceScan>,
    pub device: Option<Box<dyn DeviceHandle>>,
    pub cfg_regs: Catalog,
    pub express_regs: Catalog,
    pub rw: RwAddrState,
    pub events_registered: bool,
    pub interrupts_enabled: bool,
    /// Notifications collected by the registered event handler; drained
    /// to the console on the next visit to the events menu.
    pub event_log: Rc<RefCell<Vec<EventAction>>>,
}

/// Sticky settings of the memory/IO read-write menu. The active space is
/// reset when the menu is exited so a later visit re-derives it from the
/// (possibly different) open device.
pub struct RwAddrState {
    pub space: Option<u32>,
    pub width: TransferWidth,
    pub block: bool,
}

impl Default for RwAddrState {
    fn default() -> Self {
        Self { space: None, width: TransferWidth::W32, block: false }
    }
}

impl DiagCtx {
    pub fn new(bus: Box<dyn DeviceScan>) -> Self {
        Self {
            bus,
            device: None,
            cfg_regs: Catalog::new(&regs::PCI_CFG_REGS),
            express_regs: Catalog::new(&regs::PCI_EXPRESS_REGS),
            rw: RwAddrState::default(),
            events_registered: false,
            interrupts_enabled: false,
            event_log: Rc::default(),
        }
    }

    fn handle(&self) -> AccessResult<&dyn DeviceHandle> {
        self.device.as_deref().ok_or(AccessError::NullHandle)
    }

    /// Non-interactive scan-and-open for the CLI's vendor/device options.
    pub fn open_by_id(&mut self, vendor_id: u32, device_id: u32) -> AccessResult<()> {
        let matches = self.bus.scan(Some(vendor_id), Some(device_id))?;
        let Some(location) = matches.first() else {
            return Err(AccessError::DeviceNotFound);
        };
        let handle = self.bus.open(location)?;
        log::info!("opened device at {}", handle.location());
        self.device = Some(handle);
        Ok(())
    }
}

fn no_device(ctx: &DiagCtx) -> bool {
    ctx.device.is_none()
}

fn not_express(ctx: &DiagCtx) -> bool {
    match &ctx.device {
        Some(dev) => dev.express_generation() == 0,
        None => true,
    }
}

/// Builds the full diagnostic tree. Exiting the root closes any open
/// device.
pub fn build_main_menu() -> DiagMenu {
    let mut root = MenuNode::new("main")
        .with_title("PCI diagnostics main menu")
        .on_exit(main_exit);
    attach_scan_bus(&mut root);
    attach_device_open(&mut root);
    attach_cfg_space(&mut root);
    attach_rw_addr(&mut root);
    attach_events(&mut root);
    attach_interrupts(&mut root);
    root
}

fn main_exit(ctx: &mut DiagCtx, con: &mut Console<'_>) -> Result<(), AccessError> {
    if let Some(dev) = ctx.device.take() {
        if let Err(err) = dev.close() {
            cprintln!(con, "Failed closing the device. Error 0x{:X} - {}", err.code(), err);
            return Err(err);
        }
        log::info!("closed device");
    }
    Ok(())
}

// --- Scan bus ---------------------------------------------------------

fn attach_scan_bus(parent: &mut DiagMenu) {
    parent.add_child(MenuNode::new("Scan PCI bus").on_entry(|ctx: &mut DiagCtx, con| {
        scan_bus(ctx, con);
        Ok(())
    }));
}

/// Scans the bus and prints every device found. Also used by the CLI's
/// `--list` option.
pub fn scan_bus(ctx: &DiagCtx, con: &mut Console<'_>) {
    match ctx.bus.scan(None, None) {
        Err(err) => cprintln!(con, "Failed scanning the PCI bus. Error 0x{:X} - {}", err.code(), err),
        Ok(devices) if devices.is_empty() => cprintln!(con, "No devices were found on the PCI bus"),
        Ok(devices) => {
            cprintln!(con, "\nFound {} devices on the PCI bus:", devices.len());
            cprintln!(con, "---------------------------------");
            for (i, dev) in devices.iter().enumerate() {
                cprintln!(con, "{:2}. Vendor ID: [0x{:X}], Device ID: [0x{:X}]", i + 1, dev.vendor_id, dev.device_id);
                cprintln!(con, "    Location: {dev}");
            }
        }
    }
}

// --- Find and open a device -------------------------------------------

fn attach_device_open(parent: &mut DiagMenu) {
    parent.add_child(MenuNode::new("Find and open a PCI device").on_entry(|ctx: &mut DiagCtx, con| {
        if let Some(old) = ctx.device.take() {
            if let Err(err) = old.close() {
                cprintln!(con, "Failed closing the previous device. Error 0x{:X} - {}", err.code(), err);
            }
            ctx.events_registered = false;
            ctx.interrupts_enabled = false;
        }
        ctx.device = find_and_open(ctx.bus.as_ref(), con);
        Ok(())
    }));
}

fn find_and_open(bus: &dyn DeviceScan, con: &mut Console<'_>) -> Option<Box<dyn DeviceHandle>> {
    let NumInput::Value(vendor) =
        input::read_number(con, "Enter vendor ID (or 0 for any)", true, 4, 0, 0)
    else {
        return None;
    };
    let NumInput::Value(device) =
        input::read_number(con, "Enter device ID (or 0 for any)", true, 4, 0, 0)
    else {
        return None;
    };

    let vendor_filter = (vendor != 0).then_some(vendor as u32);
    let device_filter = (device != 0).then_some(device as u32);
    let matches = match bus.scan(vendor_filter, device_filter) {
        Ok(matches) => matches,
        Err(err) => {
            cprintln!(con, "Failed scanning the PCI bus. Error 0x{:X} - {}", err.code(), err);
            return None;
        }
    };
    if matches.is_empty() {
        cprintln!(
            con,
            "No matching PCI device was found for search criteria (Vendor ID 0x{vendor:X}, Device ID 0x{device:X})"
        );
        return None;
    }

    cprintln!(con, "\nFound {} matching devices:", matches.len());
    for (i, dev) in matches.iter().enumerate() {
        cprintln!(con, "{:2}. Vendor ID: [0x{:X}], Device ID: [0x{:X}]", i + 1, dev.vendor_id, dev.device_id);
        cprintln!(con, "    Location: {dev}");
    }

    let index = if matches.len() > 1 {
        let prompt = format!("Select a device (1 - {})", matches.len());
        let NumInput::Value(selection) =
            input::read_number(con, &prompt, false, 4, 1, matches.len() as u64)
        else {
            return None;
        };
        selection as usize - 1
    } else {
        0
    };

    match bus.open(&matches[index]) {
        Ok(handle) => {
            cprintln!(con, "Opened the device");
            log::info!("opened device at {}", handle.location());
            Some(handle)
        }
        Err(err) => {
            cprintln!(con, "Failed opening the device. Error 0x{:X} - {}", err.code(), err);
            None
        }
    }
}

// --- Configuration space -----------------------------------------------

fn attach_cfg_space(parent: &mut DiagMenu) {
    let mut cfg = MenuNode::new("Read/write the PCI configuration space")
        .with_title("Read/write the device's configuration space")
        .hide_when(no_device)
        .on_entry(|ctx: &mut DiagCtx, con| {
            let dev = ctx.handle()?;
            access::print_regs_info(con, &ctx.cfg_regs, 0, false);
            if dev.express_generation() != 0 {
                let base = access::express_base(dev, true)?;
                access::print_regs_info(con, &ctx.express_regs, base, true);
            }
            Ok(())
        });
    cfg.add_children(vec![
        MenuNode::new("Read from an offset").on_entry(|ctx: &mut DiagCtx, con| {
            access::read_write_block(con, ctx.handle()?, Direction::Read, AddrSpace::Config);
            Ok(())
        }),
        MenuNode::new("Write to an offset").on_entry(|ctx: &mut DiagCtx, con| {
            access::read_write_block(con, ctx.handle()?, Direction::Write, AddrSpace::Config);
            Ok(())
        }),
        MenuNode::new("Read all configuration registers defined for the device (see list above)")
            .on_entry(|ctx: &mut DiagCtx, con| {
                access::read_all_registers(con, ctx.handle()?, &ctx.cfg_regs, false);
                Ok(())
            }),
        MenuNode::new("Read from a named register").on_entry(|ctx: &mut DiagCtx, con| {
            access::select_and_access_register(con, ctx.handle()?, &ctx.cfg_regs, Direction::Read, false);
            Ok(())
        }),
        MenuNode::new("Write to a named register").on_entry(|ctx: &mut DiagCtx, con| {
            access::select_and_access_register(con, ctx.handle()?, &ctx.cfg_regs, Direction::Write, false);
            Ok(())
        }),
        MenuNode::new("Read all PCI Express registers defined for the device")
            .hide_when(not_express)
            .on_entry(|ctx: &mut DiagCtx, con| {
                access::read_all_registers(con, ctx.handle()?, &ctx.express_regs, true);
                Ok(())
            }),
        MenuNode::new("Read from a named PCI Express register")
            .hide_when(not_express)
            .on_entry(|ctx: &mut DiagCtx, con| {
                access::select_and_access_register(con, ctx.handle()?, &ctx.express_regs, Direction::Read, true);
                Ok(())
            }),
        MenuNode::new("Write to a named PCI Express register")
            .hide_when(not_express)
            .on_entry(|ctx: &mut DiagCtx, con| {
                access::select_and_access_register(con, ctx.handle()?, &ctx.express_regs, Direction::Write, true);
                Ok(())
            }),
        MenuNode::new("Scan PCI capabilities").on_entry(|ctx: &mut DiagCtx, con| {
            access::scan_capabilities(con, ctx.handle()?);
            Ok(())
        }),
    ]);
    parent.add_child(cfg);
}

// --- Memory / IO read-write --------------------------------------------

fn attach_rw_addr(parent: &mut DiagMenu) {
    let mut rw = MenuNode::new("Read/write memory and I/O addresses on the device")
        .with_title("Read/write the device's memory and I/O ranges")
        .hide_when(no_device)
        .on_entry(rw_entry)
        .on_exit(|ctx: &mut DiagCtx, _| {
            ctx.rw.space = None;
            Ok(())
        });
    rw.add_children(vec![
        MenuNode::new("Change active address space for read/write").on_entry(|ctx: &mut DiagCtx, con| {
            let space = access::choose_address_space(con, ctx.handle()?)?;
            ctx.rw.space = Some(space);
            Ok(())
        }),
        MenuNode::new("Change active read/write mode").on_entry(|ctx: &mut DiagCtx, con| {
            if let Some(width) = access::select_width(con) {
                ctx.rw.width = width;
            }
            Ok(())
        }),
        MenuNode::new("Toggle active transfer type").on_entry(|ctx: &mut DiagCtx, _| {
            ctx.rw.block = !ctx.rw.block;
            Ok(())
        }),
        MenuNode::new("Read from the active address space")
            .on_entry(|ctx: &mut DiagCtx, con| rw_access(ctx, con, Direction::Read)),
        MenuNode::new("Write to the active address space")
            .on_entry(|ctx: &mut DiagCtx, con| rw_access(ctx, con, Direction::Write)),
    ]);
    parent.add_child(rw);
}

fn rw_entry(ctx: &mut DiagCtx, con: &mut Console<'_>) -> Result<(), AccessError> {
    if ctx.rw.space.is_none() {
        let first_active = {
            let dev = ctx.handle()?;
            let mut found = None;
            for space in 0..dev.space_count() {
                if dev.space_info(space)?.active {
                    found = Some(space);
                    break;
                }
            }
            found
        };
        match first_active {
            Some(space) => ctx.rw.space = Some(space),
            None => {
                cprintln!(con, "The device has no active address spaces");
                return Err(AccessError::NoResourcesOnDevice);
            }
        }
    }
    if let Some(space) = ctx.rw.space {
        cprintln!(con, "\nCurrent settings:");
        cprintln!(con, "    Active address space: BAR {space}");
        cprintln!(con, "    Read/write mode:      {} bits", ctx.rw.width.bits());
        cprintln!(con, "    Transfer type:        {}", if ctx.rw.block { "block" } else { "single unit" });
    }
    Ok(())
}

fn rw_access(ctx: &mut DiagCtx, con: &mut Console<'_>, direction: Direction) -> Result<(), AccessError> {
    let Some(space) = ctx.rw.space else {
        return Err(AccessError::NoResourcesOnDevice);
    };
    let (width, block) = (ctx.rw.width, ctx.rw.block);
    let dev = ctx.handle()?;
    if block {
        access::read_write_block(con, dev, direction, AddrSpace::Bar(space));
    } else {
        access::read_write_addr(con, dev, direction, space, width);
    }
    Ok(())
}

// --- Plug-and-play and power management events --------------------------

fn attach_events(parent: &mut DiagMenu) {
    let mut events = MenuNode::new("Register/unregister plug-and-play and power management events")
        .with_title("Plug-and-play and power management events")
        .hide_when(no_device)
        .on_entry(|ctx: &mut DiagCtx, con| {
            // The handler fires from the backend, possibly outside any
            // prompt; it only records, and the menu reports on entry.
            for action in ctx.event_log.borrow_mut().drain(..) {
                cprintln!(con, "Received event notification: {action}");
            }
            Ok(())
        });
    events.add_children(vec![
        MenuNode::new("Register events")
            .hide_when(|ctx: &DiagCtx| ctx.events_registered)
            .on_entry(|ctx: &mut DiagCtx, con| {
                let sink = Rc::clone(&ctx.event_log);
                let result = ctx.handle()?.register_events(Box::new(move |action| {
                    sink.borrow_mut().push(action);
                }));
                match result {
                    Ok(()) => {
                        ctx.events_registered = true;
                        cprintln!(con, "Events registered");
                    }
                    Err(err) => {
                        cprintln!(con, "Failed to register events. Error 0x{:X} - {}", err.code(), err);
                    }
                }
                Ok(())
            }),
        MenuNode::new("Unregister events")
            .hide_when(|ctx: &DiagCtx| !ctx.events_registered)
            .on_entry(|ctx: &mut DiagCtx, con| {
                match ctx.handle()?.unregister_events() {
                    Ok(()) => {
                        ctx.events_registered = false;
                        cprintln!(con, "Events unregistered");
                    }
                    Err(err) => {
                        cprintln!(con, "Failed to unregister events. Error 0x{:X} - {}", err.code(), err);
                    }
                }
                Ok(())
            }),
    ]);
    parent.add_child(events);
}

// --- Interrupts ----------------------------------------------------------

fn attach_interrupts(parent: &mut DiagMenu) {
    let mut interrupts = MenuNode::new("Enable/disable the device's interrupts")
        .with_title("Interrupts")
        .hide_when(no_device);
    interrupts.add_children(vec![
        MenuNode::new("Enable interrupts")
            .hide_when(|ctx: &DiagCtx| ctx.interrupts_enabled)
            .on_entry(|ctx: &mut DiagCtx, con| {
                match ctx.handle()?.enable_interrupts() {
                    Ok(()) => {
                        ctx.interrupts_enabled = true;
                        cprintln!(con, "Interrupts enabled");
                    }
                    Err(err) => {
                        cprintln!(con, "Failed enabling interrupts. Error 0x{:X} - {}", err.code(), err);
                    }
                }
                Ok(())
            }),
        MenuNode::new("Disable interrupts")
            .hide_when(|ctx: &DiagCtx| !ctx.interrupts_enabled)
            .on_entry(|ctx: &mut DiagCtx, con| {
                match ctx.handle()?.disable_interrupts() {
                    Ok(()) => {
                        ctx.interrupts_enabled = false;
                        cprintln!(con, "Interrupts disabled");
                    }
                    Err(err) => {
                        cprintln!(con, "Failed disabling interrupts. Error 0x{:X} - {}", err.code(), err);
                    }
                }
                Ok(())
            }),
    ]);
    parent.add_child(interrupts);
}

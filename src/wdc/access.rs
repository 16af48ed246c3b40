//! Register access abstraction and the interactive read/write front-ends.
//!
//! Descriptor-driven access goes through [`read_register`] /
//! [`write_register`]: the declared direction is checked before any
//! transport call, then the access routes to the configuration space or a
//! mapped range per the descriptor, at the descriptor's width. The
//! interactive helpers wrap those in prompts and print every outcome,
//! success or failure, to the console; user cancellation aborts the
//! operation without an error.

use crate::diag::console::Console;
use crate::diag::hex;
use crate::diag::input::{self, MenuInput, NumInput};
use crate::{cprint, cprintln};

use super::catalog::{Catalog, RegisterDescriptor};
use super::device::{AddrSpace, DeviceHandle, Direction, Increment, TransferWidth};
use super::error::{AccessError, AccessResult};

/// Routes a typed read to the configuration space or a mapped range.
pub fn route_read(dev: &dyn DeviceHandle, space: AddrSpace, offset: u64, width: TransferWidth) -> AccessResult<u64> {
    match space {
        AddrSpace::Config => dev.read_cfg(offset, width),
        AddrSpace::Bar(n) => dev.read_addr(n, offset, width),
    }
}

/// Routes a typed write to the configuration space or a mapped range.
pub fn route_write(
    dev: &dyn DeviceHandle,
    space: AddrSpace,
    offset: u64,
    width: TransferWidth,
    value: u64,
) -> AccessResult<()> {
    match space {
        AddrSpace::Config => dev.write_cfg(offset, width, value),
        AddrSpace::Bar(n) => dev.write_addr(n, offset, width, value),
    }
}

/// Offset bias for express-catalog descriptors: the device's express
/// capability offset, or 0 for plain catalogs and legacy devices.
pub fn express_base(dev: &dyn DeviceHandle, express: bool) -> AccessResult<u64> {
    if express && dev.express_generation() != 0 {
        dev.express_offset()
    } else {
        Ok(0)
    }
}

/// Reads a register through its descriptor. Wrong-direction access is
/// rejected before touching the device.
pub fn read_register(dev: &dyn DeviceHandle, reg: &RegisterDescriptor, base: u64) -> AccessResult<u64> {
    if !reg.direction.allows(Direction::Read) {
        log::error!("read attempted on write-only register {}", reg.name);
        return Err(AccessError::WrongDirection { register: reg.name, attempted: Direction::Read });
    }
    route_read(dev, reg.space, reg.offset + base, reg.width)
}

/// Writes a register through its descriptor. Wrong-direction access is
/// rejected before touching the device.
pub fn write_register(
    dev: &dyn DeviceHandle,
    reg: &RegisterDescriptor,
    base: u64,
    value: u64,
) -> AccessResult<()> {
    if !reg.direction.allows(Direction::Write) {
        log::error!("write attempted on read-only register {}", reg.name);
        return Err(AccessError::WrongDirection { register: reg.name, attempted: Direction::Write });
    }
    route_write(dev, reg.space, reg.offset + base, reg.width, value)
}

/// Prints the catalog as an indexed table: name, BAR, offset, size,
/// direction, description.
pub fn print_regs_info(con: &mut Console<'_>, catalog: &Catalog, base: u64, express: bool) {
    let header = if express { "PCI Express registers" } else { "PCI registers" };
    cprintln!(con, "\n{header}");
    cprintln!(con, "{}", "-".repeat(header.len()));
    cprintln!(
        con,
        "    {:<22} {:<4} {:<10} {:<5} {:<4} {}",
        "Name",
        "BAR",
        "Offset",
        "Size",
        "R/W",
        "Description"
    );
    for (i, reg) in catalog.iter().enumerate() {
        let bar = match reg.space {
            AddrSpace::Bar(n) => n.to_string(),
            AddrSpace::Config => String::new(),
        };
        cprintln!(
            con,
            "{:2}. {:<22} {:<4} 0x{:<8X} {:<5} {:<4} {}",
            i + 1,
            reg.name,
            bar,
            reg.offset + base,
            reg.width.bytes(),
            reg.direction.tag(),
            reg.desc
        );
    }
}

/// Reads every readable register in the catalog and prints a value table.
/// Write-only registers are marked and skipped; per-register failures are
/// printed inline and the scan continues.
pub fn read_all_registers(con: &mut Console<'_>, dev: &dyn DeviceHandle, catalog: &Catalog, express: bool) {
    if catalog.is_empty() {
        cprintln!(con, "There are currently no registers defined for the device");
        return;
    }
    let base = match express_base(dev, express) {
        Ok(base) => base,
        Err(err) => {
            report(con, "locate the Express capability", &err);
            return;
        }
    };
    let header = if express {
        "PCI Express configuration registers data"
    } else {
        "PCI configuration registers data"
    };
    cprintln!(con, "\n{header}");
    cprintln!(con, "{}", "-".repeat(header.len()));
    for (i, reg) in catalog.iter().enumerate() {
        cprint!(con, "{:2}. {:<22} ", i + 1, reg.name);
        if reg.direction == Direction::Write {
            cprintln!(con, "{:<18} (Write-only register)", "");
            continue;
        }
        match read_register(dev, reg, base) {
            Ok(value) => cprintln!(con, "0x{:<16X} {}", value, reg.desc),
            Err(err) => cprintln!(con, "Error 0x{:X} - {}", err.code(), err),
        }
    }
    con.pause();
}

/// Prints the catalog, asks for a register selection and (for writes) a
/// value, then performs the access and prints the outcome.
pub fn select_and_access_register(
    con: &mut Console<'_>,
    dev: &dyn DeviceHandle,
    catalog: &Catalog,
    direction: Direction,
    express: bool,
) {
    if catalog.is_empty() {
        cprintln!(con, "There are currently no registers defined for the device");
        return;
    }
    let base = match express_base(dev, express) {
        Ok(base) => base,
        Err(err) => {
            report(con, "locate the Express capability", &err);
            return;
        }
    };
    print_regs_info(con, catalog, base, express);

    let NumInput::Value(selection) =
        input::read_number(con, "\nSelect a register from the list above", false, 4, 1, catalog.len() as u64)
    else {
        return;
    };
    let Some(reg) = catalog.get(selection as usize - 1) else {
        return;
    };

    match direction {
        Direction::Write => {
            let prompt = format!("Enter data to write to the {} register", reg.name);
            let NumInput::Value(value) = input::read_number(con, &prompt, true, reg.width.bytes(), 0, 0) else {
                return;
            };
            match write_register(dev, reg, base, value) {
                Ok(()) => cprintln!(
                    con,
                    "Wrote 0x{:X} to register {} at offset 0x{:X}",
                    value,
                    reg.name,
                    reg.offset + base
                ),
                Err(err) => {
                    cprintln!(
                        con,
                        "Failed writing to register {}. Error 0x{:X} - {}",
                        reg.name,
                        err.code(),
                        err
                    );
                }
            }
        }
        _ => match read_register(dev, reg, base) {
            Ok(value) => cprintln!(
                con,
                "Read 0x{:X} from register {} at offset 0x{:X}",
                value,
                reg.name,
                reg.offset + base
            ),
            Err(err) => {
                cprintln!(
                    con,
                    "Failed reading from register {}. Error 0x{:X} - {}",
                    reg.name,
                    err.code(),
                    err
                );
            }
        },
    }
    con.pause();
}

/// Single-unit interactive transfer in a mapped address space at the
/// given width.
pub fn read_write_addr(
    con: &mut Console<'_>,
    dev: &dyn DeviceHandle,
    direction: Direction,
    space: u32,
    width: TransferWidth,
) {
    let prompt = match direction {
        Direction::Write => "Enter offset to write to",
        _ => "Enter offset to read from",
    };
    let NumInput::Value(offset) = input::read_number(con, prompt, true, 8, 0, 0) else {
        cprintln!(con, "Operation canceled");
        return;
    };

    match direction {
        Direction::Write => {
            let prompt = format!("Enter data to write (max value: 0x{:X})", width.max_value());
            let NumInput::Value(value) = input::read_number(con, &prompt, true, width.bytes(), 0, 0) else {
                cprintln!(con, "Operation canceled");
                return;
            };
            match dev.write_addr(space, offset, width, value) {
                Ok(()) => cprintln!(con, "Wrote 0x{value:X} to offset 0x{offset:X} in BAR {space}"),
                Err(err) => cprintln!(
                    con,
                    "Failed writing 0x{:X} to offset 0x{:X} in BAR {}. Error 0x{:X} - {}",
                    value,
                    offset,
                    space,
                    err.code(),
                    err
                ),
            }
        }
        _ => match dev.read_addr(space, offset, width) {
            Ok(value) => cprintln!(con, "Read 0x{value:X} from offset 0x{offset:X} in BAR {space}"),
            Err(err) => cprintln!(
                con,
                "Failed reading from offset 0x{:X} in BAR {}. Error 0x{:X} - {}",
                offset,
                space,
                err.code(),
                err
            ),
        },
    }
}

/// Interactive transfer-width selection. `None` on cancel or invalid input.
pub fn select_width(con: &mut Console<'_>) -> Option<TransferWidth> {
    cprintln!(con, "\nSelect read/write mode:");
    cprintln!(con, "-----------------------");
    for (i, width) in TransferWidth::ALL.iter().enumerate() {
        cprintln!(con, "{}. {} bits ({} bytes)", i + 1, width.bits(), width.bytes());
    }
    cprintln!(con, "{}. Cancel\n", input::EXIT_MENU);
    match input::read_menu_option(con, TransferWidth::ALL.len() as u64) {
        MenuInput::Choice(n) => Some(TransferWidth::ALL[n as usize - 1]),
        MenuInput::Exit | MenuInput::Invalid => None,
    }
}

/// Interactive variable-length block transfer: offset, byte count, (for
/// mapped ranges) width and auto-increment choice. Read results are
/// hex-dumped; failures print code and description.
pub fn read_write_block(con: &mut Console<'_>, dev: &dyn DeviceHandle, direction: Direction, space: AddrSpace) {
    let offset_prompt = match direction {
        Direction::Write => "Enter offset to write to",
        _ => "Enter offset to read from",
    };
    let NumInput::Value(offset) = input::read_number(con, offset_prompt, true, 8, 0, 0) else {
        cprintln!(con, "Operation canceled");
        return;
    };
    let NumInput::Value(num_bytes) =
        input::read_number(con, "Enter number of bytes to transfer", true, 4, 0, 0)
    else {
        cprintln!(con, "Operation canceled");
        return;
    };
    if num_bytes == 0 {
        return;
    }

    let mut buf = if direction == Direction::Write {
        cprintln!(con, "Enter data to write (hex format): 0x");
        con.flush();
        let (data, count) = hex::read_hex(con, num_bytes as usize);
        if count == 0 {
            cprintln!(con, "Operation canceled");
            return;
        }
        data
    } else {
        vec![0_u8; num_bytes as usize]
    };

    let result = match space {
        AddrSpace::Config => match direction {
            Direction::Write => dev.write_cfg_block(offset, &buf),
            _ => dev.read_cfg_block(offset, &mut buf),
        },
        AddrSpace::Bar(bar) => {
            let Some(width) = select_width(con) else {
                cprintln!(con, "Operation canceled");
                return;
            };
            let inc_prompt = format!(
                "Increment the address after each {}-byte unit? (0 - No, Otherwise - Yes)",
                width.bytes()
            );
            let NumInput::Value(inc) = input::read_number(con, &inc_prompt, false, 4, 0, 0) else {
                cprintln!(con, "Operation canceled");
                return;
            };
            let increment = if inc != 0 { Increment::Auto } else { Increment::Fixed };
            match direction {
                Direction::Write => dev.write_addr_block(bar, offset, &buf, width, increment),
                _ => dev.read_addr_block(bar, offset, &mut buf, width, increment),
            }
        }
    };

    match (result, direction) {
        (Ok(()), Direction::Write) => {
            cprintln!(con, "Wrote 0x{:X} bytes to offset 0x{:X} in {}", buf.len(), offset, space);
        }
        (Ok(()), _) => {
            cprintln!(con, "\nRead 0x{:X} bytes from offset 0x{:X} in {}:", buf.len(), offset, space);
            hex::print_hex(con, &buf);
        }
        (Err(err), dir) => {
            cprintln!(
                con,
                "Failed to {} 0x{:X} bytes at offset 0x{:X} in {}. Error 0x{:X} - {}",
                dir,
                buf.len(),
                offset,
                space,
                err.code(),
                err
            );
        }
    }
    con.pause();
}

/// Walks the configuration-space capability chain. Returns `(id, offset)`
/// pairs in chain order; empty when the status register advertises no
/// capability list. The walk is bounded so a corrupt chain cannot loop.
pub fn capability_chain(dev: &dyn DeviceHandle) -> AccessResult<Vec<(u8, u64)>> {
    const CAPS_LIST_PRESENT: u64 = 0x10;
    let status = dev.read_cfg(0x06, TransferWidth::W16)?;
    if status & CAPS_LIST_PRESENT == 0 {
        return Ok(Vec::new());
    }
    let mut chain = Vec::new();
    let mut next = dev.read_cfg(0x34, TransferWidth::W8)? & 0xFC;
    while next != 0 && chain.len() < 48 {
        let id = dev.read_cfg(next, TransferWidth::W8)? as u8;
        let ptr = dev.read_cfg(next + 1, TransferWidth::W8)?;
        chain.push((id, next));
        next = ptr & 0xFC;
    }
    Ok(chain)
}

/// Prints the device's capability chain.
pub fn scan_capabilities(con: &mut Console<'_>, dev: &dyn DeviceHandle) {
    let chain = match capability_chain(dev) {
        Ok(chain) => chain,
        Err(err) => {
            report(con, "scan the capability chain", &err);
            return;
        }
    };
    if chain.is_empty() {
        cprintln!(con, "The device has no capabilities");
        return;
    }
    cprintln!(con, "\nFound {} capabilities:", chain.len());
    for (i, (id, offset)) in chain.iter().enumerate() {
        cprintln!(con, "{:2}. Capability ID: 0x{:02X} at offset 0x{:02X}", i + 1, id, offset);
    }
}

/// Lists every address space of the device with its kind and range.
pub fn print_address_spaces(con: &mut Console<'_>, dev: &dyn DeviceHandle) -> AccessResult<()> {
    for space in 0..dev.space_count() {
        let info = dev.space_info(space)?;
        cprintln!(con, "{}. {:<10} {:<8} {}", space + 1, info.name, info.kind, info.desc);
    }
    cprintln!(con);
    Ok(())
}

/// Interactive selection of an active address space. Cancelled or inactive
/// selections are errors so a calling entry callback pops back to its
/// parent menu.
pub fn choose_address_space(con: &mut Console<'_>, dev: &dyn DeviceHandle) -> AccessResult<u32> {
    let count = dev.space_count();
    if count == 0 {
        cprintln!(con, "The device has no address spaces");
        return Err(AccessError::NoResourcesOnDevice);
    }
    cprintln!(con, "\nSelect an active address space:");
    cprintln!(con, "-------------------------------");
    print_address_spaces(con, dev)?;

    let NumInput::Value(selection) = input::read_number(con, "Enter option", false, 4, 1, count as u64) else {
        return Err(AccessError::InvalidParameter);
    };
    let space = selection as u32 - 1;
    let info = dev.space_info(space)?;
    if !info.active {
        cprintln!(con, "You have selected an inactive address space");
        return Err(AccessError::InactiveSpace { space });
    }
    Ok(space)
}

fn report(con: &mut Console<'_>, action: &str, err: &AccessError) {
    cprintln!(con, "Failed to {}. Error 0x{:X} - {}", action, err.code(), err);
}

//! Static register catalogs for the PCI configuration header and the PCI
//! Express capability block. Express offsets are relative to the
//! capability base; the access layer biases them by the device's express
//! capability offset.

use crate::wdc::catalog::RegisterDescriptor;
use crate::wdc::device::{AddrSpace, Direction, TransferWidth};

const fn cfg(
    offset: u64,
    width: TransferWidth,
    direction: Direction,
    name: &'static str,
    desc: &'static str,
) -> RegisterDescriptor {
    RegisterDescriptor { space: AddrSpace::Config, offset, width, direction, name, desc }
}

/// Plain PCI configuration header registers.
pub static PCI_CFG_REGS: [RegisterDescriptor; 26] = [
    cfg(0x00, TransferWidth::W16, Direction::ReadWrite, "VID", "Vendor ID"),
    cfg(0x02, TransferWidth::W16, Direction::ReadWrite, "DID", "Device ID"),
    cfg(0x04, TransferWidth::W16, Direction::ReadWrite, "CMD", "Command register"),
    cfg(0x06, TransferWidth::W16, Direction::ReadWrite, "STS", "Status register"),
    cfg(0x08, TransferWidth::W32, Direction::ReadWrite, "RID_CLCD", "Revision ID and class code"),
    cfg(0x0a, TransferWidth::W8, Direction::ReadWrite, "SCC", "Sub class code"),
    cfg(0x0b, TransferWidth::W8, Direction::ReadWrite, "BCC", "Base class code"),
    cfg(0x0c, TransferWidth::W8, Direction::ReadWrite, "CALN", "Cache line size"),
    cfg(0x0d, TransferWidth::W8, Direction::ReadWrite, "LAT", "Latency timer"),
    cfg(0x0e, TransferWidth::W8, Direction::ReadWrite, "HDR", "Header type"),
    cfg(0x0f, TransferWidth::W8, Direction::ReadWrite, "BIST", "Built-in self test"),
    cfg(0x10, TransferWidth::W32, Direction::ReadWrite, "BADDR0", "Base address register 0"),
    cfg(0x14, TransferWidth::W32, Direction::ReadWrite, "BADDR1", "Base address register 1"),
    cfg(0x18, TransferWidth::W32, Direction::ReadWrite, "BADDR2", "Base address register 2"),
    cfg(0x1c, TransferWidth::W32, Direction::ReadWrite, "BADDR3", "Base address register 3"),
    cfg(0x20, TransferWidth::W32, Direction::ReadWrite, "BADDR4", "Base address register 4"),
    cfg(0x24, TransferWidth::W32, Direction::ReadWrite, "BADDR5", "Base address register 5"),
    cfg(0x28, TransferWidth::W32, Direction::ReadWrite, "CIS", "CardBus CIS pointer"),
    cfg(0x2c, TransferWidth::W16, Direction::ReadWrite, "SVID", "Sub-system vendor ID"),
    cfg(0x2e, TransferWidth::W16, Direction::ReadWrite, "SDID", "Sub-system device ID"),
    cfg(0x30, TransferWidth::W32, Direction::ReadWrite, "EROM", "Expansion ROM base address"),
    cfg(0x34, TransferWidth::W8, Direction::ReadWrite, "NEW_CAP", "New capabilities pointer"),
    cfg(0x3c, TransferWidth::W32, Direction::ReadWrite, "INTLN", "Interrupt line"),
    cfg(0x3d, TransferWidth::W32, Direction::ReadWrite, "INTPIN", "Interrupt pin"),
    cfg(0x3e, TransferWidth::W32, Direction::ReadWrite, "MINGNT", "Minimum required burst period"),
    cfg(0x3f, TransferWidth::W32, Direction::ReadWrite, "MAXLAT", "Maximum latency"),
];

/// PCI Express capability registers, offsets relative to the capability
/// base in the configuration space.
pub static PCI_EXPRESS_REGS: [RegisterDescriptor; 24] = [
    cfg(0x00, TransferWidth::W8, Direction::ReadWrite, "PCIE_CAP_ID", "PCI Express capability ID"),
    cfg(0x01, TransferWidth::W8, Direction::ReadWrite, "NEXT_CAP_PTR", "Next capability pointer"),
    cfg(0x02, TransferWidth::W16, Direction::ReadWrite, "CAP_REG", "Capabilities register"),
    cfg(0x04, TransferWidth::W32, Direction::ReadWrite, "DEV_CAPS", "Device capabilities"),
    cfg(0x08, TransferWidth::W16, Direction::ReadWrite, "DEV_CTL", "Device control"),
    cfg(0x0a, TransferWidth::W16, Direction::ReadWrite, "DEV_STS", "Device status"),
    cfg(0x0c, TransferWidth::W32, Direction::ReadWrite, "LNK_CAPS", "Link capabilities"),
    cfg(0x10, TransferWidth::W16, Direction::ReadWrite, "LNK_CTL", "Link control"),
    cfg(0x12, TransferWidth::W16, Direction::ReadWrite, "LNK_STS", "Link status"),
    cfg(0x14, TransferWidth::W32, Direction::ReadWrite, "SLOT_CAPS", "Slot capabilities"),
    cfg(0x18, TransferWidth::W16, Direction::ReadWrite, "SLOT_CTL", "Slot control"),
    cfg(0x1a, TransferWidth::W16, Direction::ReadWrite, "SLOT_STS", "Slot status"),
    cfg(0x1c, TransferWidth::W16, Direction::ReadWrite, "ROOT_CAPS", "Root capabilities"),
    cfg(0x1e, TransferWidth::W16, Direction::ReadWrite, "ROOT_CTL", "Root control"),
    cfg(0x20, TransferWidth::W32, Direction::ReadWrite, "ROOT_STS", "Root status"),
    cfg(0x24, TransferWidth::W32, Direction::ReadWrite, "DEV_CAPS2", "Device capabilities 2"),
    cfg(0x28, TransferWidth::W16, Direction::ReadWrite, "DEV_CTL2", "Device control 2"),
    cfg(0x2a, TransferWidth::W16, Direction::ReadWrite, "DEV_STS2", "Device status 2"),
    cfg(0x2c, TransferWidth::W32, Direction::ReadWrite, "LNK_CAPS2", "Link capabilities 2"),
    cfg(0x30, TransferWidth::W16, Direction::ReadWrite, "LNK_CTL2", "Link control 2"),
    cfg(0x32, TransferWidth::W16, Direction::ReadWrite, "LNK_STS2", "Link status 2"),
    cfg(0x34, TransferWidth::W32, Direction::ReadWrite, "SLOT_CAPS2", "Slot capabilities 2"),
    cfg(0x38, TransferWidth::W16, Direction::ReadWrite, "SLOT_CTL2", "Slot control 2"),
    cfg(0x3a, TransferWidth::W16, Direction::ReadWrite, "SLOT_STS2", "Slot status 2"),
];

//! Access vocabulary (widths, spaces, directions) and the capability
//! traits a hardware backend must implement. The access layer and the
//! menus only ever talk to `dyn DeviceScan` / `dyn DeviceHandle`, so the
//! kernel-facing backend stays swappable.

use std::fmt;

use super::error::{AccessError, AccessResult};

/// Transfer unit width for typed register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferWidth {
    W8,
    W16,
    W32,
    W64,
}

impl TransferWidth {
    pub const ALL: [TransferWidth; 4] =
        [TransferWidth::W8, TransferWidth::W16, TransferWidth::W32, TransferWidth::W64];

    pub fn bytes(self) -> usize {
        match self {
            TransferWidth::W8 => 1,
            TransferWidth::W16 => 2,
            TransferWidth::W32 => 4,
            TransferWidth::W64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }

    pub fn max_value(self) -> u64 {
        match self {
            TransferWidth::W8 => u8::MAX as u64,
            TransferWidth::W16 => u16::MAX as u64,
            TransferWidth::W32 => u32::MAX as u64,
            TransferWidth::W64 => u64::MAX,
        }
    }

    pub fn from_bytes(bytes: usize) -> Option<TransferWidth> {
        match bytes {
            1 => Some(TransferWidth::W8),
            2 => Some(TransferWidth::W16),
            4 => Some(TransferWidth::W32),
            8 => Some(TransferWidth::W64),
            _ => None,
        }
    }
}

/// Declared access direction of a register, and the direction of an
/// attempted access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
    ReadWrite,
}

impl Direction {
    /// Whether a register declared with this direction permits the
    /// attempted access.
    pub fn allows(self, attempted: Direction) -> bool {
        matches!(
            (self, attempted),
            (Direction::ReadWrite, _) | (Direction::Read, Direction::Read) | (Direction::Write, Direction::Write)
        )
    }

    pub fn tag(self) -> &'static str {
        match self {
            Direction::Read => "R",
            Direction::Write => "W",
            Direction::ReadWrite => "RW",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => write!(f, "read"),
            Direction::Write => write!(f, "write"),
            Direction::ReadWrite => write!(f, "read/write"),
        }
    }
}

/// Target address space of an access. `Config` is the sentinel that routes
/// to the bus configuration space instead of a mapped range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrSpace {
    Bar(u32),
    Config,
}

impl fmt::Display for AddrSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrSpace::Bar(n) => write!(f, "BAR {n}"),
            AddrSpace::Config => write!(f, "the configuration space"),
        }
    }
}

/// Address stepping for block transfers. `Fixed` pins every unit at the
/// starting offset, for FIFO-style registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    Auto,
    Fixed,
}

/// Bus location and identity of a device, as reported by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLocation {
    pub vendor_id: u32,
    pub device_id: u32,
    pub domain: u32,
    pub bus: u32,
    pub slot: u32,
    pub function: u32,
}

impl fmt::Display for DeviceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Domain [0x{:x}], Bus [0x{:x}], Slot [0x{:x}], Function [0x{:x}]",
            self.domain, self.bus, self.slot, self.function
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceKind {
    Memory,
    Io,
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceKind::Memory => write!(f, "Memory"),
            SpaceKind::Io => write!(f, "I/O"),
        }
    }
}

/// Display information for one address space of an open device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceInfo {
    pub kind: SpaceKind,
    pub name: String,
    /// Active range/size, or an inactive marker.
    pub desc: String,
    pub active: bool,
}

/// Plug-and-play / power management notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Insert,
    Remove,
    PowerChanged(u8),
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventAction::Insert => write!(f, "device inserted"),
            EventAction::Remove => write!(f, "device removed"),
            EventAction::PowerChanged(state) => write!(f, "power state changed to D{state}"),
        }
    }
}

pub type EventHandler = Box<dyn Fn(EventAction)>;

/// Bus enumeration and device opening capability.
pub trait DeviceScan {
    /// Lists devices matching the optional vendor/device ID filter
    /// (`None` matches everything).
    fn scan(&self, vendor_id: Option<u32>, device_id: Option<u32>) -> AccessResult<Vec<DeviceLocation>>;

    fn open(&self, location: &DeviceLocation) -> AccessResult<Box<dyn DeviceHandle>>;
}

/// Per-device access capability. The four width-specific reads collapse to
/// one method taking a [`TransferWidth`]; values travel as `u64` and the
/// width bounds them.
///
/// Block transfers have default implementations that loop the scalar
/// calls unit by unit, honoring the increment mode; backends with a native
/// block primitive can override them.
pub trait DeviceHandle {
    fn location(&self) -> &DeviceLocation;

    /// Typed read from a mapped address space.
    fn read_addr(&self, space: u32, offset: u64, width: TransferWidth) -> AccessResult<u64>;

    /// Typed write to a mapped address space.
    fn write_addr(&self, space: u32, offset: u64, width: TransferWidth, value: u64) -> AccessResult<()>;

    /// Typed read from the configuration space.
    fn read_cfg(&self, offset: u64, width: TransferWidth) -> AccessResult<u64>;

    /// Typed write to the configuration space.
    fn write_cfg(&self, offset: u64, width: TransferWidth, value: u64) -> AccessResult<()>;

    fn space_count(&self) -> u32;

    fn space_info(&self, space: u32) -> AccessResult<SpaceInfo>;

    /// Express generation of the device, 0 for legacy devices.
    fn express_generation(&self) -> u32 {
        0
    }

    /// Offset of the express capability block in the configuration space.
    fn express_offset(&self) -> AccessResult<u64> {
        Err(AccessError::OperationFailed { what: "Express capability offset query" })
    }

    fn enable_interrupts(&self) -> AccessResult<()> {
        Err(AccessError::OperationFailed { what: "Interrupt enable" })
    }

    fn disable_interrupts(&self) -> AccessResult<()> {
        Err(AccessError::OperationFailed { what: "Interrupt disable" })
    }

    fn register_events(&self, _handler: EventHandler) -> AccessResult<()> {
        Err(AccessError::OperationFailed { what: "Event registration" })
    }

    fn unregister_events(&self) -> AccessResult<()> {
        Err(AccessError::OperationFailed { what: "Event unregistration" })
    }

    fn close(&self) -> AccessResult<()> {
        Ok(())
    }

    /// Block read from a mapped address space. `out.len()` must be a
    /// multiple of the unit width. Units land in `out` little-endian, in
    /// transfer order.
    fn read_addr_block(
        &self,
        space: u32,
        offset: u64,
        out: &mut [u8],
        width: TransferWidth,
        increment: Increment,
    ) -> AccessResult<()> {
        let unit = width.bytes();
        if !out.len().is_multiple_of(unit) {
            return Err(AccessError::InvalidParameter);
        }
        for (i, chunk) in out.chunks_exact_mut(unit).enumerate() {
            let at = unit_offset(offset, i, unit, increment)
                .ok_or(AccessError::OutOfRange { space: AddrSpace::Bar(space), offset })?;
            let value = self.read_addr(space, at, width)?;
            chunk.copy_from_slice(&value.to_le_bytes()[..unit]);
        }
        Ok(())
    }

    /// Block write to a mapped address space. `data.len()` must be a
    /// multiple of the unit width.
    fn write_addr_block(
        &self,
        space: u32,
        offset: u64,
        data: &[u8],
        width: TransferWidth,
        increment: Increment,
    ) -> AccessResult<()> {
        let unit = width.bytes();
        if !data.len().is_multiple_of(unit) {
            return Err(AccessError::InvalidParameter);
        }
        for (i, chunk) in data.chunks_exact(unit).enumerate() {
            let at = unit_offset(offset, i, unit, increment)
                .ok_or(AccessError::OutOfRange { space: AddrSpace::Bar(space), offset })?;
            let mut bytes = [0_u8; 8];
            bytes[..unit].copy_from_slice(chunk);
            self.write_addr(space, at, width, u64::from_le_bytes(bytes))?;
        }
        Ok(())
    }

    /// Byte-wise block read from the configuration space.
    fn read_cfg_block(&self, offset: u64, out: &mut [u8]) -> AccessResult<()> {
        for (i, byte) in out.iter_mut().enumerate() {
            let at = offset
                .checked_add(i as u64)
                .ok_or(AccessError::OutOfRange { space: AddrSpace::Config, offset })?;
            *byte = self.read_cfg(at, TransferWidth::W8)? as u8;
        }
        Ok(())
    }

    /// Byte-wise block write to the configuration space.
    fn write_cfg_block(&self, offset: u64, data: &[u8]) -> AccessResult<()> {
        for (i, byte) in data.iter().enumerate() {
            let at = offset
                .checked_add(i as u64)
                .ok_or(AccessError::OutOfRange { space: AddrSpace::Config, offset })?;
            self.write_cfg(at, TransferWidth::W8, *byte as u64)?;
        }
        Ok(())
    }
}

// `None` when the stepped offset would wrap; offsets are user-supplied
// and may sit anywhere in the u64 range.
fn unit_offset(start: u64, index: usize, unit: usize, increment: Increment) -> Option<u64> {
    match increment {
        Increment::Auto => {
            let step = (index as u64).checked_mul(unit as u64)?;
            start.checked_add(step)
        }
        Increment::Fixed => Some(start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_allows_matrix() {
        assert!(Direction::ReadWrite.allows(Direction::Read));
        assert!(Direction::ReadWrite.allows(Direction::Write));
        assert!(Direction::Read.allows(Direction::Read));
        assert!(!Direction::Read.allows(Direction::Write));
        assert!(!Direction::Write.allows(Direction::Read));
    }

    #[test]
    fn width_round_trips_through_bytes() {
        for width in TransferWidth::ALL {
            assert_eq!(TransferWidth::from_bytes(width.bytes()), Some(width));
        }
        assert_eq!(TransferWidth::from_bytes(3), None);
    }

    #[test]
    fn stepped_offsets_refuse_to_wrap() {
        assert_eq!(unit_offset(0x10, 2, 4, Increment::Auto), Some(0x18));
        assert_eq!(unit_offset(u64::MAX, 1, 4, Increment::Auto), None);
        assert_eq!(unit_offset(u64::MAX, 7, 8, Increment::Fixed), Some(u64::MAX));
    }

    #[test]
    fn width_bounds() {
        assert_eq!(TransferWidth::W8.max_value(), 0xFF);
        assert_eq!(TransferWidth::W16.max_value(), 0xFFFF);
        assert_eq!(TransferWidth::W64.max_value(), u64::MAX);
    }
}

//! A RAM-backed device: a 4 KiB configuration space plus a configurable
//! set of BARs. Single-threaded by design (the diagnostic loop is a
//! console REPL), so interior mutability is `RefCell`/`Cell`.

use std::cell::{Cell, RefCell};

use crate::wdc::device::{
    AddrSpace, DeviceHandle, DeviceLocation, EventAction, EventHandler, SpaceInfo, SpaceKind,
    TransferWidth,
};
use crate::wdc::error::{AccessError, AccessResult};

pub const CFG_SPACE_BYTES: usize = 4096;

/// One BAR of a simulated device.
#[derive(Debug, Clone)]
pub struct BarSpec {
    pub kind: SpaceKind,
    pub base: u64,
    pub size: usize,
    pub active: bool,
}

/// Blueprint for a simulated device; the bus clones one per open.
#[derive(Debug, Clone)]
pub struct SimDeviceSpec {
    pub location: DeviceLocation,
    /// 0 for a legacy (non-express) device.
    pub express_generation: u32,
    /// Offset of the express capability block in the configuration space.
    pub express_offset: u64,
    pub bars: Vec<BarSpec>,
}

struct SimBar {
    spec: BarSpec,
    bytes: RefCell<Vec<u8>>,
}

pub struct SimDevice {
    location: DeviceLocation,
    cfg: RefCell<Vec<u8>>,
    bars: Vec<SimBar>,
    express_generation: u32,
    express_offset: u64,
    events: RefCell<Option<EventHandler>>,
    interrupts_enabled: Cell<bool>,
    /// `(space, offset)` per transferred unit, so tests can check the
    /// address stepping of block transfers.
    transfers: RefCell<Vec<(u32, u64)>>,
}

impl SimDevice {
    pub fn new(spec: &SimDeviceSpec) -> Self {
        let cfg = build_cfg_space(spec);
        let bars = spec
            .bars
            .iter()
            .map(|bar| SimBar { spec: bar.clone(), bytes: RefCell::new(vec![0_u8; bar.size]) })
            .collect();
        Self {
            location: spec.location,
            cfg: RefCell::new(cfg),
            bars,
            express_generation: spec.express_generation,
            express_offset: spec.express_offset,
            events: RefCell::new(None),
            interrupts_enabled: Cell::new(false),
            transfers: RefCell::new(Vec::new()),
        }
    }

    /// Unit-by-unit `(space, offset)` trace of every mapped-range access.
    pub fn transfer_log(&self) -> Vec<(u32, u64)> {
        self.transfers.borrow().clone()
    }

    /// Delivers an event to the registered handler, standing in for the
    /// driver-side notification thread.
    pub fn inject_event(&self, action: EventAction) {
        if let Some(handler) = self.events.borrow().as_ref() {
            handler(action);
        }
    }

    fn bar(&self, space: u32) -> AccessResult<&SimBar> {
        let bar = self.bars.get(space as usize).ok_or(AccessError::InvalidParameter)?;
        if !bar.spec.active {
            return Err(AccessError::InactiveSpace { space });
        }
        Ok(bar)
    }
}

fn build_cfg_space(spec: &SimDeviceSpec) -> Vec<u8> {
    let mut cfg = vec![0_u8; CFG_SPACE_BYTES];
    put16(&mut cfg, 0x00, spec.location.vendor_id as u16);
    put16(&mut cfg, 0x02, spec.location.device_id as u16);
    put16(&mut cfg, 0x04, 0x0007); // IO, memory, bus master
    cfg[0x08] = 0x01; // revision
    cfg[0x0b] = 0x02; // network controller
    cfg[0x0c] = 0x10; // cache line size
    cfg[0x0e] = 0x00; // type 0 header
    for (i, bar) in spec.bars.iter().enumerate().take(6) {
        let io_flag = match bar.kind {
            SpaceKind::Io => 1,
            SpaceKind::Memory => 0,
        };
        let value = if bar.active { bar.base as u32 | io_flag } else { 0 };
        put32(&mut cfg, 0x10 + i * 4, value);
    }
    cfg[0x3c] = 0x0b; // interrupt line
    cfg[0x3d] = 0x01; // INTA
    if spec.express_generation != 0 {
        let sts = 0x0010; // capabilities list present
        put16(&mut cfg, 0x06, sts);
        cfg[0x34] = spec.express_offset as u8;
        let cap = spec.express_offset as usize;
        cfg[cap] = 0x10; // express capability ID
        cfg[cap + 1] = 0x00; // end of chain
        put16(&mut cfg, cap + 2, 0x0002); // capability version 2
    }
    cfg
}

fn put16(cfg: &mut [u8], offset: usize, value: u16) {
    cfg[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put32(cfg: &mut [u8], offset: usize, value: u32) {
    cfg[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

// Bounds checks stay in the u64 domain: offsets come straight from user
// input and may exceed usize on 32-bit hosts or wrap a naive `offset + unit`.
fn span(len: usize, offset: u64, unit: usize) -> Option<std::ops::Range<usize>> {
    let len = len as u64;
    if offset >= len || (unit as u64) > len - offset {
        return None;
    }
    let start = offset as usize;
    Some(start..start + unit)
}

fn read_le(bytes: &[u8], offset: u64, width: TransferWidth, space: AddrSpace) -> AccessResult<u64> {
    let unit = width.bytes();
    let range = span(bytes.len(), offset, unit).ok_or(AccessError::OutOfRange { space, offset })?;
    let mut buf = [0_u8; 8];
    buf[..unit].copy_from_slice(&bytes[range]);
    Ok(u64::from_le_bytes(buf))
}

fn write_le(bytes: &mut [u8], offset: u64, width: TransferWidth, value: u64, space: AddrSpace) -> AccessResult<()> {
    let unit = width.bytes();
    let range = span(bytes.len(), offset, unit).ok_or(AccessError::OutOfRange { space, offset })?;
    if value > width.max_value() {
        return Err(AccessError::InvalidParameter);
    }
    bytes[range].copy_from_slice(&value.to_le_bytes()[..unit]);
    Ok(())
}

impl DeviceHandle for SimDevice {
    fn location(&self) -> &DeviceLocation {
        &self.location
    }

    fn read_addr(&self, space: u32, offset: u64, width: TransferWidth) -> AccessResult<u64> {
        let bar = self.bar(space)?;
        self.transfers.borrow_mut().push((space, offset));
        read_le(&bar.bytes.borrow(), offset, width, AddrSpace::Bar(space))
    }

    fn write_addr(&self, space: u32, offset: u64, width: TransferWidth, value: u64) -> AccessResult<()> {
        let bar = self.bar(space)?;
        self.transfers.borrow_mut().push((space, offset));
        write_le(&mut bar.bytes.borrow_mut(), offset, width, value, AddrSpace::Bar(space))
    }

    fn read_cfg(&self, offset: u64, width: TransferWidth) -> AccessResult<u64> {
        read_le(&self.cfg.borrow(), offset, width, AddrSpace::Config)
    }

    fn write_cfg(&self, offset: u64, width: TransferWidth, value: u64) -> AccessResult<()> {
        write_le(&mut self.cfg.borrow_mut(), offset, width, value, AddrSpace::Config)
    }

    fn space_count(&self) -> u32 {
        self.bars.len() as u32
    }

    fn space_info(&self, space: u32) -> AccessResult<SpaceInfo> {
        let bar = self.bars.get(space as usize).ok_or(AccessError::InvalidParameter)?;
        let desc = if bar.spec.active {
            format!(
                "0x{:016X} - 0x{:016X} (0x{:x} bytes)",
                bar.spec.base,
                bar.spec.base + bar.spec.size as u64 - 1,
                bar.spec.size
            )
        } else {
            "Inactive address space".to_string()
        };
        Ok(SpaceInfo {
            kind: bar.spec.kind,
            name: format!("BAR {space}"),
            desc,
            active: bar.spec.active,
        })
    }

    fn express_generation(&self) -> u32 {
        self.express_generation
    }

    fn express_offset(&self) -> AccessResult<u64> {
        if self.express_generation == 0 {
            return Err(AccessError::OperationFailed { what: "Express capability offset query" });
        }
        Ok(self.express_offset)
    }

    fn enable_interrupts(&self) -> AccessResult<()> {
        self.interrupts_enabled.set(true);
        Ok(())
    }

    fn disable_interrupts(&self) -> AccessResult<()> {
        self.interrupts_enabled.set(false);
        Ok(())
    }

    fn register_events(&self, handler: EventHandler) -> AccessResult<()> {
        *self.events.borrow_mut() = Some(handler);
        Ok(())
    }

    fn unregister_events(&self) -> AccessResult<()> {
        self.events.borrow_mut().take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wdc::device::Increment;

    fn express_spec() -> SimDeviceSpec {
        SimDeviceSpec {
            location: DeviceLocation {
                vendor_id: 0x10EC,
                device_id: 0x8168,
                domain: 0,
                bus: 3,
                slot: 0,
                function: 0,
            },
            express_generation: 3,
            express_offset: 0x40,
            bars: vec![
                BarSpec { kind: SpaceKind::Memory, base: 0xF000_0000, size: 0x1000, active: true },
                BarSpec { kind: SpaceKind::Io, base: 0xE000, size: 0x100, active: true },
                BarSpec { kind: SpaceKind::Memory, base: 0, size: 0, active: false },
            ],
        }
    }

    #[test]
    fn cfg_header_reflects_the_blueprint() {
        let dev = SimDevice::new(&express_spec());
        assert_eq!(dev.read_cfg(0x00, TransferWidth::W16), Ok(0x10EC), "VID");
        assert_eq!(dev.read_cfg(0x02, TransferWidth::W16), Ok(0x8168), "DID");
        assert_eq!(dev.read_cfg(0x34, TransferWidth::W8), Ok(0x40), "capability pointer");
        assert_eq!(dev.read_cfg(0x40, TransferWidth::W8), Ok(0x10), "express capability ID");
    }

    #[test]
    fn out_of_range_and_inactive_accesses_fail() {
        let dev = SimDevice::new(&express_spec());
        assert_eq!(
            dev.read_addr(0, 0xFFD, TransferWidth::W32),
            Err(AccessError::OutOfRange { space: AddrSpace::Bar(0), offset: 0xFFD }),
            "a 4-byte read at 0xFFD crosses the 0x1000 boundary"
        );
        assert_eq!(
            dev.read_addr(2, 0x0, TransferWidth::W8),
            Err(AccessError::InactiveSpace { space: 2 })
        );
        assert_eq!(dev.read_addr(9, 0x0, TransferWidth::W8), Err(AccessError::InvalidParameter));
        assert_eq!(
            dev.read_cfg(0x1000, TransferWidth::W8),
            Err(AccessError::OutOfRange { space: AddrSpace::Config, offset: 0x1000 })
        );
    }

    #[test]
    fn max_offsets_report_out_of_range_instead_of_wrapping() {
        let dev = SimDevice::new(&express_spec());
        assert_eq!(
            dev.read_cfg(u64::MAX, TransferWidth::W8),
            Err(AccessError::OutOfRange { space: AddrSpace::Config, offset: u64::MAX })
        );
        assert_eq!(
            dev.read_addr(0, u64::MAX, TransferWidth::W32),
            Err(AccessError::OutOfRange { space: AddrSpace::Bar(0), offset: u64::MAX })
        );
        assert_eq!(
            dev.write_addr(0, u64::MAX - 3, TransferWidth::W64, 0),
            Err(AccessError::OutOfRange { space: AddrSpace::Bar(0), offset: u64::MAX - 3 })
        );
        let mut out = [0_u8; 8];
        assert_eq!(
            dev.read_addr_block(0, u64::MAX - 4, &mut out, TransferWidth::W32, Increment::Auto),
            Err(AccessError::OutOfRange { space: AddrSpace::Bar(0), offset: u64::MAX - 4 })
        );
    }

    #[test]
    fn pinned_block_read_samples_one_offset() {
        let dev = SimDevice::new(&express_spec());
        let mut out = [0_u8; 4];
        dev.read_addr_block(0, 0x10, &mut out, TransferWidth::W8, Increment::Fixed)
            .expect("block read succeeds");
        assert_eq!(
            dev.transfer_log(),
            vec![(0, 0x10); 4],
            "auto-increment off should pin every unit at the start offset"
        );
    }

    #[test]
    fn incrementing_block_write_steps_by_unit_width() {
        let dev = SimDevice::new(&express_spec());
        let data = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        dev.write_addr_block(0, 0x20, &data, TransferWidth::W32, Increment::Auto)
            .expect("block write succeeds");
        assert_eq!(dev.transfer_log(), vec![(0, 0x20), (0, 0x24)]);
        assert_eq!(dev.read_addr(0, 0x24, TransferWidth::W32), Ok(0x8877_6655));
    }

    #[test]
    fn events_round_trip_through_the_handler() {
        let dev = SimDevice::new(&express_spec());
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = std::rc::Rc::clone(&seen);
        dev.register_events(Box::new(move |action| sink.borrow_mut().push(action)))
            .expect("registration succeeds");
        dev.inject_event(EventAction::Remove);
        dev.unregister_events().expect("unregistration succeeds");
        dev.inject_event(EventAction::Insert);
        assert_eq!(*seen.borrow(), vec![EventAction::Remove], "no delivery after unregister");
    }
}

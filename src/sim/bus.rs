//! Simulated bus enumeration: a fixed set of device blueprints, scanned
//! and opened like real hardware.

use crate::wdc::device::{DeviceHandle, DeviceLocation, DeviceScan, SpaceKind};
use crate::wdc::error::{AccessError, AccessResult};

use super::device::{BarSpec, SimDevice, SimDeviceSpec};

pub struct SimBus {
    specs: Vec<SimDeviceSpec>,
}

impl SimBus {
    pub fn new(specs: Vec<SimDeviceSpec>) -> Self {
        Self { specs }
    }

    /// Two canned devices: an express network controller and a legacy
    /// virtio-style device, enough to exercise every menu path.
    pub fn with_default_devices() -> Self {
        Self::new(vec![
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
            },
            SimDeviceSpec {
                location: DeviceLocation {
                    vendor_id: 0x1AF4,
                    device_id: 0x1000,
                    domain: 0,
                    bus: 5,
                    slot: 2,
                    function: 0,
                },
                express_generation: 0,
                express_offset: 0,
                bars: vec![BarSpec {
                    kind: SpaceKind::Memory,
                    base: 0xFE00_0000,
                    size: 0x4000,
                    active: true,
                }],
            },
        ])
    }
}

impl DeviceScan for SimBus {
    fn scan(&self, vendor_id: Option<u32>, device_id: Option<u32>) -> AccessResult<Vec<DeviceLocation>> {
        Ok(self
            .specs
            .iter()
            .map(|spec| spec.location)
            .filter(|loc| vendor_id.is_none_or(|v| loc.vendor_id == v))
            .filter(|loc| device_id.is_none_or(|d| loc.device_id == d))
            .collect())
    }

    fn open(&self, location: &DeviceLocation) -> AccessResult<Box<dyn DeviceHandle>> {
        let spec = self
            .specs
            .iter()
            .find(|spec| spec.location == *location)
            .ok_or(AccessError::DeviceNotFound)?;
        Ok(Box::new(SimDevice::new(spec)))
    }
}

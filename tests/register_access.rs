//! Register access abstraction scenarios: direction enforcement without a
//! transport call, continue-on-error catalog scans, and the interactive
//! block transfer front-end over the simulated device.

use std::cell::RefCell;
use std::io::Cursor;

use mmdiag::diag::console::Console;
use mmdiag::sim::{BarSpec, SimDevice, SimDeviceSpec};
use mmdiag::wdc::access;
use mmdiag::wdc::catalog::{Catalog, RegisterDescriptor};
use mmdiag::wdc::device::{
    AddrSpace, DeviceHandle, DeviceLocation, Direction, SpaceKind, TransferWidth,
};
use mmdiag::wdc::error::{AccessError, AccessResult};

/// Records every transport call; configuration reads at offset 0x4 fail so
/// scans have an error to step over.
struct StubDevice {
    location: DeviceLocation,
    calls: RefCell<Vec<(&'static str, u64)>>,
}

impl StubDevice {
    fn new() -> Self {
        Self {
            location: DeviceLocation {
                vendor_id: 0x10EC,
                device_id: 0x8168,
                domain: 0,
                bus: 3,
                slot: 0,
                function: 0,
            },
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(&'static str, u64)> {
        self.calls.borrow().clone()
    }
}

impl DeviceHandle for StubDevice {
    fn location(&self) -> &DeviceLocation {
        &self.location
    }

    fn read_addr(&self, _space: u32, offset: u64, _width: TransferWidth) -> AccessResult<u64> {
        self.calls.borrow_mut().push(("read_addr", offset));
        Ok(0)
    }

    fn write_addr(&self, _space: u32, offset: u64, _width: TransferWidth, _value: u64) -> AccessResult<()> {
        self.calls.borrow_mut().push(("write_addr", offset));
        Ok(())
    }

    fn read_cfg(&self, offset: u64, _width: TransferWidth) -> AccessResult<u64> {
        self.calls.borrow_mut().push(("read_cfg", offset));
        if offset == 0x4 {
            return Err(AccessError::OperationFailed { what: "Configuration read" });
        }
        Ok(0x10EC)
    }

    fn write_cfg(&self, offset: u64, _width: TransferWidth, _value: u64) -> AccessResult<()> {
        self.calls.borrow_mut().push(("write_cfg", offset));
        Ok(())
    }

    fn space_count(&self) -> u32 {
        0
    }

    fn space_info(&self, _space: u32) -> AccessResult<mmdiag::wdc::device::SpaceInfo> {
        Err(AccessError::InvalidParameter)
    }
}

static SCAN_REGS: [RegisterDescriptor; 3] = [
    RegisterDescriptor {
        space: AddrSpace::Config,
        offset: 0x0,
        width: TransferWidth::W16,
        direction: Direction::ReadWrite,
        name: "VID",
        desc: "Vendor ID",
    },
    RegisterDescriptor {
        space: AddrSpace::Config,
        offset: 0x4,
        width: TransferWidth::W16,
        direction: Direction::ReadWrite,
        name: "CMD",
        desc: "Command register",
    },
    RegisterDescriptor {
        space: AddrSpace::Config,
        offset: 0x8,
        width: TransferWidth::W32,
        direction: Direction::ReadWrite,
        name: "RID_CLCD",
        desc: "Revision ID and class code",
    },
];

static DOORBELL: RegisterDescriptor = RegisterDescriptor {
    space: AddrSpace::Bar(0),
    offset: 0x20,
    width: TransferWidth::W32,
    direction: Direction::Write,
    name: "DOORBELL",
    desc: "Write-only doorbell",
};

fn with_console<R>(script: &str, body: impl FnOnce(&mut Console<'_>) -> R) -> (R, String) {
    let mut input = Cursor::new(script.as_bytes().to_vec());
    let mut output: Vec<u8> = Vec::new();
    let result = {
        let mut con = Console::new(&mut input, &mut output);
        body(&mut con)
    };
    (result, String::from_utf8(output).expect("console output is utf-8"))
}

#[test]
fn wrong_direction_fails_before_any_transport_call() {
    let dev = StubDevice::new();

    let read_attempt = access::read_register(&dev, &DOORBELL, 0);
    assert_eq!(
        read_attempt,
        Err(AccessError::WrongDirection { register: "DOORBELL", attempted: Direction::Read })
    );

    let vid = &SCAN_REGS[0];
    let read_only = RegisterDescriptor { direction: Direction::Read, ..*vid };
    let write_attempt = access::write_register(&dev, &read_only, 0, 0xFFFF);
    assert_eq!(
        write_attempt,
        Err(AccessError::WrongDirection { register: "VID", attempted: Direction::Write })
    );

    assert!(dev.calls().is_empty(), "the device must not be touched on a direction violation");
}

#[test]
fn read_all_continues_past_per_register_errors() {
    let dev = StubDevice::new();
    let catalog = Catalog::new(&SCAN_REGS);
    let ((), output) = with_console("\n", |con| {
        access::read_all_registers(con, &dev, &catalog, false);
    });

    assert!(output.contains("Error 0x2000000A"), "the CMD failure is reported, got:\n{output}");
    assert!(
        output.contains("Revision ID and class code"),
        "the scan continues after the failure, got:\n{output}"
    );
    assert_eq!(
        dev.calls(),
        vec![("read_cfg", 0x0), ("read_cfg", 0x4), ("read_cfg", 0x8)],
        "every register should be attempted exactly once"
    );
}

#[test]
fn selecting_a_write_only_register_for_read_reports_and_skips_transport() {
    static WO_ONLY: [RegisterDescriptor; 1] = [RegisterDescriptor {
        space: AddrSpace::Config,
        offset: 0x10,
        width: TransferWidth::W32,
        direction: Direction::Write,
        name: "WDATA",
        desc: "Write-only data port",
    }];
    let dev = StubDevice::new();
    let catalog = Catalog::new(&WO_ONLY);
    let ((), output) = with_console("1\n\n", |con| {
        access::select_and_access_register(con, &dev, &catalog, Direction::Read, false);
    });

    assert!(output.contains("Failed reading from register WDATA"), "got:\n{output}");
    assert!(output.contains("0x20000004"), "the wrong-direction code is printed, got:\n{output}");
    assert!(dev.calls().is_empty(), "no transport call may happen");
}

#[test]
fn express_registers_are_biased_by_the_capability_offset() {
    let dev = StubDevice::new();
    let reg = RegisterDescriptor {
        space: AddrSpace::Config,
        offset: 0x8,
        width: TransferWidth::W16,
        direction: Direction::ReadWrite,
        name: "DEV_CTL",
        desc: "Device control",
    };
    access::read_register(&dev, &reg, 0x40).expect("read succeeds");
    assert_eq!(dev.calls(), vec![("read_cfg", 0x48)], "offset 0x8 biased by base 0x40");
}

#[test]
fn capability_scan_walks_the_chain() {
    let dev = SimDevice::new(&SimDeviceSpec {
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
        bars: vec![],
    });
    let chain = access::capability_chain(&dev).expect("chain walk succeeds");
    assert_eq!(chain, vec![(0x10, 0x40)], "the express capability heads the chain");

    let legacy = SimDevice::new(&SimDeviceSpec {
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
        bars: vec![],
    });
    let chain = access::capability_chain(&legacy).expect("chain walk succeeds");
    assert!(chain.is_empty(), "a legacy device advertises no capability list");
}

#[test]
fn interactive_block_read_with_pinned_address() {
    let dev = SimDevice::new(&SimDeviceSpec {
        location: DeviceLocation {
            vendor_id: 0xABCD,
            device_id: 0x0001,
            domain: 0,
            bus: 0,
            slot: 0,
            function: 0,
        },
        express_generation: 0,
        express_offset: 0,
        bars: vec![BarSpec { kind: SpaceKind::Memory, base: 0xD000_0000, size: 0x100, active: true }],
    });

    // Offset 0x10, 4 bytes, 8-bit units, no auto-increment, then ENTER.
    let ((), output) = with_console("10\n4\n1\n0\n\n", |con| {
        access::read_write_block(con, &dev, Direction::Read, AddrSpace::Bar(0));
    });

    assert!(output.contains("Read 0x4 bytes from offset 0x10"), "got:\n{output}");
    assert!(output.contains("00 00 00 00"), "the read data is hex-dumped, got:\n{output}");
    assert_eq!(
        dev.transfer_log(),
        vec![(0, 0x10); 4],
        "auto-increment off should pin every unit at the start offset"
    );
}

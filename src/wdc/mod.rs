//! Device access layer: status codes, capability traits the hardware
//! backend implements, register descriptor catalogs, and the register
//! access abstraction with its interactive front-ends.

pub mod access;
pub mod catalog;
pub mod device;
pub mod error;

pub use catalog::{Catalog, RegisterDescriptor};
pub use device::{
    AddrSpace, DeviceHandle, DeviceLocation, DeviceScan, Direction, EventAction, EventHandler,
    Increment, SpaceInfo, SpaceKind, TransferWidth,
};
pub use error::{AccessError, AccessResult};

//! In-process simulated backend. `SimBus` and `SimDevice` implement the
//! `wdc` capability traits over RAM-backed storage so the binary and the
//! integration tests have a device to exercise without any kernel driver.

mod bus;
mod device;

pub use bus::SimBus;
pub use device::{BarSpec, SimDevice, SimDeviceSpec};

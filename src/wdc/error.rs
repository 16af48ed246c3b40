//! Status codes for the device access layer. Every failure carries a
//! stable numeric code alongside its description so interactive output can
//! report `Error 0x<code> - <description>` and the binary can surface the
//! code as its exit status.

use std::error::Error;
use std::fmt;

use super::device::{AddrSpace, Direction};

pub type AccessResult<T> = Result<T, AccessError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    InvalidParameter,
    DeviceNotFound,
    NoResourcesOnDevice,
    /// A register was accessed against its declared direction. Raised
    /// before any transport call is made.
    WrongDirection {
        register: &'static str,
        attempted: Direction,
    },
    NullHandle,
    OutOfRange {
        space: AddrSpace,
        offset: u64,
    },
    InactiveSpace {
        space: u32,
    },
    OperationFailed {
        what: &'static str,
    },
}

impl AccessError {
    pub fn code(&self) -> u32 {
        match self {
            AccessError::InvalidParameter => 0x2000_0001,
            AccessError::DeviceNotFound => 0x2000_0002,
            AccessError::NoResourcesOnDevice => 0x2000_0003,
            AccessError::WrongDirection { .. } => 0x2000_0004,
            AccessError::NullHandle => 0x2000_0005,
            AccessError::OutOfRange { .. } => 0x2000_0006,
            AccessError::InactiveSpace { .. } => 0x2000_0007,
            AccessError::OperationFailed { .. } => 0x2000_000A,
        }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::InvalidParameter => write!(f, "Invalid parameter"),
            AccessError::DeviceNotFound => write!(f, "Device not found"),
            AccessError::NoResourcesOnDevice => {
                write!(f, "No resources found on the device")
            }
            AccessError::WrongDirection { register, attempted } => {
                write!(f, "Register '{register}' does not support {attempted} access")
            }
            AccessError::NullHandle => write!(f, "NULL device handle"),
            AccessError::OutOfRange { space, offset } => {
                write!(f, "Offset 0x{offset:X} is out of range for {space}")
            }
            AccessError::InactiveSpace { space } => {
                write!(f, "Address space {space} is inactive")
            }
            AccessError::OperationFailed { what } => write!(f, "{what} failed"),
        }
    }
}

impl Error for AccessError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(AccessError::InvalidParameter.code(), 0x2000_0001);
        assert_eq!(AccessError::NullHandle.code(), 0x2000_0005);
        assert_eq!(
            AccessError::OutOfRange { space: AddrSpace::Bar(0), offset: 0x10 }.code(),
            0x2000_0006
        );
    }

    #[test]
    fn wrong_direction_names_the_register() {
        let err = AccessError::WrongDirection { register: "STS", attempted: Direction::Write };
        let text = err.to_string();
        assert!(text.contains("STS"), "got: {text}");
        assert!(text.contains("write"), "got: {text}");
    }
}

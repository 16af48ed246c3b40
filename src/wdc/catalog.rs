//! Register descriptor catalogs: pure data describing the registers a
//! diagnostic session can address by name. Alternative catalogs plug in
//! without any code change in the access layer.

use ahash::AHashMap;

use super::device::{AddrSpace, Direction, TransferWidth};

/// One addressable register: where it lives, how wide it is, which
/// directions it supports, and what to call it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub space: AddrSpace,
    pub offset: u64,
    pub width: TransferWidth,
    pub direction: Direction,
    pub name: &'static str,
    pub desc: &'static str,
}

/// An ordered register set with a hashed name index.
pub struct Catalog {
    regs: &'static [RegisterDescriptor],
    by_name: AHashMap<&'static str, usize>,
}

impl Catalog {
    pub fn new(regs: &'static [RegisterDescriptor]) -> Self {
        let by_name = regs.iter().enumerate().map(|(i, reg)| (reg.name, i)).collect();
        Self { regs, by_name }
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RegisterDescriptor> {
        self.regs.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&RegisterDescriptor> {
        self.by_name.get(name).map(|&i| &self.regs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterDescriptor> {
        self.regs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static REGS: [RegisterDescriptor; 2] = [
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
            offset: 0x2,
            width: TransferWidth::W16,
            direction: Direction::ReadWrite,
            name: "DID",
            desc: "Device ID",
        },
    ];

    #[test]
    fn lookup_by_name_and_index_agree() {
        let catalog = Catalog::new(&REGS);
        assert_eq!(catalog.len(), 2);
        let did = catalog.find("DID").expect("DID is in the catalog");
        assert_eq!(did.offset, 0x2);
        assert_eq!(catalog.get(1), Some(did));
        assert!(catalog.find("NOPE").is_none());
    }
}

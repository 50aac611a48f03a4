//! Hardware addressing types for the BST API.
//!
//! A buffer statistic is addressed by four components: the hardware unit,
//! a logical port handle ([`Gport`]), a sub-resource index (queue, pool or
//! priority group, called `cosq` by the driver) and a [`BstStatId`].

use std::fmt;

/// Identifier of one switch ASIC managed by this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HwUnit(u32);

impl HwUnit {
    /// Creates a unit id.
    pub const fn new(id: u32) -> Self {
        HwUnit(id)
    }

    /// Returns the raw unit number.
    pub const fn as_raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for HwUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit {}", self.0)
    }
}

/// Gport type field for a local (front panel or CPU) port.
const GPORT_TYPE_LOCAL: u32 = 0x01;
const GPORT_TYPE_SHIFT: u32 = 26;
const GPORT_PORT_MASK: u32 = (1 << GPORT_TYPE_SHIFT) - 1;

/// Logical port handle resolved by the driver from a numeric port.
///
/// `Gport::NONE` addresses device-level or pool-level resources that have no
/// port component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Gport(u32);

impl Gport {
    /// Device-level addressing (no port).
    pub const NONE: Self = Gport(0);

    /// Encodes a local port number as a gport.
    pub const fn local(port: u32) -> Self {
        Gport((GPORT_TYPE_LOCAL << GPORT_TYPE_SHIFT) | (port & GPORT_PORT_MASK))
    }
}

impl fmt::Debug for Gport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gport(0x{:08x})", self.0)
    }
}

impl fmt::Display for Gport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Buffer statistic identifiers known to the driver.
///
/// Several bufmon realms may share one id, and some ids are not used by any
/// realm at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BstStatId {
    Device,
    EgrPool,
    EgrMCastPool,
    IngPool,
    PortPool,
    PriGroupShared,
    PriGroupHeadroom,
    Ucast,
    Mcast,
    HeadroomPool,
    EgrUCastPortShared,
    EgrPortShared,
    RqeQueue,
    RqePool,
    UcastGroup,
}

impl BstStatId {
    /// All statistic ids, in driver order.
    pub const ALL: [BstStatId; 15] = [
        BstStatId::Device,
        BstStatId::EgrPool,
        BstStatId::EgrMCastPool,
        BstStatId::IngPool,
        BstStatId::PortPool,
        BstStatId::PriGroupShared,
        BstStatId::PriGroupHeadroom,
        BstStatId::Ucast,
        BstStatId::Mcast,
        BstStatId::HeadroomPool,
        BstStatId::EgrUCastPortShared,
        BstStatId::EgrPortShared,
        BstStatId::RqeQueue,
        BstStatId::RqePool,
        BstStatId::UcastGroup,
    ];

    /// Returns the raw driver id.
    pub fn as_raw(self) -> i32 {
        match self {
            BstStatId::Device => 0,
            BstStatId::EgrPool => 1,
            BstStatId::EgrMCastPool => 2,
            BstStatId::IngPool => 3,
            BstStatId::PortPool => 4,
            BstStatId::PriGroupShared => 5,
            BstStatId::PriGroupHeadroom => 6,
            BstStatId::Ucast => 7,
            BstStatId::Mcast => 8,
            BstStatId::HeadroomPool => 9,
            BstStatId::EgrUCastPortShared => 10,
            BstStatId::EgrPortShared => 11,
            BstStatId::RqeQueue => 12,
            BstStatId::RqePool => 13,
            BstStatId::UcastGroup => 14,
        }
    }

    /// Maps a raw driver id back to a statistic id.
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_raw() == raw)
    }
}

impl fmt::Display for BstStatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.as_raw())
    }
}

/// Threshold profile programmed for one statistic address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BstProfile {
    /// Trigger threshold in bytes.
    pub byte: u32,
}

impl BstProfile {
    pub const fn new(byte: u32) -> Self {
        Self { byte }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gport_local_encoding() {
        let gport = Gport::local(17);
        assert_eq!(gport.to_string(), "0x04000011");
        assert_ne!(gport, Gport::NONE);
    }

    #[test]
    fn test_gport_cpu_port_is_addressable() {
        // port 0 is the CPU port and must not collapse to NONE
        assert_ne!(Gport::local(0), Gport::NONE);
    }

    #[test]
    fn test_stat_id_raw_mapping() {
        for id in BstStatId::ALL {
            assert_eq!(BstStatId::from_raw(id.as_raw()), Some(id));
        }
        assert_eq!(BstStatId::from_raw(99), None);
        assert_eq!(BstStatId::from_raw(-1), None);
    }

    #[test]
    fn test_unit_display() {
        assert_eq!(HwUnit::new(2).to_string(), "unit 2");
    }
}

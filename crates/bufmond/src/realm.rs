//! Realm table: counter name → statistic id → addressing scheme.
//!
//! A realm is a family of counters sharing one hardware statistic id and one
//! addressing scheme. Statistic ids are not unique across realms (the CPU
//! queue realm reuses the multicast queue id), so a realm is identified by
//! the pair (name prefix match, statistic id).
//!
//! Lookup is by substring: the first descriptor whose prefix occurs in the
//! counter name wins, so table order matters when prefixes could overlap.

use sonic_bst::BstStatId;

/// Addressing scheme of a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealmKind {
    /// Unit only, no port or sub-resource.
    DeviceGlobal,
    /// `port` + `priority-group`.
    IngressPortPriorityGroup,
    /// `port` + `service-pool`.
    IngressPortServicePool,
    /// `service-pool`, no port.
    IngressServicePool,
    /// `service-pool`, no port.
    EgressServicePool,
    /// Global `queue` number split into port and queue-within-port.
    EgressUnicastQueue,
    /// Same derivation as [`RealmKind::EgressUnicastQueue`].
    EgressMulticastQueue,
    /// `port` + `service-pool`.
    EgressPortServicePool,
    /// `queue` on the CPU port.
    EgressCpuQueue,
    /// `queue`, no port.
    EgressRqeQueue,
    /// `queue` group, no port.
    EgressUnicastQueueGroup,
}

/// One entry of the realm table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmDescriptor {
    /// Matched as a substring of the counter name.
    pub name_prefix: &'static str,
    pub stat_id: BstStatId,
    pub kind: RealmKind,
}

impl RealmDescriptor {
    const fn new(name_prefix: &'static str, stat_id: BstStatId, kind: RealmKind) -> Self {
        Self {
            name_prefix,
            stat_id,
            kind,
        }
    }

    /// Returns true if this realm's prefix occurs in `counter_name`.
    pub fn matches_name(&self, counter_name: &str) -> bool {
        counter_name.contains(self.name_prefix)
    }
}

/// Every realm known to bufmon, in lookup order.
pub static REALM_TABLE: [RealmDescriptor; 14] = [
    RealmDescriptor::new("device/data", BstStatId::Device, RealmKind::DeviceGlobal),
    RealmDescriptor::new(
        "egress-service-pool/um-share-buffer-count",
        BstStatId::EgrPool,
        RealmKind::EgressServicePool,
    ),
    RealmDescriptor::new(
        "egress-service-pool/mc-share-buffer-count",
        BstStatId::EgrMCastPool,
        RealmKind::EgressServicePool,
    ),
    RealmDescriptor::new(
        "ingress-service-pool/um-share-buffer-count",
        BstStatId::IngPool,
        RealmKind::IngressServicePool,
    ),
    RealmDescriptor::new(
        "ingress-port-service-pool/um-share-buffer-count",
        BstStatId::PortPool,
        RealmKind::IngressPortServicePool,
    ),
    RealmDescriptor::new(
        "ingress-port-priority-group/um-share-buffer-count",
        BstStatId::PriGroupShared,
        RealmKind::IngressPortPriorityGroup,
    ),
    RealmDescriptor::new(
        "ingress-port-priority-group/um-headroom-buffer-count",
        BstStatId::PriGroupHeadroom,
        RealmKind::IngressPortPriorityGroup,
    ),
    RealmDescriptor::new(
        "egress-uc-queue/uc-buffer-count",
        BstStatId::Ucast,
        RealmKind::EgressUnicastQueue,
    ),
    RealmDescriptor::new(
        "egress-mc-queue/mc-buffer-count",
        BstStatId::Mcast,
        RealmKind::EgressMulticastQueue,
    ),
    RealmDescriptor::new(
        "egress-port-service-pool/uc-share-buffer-count",
        BstStatId::EgrUCastPortShared,
        RealmKind::EgressPortServicePool,
    ),
    RealmDescriptor::new(
        "egress-port-service-pool/um-share-buffer-count",
        BstStatId::EgrPortShared,
        RealmKind::EgressPortServicePool,
    ),
    RealmDescriptor::new(
        "egress-cpu-queue/cpu-buffer-count",
        BstStatId::Mcast,
        RealmKind::EgressCpuQueue,
    ),
    RealmDescriptor::new(
        "egress-rqe-queue/rqe-buffer-count",
        BstStatId::RqeQueue,
        RealmKind::EgressRqeQueue,
    ),
    RealmDescriptor::new(
        "egress-uc-queue-group/uc-buffer-count",
        BstStatId::UcastGroup,
        RealmKind::EgressUnicastQueueGroup,
    ),
];

/// Statistic id of the first realm whose prefix occurs in `counter_name`.
pub fn lookup_stat_id(counter_name: &str) -> Option<BstStatId> {
    REALM_TABLE
        .iter()
        .find(|realm| realm.matches_name(counter_name))
        .map(|realm| realm.stat_id)
}

/// Index of the realm matching both `counter_name` and `stat_id`.
pub fn lookup_descriptor_index(stat_id: BstStatId, counter_name: &str) -> Option<usize> {
    REALM_TABLE
        .iter()
        .position(|realm| realm.stat_id == stat_id && realm.matches_name(counter_name))
}

/// Resolves a counter name to its realm descriptor.
///
/// The name → id lookup is re-checked against the (name, id) pair so a
/// prefix that happens to occur in another realm's name can never route a
/// counter to a descriptor with a different statistic id.
pub fn resolve(counter_name: &str) -> Option<&'static RealmDescriptor> {
    let stat_id = lookup_stat_id(counter_name)?;
    let index = lookup_descriptor_index(stat_id, counter_name)?;
    REALM_TABLE.get(index)
}

/// Statistic id of a raw interrupt resource id, if some realm tracks it.
pub fn tracked_stat_id(resource_id: i32) -> Option<BstStatId> {
    BstStatId::from_raw(resource_id)
        .filter(|stat_id| REALM_TABLE.iter().any(|realm| realm.stat_id == *stat_id))
}

/// Returns true if a raw interrupt resource id belongs to any realm.
pub fn is_known_stat_id(resource_id: i32) -> bool {
    tracked_stat_id(resource_id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_realm_resolves_to_itself() {
        for (index, realm) in REALM_TABLE.iter().enumerate() {
            let stat_id = lookup_stat_id(realm.name_prefix).unwrap();
            assert_eq!(stat_id, realm.stat_id, "{}", realm.name_prefix);
            assert_eq!(
                lookup_descriptor_index(realm.stat_id, realm.name_prefix),
                Some(index),
                "{}",
                realm.name_prefix
            );
        }
    }

    #[test]
    fn test_prefixes_are_unique() {
        for (i, a) in REALM_TABLE.iter().enumerate() {
            for (j, b) in REALM_TABLE.iter().enumerate() {
                if i != j {
                    assert!(
                        !b.name_prefix.contains(a.name_prefix),
                        "{} is a substring of {}",
                        a.name_prefix,
                        b.name_prefix
                    );
                }
            }
        }
    }

    #[test]
    fn test_shared_stat_id_disambiguated_by_name() {
        let cpu = resolve("egress-cpu-queue/cpu-buffer-count").unwrap();
        let mc = resolve("egress-mc-queue/mc-buffer-count").unwrap();
        assert_eq!(cpu.stat_id, mc.stat_id);
        assert_eq!(cpu.kind, RealmKind::EgressCpuQueue);
        assert_eq!(mc.kind, RealmKind::EgressMulticastQueue);
    }

    #[test]
    fn test_substring_match_in_longer_name() {
        let realm = resolve("bst/egress-uc-queue-group/uc-buffer-count/3").unwrap();
        assert_eq!(realm.kind, RealmKind::EgressUnicastQueueGroup);

        let realm = resolve("bst/egress-uc-queue/uc-buffer-count/3").unwrap();
        assert_eq!(realm.kind, RealmKind::EgressUnicastQueue);
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(lookup_stat_id("egress-xx-queue/foo"), None);
        assert!(resolve("").is_none());
        assert_eq!(lookup_descriptor_index(BstStatId::Device, "egress-mc-queue/mc-buffer-count"), None);
    }

    #[test]
    fn test_known_stat_ids() {
        for realm in &REALM_TABLE {
            assert!(is_known_stat_id(realm.stat_id.as_raw()));
        }
        // driver ids that no realm tracks
        assert!(!is_known_stat_id(BstStatId::HeadroomPool.as_raw()));
        assert!(!is_known_stat_id(BstStatId::RqePool.as_raw()));
        assert!(!is_known_stat_id(-1));
    }

    #[test]
    fn test_tracked_stat_id() {
        assert_eq!(tracked_stat_id(7), Some(BstStatId::Ucast));
        assert_eq!(tracked_stat_id(8), Some(BstStatId::Mcast));
        assert_eq!(tracked_stat_id(14), Some(BstStatId::UcastGroup));
        // known to the driver, tracked by no realm
        assert_eq!(tracked_stat_id(BstStatId::HeadroomPool.as_raw()), None);
        assert_eq!(tracked_stat_id(99), None);
    }
}

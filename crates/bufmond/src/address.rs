//! Per-realm addressing: turns a counter's parameters into the hardware
//! address (unit, gport, sub-resource index, statistic id) and performs the
//! read or threshold write there.
//!
//! Sub-resource parameters (`queue`, `service-pool`, `priority-group`) are
//! one-based in counter configuration and zero-based in hardware. A value
//! that maps below index 0 is rejected as malformed input, including a
//! global unicast/multicast queue number that is a multiple of 8.

use std::fmt;

use sonic_bst::{BstApi, BstProfile, BstStatId, Gport, HwUnit};
use tracing::debug;

use crate::counter::{CounterInfo, Operation};
use crate::error::{BufmonError, BufmonResult};
use crate::realm::{RealmDescriptor, RealmKind};

/// Queues per port in the global unicast/multicast queue numbering.
pub const QUEUES_PER_PORT: i32 = 8;

/// Port number of the CPU port.
pub const CPU_PORT: i32 = 0;

/// Parameter names in [`CounterInfo::params`].
pub mod params {
    pub const PORT: &str = "port";
    pub const QUEUE: &str = "queue";
    pub const PRIORITY_GROUP: &str = "priority-group";
    pub const SERVICE_POOL: &str = "service-pool";
}

/// Fully resolved hardware address of one statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAddress {
    pub unit: HwUnit,
    pub gport: Gport,
    pub cosq: i32,
    pub stat: BstStatId,
}

impl fmt::Display for CounterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} gport {} cosq {} stat {}",
            self.unit, self.gport, self.cosq, self.stat
        )
    }
}

/// Address derived from parameters alone, before port resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPlan {
    /// Numeric port to resolve, `None` for device or pool level statistics.
    pub port: Option<i32>,
    /// Zero-based sub-resource index.
    pub cosq: i32,
}

/// Splits a global queue number into `(port, queue-within-port)`.
///
/// The queue-within-port is still one-based: `13` → `(2, 5)`, `8` → `(2, 0)`.
pub fn split_global_queue(queue: i32) -> (i32, i32) {
    (queue / QUEUES_PER_PORT + 1, queue % QUEUES_PER_PORT)
}

fn require(counter: &CounterInfo, param: &'static str) -> BufmonResult<i32> {
    let value = counter
        .params
        .get_int(param)
        .ok_or_else(|| BufmonError::MissingParameter {
            counter: counter.display_name().to_string(),
            param,
        })?;
    if value < 0 {
        return Err(invalid_index(counter, param, value));
    }
    Ok(value)
}

fn invalid_index(counter: &CounterInfo, param: &'static str, value: i32) -> BufmonError {
    BufmonError::InvalidIndex {
        counter: counter.display_name().to_string(),
        param,
        value,
    }
}

/// One-based parameter → zero-based hardware index.
fn zero_based(counter: &CounterInfo, param: &'static str) -> BufmonResult<i32> {
    let value = require(counter, param)?;
    if value < 1 {
        return Err(invalid_index(counter, param, value));
    }
    Ok(value - 1)
}

/// Derives the address plan of `kind` from the counter's parameters.
pub fn plan(kind: RealmKind, counter: &CounterInfo) -> BufmonResult<AddressPlan> {
    use self::params::*;

    match kind {
        RealmKind::DeviceGlobal => Ok(AddressPlan { port: None, cosq: 0 }),
        RealmKind::IngressPortPriorityGroup => {
            let port = require(counter, PORT)?;
            let cosq = zero_based(counter, PRIORITY_GROUP)?;
            Ok(AddressPlan {
                port: Some(port),
                cosq,
            })
        }
        RealmKind::IngressPortServicePool | RealmKind::EgressPortServicePool => {
            let port = require(counter, PORT)?;
            let cosq = zero_based(counter, SERVICE_POOL)?;
            Ok(AddressPlan {
                port: Some(port),
                cosq,
            })
        }
        RealmKind::IngressServicePool | RealmKind::EgressServicePool => Ok(AddressPlan {
            port: None,
            cosq: zero_based(counter, SERVICE_POOL)?,
        }),
        RealmKind::EgressUnicastQueue | RealmKind::EgressMulticastQueue => {
            let queue = require(counter, QUEUE)?;
            let (port, queue_in_port) = split_global_queue(queue);
            if queue_in_port < 1 {
                return Err(invalid_index(counter, QUEUE, queue));
            }
            Ok(AddressPlan {
                port: Some(port),
                cosq: queue_in_port - 1,
            })
        }
        RealmKind::EgressCpuQueue => Ok(AddressPlan {
            port: Some(CPU_PORT),
            cosq: zero_based(counter, QUEUE)?,
        }),
        RealmKind::EgressRqeQueue | RealmKind::EgressUnicastQueueGroup => Ok(AddressPlan {
            port: None,
            cosq: zero_based(counter, QUEUE)?,
        }),
    }
}

/// Resolves the full hardware address of a counter in `realm`.
pub fn resolve_address(
    api: &dyn BstApi,
    realm: &RealmDescriptor,
    counter: &CounterInfo,
) -> BufmonResult<CounterAddress> {
    let target = plan(realm.kind, counter)?;
    let unit = counter.hw_unit;

    let gport = match target.port {
        None => Gport::NONE,
        Some(port) => api.port_gport_get(unit, port).map_err(|e| {
            BufmonError::hardware("port_gport_get", format!("{} port {}", unit, port), e)
        })?,
    };

    Ok(CounterAddress {
        unit,
        gport,
        cosq: target.cosq,
        stat: realm.stat_id,
    })
}

/// Hardware effect of one handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Occupancy read into the counter.
    Read(u64),
    /// Threshold profile written, in bytes.
    Programmed(u32),
    /// Threshold unset, nothing written.
    Skipped,
}

/// Runs `op` for a counter of `realm`.
///
/// A GET only writes `counter.value` once the hardware read succeeded. A SET
/// with an unset (zero) threshold touches no hardware at all.
pub fn handle(
    api: &dyn BstApi,
    realm: &RealmDescriptor,
    op: Operation,
    counter: &mut CounterInfo,
) -> BufmonResult<Outcome> {
    let profile = match op {
        Operation::GetCounterValue => None,
        Operation::SetCounterThreshold => {
            if counter.trigger_threshold == 0 {
                debug!(counter = counter.display_name(), "threshold unset, nothing to program");
                return Ok(Outcome::Skipped);
            }
            let byte = u32::try_from(counter.trigger_threshold).map_err(|_| {
                BufmonError::InvalidThreshold {
                    counter: counter.display_name().to_string(),
                    threshold: counter.trigger_threshold,
                }
            })?;
            Some(BstProfile::new(byte))
        }
    };

    let address = resolve_address(api, realm, counter)?;

    match profile {
        None => {
            let value = api
                .bst_stat_get(address.unit, address.gport, address.cosq, address.stat)
                .map_err(|e| BufmonError::hardware("bst_stat_get", address.to_string(), e))?;
            counter.value = value;
            Ok(Outcome::Read(value))
        }
        Some(profile) => {
            api.bst_profile_set(
                address.unit,
                address.gport,
                address.cosq,
                address.stat,
                &profile,
            )
            .map_err(|e| BufmonError::hardware("bst_profile_set", address.to_string(), e))?;
            Ok(Outcome::Programmed(profile.byte))
        }
    }
}

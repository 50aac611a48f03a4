//! Integration tests for bufmond against the simulated ASIC
//!
//! These tests drive the public provider surface the way the daemon does:
//! counter reads and threshold writes for every realm, and the hardware
//! trigger path from driver callback to notification.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sonic_bst::{BstOp, BstStatId, Gport, HwUnit, SimulatedAsic, SwitchControl, SwitchEvent};
use sonic_bufmond::{
    BufmonConfig, BufmonProvider, CounterInfo, Operation, SystemConfig, TriggerNotifier,
    REALM_TABLE,
};

struct Case {
    name: &'static str,
    params: &'static [(&'static str, i32)],
    gport: Gport,
    cosq: i32,
    stat: BstStatId,
}

fn cases() -> Vec<Case> {
    vec![
        Case {
            name: "device/data",
            params: &[],
            gport: Gport::NONE,
            cosq: 0,
            stat: BstStatId::Device,
        },
        Case {
            name: "egress-service-pool/um-share-buffer-count",
            params: &[("service-pool", 2)],
            gport: Gport::NONE,
            cosq: 1,
            stat: BstStatId::EgrPool,
        },
        Case {
            name: "egress-service-pool/mc-share-buffer-count",
            params: &[("service-pool", 1)],
            gport: Gport::NONE,
            cosq: 0,
            stat: BstStatId::EgrMCastPool,
        },
        Case {
            name: "ingress-service-pool/um-share-buffer-count",
            params: &[("service-pool", 4)],
            gport: Gport::NONE,
            cosq: 3,
            stat: BstStatId::IngPool,
        },
        Case {
            name: "ingress-port-service-pool/um-share-buffer-count",
            params: &[("port", 3), ("service-pool", 2)],
            gport: Gport::local(3),
            cosq: 1,
            stat: BstStatId::PortPool,
        },
        Case {
            name: "ingress-port-priority-group/um-share-buffer-count",
            params: &[("port", 5), ("priority-group", 8)],
            gport: Gport::local(5),
            cosq: 7,
            stat: BstStatId::PriGroupShared,
        },
        Case {
            name: "ingress-port-priority-group/um-headroom-buffer-count",
            params: &[("port", 1), ("priority-group", 1)],
            gport: Gport::local(1),
            cosq: 0,
            stat: BstStatId::PriGroupHeadroom,
        },
        Case {
            name: "egress-uc-queue/uc-buffer-count",
            params: &[("queue", 13)],
            gport: Gport::local(2),
            cosq: 4,
            stat: BstStatId::Ucast,
        },
        Case {
            name: "egress-mc-queue/mc-buffer-count",
            params: &[("queue", 17)],
            gport: Gport::local(3),
            cosq: 0,
            stat: BstStatId::Mcast,
        },
        Case {
            name: "egress-port-service-pool/uc-share-buffer-count",
            params: &[("port", 7), ("service-pool", 1)],
            gport: Gport::local(7),
            cosq: 0,
            stat: BstStatId::EgrUCastPortShared,
        },
        Case {
            name: "egress-port-service-pool/um-share-buffer-count",
            params: &[("port", 7), ("service-pool", 3)],
            gport: Gport::local(7),
            cosq: 2,
            stat: BstStatId::EgrPortShared,
        },
        Case {
            name: "egress-cpu-queue/cpu-buffer-count",
            params: &[("queue", 4)],
            gport: Gport::local(0),
            cosq: 3,
            stat: BstStatId::Mcast,
        },
        Case {
            name: "egress-rqe-queue/rqe-buffer-count",
            params: &[("queue", 2)],
            gport: Gport::NONE,
            cosq: 1,
            stat: BstStatId::RqeQueue,
        },
        Case {
            name: "egress-uc-queue-group/uc-buffer-count",
            params: &[("queue", 1)],
            gport: Gport::NONE,
            cosq: 0,
            stat: BstStatId::UcastGroup,
        },
    ]
}

fn request(case: &Case, unit: HwUnit) -> CounterInfo {
    case.params
        .iter()
        .fold(CounterInfo::new(unit, case.name), |info, (k, v)| {
            info.with_param(*k, v)
        })
}

fn provider(units: u32) -> (Arc<SimulatedAsic>, BufmonProvider, Arc<AtomicUsize>) {
    let asic = Arc::new(SimulatedAsic::new(units, 32));
    let config = BufmonConfig {
        hw_units: units,
        ..Default::default()
    };
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    let notifier: Arc<dyn TriggerNotifier> = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let (provider, rx) = BufmonProvider::new(asic.clone(), &config, notifier);

    let triggers = provider.trigger_manager().clone();
    tokio::spawn(async move { triggers.run(rx).await });

    (asic, provider, notified)
}

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[tokio::test]
async fn test_every_realm_reads_its_address() {
    let (asic, provider, _) = provider(1);
    let unit = HwUnit::new(0);
    let cases = cases();
    assert_eq!(cases.len(), REALM_TABLE.len());

    for (i, case) in cases.iter().enumerate() {
        let value = 1000 + i as u64;
        asic.set_stat_value(unit, case.gport, case.cosq, case.stat, value);

        let mut info = request(case, unit);
        provider.handle_counter_request(&mut info, Operation::GetCounterValue);

        assert_eq!(info.value, value, "{}", case.name);
    }
}

#[tokio::test]
async fn test_every_realm_programs_its_threshold() {
    let (asic, provider, _) = provider(1);
    let unit = HwUnit::new(0);

    for (i, case) in cases().iter().enumerate() {
        let threshold = 4096 * (i as u64 + 1);
        let mut info = request(case, unit).with_threshold(threshold);
        provider.handle_counter_request(&mut info, Operation::SetCounterThreshold);

        let profile = asic.profile(unit, case.gport, case.cosq, case.stat);
        assert_eq!(
            profile.map(|p| u64::from(p.byte)),
            Some(threshold),
            "{}",
            case.name
        );
    }
}

#[tokio::test]
async fn test_malformed_requests_touch_no_hardware() {
    let (asic, provider, _) = provider(1);
    let unit = HwUnit::new(0);

    let requests = vec![
        // queue-within-port of 0
        CounterInfo::new(unit, "egress-uc-queue/uc-buffer-count").with_param("queue", 8),
        CounterInfo::new(unit, "egress-mc-queue/mc-buffer-count").with_param("queue", 16),
        // one-based index of 0
        CounterInfo::new(unit, "egress-rqe-queue/rqe-buffer-count").with_param("queue", 0),
        // missing parameter
        CounterInfo::new(unit, "ingress-port-priority-group/um-share-buffer-count")
            .with_param("port", 1),
        // not an integer
        CounterInfo::new(unit, "egress-service-pool/um-share-buffer-count")
            .with_param("service-pool", "first"),
        // unknown realm
        CounterInfo::new(unit, "egress-xx-queue/xx-buffer-count"),
    ];

    for mut info in requests {
        info.value = 77;
        info.trigger_threshold = 100;
        provider.handle_counter_request(&mut info, Operation::GetCounterValue);
        provider.handle_counter_request(&mut info, Operation::SetCounterThreshold);
        assert_eq!(info.value, 77, "{}", info.display_name());
    }

    assert!(asic.calls().is_empty());
}

#[tokio::test]
async fn test_zero_threshold_writes_nothing() {
    let (asic, provider, _) = provider(1);
    let mut info = CounterInfo::new(HwUnit::new(0), "egress-cpu-queue/cpu-buffer-count")
        .with_param("queue", 1);

    provider.handle_counter_request(&mut info, Operation::SetCounterThreshold);

    assert!(asic.calls().is_empty());
}

#[tokio::test]
async fn test_trigger_from_any_unit_notifies() {
    let (asic, provider, notified) = provider(2);
    provider.apply_system_config(&SystemConfig::default());
    assert!(provider.trigger_manager().is_armed());

    assert_eq!(
        asic.raise_event(&SwitchEvent::bst_trigger(
            HwUnit::new(1),
            BstStatId::EgrPortShared.as_raw()
        )),
        1
    );

    assert!(wait_for(|| notified.load(Ordering::SeqCst) == 1).await);
    for unit in 0..2 {
        assert_eq!(
            asic.control(HwUnit::new(unit), SwitchControl::BstEnable),
            0
        );
    }

    // tracking stays off until the configuration owner re-arms it
    provider.rearm_tracking();
    assert_eq!(asic.control(HwUnit::new(0), SwitchControl::BstEnable), 1);
    assert_eq!(asic.control(HwUnit::new(1), SwitchControl::BstEnable), 1);
}

#[tokio::test]
async fn test_unknown_trigger_is_dropped() {
    let (asic, provider, notified) = provider(1);
    provider.apply_system_config(&SystemConfig::default());

    asic.raise_event(&SwitchEvent::bst_trigger(
        HwUnit::new(0),
        BstStatId::HeadroomPool.as_raw(),
    ));

    let stats = provider.trigger_manager().stats();
    assert!(wait_for(|| stats.events_ignored() == 1).await);
    assert_eq!(notified.load(Ordering::SeqCst), 0);
    assert_eq!(asic.control(HwUnit::new(0), SwitchControl::BstEnable), 0);
}

#[tokio::test]
async fn test_no_delivery_after_disable() {
    let (asic, provider, notified) = provider(1);
    provider.set_trigger_enabled(true);
    provider.set_trigger_enabled(false);

    let delivered = asic.raise_event(&SwitchEvent::bst_trigger(
        HwUnit::new(0),
        BstStatId::Device.as_raw(),
    ));

    assert_eq!(delivered, 0);
    assert_eq!(notified.load(Ordering::SeqCst), 0);
    assert_eq!(asic.count_calls(BstOp::EventRegister), 1);
    assert_eq!(asic.count_calls(BstOp::EventUnregister), 1);
}

//! Pin registry through its public API, with a recording owner link.

use std::collections::BTreeSet;

use homectl::adapters::time::ManualClock;
use homectl::config::ControlConfig;
use homectl::error::RegistryError;
use homectl::pins::{PinIndex, PinMode};
use homectl::registry::flavour::COUNTER_FLAVOUR;
use homectl::registry::types::{Capabilities, PinTypeDescriptor, TypeTable};
use homectl::registry::{PinRegistry, RegisterRequest};

use super::mock_master::{LinkCall, RecordingLink};

fn digital_registry() -> PinRegistry {
    let mut types = TypeTable::new();
    types.insert(PinTypeDescriptor::builtin("digital", None));
    let mut caps = Capabilities::new();
    caps.insert(PinIndex(5), BTreeSet::from(["digital".to_owned()]));
    caps.insert(PinIndex(6), BTreeSet::from(["digital".to_owned()]));
    PinRegistry::new(types, caps)
}

#[test]
fn digital_registration_is_mirrored() {
    let mut reg = digital_registry();
    let link = RecordingLink::new();
    let clock = ManualClock::new(10);

    let index = reg
        .register(&RegisterRequest::new(PinIndex(5), "digital"), link.boxed(), &clock)
        .unwrap();
    assert_eq!(index, PinIndex(5));

    let s = reg.status().pin(PinIndex(5)).unwrap();
    assert_eq!(s.type_key.as_deref(), Some("digital"));
    assert_eq!(s.caps, Some(BTreeSet::from(["digital".to_owned()])));
    assert!(matches!(link.calls().as_slice(), [LinkCall::Open(r)] if r.index == PinIndex(5)));
}

#[test]
fn type_missing_from_pin_capabilities_is_rejected() {
    let mut reg = digital_registry();
    let link = RecordingLink::new();
    let clock = ManualClock::new(10);

    let err = reg
        .register(&RegisterRequest::new(PinIndex(5), "counter"), link.boxed(), &clock)
        .unwrap_err();
    assert_eq!(err, RegistryError::MissingCapability("counter".into()));
    assert_eq!(link.calls(), vec![LinkCall::Error(err)]);
    assert!(reg.status().pin(PinIndex(5)).is_none());
}

#[test]
fn unbound_known_pin_update_is_mirrored_and_inherited() {
    let mut reg = digital_registry();
    let clock = ManualClock::new(300);

    reg.update(PinIndex(6), 1, &clock);
    let s = reg.status().pin(PinIndex(6)).unwrap();
    assert_eq!((s.value, s.at), (Some(1), Some(300)));

    clock.set(400);
    let link = RecordingLink::new();
    reg.register(
        &RegisterRequest::new(PinIndex(6), "digital").with_mode(PinMode::Out),
        link.boxed(),
        &clock,
    )
    .unwrap();

    let updates = link.updates();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].registering);
    assert_eq!((updates[0].value, updates[0].at), (1, 300));
}

#[test]
fn removal_keeps_only_reading() {
    let mut reg = digital_registry();
    let link = RecordingLink::new();
    let clock = ManualClock::new(0);
    reg.register(&RegisterRequest::new(PinIndex(5), "digital"), link.boxed(), &clock)
        .unwrap();
    clock.set(50);
    reg.update(PinIndex(5), 1, &clock);

    reg.remove(PinIndex(5)).unwrap();
    assert_eq!(link.calls().last(), Some(&LinkCall::Close));
    assert!(!reg.is_registered(PinIndex(5)));

    let s = reg.status().pin(PinIndex(5)).unwrap();
    assert!(s.type_key.is_none() && s.flavour.is_none());
    assert!(s.registered.is_none() && s.caps.is_none());
    assert_eq!((s.value, s.at), (Some(1), Some(50)));

    // Pin can be taken again.
    let again = RecordingLink::new();
    assert!(reg
        .register(&RegisterRequest::new(PinIndex(5), "digital"), again.boxed(), &clock)
        .is_ok());
}

#[test]
fn default_config_registry() {
    let reg = PinRegistry::from_config(&ControlConfig::default());
    let types = reg.status().pin_types();
    assert_eq!(types["digital"].name, "Digital I/O");
    assert_eq!(types["din"].name, "din");
    assert_eq!(reg.capabilities().len(), 10);
}

#[test]
fn counter_on_din_pin() {
    let mut reg = PinRegistry::from_config(&ControlConfig::default());
    let link = RecordingLink::new();
    let clock = ManualClock::new(0);
    reg.register(
        &RegisterRequest::new(PinIndex(10), "din").with_flavour(COUNTER_FLAVOUR),
        link.boxed(),
        &clock,
    )
    .unwrap();

    for v in [1, 0, 1, 0] {
        clock.advance(10);
        reg.update(PinIndex(10), v, &clock);
    }
    let counts: Vec<_> = link.updates().iter().map(|u| u.value).collect();
    assert_eq!(counts, vec![1, 1, 2, 2]);
    assert_eq!(
        reg.status().pin(PinIndex(10)).unwrap().flavour.as_deref(),
        Some("counter")
    );
}

//! ControlService wiring: startup registrations, routing, status surface.

use homectl::app::commands::BlindsCommand;
use homectl::config::{BlindsConfig, ControlConfig};
use homectl::error::{ConfigError, Error, RegistryError};
use homectl::pins::{PinIndex, PinMode};
use homectl::registry::RegisterRequest;

use super::mock_master::{DOWN, LIVING_ROOM, LinkCall, RecordingLink, Rig, UP, WATER_PIN, cmd};

#[test]
fn start_registers_consumer_pins() {
    let rig = Rig::new();
    let reg = rig.service.registry();

    assert!(reg.is_registered(UP));
    assert!(reg.is_registered(DOWN));
    assert!(reg.is_registered(WATER_PIN));
    assert_eq!(rig.master.registrations.len(), 3);

    let up = reg.status().pin(UP).unwrap().registered.clone().unwrap();
    assert_eq!(up.owner.as_deref(), Some(LIVING_ROOM));
    assert_eq!(up.caption.as_deref(), Some("Living room blinds Up"));
    assert_eq!(up.mode, Some(PinMode::Out));
    assert_eq!(up.conflict, Some(DOWN));

    let water = reg.status().pin(WATER_PIN).unwrap();
    assert_eq!(water.type_key.as_deref(), Some("din"));
    assert_eq!(water.flavour.as_deref(), Some("counter"));
}

#[test]
fn engaged_pin_at_registration_is_released() {
    let mut rig = Rig::unstarted(&ControlConfig::default());
    rig.master.force(UP, 1);
    rig.settle();
    assert_eq!(rig.mirrored(UP), Some(1));

    rig.start();
    assert_eq!(rig.commands(), &[cmd(UP, 0)]);
    assert_eq!(rig.master.level(UP), 0);
    assert_eq!(rig.mirrored(UP), Some(0));
    assert_eq!(rig.moving(), None);
}

#[test]
fn flow_meter_counts_pulses() {
    let mut rig = Rig::new();
    for _ in 0..3 {
        rig.master.pulse(WATER_PIN);
    }
    rig.settle();

    let meter = rig.service.flow_meter("water").unwrap();
    assert_eq!(meter.value(), Some(3));
    assert_eq!(rig.mirrored(WATER_PIN), Some(0));
}

#[test]
fn read_all_samples_din_pins() {
    let mut rig = Rig::new();
    rig.service.read_all(&mut rig.master);
    assert_eq!(rig.master.reads, vec![WATER_PIN]);
    rig.settle();
    assert_eq!(rig.mirrored(WATER_PIN), Some(0));
}

#[test]
fn unknown_blinds_id_is_an_error() {
    let mut rig = Rig::new();
    let err = rig
        .service
        .command("garage", BlindsCommand::Up, &mut rig.master, &rig.clock)
        .unwrap_err();
    assert_eq!(err, Error::UnknownEntry("garage".into()));
    assert!(rig.commands().is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = ControlConfig::default();
    config.blinds.push(BlindsConfig::new("hall", PinIndex(3), PinIndex(3)));
    assert!(matches!(
        homectl::app::service::ControlService::new(&config),
        Err(Error::Config(ConfigError::ValidationFailed(_)))
    ));
}

#[test]
fn external_owner_registration_and_removal() {
    let mut rig = Rig::new();
    let link = RecordingLink::new();

    let taken = rig.service.register_pin(
        &RegisterRequest::new(UP, "digital"),
        link.boxed(),
        &rig.clock,
    );
    assert_eq!(taken, Err(Error::Registry(RegistryError::AlreadyRegistered(UP))));

    let link = RecordingLink::new();
    rig.service
        .register_pin(&RegisterRequest::new(PinIndex(4), "digital"), link.boxed(), &rig.clock)
        .unwrap();
    rig.force(PinIndex(4), 1);
    assert_eq!(link.updates().last().map(|u| u.value), Some(1));

    rig.service.remove_pin(PinIndex(4)).unwrap();
    assert_eq!(link.calls().last(), Some(&LinkCall::Close));
    assert_eq!(rig.mirrored(PinIndex(4)), Some(1));
    assert!(rig.service.remove_pin(PinIndex(4)).is_err());
}

#[test]
fn unknown_pin_change_is_ignored() {
    let mut rig = Rig::new();
    let before = rig.service.status_json().unwrap();
    rig.force(PinIndex(77), 1);
    assert_eq!(rig.service.status_json().unwrap(), before);
}

#[test]
fn status_json_surface() {
    let mut rig = Rig::new();
    rig.command(BlindsCommand::Down);

    let json = rig.service.status_json().unwrap();
    assert_eq!(json["pinTypes"]["digital"]["name"], "Digital I/O");
    assert_eq!(json["pins"]["2"]["type"], "digital");
    assert_eq!(json["pins"]["2"]["value"], 1);
    assert_eq!(json["pins"]["2"]["registered"]["conflict"], 1);
    assert_eq!(json["blinds"][LIVING_ROOM]["moving"]["direction"], "down");
    assert!(json["flowMeters"]["water"].is_object());
}

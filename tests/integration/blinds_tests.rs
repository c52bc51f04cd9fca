//! Blinds motion end to end: service → controller → simulated master →
//! registry → controller.

use homectl::app::commands::BlindsCommand;
use homectl::blinds::request::RequestState;
use homectl::pins::Direction;

use super::mock_master::{DOWN, LIVING_ROOM, Rig, UP, cmd};

#[test]
fn move_up_is_cut_off_after_hold_time() {
    let mut rig = Rig::new();

    rig.command(BlindsCommand::Up);
    assert_eq!(rig.commands(), &[cmd(UP, 1)]);
    assert_eq!(rig.moving(), Some(Direction::Up));
    let start = rig.service.blinds(LIVING_ROOM).unwrap().state().moving.unwrap().start;
    assert_eq!(start, 0);

    rig.run_until(5_999);
    assert_eq!(rig.commands().len(), 1);
    assert_eq!(rig.moving(), Some(Direction::Up));

    rig.run_until(6_000);
    assert_eq!(rig.commands(), &[cmd(UP, 1), cmd(UP, 0)]);
    assert_eq!(rig.moving(), None);
    assert_eq!(rig.mirrored(UP), Some(0));

    let b = rig.service.blinds(LIVING_ROOM).unwrap();
    assert!(b.request().is_none());
    assert!(!b.timer().is_armed());
}

#[test]
fn reversal_releases_before_engaging_opposite_pin() {
    let mut rig = Rig::new();
    rig.command(BlindsCommand::Up);
    rig.run_until(1_000);

    rig.command(BlindsCommand::Down);
    assert_eq!(rig.commands(), &[cmd(UP, 1), cmd(UP, 0), cmd(DOWN, 1)]);
    assert_eq!(rig.moving(), Some(Direction::Down));
    assert_eq!(rig.master.level(UP), 0);
    assert_eq!(rig.master.level(DOWN), 1);

    // The hold window belongs to the new motion.
    rig.run_until(6_999);
    assert_eq!(rig.master.level(DOWN), 1);
    rig.run_until(7_000);
    assert_eq!(rig.master.level(DOWN), 0);
    assert_eq!(rig.moving(), None);
}

#[test]
fn both_pins_never_engaged_together() {
    let mut rig = Rig::new();
    let script = [
        (0, BlindsCommand::Up),
        (300, BlindsCommand::Down),
        (600, BlindsCommand::Up),
        (700, BlindsCommand::Stop),
        (900, BlindsCommand::Down),
        (950, BlindsCommand::Down),
    ];
    for (at, command) in script {
        rig.run_until(at);
        rig.command(command);
        assert!(
            rig.master.level(UP) == 0 || rig.master.level(DOWN) == 0,
            "both pins engaged after {command} at {at}"
        );
    }
    rig.run_until(20_000);
    assert_eq!(rig.master.level(UP), 0);
    assert_eq!(rig.master.level(DOWN), 0);
}

#[test]
fn repeated_move_extends_motion_without_command() {
    let mut rig = Rig::new();
    rig.command(BlindsCommand::Up);
    rig.run_until(4_000);

    rig.command(BlindsCommand::Up);
    assert_eq!(rig.commands().len(), 1);

    rig.run_until(9_999);
    assert_eq!(rig.master.level(UP), 1);
    rig.run_until(10_000);
    assert_eq!(rig.master.level(UP), 0);
}

#[test]
fn stop_releases_and_cancels_cutoff() {
    let mut rig = Rig::new();
    rig.command(BlindsCommand::Down);
    rig.run_until(2_000);

    rig.command(BlindsCommand::Stop);
    assert_eq!(rig.commands(), &[cmd(DOWN, 1), cmd(DOWN, 0)]);
    assert_eq!(rig.moving(), None);

    rig.run_until(20_000);
    assert_eq!(rig.commands().len(), 2);
}

#[test]
fn manual_switch_motion_is_supervised() {
    let mut rig = Rig::new();
    rig.run_until(500);

    rig.force(DOWN, 1);
    assert_eq!(rig.moving(), Some(Direction::Down));
    assert!(rig.commands().is_empty());
    let req = *rig.service.blinds(LIVING_ROOM).unwrap().request().unwrap();
    assert_eq!((req.direction, req.state), (Direction::Down, RequestState::Do));

    rig.run_until(6_500);
    assert_eq!(rig.commands(), &[cmd(DOWN, 0)]);
    assert_eq!(rig.master.level(DOWN), 0);
    assert_eq!(rig.moving(), None);
}

#[test]
fn unresponsive_master_is_not_retried() {
    let mut rig = Rig::new();
    rig.master.set_responsive(false);

    rig.command(BlindsCommand::Up);
    rig.run_until(30_000);

    assert_eq!(rig.commands(), &[cmd(UP, 1)]);
    assert_eq!(rig.moving(), None);
    let b = rig.service.blinds(LIVING_ROOM).unwrap();
    assert_eq!(b.request().map(|r| r.state), Some(RequestState::Confirm));
    assert!(!b.timer().is_armed());
}

#[test]
fn custom_hold_time() {
    let mut rig = Rig::new();
    rig.service
        .move_for(LIVING_ROOM, Direction::Up, 1_500, &mut rig.master, &rig.clock)
        .unwrap();
    rig.settle();
    rig.run_until(1_499);
    assert_eq!(rig.master.level(UP), 1);
    rig.run_until(1_500);
    assert_eq!(rig.master.level(UP), 0);
}

//! Integration test: sender → receiver message integrity.
//!
//! Exercises the codec over long frame sequences and the controller's
//! safe-default substitution once a command slot keeps failing.

use zone_common::consts::FRAME_LEN;
use zone_common::zone::config::ZoneConfig;
use zone_common::zone::diag::DiagEventId;
use zone_common::zone::state::Mode;
use zone_control_unit::cycle::{RX_TORQUE, command_frame, zone_codec};
use zone_control_unit::e2e::codec::E2eError;

use super::Rig;

#[test]
fn fresh_stream_survives_counter_wrap() {
    let cfg = ZoneConfig::default();
    let mut tx = zone_codec(&cfg);
    let mut rx = zone_codec(&cfg);

    for value in 0..40i16 {
        let mut frame = command_frame(value);
        tx.protect(RX_TORQUE, &mut frame).unwrap();
        assert_eq!(frame[1] & 0x0F, (value % 16) as u8);
        rx.check(RX_TORQUE, &frame).unwrap();
        assert_eq!(rx.consecutive_failures(RX_TORQUE), Some(0));
    }
}

#[test]
fn every_single_bit_flip_is_detected() {
    let cfg = ZoneConfig::default();
    let mut tx = zone_codec(&cfg);
    let mut frame = command_frame(1234);
    tx.protect(RX_TORQUE, &mut frame).unwrap();

    for byte in 0..FRAME_LEN {
        for bit in 0..8 {
            let mut rx = zone_codec(&cfg);
            let mut corrupted = frame;
            corrupted[byte] ^= 1 << bit;
            assert!(
                rx.check(RX_TORQUE, &corrupted).is_err(),
                "byte {byte} bit {bit}"
            );
        }
    }
}

#[test]
fn lost_frame_costs_one_failure() {
    let cfg = ZoneConfig::default();
    let mut tx = zone_codec(&cfg);
    let mut rx = zone_codec(&cfg);

    let mut frames = [command_frame(0); 4];
    for f in &mut frames {
        tx.protect(RX_TORQUE, f).unwrap();
    }
    rx.check(RX_TORQUE, &frames[0]).unwrap();
    // frames[1] never arrives
    assert_eq!(
        rx.check(RX_TORQUE, &frames[2]),
        Err(E2eError::SequenceMismatch {
            expected: 1,
            received: 2
        })
    );
    rx.check(RX_TORQUE, &frames[3]).unwrap();
    assert_eq!(rx.consecutive_failures(RX_TORQUE), Some(0));
}

#[test]
fn corrupted_torque_slot_substitutes_zero_then_recovers() {
    let cfg = ZoneConfig::default();
    let mut rig = Rig::armed(&cfg);

    let inputs = rig.frames(40, 0, 0);
    assert_eq!(rig.cycle(&inputs).motor.torque, 40);

    // Two corrupt frames: last good value is held.
    for _ in 0..2 {
        let mut inputs = rig.frames(80, 0, 0);
        if let Some(f) = inputs.torque_frame.as_mut() {
            f[2] ^= 0x80;
        }
        let out = rig.cycle(&inputs);
        assert_eq!(out.motor.torque, 40);
    }

    // Third consecutive failure reaches the limit.
    let mut inputs = rig.frames(80, 0, 0);
    if let Some(f) = inputs.torque_frame.as_mut() {
        f[2] ^= 0x80;
    }
    let out = rig.cycle(&inputs);
    assert_eq!(out.motor.torque, 0);
    assert!(rig.zc.codec().limit_reached(RX_TORQUE, cfg.e2e.fail_limit));
    assert!(!rig.zc.event_memory().is_confirmed(DiagEventId::E2eTorque));

    // The receiver did not advance on CRC failures, so the next good frame
    // is a sequence mismatch; the one after that is accepted.
    let inputs = rig.frames(45, 0, 0);
    assert_eq!(rig.cycle(&inputs).motor.torque, 0);
    let inputs = rig.frames(46, 0, 0);
    let out = rig.cycle(&inputs);
    assert_eq!(out.motor.torque, 46);
    assert_eq!(rig.zc.codec().consecutive_failures(RX_TORQUE), Some(0));
    assert_eq!(rig.zc.mode(), Mode::Run);
}

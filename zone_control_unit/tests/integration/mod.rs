//! Shared test rig plus one module per scenario family.

mod brake_timeout;
mod bus_loss;
mod e2e_chain;
mod mode_monotonicity;
mod motor_timeout;
mod shipped_files;
mod steering_plausibility;

use zone_common::zone::config::ZoneConfig;
use zone_common::zone::state::Mode;
use zone_control_unit::cycle::{
    CycleInputs, CycleOutputs, Frame, RX_BRAKE, RX_STEER, RX_TORQUE, ZoneCodec, ZoneController,
    command_frame, zone_codec,
};
use zone_control_unit::diag::DiagnosticRecorder;

/// Controller plus a remote sender and an ideal actuator model.
pub struct Rig {
    pub zc: ZoneController,
    tx: ZoneCodec,
    pub last: CycleOutputs,
    pub diag: DiagnosticRecorder<256>,
}

impl Rig {
    pub fn new(cfg: &ZoneConfig) -> Self {
        Self {
            zc: ZoneController::new(cfg).unwrap(),
            tx: zone_codec(cfg),
            last: CycleOutputs::default(),
            diag: DiagnosticRecorder::new(),
        }
    }

    /// One cycle requesting RUN with all commands at zero.
    pub fn armed(cfg: &ZoneConfig) -> Self {
        let mut rig = Self::new(cfg);
        let inputs = CycleInputs {
            mode_request: Some(Mode::Run),
            ..rig.frames(0, 0, 0)
        };
        rig.cycle(&inputs);
        assert_eq!(rig.zc.mode(), Mode::Run);
        rig
    }

    pub fn stamp(&mut self, slot: u8, value: i16) -> Frame {
        let mut frame = command_frame(value);
        self.tx.protect(slot, &mut frame).unwrap();
        frame
    }

    /// Stamped frames with feedback following the previous outputs.
    pub fn frames(&mut self, torque: i16, steer: i16, brake: i16) -> CycleInputs {
        CycleInputs {
            torque_frame: Some(self.stamp(RX_TORQUE, torque)),
            steer_frame: Some(self.stamp(RX_STEER, steer)),
            brake_frame: Some(self.stamp(RX_BRAKE, brake)),
            steer_feedback_deg: Ok(self.last.steering.angle10 / 10),
            brake_feedback_pct: Ok(self.last.brake.brake_pct),
            ..CycleInputs::default()
        }
    }

    /// Resting pedal with one percent of sensor noise, so the brake
    /// command never goes stale.
    pub fn pedal(&self) -> i16 {
        (self.zc.cycle_count() % 2) as i16
    }

    pub fn cycle(&mut self, inputs: &CycleInputs) -> CycleOutputs {
        self.last = self.zc.run_cycle(inputs, &mut self.diag);
        self.last
    }
}
